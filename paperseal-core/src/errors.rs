//! errors.rs - Custom error types for the paperseal-core library.
//!
//! This module defines a structured error enum for the library, providing
//! specific, actionable error types that can be handled programmatically.
//!
//! License: MIT OR APACHE 2.0

use thiserror::Error;

/// This enum represents all possible error types in the `paperseal-core` library.
///
/// By using `#[non_exhaustive]`, we signal to consumers of this library that
/// new variants may be added in future versions. This prevents them from
/// matching all variants exhaustively, thus avoiding breaking changes.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SealError {
    #[error("Failed to parse record on line {line}: {source}")]
    RecordParse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Record on line {0} is missing a non-empty 'paper_id'")]
    MissingIdentifier(usize),

    #[error("Failed to parse codebook file: {0}")]
    CodebookParse(String),

    #[error("Codebook forward map is not injective: pseudotoken '{0}' is assigned to more than one term")]
    DuplicatePseudotoken(String),

    #[error("Invalid sealing configuration: {0}")]
    InvalidConfig(String),

    #[error("Export policy violation: {0}")]
    PolicyViolation(String),

    #[error("Pipeline is finalized; sealing further records would desynchronize the persisted codebook")]
    PipelineFinalized,

    #[error("Failed to serialize or deserialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("An unexpected I/O error occurred: {0}")]
    IoError(#[from] std::io::Error),

    #[error("A critical system error occurred: {0}")]
    AnyhowWrapper(#[from] anyhow::Error),
}
