// paperseal-core/src/lib.rs
//! # PaperSeal Core Library
//!
//! `paperseal-core` provides the fundamental, platform-independent logic for
//! anonymizing ("sealing") structured research-paper records. It defines the
//! record data model, a deterministic bijective codebook from real-world terms
//! to synthetic pseudotokens, and a three-layer sealing pipeline that produces
//! a sealed copy of a corpus while preserving its referential structure.
//!
//! The library is designed to be pure and deterministic: every pseudo-random
//! decision is derived from an explicit seed, no operation reads wall-clock
//! time or ambient state, and no network I/O exists anywhere in this crate.
//!
//! ## Modules
//!
//! * `record`: Defines `PaperRecord` and the line-delimited JSON record I/O.
//! * `codebook`: The seeded, bijective term-to-pseudotoken mapping and its
//!   persistence format.
//! * `config`: Defines `SealingConfig` for the layer toggles, substitution
//!   table, and numeric perturbation settings.
//! * `determinism`: The HMAC-backed seeded source injected everywhere
//!   reproducible randomness is needed.
//! * `sealers`: The three composable layers (lexical, structural, numeric).
//! * `pipeline`: Orchestrates the layers in the fixed L1 -> L2 -> L3 order
//!   and owns one codebook per run.
//! * `export`: Sealed-corpus export with the codebook bundling guard.
//! * `errors`: The library error type.
//!
//! ## Public API
//!
//! **Records & I/O**
//!
//! * [`PaperRecord`], [`ResultMetrics`]: The unit operated on.
//! * [`load_records`] / [`save_records`]: Newline-delimited JSON in/out with
//!   fail-fast, line-numbered errors.
//!
//! **Codebook**
//!
//! * [`Codebook`]: Deterministic bijection with per-category monotone
//!   counters; `save`/`load` persist `{seed, forward, category_counters}`.
//! * [`TermCategory`]: The closed set of sealable term categories.
//!
//! **Sealing**
//!
//! * [`SealingConfig`]: Layer toggles plus structural/numeric settings,
//!   loadable from YAML with an embedded default.
//! * [`SealingPipeline`]: Per-run orchestrator with the
//!   uninitialized -> sealing -> finalized lifecycle.
//!
//! **Export policy**
//!
//! * [`export_sealed_records`]: Refuses to write a sealed export next to a
//!   codebook file.
//!
//! ## Usage Example
//!
//! ```rust
//! use paperseal_core::{PaperRecord, SealingPipeline};
//! use anyhow::Result;
//!
//! fn main() -> Result<()> {
//!     let record = PaperRecord {
//!         paper_id: "p-001".to_string(),
//!         title: "Deep Residual Learning".to_string(),
//!         keywords: vec!["residual learning".to_string()],
//!         year: Some(2015),
//!         ..Default::default()
//!     };
//!
//!     let mut pipeline = SealingPipeline::with_default_config(42)?;
//!     let sealed = pipeline.seal_record(&record)?;
//!
//!     assert_eq!(sealed.paper_id, record.paper_id);
//!     assert!(sealed.year.is_none());
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! The library uses the [`SealError`] enum for fallible operations. Malformed
//! input fails the whole batch fast and loudly; "not found" and
//! "empty-but-valid input" are success values, never errors.
//!
//! ## Design Principles
//!
//! * **Deterministic:** Same seed, same call sequence, same output - always.
//! * **Explicitly owned state:** The codebook is passed and owned, never a
//!   singleton; all mutation funnels through its API surface.
//! * **Composable:** Each sealing layer can be enabled or disabled
//!   independently without affecting the others.
//! * **Testable:** Logic is easily unit-testable in isolation.
//!
//! ---
//! License: MIT OR Apache-2.0

// All modules must be declared before they can be used.
pub mod codebook;
pub mod config;
pub mod determinism;
pub mod errors;
pub mod export;
pub mod pipeline;
pub mod record;
pub mod sealers;

/// Re-exports the record model and line-delimited JSON I/O.
pub use record::{load_records, save_records, PaperRecord, ResultMetrics};

/// Re-exports the custom error type for clear error reporting.
pub use errors::SealError;

/// Re-exports the codebook and its category enumeration.
pub use codebook::{normalize_term, Codebook, TermCategory};

/// Re-exports the sealing configuration types and helpers.
pub use config::{
    merge_substitutions,
    NumericConfig,
    SealingConfig,
    StructuralConfig,
    SubstitutionRule,
    MAX_NUMERIC_OFFSET,
    MAX_PHRASE_LENGTH,
};

/// Re-exports the deterministic seeded source used by every layer.
pub use determinism::SeededSource;

/// Re-exports the per-layer sealers for advanced composition.
pub use sealers::{LexicalSealer, NumericSealer, StructuralSealer};

/// Re-exports the pipeline orchestrator and its lifecycle states.
pub use pipeline::{PipelineState, SealingPipeline};

/// Re-exports the export policy guard.
pub use export::{export_sealed_records, is_codebook_file, SEALED_EXPORT_FILE};
