//! Sealing pipeline: composes the three layers over a record corpus.
//!
//! A pipeline instance owns one codebook per run and moves through the states
//! uninitialized -> sealing -> finalized. After finalization the codebook has
//! been persisted; sealing further records under the same identity would
//! silently grow the codebook and break reproducibility for the batches
//! already sealed, so it is an explicit error.
//!
//! The pipeline never mutates its input: every record is deep-copied before
//! the enabled layers run in the fixed order L1 -> L2 -> L3.
//!
//! License: MIT OR Apache-2.0

use std::path::Path;

use anyhow::{anyhow, Context};
use log::{debug, info};

use crate::codebook::Codebook;
use crate::config::SealingConfig;
use crate::determinism::SeededSource;
use crate::errors::SealError;
use crate::record::PaperRecord;
use crate::sealers::{LexicalSealer, NumericSealer, StructuralSealer};

/// Lifecycle of a pipeline instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Uninitialized,
    Sealing,
    Finalized,
}

pub struct SealingPipeline {
    config: SealingConfig,
    codebook: Codebook,
    lexical: LexicalSealer,
    structural: Option<StructuralSealer>,
    numeric: NumericSealer,
    state: PipelineState,
}

impl SealingPipeline {
    /// Builds a pipeline for one sealing run with an explicit seed.
    ///
    /// The substitution table is compiled once here; an invalid configuration
    /// fails construction rather than the first seal.
    pub fn new(seed: u64, config: SealingConfig) -> Result<Self, SealError> {
        config.validate()?;
        let source = SeededSource::new(seed);

        let structural = if config.enable_structural {
            Some(
                StructuralSealer::new(&config.structural, &source)
                    .context("Failed to compile the structural substitution table")?,
            )
        } else {
            None
        };
        let numeric = NumericSealer::new(config.numeric.clone(), source);

        debug!(
            "Pipeline ready (seed {seed}, lexical={}, structural={}, numeric={})",
            config.enable_lexical, config.enable_structural, config.enable_numeric
        );
        Ok(Self {
            config,
            codebook: Codebook::new(seed),
            lexical: LexicalSealer::new(),
            structural,
            numeric,
            state: PipelineState::Uninitialized,
        })
    }

    /// Convenience constructor using the embedded default configuration.
    pub fn with_default_config(seed: u64) -> Result<Self, SealError> {
        let config = SealingConfig::load_default().map_err(SealError::AnyhowWrapper)?;
        Self::new(seed, config)
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn codebook(&self) -> &Codebook {
        &self.codebook
    }

    /// Seals a deep copy of `record` through the enabled layers.
    pub fn seal_record(&mut self, record: &PaperRecord) -> Result<PaperRecord, SealError> {
        if self.state == PipelineState::Finalized {
            return Err(SealError::PipelineFinalized);
        }
        record.validate()?;
        self.state = PipelineState::Sealing;

        let mut sealed = record.clone();
        if self.config.enable_lexical {
            self.lexical.apply(&mut sealed, &mut self.codebook);
        }
        if let Some(structural) = &self.structural {
            structural.apply(&mut sealed);
        }
        if self.config.enable_numeric {
            self.numeric.apply(&mut sealed);
        }
        Ok(sealed)
    }

    /// Seals each record independently. The shared codebook is the only
    /// cross-record state, which is why duplicate terms across records
    /// collapse to the same pseudotoken.
    pub fn seal_records(&mut self, records: &[PaperRecord]) -> Result<Vec<PaperRecord>, SealError> {
        let mut sealed = Vec::with_capacity(records.len());
        for record in records {
            sealed.push(self.seal_record(record)?);
        }
        info!("Sealed {} records.", sealed.len());
        Ok(sealed)
    }

    /// Persists the codebook and closes the pipeline to further sealing.
    pub fn finalize<P: AsRef<Path>>(&mut self, codebook_path: P) -> Result<(), SealError> {
        if self.state == PipelineState::Finalized {
            return Err(anyhow!("Pipeline is already finalized").into());
        }
        self.codebook.save(codebook_path.as_ref())?;
        self.state = PipelineState::Finalized;
        info!(
            "Pipeline finalized; codebook persisted to {}.",
            codebook_path.as_ref().display()
        );
        Ok(())
    }
}
