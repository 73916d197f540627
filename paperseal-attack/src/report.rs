//! Attack report construction and serialization.
//!
//! The report pairs the black-box and white-box evaluations of one sealed
//! corpus into the interchange shape consumed by the surrounding benchmark
//! tooling: per-posture metric blocks with all floats rounded to 4 decimal
//! places for reporting stability, eligibility counts, and a free-text
//! statement of each posture's assumptions. Field order is fixed, so the same
//! inputs always serialize to the same bytes.
//!
//! License: MIT OR APACHE 2.0

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

use crate::engine::AttackEvaluation;

/// Rounds to 4 decimal places for reporting stability.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// One posture's metric block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostureReport {
    pub retrieval_top1: f64,
    pub retrieval_top3: f64,
    pub keyword_recovery: f64,
    pub composite_leakage: f64,
    pub n_records_total: usize,
    pub n_records_eval_retrieval: usize,
    pub assumptions: String,
}

impl PostureReport {
    fn from_evaluation(eval: &AttackEvaluation) -> Self {
        Self {
            retrieval_top1: round4(eval.retrieval_top1),
            retrieval_top3: round4(eval.retrieval_top3),
            keyword_recovery: round4(eval.keyword_recovery),
            composite_leakage: round4(eval.composite_leakage),
            n_records_total: eval.n_records_total,
            n_records_eval_retrieval: eval.n_records_eval,
            assumptions: eval.posture.assumptions().to_string(),
        }
    }
}

/// The full attack report: both postures over the same sealed corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackReport {
    pub black_box: PostureReport,
    pub white_box: PostureReport,
}

impl AttackReport {
    pub fn build(black_box: &AttackEvaluation, white_box: &AttackEvaluation) -> Self {
        Self {
            black_box: PostureReport::from_evaluation(black_box),
            white_box: PostureReport::from_evaluation(white_box),
        }
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize attack report")
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json_string()?;
        fs::write(path, json)
            .with_context(|| format!("writing attack report to {}", path.display()))?;
        info!("Wrote attack report to {}.", path.display());
        Ok(())
    }
}
