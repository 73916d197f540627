//! Budget curve analysis: leakage as a function of attacker text budget.
//!
//! For each token budget, every sealed record's tokenized text is truncated to
//! the budget and its retained keyword set shrunk proportionally, then both
//! attack postures re-run. Each point is computed independently; the curve is
//! usually monotone non-decreasing in the budget, but nothing here assumes it.
//!
//! License: MIT OR APACHE 2.0

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info};
use paperseal_core::PaperRecord;
use serde::{Deserialize, Serialize};

use crate::engine::{AdaptiveAttackEngine, AttackOptions};
use crate::index::{tokenize, RetrievalIndex};

/// One measured point on a curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub budget: usize,
    pub top1: f64,
}

/// Both postures' curves for one setup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostureCurves {
    pub black_box: Vec<CurvePoint>,
    pub white_box: Vec<CurvePoint>,
}

/// The on-disk curve file: `{budgets, curves: {setup_name: {...}}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetCurveFile {
    pub budgets: Vec<usize>,
    pub curves: BTreeMap<String, PostureCurves>,
}

impl BudgetCurveFile {
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize budget curve file")
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json_string()?;
        fs::write(path, json)
            .with_context(|| format!("writing budget curve file to {}", path.display()))?;
        info!("Wrote budget curve file to {}.", path.display());
        Ok(())
    }
}

/// Re-invokes the attack engine at each budget over truncated sealed records.
pub struct BudgetCurveRunner {
    options: AttackOptions,
    budgets: Vec<usize>,
}

impl BudgetCurveRunner {
    pub fn new(options: AttackOptions, budgets: Vec<usize>) -> Self {
        Self { options, budgets }
    }

    /// Measures one setup's curves and merges them into a curve file.
    pub fn run(
        &self,
        setup_name: &str,
        sealed: &[PaperRecord],
        index: &RetrievalIndex,
        reverse: Option<&BTreeMap<String, String>>,
    ) -> BudgetCurveFile {
        let engine = AdaptiveAttackEngine::new(index, self.options.clone());
        let mut curves = PostureCurves::default();

        for &budget in &self.budgets {
            let truncated: Vec<PaperRecord> = sealed
                .iter()
                .map(|record| truncate_record(record, budget))
                .collect();
            debug!("Budget {budget}: evaluating {} truncated records", truncated.len());

            let black = engine.run(&truncated, None);
            curves.black_box.push(CurvePoint { budget, top1: black.retrieval_top1 });

            let white = engine.run(&truncated, reverse);
            curves.white_box.push(CurvePoint { budget, top1: white.retrieval_top1 });
        }

        let mut file = BudgetCurveFile {
            budgets: self.budgets.clone(),
            curves: BTreeMap::new(),
        };
        file.curves.insert(setup_name.to_string(), curves);
        info!(
            "Measured budget curves for setup '{setup_name}' over {} budgets.",
            self.budgets.len()
        );
        file
    }
}

/// Truncates a sealed record's token stream to `budget` tokens and shrinks its
/// keyword set proportionally. Identifiers and results pass through unchanged.
fn truncate_record(record: &PaperRecord, budget: usize) -> PaperRecord {
    let text = [
        record.title.as_str(),
        record.background.as_str(),
        record.mechanism.as_str(),
        record.experiment.as_str(),
    ]
    .join(" ");
    let tokens = tokenize(&text);
    let total = tokens.len();

    let fraction = if total == 0 {
        1.0
    } else {
        (budget as f64 / total as f64).min(1.0)
    };
    let kept_keywords = ((record.keywords.len() as f64 * fraction).ceil() as usize)
        .min(record.keywords.len());

    let mut truncated = record.clone();
    truncated.title = String::new();
    truncated.mechanism = String::new();
    truncated.experiment = String::new();
    truncated.background = tokens
        .into_iter()
        .take(budget)
        .collect::<Vec<_>>()
        .join(" ");
    truncated.keywords = record.keywords[..kept_keywords].to_vec();
    truncated
}
