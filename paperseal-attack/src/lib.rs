// paperseal-attack/src/lib.rs
//! # PaperSeal Attack Library
//!
//! `paperseal-attack` measures - adversarially - how much identifying
//! information still leaks out of a sealed corpus produced by
//! `paperseal-core`. It provides a retrieval index over the raw corpus, an
//! adaptive attack engine with black-box and white-box postures, report
//! construction, and a budget-curve runner that relates attacker text budget
//! to re-identification success.
//!
//! The sealing transform and the attacker are two halves of one design: the
//! transform is only meaningful paired with an attacker that tries to reverse
//! it, and the attacker's metrics are only meaningful against a concrete,
//! reproducible transform.
//!
//! ## Modules
//!
//! * `index`: Tokenization, token-bag multiset math, and the raw-corpus
//!   retrieval index.
//! * `engine`: The adaptive attack engine - retrieval top-1/top-3, keyword
//!   recovery, composite leakage - under both postures.
//! * `report`: The paired black-box/white-box attack report, rounded to 4
//!   decimal places with stable serialization.
//! * `budget`: The budget-curve runner and its on-disk curve file.
//!
//! ## Usage Example
//!
//! ```rust
//! use paperseal_attack::{AdaptiveAttackEngine, AttackOptions, AttackReport, RetrievalIndex};
//! use paperseal_core::{PaperRecord, SealingPipeline};
//! use anyhow::Result;
//!
//! fn main() -> Result<()> {
//!     let raw = vec![PaperRecord {
//!         paper_id: "p-001".to_string(),
//!         title: "Deep Residual Learning".to_string(),
//!         keywords: vec!["residual learning".to_string()],
//!         ..Default::default()
//!     }];
//!
//!     let mut pipeline = SealingPipeline::with_default_config(42)?;
//!     let sealed = pipeline.seal_records(&raw)?;
//!     let reverse = pipeline.codebook().reverse_map();
//!
//!     let index = RetrievalIndex::build(&raw);
//!     let engine = AdaptiveAttackEngine::new(&index, AttackOptions::default());
//!     let black_box = engine.run(&sealed, None);
//!     let white_box = engine.run(&sealed, Some(&reverse));
//!
//!     let report = AttackReport::build(&black_box, &white_box);
//!     println!("{}", report.to_json_string()?);
//!     Ok(())
//! }
//! ```
//!
//! ## Determinism
//!
//! Given the same `(sealed corpus, raw corpus, reverse map or none, seed)`,
//! every result - including the serialized report and curve files - is
//! bit-identical across runs. Corpus scans visit candidates in ascending
//! `paper_id` order and subsampling ranks by a seeded HMAC score.
//!
//! ---
//! License: MIT OR Apache-2.0

pub mod budget;
pub mod engine;
pub mod index;
pub mod report;

/// Re-exports tokenization and the raw-corpus retrieval index.
pub use index::{tokenize, IndexEntry, RetrievalIndex, TokenBag};

/// Re-exports the attack engine and its result types.
pub use engine::{
    AdaptiveAttackEngine,
    AttackEvaluation,
    AttackOptions,
    AttackPosture,
    AttackResult,
    TrialDetail,
};

/// Re-exports the attack report types.
pub use report::{round4, AttackReport, PostureReport};

/// Re-exports the budget-curve runner and file types.
pub use budget::{BudgetCurveFile, BudgetCurveRunner, CurvePoint, PostureCurves};
