// paperseal-attack/tests/attack_integration_tests.rs
use std::collections::BTreeMap;

use anyhow::Result;
use paperseal_attack::{
    AdaptiveAttackEngine, AttackOptions, AttackReport, BudgetCurveRunner, RetrievalIndex,
};
use paperseal_core::{PaperRecord, ResultMetrics, SealingPipeline};

fn corpus() -> Vec<PaperRecord> {
    vec![
        PaperRecord {
            paper_id: "p-001".to_string(),
            title: "Deep Residual Learning for Image Recognition".to_string(),
            background: "Very deep networks are hard to train end to end.".to_string(),
            mechanism: "Stacks layers with a residual connection and dropout.".to_string(),
            experiment: "Trained on a large labeled image corpus for weeks.".to_string(),
            results: ResultMetrics {
                metric_main: 0.769,
                delta_vs_prev: 0.034,
                extra: BTreeMap::new(),
            },
            keywords: vec!["residual learning".to_string(), "image classification".to_string()],
            year: Some(2015),
            ..Default::default()
        },
        PaperRecord {
            paper_id: "p-002".to_string(),
            title: "Attention Is All You Need".to_string(),
            background: "Recurrent models process tokens strictly in sequence.".to_string(),
            mechanism: "Replaces recurrence with an attention mechanism.".to_string(),
            experiment: "Evaluated on machine translation benchmarks.".to_string(),
            results: ResultMetrics {
                metric_main: 0.284,
                delta_vs_prev: 0.02,
                extra: BTreeMap::new(),
            },
            keywords: vec!["attention".to_string(), "machine translation".to_string()],
            year: Some(2017),
            ..Default::default()
        },
        PaperRecord {
            paper_id: "p-003".to_string(),
            title: "Playing Atari with Deep Reinforcement Learning".to_string(),
            background: "Agents learn control policies from raw pixels.".to_string(),
            mechanism: "Trains a value network with reinforcement learning.".to_string(),
            experiment: "Evaluated across seven arcade games.".to_string(),
            results: ResultMetrics {
                metric_main: 0.51,
                delta_vs_prev: 0.1,
                extra: BTreeMap::new(),
            },
            keywords: vec!["reinforcement learning".to_string()],
            year: Some(2013),
            ..Default::default()
        },
    ]
}

#[test]
fn test_unsealed_corpus_self_retrieval_is_perfect() {
    let raw = corpus();
    let index = RetrievalIndex::build(&raw);
    let engine = AdaptiveAttackEngine::new(&index, AttackOptions::default());

    let eval = engine.run(&raw, None);
    assert_eq!(eval.retrieval_top1, 1.0);
    assert_eq!(eval.retrieval_top3, 1.0);
    assert_eq!(eval.composite_leakage, 1.0);
    assert_eq!(eval.n_records_eval, 3);
}

#[test]
fn test_white_box_leaks_at_least_as_much_as_black_box() -> Result<()> {
    let raw = corpus();
    let mut pipeline = SealingPipeline::with_default_config(42)?;
    let sealed = pipeline.seal_records(&raw)?;
    let reverse = pipeline.codebook().reverse_map();

    let index = RetrievalIndex::build(&raw);
    let engine = AdaptiveAttackEngine::new(&index, AttackOptions::default());

    let black = engine.run(&sealed, None);
    let white = engine.run(&sealed, Some(&reverse));

    assert!(white.keyword_recovery >= black.keyword_recovery);
    assert!(white.composite_leakage >= black.composite_leakage);
    // The full reverse map restores every sealed keyword exactly.
    assert_eq!(white.keyword_recovery, 1.0);
    Ok(())
}

#[test]
fn test_sealing_reduces_black_box_keyword_recovery_to_zero() -> Result<()> {
    let raw = corpus();
    let mut pipeline = SealingPipeline::with_default_config(42)?;
    let sealed = pipeline.seal_records(&raw)?;

    let index = RetrievalIndex::build(&raw);
    let engine = AdaptiveAttackEngine::new(&index, AttackOptions::default());
    let black = engine.run(&sealed, None);

    // Every keyword was replaced by a pseudotoken no raw record contains.
    assert_eq!(black.keyword_recovery, 0.0);
    Ok(())
}

#[test]
fn test_attack_ratios_stay_in_unit_interval() -> Result<()> {
    let raw = corpus();
    let mut pipeline = SealingPipeline::with_default_config(7)?;
    let sealed = pipeline.seal_records(&raw)?;
    let reverse = pipeline.codebook().reverse_map();

    let index = RetrievalIndex::build(&raw);
    let engine = AdaptiveAttackEngine::new(&index, AttackOptions::default());

    for eval in [engine.run(&sealed, None), engine.run(&sealed, Some(&reverse))] {
        for ratio in [
            eval.retrieval_top1,
            eval.retrieval_top3,
            eval.keyword_recovery,
            eval.composite_leakage,
        ] {
            assert!((0.0..=1.0).contains(&ratio));
        }
        let mean =
            (eval.retrieval_top1 + eval.retrieval_top3 + eval.keyword_recovery) / 3.0;
        assert!((eval.composite_leakage - mean).abs() < 1e-12);
    }
    Ok(())
}

#[test]
fn test_report_shape_and_rounding() -> Result<()> {
    let raw = corpus();
    let mut pipeline = SealingPipeline::with_default_config(42)?;
    let sealed = pipeline.seal_records(&raw)?;
    let reverse = pipeline.codebook().reverse_map();

    let index = RetrievalIndex::build(&raw);
    let engine = AdaptiveAttackEngine::new(&index, AttackOptions::default());
    let report = AttackReport::build(
        &engine.run(&sealed, None),
        &engine.run(&sealed, Some(&reverse)),
    );

    let json = report.to_json_string()?;
    let value: serde_json::Value = serde_json::from_str(&json)?;
    for posture in ["black_box", "white_box"] {
        let block = &value[posture];
        assert!(block["retrieval_top1"].is_number());
        assert!(block["retrieval_top3"].is_number());
        assert!(block["keyword_recovery"].is_number());
        assert!(block["composite_leakage"].is_number());
        assert_eq!(block["n_records_total"], 3);
        assert!(block["assumptions"].is_string());
    }
    Ok(())
}

#[test]
fn test_missing_pair_run_returns_zero_metrics() {
    let raw = corpus();
    let index = RetrievalIndex::build(&raw);
    let engine = AdaptiveAttackEngine::new(&index, AttackOptions::default());

    let strangers = vec![PaperRecord {
        paper_id: "unknown-1".to_string(),
        title: "Deep Residual Learning for Image Recognition".to_string(),
        ..Default::default()
    }];
    let eval = engine.run(&strangers, None);
    assert_eq!(eval.n_records_total, 1);
    assert_eq!(eval.n_records_eval, 0);
    assert_eq!(eval.composite_leakage, 0.0);
}

#[test]
fn test_budget_curve_is_byte_identical_across_runs() -> Result<()> {
    let raw = corpus();
    let mut pipeline = SealingPipeline::with_default_config(42)?;
    let sealed = pipeline.seal_records(&raw)?;
    let reverse = pipeline.codebook().reverse_map();

    let index = RetrievalIndex::build(&raw);
    let runner = BudgetCurveRunner::new(AttackOptions::default(), vec![8, 16, 32]);

    let first = runner
        .run("default", &sealed, &index, Some(&reverse))
        .to_json_string()?;
    let second = runner
        .run("default", &sealed, &index, Some(&reverse))
        .to_json_string()?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_budget_curve_files_round_trip() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let raw = corpus();
    let index = RetrievalIndex::build(&raw);
    let runner = BudgetCurveRunner::new(AttackOptions::default(), vec![4, 8]);

    let file = runner.run("identity", &raw, &index, None);
    let path = dir.path().join("curves.json");
    file.save(&path)?;

    let text = std::fs::read_to_string(&path)?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    assert_eq!(value["budgets"], serde_json::json!([4, 8]));
    assert!(value["curves"]["identity"]["black_box"].is_array());
    assert!(value["curves"]["identity"]["white_box"].is_array());
    Ok(())
}
