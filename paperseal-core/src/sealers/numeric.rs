//! L3 - Numeric sealing layer.
//!
//! Perturbs each scalar result by a small bounded offset that is purely a
//! function of `(seed, paper_id, field)` - never wall-clock time or ambient
//! state - so exact values cannot be recovered while coarse relative ordering
//! among records sealed under the same pipeline instance stays usable.
//!
//! Optional pre-steps from the numeric configuration: snapping a value to a
//! configured bin midpoint, and bucketing `delta_vs_prev` to a fixed width.
//!
//! License: MIT OR APACHE 2.0

use std::collections::BTreeMap;

use crate::config::NumericConfig;
use crate::determinism::SeededSource;
use crate::record::PaperRecord;

#[derive(Debug, Clone)]
pub struct NumericSealer {
    config: NumericConfig,
    source: SeededSource,
}

impl NumericSealer {
    pub fn new(config: NumericConfig, source: SeededSource) -> Self {
        Self { config, source }
    }

    /// Perturbs every scalar in `record.results` in place.
    pub fn apply(&self, record: &mut PaperRecord) {
        let paper_id = record.paper_id.clone();
        let results = &mut record.results;

        results.metric_main = self.perturb(results.metric_main, &paper_id, "metric_main");

        let delta_base = match self.config.delta_bucket {
            Some(width) => bucket_midpoint(results.delta_vs_prev, width),
            None => results.delta_vs_prev,
        };
        results.delta_vs_prev = self.offset(delta_base, &paper_id, "delta_vs_prev");

        let extra: BTreeMap<String, f64> = results
            .extra
            .iter()
            .map(|(name, value)| {
                let field = format!("extra.{name}");
                (name.clone(), self.perturb(*value, &paper_id, &field))
            })
            .collect();
        results.extra = extra;
    }

    /// Bin-snap (when configured) followed by the bounded seeded offset.
    fn perturb(&self, value: f64, paper_id: &str, field: &str) -> f64 {
        let base = match &self.config.bin_edges {
            Some(edges) => snap_to_bin(value, edges),
            None => value,
        };
        self.offset(base, paper_id, field)
    }

    /// Adds an offset in `(-max_offset, +max_offset)` derived from
    /// `(seed, paper_id, field)`.
    fn offset(&self, value: f64, paper_id: &str, field: &str) -> f64 {
        let u = self.source.unit_fraction("numeric", paper_id, field);
        value + (2.0 * u - 1.0) * self.config.max_offset
    }
}

/// Midpoint of the containing bin. Values outside the edge range clamp into
/// the first or last bin; fewer than two edges define no bins.
fn snap_to_bin(value: f64, edges: &[f64]) -> f64 {
    if edges.len() < 2 {
        return value;
    }
    let mut lo = edges[0];
    let mut hi = edges[1];
    for window in edges.windows(2) {
        lo = window[0];
        hi = window[1];
        if value < hi {
            break;
        }
    }
    (lo + hi) / 2.0
}

/// Midpoint of the fixed-width bucket containing `value`.
fn bucket_midpoint(value: f64, width: f64) -> f64 {
    ((value / width).floor() + 0.5) * width
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ResultMetrics;

    fn record_with_metric(paper_id: &str, metric_main: f64) -> PaperRecord {
        PaperRecord {
            paper_id: paper_id.to_string(),
            results: ResultMetrics {
                metric_main,
                delta_vs_prev: 0.8,
                extra: BTreeMap::from([("aux".to_string(), 0.5)]),
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_offset_is_bounded() {
        let sealer = NumericSealer::new(NumericConfig::default(), SeededSource::new(42));
        for i in 0..200 {
            let original = 0.7;
            let mut record = record_with_metric(&format!("p-{i}"), original);
            sealer.apply(&mut record);
            assert!((record.results.metric_main - original).abs() < 0.15);
            assert!((record.results.extra["aux"] - 0.5).abs() < 0.15);
        }
    }

    #[test]
    fn test_perturbation_is_deterministic_per_record_and_field() {
        let a = NumericSealer::new(NumericConfig::default(), SeededSource::new(42));
        let b = NumericSealer::new(NumericConfig::default(), SeededSource::new(42));
        let mut r1 = record_with_metric("p-1", 0.7);
        let mut r2 = record_with_metric("p-1", 0.7);
        a.apply(&mut r1);
        b.apply(&mut r2);
        assert_eq!(r1.results, r2.results);
    }

    #[test]
    fn test_different_records_get_different_offsets() {
        let sealer = NumericSealer::new(NumericConfig::default(), SeededSource::new(42));
        let mut r1 = record_with_metric("p-1", 0.7);
        let mut r2 = record_with_metric("p-2", 0.7);
        sealer.apply(&mut r1);
        sealer.apply(&mut r2);
        assert_ne!(r1.results.metric_main, r2.results.metric_main);
    }

    #[test]
    fn test_snap_to_bin_midpoints() {
        let edges = vec![0.0, 0.5, 1.0];
        assert_eq!(snap_to_bin(0.2, &edges), 0.25);
        assert_eq!(snap_to_bin(0.7, &edges), 0.75);
        // Out-of-range values clamp into the boundary bins.
        assert_eq!(snap_to_bin(-1.0, &edges), 0.25);
        assert_eq!(snap_to_bin(2.0, &edges), 0.75);
    }

    #[test]
    fn test_delta_bucketing() {
        let config = NumericConfig {
            delta_bucket: Some(0.5),
            ..Default::default()
        };
        let sealer = NumericSealer::new(config, SeededSource::new(42));
        let mut record = record_with_metric("p-1", 0.7);
        record.results.delta_vs_prev = 0.8;
        sealer.apply(&mut record);
        // Bucketed midpoint 0.75 plus a bounded offset.
        assert!((record.results.delta_vs_prev - 0.75).abs() < 0.15);
    }
}
