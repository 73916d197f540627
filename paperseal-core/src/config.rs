//! Configuration management for `paperseal-core`.
//!
//! This module defines the sealing configuration: per-layer enable flags, the
//! structural substitution table, and the numeric perturbation settings. It
//! handles serialization/deserialization of YAML configurations and provides
//! utilities for loading, merging, and validating them.
//!
//! The substitution table and the numeric bin edges are configuration data on
//! purpose: only the invariants (bounded perturbation, seeded determinism,
//! identity preservation) are fixed in code.
//!
//! License: MIT OR Apache-2.0

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{bail, Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Maximum allowed length for a substitution phrase.
pub const MAX_PHRASE_LENGTH: usize = 200;

/// Hard ceiling on the numeric perturbation bound. Sealed scalars must stay
/// within 0.15 of the original value in the metric's native scale.
pub const MAX_NUMERIC_OFFSET: f64 = 0.15;

/// A single structural substitution: a recognizable term-of-art phrase and
/// the generic synonyms it may be rewritten to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case", default)]
pub struct SubstitutionRule {
    pub phrase: String,
    pub synonyms: Vec<String>,
}

/// Settings for the structural sealing layer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StructuralConfig {
    pub substitutions: Vec<SubstitutionRule>,
}

/// Settings for the numeric sealing layer.
///
/// `bin_edges`, when present, snaps a scalar to its bin midpoint before the
/// bounded offset is applied. Edges must be strictly ascending.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NumericConfig {
    pub max_offset: f64,
    pub bin_edges: Option<Vec<f64>>,
    pub delta_bucket: Option<f64>,
}

impl Default for NumericConfig {
    fn default() -> Self {
        Self {
            max_offset: 0.12,
            bin_edges: None,
            delta_bucket: None,
        }
    }
}

/// The top-level sealing configuration: three independently toggled layers.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SealingConfig {
    pub enable_lexical: bool,
    pub enable_structural: bool,
    pub enable_numeric: bool,
    pub structural: StructuralConfig,
    pub numeric: NumericConfig,
}

impl Default for SealingConfig {
    fn default() -> Self {
        Self {
            enable_lexical: true,
            enable_structural: true,
            enable_numeric: true,
            structural: StructuralConfig::default(),
            numeric: NumericConfig::default(),
        }
    }
}

impl SealingConfig {
    /// Loads a sealing configuration from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading sealing configuration from: {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: SealingConfig = serde_yml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config.validate()?;
        info!(
            "Loaded {} substitution rules from file {}.",
            config.structural.substitutions.len(),
            path.display()
        );
        Ok(config)
    }

    /// Loads the built-in default configuration from the embedded YAML.
    pub fn load_default() -> Result<Self> {
        debug!("Loading default sealing configuration from embedded string...");
        let default_yaml = include_str!("../config/default_sealing.yaml");
        let config: SealingConfig =
            serde_yml::from_str(default_yaml).context("Failed to parse default configuration")?;

        config.validate()?;
        debug!(
            "Loaded {} default substitution rules.",
            config.structural.substitutions.len()
        );
        Ok(config)
    }

    /// Validates table and numeric integrity, collecting every failure.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        let mut phrases = HashSet::new();

        for rule in &self.structural.substitutions {
            if rule.phrase.trim().is_empty() {
                errors.push("A substitution rule has an empty `phrase` field.".to_string());
            } else if !phrases.insert(rule.phrase.to_lowercase()) {
                errors.push(format!("Duplicate substitution phrase found: '{}'.", rule.phrase));
            }

            if rule.phrase.len() > MAX_PHRASE_LENGTH {
                errors.push(format!(
                    "Phrase '{}': length ({}) exceeds maximum allowed ({}).",
                    rule.phrase,
                    rule.phrase.len(),
                    MAX_PHRASE_LENGTH
                ));
            }

            if rule.synonyms.is_empty() {
                errors.push(format!("Phrase '{}' has no synonyms.", rule.phrase));
            } else if rule.synonyms.iter().any(|s| s.trim().is_empty()) {
                errors.push(format!("Phrase '{}' has an empty synonym.", rule.phrase));
            }
        }

        let numeric = &self.numeric;
        if !numeric.max_offset.is_finite() || numeric.max_offset <= 0.0 {
            errors.push(format!(
                "numeric.max_offset must be a positive finite number, got {}.",
                numeric.max_offset
            ));
        } else if numeric.max_offset >= MAX_NUMERIC_OFFSET {
            errors.push(format!(
                "numeric.max_offset ({}) must be below the sealing bound ({}).",
                numeric.max_offset, MAX_NUMERIC_OFFSET
            ));
        }

        if let Some(edges) = &numeric.bin_edges {
            if edges.iter().any(|e| !e.is_finite()) {
                errors.push("numeric.bin_edges must all be finite.".to_string());
            } else if edges.windows(2).any(|w| w[0] >= w[1]) {
                errors.push("numeric.bin_edges must be strictly ascending.".to_string());
            }
        }

        if let Some(bucket) = numeric.delta_bucket {
            if !bucket.is_finite() || bucket <= 0.0 {
                errors.push(format!(
                    "numeric.delta_bucket must be a positive finite number, got {bucket}."
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            bail!("Sealing configuration validation failed:\n- {}", errors.join("\n- "));
        }
    }
}

/// Merges a user-supplied substitution table over the defaults.
///
/// User rules replace default rules with the same phrase; unknown phrases are
/// appended. Rule order follows the default table, then any new user phrases
/// in their given order, so compiled pattern order stays deterministic.
pub fn merge_substitutions(
    default_config: StructuralConfig,
    user_config: Option<StructuralConfig>,
) -> StructuralConfig {
    debug!(
        "merge_substitutions called. Initial default rule count: {}",
        default_config.substitutions.len()
    );

    let Some(user_cfg) = user_config else {
        return default_config;
    };

    let mut overrides: HashMap<String, SubstitutionRule> = HashMap::new();
    let mut extra: Vec<SubstitutionRule> = Vec::new();
    let default_phrases: HashSet<String> = default_config
        .substitutions
        .iter()
        .map(|r| r.phrase.to_lowercase())
        .collect();

    for user_rule in user_cfg.substitutions {
        let key = user_rule.phrase.to_lowercase();
        if default_phrases.contains(&key) {
            debug!("Overriding default substitution for phrase '{}'", user_rule.phrase);
            overrides.insert(key, user_rule);
        } else {
            extra.push(user_rule);
        }
    }

    let mut merged: Vec<SubstitutionRule> = default_config
        .substitutions
        .into_iter()
        .map(|rule| {
            overrides
                .remove(&rule.phrase.to_lowercase())
                .unwrap_or(rule)
        })
        .collect();
    if !extra.is_empty() {
        warn!("Appending {} user-only substitution phrases.", extra.len());
        merged.extend(extra);
    }

    debug!("Final total substitution rules after merge: {}", merged.len());
    StructuralConfig { substitutions: merged }
}
