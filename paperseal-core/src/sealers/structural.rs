//! L2 - Structural sealing layer.
//!
//! Rewrites recognizable mechanism phrasing using a fixed table of
//! semantically equivalent but lexically distinct substitutions. When a phrase
//! has several synonyms, the seeded source picks one: reproducible per seed,
//! not derivable from the unsealed text alone.
//!
//! License: MIT OR APACHE 2.0

use anyhow::{Context, Result};
use log::debug;
use regex::{NoExpand, Regex};

use crate::config::StructuralConfig;
use crate::determinism::SeededSource;
use crate::record::PaperRecord;

#[derive(Debug)]
struct CompiledSubstitution {
    phrase: String,
    regex: Regex,
    replacement: String,
}

/// Applies the compiled substitution table to a record's mechanism text.
#[derive(Debug)]
pub struct StructuralSealer {
    rules: Vec<CompiledSubstitution>,
}

impl StructuralSealer {
    /// Compiles the substitution table once, resolving each phrase's synonym
    /// choice up front from the seeded source.
    pub fn new(config: &StructuralConfig, source: &SeededSource) -> Result<Self> {
        let mut rules = Vec::with_capacity(config.substitutions.len());
        for rule in &config.substitutions {
            let pattern = format!(r"(?i)\b{}\b", regex::escape(&rule.phrase));
            let regex = Regex::new(&pattern)
                .with_context(|| format!("Failed to compile substitution phrase '{}'", rule.phrase))?;

            let choice = source.pick_index("structural", &rule.phrase, rule.synonyms.len());
            rules.push(CompiledSubstitution {
                phrase: rule.phrase.clone(),
                regex,
                replacement: rule.synonyms[choice].clone(),
            });
        }
        debug!("Compiled {} structural substitutions.", rules.len());
        Ok(Self { rules })
    }

    /// Rewrites the mechanism field in place. `paper_id` is untouched.
    pub fn apply(&self, record: &mut PaperRecord) {
        record.mechanism = self.rewrite(&record.mechanism);
    }

    fn rewrite(&self, text: &str) -> String {
        let mut out = text.to_string();
        for rule in &self.rules {
            if rule.regex.is_match(&out) {
                debug!("Rewriting phrase '{}'", rule.phrase);
                out = rule
                    .regex
                    .replace_all(&out, NoExpand(&rule.replacement))
                    .into_owned();
            }
        }
        out
    }
}
