//! Codebook: deterministic, bijective term-to-pseudotoken mapping.
//!
//! The codebook is the shared mutable state of a sealing run. Every real-world
//! term that gets sealed is assigned a synthetic pseudotoken drawn from a
//! fixed, category-specific name pool, rotated by the run seed. The mapping is
//! injective for the lifetime of the codebook and fully reproducible for a
//! fixed seed and call sequence.
//!
//! The persisted file holds `{seed, forward, category_counters}` only; the
//! reverse map is rebuilt on load so the two directions can never diverge.
//! A codebook file must never travel with a public sealed export — see
//! `crate::export` for the policy guard.
//!
//! License: MIT OR Apache-2.0

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::determinism::SeededSource;
use crate::errors::SealError;

/// The closed set of term categories a codebook can seal.
///
/// Each category carries its own fixed, ordered name pool and its own
/// monotone counter, so pseudotokens from different categories look different
/// and never collide by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermCategory {
    Model,
    Dataset,
    Metric,
    Technique,
    Venue,
    Author,
    Keyword,
    Generic,
}

impl TermCategory {
    pub const ALL: [TermCategory; 8] = [
        TermCategory::Model,
        TermCategory::Dataset,
        TermCategory::Metric,
        TermCategory::Technique,
        TermCategory::Venue,
        TermCategory::Author,
        TermCategory::Keyword,
        TermCategory::Generic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TermCategory::Model => "model",
            TermCategory::Dataset => "dataset",
            TermCategory::Metric => "metric",
            TermCategory::Technique => "technique",
            TermCategory::Venue => "venue",
            TermCategory::Author => "author",
            TermCategory::Keyword => "keyword",
            TermCategory::Generic => "generic",
        }
    }

    /// The fixed ordered name pool for this category. Pool entries are single
    /// whitespace-free words so pseudotokens survive tokenization intact.
    pub fn name_pool(&self) -> &'static [&'static str] {
        match self {
            TermCategory::Model => &[
                "Aurora", "Basalt", "Cobalt", "Drifter", "Ember", "Falcon", "Garnet", "Halcyon",
                "Indigo", "Juniper",
            ],
            TermCategory::Dataset => &[
                "DS-Alder", "DS-Birch", "DS-Cedar", "DS-Dogwood", "DS-Elm", "DS-Fir", "DS-Hazel",
                "DS-Larch", "DS-Maple", "DS-Oak",
            ],
            TermCategory::Metric => &[
                "score_alpha", "score_beta", "score_gamma", "score_delta", "score_epsilon",
                "score_zeta", "score_eta", "score_theta",
            ],
            TermCategory::Technique => &[
                "Bramble", "Cascade", "Dovetail", "Eddy", "Fulcrum", "Gossamer", "Keystone",
                "Lattice",
            ],
            TermCategory::Venue => &[
                "Conf-Aquila", "Conf-Borealis", "Conf-Cygnus", "Conf-Draco", "Conf-Fornax",
                "Conf-Gemini", "Conf-Hydra", "Conf-Lyra",
            ],
            TermCategory::Author => &[
                "Author-Adler", "Author-Brook", "Author-Calder", "Author-Dunne", "Author-Ellery",
                "Author-Fenwick", "Author-Gale", "Author-Harlow",
            ],
            TermCategory::Keyword => &[
                "kw_amber", "kw_basil", "kw_coral", "kw_dusk", "kw_ember", "kw_fjord", "kw_grove",
                "kw_heath", "kw_iris", "kw_jade",
            ],
            TermCategory::Generic => &[
                "Term-Alpha", "Term-Beta", "Term-Gamma", "Term-Delta", "Term-Epsilon", "Term-Zeta",
                "Term-Eta", "Term-Theta", "Term-Iota", "Term-Kappa",
            ],
        }
    }
}

/// On-disk codebook representation. `reverse` is intentionally absent.
#[derive(Debug, Serialize, Deserialize)]
struct CodebookFile {
    seed: u64,
    forward: BTreeMap<String, String>,
    category_counters: BTreeMap<TermCategory, u64>,
}

/// A seeded bijection from normalized real-world terms to pseudotokens.
#[derive(Debug, Clone)]
pub struct Codebook {
    seed: u64,
    source: SeededSource,
    forward: BTreeMap<String, String>,
    reverse: BTreeMap<String, String>,
    category_counters: BTreeMap<TermCategory, u64>,
}

/// Normalizes a term for mapping: trim, casefold, collapse inner whitespace.
pub fn normalize_term(term: &str) -> String {
    term.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

impl Codebook {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            source: SeededSource::new(seed),
            forward: BTreeMap::new(),
            reverse: BTreeMap::new(),
            category_counters: BTreeMap::new(),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Seals a single term under a category, returning its pseudotoken.
    ///
    /// Idempotent: a term already sealed (under any category) returns its
    /// existing pseudotoken without consuming a counter slot. An empty
    /// normalized term seals to an empty string and is never recorded.
    pub fn seal_term(&mut self, term: &str, category: TermCategory) -> String {
        let normalized = normalize_term(term);
        if normalized.is_empty() {
            return String::new();
        }
        if let Some(existing) = self.forward.get(&normalized) {
            return existing.clone();
        }

        let pseudotoken = self.next_pseudotoken(category);
        debug!(
            "Sealed term under category '{}' -> '{}'",
            category.as_str(),
            pseudotoken
        );
        self.forward.insert(normalized.clone(), pseudotoken.clone());
        self.reverse.insert(pseudotoken.clone(), normalized);
        pseudotoken
    }

    /// Element-wise `seal_term`, preserving order. Duplicates in the input
    /// collapse to the same pseudotoken.
    pub fn seal_terms(&mut self, terms: &[String], category: TermCategory) -> Vec<String> {
        terms
            .iter()
            .map(|term| self.seal_term(term, category))
            .collect()
    }

    /// Read-only forward lookup on the normalized form of `term`.
    pub fn lookup(&self, term: &str) -> Option<&str> {
        self.forward.get(&normalize_term(term)).map(String::as_str)
    }

    /// Read-only reverse lookup by exact pseudotoken.
    pub fn reverse_lookup(&self, pseudotoken: &str) -> Option<&str> {
        self.reverse.get(pseudotoken).map(String::as_str)
    }

    /// A snapshot of the reverse mapping, handed to an authorized white-box
    /// attacker. Black-box attacks never see this.
    pub fn reverse_map(&self) -> BTreeMap<String, String> {
        self.reverse.clone()
    }

    /// Persists `{seed, forward, category_counters}` to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SealError> {
        let path = path.as_ref();
        let file = CodebookFile {
            seed: self.seed,
            forward: self.forward.clone(),
            category_counters: self.category_counters.clone(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| SealError::CodebookParse(format!("serialization failed: {e}")))?;
        fs::write(path, json)?;
        info!(
            "Persisted codebook ({} mappings) to {}.",
            self.forward.len(),
            path.display()
        );
        Ok(())
    }

    /// Restores a codebook from `path`, rebuilding the reverse map.
    ///
    /// A forward map in which two terms share a pseudotoken is a corrupted
    /// artifact and fails the load outright.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SealError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let file: CodebookFile = serde_json::from_str(&text)
            .map_err(|e| SealError::CodebookParse(format!("{}: {e}", path.display())))?;

        let mut reverse = BTreeMap::new();
        for (term, pseudotoken) in &file.forward {
            if reverse.insert(pseudotoken.clone(), term.clone()).is_some() {
                return Err(SealError::DuplicatePseudotoken(pseudotoken.clone()));
            }
        }

        info!(
            "Loaded codebook ({} mappings, seed {}) from {}.",
            file.forward.len(),
            file.seed,
            path.display()
        );
        Ok(Self {
            seed: file.seed,
            source: SeededSource::new(file.seed),
            forward: file.forward,
            reverse,
            category_counters: file.category_counters,
        })
    }

    /// Draws the next fresh pseudotoken for `category`, advancing its counter.
    ///
    /// The pool start offset is seed-derived, so different seeds assign
    /// different names to the same call sequence. The counter only ever
    /// increases; if a candidate is already taken (possible after loading a
    /// codebook whose counters were hand-edited), the draw advances until the
    /// candidate is fresh.
    fn next_pseudotoken(&mut self, category: TermCategory) -> String {
        let pool = category.name_pool();
        let offset = self
            .source
            .pick_index("codebook-pool-offset", category.as_str(), pool.len());

        loop {
            let counter = self.category_counters.entry(category).or_insert(0);
            let index = (offset + *counter as usize) % pool.len();
            let cycle = *counter / pool.len() as u64;
            *counter += 1;

            let candidate = if cycle == 0 {
                pool[index].to_string()
            } else {
                format!("{}_{cycle}", pool[index])
            };
            if !self.reverse.contains_key(&candidate) {
                return candidate;
            }
            warn!(
                "Pseudotoken '{}' already assigned; advancing counter for category '{}'",
                candidate,
                category.as_str()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_term_deterministic_across_instances() {
        let mut a = Codebook::new(42);
        let mut b = Codebook::new(42);
        let terms = ["residual learning", "skip connection", "batch norm"];
        for term in terms {
            assert_eq!(
                a.seal_term(term, TermCategory::Keyword),
                b.seal_term(term, TermCategory::Keyword)
            );
        }
    }

    #[test]
    fn test_seal_term_idempotent_and_counter_advances_once() {
        let mut cb = Codebook::new(42);
        let first = cb.seal_term("residual learning", TermCategory::Keyword);
        let second = cb.seal_term("residual learning", TermCategory::Keyword);
        assert_eq!(first, second);
        assert_eq!(cb.category_counters[&TermCategory::Keyword], 1);
    }

    #[test]
    fn test_distinct_terms_get_distinct_pseudotokens() {
        let mut cb = Codebook::new(42);
        let a = cb.seal_term("residual learning", TermCategory::Keyword);
        let b = cb.seal_term("skip connection", TermCategory::Keyword);
        assert!(!a.is_empty());
        assert!(!b.is_empty());
        assert_ne!(a, b);
    }

    #[test]
    fn test_normalization_collapses_case_and_whitespace() {
        let mut cb = Codebook::new(7);
        let a = cb.seal_term("  Residual   Learning ", TermCategory::Keyword);
        let b = cb.seal_term("residual learning", TermCategory::Keyword);
        assert_eq!(a, b);
        assert_eq!(cb.len(), 1);
    }

    #[test]
    fn test_pool_exhaustion_applies_numeric_suffix() {
        let mut cb = Codebook::new(3);
        let pool_len = TermCategory::Model.name_pool().len();
        let mut tokens = Vec::new();
        for i in 0..pool_len + 2 {
            tokens.push(cb.seal_term(&format!("model number {i}"), TermCategory::Model));
        }
        // All injective, and the overflow draws carry a `_1` suffix.
        let unique: std::collections::BTreeSet<_> = tokens.iter().collect();
        assert_eq!(unique.len(), tokens.len());
        assert!(tokens[pool_len].ends_with("_1"));
        assert!(tokens[pool_len + 1].ends_with("_1"));
    }

    #[test]
    fn test_empty_term_seals_to_empty_without_counter_use() {
        let mut cb = Codebook::new(1);
        assert_eq!(cb.seal_term("   ", TermCategory::Generic), "");
        assert!(cb.is_empty());
        assert!(cb.category_counters.get(&TermCategory::Generic).is_none());
    }

    #[test]
    fn test_lookup_and_reverse_lookup_round_trip() {
        let mut cb = Codebook::new(42);
        let token = cb.seal_term("Transformer", TermCategory::Model);
        assert_eq!(cb.lookup("transformer"), Some(token.as_str()));
        assert_eq!(cb.reverse_lookup(&token), Some("transformer"));
        assert_eq!(cb.lookup("unseen term"), None);
        assert_eq!(cb.reverse_lookup("not-a-token"), None);
    }

    #[test]
    fn test_seal_terms_preserves_order_and_collapses_duplicates() {
        let mut cb = Codebook::new(5);
        let input = vec![
            "alpha".to_string(),
            "beta".to_string(),
            "alpha".to_string(),
        ];
        let sealed = cb.seal_terms(&input, TermCategory::Keyword);
        assert_eq!(sealed.len(), 3);
        assert_eq!(sealed[0], sealed[2]);
        assert_ne!(sealed[0], sealed[1]);
    }
}
