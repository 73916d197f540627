//! Retrieval index over a raw (unsealed) corpus.
//!
//! For every record, the index holds a lower-cased alphanumeric token multiset
//! over the concatenated text surface (title, background, mechanism,
//! experiment, keywords) plus the record's normalized keyword set, keyed by
//! `paper_id`. Keys live in a `BTreeMap` so every scan over the corpus visits
//! records in the same order on every run.
//!
//! License: MIT OR APACHE 2.0

use std::collections::{BTreeMap, BTreeSet};

use log::info;
use paperseal_core::{normalize_term, PaperRecord};
use serde::{Deserialize, Serialize};

/// Lower-cases `text` and splits it into non-empty alphanumeric tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// A token multiset with min-count intersection / max-count union math.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBag {
    counts: BTreeMap<String, u32>,
    total: u32,
}

impl TokenBag {
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut counts: BTreeMap<String, u32> = BTreeMap::new();
        let mut total = 0u32;
        for token in tokens {
            *counts.entry(token.as_ref().to_string()).or_insert(0) += 1;
            total += 1;
        }
        Self { counts, total }
    }

    pub fn from_text(text: &str) -> Self {
        Self::from_tokens(tokenize(text))
    }

    pub fn len(&self) -> u32 {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Multiset intersection size: sum over shared tokens of the min count.
    pub fn overlap(&self, other: &TokenBag) -> u32 {
        let (small, large) = if self.counts.len() <= other.counts.len() {
            (self, other)
        } else {
            (other, self)
        };
        small
            .counts
            .iter()
            .filter_map(|(token, count)| large.counts.get(token).map(|c| (*count).min(*c)))
            .sum()
    }

    /// Multiset union size: total counts minus the overlap.
    pub fn union_size(&self, other: &TokenBag) -> u32 {
        self.total + other.total - self.overlap(other)
    }

    /// Intersection-over-union similarity in `[0, 1]`. Two empty bags score 0.
    pub fn iou(&self, other: &TokenBag) -> f64 {
        let union = self.union_size(other);
        if union == 0 {
            return 0.0;
        }
        f64::from(self.overlap(other)) / f64::from(union)
    }
}

/// Per-record index entry: the token bag and the normalized real keywords.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub bag: TokenBag,
    pub keywords: BTreeSet<String>,
}

/// Token-bag representation of a raw corpus, keyed by `paper_id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalIndex {
    entries: BTreeMap<String, IndexEntry>,
}

impl RetrievalIndex {
    /// Builds the index from a raw corpus. Later duplicates of a `paper_id`
    /// replace earlier ones.
    pub fn build(records: &[PaperRecord]) -> Self {
        let mut entries = BTreeMap::new();
        for record in records {
            let entry = IndexEntry {
                bag: TokenBag::from_text(&record.text_surface()),
                keywords: record
                    .keywords
                    .iter()
                    .map(|k| normalize_term(k))
                    .filter(|k| !k.is_empty())
                    .collect(),
            };
            entries.insert(record.paper_id.clone(), entry);
        }
        info!("Built retrieval index over {} records.", entries.len());
        Self { entries }
    }

    pub fn contains(&self, paper_id: &str) -> bool {
        self.entries.contains_key(paper_id)
    }

    pub fn get(&self, paper_id: &str) -> Option<&IndexEntry> {
        self.entries.get(paper_id)
    }

    /// Iterates entries in ascending `paper_id` order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &IndexEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_lowercases_and_splits() {
        assert_eq!(
            tokenize("Deep Residual-Learning, 2015!"),
            vec!["deep", "residual", "learning", "2015"]
        );
        assert!(tokenize("  ---  ").is_empty());
    }

    #[test]
    fn test_bag_overlap_uses_min_counts() {
        let a = TokenBag::from_tokens(["x", "x", "y"]);
        let b = TokenBag::from_tokens(["x", "y", "y", "z"]);
        assert_eq!(a.overlap(&b), 2);
        assert_eq!(a.union_size(&b), 5);
    }

    #[test]
    fn test_iou_identical_bags() {
        let a = TokenBag::from_text("residual learning works");
        assert_eq!(a.iou(&a), 1.0);
    }

    #[test]
    fn test_iou_empty_bags_is_zero() {
        let a = TokenBag::default();
        assert_eq!(a.iou(&a), 0.0);
    }

    #[test]
    fn test_index_keys_and_keywords() {
        let records = vec![PaperRecord {
            paper_id: "p-1".to_string(),
            title: "Residual Learning".to_string(),
            keywords: vec!["Residual  Learning".to_string()],
            ..Default::default()
        }];
        let index = RetrievalIndex::build(&records);
        assert!(index.contains("p-1"));
        let entry = index.get("p-1").unwrap();
        assert!(entry.keywords.contains("residual learning"));
        assert!(entry.bag.len() > 0);
    }
}
