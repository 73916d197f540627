//! L1 - Lexical sealing layer.
//!
//! Replaces the title and every keyword with codebook pseudotokens and drops
//! the enrichment fields (`year`, `venue`, `authors`), which are strong
//! re-identification signals. `paper_id` and `dependencies` pass through
//! unchanged so the corpus stays graph-consistent.
//!
//! License: MIT OR APACHE 2.0

use log::debug;

use crate::codebook::{Codebook, TermCategory};
use crate::record::PaperRecord;

#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalSealer;

impl LexicalSealer {
    pub fn new() -> Self {
        Self
    }

    /// Applies the lexical layer in place. The codebook is the run's shared
    /// mutable state; duplicate terms across records collapse to the same
    /// pseudotoken by design.
    pub fn apply(&self, record: &mut PaperRecord, codebook: &mut Codebook) {
        record.title = codebook.seal_term(&record.title, TermCategory::Generic);
        record.keywords = codebook.seal_terms(&record.keywords, TermCategory::Keyword);

        if record.year.is_some() || record.venue.is_some() || record.authors.is_some() {
            debug!("Dropping enrichment fields for record '{}'", record.paper_id);
        }
        record.year = None;
        record.venue = None;
        record.authors = None;
    }
}
