//! Adaptive leakage attack engine.
//!
//! Runs black-box and white-box re-identification attacks against a sealed
//! corpus using a retrieval index over the raw corpus. The black-box attacker
//! sees only sealed text; the white-box attacker additionally holds the
//! codebook's reverse mapping and substitutes known pseudotokens back to their
//! real terms before tokenizing.
//!
//! Determinism: given the same `(sealed corpus, raw index, reverse map or
//! none, seed)` the results are bit-identical across runs. Corpus scans visit
//! candidates in ascending `paper_id` order, ties go to the lexicographically
//! smaller id, and any subsampling ranks records by a seeded HMAC score
//! instead of shuffling ambiently.
//!
//! License: MIT OR APACHE 2.0

use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::{debug, info};
use paperseal_core::{normalize_term, PaperRecord, SeededSource};
use serde::{Deserialize, Serialize};

use crate::index::{tokenize, RetrievalIndex, TokenBag};

/// How many nearest neighbors the retrieval attack tracks.
const TOP_K: usize = 3;

/// The attacker's posture toward the codebook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackPosture {
    BlackBox,
    WhiteBox,
}

impl AttackPosture {
    pub fn name(&self) -> &'static str {
        match self {
            AttackPosture::BlackBox => "black_box",
            AttackPosture::WhiteBox => "white_box",
        }
    }

    /// Free-text explanation of the posture, embedded in reports.
    pub fn assumptions(&self) -> &'static str {
        match self {
            AttackPosture::BlackBox => {
                "Attacker observes only sealed text; query tokens come directly \
                 from the sealed record. No codebook access."
            }
            AttackPosture::WhiteBox => {
                "Attacker additionally holds the codebook reverse mapping; every \
                 known pseudotoken in the sealed text is substituted back to its \
                 real term before tokenization. Models an attacker who obtained \
                 or brute-forced part of the mapping."
            }
        }
    }
}

/// Engine options. `subsample` caps the observed set for scale; the selection
/// is a deterministic seeded ranking, never an ambient shuffle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackOptions {
    pub seed: u64,
    pub subsample: Option<usize>,
}

impl Default for AttackOptions {
    fn default() -> Self {
        Self { seed: 0, subsample: None }
    }
}

/// Per-trial evidence for one sealed record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialDetail {
    pub paper_id: String,
    pub top1_hit: bool,
    pub top3_hit: bool,
    pub keyword_recovery: f64,
    pub best_candidate: String,
    pub best_score: f64,
}

/// Outcome of a single named attack. Produced fresh per invocation and never
/// mutated after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackResult {
    pub attack_name: String,
    pub success_rate: f64,
    pub n_trials: usize,
    pub details: Vec<TrialDetail>,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// Full metric set for one posture over one sealed corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackEvaluation {
    pub posture: AttackPosture,
    pub retrieval_top1: f64,
    pub retrieval_top3: f64,
    pub keyword_recovery: f64,
    pub composite_leakage: f64,
    pub n_records_total: usize,
    pub n_records_eval: usize,
    pub details: Vec<TrialDetail>,
}

/// A retrieval candidate during the best-k scan.
#[derive(Debug, Clone)]
struct Candidate {
    score: f64,
    paper_id: String,
}

pub struct AdaptiveAttackEngine<'a> {
    index: &'a RetrievalIndex,
    options: AttackOptions,
    source: SeededSource,
}

impl<'a> AdaptiveAttackEngine<'a> {
    pub fn new(index: &'a RetrievalIndex, options: AttackOptions) -> Self {
        let source = SeededSource::new(options.seed);
        Self { index, options, source }
    }

    /// Runs the retrieval and keyword-recovery attacks for one posture.
    ///
    /// Passing a reverse mapping selects the white-box posture; `None` is
    /// black-box. Sealed records whose `paper_id` is absent from the raw
    /// index are excluded from every ratio, and zero eligible records yields
    /// all-zero metrics rather than an error.
    pub fn run(
        &self,
        sealed: &[PaperRecord],
        reverse: Option<&BTreeMap<String, String>>,
    ) -> AttackEvaluation {
        let posture = match reverse {
            Some(_) => AttackPosture::WhiteBox,
            None => AttackPosture::BlackBox,
        };
        let reverse_lower: Option<HashMap<String, String>> = reverse.map(|map| {
            map.iter()
                .map(|(token, term)| (token.to_lowercase(), term.clone()))
                .collect()
        });

        let eligible: Vec<&PaperRecord> = sealed
            .iter()
            .filter(|r| self.index.contains(&r.paper_id))
            .collect();
        let observed = self.subsample(eligible);
        debug!(
            "{} attack over {} of {} sealed records",
            posture.name(),
            observed.len(),
            sealed.len()
        );

        let mut top1_hits = 0usize;
        let mut top3_hits = 0usize;
        let mut keyword_sum = 0.0f64;
        let mut details = Vec::with_capacity(observed.len());

        for record in &observed {
            let query = self.build_query(record, reverse_lower.as_ref());
            let best = self.scan_top_k(&query);

            let top1_hit = best
                .first()
                .map_or(false, |c| c.paper_id == record.paper_id);
            let top3_hit = best.iter().any(|c| c.paper_id == record.paper_id);
            let recovery = self.keyword_recovery(record, reverse_lower.as_ref());

            top1_hits += usize::from(top1_hit);
            top3_hits += usize::from(top3_hit);
            keyword_sum += recovery;

            details.push(TrialDetail {
                paper_id: record.paper_id.clone(),
                top1_hit,
                top3_hit,
                keyword_recovery: recovery,
                best_candidate: best.first().map(|c| c.paper_id.clone()).unwrap_or_default(),
                best_score: best.first().map(|c| c.score).unwrap_or(0.0),
            });
        }

        let n_eval = observed.len();
        let (retrieval_top1, retrieval_top3, keyword_recovery) = if n_eval == 0 {
            (0.0, 0.0, 0.0)
        } else {
            let n = n_eval as f64;
            (top1_hits as f64 / n, top3_hits as f64 / n, keyword_sum / n)
        };
        let composite_leakage = (retrieval_top1 + retrieval_top3 + keyword_recovery) / 3.0;

        info!(
            "{}: top1={retrieval_top1:.4} top3={retrieval_top3:.4} kw={keyword_recovery:.4} over {n_eval} records",
            posture.name()
        );
        AttackEvaluation {
            posture,
            retrieval_top1,
            retrieval_top3,
            keyword_recovery,
            composite_leakage,
            n_records_total: sealed.len(),
            n_records_eval: n_eval,
            details,
        }
    }

    /// The retrieval attack as a standalone result (success = top-1 rate).
    pub fn run_retrieval(
        &self,
        sealed: &[PaperRecord],
        reverse: Option<&BTreeMap<String, String>>,
    ) -> AttackResult {
        let eval = self.run(sealed, reverse);
        let mut metadata = BTreeMap::new();
        metadata.insert("retrieval_top3".to_string(), eval.retrieval_top3.into());
        metadata.insert("assumptions".to_string(), eval.posture.assumptions().into());
        AttackResult {
            attack_name: format!("retrieval_{}", eval.posture.name()),
            success_rate: eval.retrieval_top1,
            n_trials: eval.n_records_eval,
            details: eval.details,
            metadata,
        }
    }

    /// The keyword-recovery attack as a standalone result.
    pub fn run_keyword_recovery(
        &self,
        sealed: &[PaperRecord],
        reverse: Option<&BTreeMap<String, String>>,
    ) -> AttackResult {
        let eval = self.run(sealed, reverse);
        let mut metadata = BTreeMap::new();
        metadata.insert("assumptions".to_string(), eval.posture.assumptions().into());
        AttackResult {
            attack_name: format!("keyword_recovery_{}", eval.posture.name()),
            success_rate: eval.keyword_recovery,
            n_trials: eval.n_records_eval,
            details: eval.details,
            metadata,
        }
    }

    /// Builds the query token bag for a sealed record, reversing known
    /// pseudotokens first in the white-box posture.
    fn build_query(
        &self,
        record: &PaperRecord,
        reverse_lower: Option<&HashMap<String, String>>,
    ) -> TokenBag {
        let surface = record.text_surface();
        match reverse_lower {
            Some(map) => TokenBag::from_tokens(reverse_tokens(&surface, map)),
            None => TokenBag::from_text(&surface),
        }
    }

    /// Scans the whole raw corpus once, keeping only the current best-k
    /// candidates (insert-if-better against the worst of k). No full sort.
    fn scan_top_k(&self, query: &TokenBag) -> Vec<Candidate> {
        let mut best: Vec<Candidate> = Vec::with_capacity(TOP_K);
        for (paper_id, entry) in self.index.iter() {
            let score = query.iou(&entry.bag);
            let candidate = Candidate { score, paper_id: paper_id.clone() };

            let pos = best.iter().position(|b| {
                candidate.score > b.score
                    || (candidate.score == b.score && candidate.paper_id < b.paper_id)
            });
            match pos {
                Some(p) => {
                    best.insert(p, candidate);
                    if best.len() > TOP_K {
                        best.pop();
                    }
                }
                None if best.len() < TOP_K => best.push(candidate),
                None => {}
            }
        }
        best
    }

    /// Fraction of the sealed record's keywords whose (possibly reversed)
    /// normalized form exactly matches a real keyword of the raw record.
    fn keyword_recovery(
        &self,
        record: &PaperRecord,
        reverse_lower: Option<&HashMap<String, String>>,
    ) -> f64 {
        if record.keywords.is_empty() {
            return 0.0;
        }
        let Some(entry) = self.index.get(&record.paper_id) else {
            return 0.0;
        };
        let raw_keywords: &BTreeSet<String> = &entry.keywords;

        let matched = record
            .keywords
            .iter()
            .filter(|keyword| {
                let candidate = match reverse_lower
                    .and_then(|map| map.get(&keyword.to_lowercase()))
                {
                    Some(term) => normalize_term(term),
                    None => normalize_term(keyword),
                };
                raw_keywords.contains(&candidate)
            })
            .count();
        matched as f64 / record.keywords.len() as f64
    }

    /// Deterministically caps the observed set at `options.subsample`.
    fn subsample<'r>(&self, eligible: Vec<&'r PaperRecord>) -> Vec<&'r PaperRecord> {
        let Some(limit) = self.options.subsample else {
            return eligible;
        };
        if eligible.len() <= limit {
            return eligible;
        }
        let order = self
            .source
            .rank("attack-subsample", &eligible, |r| r.paper_id.as_str());
        let mut picked: Vec<usize> = order.into_iter().take(limit).collect();
        picked.sort_unstable();
        picked.into_iter().map(|i| eligible[i]).collect()
    }
}

/// Word-level reversal of pseudotokens: each whitespace-delimited word whose
/// trimmed, lower-cased form is a known pseudotoken is replaced by its real
/// term; everything else passes through unchanged. The result is tokenized
/// afterwards, so multi-word real terms expand naturally.
fn reverse_tokens(text: &str, reverse_lower: &HashMap<String, String>) -> Vec<String> {
    let mut tokens = Vec::new();
    for word in text.split_whitespace() {
        let trimmed: String = word
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        match reverse_lower.get(&trimmed) {
            Some(term) => tokens.extend(tokenize(term)),
            None => tokens.extend(tokenize(word)),
        }
    }
    tokens
}
