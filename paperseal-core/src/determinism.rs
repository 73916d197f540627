//! Deterministic seeded randomness for `paperseal-core`.
//!
//! Every pseudo-random decision in the sealing layers (structural synonym
//! choice, numeric offsets, pool rotation) and in the attack engine
//! (subsample ranking) is derived from an HMAC-SHA256 score keyed by an
//! explicit seed. Nothing in this module reads wall-clock time, environment
//! state, or an ambient RNG, so every run with the same seed is bit-identical.
//!
//! License: MIT OR Apache-2.0

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

// A fixed salt used to derive the per-run key from the caller's seed.
const SEED_DERIVATION_SALT: &[u8] = b"paperseal-seed-derivation-v1-salt";

/// A deterministic, seed-keyed source of scores, indices, and fractions.
///
/// Constructed from an explicit `u64` seed and passed into every component
/// that needs reproducible "randomness". Cloning is cheap; the source is
/// stateless beyond its derived key, so concurrent read-only use is safe.
#[derive(Debug, Clone)]
pub struct SeededSource {
    seed: u64,
    key: Vec<u8>,
}

impl SeededSource {
    pub fn new(seed: u64) -> Self {
        let mut mac = HmacSha256::new_from_slice(SEED_DERIVATION_SALT)
            .expect("HMAC accepts keys of any length");
        mac.update(&seed.to_le_bytes());
        let key = mac.finalize().into_bytes().to_vec();
        Self { seed, key }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Raw 32-byte score over `(domain, parts...)`.
    ///
    /// `domain` separates independent decision streams so that, for example,
    /// structural synonym choices never correlate with numeric offsets made
    /// for the same record.
    pub fn score_bytes(&self, domain: &str, parts: &[&str]) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .expect("HMAC accepts keys of any length");
        mac.update(domain.as_bytes());
        for part in parts {
            mac.update(b"\x1f");
            mac.update(part.as_bytes());
        }
        mac.finalize().into_bytes().to_vec()
    }

    /// Hex-encoded score, usable as a deterministic rank key.
    pub fn score_hex(&self, domain: &str, parts: &[&str]) -> String {
        hex::encode(self.score_bytes(domain, parts))
    }

    /// A uniform-ish index in `0..n` derived from the score prefix.
    ///
    /// `n` must be non-zero; callers guard against empty choice sets before
    /// asking for an index.
    pub fn pick_index(&self, domain: &str, item: &str, n: usize) -> usize {
        debug_assert!(n > 0, "pick_index requires a non-empty choice set");
        (self.prefix_u64(domain, &[item]) % n as u64) as usize
    }

    /// A fraction in `[0, 1)` derived from `(domain, item, field)`.
    pub fn unit_fraction(&self, domain: &str, item: &str, field: &str) -> f64 {
        let x = self.prefix_u64(domain, &[item, field]);
        // 53 mantissa bits keep the conversion exact.
        (x >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Returns the indices of `items` in deterministic shuffled order,
    /// ranking each item by its score. This replaces an ambient shuffle for
    /// subsampling: same seed, same order, regardless of platform.
    pub fn rank<T, F>(&self, domain: &str, items: &[T], label: F) -> Vec<usize>
    where
        F: Fn(&T) -> &str,
    {
        let mut scored: Vec<(Vec<u8>, usize)> = items
            .iter()
            .enumerate()
            .map(|(i, item)| (self.score_bytes(domain, &[label(item)]), i))
            .collect();
        scored.sort();
        scored.into_iter().map(|(_, i)| i).collect()
    }

    fn prefix_u64(&self, domain: &str, parts: &[&str]) -> u64 {
        let bytes = self.score_bytes(domain, parts);
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&bytes[..8]);
        u64::from_le_bytes(prefix)
    }
}
