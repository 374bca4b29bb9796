#![forbid(unsafe_code)]

//! Deterministic stand-in for a remote, paged dataset.
//!
//! Rows are JSON objects `{"id", "name"}` derived from their index and a
//! seed, so two runs with the same seed see byte-identical pages.

use serde_json::{Value, json};

use crate::trace::fnv1a;

const WORDS: [&str; 12] = [
    "amber", "basalt", "cedar", "delta", "ember", "fjord", "garnet", "harbor", "indigo", "juniper",
    "kelp", "lumen",
];

/// A fake dataset of `size` rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeDataset {
    size: usize,
    seed: u64,
    malformed_every: Option<usize>,
}

impl FakeDataset {
    /// Dataset of `size` rows.
    #[must_use]
    pub const fn new(size: usize, seed: u64) -> Self {
        Self {
            size,
            seed,
            malformed_every: None,
        }
    }

    /// Drop the identity of every `n`th row (`n > 0`).
    #[must_use]
    pub const fn with_malformed_every(mut self, n: usize) -> Self {
        self.malformed_every = if n == 0 { None } else { Some(n) };
        self
    }

    /// Number of rows.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Row at `index`, `None` past the end.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<Value> {
        if index >= self.size {
            return None;
        }
        let hash = self.hash(index);
        let word = WORDS[(hash % WORDS.len() as u64) as usize];
        let name = format!("{word} {index}");
        if self.malformed_every.is_some_and(|n| index % n == n - 1) {
            return Some(json!({ "name": name }));
        }
        Some(json!({
            "id": format!("row-{index:06}"),
            "name": name,
            "checksum": format!("{hash:016x}"),
        }))
    }

    /// Up to `len` rows starting at `start`.
    #[must_use]
    pub fn page(&self, start: usize, len: usize) -> Vec<Value> {
        let end = start.saturating_add(len).min(self.size);
        (start.min(end)..end).filter_map(|index| self.row(index)).collect()
    }

    fn hash(&self, index: usize) -> u64 {
        let mut bytes = [0u8; 16];
        bytes[..8].copy_from_slice(&self.seed.to_le_bytes());
        bytes[8..].copy_from_slice(&(index as u64).to_le_bytes());
        fnv1a(&bytes)
    }
}
