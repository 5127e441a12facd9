//! Origin provenance: `source:count` pairs joined by a delimiter.
//!
//! ```text
//! "A1:5 — B2:3"  →  {A1: 5, B2: 3}
//! ```
//!
//! Merging sums counts per source id. Rendering sorts the rendered
//! `id:count` strings, so the output is a deterministic function of the
//! contents, not of the merge order.

use std::collections::BTreeMap;

use crate::error::{OntoError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Provenance {
    counts: BTreeMap<String, u64>,
}

impl Provenance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(source: &str, count: u64) -> Self {
        let mut p = Self::new();
        p.add(source, count);
        p
    }

    /// Empty segments are skipped; anything else must be `id:count`.
    pub fn parse(text: &str, delimiter: &str) -> Result<Self> {
        let mut p = Self::new();
        for segment in text.split(delimiter) {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let (source, count) = segment
                .rsplit_once(':')
                .ok_or_else(|| OntoError::MalformedProvenance(segment.to_string()))?;
            let count: u64 = count
                .trim()
                .parse()
                .map_err(|_| OntoError::MalformedProvenance(segment.to_string()))?;
            p.add(source.trim(), count);
        }
        Ok(p)
    }

    /// Counts saturate at `u64::MAX`.
    pub fn add(&mut self, source: &str, count: u64) {
        let slot = self.counts.entry(source.to_string()).or_insert(0);
        *slot = slot.saturating_add(count);
    }

    pub fn absorb(&mut self, other: &Provenance) {
        for (source, count) in &other.counts {
            self.add(source, *count);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn count_of(&self, source: &str) -> Option<u64> {
        self.counts.get(source).copied()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(s, c)| (s.as_str(), *c))
    }

    pub fn render(&self, delimiter: &str) -> String {
        let mut rendered: Vec<String> = self
            .counts
            .iter()
            .map(|(source, count)| format!("{source}:{count}"))
            .collect();
        rendered.sort();
        rendered.join(delimiter)
    }
}

/// Frequency field value as a number. Anything that does not parse as an
/// integer counts as zero.
pub fn parse_freq(value: &str) -> i64 {
    value.trim().parse().unwrap_or(0)
}
