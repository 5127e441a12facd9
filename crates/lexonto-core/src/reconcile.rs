//! Diff, merge and decomposition between ontologies.
//!
//! ```text
//!   other ──diff──► shared (other side) + other_only
//!                          │
//!                          ▼
//!              lookup (path prefix, lemma) in base
//!                 │                       │
//!            reconciles               no match
//!                 │                       │
//!   origin ∪ (summed), freq +,     insert at path
//!   level = min, remove + add      (or unfiled/path)
//! ```
//!
//! Two entries reconcile when they are equal outside the origin, freq and
//! level fields. Decomposition runs the other way: a master's provenance is
//! split back into one ontology per source, and per level group.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::Serialize;

use crate::config::ReconcileConfig;
use crate::error::{OntoError, Result};
use crate::legend::relayout;
use crate::provenance::{parse_freq, Provenance};
use crate::trie::{CategoryPath, Entry, PathTrie};
use crate::view::{field_index, set_slot, OntologyView, SetMode};

pub type FlatEntry = (CategoryPath, Entry);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffMode {
    All,
    BaseOnly,
    OtherOnly,
    Shared,
}

impl DiffMode {
    fn wants_base_only(self) -> bool {
        matches!(self, Self::All | Self::BaseOnly)
    }

    fn wants_other_only(self) -> bool {
        matches!(self, Self::All | Self::OtherOnly)
    }

    fn wants_shared(self) -> bool {
        matches!(self, Self::All | Self::Shared)
    }
}

impl FromStr for DiffMode {
    type Err = OntoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "all" => Ok(Self::All),
            "base_only" => Ok(Self::BaseOnly),
            "other_only" => Ok(Self::OtherOnly),
            "shared" => Ok(Self::Shared),
            other => Err(OntoError::InvalidArguments(format!(
                "unknown diff mode `{other}` (expected all|base_only|other_only|shared)"
            ))),
        }
    }
}

/// Parts not requested by the `DiffMode` stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OntologyDiff {
    pub base_only: Vec<FlatEntry>,
    /// (base entry, other entry) pairs equal outside the ignored fields.
    pub shared: Vec<(FlatEntry, FlatEntry)>,
    pub other_only: Vec<FlatEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOptions {
    /// Replace each incoming origin with `<other source id>:<freq>`.
    pub add_origin: bool,
    /// File entries that match nothing under the unfiled bucket.
    pub organize_unmatched: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            add_origin: true,
            organize_unmatched: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub reconciled: usize,
    pub added: usize,
    pub unfiled: usize,
}

impl std::ops::AddAssign for MergeReport {
    fn add_assign(&mut self, rhs: Self) {
        self.reconciled += rhs.reconciled;
        self.added += rhs.added;
        self.unfiled += rhs.unfiled;
    }
}

enum Placement {
    Reconciled,
    Added,
    Unfiled,
}

/// Which per-source ontologies to regenerate from a master, and which level
/// group each one belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecompositionPlan {
    routes: BTreeMap<String, Option<String>>,
}

impl DecompositionPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, source: &str, level: Option<&str>) -> Self {
        self.add_source(source, level);
        self
    }

    pub fn add_source(&mut self, source: &str, level: Option<&str>) {
        self.routes
            .insert(source.to_string(), level.map(str::to_string));
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    pub fn level_of(&self, source: &str) -> Option<&str> {
        self.routes.get(source)?.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Decomposition {
    pub sources: BTreeMap<String, OntologyView>,
    pub levels: BTreeMap<String, OntologyView>,
}

#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    config: ReconcileConfig,
}

impl Reconciler {
    pub fn new(config: ReconcileConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    // ========================================================================
    // Diff
    // ========================================================================

    /// Pairwise comparison of every (path, entry) on both sides, with the
    /// configured ignore fields blanked. Legends must hold the same fields;
    /// the other side is re-laid out in base order before comparing.
    pub fn diff(&self, base: &OntologyView, other: &OntologyView, mode: DiffMode) -> Result<OntologyDiff> {
        let base_legend = base.legend();
        if !same_fields(base_legend, other.legend()) {
            return Err(OntoError::LegendMismatch {
                base: base_legend.to_vec(),
                other: other.legend().to_vec(),
            });
        }

        let ignored: Vec<usize> = self
            .config
            .ignore_fields
            .iter()
            .filter_map(|f| base_legend.iter().position(|l| l == f))
            .collect();
        let clean = |(path, entry): &FlatEntry, from: &[String]| -> FlatEntry {
            let mut entry = if from == base_legend {
                entry.clone()
            } else {
                relayout(entry, from, base_legend)
            };
            for &idx in &ignored {
                if let Some(slot) = entry.get_mut(idx) {
                    slot.clear();
                }
            }
            (path.clone(), entry)
        };

        let base_entries = base.flat_entries();
        let other_entries = other.flat_entries();
        let base_clean: Vec<FlatEntry> = base_entries.iter().map(|e| clean(e, base_legend)).collect();
        let other_clean: Vec<FlatEntry> = other_entries
            .iter()
            .map(|e| clean(e, other.legend()))
            .collect();

        let mut diff = OntologyDiff::default();
        if mode.wants_base_only() {
            diff.base_only = base_entries
                .iter()
                .zip(&base_clean)
                .filter(|(_, c)| !other_clean.contains(c))
                .map(|(e, _)| e.clone())
                .collect();
        }
        if mode.wants_other_only() {
            diff.other_only = other_entries
                .iter()
                .zip(&other_clean)
                .filter(|(_, c)| !base_clean.contains(c))
                .map(|(e, _)| e.clone())
                .collect();
        }
        if mode.wants_shared() {
            for (other_entry, c) in other_entries.iter().zip(&other_clean) {
                if let Some(m) = base_clean.iter().position(|b| b == c) {
                    diff.shared.push((base_entries[m].clone(), other_entry.clone()));
                }
            }
        }
        Ok(diff)
    }

    // ========================================================================
    // Merge
    // ========================================================================

    /// Merge `other` into `base`. Entries are merged into a copy of base's
    /// trie, swapped in only once every entry went through; on error `base`
    /// is untouched.
    pub fn merge(
        &self,
        base: &mut OntologyView,
        other: &OntologyView,
        options: MergeOptions,
    ) -> Result<MergeReport> {
        let mut working = base.trie().clone();
        if working.legend().is_empty() {
            working.set_legend(other.legend().to_vec());
        }
        if working.legend() != other.legend() {
            return Err(OntoError::LegendMismatch {
                base: working.legend().to_vec(),
                other: other.legend().to_vec(),
            });
        }

        let diff = {
            let staged = OntologyView::with_collator(working.clone(), base.collator());
            self.diff(&staged, other, DiffMode::All)?
        };
        let mut to_merge: Vec<FlatEntry> = diff.shared.into_iter().map(|(_, o)| o).collect();
        to_merge.extend(diff.other_only);

        let legend = working.legend().to_vec();
        if options.add_origin {
            let source = other.source_id().ok_or(OntoError::MissingSourceId)?;
            let origin_idx = field_index(&legend, &self.config.origin_field)?;
            let freq_idx = field_index(&legend, &self.config.freq_field)?;
            for (_, entry) in to_merge.iter_mut() {
                let freq = parse_freq(entry.get(freq_idx).map(String::as_str).unwrap_or("")).max(0);
                let origin = format!("{source}:{freq}");
                set_slot(entry, origin_idx, &origin, SetMode::Replace, &self.config.delimiter);
            }
        }

        let mut report = MergeReport::default();
        for (path, entry) in to_merge {
            match self.merge_entry(&mut working, &path, entry, options.organize_unmatched)? {
                Placement::Reconciled => report.reconciled += 1,
                Placement::Added => report.added += 1,
                Placement::Unfiled => report.unfiled += 1,
            }
        }

        base.replace_trie(working);
        base.cleanup();
        tracing::debug!(
            source = other.source_id().as_deref().unwrap_or("-"),
            reconciled = report.reconciled,
            added = report.added,
            unfiled = report.unfiled,
            "merged ontology"
        );
        Ok(report)
    }

    /// Merge each of `others` in the given order; each merge completes
    /// before the next starts, so provenance follows that order.
    pub fn batch_merge<'a, I>(&self, base: &mut OntologyView, others: I, options: MergeOptions) -> Result<MergeReport>
    where
        I: IntoIterator<Item = &'a OntologyView>,
    {
        let mut total = MergeReport::default();
        for other in others {
            total += self.merge(base, other, options)?;
        }
        Ok(total)
    }

    fn merge_entry(
        &self,
        trie: &mut PathTrie,
        path: &[String],
        entry: Entry,
        organize_unmatched: bool,
    ) -> Result<Placement> {
        let mut candidates = vec![path.to_vec()];
        if organize_unmatched {
            let mut unfiled = vec![self.config.unfiled_bucket.clone()];
            unfiled.extend_from_slice(path);
            candidates.push(unfiled);
        }

        let legend = trie.legend().to_vec();
        let lemma = entry.first().cloned().unwrap_or_default();
        for candidate in &candidates {
            for (found_path, found_entries) in trie.find_entries(candidate, Some(&lemma)) {
                for found in found_entries {
                    if let Some(merged) = self.reconcile_pair(&legend, &entry, &found)? {
                        trie.remove_entry(&found_path, &found);
                        trie.insert(&found_path, Some(merged))?;
                        return Ok(Placement::Reconciled);
                    }
                }
            }
        }

        if organize_unmatched {
            let target = &candidates[candidates.len() - 1];
            trie.insert(target, Some(entry))?;
            Ok(Placement::Unfiled)
        } else {
            trie.insert(path, Some(entry))?;
            Ok(Placement::Added)
        }
    }

    /// Combine `incoming` into `found` when both are equal outside the
    /// origin/freq/level fields.
    fn reconcile_pair(&self, legend: &[String], incoming: &[String], found: &[String]) -> Result<Option<Entry>> {
        let merge_fields = self.config.merge_fields();
        let comparable = |idx: usize| !merge_fields.contains(&legend.get(idx).map(String::as_str).unwrap_or(""));
        let width = incoming.len().max(found.len());
        let slot = |entry: &[String], idx: usize| entry.get(idx).cloned().unwrap_or_default();
        if (0..width).any(|idx| comparable(idx) && slot(incoming, idx) != slot(found, idx)) {
            return Ok(None);
        }

        let delimiter = &self.config.delimiter;
        let mut merged = found.to_vec();
        if let Ok(idx) = field_index(legend, &self.config.origin_field) {
            let mut origins = Provenance::parse(&slot(incoming, idx), delimiter)?;
            origins.absorb(&Provenance::parse(&slot(found, idx), delimiter)?);
            set_slot(&mut merged, idx, &origins.render(delimiter), SetMode::Replace, delimiter);
        }
        if let Ok(idx) = field_index(legend, &self.config.freq_field) {
            let freq = parse_freq(&slot(incoming, idx)).saturating_add(parse_freq(&slot(found, idx)));
            set_slot(&mut merged, idx, &freq.to_string(), SetMode::Replace, delimiter);
        }
        if let Ok(idx) = field_index(legend, &self.config.level_field) {
            // the level on which the word was first introduced
            let level = slot(incoming, idx).min(slot(found, idx));
            set_slot(&mut merged, idx, &level, SetMode::Replace, delimiter);
        }
        Ok(Some(merged))
    }

    // ========================================================================
    // Decomposition
    // ========================================================================

    /// Regenerate the per-source ontologies of `plan` from `master`.
    ///
    /// Every `source:count` pair of an entry's origin yields a copy of the
    /// entry in that source's ontology (freq = count, origin cleared). When
    /// the source belongs to a level group, a copy tagged `source:count` is
    /// also merged into the level ontology. Sources absent from the plan are
    /// skipped.
    pub fn decompose(&self, master: &OntologyView, plan: &DecompositionPlan) -> Result<Decomposition> {
        let legend = master.legend().to_vec();
        let origin_idx = field_index(&legend, &self.config.origin_field)?;
        let freq_idx = field_index(&legend, &self.config.freq_field)?;
        let delimiter = &self.config.delimiter;

        let fresh = |name: &str| {
            OntologyView::with_collator(PathTrie::with_legend(&legend), master.collator())
                .with_name(name)
                .with_delimiter(delimiter.clone())
        };
        let mut out = Decomposition::default();
        for source in plan.sources() {
            out.sources.insert(source.to_string(), fresh(source));
            if let Some(level) = plan.level_of(source) {
                out.levels
                    .entry(level.to_string())
                    .or_insert_with(|| fresh(level));
            }
        }

        for (path, entry) in master.flat_entries() {
            let origin = entry.get(origin_idx).map(String::as_str).unwrap_or("");
            for (source, count) in Provenance::parse(origin, delimiter)?.pairs() {
                let Some(view) = out.sources.get_mut(source) else {
                    continue;
                };
                let mut copy = entry.clone();
                set_slot(&mut copy, freq_idx, &count.to_string(), SetMode::Replace, delimiter);
                set_slot(&mut copy, origin_idx, "", SetMode::Replace, delimiter);
                view.trie_mut().insert(&path, Some(copy.clone()))?;

                if let Some(level) = plan.level_of(source) {
                    let tag = Provenance::single(source, count).render(delimiter);
                    set_slot(&mut copy, origin_idx, &tag, SetMode::Replace, delimiter);
                    if let Some(level_view) = out.levels.get_mut(level) {
                        self.merge_entry(level_view.trie_mut(), &path, copy, false)?;
                    }
                }
            }
        }

        for view in out.sources.values_mut().chain(out.levels.values_mut()) {
            view.cleanup();
        }
        tracing::debug!(
            sources = out.sources.len(),
            levels = out.levels.len(),
            "decomposed master ontology"
        );
        Ok(out)
    }
}

fn same_fields(a: &[String], b: &[String]) -> bool {
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort();
    b.sort();
    a == b
}
