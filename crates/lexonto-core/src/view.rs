//! OntologyView: the query/mutation façade over one `PathTrie`.
//!
//! A view exclusively owns its trie, remembers where it was loaded from (so
//! it can be written back and so merges know which source to credit), and
//! carries the collator used to order leaves.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use crate::codec::{self, NestedOntology};
use crate::collation::{Collator, TibetanCollator};
use crate::config::DEFAULT_DELIMITER;
use crate::error::{OntoError, Result};
use crate::legend::{relayout, LegendAdjustment};
use crate::trie::{Category, CategoryPath, Entry, LeafEntries, PathTrie};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetMode {
    Replace,
    /// Treat the slot as a delimiter-joined set and add to it.
    Append,
}

impl FromStr for SetMode {
    type Err = OntoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(Self::Replace),
            "append" => Ok(Self::Append),
            other => Err(OntoError::InvalidSetMode(other.to_string())),
        }
    }
}

#[derive(Clone)]
pub struct OntologyView {
    trie: PathTrie,
    source: Option<PathBuf>,
    name: Option<String>,
    collator: Arc<dyn Collator + Send + Sync>,
    delimiter: String,
}

impl fmt::Debug for OntologyView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OntologyView")
            .field("source", &self.source)
            .field("name", &self.name)
            .field("legend", &self.trie.legend())
            .field("entries", &self.trie.entry_count())
            .finish()
    }
}

impl Default for OntologyView {
    fn default() -> Self {
        Self::new(PathTrie::new())
    }
}

impl OntologyView {
    /// Wrap `trie` and run `cleanup` on it.
    pub fn new(trie: PathTrie) -> Self {
        Self::with_collator(trie, Arc::new(TibetanCollator))
    }

    pub fn with_collator(trie: PathTrie, collator: Arc<dyn Collator + Send + Sync>) -> Self {
        let mut view = Self {
            trie,
            source: None,
            name: None,
            collator,
            delimiter: DEFAULT_DELIMITER.to_string(),
        };
        view.cleanup();
        view
    }

    pub fn from_nested(nested: &NestedOntology) -> Result<Self> {
        Ok(Self::new(codec::from_nested(nested)?))
    }

    pub fn to_nested(&self) -> Result<NestedOntology> {
        codec::to_nested(&self.trie)
    }

    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Delimiter used by `SetMode::Append`.
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn set_source(&mut self, path: impl Into<PathBuf>) {
        self.source = Some(path.into());
    }

    /// Explicit name, else the source file stem up to the first `_`
    /// (`A1_wordlist.yaml` → `A1`).
    pub fn source_id(&self) -> Option<String> {
        if let Some(name) = &self.name {
            return Some(name.clone());
        }
        let stem = self.source.as_ref()?.file_stem()?.to_str()?;
        stem.split('_').next().map(str::to_string)
    }

    pub fn collator(&self) -> Arc<dyn Collator + Send + Sync> {
        Arc::clone(&self.collator)
    }

    pub fn trie(&self) -> &PathTrie {
        &self.trie
    }

    pub fn trie_mut(&mut self) -> &mut PathTrie {
        &mut self.trie
    }

    pub fn into_trie(self) -> PathTrie {
        self.trie
    }

    pub(crate) fn replace_trie(&mut self, trie: PathTrie) {
        self.trie = trie;
    }

    pub fn legend(&self) -> &[String] {
        self.trie.legend()
    }

    // ========================================================================
    // Fields
    // ========================================================================

    pub fn field_index(&self, field: &str) -> Result<usize> {
        field_index(self.trie.legend(), field)
    }

    /// `None` when the entry is shorter than the legend.
    pub fn get_field<'e>(&self, entry: &'e [String], field: &str) -> Result<Option<&'e str>> {
        let idx = self.field_index(field)?;
        Ok(entry.get(idx).map(String::as_str))
    }

    pub fn set_field(&self, entry: &mut Entry, field: &str, value: &str, mode: SetMode) -> Result<()> {
        let idx = self.field_index(field)?;
        set_slot(entry, idx, value, mode, &self.delimiter);
        Ok(())
    }

    // ========================================================================
    // Queries and mutations
    // ========================================================================

    pub fn add<S: AsRef<str>>(&mut self, path: &[S], entry: Entry) -> Result<()> {
        self.trie.insert(path, Some(entry))
    }

    pub fn find_word(&self, lemma: &str) -> Vec<LeafEntries> {
        self.trie.find_all(Some(lemma))
    }

    pub fn find_entries<S: AsRef<str>>(&self, prefix: &[S], lemma: Option<&str>) -> Vec<LeafEntries> {
        self.trie.find_entries(prefix, lemma)
    }

    pub fn list_words(&self) -> Vec<String> {
        self.trie.list_lemmas()
    }

    pub fn has_category<S: AsRef<str>>(&self, path: &[S]) -> Result<Option<Category>> {
        self.trie.has_category(path)
    }

    pub fn is_in_ontology<S: AsRef<str>>(&self, path: &[S], lemma: Option<&str>) -> Result<bool> {
        self.trie.is_in_ontology(path, lemma)
    }

    pub fn remove_entry<S: AsRef<str>>(&mut self, path: &[S], entry: &[String]) -> bool {
        self.trie.remove_entry(path, entry)
    }

    pub fn export_all_entries(&self) -> Vec<LeafEntries> {
        self.trie.export_all_entries()
    }

    /// Every (path, entry) pair, leaves in traversal order.
    pub fn flat_entries(&self) -> Vec<(CategoryPath, Entry)> {
        self.trie
            .export_all_entries()
            .into_iter()
            .flat_map(|(path, entries)| entries.into_iter().map(move |e| (path.clone(), e)))
            .collect()
    }

    /// Drop duplicate entries in every leaf (first occurrence wins), then
    /// stable-sort by the collator over the first four fields concatenated.
    pub fn cleanup(&mut self) {
        let collator = Arc::clone(&self.collator);
        self.trie.for_each_leaf_mut(|_, entries| {
            let mut keyed: Vec<(String, Entry)> = Vec::with_capacity(entries.len());
            for entry in entries.drain(..) {
                if keyed.iter().any(|(_, e)| *e == entry) {
                    continue;
                }
                let key: String = entry.iter().take(4).map(String::as_str).collect();
                keyed.push((key, entry));
            }
            keyed.sort_by(|(a, _), (b, _)| collator.compare(a, b));
            entries.extend(keyed.into_iter().map(|(_, e)| e));
        });
    }

    // ========================================================================
    // Legend
    // ========================================================================

    pub fn set_legend(&mut self, legend: Vec<String>) {
        self.trie.set_legend(legend);
    }

    /// Re-lay every entry from `old` to `new`; order within leaves is kept.
    pub fn adjust_entries(&mut self, old: &[String], new: &[String]) {
        self.trie.for_each_leaf_mut(|_, entries| {
            for entry in entries.iter_mut() {
                *entry = relayout(entry, old, new);
            }
        });
    }

    pub fn apply_legend_adjustment(&mut self, adjustment: &LegendAdjustment) {
        self.adjust_entries(&adjustment.legend_orig, &adjustment.legend_new);
        self.set_legend(adjustment.final_legend());
    }
}

pub(crate) fn field_index(legend: &[String], field: &str) -> Result<usize> {
    legend
        .iter()
        .position(|f| f == field)
        .ok_or_else(|| OntoError::UnknownField {
            field: field.to_string(),
            legend: legend.to_vec(),
        })
}

pub(crate) fn set_slot(entry: &mut Entry, idx: usize, value: &str, mode: SetMode, delimiter: &str) {
    if entry.len() <= idx {
        entry.resize(idx + 1, String::new());
    }
    match mode {
        SetMode::Replace => entry[idx] = value.to_string(),
        SetMode::Append => {
            let mut parts: Vec<&str> = entry[idx]
                .split(delimiter)
                .chain(std::iter::once(value))
                .filter(|p| !p.is_empty())
                .collect();
            parts.sort_unstable();
            parts.dedup();
            let joined = parts.join(delimiter);
            entry[idx] = joined;
        }
    }
}
