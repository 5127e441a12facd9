//! PathTrie: category-path prefix tree with multi-valued leaves.
//!
//! Every node is keyed by one category segment. A node becomes a *leaf* the
//! first time something is inserted at its exact path and stays one; leaves
//! carry an ordered list of entries (duplicates allowed until the owning view
//! runs its cleanup pass).
//!
//! Walks use an explicit stack. Children are visited in key order, so results
//! come out in depth-first pre-order; callers should not depend on anything
//! stronger than that.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{OntoError, Result};

/// One word record; slot `i` holds the value of legend field `i`.
/// Slot 0 is the lemma.
pub type Entry = Vec<String>;

/// Segments from the root to a node.
pub type CategoryPath = Vec<String>;

/// A leaf as returned by queries: its path and (a selection of) its entries.
pub type LeafEntries = (CategoryPath, Vec<Entry>);

pub(crate) fn to_path<S: AsRef<str>>(segments: &[S]) -> CategoryPath {
    segments.iter().map(|s| s.as_ref().to_string()).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    path: CategoryPath,
    entries: Vec<Entry>,
    leaf: bool,
    children: BTreeMap<String, Node>,
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        self.leaf
    }

    pub fn can_walk(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn children(&self) -> &BTreeMap<String, Node> {
        &self.children
    }

    fn push_children<'a>(&'a self, stack: &mut Vec<&'a Node>) {
        // reversed so the smallest key is popped first
        stack.extend(self.children.values().rev());
    }
}

/// A category lookup hit: the leaf's path and all of its entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub path: CategoryPath,
    pub entries: Vec<Entry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathTrie {
    legend: Vec<String>,
    head: Node,
}

impl PathTrie {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_legend<S: AsRef<str>>(legend: &[S]) -> Self {
        Self {
            legend: to_path(legend),
            head: Node::default(),
        }
    }

    pub fn legend(&self) -> &[String] {
        &self.legend
    }

    /// Replace the legend without touching entries. Use
    /// `OntologyView::adjust_entries` to re-lay entries out.
    pub fn set_legend(&mut self, legend: Vec<String>) {
        self.legend = legend;
    }

    pub fn root(&self) -> &Node {
        &self.head
    }

    pub fn is_empty(&self) -> bool {
        self.head.children.is_empty()
    }

    /// Walk (and extend) the tree along `path`, mark the end node as a leaf
    /// and append `entry` to it when given.
    pub fn insert<S: AsRef<str>>(&mut self, path: &[S], entry: Option<Entry>) -> Result<()> {
        if path.is_empty() {
            return Err(OntoError::EmptyPath);
        }
        let mut current = &mut self.head;
        for segment in path {
            current = current
                .children
                .entry(segment.as_ref().to_string())
                .or_default();
        }
        if !current.leaf {
            current.leaf = true;
            current.path = to_path(path);
        }
        if let Some(entry) = entry {
            current.entries.push(entry);
        }
        Ok(())
    }

    /// Append `entry` only when `path` already resolves to a leaf.
    pub fn add_to_existing<S: AsRef<str>>(&mut self, path: &[S], entry: Entry) -> bool {
        match self.node_mut(path) {
            Some(node) if node.leaf => {
                node.entries.push(entry);
                true
            }
            _ => false,
        }
    }

    /// Remove the first entry structurally equal to `entry` from the leaf at
    /// exactly `path`. Returns whether something was removed.
    pub fn remove_entry<S: AsRef<str>>(&mut self, path: &[S], entry: &[String]) -> bool {
        let Some(node) = self.node_mut(path) else {
            return false;
        };
        if !node.leaf {
            return false;
        }
        match node.entries.iter().position(|e| e.as_slice() == entry) {
            Some(idx) => {
                node.entries.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Leaves under `prefix` (the whole tree when `prefix` is empty).
    ///
    /// With a `lemma`, only leaves holding at least one entry whose slot 0
    /// equals it are returned, each with just the matching entries. A prefix
    /// that does not exist yields an empty result.
    pub fn find_entries<S: AsRef<str>>(&self, prefix: &[S], lemma: Option<&str>) -> Vec<LeafEntries> {
        let mut results = Vec::new();
        let Some(top) = self.scope(prefix) else {
            return results;
        };

        let mut stack = vec![top];
        while let Some(node) = stack.pop() {
            if node.leaf {
                match lemma {
                    Some(lemma) => {
                        let matches: Vec<Entry> = node
                            .entries
                            .iter()
                            .filter(|e| e.first().map(String::as_str) == Some(lemma))
                            .cloned()
                            .collect();
                        if !matches.is_empty() {
                            results.push((node.path.clone(), matches));
                        }
                    }
                    None => results.push((node.path.clone(), node.entries.clone())),
                }
            }
            node.push_children(&mut stack);
        }
        results
    }

    /// Every leaf of the tree, unfiltered.
    pub fn find_all(&self, lemma: Option<&str>) -> Vec<LeafEntries> {
        self.find_entries::<&str>(&[], lemma)
    }

    /// Paths of the leaves under `prefix` holding `lemma`.
    pub fn find_lemmas<S: AsRef<str>>(&self, prefix: &[S], lemma: &str) -> Vec<CategoryPath> {
        self.find_entries(prefix, Some(lemma))
            .into_iter()
            .map(|(path, _)| path)
            .collect()
    }

    /// Existence check. With only a path, the path (branch or leaf) must
    /// exist; with a lemma, some leaf under the path (or anywhere when the
    /// path is empty) must hold it.
    pub fn is_in_ontology<S: AsRef<str>>(&self, path: &[S], lemma: Option<&str>) -> Result<bool> {
        if path.is_empty() && lemma.is_none() {
            return Err(OntoError::InvalidArguments(
                "at least one of path or lemma must be provided".to_string(),
            ));
        }
        let Some(top) = self.scope(path) else {
            return Ok(false);
        };
        let Some(lemma) = lemma else {
            return Ok(true);
        };

        let mut stack = vec![top];
        while let Some(node) = stack.pop() {
            if node.leaf
                && node
                    .entries
                    .iter()
                    .any(|e| e.first().map(String::as_str) == Some(lemma))
            {
                return Ok(true);
            }
            node.push_children(&mut stack);
        }
        Ok(false)
    }

    /// The leaf at exactly `path`; a pure branch resolves to `None`.
    pub fn has_category<S: AsRef<str>>(&self, path: &[S]) -> Result<Option<Category>> {
        if path.is_empty() {
            return Err(OntoError::EmptyPath);
        }
        Ok(self.node(path).filter(|n| n.leaf).map(|n| Category {
            path: n.path.clone(),
            entries: n.entries.clone(),
        }))
    }

    pub fn export_all_entries(&self) -> Vec<LeafEntries> {
        self.find_all(None)
    }

    /// Distinct lemmas, sorted.
    pub fn list_lemmas(&self) -> Vec<String> {
        let mut lemmas = BTreeSet::new();
        self.for_each_leaf(|_, entries| {
            for entry in entries {
                if let Some(lemma) = entry.first() {
                    lemmas.insert(lemma.clone());
                }
            }
        });
        lemmas.into_iter().collect()
    }

    pub fn entry_count(&self) -> usize {
        let mut total = 0;
        self.for_each_leaf(|_, entries| total += entries.len());
        total
    }

    pub fn for_each_leaf<F: FnMut(&[String], &[Entry])>(&self, mut f: F) {
        let mut stack = vec![&self.head];
        while let Some(node) = stack.pop() {
            if node.leaf {
                f(&node.path, &node.entries);
            }
            node.push_children(&mut stack);
        }
    }

    /// Rewrite every leaf's entry list in place.
    pub fn for_each_leaf_mut<F: FnMut(&[String], &mut Vec<Entry>)>(&mut self, mut f: F) {
        let mut stack = vec![&mut self.head];
        while let Some(node) = stack.pop() {
            if node.leaf {
                f(&node.path, &mut node.entries);
            }
            stack.extend(node.children.values_mut().rev());
        }
    }

    fn scope<S: AsRef<str>>(&self, prefix: &[S]) -> Option<&Node> {
        if prefix.is_empty() {
            Some(&self.head)
        } else {
            self.node(prefix)
        }
    }

    fn node<S: AsRef<str>>(&self, path: &[S]) -> Option<&Node> {
        let mut current = &self.head;
        for segment in path {
            current = current.children.get(segment.as_ref())?;
        }
        Some(current)
    }

    fn node_mut<S: AsRef<str>>(&mut self, path: &[S]) -> Option<&mut Node> {
        let mut current = &mut self.head;
        for segment in path {
            current = current.children.get_mut(segment.as_ref())?;
        }
        Some(current)
    }
}
