//! Trie ↔ nested mapping.
//!
//! The nested form is what the file collaborators read and write:
//!
//! ```text
//! legend: [lemma, POS, level, freq, origin]
//! ont:
//!   noun:
//!     common:
//!     - [dog, N, '1', '5', 'src1:5']
//!   verb:
//!   - [go, V, '1', '9', 'src1:9']
//! ```
//!
//! Categories become mappings (ordered by key), leaves become entry lists.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{OntoError, Result};
use crate::trie::{CategoryPath, Entry, Node, PathTrie};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OntNode {
    Leaf(Vec<Entry>),
    Branch(BTreeMap<String, OntNode>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedOntology {
    pub legend: Vec<String>,
    pub ont: BTreeMap<String, OntNode>,
}

// ============================================================================
// Trie → nested
// ============================================================================

/// Fails with `StructuralConflict` when a node holds entries and also has
/// sub-categories.
pub fn to_nested(trie: &PathTrie) -> Result<NestedOntology> {
    let mut path = Vec::new();
    let ont = encode_children(trie.root(), &mut path)?;
    Ok(NestedOntology {
        legend: trie.legend().to_vec(),
        ont,
    })
}

fn encode_children(node: &Node, path: &mut Vec<String>) -> Result<BTreeMap<String, OntNode>> {
    let mut out = BTreeMap::new();
    for (key, child) in node.children() {
        path.push(key.clone());
        let encoded = encode(child, path)?;
        path.pop();
        out.insert(key.clone(), encoded);
    }
    Ok(out)
}

fn encode(node: &Node, path: &mut Vec<String>) -> Result<OntNode> {
    if node.is_leaf() {
        if node.can_walk() {
            return Err(OntoError::StructuralConflict { path: path.clone() });
        }
        return Ok(OntNode::Leaf(node.entries().to_vec()));
    }
    Ok(OntNode::Branch(encode_children(node, path)?))
}

// ============================================================================
// Nested → trie
// ============================================================================

/// Rebuild a trie. Distinct lemmas are enumerated in sorted order and every
/// occurrence of each is inserted in depth-first key order, so the resulting
/// leaf contents do not depend on how the mapping was iterated. Empty leaves
/// are inserted last. Every entry must carry one value per legend field.
pub fn from_nested(nested: &NestedOntology) -> Result<PathTrie> {
    let mut trie = PathTrie::with_legend(&nested.legend);

    let mut lemmas = BTreeSet::new();
    let mut path = Vec::new();
    collect_lemmas(&nested.ont, nested.legend.len(), &mut path, &mut lemmas)?;

    for lemma in &lemmas {
        let mut found = Vec::new();
        collect_occurrences(&nested.ont, lemma, &mut path, &mut found);
        for (path, entry) in found {
            trie.insert(&path, Some(entry))?;
        }
    }

    let mut empty = Vec::new();
    collect_empty_leaves(&nested.ont, &mut path, &mut empty);
    for path in empty {
        trie.insert(&path, None)?;
    }
    Ok(trie)
}

fn collect_lemmas(
    map: &BTreeMap<String, OntNode>,
    width: usize,
    path: &mut Vec<String>,
    out: &mut BTreeSet<String>,
) -> Result<()> {
    for (key, value) in map {
        path.push(key.clone());
        match value {
            OntNode::Branch(children) => collect_lemmas(children, width, path, out)?,
            OntNode::Leaf(entries) => {
                for entry in entries {
                    let lemma = entry.first().ok_or_else(|| {
                        OntoError::InvalidArguments(format!("empty entry under {path:?}"))
                    })?;
                    if entry.len() != width {
                        return Err(OntoError::EntryWidth {
                            path: path.clone(),
                            entry: entry.clone(),
                            expected: width,
                            found: entry.len(),
                        });
                    }
                    out.insert(lemma.clone());
                }
            }
        }
        path.pop();
    }
    Ok(())
}

fn collect_occurrences(
    map: &BTreeMap<String, OntNode>,
    lemma: &str,
    path: &mut Vec<String>,
    out: &mut Vec<(CategoryPath, Entry)>,
) {
    for (key, value) in map {
        path.push(key.clone());
        match value {
            OntNode::Branch(children) => collect_occurrences(children, lemma, path, out),
            OntNode::Leaf(entries) => {
                out.extend(
                    entries
                        .iter()
                        .filter(|e| e.first().map(String::as_str) == Some(lemma))
                        .map(|e| (path.clone(), e.clone())),
                );
            }
        }
        path.pop();
    }
}

fn collect_empty_leaves(
    map: &BTreeMap<String, OntNode>,
    path: &mut Vec<String>,
    out: &mut Vec<CategoryPath>,
) {
    for (key, value) in map {
        path.push(key.clone());
        match value {
            OntNode::Branch(children) => collect_empty_leaves(children, path, out),
            OntNode::Leaf(entries) if entries.is_empty() => out.push(path.clone()),
            OntNode::Leaf(_) => {}
        }
        path.pop();
    }
}
