//! Lexonto core: a path-indexed lexical ontology for Tibetan word lists.
//!
//! Words ("entries") live in leaf categories of a tree addressed by category
//! paths such as `["noun", "common"]`. Every entry is a row of string fields
//! laid out by the ontology's legend (`[lemma, POS, level, freq, origin]`).
//!
//! - `trie`: the path-indexed store
//! - `codec`: conversion to/from the nested mapping used by file formats
//! - `view`: field access, lookups, cleanup and legend management
//! - `reconcile`: diff, merge with provenance, decomposition by source
//!
//! File formats live in `lexonto-storage`; this crate does no I/O.

pub mod codec;
pub mod collation;
pub mod config;
pub mod error;
pub mod legend;
pub mod provenance;
pub mod reconcile;
pub mod report;
pub mod tagging;
pub mod trie;
pub mod view;

pub use codec::{from_nested, to_nested, NestedOntology, OntNode};
pub use collation::{CodepointCollator, Collator, TibetanCollator};
pub use config::ReconcileConfig;
pub use error::{OntoError, Result};
pub use legend::LegendAdjustment;
pub use provenance::Provenance;
pub use reconcile::{
    Decomposition, DecompositionPlan, DiffMode, FlatEntry, MergeOptions, MergeReport, OntologyDiff,
    Reconciler,
};
pub use report::{export_tree_report, TreeReport};
pub use tagging::{LineMode, TagSuggestion, TaggedWord};
pub use trie::{Category, CategoryPath, Entry, LeafEntries, PathTrie};
pub use view::{OntologyView, SetMode};
