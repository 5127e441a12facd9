//! Error taxonomy for ontology operations.
//!
//! Not-found conditions are never errors: queries return empty vectors,
//! `None` or `false`. Everything here is either a schema problem in the
//! caller's input or a structural defect in the data itself.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, OntoError>;

#[derive(Debug, thiserror::Error)]
pub enum OntoError {
    #[error("legends differ: base {base:?}, other {other:?}")]
    LegendMismatch {
        base: Vec<String>,
        other: Vec<String>,
    },

    #[error("`{field}` not contained in legend {legend:?}")]
    UnknownField { field: String, legend: Vec<String> },

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("invalid set mode `{0}` (expected replace|append)")]
    InvalidSetMode(String),

    #[error("category path must contain at least one segment")]
    EmptyPath,

    #[error("ontology has no source id (no source path or name set)")]
    MissingSourceId,

    #[error("malformed provenance `{0}` (expected `source:count`)")]
    MalformedProvenance(String),

    #[error("entry {entry:?} under {path:?} has {found} fields, legend has {expected}")]
    EntryWidth {
        path: Vec<String>,
        entry: Vec<String>,
        expected: usize,
        found: usize,
    },

    #[error("structural conflict at {path:?}: node is both a category and a leaf")]
    StructuralConflict { path: Vec<String> },

    #[error("unsupported ontology file `{}` (expected .yaml or .xlsx)", path.display())]
    UnsupportedExtension { path: PathBuf },
}
