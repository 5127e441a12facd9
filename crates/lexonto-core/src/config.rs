//! Reconciliation settings.
//!
//! Field names and delimiters used by diff/merge/decompose. Every field has a
//! default matching the legend conventions of the lexical ontologies
//! (`[lemma, POS, level, freq, origin, ...]`), so a partial config file only
//! needs to list what differs.

use serde::{Deserialize, Serialize};

/// Delimiter joining provenance pairs and appended field values.
pub const DEFAULT_DELIMITER: &str = " — ";

/// Bucket that receives merged entries no existing category could absorb.
pub const DEFAULT_UNFILED_BUCKET: &str = "to_organize";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    pub delimiter: String,
    pub origin_field: String,
    pub pos_field: String,
    pub freq_field: String,
    pub level_field: String,
    /// Fields blanked before two entries are compared in a diff.
    pub ignore_fields: Vec<String>,
    pub unfiled_bucket: String,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_string(),
            origin_field: "origin".to_string(),
            pos_field: "POS".to_string(),
            freq_field: "freq".to_string(),
            level_field: "level".to_string(),
            ignore_fields: vec!["freq".to_string(), "origin".to_string()],
            unfiled_bucket: DEFAULT_UNFILED_BUCKET.to_string(),
        }
    }
}

impl ReconcileConfig {
    /// Fields that may differ between two entries that still reconcile into
    /// one: provenance, frequency and level.
    pub fn merge_fields(&self) -> [&str; 3] {
        [
            self.origin_field.as_str(),
            self.freq_field.as_str(),
            self.level_field.as_str(),
        ]
    }
}
