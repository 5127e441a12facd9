//! Legend changes.
//!
//! A legend change is described by an explicit `LegendAdjustment` value
//! (reviewed by a human, usually as a small YAML file):
//!
//! - fields omitted from `legend_new` are dropped with their content,
//! - fields added to `legend_new` start out empty,
//! - reordering `legend_new` reorders every entry,
//! - `replacements` rename fields after the re-layout, keeping content.

use serde::{Deserialize, Serialize};

use crate::trie::Entry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendAdjustment {
    pub legend_orig: Vec<String>,
    pub legend_new: Vec<String>,
    #[serde(default)]
    pub replacements: Vec<(String, String)>,
}

impl LegendAdjustment {
    /// Review template: the current legend on both sides, no renames.
    pub fn template(legend: &[String]) -> Self {
        Self {
            legend_orig: legend.to_vec(),
            legend_new: legend.to_vec(),
            replacements: Vec::new(),
        }
    }

    /// True while the template has not been edited.
    pub fn is_unchanged(&self) -> bool {
        self.legend_orig == self.legend_new && self.replacements.is_empty()
    }

    /// `legend_new` with the replacements applied.
    pub fn final_legend(&self) -> Vec<String> {
        let mut legend = self.legend_new.clone();
        for (old, new) in &self.replacements {
            for field in legend.iter_mut() {
                if field == old {
                    *field = new.clone();
                }
            }
        }
        legend
    }
}

/// Re-lay `entry` from `old` field order to `new` field order, matching
/// fields by name.
pub fn relayout(entry: &[String], old: &[String], new: &[String]) -> Entry {
    new.iter()
        .map(|field| {
            old.iter()
                .position(|f| f == field)
                .and_then(|idx| entry.get(idx))
                .cloned()
                .unwrap_or_default()
        })
        .collect()
}
