//! Category tree report: one row per category, indented by depth, leaves
//! annotated with their entry count.

use std::fmt;

use serde::Serialize;

use crate::codec::OntNode;
use crate::error::Result;
use crate::view::OntologyView;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub depth: usize,
    pub name: String,
    /// Entry count, set on leaves only.
    pub count: Option<usize>,
}

impl ReportRow {
    pub fn label(&self) -> String {
        match self.count {
            Some(n) => format!("{}: {n}", self.name),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TreeReport {
    pub rows: Vec<ReportRow>,
    pub total_words: usize,
}

impl TreeReport {
    /// Spreadsheet layout: the label sits in column `depth`.
    pub fn to_grid(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                let mut cells = vec![String::new(); row.depth];
                cells.push(row.label());
                cells
            })
            .collect()
    }
}

impl fmt::Display for TreeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            writeln!(f, "{}{}", "\t".repeat(row.depth), row.label())?;
        }
        write!(f, "total: {}", self.total_words)
    }
}

/// Fails with `StructuralConflict` where the tree cannot be nested.
pub fn export_tree_report(view: &OntologyView) -> Result<TreeReport> {
    let nested = view.to_nested()?;
    let mut report = TreeReport::default();
    let mut stack: Vec<(usize, &String, &OntNode)> =
        nested.ont.iter().rev().map(|(k, v)| (0, k, v)).collect();
    while let Some((depth, name, node)) = stack.pop() {
        match node {
            OntNode::Leaf(entries) => {
                report.total_words += entries.len();
                report.rows.push(ReportRow {
                    depth,
                    name: name.clone(),
                    count: Some(entries.len()),
                });
            }
            OntNode::Branch(children) => {
                report.rows.push(ReportRow {
                    depth,
                    name: name.clone(),
                    count: None,
                });
                stack.extend(children.iter().rev().map(|(k, v)| (depth + 1, k, v)));
            }
        }
    }
    Ok(report)
}
