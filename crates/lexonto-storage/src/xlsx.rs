//! Spreadsheet form.
//!
//! ```text
//! sheet "0 Ontology"            sheet "1 common"
//!   A   B      C                  A      B    C
//!       noun                      lemma  POS  level ...
//!   1          common             ཁྱི    N    1
//!   2          proper             ...
//!   3   verb
//! ```
//!
//! Column A of the tree sheet numbers the leaves; the category name sits in
//! column `B + depth`. Each leaf gets its own sheet `<n> <name>` whose first
//! row is the legend. The legend is read back from the sheet whose title
//! starts with `1`.
//!
//! The layout is computed on plain `SheetGrid`s; calamine and
//! rust_xlsxwriter only move grids in and out of workbook files.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use lexonto_core::{Entry, NestedOntology, OntNode};
use rust_xlsxwriter::Workbook;

pub const TREE_SHEET: &str = "0 Ontology";

const MAX_SHEET_NAME: usize = 31;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetGrid {
    pub title: String,
    pub rows: Vec<Vec<String>>,
}

impl SheetGrid {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            rows: Vec::new(),
        }
    }

    fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }
}

// ============================================================================
// Layout
// ============================================================================

pub fn layout_workbook(nested: &NestedOntology) -> Vec<SheetGrid> {
    let mut tree = SheetGrid::new(TREE_SHEET);
    let mut leaves = Vec::new();
    layout_map(&nested.ont, 0, &nested.legend, &mut tree, &mut leaves);

    let mut sheets = vec![tree];
    sheets.extend(leaves);
    sheets
}

fn layout_map(
    map: &BTreeMap<String, OntNode>,
    depth: usize,
    legend: &[String],
    tree: &mut SheetGrid,
    leaves: &mut Vec<SheetGrid>,
) {
    for (name, node) in map {
        let mut row = vec![String::new(); depth + 2];
        row[depth + 1] = name.clone();
        match node {
            OntNode::Leaf(entries) => {
                let number = leaves.len() + 1;
                row[0] = number.to_string();
                let mut sheet = SheetGrid::new(sheet_title(number, name));
                sheet.rows.push(legend.to_vec());
                sheet.rows.extend(entries.iter().cloned());
                leaves.push(sheet);
                tree.rows.push(row);
            }
            OntNode::Branch(children) => {
                tree.rows.push(row);
                layout_map(children, depth + 1, legend, tree, leaves);
            }
        }
    }
}

/// `<n> <name>`, cut to the 31-character sheet-name limit with the
/// characters Excel forbids replaced.
fn sheet_title(number: usize, name: &str) -> String {
    let title: String = format!("{number} {name}")
        .chars()
        .map(|c| if "[]:*?/\\".contains(c) { '_' } else { c })
        .take(MAX_SHEET_NAME)
        .collect();
    title
}

fn leaf_number(title: &str) -> Option<usize> {
    let head = title.split_whitespace().next()?;
    head.parse().ok()
}

/// Inverse of `layout_workbook`.
pub fn nested_from_sheets(sheets: &[SheetGrid]) -> Result<NestedOntology> {
    let tree = sheets
        .iter()
        .find(|s| s.title == TREE_SHEET)
        .or_else(|| sheets.first())
        .ok_or_else(|| anyhow!("workbook has no sheets"))?;

    let legend = sheets
        .iter()
        .find(|s| s.title.starts_with('1'))
        .and_then(|s| s.rows.first())
        .map(|row| trim_trailing_empty(row.clone()))
        .unwrap_or_default();

    let mut leaf_rows: HashMap<usize, &SheetGrid> = HashMap::new();
    for sheet in sheets {
        if sheet.title == tree.title {
            continue;
        }
        if let Some(n) = leaf_number(&sheet.title) {
            leaf_rows.insert(n, sheet);
        }
    }

    let mut ont = BTreeMap::new();
    let mut path: Vec<String> = Vec::new();
    for (r, row) in tree.rows.iter().enumerate() {
        let Some((col, name)) = row
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, cell)| !cell.trim().is_empty())
        else {
            continue;
        };
        let depth = col - 1;
        if depth > path.len() {
            bail!("tree sheet row {} is indented past its parent", r + 1);
        }
        path.truncate(depth);
        path.push(name.trim().to_string());

        let number = tree.cell(r, 0).trim();
        let node = if number.is_empty() {
            OntNode::Branch(BTreeMap::new())
        } else {
            let n: usize = number
                .parse()
                .with_context(|| format!("leaf number `{number}` in tree sheet row {}", r + 1))?;
            let entries = leaf_rows
                .get(&n)
                .map(|sheet| leaf_entries(sheet, legend.len()))
                .unwrap_or_default();
            OntNode::Leaf(entries)
        };
        place(&mut ont, &path, node)?;
    }

    Ok(NestedOntology { legend, ont })
}

fn leaf_entries(sheet: &SheetGrid, width: usize) -> Vec<Entry> {
    sheet
        .rows
        .iter()
        .skip(1)
        .filter(|row| row.iter().any(|c| !c.is_empty()))
        .map(|row| {
            let mut entry = row.clone();
            if width > 0 {
                entry.resize(width, String::new());
            }
            entry
        })
        .collect()
}

fn place(ont: &mut BTreeMap<String, OntNode>, path: &[String], node: OntNode) -> Result<()> {
    let (last, parents) = path
        .split_last()
        .ok_or_else(|| anyhow!("empty category path"))?;
    let mut map = ont;
    for segment in parents {
        let entry = map
            .entry(segment.clone())
            .or_insert_with(|| OntNode::Branch(BTreeMap::new()));
        map = match entry {
            OntNode::Branch(children) => children,
            OntNode::Leaf(_) => bail!("category {segment:?} is both a leaf and a parent in {path:?}"),
        };
    }
    map.insert(last.clone(), node);
    Ok(())
}

fn trim_trailing_empty(mut row: Vec<String>) -> Vec<String> {
    while row.last().is_some_and(|c| c.is_empty()) {
        row.pop();
    }
    row
}

// ============================================================================
// Workbook files
// ============================================================================

pub fn read_sheets(path: &Path) -> Result<Vec<SheetGrid>> {
    let mut workbook =
        open_workbook_auto(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut sheets = Vec::new();
    for title in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&title)
            .with_context(|| format!("failed to read sheet `{title}` of {}", path.display()))?;
        let (row0, col0) = range.start().unwrap_or((0, 0));
        let mut rows: Vec<Vec<String>> = vec![Vec::new(); row0 as usize];
        for cells in range.rows() {
            let mut row = vec![String::new(); col0 as usize];
            row.extend(cells.iter().map(cell_text));
            rows.push(trim_trailing_empty(row));
        }
        sheets.push(SheetGrid { title, rows });
    }
    Ok(sheets)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

pub fn write_sheets(sheets: &[SheetGrid], path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(sheet.title.as_str())
            .with_context(|| format!("invalid sheet name `{}`", sheet.title))?;
        for (r, row) in sheet.rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                worksheet.write_string(r as u32, c as u16, value.as_str())?;
            }
        }
        if sheet.title == TREE_SHEET {
            worksheet.set_freeze_panes(0, 1)?;
        } else if sheet.rows.len() > 1 {
            worksheet.set_freeze_panes(1, 0)?;
        }
    }
    workbook
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

pub fn read_nested(path: &Path) -> Result<NestedOntology> {
    let sheets = read_sheets(path)?;
    nested_from_sheets(&sheets).with_context(|| format!("malformed ontology workbook {}", path.display()))
}

pub fn write_nested(nested: &NestedOntology, path: &Path) -> Result<()> {
    write_sheets(&layout_workbook(nested), path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &[&str]) -> Vec<String> {
        v.iter().map(|x| x.to_string()).collect()
    }

    fn sample() -> NestedOntology {
        let mut noun = BTreeMap::new();
        noun.insert("common".to_string(), OntNode::Leaf(vec![s(&["dog", "N", "1"])]));
        noun.insert("proper".to_string(), OntNode::Leaf(vec![]));
        let mut ont = BTreeMap::new();
        ont.insert("noun".to_string(), OntNode::Branch(noun));
        ont.insert("verb".to_string(), OntNode::Leaf(vec![s(&["go", "V", "2"])]));
        NestedOntology {
            legend: s(&["lemma", "POS", "level"]),
            ont,
        }
    }

    #[test]
    fn tree_sheet_numbers_leaves_and_indents_names() {
        let sheets = layout_workbook(&sample());
        let titles: Vec<&str> = sheets.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["0 Ontology", "1 common", "2 proper", "3 verb"]);
        assert_eq!(
            sheets[0].rows,
            vec![
                s(&["", "noun"]),
                s(&["1", "", "common"]),
                s(&["2", "", "proper"]),
                s(&["3", "verb"]),
            ]
        );
        assert_eq!(sheets[1].rows, vec![s(&["lemma", "POS", "level"]), s(&["dog", "N", "1"])]);
    }

    #[test]
    fn layout_reads_back() {
        let nested = sample();
        assert_eq!(nested_from_sheets(&layout_workbook(&nested)).unwrap(), nested);
    }

    #[test]
    fn short_rows_are_padded_to_the_legend() {
        let mut sheets = layout_workbook(&sample());
        sheets[1].rows[1] = s(&["dog"]);
        let back = nested_from_sheets(&sheets).unwrap();
        let OntNode::Branch(noun) = &back.ont["noun"] else {
            panic!("noun should be a branch");
        };
        assert_eq!(noun["common"], OntNode::Leaf(vec![s(&["dog", "", ""])]));
    }

    #[test]
    fn sheet_titles_respect_excel_limits() {
        let title = sheet_title(12, "a/b:c and a very long category name indeed");
        assert_eq!(title.chars().count(), MAX_SHEET_NAME);
        assert!(title.starts_with("12 a_b_c"));
        assert_eq!(leaf_number(&title), Some(12));
    }

    #[test]
    fn over_indented_rows_are_rejected() {
        let tree = SheetGrid {
            title: TREE_SHEET.to_string(),
            rows: vec![s(&["", "", "orphan"])],
        };
        assert!(nested_from_sheets(&[tree]).is_err());
    }
}
