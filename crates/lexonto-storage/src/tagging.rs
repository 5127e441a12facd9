//! Tagging sheets: words laid out in groups of four rows (word, POS, level,
//! spacer) for a human to fill in, and read back as tagged triples.

use std::path::Path;

use anyhow::{Context, Result};
use lexonto_core::TagSuggestion;

use crate::xlsx::{read_sheets, write_sheets, SheetGrid};

const GROUP_ROWS: usize = 4;

pub fn tagging_grid(title: &str, rows: &[Vec<TagSuggestion>]) -> SheetGrid {
    let mut grid = SheetGrid::new(title);
    for row in rows {
        grid.rows.push(row.iter().map(|s| s.word.clone()).collect());
        grid.rows
            .push(row.iter().map(|s| s.pos.clone().unwrap_or_default()).collect());
        grid.rows.push(row.iter().map(|s| s.level.clone()).collect());
        grid.rows.push(Vec::new());
    }
    grid
}

/// (word, pos, level) for every column of every group; blank cells are
/// kept so the caller decides what counts as tagged.
pub fn tagged_from_grid(grid: &SheetGrid) -> Vec<(String, String, String)> {
    let cell = |r: usize, c: usize| -> String {
        grid.rows
            .get(r)
            .and_then(|row| row.get(c))
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    };
    let mut out = Vec::new();
    for start in (0..grid.rows.len()).step_by(GROUP_ROWS) {
        let width = grid.rows[start].len();
        for c in 0..width {
            out.push((cell(start, c), cell(start + 1, c), cell(start + 2, c)));
        }
    }
    out
}

pub fn write_tagging_sheet(path: &Path, title: &str, rows: &[Vec<TagSuggestion>]) -> Result<()> {
    write_sheets(&[tagging_grid(title, rows)], path)
}

/// Reads the first sheet of a filled-in tagging workbook.
pub fn read_tagged_sheet(path: &Path) -> Result<Vec<(String, String, String)>> {
    let sheets = read_sheets(path)?;
    let first = sheets
        .first()
        .with_context(|| format!("{} has no sheets", path.display()))?;
    Ok(tagged_from_grid(first))
}
