//! Writers for sheet files and value reports

use crate::document::CellStorage;
use crate::error::Result;
use std::fs;
use std::path::Path;

/// Write cell inputs (formulas and literals) so the sheet can be reloaded
pub fn write_sheet<S: CellStorage + ?Sized>(path: &Path, storage: &S) -> Result<()> {
    fs::write(path, write_sheet_content(storage))?;
    Ok(())
}

pub fn write_sheet_content<S: CellStorage + ?Sized>(storage: &S) -> String {
    let mut lines = vec!["# Cubecell Spreadsheet".to_string()];

    for (at, cell) in storage.all_cells() {
        let input = cell.to_input_string();
        if input.is_empty() {
            continue;
        }
        lines.push(format!("{at}: {input}"));
    }

    lines.join("\n") + "\n"
}

/// Write the current value of every non-empty cell
pub fn write_values<S: CellStorage + ?Sized>(path: &Path, storage: &S) -> Result<()> {
    fs::write(path, write_values_content(storage))?;
    Ok(())
}

/// Value report, one `A1: <value>` line per cell in row-major order
pub fn write_values_content<S: CellStorage + ?Sized>(storage: &S) -> String {
    let mut lines = vec!["# Cubecell values".to_string()];

    for (at, cell) in storage.all_cells() {
        let value = cell.display_value();
        if value.is_empty() {
            continue;
        }
        lines.push(format!("{at}: {value}"));
    }

    lines.join("\n") + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Cell, Sheet};
    use crate::storage::parse_sheet_content;
    use cubecell_engine::engine::CellRef;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sheet_keeps_formulas() {
        let mut sheet = Sheet::new();
        sheet.set_cell(CellRef::new(0, 0), Cell::literal("7"));
        sheet.set_cell(CellRef::new(1, 0), Cell::formula("=A1*6"));
        assert_eq!(
            write_sheet_content(&sheet),
            "# Cubecell Spreadsheet\nA1: 7\nB1: =A1*6\n"
        );
    }

    #[test]
    fn test_sheet_reloads() {
        let content = "# Cubecell Spreadsheet\nA1: hello\nA2: =A1\n";
        let sheet = parse_sheet_content(content).unwrap();
        assert_eq!(write_sheet_content(&sheet), content);
    }

    #[test]
    fn test_values_skip_uncalculated() {
        let mut sheet = Sheet::new();
        sheet.set_cell(CellRef::new(0, 0), Cell::literal("1"));
        sheet.set_cell(CellRef::new(0, 1), Cell::formula("=A1"));
        assert_eq!(write_values_content(&sheet), "# Cubecell values\nA1: 1\n");
    }

    #[test]
    fn test_values_row_major() {
        let mut sheet = Sheet::new();
        sheet.set_cell(CellRef::new(1, 1), Cell::literal("3")); // B2
        sheet.set_cell(CellRef::new(0, 1), Cell::literal("2")); // A2
        sheet.set_cell(CellRef::new(1, 0), Cell::literal("1")); // B1
        let content = write_values_content(&sheet);
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[1..], ["B1: 1", "A2: 2", "B2: 3"]);
    }
}
