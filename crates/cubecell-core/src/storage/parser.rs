//! Parser for sheet files

use crate::document::{Cell, CellStorage, Sheet};
use crate::error::{CoreError, Result};
use cubecell_engine::engine::CellRef;
use std::fs;
use std::path::Path;

pub const MAX_SHEET_FILE_BYTES: u64 = 16 * 1_048_576; // 16 MiB

fn read_sheet_file(path: &Path) -> Result<String> {
    let meta = fs::metadata(path)?;
    if meta.len() > MAX_SHEET_FILE_BYTES {
        return Err(CoreError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!(
                "Refusing to read {}: sheet file too large ({} bytes, max {})",
                path.display(),
                meta.len(),
                MAX_SHEET_FILE_BYTES
            ),
        )));
    }
    Ok(fs::read_to_string(path)?)
}

/// Parse a sheet file and return its cells (not yet calculated)
pub fn parse_sheet(path: &Path) -> Result<Sheet> {
    let content = read_sheet_file(path)?;
    parse_sheet_content(&content)
}

/// Parse sheet content from a string
///
/// Everything after the first `:` is the cell input exactly as a user would
/// type it: `=` starts a formula, anything else is literal text. Later lines
/// overwrite earlier ones for the same cell.
pub fn parse_sheet_content(content: &str) -> Result<Sheet> {
    let mut sheet = Sheet::new();

    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((address, input)) = line.split_once(':') else {
            return Err(CoreError::Parse {
                line: line_num + 1,
                message: "Expected 'CELLREF: INPUT' format".to_string(),
            });
        };

        let address = address.trim();
        let at = CellRef::parse(address).map_err(|err| CoreError::Parse {
            line: line_num + 1,
            message: format!("Invalid cell reference {address}: {err}"),
        })?;

        let cell = Cell::from_input(input);
        if cell == Cell::default() {
            continue;
        }
        sheet.set_cell(at, cell);
    }

    log::debug!("parsed {} cells", sheet.len());
    Ok(sheet)
}
