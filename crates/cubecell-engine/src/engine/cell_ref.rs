//! Cell reference parsing and formatting.
//!
//! Provides bidirectional conversion between spreadsheet-style cell references
//! (e.g., "A1", "B2", "AA100") and zero-indexed column/row coordinates.
//! Columns are bijective base-26 (A=1..Z=26, no zero digit).
//!
//! # Examples
//!
//! ```
//! use cubecell_engine::engine::CellRef;
//!
//! let cell = CellRef::parse("b3").unwrap();
//! assert_eq!(cell.col, 1); // 0-indexed
//! assert_eq!(cell.row, 2);
//! assert_eq!(cell.to_string(), "B3");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::AddressError;

/// A reference to a cell by column and row indices (0-indexed).
/// Orders row-major.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

impl CellRef {
    pub fn new(col: usize, row: usize) -> CellRef {
        CellRef { col, row }
    }

    /// Parse a cell reference from spreadsheet notation (e.g., "A1", "b2", "AA10").
    ///
    /// The leading letter run is the column, everything after it must be a
    /// positive decimal row number.
    pub fn parse(name: &str) -> Result<CellRef, AddressError> {
        let letters_len = name
            .bytes()
            .take_while(|b| b.is_ascii_alphabetic())
            .count();
        let (letters, digits) = name.split_at(letters_len);

        if letters.is_empty() {
            return Err(AddressError::MissingColumn(name.to_string()));
        }
        if digits.is_empty() {
            return Err(AddressError::MissingRow(name.to_string()));
        }

        let mut col_acc = 0usize;
        for c in letters.bytes() {
            let digit = (c.to_ascii_uppercase() - b'A') as usize + 1;
            col_acc = col_acc
                .checked_mul(26)
                .and_then(|acc| acc.checked_add(digit))
                .ok_or_else(|| AddressError::ColumnOverflow(name.to_string()))?;
        }
        let col = col_acc - 1;

        let row = Some(digits)
            .filter(|d| d.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|d| d.parse::<usize>().ok())
            .and_then(|n| n.checked_sub(1))
            .ok_or_else(|| AddressError::InvalidRow(name.to_string()))?;

        Ok(CellRef::new(col, row))
    }

    /// Convert column index to spreadsheet-style letters (0 -> A, 25 -> Z, 26 -> AA).
    pub fn col_to_letters(col: usize) -> String {
        let mut result = String::new();
        let mut n = col as u128 + 1;
        while n > 0 {
            n -= 1;
            result.insert(0, (b'A' + (n % 26) as u8) as char);
            n /= 26;
        }
        result
    }

    /// Canonical uppercase address, e.g. `AA12`.
    pub fn address(&self) -> String {
        self.to_string()
    }
}

impl std::str::FromStr for CellRef {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", CellRef::col_to_letters(self.col), self.row as u128 + 1)
    }
}

/// Canonicalize an address string (`"aa12"` -> `"AA12"`).
pub fn canonical_address(name: &str) -> Result<String, AddressError> {
    CellRef::parse(name).map(|cell| cell.to_string())
}
