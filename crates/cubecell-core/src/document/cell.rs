//! Cell data and the storage capability the recalculation layer works through.
//!
//! - [`Cell`] - formula text plus last computed (or literal) value
//! - [`CellStorage`] - get/set/enumerate cells by coordinates
//! - [`Sheet`] - sparse in-memory [`CellStorage`]
//! - [`StorageLookup`] - adapts any [`CellStorage`] to the evaluator's value lookup

use std::collections::{BTreeMap, HashMap};

use cubecell_engine::engine::{CellRef, ValueLookup};

/// A cell in the spreadsheet.
///
/// `formula` holds the text as entered. If it starts with `=` the cell is
/// computed and `value` is its last result; otherwise `value` equals the
/// entered text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cell {
    pub formula: Option<String>,
    pub value: Option<String>,
    calculated_formula: Option<String>,
}

impl Cell {
    pub fn literal(text: &str) -> Cell {
        Cell {
            formula: Some(text.to_string()),
            value: Some(text.to_string()),
            calculated_formula: None,
        }
    }

    /// A computed cell that has not been evaluated yet.
    pub fn formula(formula: &str) -> Cell {
        Cell {
            formula: Some(formula.to_string()),
            value: None,
            calculated_formula: None,
        }
    }

    /// Parse user input and create the matching cell.
    /// - Empty string or whitespace -> empty cell
    /// - Starts with '=' -> formula
    /// - Otherwise -> literal text
    pub fn from_input(input: &str) -> Cell {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            Cell::default()
        } else if trimmed.starts_with('=') {
            Cell::formula(trimmed)
        } else {
            Cell::literal(trimmed)
        }
    }

    pub fn is_formula(&self) -> bool {
        self.formula.as_deref().is_some_and(|f| f.starts_with('='))
    }

    /// The formula text if this is a computed cell.
    pub fn formula_text(&self) -> Option<&str> {
        self.formula.as_deref().filter(|f| f.starts_with('='))
    }

    /// True when the formula changed since the value was last computed.
    pub fn needs_recalculation(&self) -> bool {
        self.is_formula() && self.formula != self.calculated_formula
    }

    pub fn mark_calculated(&mut self) {
        self.calculated_formula = self.formula.clone();
    }

    pub fn display_value(&self) -> &str {
        self.value.as_deref().unwrap_or("")
    }

    /// Get the text to show when editing the cell.
    pub fn to_input_string(&self) -> String {
        self.formula.clone().unwrap_or_default()
    }
}

/// Cell storage capability consumed by the recalculation layer.
pub trait CellStorage {
    fn get_cell(&self, at: CellRef) -> Option<&Cell>;

    fn set_cell(&mut self, at: CellRef, cell: Cell);

    /// Snapshot of every stored cell, row-major.
    fn all_cells(&self) -> BTreeMap<CellRef, Cell>;

    /// Most recent value of the cell at `address`; None for unknown or malformed addresses.
    fn get_cell_value_by_address(&self, address: &str) -> Option<String> {
        let at = CellRef::parse(address).ok()?;
        self.get_cell(at)?.value.clone()
    }
}

/// Sparse in-memory cell store.
#[derive(Clone, Debug, Default)]
pub struct Sheet {
    cells: HashMap<CellRef, Cell>,
}

impl Sheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Display value at `at`, empty when unset.
    pub fn value_at(&self, at: CellRef) -> &str {
        self.cells.get(&at).map(Cell::display_value).unwrap_or("")
    }
}

impl CellStorage for Sheet {
    fn get_cell(&self, at: CellRef) -> Option<&Cell> {
        self.cells.get(&at)
    }

    fn set_cell(&mut self, at: CellRef, cell: Cell) {
        self.cells.insert(at, cell);
    }

    fn all_cells(&self) -> BTreeMap<CellRef, Cell> {
        self.cells
            .iter()
            .map(|(at, cell)| (*at, cell.clone()))
            .collect()
    }
}

/// Value lookup backed by live cell storage.
pub struct StorageLookup<'a, S: CellStorage + ?Sized>(pub &'a S);

impl<S: CellStorage + ?Sized> ValueLookup for StorageLookup<'_, S> {
    fn get_cell_value_by_address(&self, address: &str) -> Option<String> {
        self.0.get_cell_value_by_address(address)
    }
}
