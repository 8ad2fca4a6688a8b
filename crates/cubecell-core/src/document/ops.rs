use super::cell::{Cell, CellStorage};
use super::recalc::{Recalc, RecalcSummary};
use super::{Document, StorageLookup};
use crate::error::Result;
use cubecell_engine::engine::{CellRef, Evaluator, FormulaResult, Value};

impl Document {
    /// Set cell contents from input string and bring dependents up to date.
    ///
    /// Formula input is recalculated (and cascaded) immediately. Literal or
    /// empty input drops the cell's own dependency edges, then its dependents
    /// are recalculated against the new text.
    pub fn set_cell_from_input(&mut self, at: CellRef, input: &str) -> Result<Recalc> {
        let cell = Cell::from_input(input);
        let is_formula = cell.is_formula();
        self.sheet.set_cell(at, cell);
        self.modified = true;

        if is_formula {
            return self.recalculator().recalculate(at);
        }

        self.graph.clear_dependencies(&at.to_string());
        self.recalculator().recalculate_dependents(at)?;
        Ok(Recalc::Literal)
    }

    /// [`Document::set_cell_from_input`] addressed by text such as `"B7"`.
    pub fn set_cell_by_address(&mut self, address: &str, input: &str) -> Result<Recalc> {
        let at = CellRef::parse(address)?;
        self.set_cell_from_input(at, input)
    }

    /// Get the display value for a cell (empty when unset).
    pub fn get_cell_display(&self, at: CellRef) -> String {
        self.sheet.value_at(at).to_string()
    }

    pub fn display_by_address(&self, address: &str) -> Result<String> {
        Ok(self.get_cell_display(CellRef::parse(address)?))
    }

    /// Evaluate a formula against the current values without storing it.
    pub fn evaluate_formula(&self, formula: &str) -> FormulaResult<Value> {
        let lookup = StorageLookup(&self.sheet);
        Evaluator::with_options(&lookup, self.options).evaluate(formula)
    }

    /// Rebuild the dependency graph and recompute every formula.
    pub fn recalculate_all(&mut self) -> Result<RecalcSummary> {
        self.recalculator().recalculate_all()
    }
}
