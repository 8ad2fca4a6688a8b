//! Recalculation orchestrator.
//!
//! Ties formula evaluation to dependency graph updates for one target cell:
//!
//! 1. literal cells are left alone
//! 2. the formula's references are extracted
//! 3. they replace the cell's edges in the graph; a cycle writes `#ERROR`
//!    and stops without touching dependents
//! 4. the formula is evaluated against the live store; any fault writes `#ERROR`
//! 5. the whole graph is ordered topologically; any cycle anywhere blocks the cascade
//! 6. the cell's transitive dependents are re-evaluated in that order
//!
//! The store and the graph are borrowed for the duration of one request.

use std::collections::{BTreeSet, HashMap};

use cubecell_engine::engine::{
    CellRef, CycleError, DependencyGraph, ERROR_VALUE, EvalOptions, Evaluator, FormulaError,
    extract_dependencies, format_value,
};

use super::cell::{CellStorage, StorageLookup};
use crate::error::{CoreError, Result};

/// What a single-cell recalculation did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Recalc {
    /// Not a formula cell; nothing was evaluated.
    Literal,
    /// The formula was evaluated and its value written.
    Computed(String),
    /// Parsing or evaluation faulted; `#ERROR` was written.
    Faulted(FormulaError),
    /// The formula's references would close a cycle; `#ERROR` was written
    /// and the graph kept its previous edges.
    CycleRejected(CycleError),
}

impl Recalc {
    /// True when the cell now holds a real value.
    pub fn is_ok(&self) -> bool {
        matches!(self, Recalc::Literal | Recalc::Computed(_))
    }
}

/// Counts from a whole-sheet recalculation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecalcSummary {
    pub computed: usize,
    pub faulted: usize,
    pub rejected: usize,
}

pub struct Recalculator<'a, S: CellStorage + ?Sized> {
    storage: &'a mut S,
    graph: &'a mut DependencyGraph,
    options: EvalOptions,
}

impl<'a, S: CellStorage + ?Sized> Recalculator<'a, S> {
    pub fn new(storage: &'a mut S, graph: &'a mut DependencyGraph, options: EvalOptions) -> Self {
        Recalculator {
            storage,
            graph,
            options,
        }
    }

    /// Recalculate `at` and cascade to everything that depends on it.
    ///
    /// Returns [`CoreError::CascadeBlocked`] if the graph has no topological
    /// order; the value of `at` itself has already been written in that case.
    /// A graph that already holds a cycle rejects the write in step 3 first,
    /// so through this entry point the gate only guards the cascade.
    pub fn recalculate(&mut self, at: CellRef) -> Result<Recalc> {
        let outcome = self.recalculate_cell(at);
        if matches!(outcome, Recalc::Literal | Recalc::CycleRejected(_)) {
            return Ok(outcome);
        }
        self.recalculate_dependents(at)?;
        Ok(outcome)
    }

    /// Re-evaluate every transitive dependent of `at`, each after all of its
    /// own dependencies.
    pub fn recalculate_dependents(&mut self, at: CellRef) -> Result<()> {
        let address = at.to_string();
        let Some(order) = self.graph.topological_order() else {
            let cycle = self.graph.detect_cycle().unwrap_or_default();
            log::warn!(
                "cascade from {address} blocked by cycle {}",
                cycle.join(" -> ")
            );
            return Err(CoreError::CascadeBlocked { cell: address });
        };

        let affected = self.graph.transitive_dependents(&address);
        if affected.is_empty() {
            return Ok(());
        }
        log::debug!("cascading from {address} to {} cells", affected.len());

        for dependent in order.iter().filter(|node| affected.contains(*node)) {
            let dependent_at = CellRef::parse(dependent)?;
            self.recalculate_cell(dependent_at);
        }
        Ok(())
    }

    /// Rebuild the graph from every cell in the store and evaluate all
    /// formulas in dependency order.
    pub fn recalculate_all(&mut self) -> Result<RecalcSummary> {
        let mut summary = RecalcSummary::default();
        let mut pending = Vec::new();

        for (at, cell) in self.storage.all_cells() {
            let address = at.to_string();
            let Some(formula) = cell.formula_text() else {
                self.graph.clear_dependencies(&address);
                continue;
            };
            let dependencies = dependencies_of(formula);
            match self.graph.set_dependencies(&address, dependencies) {
                Ok(()) => pending.push((at, formula.to_string())),
                Err(err) => {
                    log::warn!("{address}: {err}");
                    self.write_value(at, ERROR_VALUE.to_string());
                    summary.rejected += 1;
                }
            }
        }

        let Some(order) = self.graph.topological_order() else {
            let cycle = self.graph.detect_cycle().unwrap_or_default();
            log::warn!("sheet recalculation blocked by cycle {}", cycle.join(" -> "));
            return Err(CoreError::CascadeBlocked {
                cell: cycle.into_iter().next().unwrap_or_default(),
            });
        };
        let rank: HashMap<&str, usize> = order
            .iter()
            .enumerate()
            .map(|(i, node)| (node.as_str(), i))
            .collect();
        pending.sort_by_key(|(at, _)| rank.get(at.to_string().as_str()).copied().unwrap_or(0));

        for (at, formula) in pending {
            match self.evaluate_into(at, &formula) {
                Recalc::Computed(_) => summary.computed += 1,
                _ => summary.faulted += 1,
            }
        }

        log::debug!(
            "recalculated sheet: {} computed, {} faulted, {} rejected",
            summary.computed,
            summary.faulted,
            summary.rejected
        );
        Ok(summary)
    }

    /// Steps 1-4 for a single cell, without cascading.
    fn recalculate_cell(&mut self, at: CellRef) -> Recalc {
        let Some(formula) = self
            .storage
            .get_cell(at)
            .and_then(|cell| cell.formula_text())
            .map(str::to_string)
        else {
            return Recalc::Literal;
        };

        let address = at.to_string();
        let dependencies = dependencies_of(&formula);
        if let Err(err) = self.graph.set_dependencies(&address, dependencies) {
            log::warn!("{address}: {err}");
            self.write_value(at, ERROR_VALUE.to_string());
            return Recalc::CycleRejected(err);
        }

        self.evaluate_into(at, &formula)
    }

    fn evaluate_into(&mut self, at: CellRef, formula: &str) -> Recalc {
        let lookup = StorageLookup(&*self.storage);
        let result = Evaluator::with_options(&lookup, self.options).evaluate(formula);

        match result {
            Ok(value) => {
                let text = format_value(&value);
                log::debug!("{at} {formula} => {text}");
                self.write_value(at, text.clone());
                Recalc::Computed(text)
            }
            Err(err) => {
                log::debug!("{at} {formula} faulted: {err}");
                self.write_value(at, ERROR_VALUE.to_string());
                Recalc::Faulted(err)
            }
        }
    }

    fn write_value(&mut self, at: CellRef, value: String) {
        let mut cell = self.storage.get_cell(at).cloned().unwrap_or_default();
        cell.value = Some(value);
        cell.mark_calculated();
        self.storage.set_cell(at, cell);
    }
}

/// References read by a formula. A formula that does not parse reads nothing;
/// its evaluation reports the syntax error.
fn dependencies_of(formula: &str) -> BTreeSet<String> {
    extract_dependencies(formula).unwrap_or_default()
}
