use cubecell_engine::engine::{DependencyGraph, EvalOptions};
use std::path::PathBuf;

use super::cell::Sheet;
use super::recalc::Recalculator;

/// UI-agnostic document state for the spreadsheet.
pub struct Document {
    /// The cell store
    pub sheet: Sheet,
    /// Dependency edges between formula cells, keyed by canonical address
    pub graph: DependencyGraph,
    /// Evaluation limits applied to every formula
    pub options: EvalOptions,
    /// File the sheet was loaded from
    pub file_path: Option<PathBuf>,
    /// Whether cells changed since load
    pub modified: bool,
}

impl Document {
    /// Create a new empty document.
    ///
    /// This constructor is side-effect free: it does not touch the filesystem.
    pub fn new() -> Self {
        Self::with_options(EvalOptions::default())
    }

    pub fn with_options(options: EvalOptions) -> Self {
        Document {
            sheet: Sheet::new(),
            graph: DependencyGraph::new(),
            options,
            file_path: None,
            modified: false,
        }
    }

    /// Orchestrator over this document's sheet and graph.
    pub fn recalculator(&mut self) -> Recalculator<'_, Sheet> {
        Recalculator::new(&mut self.sheet, &mut self.graph, self.options)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
