use super::Document;
use super::recalc::RecalcSummary;
use crate::error::{CoreError, Result};
use crate::storage::{parse_sheet, write_sheet, write_values};
use cubecell_engine::engine::DependencyGraph;
use std::path::{Path, PathBuf};

impl Document {
    /// Load a sheet file, replacing the current cells, and calculate every formula.
    pub fn load_file(&mut self, path: &Path) -> Result<RecalcSummary> {
        // Parse before touching state so a bad file leaves the document as it was.
        let sheet = parse_sheet(path)?;

        self.sheet = sheet;
        self.graph = DependencyGraph::new();
        let summary = self.recalculate_all()?;

        self.file_path = Some(path.to_path_buf());
        self.modified = false;
        log::info!(
            "loaded {}: {} computed, {} faulted, {} rejected",
            path.display(),
            summary.computed,
            summary.faulted,
            summary.rejected
        );
        Ok(summary)
    }

    /// Save cell inputs to the current file path.
    /// Returns the path saved to.
    pub fn save_file(&mut self) -> Result<PathBuf> {
        let Some(path) = &self.file_path else {
            return Err(CoreError::NoFilePath);
        };

        write_sheet(path, &self.sheet)?;
        self.modified = false;
        Ok(path.clone())
    }

    /// Write the current values of all cells as a report.
    pub fn export_values(&self, path: &Path) -> Result<()> {
        write_values(path, &self.sheet)
    }
}
