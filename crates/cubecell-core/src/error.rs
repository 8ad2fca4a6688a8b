//! Error types for Cubecell core.

use cubecell_engine::engine::AddressError;
use thiserror::Error;

/// Errors that can occur in the Cubecell document layer
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("No file path set")]
    NoFilePath,

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error("Recalculation of cells depending on {cell} blocked: the dependency graph contains a cycle")]
    CascadeBlocked { cell: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
