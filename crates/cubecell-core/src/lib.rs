//! cubecell-core - UI-agnostic cell store, recalculation and sheet storage.

pub mod document;
pub mod error;
pub mod storage;

pub use document::{
    Cell, CellStorage, Document, Recalc, RecalcSummary, Recalculator, Sheet, StorageLookup,
};
pub use error::{CoreError, Result};

pub use cubecell_engine::engine::{CellRef, DependencyGraph, EvalOptions};
