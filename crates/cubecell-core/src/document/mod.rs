//! Document state and logic (UI-agnostic).

mod cell;
mod io;
mod ops;
mod recalc;
mod state;

pub use cell::{Cell, CellStorage, Sheet, StorageLookup};
pub use recalc::{Recalc, RecalcSummary, Recalculator};
pub use state::Document;
