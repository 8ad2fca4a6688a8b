//! Spreadsheet engine API.
//!
//! This module provides the core computation engine for the spreadsheet:
//!
//! - [`CellRef`] - Cell reference parsing (A1 notation ↔ column/row indices)
//! - [`DependencyGraph`] - Acyclic cell dependency graph with topological ordering
//! - [`detect_cycle`] - Circular dependency detection
//! - [`parse_formula`] - Formula text → [`Expr`] tree
//! - [`extract_dependencies`] - Cell references read by a formula
//! - [`Evaluator`] - Tree-walking evaluation over exact integers
//! - [`format_value`] - Format values for display

mod ast;
mod cell_ref;
mod cycle;
mod deps;
mod error;
mod eval;
mod format;
mod graph;
mod lexer;
mod parser;

pub use ast::{BinaryOp, Expr, Function, UnaryOp};
pub use cell_ref::{CellRef, canonical_address};
pub use cycle::detect_cycle;
pub use deps::{collect_references, extract_dependencies};
pub use error::{AddressError, CycleError, FormulaError, FormulaResult};
pub use eval::{EvalOptions, Evaluator, Value, ValueLookup, evaluate};
pub use format::{ERROR_VALUE, format_value};
pub use graph::{Adjacency, DependencyGraph};
pub use lexer::{Spanned, Token, tokenize};
pub use parser::{MAX_NESTING, MAX_TREE_DEPTH, parse_formula};

pub use num_bigint::BigInt;
