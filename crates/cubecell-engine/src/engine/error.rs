//! Error types for the formula engine.

use num_bigint::BigInt;
use thiserror::Error;

/// Malformed cell address text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid cell reference {0:?}: missing column letters")]
    MissingColumn(String),

    #[error("Invalid cell reference {0:?}: missing row number")]
    MissingRow(String),

    #[error("Invalid cell reference {0:?}: row must be a positive integer")]
    InvalidRow(String),

    #[error("Invalid cell reference {0:?}: column out of range")]
    ColumnOverflow(String),
}

/// Faults raised while parsing or evaluating a formula.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormulaError {
    #[error("Syntax error at offset {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("Division by zero")]
    DivideByZero,

    #[error("Negative exponents are not supported: {0}")]
    NegativeExponent(BigInt),

    #[error("Exponent {exponent} exceeds the maximum of {max}")]
    ExponentTooLarge { exponent: BigInt, max: u32 },
}

impl FormulaError {
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        FormulaError::Syntax {
            position,
            message: message.into(),
        }
    }

    /// True for faults raised by arithmetic rather than by the parser.
    pub fn is_arithmetic(&self) -> bool {
        !matches!(self, FormulaError::Syntax { .. })
    }
}

/// A dependency edge set was rejected because it would break acyclicity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CycleError {
    #[error("Cell {0} cannot depend on itself")]
    SelfReference(String),

    #[error("Circular dependency detected: {}", path.join(" -> "))]
    Cycle { path: Vec<String> },
}

pub type FormulaResult<T> = std::result::Result<T, FormulaError>;
