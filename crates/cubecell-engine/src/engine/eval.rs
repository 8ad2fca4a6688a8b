//! Tree-walking formula evaluation.
//!
//! Values are exact integers, booleans, or text. Text only arises from
//! string literals and cell lookups and is coerced where an operator needs a
//! number or a boolean:
//!
//! - to number: integers pass through, booleans are 1/0, text parses as an
//!   integer or else counts as 0
//! - to boolean: booleans pass through, integers test nonzero, text tests
//!   nonempty
//!
//! Cell values come from an injected [`ValueLookup`]; a missing value reads
//! as empty text.

use num_bigint::BigInt;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::fmt;

use super::ast::{BinaryOp, Expr, Function, UnaryOp};
use super::error::{FormulaError, FormulaResult};
use super::format::format_value;
use super::parser::parse_formula;

/// A value produced during evaluation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Number(BigInt),
    Bool(bool),
    Text(String),
}

impl Value {
    pub fn to_number(&self) -> BigInt {
        match self {
            Value::Number(n) => n.clone(),
            Value::Bool(b) => {
                if *b {
                    BigInt::one()
                } else {
                    BigInt::zero()
                }
            }
            Value::Text(s) => parse_integer(s).unwrap_or_default(),
        }
    }

    pub fn to_bool(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Number(n) => !n.is_zero(),
            Value::Text(s) => !s.is_empty(),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(BigInt::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_value(self))
    }
}

/// Read access to the current display value of a cell, by canonical address.
pub trait ValueLookup {
    fn get_cell_value_by_address(&self, address: &str) -> Option<String>;
}

impl<F> ValueLookup for F
where
    F: Fn(&str) -> Option<String>,
{
    fn get_cell_value_by_address(&self, address: &str) -> Option<String> {
        self(address)
    }
}

/// Tunables for evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EvalOptions {
    /// Largest exponent accepted by `^`.
    pub max_exponent: u32,
}

impl Default for EvalOptions {
    fn default() -> Self {
        EvalOptions {
            max_exponent: i32::MAX as u32,
        }
    }
}

/// Evaluates formulas against a value lookup.
pub struct Evaluator<'a, L: ValueLookup + ?Sized> {
    lookup: &'a L,
    options: EvalOptions,
}

impl<'a, L: ValueLookup + ?Sized> Evaluator<'a, L> {
    pub fn new(lookup: &'a L) -> Self {
        Self::with_options(lookup, EvalOptions::default())
    }

    pub fn with_options(lookup: &'a L, options: EvalOptions) -> Self {
        Evaluator { lookup, options }
    }

    /// Parse and evaluate a formula (leading `=` optional).
    pub fn evaluate(&self, formula: &str) -> FormulaResult<Value> {
        let expr = parse_formula(formula)?;
        self.eval(&expr)
    }

    pub fn eval(&self, expr: &Expr) -> FormulaResult<Value> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(n.clone())),
            Expr::Text(s) => Ok(Value::Text(s.clone())),
            Expr::CellRef(address) => Ok(Value::Text(
                self.lookup
                    .get_cell_value_by_address(address)
                    .unwrap_or_default(),
            )),
            Expr::Group(inner) => self.eval(inner),
            Expr::Unary { op, operand } => {
                let value = self.eval(operand)?;
                Ok(match op {
                    UnaryOp::Negate => Value::Number(-value.to_number()),
                    UnaryOp::Identity => Value::Number(value.to_number()),
                    UnaryOp::Increment => Value::Number(value.to_number() + BigInt::one()),
                    UnaryOp::Decrement => Value::Number(value.to_number() - BigInt::one()),
                    UnaryOp::Not => Value::Bool(!value.to_bool()),
                })
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                self.binary(*op, &left, &right)
            }
            Expr::Call { function, args } => {
                let values = args
                    .iter()
                    .map(|arg| self.eval(arg).map(|v| v.to_number()))
                    .collect::<FormulaResult<Vec<BigInt>>>()?;
                Ok(Value::Number(aggregate(*function, values)))
            }
        }
    }

    fn binary(&self, op: BinaryOp, l: &Value, r: &Value) -> FormulaResult<Value> {
        Ok(match op {
            BinaryOp::And => Value::Bool(l.to_bool() && r.to_bool()),
            BinaryOp::Or => Value::Bool(l.to_bool() || r.to_bool()),
            BinaryOp::Eqv => Value::Bool(l.to_bool() == r.to_bool()),
            BinaryOp::Add => Value::Number(l.to_number() + r.to_number()),
            BinaryOp::Sub => Value::Number(l.to_number() - r.to_number()),
            BinaryOp::Mul => Value::Number(l.to_number() * r.to_number()),
            BinaryOp::Div => Value::Number(divide(l.to_number(), r.to_number())?),
            BinaryOp::Mod => Value::Number(modulo(l.to_number(), r.to_number())?),
            BinaryOp::Pow => Value::Number(self.pow(&l.to_number(), &r.to_number())?),
            BinaryOp::Eq => Value::Bool(l.to_number() == r.to_number()),
            BinaryOp::Neq => Value::Bool(l.to_number() != r.to_number()),
            BinaryOp::Lt => Value::Bool(l.to_number() < r.to_number()),
            BinaryOp::Gt => Value::Bool(l.to_number() > r.to_number()),
            BinaryOp::Le => Value::Bool(l.to_number() <= r.to_number()),
            BinaryOp::Ge => Value::Bool(l.to_number() >= r.to_number()),
        })
    }

    fn pow(&self, base: &BigInt, exponent: &BigInt) -> FormulaResult<BigInt> {
        if exponent.is_negative() {
            return Err(FormulaError::NegativeExponent(exponent.clone()));
        }
        let max = self.options.max_exponent;
        match exponent.to_u32() {
            Some(exp) if exp <= max => Ok(base.pow(exp)),
            _ => Err(FormulaError::ExponentTooLarge {
                exponent: exponent.clone(),
                max,
            }),
        }
    }
}

/// Plain decimal integer text: an optional sign followed by ASCII digits only.
fn parse_integer(text: &str) -> Option<BigInt> {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Truncating integer division.
fn divide(l: BigInt, r: BigInt) -> FormulaResult<BigInt> {
    if r.is_zero() {
        return Err(FormulaError::DivideByZero);
    }
    Ok(l / r)
}

/// Remainder modulo `|r|`, always in `0..|r|`.
fn modulo(l: BigInt, r: BigInt) -> FormulaResult<BigInt> {
    if r.is_zero() {
        return Err(FormulaError::DivideByZero);
    }
    let modulus = r.abs();
    let rem = l % &modulus;
    Ok(if rem.is_negative() { rem + modulus } else { rem })
}

fn aggregate(function: Function, values: Vec<BigInt>) -> BigInt {
    let folded = match function {
        Function::Max | Function::MMax => values.into_iter().max(),
        Function::Min | Function::MMin => values.into_iter().min(),
    };
    folded.unwrap_or_default()
}

/// Evaluate a formula with default options.
pub fn evaluate<L: ValueLookup + ?Sized>(formula: &str, lookup: &L) -> FormulaResult<Value> {
    Evaluator::new(lookup).evaluate(formula)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn no_cells(_: &str) -> Option<String> {
        None
    }

    fn eval(formula: &str) -> FormulaResult<Value> {
        evaluate(formula, &no_cells)
    }

    fn num(n: i64) -> FormulaResult<Value> {
        Ok(Value::from(n))
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("=1+2"), num(3));
        assert_eq!(eval("=5-2"), num(3));
        assert_eq!(eval("=3*2"), num(6));
        assert_eq!(eval("=8/2"), num(4));
        assert_eq!(eval("=7 div 2"), num(3));
        assert_eq!(eval("=-7/2"), num(-3));
        assert_eq!(eval("=1+2*3"), num(7));
        assert_eq!(eval("=(1+2)*3"), num(9));
    }

    #[test]
    fn test_unary_and_power() {
        assert_eq!(eval("=-5"), num(-5));
        assert_eq!(eval("=+5"), num(5));
        assert_eq!(eval("=2^3"), num(8));
        assert_eq!(eval("=2^0"), num(1));
        assert_eq!(eval("=-2^2"), num(4));
    }

    #[test]
    fn test_increment_and_decrement() {
        assert_eq!(eval("=5++"), num(6));
        assert_eq!(eval("=++5"), num(6));
        assert_eq!(eval("=5--"), num(4));
        assert_eq!(eval("=--5"), num(4));
    }

    #[test]
    fn test_mod_uses_absolute_modulus() {
        assert_eq!(eval("=7 mod 3"), num(1));
        assert_eq!(eval("=7 mod -3"), num(1));
        assert_eq!(eval("=-7 mod 3"), num(2));
    }

    #[test]
    fn test_divide_by_zero() {
        assert_eq!(eval("=5/0"), Err(FormulaError::DivideByZero));
        assert_eq!(eval("=5 div 0"), Err(FormulaError::DivideByZero));
        assert_eq!(eval("=5 mod 0"), Err(FormulaError::DivideByZero));
    }

    #[test]
    fn test_negative_exponent() {
        let err = eval("=2^-1").unwrap_err();
        assert_eq!(err, FormulaError::NegativeExponent(BigInt::from(-1)));
        assert!(err.is_arithmetic());
        assert!(err.to_string().contains("Negative exponents"));
    }

    #[test]
    fn test_exponent_bound() {
        let options = EvalOptions { max_exponent: 10 };
        let evaluator = Evaluator::with_options(&no_cells, options);
        assert_eq!(evaluator.evaluate("=2^10"), num(1024));
        assert_eq!(
            evaluator.evaluate("=2^11"),
            Err(FormulaError::ExponentTooLarge {
                exponent: BigInt::from(11),
                max: 10
            })
        );
        assert!(matches!(
            eval("=2^99999999999"),
            Err(FormulaError::ExponentTooLarge { .. })
        ));
    }

    #[test]
    fn test_exact_big_integers() {
        let expected: BigInt = "1267650600228229401496703205376".parse().unwrap();
        assert_eq!(eval("=2^100"), Ok(Value::Number(expected)));
        assert_eq!(
            eval("=99999999999999999999 + 1"),
            Ok(Value::Number("100000000000000000000".parse().unwrap()))
        );
    }

    #[test]
    fn test_logic() {
        assert_eq!(eval("=1 and 0"), Ok(Value::Bool(false)));
        assert_eq!(eval("=1 or 0"), Ok(Value::Bool(true)));
        assert_eq!(eval("=not(1)"), Ok(Value::Bool(false)));
        assert_eq!(eval("=not(0)"), Ok(Value::Bool(true)));
        assert_eq!(eval("=0 eqv 0"), Ok(Value::Bool(true)));
        assert_eq!(eval("=1 eqv 0"), Ok(Value::Bool(false)));
        assert_eq!(eval("=\"x\" and 2"), Ok(Value::Bool(true)));
        assert_eq!(eval("=\"\" or 0"), Ok(Value::Bool(false)));
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(eval("=5>3"), Ok(Value::Bool(true)));
        assert_eq!(eval("=5=5"), Ok(Value::Bool(true)));
        assert_eq!(eval("=5<>4"), Ok(Value::Bool(true)));
        assert_eq!(eval("=2>=3"), Ok(Value::Bool(false)));
        assert_eq!(eval("=2<=2"), Ok(Value::Bool(true)));
        assert_eq!(eval("=3<2"), Ok(Value::Bool(false)));
    }

    #[test]
    fn test_booleans_coerce_to_numbers() {
        assert_eq!(eval("=(1<2) + (2<3)"), num(2));
        assert_eq!(eval("=\"abc\" + 1"), num(1));
        assert_eq!(eval("=\"41\" + 1"), num(42));
    }

    #[test]
    fn test_aggregates() {
        assert_eq!(eval("=max(2,5)"), num(5));
        assert_eq!(eval("=min(2,5)"), num(2));
        assert_eq!(eval("=mmax(1,3,2)"), num(3));
        assert_eq!(eval("=mmin(1,3,2)"), num(1));
        assert_eq!(eval("=mmax(-4)"), num(-4));
        assert_eq!(aggregate(Function::MMax, Vec::new()), BigInt::zero());
    }

    #[test]
    fn test_faults_inside_arguments_propagate() {
        assert_eq!(eval("=mmax(1, 2/0)"), Err(FormulaError::DivideByZero));
        assert_eq!(eval("=0 and 1/0"), Err(FormulaError::DivideByZero));
    }

    #[test]
    fn test_cell_reference_value() {
        let cells: HashMap<&str, &str> = HashMap::from([("A1", "10")]);
        let lookup = |address: &str| cells.get(address).map(|v| v.to_string());

        assert_eq!(evaluate("=A1+5", &lookup), num(15));
        assert_eq!(evaluate("=a1*2", &lookup), num(20));
    }

    #[test]
    fn test_text_coerces_only_plain_integers() {
        let cells: HashMap<&str, &str> = HashMap::from([
            ("A1", "1_000"),
            ("A2", "-42"),
            ("A3", "+7"),
            ("A4", " 5"),
            ("A5", "12abc"),
            ("A6", "-"),
        ]);
        let lookup = |address: &str| cells.get(address).map(|v| v.to_string());

        assert_eq!(evaluate("=A1+0", &lookup), num(0));
        assert_eq!(evaluate("=A2+0", &lookup), num(-42));
        assert_eq!(evaluate("=A3+0", &lookup), num(7));
        assert_eq!(evaluate("=A4+0", &lookup), num(0));
        assert_eq!(evaluate("=A5+0", &lookup), num(0));
        assert_eq!(evaluate("=A6+0", &lookup), num(0));
    }

    #[test]
    fn test_missing_cell_is_empty_text() {
        assert_eq!(eval("=B2"), Ok(Value::Text(String::new())));
        assert_eq!(eval("=B2+1"), num(1));
    }

    #[test]
    fn test_syntax_error_is_a_fault() {
        assert!(matches!(eval("=1+"), Err(FormulaError::Syntax { .. })));
    }

    #[test]
    fn test_value_formatting() {
        assert_eq!(Value::from(-12).to_string(), "-12");
        assert_eq!(Value::Bool(true).to_string(), "TRUE");
        assert_eq!(Value::Bool(false).to_string(), "FALSE");
        assert_eq!(Value::Text("hi".to_string()).to_string(), "hi");
    }
}
