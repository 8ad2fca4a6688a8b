//! Expression tree produced by the parser.

use num_bigint::BigInt;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Identity,
    Increment,
    Decrement,
    Not,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eq,
    Neq,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
    Eqv,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "mod",
            BinaryOp::Pow => "^",
            BinaryOp::Eq => "=",
            BinaryOp::Neq => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Eqv => "eqv",
        }
    }
}

/// Built-in functions callable from formulas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Function {
    /// `max(a, b)`
    Max,
    /// `min(a, b)`
    Min,
    /// `mmax(a, ...)`
    MMax,
    /// `mmin(a, ...)`
    MMin,
}

impl Function {
    /// Look up a function by (case-insensitive) name.
    pub fn from_name(name: &str) -> Option<Function> {
        match name.to_ascii_lowercase().as_str() {
            "max" => Some(Function::Max),
            "min" => Some(Function::Min),
            "mmax" => Some(Function::MMax),
            "mmin" => Some(Function::MMin),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Function::Max => "max",
            Function::Min => "min",
            Function::MMax => "mmax",
            Function::MMin => "mmin",
        }
    }

    /// Whether `count` arguments is a valid call.
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Function::Max | Function::Min => count == 2,
            Function::MMax | Function::MMin => count >= 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    Number(BigInt),
    Text(String),
    /// Canonical uppercase address.
    CellRef(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        function: Function,
        args: Vec<Expr>,
    },
    Group(Box<Expr>),
}

impl Expr {
    /// Visit every node, parents before children.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Expr)) {
        visit(self);
        match self {
            Expr::Number(_) | Expr::Text(_) | Expr::CellRef(_) => {}
            Expr::Unary { operand, .. } => operand.walk(visit),
            Expr::Binary { left, right, .. } => {
                left.walk(visit);
                right.walk(visit);
            }
            Expr::Call { args, .. } => {
                for arg in args {
                    arg.walk(visit);
                }
            }
            Expr::Group(inner) => inner.walk(visit),
        }
    }
}

/// Renders the tree with explicit grouping, e.g. `1 + 2 * 3` -> `(1 + (2 * 3))`.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{n}"),
            Expr::Text(s) => write!(f, "\"{}\"", s.replace('"', "\"\"")),
            Expr::CellRef(address) => write!(f, "{address}"),
            Expr::Unary { op, operand } => match op {
                UnaryOp::Negate => write!(f, "-{operand}"),
                UnaryOp::Identity => write!(f, "+{operand}"),
                UnaryOp::Increment => write!(f, "{operand}++"),
                UnaryOp::Decrement => write!(f, "{operand}--"),
                UnaryOp::Not => write!(f, "not {operand}"),
            },
            Expr::Binary { op, left, right } => write!(f, "({left} {} {right})", op.symbol()),
            Expr::Call { function, args } => {
                write!(f, "{}(", function.name())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Expr::Group(inner) => write!(f, "{inner}"),
        }
    }
}
