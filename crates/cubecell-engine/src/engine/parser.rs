//! Recursive descent parser turning formula text into an [`Expr`] tree.
//!
//! Grammar (lowest precedence first, all binary levels left-associative):
//!
//! ```text
//! formula        --> "="? logical EOF
//! logical        --> negation (("and" | "or" | "eqv") negation)*
//! negation       --> "not" negation | comparison
//! comparison     --> additive (("=" | "<>" | "<" | ">" | "<=" | ">=") additive)*
//! additive       --> multiplicative (("+" | "-") multiplicative)*
//! multiplicative --> power (("*" | "/" | "div" | "mod") power)*
//! power          --> prefix ("^" prefix)*
//! prefix         --> ("+" | "-" | "++" | "--") prefix | postfix
//! postfix        --> primary ("++" | "--")*
//! primary        --> NUMBER | STRING | CELL_REF | call | "(" logical ")"
//! call           --> IDENT "(" logical ("," logical)* ")"
//! ```
//!
//! Nesting is capped at [`MAX_NESTING`] and tree height at [`MAX_TREE_DEPTH`];
//! deeper formulas are syntax errors.

use super::ast::{BinaryOp, Expr, Function, UnaryOp};
use super::cell_ref::CellRef;
use super::error::{FormulaError, FormulaResult};
use super::lexer::{Spanned, Token, tokenize};

/// Parse a formula. A single leading `=` is accepted and skipped.
pub fn parse_formula(formula: &str) -> FormulaResult<Expr> {
    let (body, base) = match formula.strip_prefix('=') {
        Some(rest) => (rest, 1),
        None => (formula, 0),
    };
    Parser::new(body, base)?.parse()
}

/// Deepest accepted nesting of parentheses, prefix operators, `not` and call arguments.
pub const MAX_NESTING: usize = 100;

/// Tallest accepted expression tree, including left-deep operator chains.
pub const MAX_TREE_DEPTH: usize = 512;

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    /// Offset of the body within the original formula text.
    base: usize,
    nesting: usize,
}

/// A parsed subtree and its height.
struct Node {
    expr: Expr,
    depth: usize,
}

impl Node {
    fn leaf(expr: Expr) -> Node {
        Node { expr, depth: 1 }
    }
}

impl Parser {
    fn new(input: &str, base: usize) -> FormulaResult<Self> {
        let tokens = tokenize(input).map_err(|err| match err {
            FormulaError::Syntax { position, message } => FormulaError::Syntax {
                position: position + base,
                message,
            },
            other => other,
        })?;
        Ok(Parser {
            tokens,
            pos: 0,
            base,
            nesting: 0,
        })
    }

    fn parse(mut self) -> FormulaResult<Expr> {
        if *self.peek() == Token::Eof {
            return Err(self.error("Empty formula"));
        }
        let node = self.parse_logical()?;
        if *self.peek() != Token::Eof {
            return Err(self.error(format!("Unexpected {} after expression", self.peek())));
        }
        Ok(node.expr)
    }

    fn peek(&self) -> &Token {
        // tokenize always terminates the stream with Eof, and we never advance past it
        &self.tokens[self.pos].token
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].token.clone();
        if token != Token::Eof {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> FormulaResult<()> {
        if *self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("Expected {expected}, found {}", self.peek())))
        }
    }

    fn error(&self, message: impl Into<String>) -> FormulaError {
        FormulaError::syntax(self.tokens[self.pos].offset + self.base, message)
    }

    fn too_deep(&self) -> FormulaError {
        self.error("Formula nested too deeply")
    }

    /// Enter one level of recursive descent.
    fn descend(&mut self) -> FormulaResult<()> {
        if self.nesting >= MAX_NESTING {
            return Err(self.too_deep());
        }
        self.nesting += 1;
        Ok(())
    }

    fn ascend(&mut self) {
        self.nesting -= 1;
    }

    fn wrap(&self, expr: Expr, child_depth: usize) -> FormulaResult<Node> {
        let depth = child_depth + 1;
        if depth > MAX_TREE_DEPTH {
            return Err(self.too_deep());
        }
        Ok(Node { expr, depth })
    }

    fn binary(&self, op: BinaryOp, left: Node, right: Node) -> FormulaResult<Node> {
        let child_depth = left.depth.max(right.depth);
        let expr = Expr::Binary {
            op,
            left: Box::new(left.expr),
            right: Box::new(right.expr),
        };
        self.wrap(expr, child_depth)
    }

    fn unary(&self, op: UnaryOp, operand: Node) -> FormulaResult<Node> {
        let expr = Expr::Unary {
            op,
            operand: Box::new(operand.expr),
        };
        self.wrap(expr, operand.depth)
    }

    fn parse_logical(&mut self) -> FormulaResult<Node> {
        let mut left = self.parse_negation()?;
        loop {
            let op = match self.peek() {
                Token::And => BinaryOp::And,
                Token::Or => BinaryOp::Or,
                Token::Eqv => BinaryOp::Eqv,
                _ => break,
            };
            self.advance();
            let right = self.parse_negation()?;
            left = self.binary(op, left, right)?;
        }
        Ok(left)
    }

    fn parse_negation(&mut self) -> FormulaResult<Node> {
        if *self.peek() == Token::Not {
            self.descend()?;
            self.advance();
            let operand = self.parse_negation()?;
            self.ascend();
            return self.unary(UnaryOp::Not, operand);
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> FormulaResult<Node> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Token::Equal => BinaryOp::Eq,
                Token::NotEqual => BinaryOp::Neq,
                Token::Less => BinaryOp::Lt,
                Token::Greater => BinaryOp::Gt,
                Token::LessEqual => BinaryOp::Le,
                Token::GreaterEqual => BinaryOp::Ge,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = self.binary(op, left, right)?;
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> FormulaResult<Node> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = self.binary(op, left, right)?;
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<Node> {
        let mut left = self.parse_power()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinaryOp::Mul,
                Token::Slash | Token::Div => BinaryOp::Div,
                Token::Mod => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_power()?;
            left = self.binary(op, left, right)?;
        }
        Ok(left)
    }

    fn parse_power(&mut self) -> FormulaResult<Node> {
        let mut left = self.parse_prefix()?;
        while *self.peek() == Token::Caret {
            self.advance();
            let right = self.parse_prefix()?;
            left = self.binary(BinaryOp::Pow, left, right)?;
        }
        Ok(left)
    }

    fn parse_prefix(&mut self) -> FormulaResult<Node> {
        let op = match self.peek() {
            Token::Minus => UnaryOp::Negate,
            Token::Plus => UnaryOp::Identity,
            Token::Increment => UnaryOp::Increment,
            Token::Decrement => UnaryOp::Decrement,
            _ => return self.parse_postfix(),
        };
        self.descend()?;
        self.advance();
        let operand = self.parse_prefix()?;
        self.ascend();
        self.unary(op, operand)
    }

    fn parse_postfix(&mut self) -> FormulaResult<Node> {
        let mut node = self.parse_primary()?;
        loop {
            let op = match self.peek() {
                Token::Increment => UnaryOp::Increment,
                Token::Decrement => UnaryOp::Decrement,
                _ => break,
            };
            self.advance();
            node = self.unary(op, node)?;
        }
        Ok(node)
    }

    fn parse_primary(&mut self) -> FormulaResult<Node> {
        match self.peek().clone() {
            Token::Number(n) => {
                self.advance();
                Ok(Node::leaf(Expr::Number(n)))
            }
            Token::Text(s) => {
                self.advance();
                Ok(Node::leaf(Expr::Text(s)))
            }
            Token::CellRef(address) => {
                let cell = CellRef::parse(&address)
                    .map_err(|err| self.error(err.to_string()))?;
                self.advance();
                Ok(Node::leaf(Expr::CellRef(cell.to_string())))
            }
            Token::Ident(name) => self.parse_call(&name),
            Token::LParen => {
                self.descend()?;
                self.advance();
                let inner = self.parse_logical()?;
                self.ascend();
                self.expect(Token::RParen)?;
                self.wrap(Expr::Group(Box::new(inner.expr)), inner.depth)
            }
            Token::Eof => Err(self.error("Unexpected end of formula")),
            other => Err(self.error(format!("Unexpected {other}"))),
        }
    }

    fn parse_call(&mut self, name: &str) -> FormulaResult<Node> {
        let function_pos = self.pos;
        self.advance();
        if *self.peek() != Token::LParen {
            self.pos = function_pos;
            return Err(self.error(format!("Unknown identifier {name}")));
        }
        let Some(function) = Function::from_name(name) else {
            self.pos = function_pos;
            return Err(self.error(format!("Unknown function {name}")));
        };

        self.descend()?;
        self.advance();
        let first = self.parse_logical()?;
        let mut depth = first.depth;
        let mut args = vec![first.expr];
        while *self.peek() == Token::Comma {
            self.advance();
            let arg = self.parse_logical()?;
            depth = depth.max(arg.depth);
            args.push(arg.expr);
        }
        self.ascend();
        self.expect(Token::RParen)?;

        if !function.accepts(args.len()) {
            self.pos = function_pos;
            return Err(self.error(format!(
                "Wrong number of arguments for {}: got {}",
                function.name(),
                args.len()
            )));
        }

        self.wrap(Expr::Call { function, args }, depth)
    }
}
