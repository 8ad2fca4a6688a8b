//! Tokenizer for formula text.
//!
//! Words are classified here: keywords (`and`, `or`, `not`, `eqv`, `div`,
//! `mod`) match case-insensitively, words shaped like `A1` become cell
//! references, anything else is a plain identifier (only valid as a
//! function name).

use num_bigint::BigInt;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

use super::error::{FormulaError, FormulaResult};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    Number(BigInt),
    Text(String),
    CellRef(String),
    Ident(String),

    And,
    Or,
    Not,
    Eqv,
    Div,
    Mod,

    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Increment,
    Decrement,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,

    LParen,
    RParen,
    Comma,
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{n}"),
            Token::Text(s) => write!(f, "\"{s}\""),
            Token::CellRef(s) | Token::Ident(s) => write!(f, "{s}"),
            Token::And => write!(f, "and"),
            Token::Or => write!(f, "or"),
            Token::Not => write!(f, "not"),
            Token::Eqv => write!(f, "eqv"),
            Token::Div => write!(f, "div"),
            Token::Mod => write!(f, "mod"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Caret => write!(f, "^"),
            Token::Increment => write!(f, "++"),
            Token::Decrement => write!(f, "--"),
            Token::Equal => write!(f, "="),
            Token::NotEqual => write!(f, "<>"),
            Token::Less => write!(f, "<"),
            Token::Greater => write!(f, ">"),
            Token::LessEqual => write!(f, "<="),
            Token::GreaterEqual => write!(f, ">="),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::Eof => write!(f, "end of formula"),
        }
    }
}

/// A token and the byte offset where it starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    pub offset: usize,
}

fn cell_ref_re() -> &'static Regex {
    static CELL_RE: OnceLock<Regex> = OnceLock::new();
    CELL_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z]+[0-9]+$").expect("cell reference regex must compile")
    })
}

/// Split formula text into tokens. The result always ends with [`Token::Eof`].
pub fn tokenize(input: &str) -> FormulaResult<Vec<Spanned>> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        let start = i;

        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        let token = match c {
            b'0'..=b'9' => {
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                let digits = &input[start..i];
                let n = digits
                    .parse::<BigInt>()
                    .map_err(|_| FormulaError::syntax(start, format!("Invalid number {digits}")))?;
                Token::Number(n)
            }
            b'"' => {
                let (text, end) = read_string(input, start)?;
                i = end;
                Token::Text(text)
            }
            b'A'..=b'Z' | b'a'..=b'z' | b'_' => {
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                classify_word(&input[start..i])
            }
            _ => {
                let (token, len) = read_operator(&bytes[i..]).ok_or_else(|| {
                    let ch = input[start..].chars().next().unwrap_or('?');
                    FormulaError::syntax(start, format!("Unexpected character {ch:?}"))
                })?;
                i += len;
                token
            }
        };

        tokens.push(Spanned {
            token,
            offset: start,
        });
    }

    tokens.push(Spanned {
        token: Token::Eof,
        offset: input.len(),
    });
    Ok(tokens)
}

fn classify_word(word: &str) -> Token {
    match word.to_ascii_lowercase().as_str() {
        "and" => Token::And,
        "or" => Token::Or,
        "not" => Token::Not,
        "eqv" => Token::Eqv,
        "div" => Token::Div,
        "mod" => Token::Mod,
        _ if cell_ref_re().is_match(word) => Token::CellRef(word.to_ascii_uppercase()),
        _ => Token::Ident(word.to_string()),
    }
}

fn read_operator(rest: &[u8]) -> Option<(Token, usize)> {
    let two = match rest {
        [b'+', b'+', ..] => Some(Token::Increment),
        [b'-', b'-', ..] => Some(Token::Decrement),
        [b'<', b'>', ..] => Some(Token::NotEqual),
        [b'<', b'=', ..] => Some(Token::LessEqual),
        [b'>', b'=', ..] => Some(Token::GreaterEqual),
        _ => None,
    };
    if let Some(token) = two {
        return Some((token, 2));
    }

    let one = match rest.first()? {
        b'+' => Token::Plus,
        b'-' => Token::Minus,
        b'*' => Token::Star,
        b'/' => Token::Slash,
        b'^' => Token::Caret,
        b'=' => Token::Equal,
        b'<' => Token::Less,
        b'>' => Token::Greater,
        b'(' => Token::LParen,
        b')' => Token::RParen,
        b',' => Token::Comma,
        _ => return None,
    };
    Some((one, 1))
}

/// Read a double-quoted literal starting at `start`. A doubled quote (`""`)
/// stands for one quote character. Returns the text and the offset past the
/// closing quote.
fn read_string(input: &str, start: usize) -> FormulaResult<(String, usize)> {
    let mut text = String::new();
    let mut chars = input[start + 1..].char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if ch != '"' {
            text.push(ch);
            continue;
        }
        if let Some((_, '"')) = chars.peek() {
            chars.next();
            text.push('"');
            continue;
        }
        return Ok((text, start + 1 + idx + 1));
    }

    Err(FormulaError::syntax(start, "Unterminated string literal"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(input: &str) -> Vec<Token> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|spanned| spanned.token)
            .collect()
    }

    #[test]
    fn test_tokenize_arithmetic() {
        assert_eq!(
            kinds("1 + a2*3"),
            vec![
                Token::Number(BigInt::from(1)),
                Token::Plus,
                Token::CellRef("A2".to_string()),
                Token::Star,
                Token::Number(BigInt::from(3)),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        assert_eq!(
            kinds("NOT x And y"),
            vec![
                Token::Not,
                Token::Ident("x".to_string()),
                Token::And,
                Token::Ident("y".to_string()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_two_character_operators() {
        assert_eq!(
            kinds("<> <= >= ++ -- < > ="),
            vec![
                Token::NotEqual,
                Token::LessEqual,
                Token::GreaterEqual,
                Token::Increment,
                Token::Decrement,
                Token::Less,
                Token::Greater,
                Token::Equal,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_string_literals() {
        assert_eq!(
            kinds(r#""say ""hi""""#),
            vec![Token::Text("say \"hi\"".to_string()), Token::Eof]
        );
        assert!(matches!(
            tokenize("\"open"),
            Err(FormulaError::Syntax { position: 0, .. })
        ));
    }

    #[test]
    fn test_big_number_literal() {
        let digits = "123456789012345678901234567890";
        assert_eq!(
            kinds(digits),
            vec![Token::Number(digits.parse().unwrap()), Token::Eof]
        );
    }

    #[test]
    fn test_unexpected_character_reports_offset() {
        assert!(matches!(
            tokenize("1 + $"),
            Err(FormulaError::Syntax { position: 4, .. })
        ));
    }

    #[test]
    fn test_offsets() {
        let tokens = tokenize("max(A1, 20)").unwrap();
        let offsets: Vec<usize> = tokens.iter().map(|t| t.offset).collect();
        assert_eq!(offsets, vec![0, 3, 4, 6, 8, 10, 11]);
    }
}
