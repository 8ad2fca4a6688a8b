//! Plain-text sheet files.
//!
//! One cell per line as `A1: <input>`; blank lines and `#` comments are skipped.

pub mod parser;
pub mod writer;

pub use parser::{parse_sheet, parse_sheet_content};
pub use writer::{write_sheet, write_sheet_content, write_values, write_values_content};
