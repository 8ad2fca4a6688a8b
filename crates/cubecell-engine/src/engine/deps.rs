//! Dependency extraction from formula strings.
//!
//! Parses the formula and collects every cell reference node. References
//! inside string literals are never seen because the lexer has already
//! folded them into text tokens.

use std::collections::BTreeSet;

use super::ast::Expr;
use super::error::FormulaResult;
use super::parser::parse_formula;

/// Extract the distinct canonical addresses a formula reads.
pub fn extract_dependencies(formula: &str) -> FormulaResult<BTreeSet<String>> {
    let expr = parse_formula(formula)?;
    Ok(collect_references(&expr))
}

/// Collect the distinct canonical addresses referenced by an already parsed tree.
pub fn collect_references(expr: &Expr) -> BTreeSet<String> {
    let mut deps = BTreeSet::new();
    expr.walk(&mut |node| {
        if let Expr::CellRef(address) = node {
            deps.insert(address.clone());
        }
    });
    deps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::FormulaError;
    use pretty_assertions::assert_eq;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_extract_dependencies_empty() {
        assert!(extract_dependencies("=10 + 20").unwrap().is_empty());
    }

    #[test]
    fn test_extract_dependencies_multiple() {
        assert_eq!(
            extract_dependencies("=A1 + b1 * mmax(C2, 3)").unwrap(),
            set(&["A1", "B1", "C2"])
        );
    }

    #[test]
    fn test_extract_dependencies_duplicates_collapse() {
        assert_eq!(extract_dependencies("=A1 + a1 + A01").unwrap(), set(&["A1"]));
    }

    #[test]
    fn test_ignores_references_inside_strings() {
        assert_eq!(
            extract_dependencies("=\"B2\" = A1").unwrap(),
            set(&["A1"])
        );
    }

    #[test]
    fn test_syntax_error_propagates() {
        assert!(matches!(
            extract_dependencies("=A1 +"),
            Err(FormulaError::Syntax { .. })
        ));
    }
}
