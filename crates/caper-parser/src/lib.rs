/*! Front end for the caper contract language.
 *
 * Source text goes in, a spanned AST comes out. The lexer and parser are
 * deliberately small: one contract per compilation unit, behavior blocks
 * gated by caller capabilities, and a fixed five-level operator precedence
 * table. Everything semantic happens downstream in `caper-transform`.
 */

pub mod ast;
pub mod lexer;
pub mod parser;

pub use ast::{Span, TopLevelModule};
pub use lexer::{LexError, Lexer, Token, TokenKind};
pub use parser::{ParseError, Parser};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl SyntaxError {
    pub fn span(&self) -> Span {
        match self {
            SyntaxError::Lex(e) => e.span,
            SyntaxError::Parse(e) => e.span,
        }
    }
}

/// Lex and parse a compilation unit.
pub fn parse(source: &str) -> Result<TopLevelModule, SyntaxError> {
    let tokens = Lexer::new(source).lex_all()?;
    let module = Parser::new(tokens).parse_module()?;
    Ok(module)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reports_lex_errors_with_span() {
        let err = parse("contract C { var x: Int } C :: [any] { func f() { x # } }").unwrap_err();
        assert!(matches!(err, SyntaxError::Lex(_)));
        let (line, col) = err.span().line_col("contract C { var x: Int } C :: [any] { func f() { x # } }");
        assert_eq!(line, 1);
        assert!(col > 1);
    }

    #[test]
    fn parse_round_trips_a_small_program() {
        let module = parse(
            "contract Bank { var owner: Address var balance: Int } \
             Bank :: [any] { public mutating func init(o: Address) { self.owner = o self.balance = 0 } }",
        )
        .unwrap();
        assert_eq!(module.contract.identifier.name, "Bank");
        assert_eq!(module.contract.variables.len(), 2);
    }
}
