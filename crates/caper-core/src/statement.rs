use crate::expression::Expression;
use serde::{Deserialize, Serialize};

/// A statement in a procedure body. Block structure (indentation, braces) is
/// rendered by the emitter; expressions render themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    Expression(Expression),
    Return(Option<Expression>),
    If {
        condition: Expression,
        body: Vec<Statement>,
        else_body: Vec<Statement>,
    },
}

impl Statement {
    /// True when emitting this statement would produce no text.
    pub fn is_empty(&self) -> bool {
        matches!(self, Statement::Expression(e) if e.is_noop())
    }

    pub fn is_return(&self) -> bool {
        matches!(self, Statement::Return(_))
    }
}
