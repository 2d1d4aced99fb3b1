use caper_parser::ast::Span;
use std::fmt;
use thiserror::Error;

/// A translation failure, keyed by source location.
///
/// Malformed-AST conditions (constructs that cannot arise from a successful
/// parse) are not represented here; those abort via `unreachable!`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    #[error("syntax error: {message}")]
    Parse { message: String, span: Span },

    #[error("type `{name}` has no target representation")]
    UnknownType { name: String, span: Span },

    #[error("unresolved reference `{name}`{}", detail_suffix(.detail))]
    UnresolvedReference {
        name: String,
        detail: Option<String>,
        span: Span,
    },

    #[error("`{name}` is not callable from the caller capability context [{context}]")]
    CapabilityViolation {
        name: String,
        context: String,
        span: Span,
    },

    #[error("initializer never assigns contract field(s): {}", .fields.join(", "))]
    IncompleteInitializer { fields: Vec<String>, span: Span },

    #[error("conflicting declarations of `{name}`")]
    ConflictingDeclaration { name: String, span: Span },

    #[error("expression is not assignable")]
    InvalidAssignment { span: Span },
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(d) => format!(" ({})", d),
        None => String::new(),
    }
}

impl TranslateError {
    pub fn span(&self) -> Span {
        match self {
            TranslateError::Parse { span, .. }
            | TranslateError::UnknownType { span, .. }
            | TranslateError::UnresolvedReference { span, .. }
            | TranslateError::CapabilityViolation { span, .. }
            | TranslateError::IncompleteInitializer { span, .. }
            | TranslateError::ConflictingDeclaration { span, .. }
            | TranslateError::InvalidAssignment { span } => *span,
        }
    }

    pub fn unresolved(name: impl Into<String>, span: Span) -> Self {
        TranslateError::UnresolvedReference {
            name: name.into(),
            detail: None,
            span,
        }
    }

    pub fn unresolved_with(name: impl Into<String>, detail: impl Into<String>, span: Span) -> Self {
        TranslateError::UnresolvedReference {
            name: name.into(),
            detail: Some(detail.into()),
            span,
        }
    }
}

/// Sink for translation failures. A compilation with a non-empty sink
/// produces no module text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    errors: Vec<TranslateError>,
}

impl Diagnostics {
    pub fn push(&mut self, error: TranslateError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TranslateError> {
        self.errors.iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "error: {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostics {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_collect_and_render() {
        let mut diagnostics = Diagnostics::default();
        assert!(diagnostics.is_empty());

        diagnostics.push(TranslateError::unresolved("balance", Span::new(3, 10)));
        diagnostics.push(TranslateError::IncompleteInitializer {
            fields: vec!["owner".into(), "balance".into()],
            span: Span::default(),
        });

        assert_eq!(diagnostics.len(), 2);
        let rendered = diagnostics.to_string();
        assert!(rendered.contains("unresolved reference `balance`"));
        assert!(rendered.contains("owner, balance"));
    }
}
