use serde::{Deserialize, Serialize};
use std::fmt;

/// A type as it appears in emitted IR text.
///
/// Nominal types are stored pre-qualified (`Self.T`, `Token.T`, `Self.Point`);
/// the canonical typer decides the qualification, this model only renders it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    U64,
    Address,
    Bool,
    ByteArray,
    Named(String),
    Reference(Box<Type>),
    MutReference(Box<Type>),
}

impl Type {
    pub fn mut_reference(inner: Type) -> Type {
        Type::MutReference(Box::new(inner))
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Type::Reference(_) | Type::MutReference(_))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::U64 => write!(f, "u64"),
            Type::Address => write!(f, "address"),
            Type::Bool => write!(f, "bool"),
            Type::ByteArray => write!(f, "bytearray"),
            Type::Named(name) => write!(f, "{}", name),
            Type::Reference(inner) => write!(f, "&{}", inner),
            Type::MutReference(inner) => write!(f, "&mut {}", inner),
        }
    }
}
