use crate::types::Type;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ownership transfer applied when a binding is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferKind {
    Move,
    Copy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Literal {
    U64(u64),
    /// 32 hex digits, no `0x` prefix.
    Address(String),
    Bool(bool),
    ByteArray(Vec<u8>),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::U64(value) => write!(f, "{}", value),
            Literal::Address(hex) => write!(f, "0x{}", hex),
            Literal::Bool(value) => write!(f, "{}", value),
            Literal::ByteArray(bytes) => {
                write!(f, "b\"")?;
                for byte in bytes {
                    write!(f, "{:02x}", byte)?;
                }
                write!(f, "\"")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Equal,
    NotEqual,
    Less,
    Greater,
    LessOrEqual,
    GreaterOrEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let spelling = match self {
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::Greater => ">",
            BinaryOp::LessOrEqual => "<=",
            BinaryOp::GreaterOrEqual => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
        };
        write!(f, "{}", spelling)
    }
}

/// An IR expression. Renders to a single line of target text via `Display`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    Identifier(String),
    Literal(Literal),
    VariableDeclaration {
        name: String,
        ty: Type,
        initializer: Option<Box<Expression>>,
    },
    Assignment {
        target: String,
        value: Box<Expression>,
    },
    StructConstructor {
        name: String,
        /// Field order is resource declaration order.
        fields: Vec<(String, Expression)>,
    },
    FunctionCall {
        name: String,
        arguments: Vec<Expression>,
    },
    Transfer {
        kind: TransferKind,
        value: Box<Expression>,
    },
    FieldAccess {
        base: Box<Expression>,
        field: String,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    /// Mutable borrow of an lvalue, for `inout` argument passing.
    AddressOf(Box<Expression>),
    /// Renders to nothing; statements carrying it are dropped at emission.
    Noop,
}

impl Expression {
    pub fn ident(name: impl Into<String>) -> Expression {
        Expression::Identifier(name.into())
    }

    pub fn moved(value: Expression) -> Expression {
        Expression::Transfer {
            kind: TransferKind::Move,
            value: Box::new(value),
        }
    }

    pub fn copied(value: Expression) -> Expression {
        Expression::Transfer {
            kind: TransferKind::Copy,
            value: Box::new(value),
        }
    }

    pub fn call(name: impl Into<String>, arguments: Vec<Expression>) -> Expression {
        Expression::FunctionCall {
            name: name.into(),
            arguments,
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, Expression::Noop)
    }

    /// The identifier this expression reads, looking through at most one
    /// transfer wrapper. Drives shadow-assignment suppression.
    pub fn read_identifier(&self) -> Option<&str> {
        match self {
            Expression::Identifier(name) => Some(name),
            Expression::Transfer { value, .. } => match value.as_ref() {
                Expression::Identifier(name) => Some(name),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Identifier(name) => write!(f, "{}", name),
            Expression::Literal(lit) => write!(f, "{}", lit),
            Expression::VariableDeclaration {
                name,
                ty,
                initializer,
            } => match initializer {
                Some(init) => write!(f, "let {}: {} = {}", name, ty, init),
                None => write!(f, "let {}: {}", name, ty),
            },
            Expression::Assignment { target, value } => write!(f, "{} = {}", target, value),
            Expression::StructConstructor { name, fields } => {
                if fields.is_empty() {
                    return write!(f, "struct {} {{}}", name);
                }
                write!(f, "struct {} {{ ", name)?;
                for (i, (field, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", field, value)?;
                }
                write!(f, " }}")
            }
            Expression::FunctionCall { name, arguments } => {
                write!(f, "{}(", name)?;
                for (i, arg) in arguments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expression::Transfer { kind, value } => match kind {
                TransferKind::Move => write!(f, "move({})", value),
                TransferKind::Copy => write!(f, "copy({})", value),
            },
            Expression::FieldAccess { base, field } => write!(f, "{}.{}", base, field),
            Expression::Binary { op, lhs, rhs } => {
                // Nested operands keep their grouping in the flat text.
                let side = |e: &Expression| match e {
                    Expression::Binary { .. } => format!("({})", e),
                    _ => e.to_string(),
                };
                write!(f, "{} {} {}", side(lhs), op, side(rhs))
            }
            Expression::AddressOf(inner) => write!(f, "&mut {}", inner),
            Expression::Noop => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_rendering() {
        assert_eq!(Literal::U64(42).to_string(), "42");
        assert_eq!(
            Literal::Address("0000000000000000000000000000cafe".into()).to_string(),
            "0x0000000000000000000000000000cafe"
        );
        assert_eq!(Literal::Bool(true).to_string(), "true");
        assert_eq!(
            Literal::ByteArray(b"hi".to_vec()).to_string(),
            "b\"6869\""
        );
    }

    #[test]
    fn transfer_rendering() {
        assert_eq!(Expression::moved(Expression::ident("y")).to_string(), "move(y)");
        assert_eq!(Expression::copied(Expression::ident("y")).to_string(), "copy(y)");
    }

    #[test]
    fn struct_constructor_rendering() {
        let ctor = Expression::StructConstructor {
            name: "T".into(),
            fields: vec![(
                "x".into(),
                Expression::moved(Expression::ident("self$x")),
            )],
        };
        assert_eq!(ctor.to_string(), "struct T { x: move(self$x) }");

        let empty = Expression::StructConstructor {
            name: "T".into(),
            fields: vec![],
        };
        assert_eq!(empty.to_string(), "struct T {}");
    }

    #[test]
    fn declaration_rendering() {
        let decl = Expression::VariableDeclaration {
            name: "self$x".into(),
            ty: Type::Address,
            initializer: None,
        };
        assert_eq!(decl.to_string(), "let self$x: address");

        let init = Expression::VariableDeclaration {
            name: "a".into(),
            ty: Type::U64,
            initializer: Some(Box::new(Expression::Literal(Literal::U64(1)))),
        };
        assert_eq!(init.to_string(), "let a: u64 = 1");
    }

    #[test]
    fn read_identifier_sees_through_one_transfer() {
        assert_eq!(
            Expression::moved(Expression::ident("a")).read_identifier(),
            Some("a")
        );
        assert_eq!(Expression::ident("a").read_identifier(), Some("a"));
        assert_eq!(
            Expression::moved(Expression::moved(Expression::ident("a"))).read_identifier(),
            None
        );
    }
}
