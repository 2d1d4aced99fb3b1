//! Source AST for the caper contract language.
//!
//! Nodes are immutable once parsed. Identifiers and declarations carry byte
//! spans; everything diagnostic-facing goes through [`Span::line_col`].

/// Half-open byte range into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// 1-based line and column of the span start.
    pub fn line_col(&self, source: &str) -> (usize, usize) {
        let upto = &source[..self.start.min(source.len())];
        let line = upto.bytes().filter(|&b| b == b'\n').count() + 1;
        let col = upto
            .rfind('\n')
            .map(|i| upto[i + 1..].chars().count() + 1)
            .unwrap_or_else(|| upto.chars().count() + 1);
        (line, col)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub name: String,
    pub span: Span,
}

impl Identifier {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// One compilation unit: a single contract plus its behavior blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct TopLevelModule {
    pub contract: ContractDeclaration,
    pub behaviors: Vec<ContractBehaviorDeclaration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContractDeclaration {
    pub identifier: Identifier,
    pub variables: Vec<VariableDeclaration>,
    pub events: Vec<EventDeclaration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventDeclaration {
    pub identifier: Identifier,
    pub parameters: Vec<Parameter>,
}

/// A group of functions gated by a caller-capability list.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractBehaviorDeclaration {
    pub contract_identifier: Identifier,
    pub capabilities: Vec<CallerCapability>,
    pub members: Vec<BehaviorMember>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BehaviorMember {
    Function(FunctionDeclaration),
    /// The contract initializer, declared as `func init(...)`.
    Special(SpecialDeclaration),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerCapability {
    pub identifier: Identifier,
}

impl CallerCapability {
    pub const ANY: &'static str = "any";

    pub fn name(&self) -> &str {
        &self.identifier.name
    }

    /// `any` is the universal super-capability.
    pub fn is_any(&self) -> bool {
        self.identifier.name == Self::ANY
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub identifier: Identifier,
    pub raw_type: RawType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Public,
    Mutating,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    pub modifiers: Vec<Modifier>,
    pub identifier: Identifier,
    pub parameters: Vec<Parameter>,
    pub result_type: Option<RawType>,
    pub body: Vec<Statement>,
    pub span: Span,
}

impl FunctionDeclaration {
    pub fn is_public(&self) -> bool {
        self.modifiers.contains(&Modifier::Public)
    }
}

/// The initializer. Has no name and no result type of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecialDeclaration {
    pub modifiers: Vec<Modifier>,
    pub parameters: Vec<Parameter>,
    pub body: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Var,
    Let,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    pub declaration_kind: Option<DeclarationKind>,
    pub identifier: Identifier,
    /// Absent only for inferred `let x = ...` forms.
    pub raw_type: Option<RawType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasicType {
    Address,
    Int,
    Bool,
    String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawType {
    Basic(BasicType),
    UserDefined(Identifier),
    Inout(Box<RawType>),
    FixedArray(Box<RawType>, u64),
    Array(Box<RawType>),
    Dictionary(Box<RawType>, Box<RawType>),
}

impl std::fmt::Display for RawType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawType::Basic(BasicType::Address) => write!(f, "Address"),
            RawType::Basic(BasicType::Int) => write!(f, "Int"),
            RawType::Basic(BasicType::Bool) => write!(f, "Bool"),
            RawType::Basic(BasicType::String) => write!(f, "String"),
            RawType::UserDefined(id) => write!(f, "{}", id.name),
            RawType::Inout(inner) => write!(f, "inout {}", inner),
            RawType::FixedArray(inner, size) => write!(f, "{}[{}]", inner, size),
            RawType::Array(inner) => write!(f, "[{}]", inner),
            RawType::Dictionary(key, value) => write!(f, "[{}: {}]", key, value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Assign,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessOrEqual,
    GreaterOrEqual,
    Plus,
    Minus,
    Times,
    Divide,
    Dot,
}

impl BinaryOperator {
    /// Infix spelling in the target IR. `Assign` and `Dot` never render
    /// through here; they have dedicated lowerings.
    pub fn target_spelling(&self) -> &'static str {
        match self {
            BinaryOperator::Assign => "=",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::Less => "<",
            BinaryOperator::Greater => ">",
            BinaryOperator::LessOrEqual => "<=",
            BinaryOperator::GreaterOrEqual => ">=",
            BinaryOperator::Plus => "+",
            BinaryOperator::Minus => "-",
            BinaryOperator::Times => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Dot => ".",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpression {
    pub lhs: Box<Expression>,
    pub op: BinaryOperator,
    pub rhs: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub identifier: Identifier,
    pub arguments: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralKind {
    /// Widened to the target's 64-bit unsigned integer.
    Int(u64),
    /// Canonical form: `0x` followed by exactly 32 hex digits (16 bytes).
    Address(String),
    Bool(bool),
    String(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub kind: LiteralKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Identifier(Identifier),
    Binary(BinaryExpression),
    FunctionCall(FunctionCall),
    Literal(Literal),
    SelfExpression(Span),
    VariableDeclaration(VariableDeclaration),
    Bracketed(Box<Expression>),
}

impl Expression {
    pub fn span(&self) -> Span {
        match self {
            Expression::Identifier(id) => id.span,
            Expression::Binary(b) => b.lhs.span().to(b.rhs.span()),
            Expression::FunctionCall(call) => call.identifier.span,
            Expression::Literal(lit) => lit.span,
            Expression::SelfExpression(span) => *span,
            Expression::VariableDeclaration(decl) => decl.identifier.span,
            Expression::Bracketed(inner) => inner.span(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStatement {
    pub expression: Option<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    pub condition: Expression,
    pub body: Vec<Statement>,
    pub else_body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Expression(Expression),
    Return(ReturnStatement),
    If(IfStatement),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_line_col() {
        let src = "contract C {\n  var x: Int\n}";
        assert_eq!(Span::new(0, 8).line_col(src), (1, 1));
        assert_eq!(Span::new(15, 18).line_col(src), (2, 3));
    }

    #[test]
    fn span_merge() {
        let merged = Span::new(4, 9).to(Span::new(12, 20));
        assert_eq!(merged, Span::new(4, 20));
    }

    #[test]
    fn raw_type_display() {
        let dict = RawType::Dictionary(
            Box::new(RawType::Basic(BasicType::Address)),
            Box::new(RawType::Basic(BasicType::Int)),
        );
        assert_eq!(dict.to_string(), "[Address: Int]");

        let inout = RawType::Inout(Box::new(RawType::UserDefined(Identifier::new(
            "Token",
            Span::default(),
        ))));
        assert_eq!(inout.to_string(), "inout Token");
    }
}
