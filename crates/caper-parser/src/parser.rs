//! Recursive-descent parser.
//!
//! Top-level declarations are parsed by dedicated `parse_*` methods;
//! expressions go through a binding-power ladder with assignment at the
//! bottom and member access at the top, matching the language's fixed
//! precedence table.

use crate::ast::*;
use crate::lexer::{Keyword, Token, TokenKind};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unexpected {found}; expected {}", .expected.join(" or "))]
pub struct ParseError {
    pub expected: Vec<String>,
    pub found: String,
    pub span: Span,
}

impl ParseError {
    fn new(expected: Vec<String>, found: &Token) -> Self {
        Self {
            expected,
            found: found.kind.describe(),
            span: found.span,
        }
    }
}

type Result<T> = std::result::Result<T, ParseError>;

pub struct Parser {
    tokens: Vec<Token>,
    i: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, i: 0 }
    }

    pub fn parse_module(&mut self) -> Result<TopLevelModule> {
        let contract = self.parse_contract()?;
        let mut behaviors = Vec::new();
        while !self.peek_is(&TokenKind::Eof) {
            behaviors.push(self.parse_behavior()?);
        }
        Ok(TopLevelModule {
            contract,
            behaviors,
        })
    }

    fn parse_contract(&mut self) -> Result<ContractDeclaration> {
        self.expect_keyword(Keyword::Contract)?;
        let identifier = self.expect_ident()?;
        self.expect(TokenKind::LBrace)?;

        let mut variables = Vec::new();
        let mut events = Vec::new();
        loop {
            match &self.peek().kind {
                TokenKind::Keyword(Keyword::Var) => {
                    variables.push(self.parse_field(DeclarationKind::Var)?)
                }
                TokenKind::Keyword(Keyword::Let) => {
                    variables.push(self.parse_field(DeclarationKind::Let)?)
                }
                TokenKind::Keyword(Keyword::Event) => events.push(self.parse_event()?),
                TokenKind::RBrace => break,
                _ => {
                    return Err(ParseError::new(
                        vec![
                            "`var`".into(),
                            "`event`".into(),
                            "`}`".into(),
                        ],
                        self.peek(),
                    ))
                }
            }
        }
        self.expect(TokenKind::RBrace)?;

        Ok(ContractDeclaration {
            identifier,
            variables,
            events,
        })
    }

    fn parse_field(&mut self, kind: DeclarationKind) -> Result<VariableDeclaration> {
        self.bump();
        let identifier = self.expect_ident()?;
        self.expect(TokenKind::Colon)?;
        let raw_type = self.parse_type()?;
        Ok(VariableDeclaration {
            declaration_kind: Some(kind),
            identifier,
            raw_type: Some(raw_type),
        })
    }

    fn parse_event(&mut self) -> Result<EventDeclaration> {
        self.expect_keyword(Keyword::Event)?;
        let identifier = self.expect_ident()?;
        self.expect(TokenKind::LParen)?;
        let parameters = self.parse_parameters()?;
        self.expect(TokenKind::RParen)?;
        Ok(EventDeclaration {
            identifier,
            parameters,
        })
    }

    fn parse_behavior(&mut self) -> Result<ContractBehaviorDeclaration> {
        let contract_identifier = self.expect_ident()?;
        self.expect(TokenKind::ColonColon)?;
        self.expect(TokenKind::LBracket)?;

        let mut capabilities = Vec::new();
        loop {
            let identifier = self.expect_ident()?;
            capabilities.push(CallerCapability { identifier });
            if self.eat(&TokenKind::Comma) {
                continue;
            }
            break;
        }
        self.expect(TokenKind::RBracket)?;
        self.expect(TokenKind::LBrace)?;

        let mut members = Vec::new();
        while !self.peek_is(&TokenKind::RBrace) {
            members.push(self.parse_behavior_member()?);
        }
        self.expect(TokenKind::RBrace)?;

        Ok(ContractBehaviorDeclaration {
            contract_identifier,
            capabilities,
            members,
        })
    }

    fn parse_behavior_member(&mut self) -> Result<BehaviorMember> {
        let start = self.peek().span;
        let mut modifiers = Vec::new();
        loop {
            match &self.peek().kind {
                TokenKind::Keyword(Keyword::Public) => {
                    self.bump();
                    modifiers.push(Modifier::Public);
                }
                TokenKind::Keyword(Keyword::Mutating) => {
                    self.bump();
                    modifiers.push(Modifier::Mutating);
                }
                _ => break,
            }
        }
        self.expect_keyword(Keyword::Func)?;

        if self.peek_is(&TokenKind::Keyword(Keyword::Init)) {
            self.bump();
            self.expect(TokenKind::LParen)?;
            let parameters = self.parse_parameters()?;
            self.expect(TokenKind::RParen)?;
            let (body, end) = self.parse_block()?;
            return Ok(BehaviorMember::Special(SpecialDeclaration {
                modifiers,
                parameters,
                body,
                span: start.to(end),
            }));
        }

        let identifier = self.expect_ident()?;
        self.expect(TokenKind::LParen)?;
        let parameters = self.parse_parameters()?;
        self.expect(TokenKind::RParen)?;
        let result_type = if self.eat(&TokenKind::Arrow) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let (body, end) = self.parse_block()?;

        Ok(BehaviorMember::Function(FunctionDeclaration {
            modifiers,
            identifier,
            parameters,
            result_type,
            body,
            span: start.to(end),
        }))
    }

    fn parse_parameters(&mut self) -> Result<Vec<Parameter>> {
        let mut parameters = Vec::new();
        if self.peek_is(&TokenKind::RParen) {
            return Ok(parameters);
        }
        loop {
            let identifier = self.expect_ident()?;
            self.expect(TokenKind::Colon)?;
            let raw_type = self.parse_type()?;
            parameters.push(Parameter {
                identifier,
                raw_type,
            });
            if self.eat(&TokenKind::Comma) {
                continue;
            }
            break;
        }
        Ok(parameters)
    }

    fn parse_type(&mut self) -> Result<RawType> {
        if self.peek_is(&TokenKind::Keyword(Keyword::Inout)) {
            self.bump();
            let inner = self.parse_type()?;
            return Ok(RawType::Inout(Box::new(inner)));
        }

        if self.eat(&TokenKind::LBracket) {
            let first = self.parse_type()?;
            let ty = if self.eat(&TokenKind::Colon) {
                let value = self.parse_type()?;
                RawType::Dictionary(Box::new(first), Box::new(value))
            } else {
                RawType::Array(Box::new(first))
            };
            self.expect(TokenKind::RBracket)?;
            return Ok(ty);
        }

        let identifier = self.expect_ident()?;
        let mut ty = match identifier.name.as_str() {
            "Address" => RawType::Basic(BasicType::Address),
            "Int" => RawType::Basic(BasicType::Int),
            "Bool" => RawType::Basic(BasicType::Bool),
            "String" => RawType::Basic(BasicType::String),
            _ => RawType::UserDefined(identifier),
        };

        while self.eat(&TokenKind::LBracket) {
            let size = match &self.peek().kind {
                TokenKind::Int(n) => {
                    let n = *n;
                    self.bump();
                    n
                }
                _ => {
                    return Err(ParseError::new(
                        vec!["array size".into()],
                        self.peek(),
                    ))
                }
            };
            self.expect(TokenKind::RBracket)?;
            ty = RawType::FixedArray(Box::new(ty), size);
        }
        Ok(ty)
    }

    fn parse_block(&mut self) -> Result<(Vec<Statement>, Span)> {
        self.expect(TokenKind::LBrace)?;
        let mut statements = Vec::new();
        while !self.peek_is(&TokenKind::RBrace) {
            statements.push(self.parse_statement()?);
        }
        let end = self.expect(TokenKind::RBrace)?.span;
        Ok((statements, end))
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        match &self.peek().kind {
            TokenKind::Keyword(Keyword::Return) => {
                let span = self.bump().span;
                let expression = if self.peek_is(&TokenKind::RBrace) {
                    None
                } else {
                    Some(self.parse_expression(0)?)
                };
                Ok(Statement::Return(ReturnStatement { expression, span }))
            }
            TokenKind::Keyword(Keyword::If) => {
                self.bump();
                let condition = self.parse_expression(0)?;
                let (body, _) = self.parse_block()?;
                let else_body = if self.peek_is(&TokenKind::Keyword(Keyword::Else)) {
                    self.bump();
                    self.parse_block()?.0
                } else {
                    Vec::new()
                };
                Ok(Statement::If(IfStatement {
                    condition,
                    body,
                    else_body,
                }))
            }
            _ => Ok(Statement::Expression(self.parse_expression(0)?)),
        }
    }

    fn parse_expression(&mut self, min_bp: u8) -> Result<Expression> {
        let mut lhs = self.parse_primary()?;
        while let Some((op, lbp, rbp)) = binary_operator(&self.peek().kind) {
            if lbp < min_bp {
                break;
            }
            self.bump();
            let rhs = self.parse_expression(rbp)?;
            lhs = Expression::Binary(BinaryExpression {
                lhs: Box::new(lhs),
                op,
                rhs: Box::new(rhs),
            });
        }
        Ok(lhs)
    }

    fn parse_primary(&mut self) -> Result<Expression> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Ident(_) => {
                let identifier = self.expect_ident()?;
                if self.eat(&TokenKind::LParen) {
                    let mut arguments = Vec::new();
                    if !self.peek_is(&TokenKind::RParen) {
                        loop {
                            arguments.push(self.parse_expression(0)?);
                            if self.eat(&TokenKind::Comma) {
                                continue;
                            }
                            break;
                        }
                    }
                    self.expect(TokenKind::RParen)?;
                    return Ok(Expression::FunctionCall(FunctionCall {
                        identifier,
                        arguments,
                    }));
                }
                Ok(Expression::Identifier(identifier))
            }
            TokenKind::Keyword(Keyword::SelfToken) => {
                self.bump();
                Ok(Expression::SelfExpression(token.span))
            }
            TokenKind::Keyword(kw @ (Keyword::Var | Keyword::Let)) => {
                self.bump();
                let identifier = self.expect_ident()?;
                let raw_type = if self.eat(&TokenKind::Colon) {
                    Some(self.parse_type()?)
                } else {
                    None
                };
                let kind = if kw == Keyword::Var {
                    DeclarationKind::Var
                } else {
                    DeclarationKind::Let
                };
                Ok(Expression::VariableDeclaration(VariableDeclaration {
                    declaration_kind: Some(kind),
                    identifier,
                    raw_type,
                }))
            }
            TokenKind::Int(n) => {
                self.bump();
                Ok(Expression::Literal(Literal {
                    kind: LiteralKind::Int(n),
                    span: token.span,
                }))
            }
            TokenKind::Address(hex) => {
                self.bump();
                Ok(Expression::Literal(Literal {
                    kind: LiteralKind::Address(hex),
                    span: token.span,
                }))
            }
            TokenKind::Str(text) => {
                self.bump();
                Ok(Expression::Literal(Literal {
                    kind: LiteralKind::String(text),
                    span: token.span,
                }))
            }
            TokenKind::Keyword(Keyword::True) => {
                self.bump();
                Ok(Expression::Literal(Literal {
                    kind: LiteralKind::Bool(true),
                    span: token.span,
                }))
            }
            TokenKind::Keyword(Keyword::False) => {
                self.bump();
                Ok(Expression::Literal(Literal {
                    kind: LiteralKind::Bool(false),
                    span: token.span,
                }))
            }
            TokenKind::LParen => {
                self.bump();
                let inner = self.parse_expression(0)?;
                self.expect(TokenKind::RParen)?;
                Ok(Expression::Bracketed(Box::new(inner)))
            }
            _ => Err(ParseError::new(vec!["expression".into()], self.peek())),
        }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.i.min(self.tokens.len() - 1)]
    }

    fn peek_is(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn bump(&mut self) -> Token {
        let token = self.peek().clone();
        if self.i < self.tokens.len() - 1 {
            self.i += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek_is(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.peek_is(&kind) {
            Ok(self.bump())
        } else {
            Err(ParseError::new(vec![kind.describe()], self.peek()))
        }
    }

    fn expect_keyword(&mut self, kw: Keyword) -> Result<Token> {
        self.expect(TokenKind::Keyword(kw))
    }

    fn expect_ident(&mut self) -> Result<Identifier> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Ident(name) => {
                self.bump();
                Ok(Identifier::new(name, token.span))
            }
            _ => Err(ParseError::new(vec!["identifier".into()], &token)),
        }
    }
}

/// `(operator, left bp, right bp)`. Assignment binds lowest and associates
/// right; everything else associates left; member access binds tightest.
fn binary_operator(kind: &TokenKind) -> Option<(BinaryOperator, u8, u8)> {
    Some(match kind {
        TokenKind::Eq => (BinaryOperator::Assign, 2, 1),
        TokenKind::EqEq => (BinaryOperator::Equal, 3, 4),
        TokenKind::NotEq => (BinaryOperator::NotEqual, 3, 4),
        TokenKind::Lt => (BinaryOperator::Less, 3, 4),
        TokenKind::Gt => (BinaryOperator::Greater, 3, 4),
        TokenKind::Le => (BinaryOperator::LessOrEqual, 3, 4),
        TokenKind::Ge => (BinaryOperator::GreaterOrEqual, 3, 4),
        TokenKind::Plus => (BinaryOperator::Plus, 5, 6),
        TokenKind::Minus => (BinaryOperator::Minus, 5, 6),
        TokenKind::Star => (BinaryOperator::Times, 7, 8),
        TokenKind::Slash => (BinaryOperator::Divide, 7, 8),
        TokenKind::Dot => (BinaryOperator::Dot, 11, 12),
        _ => return None,
    })
}
