//! Lexer for the caper contract language.
//!
//! ASCII-oriented: identifiers are ASCII letters/underscore plus digits after
//! the first character. Skips whitespace and `//` line comments. Integer
//! literals are scanned through `BigUint` and must fit the target's 64-bit
//! unsigned integer; `0x`-prefixed literals are address literals.

use crate::ast::Span;
use num_bigint::BigUint;
use num_traits::ToPrimitive;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexErrorKind {
    #[error("unexpected character `{0}`")]
    UnexpectedChar(char),
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("integer literal does not fit in 64 bits")]
    IntOverflow,
    #[error("address literal longer than 16 bytes")]
    AddressTooLong,
    #[error("empty address literal")]
    EmptyAddress,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Contract,
    Var,
    Let,
    Event,
    Public,
    Mutating,
    Func,
    Init,
    Return,
    If,
    Else,
    SelfToken,
    Inout,
    True,
    False,
}

impl Keyword {
    fn from_ident(text: &str) -> Option<Keyword> {
        Some(match text {
            "contract" => Keyword::Contract,
            "var" => Keyword::Var,
            "let" => Keyword::Let,
            "event" => Keyword::Event,
            "public" => Keyword::Public,
            "mutating" => Keyword::Mutating,
            "func" => Keyword::Func,
            "init" => Keyword::Init,
            "return" => Keyword::Return,
            "if" => Keyword::If,
            "else" => Keyword::Else,
            "self" => Keyword::SelfToken,
            "inout" => Keyword::Inout,
            "true" => Keyword::True,
            "false" => Keyword::False,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Ident(String),
    Int(u64),
    /// Hex digits only, already left-padded to 32 nibbles.
    Address(String),
    Str(String),
    Keyword(Keyword),

    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Colon,
    ColonColon,
    Comma,
    Dot,
    Arrow, // ->
    Eq,
    EqEq,
    NotEq,
    Lt,
    Gt,
    Le,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,

    Eof,
}

impl TokenKind {
    /// Human-readable spelling for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => format!("identifier `{}`", name),
            TokenKind::Int(n) => format!("integer `{}`", n),
            TokenKind::Address(_) => "address literal".to_string(),
            TokenKind::Str(_) => "string literal".to_string(),
            TokenKind::Keyword(kw) => format!("`{:?}`", kw).to_lowercase(),
            TokenKind::LBrace => "`{`".to_string(),
            TokenKind::RBrace => "`}`".to_string(),
            TokenKind::LParen => "`(`".to_string(),
            TokenKind::RParen => "`)`".to_string(),
            TokenKind::LBracket => "`[`".to_string(),
            TokenKind::RBracket => "`]`".to_string(),
            TokenKind::Colon => "`:`".to_string(),
            TokenKind::ColonColon => "`::`".to_string(),
            TokenKind::Comma => "`,`".to_string(),
            TokenKind::Dot => "`.`".to_string(),
            TokenKind::Arrow => "`->`".to_string(),
            TokenKind::Eq => "`=`".to_string(),
            TokenKind::EqEq => "`==`".to_string(),
            TokenKind::NotEq => "`!=`".to_string(),
            TokenKind::Lt => "`<`".to_string(),
            TokenKind::Gt => "`>`".to_string(),
            TokenKind::Le => "`<=`".to_string(),
            TokenKind::Ge => "`>=`".to_string(),
            TokenKind::Plus => "`+`".to_string(),
            TokenKind::Minus => "`-`".to_string(),
            TokenKind::Star => "`*`".to_string(),
            TokenKind::Slash => "`/`".to_string(),
            TokenKind::Eof => "end of input".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

pub struct Lexer<'a> {
    bytes: &'a [u8],
    i: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            bytes: src.as_bytes(),
            i: 0,
        }
    }

    pub fn lex_all(mut self) -> Result<Vec<Token>, LexError> {
        let mut out = Vec::new();
        loop {
            let t = self.next_token()?;
            let is_eof = matches!(t.kind, TokenKind::Eof);
            out.push(t);
            if is_eof {
                break;
            }
        }
        Ok(out)
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_ws_and_comments();

        let start = self.i;
        let Some(&b) = self.bytes.get(self.i) else {
            return Ok(self.tok(TokenKind::Eof, start));
        };

        match b {
            b'{' => self.single(TokenKind::LBrace),
            b'}' => self.single(TokenKind::RBrace),
            b'(' => self.single(TokenKind::LParen),
            b')' => self.single(TokenKind::RParen),
            b'[' => self.single(TokenKind::LBracket),
            b']' => self.single(TokenKind::RBracket),
            b',' => self.single(TokenKind::Comma),
            b'.' => self.single(TokenKind::Dot),
            b'+' => self.single(TokenKind::Plus),
            b'*' => self.single(TokenKind::Star),
            b'/' => self.single(TokenKind::Slash),
            b':' => {
                self.i += 1;
                if self.peek() == Some(b':') {
                    self.i += 1;
                    Ok(self.tok(TokenKind::ColonColon, start))
                } else {
                    Ok(self.tok(TokenKind::Colon, start))
                }
            }
            b'-' => {
                self.i += 1;
                if self.peek() == Some(b'>') {
                    self.i += 1;
                    Ok(self.tok(TokenKind::Arrow, start))
                } else {
                    Ok(self.tok(TokenKind::Minus, start))
                }
            }
            b'=' => {
                self.i += 1;
                if self.peek() == Some(b'=') {
                    self.i += 1;
                    Ok(self.tok(TokenKind::EqEq, start))
                } else {
                    Ok(self.tok(TokenKind::Eq, start))
                }
            }
            b'!' => {
                self.i += 1;
                if self.peek() == Some(b'=') {
                    self.i += 1;
                    Ok(self.tok(TokenKind::NotEq, start))
                } else {
                    Err(self.err(LexErrorKind::UnexpectedChar('!'), start))
                }
            }
            b'<' => {
                self.i += 1;
                if self.peek() == Some(b'=') {
                    self.i += 1;
                    Ok(self.tok(TokenKind::Le, start))
                } else {
                    Ok(self.tok(TokenKind::Lt, start))
                }
            }
            b'>' => {
                self.i += 1;
                if self.peek() == Some(b'=') {
                    self.i += 1;
                    Ok(self.tok(TokenKind::Ge, start))
                } else {
                    Ok(self.tok(TokenKind::Gt, start))
                }
            }
            b'"' => self.string_literal(start),
            b'0'..=b'9' => self.number(start),
            b'A'..=b'Z' | b'a'..=b'z' | b'_' => self.ident(start),
            other => Err(self.err(LexErrorKind::UnexpectedChar(other as char), start)),
        }
    }

    fn skip_ws_and_comments(&mut self) {
        loop {
            while matches!(self.peek(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
                self.i += 1;
            }
            if self.peek() == Some(b'/') && self.bytes.get(self.i + 1) == Some(&b'/') {
                while !matches!(self.peek(), None | Some(b'\n')) {
                    self.i += 1;
                }
                continue;
            }
            break;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.i).copied()
    }

    fn single(&mut self, kind: TokenKind) -> Result<Token, LexError> {
        let start = self.i;
        self.i += 1;
        Ok(self.tok(kind, start))
    }

    fn tok(&self, kind: TokenKind, start: usize) -> Token {
        Token {
            kind,
            span: Span::new(start, self.i),
        }
    }

    fn err(&self, kind: LexErrorKind, start: usize) -> LexError {
        LexError {
            kind,
            span: Span::new(start, self.i.max(start + 1)),
        }
    }

    fn ident(&mut self, start: usize) -> Result<Token, LexError> {
        while matches!(self.peek(), Some(b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_')) {
            self.i += 1;
        }
        let text = std::str::from_utf8(&self.bytes[start..self.i]).expect("ascii ident");
        let kind = match Keyword::from_ident(text) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Ident(text.to_string()),
        };
        Ok(self.tok(kind, start))
    }

    fn number(&mut self, start: usize) -> Result<Token, LexError> {
        if self.peek() == Some(b'0') && matches!(self.bytes.get(self.i + 1), Some(b'x' | b'X')) {
            self.i += 2;
            let hex_start = self.i;
            while matches!(self.peek(), Some(b'0'..=b'9' | b'a'..=b'f' | b'A'..=b'F')) {
                self.i += 1;
            }
            let digits = std::str::from_utf8(&self.bytes[hex_start..self.i]).expect("ascii hex");
            if digits.is_empty() {
                return Err(self.err(LexErrorKind::EmptyAddress, start));
            }
            if digits.len() > 32 {
                return Err(self.err(LexErrorKind::AddressTooLong, start));
            }
            let padded = format!("{:0>32}", digits.to_lowercase());
            return Ok(self.tok(TokenKind::Address(padded), start));
        }

        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.i += 1;
        }
        let digits = std::str::from_utf8(&self.bytes[start..self.i]).expect("ascii digits");
        let value: BigUint = digits.parse().expect("decimal digits");
        match value.to_u64() {
            Some(v) => Ok(self.tok(TokenKind::Int(v), start)),
            None => Err(self.err(LexErrorKind::IntOverflow, start)),
        }
    }

    fn string_literal(&mut self, start: usize) -> Result<Token, LexError> {
        self.i += 1;
        let content_start = self.i;
        while let Some(b) = self.peek() {
            if b == b'"' {
                let text = std::str::from_utf8(&self.bytes[content_start..self.i])
                    .map_err(|_| self.err(LexErrorKind::UnterminatedString, start))?
                    .to_string();
                self.i += 1;
                return Ok(self.tok(TokenKind::Str(text), start));
            }
            self.i += 1;
        }
        Err(self.err(LexErrorKind::UnterminatedString, start))
    }
}
