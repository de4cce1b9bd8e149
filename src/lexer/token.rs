//! Token definitions for the relic lexer.

use std::fmt;

use crate::span::Span;
use crate::value::Value;

/// All token types.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Int(i64),
    Double(f64),
    String(String),

    // Identifiers and keywords
    Identifier(String),

    // Keywords
    If,
    Else,
    Is,
    True,
    False,
    Include,
    Var,
    Print,
    Nil,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    And,
    Or,

    // Delimiters
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Dot,
    Semicolon,

    // Special
    Eof,
}

impl TokenKind {
    /// Returns the keyword token kind for a given identifier, if it's a keyword.
    pub fn keyword(ident: &str) -> Option<TokenKind> {
        match ident {
            "if" => Some(TokenKind::If),
            "else" => Some(TokenKind::Else),
            "is" => Some(TokenKind::Is),
            "true" => Some(TokenKind::True),
            "false" => Some(TokenKind::False),
            "include" => Some(TokenKind::Include),
            "var" => Some(TokenKind::Var),
            "print" => Some(TokenKind::Print),
            "nil" => Some(TokenKind::Nil),
            _ => None,
        }
    }

    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::If
                | TokenKind::Else
                | TokenKind::Is
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Include
                | TokenKind::Var
                | TokenKind::Print
                | TokenKind::Nil
        )
    }

    /// Tokens that can begin a declaration; used as parser synchronization points.
    pub fn starts_statement(&self) -> bool {
        matches!(
            self,
            TokenKind::Var
                | TokenKind::Print
                | TokenKind::LeftBrace
                | TokenKind::If
                | TokenKind::Include
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Int(n) => write!(f, "{}", n),
            TokenKind::Double(n) => write!(f, "{}", n),
            TokenKind::String(s) => write!(f, "\"{}\"", s),
            TokenKind::Identifier(name) => write!(f, "{}", name),
            TokenKind::If => write!(f, "if"),
            TokenKind::Else => write!(f, "else"),
            TokenKind::Is => write!(f, "is"),
            TokenKind::True => write!(f, "true"),
            TokenKind::False => write!(f, "false"),
            TokenKind::Include => write!(f, "include"),
            TokenKind::Var => write!(f, "var"),
            TokenKind::Print => write!(f, "print"),
            TokenKind::Nil => write!(f, "nil"),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::Bang => write!(f, "!"),
            TokenKind::BangEqual => write!(f, "!="),
            TokenKind::Equal => write!(f, "="),
            TokenKind::EqualEqual => write!(f, "=="),
            TokenKind::Greater => write!(f, ">"),
            TokenKind::GreaterEqual => write!(f, ">="),
            TokenKind::Less => write!(f, "<"),
            TokenKind::LessEqual => write!(f, "<="),
            TokenKind::And => write!(f, "&&"),
            TokenKind::Or => write!(f, "||"),
            TokenKind::LeftParen => write!(f, "("),
            TokenKind::RightParen => write!(f, ")"),
            TokenKind::LeftBrace => write!(f, "{{"),
            TokenKind::RightBrace => write!(f, "}}"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Dot => write!(f, "."),
            TokenKind::Semicolon => write!(f, ";"),
            TokenKind::Eof => write!(f, "end of file"),
        }
    }
}

/// A token with its source text and location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            span,
        }
    }

    pub fn eof(pos: usize, line: usize, column: usize) -> Self {
        Self::new(TokenKind::Eof, "", Span::new(pos, pos, line, column))
    }

    pub fn line(&self) -> usize {
        self.span.line
    }

    /// The typed literal payload carried by number and string tokens.
    pub fn literal(&self) -> Option<Value> {
        match &self.kind {
            TokenKind::Int(n) => Some(Value::Int(*n)),
            TokenKind::Double(n) => Some(Value::Double(*n)),
            TokenKind::String(s) => Some(Value::String(s.clone())),
            _ => None,
        }
    }
}
