//! Core parser struct, cursor helpers and panic-mode recovery.

use crate::ast::*;
use crate::error::ParseError;
use crate::lexer::{Token, TokenKind};
use crate::span::Span;

/// Marker returned once an error has been recorded. It only unwinds the
/// parse to the nearest declaration boundary; the error itself lives in
/// `Parser::errors`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unwind;

pub type ParseResult<T> = Result<T, Unwind>;

/// How many expressions and blocks may enclose one another.
pub const MAX_NESTING: usize = 256;

/// Everything a statement-level parse produced: the statements that parsed
/// and every error collected along the way.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParseOutput {
    pub program: Program,
    pub errors: Vec<ParseError>,
}

impl ParseOutput {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<Program, Vec<ParseError>> {
        if self.errors.is_empty() {
            Ok(self.program)
        } else {
            Err(self.errors)
        }
    }
}

/// The parser for relic.
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) current: usize,
    pub(crate) errors: Vec<ParseError>,
    pub(crate) panic_mode: bool,
    pub(crate) depth: usize,
    /// Set once nesting overflowed; the rest of the input is abandoned.
    pub(crate) halted: bool,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| &t.kind) != Some(&TokenKind::Eof) {
            let (pos, line) = tokens
                .last()
                .map(|t| (t.span.end, t.span.line))
                .unwrap_or((0, 1));
            tokens.push(Token::eof(pos, line, 1));
        }

        Self {
            tokens,
            current: 0,
            errors: Vec::new(),
            panic_mode: false,
            depth: 0,
            halted: false,
        }
    }

    /// Parse a complete program, recovering after each bad statement.
    pub fn parse(mut self) -> ParseOutput {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        ParseOutput {
            program: Program::new(statements),
            errors: self.errors,
        }
    }

    /// Parse the whole token stream as a single expression.
    pub fn parse_expression(mut self) -> Result<Expr, ParseError> {
        match self.expression() {
            Ok(expr) if self.is_at_end() => Ok(expr),
            Ok(_) => Err(ParseError::unexpected_token(
                self.peek().lexeme.clone(),
                self.current_span(),
            )),
            Err(Unwind) => {
                let span = self.current_span();
                Err(self
                    .errors
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| ParseError::expected_expression("end of file", span)))
            }
        }
    }

    // ===== Error recovery =====

    /// Record an error unless we are already recovering from one.
    pub(crate) fn error(&mut self, err: ParseError) -> Unwind {
        if !self.panic_mode && !self.halted {
            self.panic_mode = true;
            self.errors.push(err);
        }
        Unwind
    }

    /// Run one level of recursive descent under the nesting limit.
    pub(crate) fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<T> {
        if self.depth >= MAX_NESTING {
            return Err(self.too_deep());
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Record the nesting error and skip to end of input, so that the
    /// enclosing levels unwind without reporting anything further.
    pub(crate) fn too_deep(&mut self) -> Unwind {
        let span = self.current_span();
        let unwind = self.error(ParseError::TooDeep(span));
        self.halted = true;
        self.current = self.tokens.len() - 1;
        unwind
    }

    /// Discard tokens until just past a `;` or just before a token that starts
    /// a new declaration.
    pub(crate) fn synchronize(&mut self) {
        self.panic_mode = false;

        while !self.is_at_end() {
            if self.current > 0 && self.previous().kind == TokenKind::Semicolon {
                return;
            }
            if self.peek().kind.starts_statement() {
                return;
            }
            self.advance();
        }
    }

    // ===== Token manipulation =====

    pub(crate) fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.tokens[self.current.saturating_sub(1)].clone()
    }

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        if self.is_at_end() {
            false
        } else {
            std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
        }
    }

    pub(crate) fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn current_span(&self) -> Span {
        self.peek().span
    }

    pub(crate) fn previous_span(&self) -> Span {
        self.previous().span
    }
}
