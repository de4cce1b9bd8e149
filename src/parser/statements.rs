//! Declaration and statement parsing: var, print, blocks, expression statements.

use crate::ast::*;
use crate::error::ParseError;
use crate::lexer::TokenKind;

use super::core::{ParseResult, Parser, Unwind};

impl Parser {
    /// Parse one declaration. On error, resynchronize and yield nothing.
    pub(crate) fn declaration(&mut self) -> Option<Stmt> {
        let result = if self.check(&TokenKind::Var) {
            self.var_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),
            Err(Unwind) => {
                self.synchronize();
                None
            }
        }
    }

    fn var_declaration(&mut self) -> ParseResult<Stmt> {
        let start_span = self.current_span();
        self.advance();

        let name = match &self.peek().kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                name
            }
            _ => {
                let span = self.current_span();
                return Err(self.error(ParseError::ExpectedVariableName(span)));
            }
        };

        let initializer = if self.match_token(&TokenKind::Equal) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume_semicolon("variable declaration")?;
        let span = start_span.merge(&self.previous_span());
        Ok(Stmt::new(StmtKind::Var { name, initializer }, span))
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        if self.check(&TokenKind::Print) {
            self.print_statement()
        } else if self.check(&TokenKind::LeftBrace) {
            self.nested(Self::block_statement)
        } else {
            self.expression_statement()
        }
    }

    fn print_statement(&mut self) -> ParseResult<Stmt> {
        let start_span = self.current_span();
        self.advance();
        let expr = self.expression()?;
        self.consume_semicolon("value")?;
        let span = start_span.merge(&self.previous_span());
        Ok(Stmt::new(StmtKind::Print(expr), span))
    }

    fn block_statement(&mut self) -> ParseResult<Stmt> {
        let start_span = self.current_span();
        self.advance();

        let mut statements = Vec::new();
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        if !self.match_token(&TokenKind::RightBrace) {
            let span = self.current_span();
            return Err(self.error(ParseError::ExpectedClosingBrace(span)));
        }

        let span = start_span.merge(&self.previous_span());
        Ok(Stmt::new(StmtKind::Block(statements), span))
    }

    fn expression_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.expression()?;
        self.consume_semicolon("expression")?;
        let span = expr.span.merge(&self.previous_span());
        Ok(Stmt::new(StmtKind::Expression(expr), span))
    }

    fn consume_semicolon(&mut self, after: &str) -> ParseResult<()> {
        if self.match_token(&TokenKind::Semicolon) {
            Ok(())
        } else {
            let span = self.current_span();
            Err(self.error(ParseError::expected_semicolon(after, span)))
        }
    }
}
