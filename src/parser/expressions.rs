//! Expression parsing using precedence climbing.
//!
//! Operator nodes carry the operator token's line and column in their span,
//! so runtime diagnostics point at the operator rather than the left operand.

use crate::ast::*;
use crate::error::ParseError;
use crate::lexer::{Token, TokenKind};
use crate::span::Span;
use crate::value::Value;

use super::core::{ParseResult, Parser, MAX_NESTING};
use super::precedence::{get_precedence, Precedence};

impl Parser {
    pub(crate) fn expression(&mut self) -> ParseResult<Expr> {
        self.parse_precedence(Precedence::Assignment)
    }

    /// Parse a prefix expression, then fold every infix operator whose
    /// precedence is at least `min_precedence` onto the left operand.
    pub(crate) fn parse_precedence(&mut self, min_precedence: Precedence) -> ParseResult<Expr> {
        self.nested(|parser| parser.fold_infix(min_precedence))
    }

    /// Each fold deepens the left spine of the tree, so it counts as a level.
    fn fold_infix(&mut self, min_precedence: Precedence) -> ParseResult<Expr> {
        let mut left = self.parse_prefix()?;
        let mut folds = 0;

        let result = loop {
            if self.is_at_end() {
                break Ok(left);
            }
            let precedence = get_precedence(&self.peek().kind);
            if precedence == Precedence::None || precedence < min_precedence {
                break Ok(left);
            }
            if self.depth >= MAX_NESTING {
                break Err(self.too_deep());
            }

            self.depth += 1;
            folds += 1;
            match self.parse_infix(left, precedence) {
                Ok(expr) => left = expr,
                Err(unwind) => break Err(unwind),
            }
        };

        self.depth -= folds;
        result
    }

    fn parse_prefix(&mut self) -> ParseResult<Expr> {
        if self.is_at_end() {
            let span = self.current_span();
            return Err(self.error(ParseError::expected_expression("end of file", span)));
        }

        let token = self.advance();
        let start_span = token.span;

        match &token.kind {
            TokenKind::Int(_) | TokenKind::Double(_) | TokenKind::String(_) => {
                let value = token.literal().unwrap_or(Value::Nil);
                Ok(Expr::new(ExprKind::Literal(value), start_span))
            }
            TokenKind::True => Ok(Expr::new(ExprKind::Literal(Value::Bool(true)), start_span)),
            TokenKind::False => Ok(Expr::new(ExprKind::Literal(Value::Bool(false)), start_span)),
            TokenKind::Nil => Ok(Expr::new(ExprKind::Literal(Value::Nil), start_span)),

            TokenKind::Identifier(name) => {
                Ok(Expr::new(ExprKind::Variable(name.clone()), start_span))
            }

            TokenKind::LeftParen => {
                let expr = self.expression()?;
                if !self.match_token(&TokenKind::RightParen) {
                    let span = self.current_span();
                    return Err(self.error(ParseError::ExpectedClosingParen(span)));
                }
                let span = start_span.merge(&self.previous_span());
                Ok(Expr::new(ExprKind::Grouping(Box::new(expr)), span))
            }

            TokenKind::Minus => self.parse_unary(UnaryOp::Negate, start_span),
            TokenKind::Bang => self.parse_unary(UnaryOp::Not, start_span),

            _ => Err(self.error(ParseError::expected_expression(
                token.lexeme.clone(),
                token.span,
            ))),
        }
    }

    fn parse_unary(&mut self, operator: UnaryOp, start_span: Span) -> ParseResult<Expr> {
        let operand = self.parse_precedence(Precedence::Unary)?;
        let span = start_span.merge(&operand.span);
        Ok(Expr::new(
            ExprKind::Unary {
                operator,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    fn parse_infix(&mut self, left: Expr, precedence: Precedence) -> ParseResult<Expr> {
        let operator = self.advance();

        match &operator.kind {
            TokenKind::Equal => self.parse_assignment(left, &operator),

            TokenKind::And | TokenKind::Or => {
                let right = self.parse_precedence(precedence.next())?;
                let span = operator_span(&left, &operator, &right);
                let op = if operator.kind == TokenKind::And {
                    LogicalOp::And
                } else {
                    LogicalOp::Or
                };
                Ok(Expr::new(
                    ExprKind::Logical {
                        left: Box::new(left),
                        operator: op,
                        right: Box::new(right),
                    },
                    span,
                ))
            }

            kind => {
                let op = match kind {
                    TokenKind::Plus => BinaryOp::Add,
                    TokenKind::Minus => BinaryOp::Subtract,
                    TokenKind::Star => BinaryOp::Multiply,
                    TokenKind::Slash => BinaryOp::Divide,
                    TokenKind::EqualEqual => BinaryOp::Equal,
                    TokenKind::BangEqual => BinaryOp::NotEqual,
                    TokenKind::Less => BinaryOp::Less,
                    TokenKind::LessEqual => BinaryOp::LessEqual,
                    TokenKind::Greater => BinaryOp::Greater,
                    TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
                    _ => {
                        return Err(self.error(ParseError::expected_expression(
                            operator.lexeme.clone(),
                            operator.span,
                        )))
                    }
                };

                // Left-associative: the right operand binds one level tighter.
                let right = self.parse_precedence(precedence.next())?;
                let span = operator_span(&left, &operator, &right);
                Ok(Expr::new(
                    ExprKind::Binary {
                        left: Box::new(left),
                        operator: op,
                        right: Box::new(right),
                    },
                    span,
                ))
            }
        }
    }

    /// Assignment is right-associative and only accepts a bare variable as target.
    fn parse_assignment(&mut self, target: Expr, equals: &Token) -> ParseResult<Expr> {
        let value = self.parse_precedence(Precedence::Assignment)?;

        match target.kind {
            ExprKind::Variable(name) => {
                let span = operator_span_from(target.span, equals, &value);
                Ok(Expr::new(
                    ExprKind::Assign {
                        name,
                        value: Box::new(value),
                    },
                    span,
                ))
            }
            _ => Err(self.error(ParseError::InvalidAssignment(equals.span))),
        }
    }
}

fn operator_span(left: &Expr, operator: &Token, right: &Expr) -> Span {
    operator_span_from(left.span, operator, right)
}

fn operator_span_from(left: Span, operator: &Token, right: &Expr) -> Span {
    Span::new(
        left.start,
        right.span.end,
        operator.span.line,
        operator.span.column,
    )
}
