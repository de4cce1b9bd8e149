//! Binary and unary operator evaluation.

use std::io::Write;

use crate::ast::*;
use crate::error::InterpreterError;
use crate::interpreter::Interpreter;
use crate::ops::{self, OpFault};
use crate::span::Span;
use crate::value::Value;

use super::InterpreterResult;

impl<W: Write> Interpreter<W> {
    pub(crate) fn evaluate_binary(
        &mut self,
        left: &Expr,
        op: BinaryOp,
        right: &Expr,
        span: Span,
    ) -> InterpreterResult<Value> {
        let left_val = self.evaluate(left)?;
        let right_val = self.evaluate(right)?;

        ops::binary(op, &left_val, &right_val).map_err(|fault| match fault {
            OpFault::DivisionByZero => InterpreterError::division_by_zero(span),
            OpFault::Overflow => InterpreterError::IntegerOverflow(span),
            OpFault::Unsupported | OpFault::NotNumber | OpFault::NotBool => {
                InterpreterError::unsupported_operands(
                    op.to_string(),
                    left_val.type_name(),
                    right_val.type_name(),
                    span,
                )
            }
        })
    }

    pub(crate) fn evaluate_unary(
        &mut self,
        op: UnaryOp,
        operand: &Expr,
        span: Span,
    ) -> InterpreterResult<Value> {
        let value = self.evaluate(operand)?;

        ops::unary(op, &value).map_err(|fault| match fault {
            OpFault::Overflow => InterpreterError::IntegerOverflow(span),
            OpFault::NotBool => InterpreterError::type_mismatch(
                format!("operand of '!' must be a bool, got {}", value.type_name()),
                span,
            ),
            _ => InterpreterError::type_mismatch(
                format!("operand of '{}' must be a number, got {}", op, value.type_name()),
                span,
            ),
        })
    }
}
