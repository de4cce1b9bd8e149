//! Expression evaluation.

use std::io::Write;

use crate::ast::*;
use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::value::Value;

use super::InterpreterResult;

impl<W: Write> Interpreter<W> {
    /// Strict, depth-first, left operand before right.
    pub(crate) fn evaluate(&mut self, expr: &Expr) -> InterpreterResult<Value> {
        match &expr.kind {
            ExprKind::Literal(value) => Ok(value.clone()),

            ExprKind::Grouping(inner) => self.evaluate(inner),

            ExprKind::Variable(name) => match self.environment.get(name) {
                Some(value) => Ok(value.clone()),
                None => Err(RuntimeError::undefined_variable(name, expr.span).into()),
            },

            ExprKind::Assign { name, value } => {
                let value = self.evaluate(value)?;
                if self.environment.assign(name, value.clone()) {
                    Ok(value)
                } else {
                    Err(RuntimeError::undefined_variable(name, expr.span).into())
                }
            }

            ExprKind::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, *operator, right, expr.span),

            ExprKind::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let decided = match operator {
                    LogicalOp::Or => left.is_truthy(),
                    LogicalOp::And => !left.is_truthy(),
                };
                if decided {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            ExprKind::Unary { operator, operand } => {
                self.evaluate_unary(*operator, operand, expr.span)
            }
        }
    }
}
