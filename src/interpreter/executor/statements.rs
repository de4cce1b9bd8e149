//! Statement execution.

use std::io::Write;

use crate::ast::*;
use crate::interpreter::Interpreter;
use crate::value::Value;

use super::InterpreterResult;

impl<W: Write> Interpreter<W> {
    pub(crate) fn execute(&mut self, stmt: &Stmt) -> InterpreterResult<()> {
        match &stmt.kind {
            StmtKind::Expression(expr) => {
                self.evaluate(expr)?;
            }

            StmtKind::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.output, "{}", value)?;
            }

            StmtKind::Var { name, initializer } => {
                let value = match initializer {
                    Some(init) => self.evaluate(init)?,
                    None => Value::Nil,
                };
                self.environment.define(name.clone(), value);
            }

            StmtKind::Block(statements) => self.execute_block(statements)?,
        }
        Ok(())
    }
}
