//! Evaluation entry points and block execution.

mod expressions;
mod operators;
mod statements;

use std::io::Write;

use crate::ast::*;
use crate::error::InterpreterError;
use crate::interpreter::Interpreter;
use crate::value::Value;

pub type InterpreterResult<T> = Result<T, InterpreterError>;

impl<W: Write> Interpreter<W> {
    /// Evaluate a single expression to a value.
    pub fn evaluate_expression(&mut self, expr: &Expr) -> InterpreterResult<Value> {
        self.evaluate(expr)
    }

    /// Execute a program statement by statement, stopping at the first error.
    pub fn interpret(&mut self, program: &Program) -> InterpreterResult<()> {
        for stmt in &program.statements {
            self.execute(stmt)?;
        }
        self.output.flush()?;
        Ok(())
    }

    /// Run `statements` in a fresh child scope. The scope is dropped on
    /// every exit path.
    pub(crate) fn execute_block(&mut self, statements: &[Stmt]) -> InterpreterResult<()> {
        self.environment.push_scope();

        let mut result = Ok(());
        for stmt in statements {
            result = self.execute(stmt);
            if result.is_err() {
                break;
            }
        }

        self.environment.pop_scope();
        result
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::RuntimeError;
    use crate::lexer::Scanner;
    use crate::parser::Parser;

    fn eval(source: &str) -> InterpreterResult<Value> {
        let tokens = Scanner::new(source).scan_tokens().unwrap();
        let expr = Parser::new(tokens).parse_expression().unwrap();
        Interpreter::with_output(Vec::new()).evaluate_expression(&expr)
    }

    fn run(source: &str) -> (InterpreterResult<()>, String) {
        let tokens = Scanner::new(source).scan_tokens().unwrap();
        let program = Parser::new(tokens).parse().into_result().unwrap();
        let mut interpreter = Interpreter::with_output(Vec::new());
        let result = interpreter.interpret(&program);
        let output = String::from_utf8(interpreter.into_output()).unwrap();
        (result, output)
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("(-1 + 2) * 3 - -4").unwrap(), Value::Int(7));
        assert_eq!(eval("7 / 2").unwrap(), Value::Int(3));
        assert_eq!(eval("1.5 * 2.0").unwrap(), Value::Double(3.0));
        assert_eq!(eval("\"foo\" + \"bar\"").unwrap(), Value::from("foobar"));
    }

    #[test]
    fn test_division_by_zero_reports_operator_line() {
        let err = eval("10\n/ 0").unwrap_err();
        match err {
            InterpreterError::DivisionByZero(span) => assert_eq!(span.line, 2),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(matches!(
            eval("1.0 / 0.0"),
            Err(InterpreterError::DivisionByZero(_))
        ));
    }

    #[test]
    fn test_mixed_operands_fail() {
        let err = eval("1 + 2.0").unwrap_err();
        assert!(matches!(
            err,
            InterpreterError::UnsupportedOperands { left: "int", right: "double", .. }
        ));
        assert!(matches!(
            eval("\"a\" - \"b\""),
            Err(InterpreterError::UnsupportedOperands { .. })
        ));
    }

    #[test]
    fn test_overflow_is_an_error() {
        assert!(matches!(
            eval("9223372036854775807 + 1"),
            Err(InterpreterError::IntegerOverflow(_))
        ));
    }

    #[test]
    fn test_equality_and_comparison() {
        assert_eq!(eval("1 == 1.0").unwrap(), Value::Bool(false));
        assert_eq!(eval("nil == nil").unwrap(), Value::Bool(true));
        assert_eq!(eval("nil != false").unwrap(), Value::Bool(true));
        assert_eq!(eval("\"abc\" < \"abd\"").unwrap(), Value::Bool(true));
        assert_eq!(eval("2 >= 3").unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_unary() {
        assert_eq!(eval("!true").unwrap(), Value::Bool(false));
        assert!(matches!(eval("!nil"), Err(InterpreterError::TypeMismatch { .. })));
        assert!(matches!(eval("-\"x\""), Err(InterpreterError::TypeMismatch { .. })));
        assert_eq!(eval("--2.5").unwrap(), Value::Double(2.5));
    }

    #[test]
    fn test_logical_short_circuit() {
        assert_eq!(eval("nil || \"fallback\"").unwrap(), Value::from("fallback"));
        assert_eq!(eval("0 || missing").unwrap(), Value::Int(0));
        assert_eq!(eval("false && missing").unwrap(), Value::Bool(false));
        assert!(matches!(
            eval("true && missing"),
            Err(InterpreterError::Runtime(RuntimeError::UndefinedVariable(..)))
        ));
    }

    #[test]
    fn test_print_and_variables() {
        let (result, output) = run("var a = 1; var b; print a + 2; print b; a = \"x\"; print a;");
        assert!(result.is_ok());
        assert_eq!(output, "3\nnil\nx\n");
    }

    #[test]
    fn test_blocks_shadow_and_restore() {
        let (result, output) = run(
            "var a = \"outer\";\n{ var a = \"inner\"; print a; a = \"changed\"; }\nprint a;\n{ a = \"assigned\"; }\nprint a;",
        );
        assert!(result.is_ok());
        assert_eq!(output, "inner\nouter\nassigned\n");
    }

    #[test]
    fn test_undefined_variable() {
        let (result, _) = run("print nope;");
        assert!(matches!(
            result,
            Err(InterpreterError::Runtime(RuntimeError::UndefinedVariable(ref name, _))) if name == "nope"
        ));
        let (result, _) = run("nope = 1;");
        assert!(matches!(result, Err(InterpreterError::Runtime(_))));
    }

    #[test]
    fn test_error_keeps_committed_bindings() {
        let tokens = Scanner::new("var a = 1; { var b = 2; a = 5; print 1 / 0; }")
            .scan_tokens()
            .unwrap();
        let program = Parser::new(tokens).parse().into_result().unwrap();
        let mut interpreter = Interpreter::with_output(Vec::new());
        assert!(interpreter.interpret(&program).is_err());
        assert_eq!(interpreter.environment().get("a"), Some(&Value::Int(5)));
        assert_eq!(interpreter.environment().get("b"), None);
        assert_eq!(interpreter.environment().depth(), 1);
    }
}
