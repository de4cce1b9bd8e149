//! Relic: a small expression language with three execution engines.
//!
//! This is the library root that exports all modules.
//!
//! # Execution Modes
//!
//! - **Tree-walk interpreter**: direct AST evaluation
//! - **Bytecode VM**: the generic stack dialect, compiled to a [`Chunk`]
//! - **Legacy**: arithmetic only, micro-encoded into `expression`
//!   instructions for an engine version
//!
//! All three share the scanner, the parser and the [`Value`] model.

#![allow(clippy::result_large_err)]

pub mod ast;
pub mod bytecode;
pub mod error;
pub mod highlight;
pub mod interpreter;
pub mod legacy;
pub mod lexer;
pub mod ops;
pub mod parser;
pub mod span;
pub mod value;

use std::collections::HashMap;
use std::io::{self, Write};

use bytecode::Chunk;
use error::RelicError;
use legacy::EngineVersion;
use value::Value;

/// Execution mode for running relic programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Tree-walking interpreter
    #[default]
    TreeWalk,
    /// Generic bytecode virtual machine
    Bytecode,
    /// Legacy micro-encoded expressions for the default engine version
    Legacy,
}

/// Run a program, printing to stdout.
pub fn run(source: &str, mode: ExecutionMode) -> Result<(), RelicError> {
    run_with_output(source, mode, io::stdout())?;
    Ok(())
}

/// Run a program and hand back the writer `print` went to.
///
/// Legacy programs have no `print`; their final variable values are written
/// as `name = value` lines in declaration order instead.
pub fn run_with_output<W: Write>(source: &str, mode: ExecutionMode, mut output: W) -> Result<W, RelicError> {
    let program = parse(source)?;

    match mode {
        ExecutionMode::TreeWalk => {
            let mut interpreter = interpreter::Interpreter::with_output(output);
            interpreter.interpret(&program)?;
            Ok(interpreter.into_output())
        }
        ExecutionMode::Bytecode => {
            let chunk = bytecode::Compiler::new().compile(&program)?;
            let mut vm = bytecode::Vm::new().with_output(output);
            vm.interpret(chunk)?;
            Ok(vm.into_output())
        }
        ExecutionMode::Legacy => {
            let version = EngineVersion::default();
            let mut compiler = legacy::LegacyCompiler::new(version);
            let chunk = compiler.compile(&program)?;
            let mut vm = legacy::LegacyVm::new(version);
            vm.interpret(chunk)?;

            let mut names: Vec<(&String, &u16)> = compiler.variables().iter().collect();
            names.sort_by_key(|(_, number)| **number);
            for (name, number) in names {
                writeln!(output, "{} = {}", name, vm.variable(*number))
                    .map_err(error::VmError::from)?;
            }
            Ok(output)
        }
    }
}

/// Parse source code into an AST without executing.
pub fn parse(source: &str) -> Result<ast::Program, RelicError> {
    let tokens = lexer::Scanner::new(source).scan_tokens()?;
    let program = parser::Parser::new(tokens).parse().into_result()?;
    Ok(program)
}

/// Parse a single expression.
pub fn parse_expression(source: &str) -> Result<ast::Expr, RelicError> {
    let tokens = lexer::Scanner::new(source).scan_tokens()?;
    let expr = parser::Parser::new(tokens).parse_expression()?;
    Ok(expr)
}

/// Evaluate a single expression with the chosen engine.
///
/// The legacy engine stores the result in variable 0 and reads it back.
pub fn evaluate(source: &str, mode: ExecutionMode) -> Result<Value, RelicError> {
    let expr = parse_expression(source)?;

    match mode {
        ExecutionMode::TreeWalk => {
            let mut interpreter = interpreter::Interpreter::with_output(io::sink());
            Ok(interpreter.evaluate_expression(&expr)?)
        }
        ExecutionMode::Bytecode => {
            let chunk = bytecode::Compiler::new().compile_expression(&expr)?;
            Ok(bytecode::Vm::new().with_output(io::sink()).evaluate(chunk)?)
        }
        ExecutionMode::Legacy => {
            let version = EngineVersion::default();
            let chunk = legacy::LegacyCompiler::new(version).compile_expression(&expr, 0)?;
            let mut vm = legacy::LegacyVm::new(version);
            vm.interpret(chunk)?;
            Ok(Value::Int(vm.variable(0) as i64))
        }
    }
}

/// Compile a program to generic bytecode.
pub fn compile(source: &str) -> Result<Chunk, RelicError> {
    let program = parse(source)?;
    Ok(bytecode::Compiler::new().compile(&program)?)
}

/// Compile a program of `var` declarations and assignments to the legacy dialect.
pub fn compile_legacy(source: &str, version: EngineVersion) -> Result<Chunk, RelicError> {
    let program = parse(source)?;
    Ok(legacy::LegacyCompiler::new(version).compile(&program)?)
}

/// Compile and run a legacy program, returning every variable by name.
pub fn run_legacy(source: &str, version: EngineVersion) -> Result<HashMap<String, i32>, RelicError> {
    let program = parse(source)?;
    let mut compiler = legacy::LegacyCompiler::new(version);
    let chunk = compiler.compile(&program)?;

    let mut vm = legacy::LegacyVm::new(version);
    vm.interpret(chunk)?;

    Ok(compiler
        .variables()
        .iter()
        .map(|(name, number)| (name.clone(), vm.variable(*number)))
        .collect())
}

/// Compile a program and return its generic bytecode listing.
pub fn disassemble(source: &str) -> Result<String, RelicError> {
    let chunk = compile(source)?;
    Ok(bytecode::disassemble_chunk(&chunk, "<script>"))
}

/// Compile a program and return its legacy listing.
pub fn disassemble_legacy(source: &str, version: EngineVersion) -> Result<String, RelicError> {
    let chunk = compile_legacy(source, version)?;
    Ok(legacy::disassemble(&chunk, &version.opcode_table(), "<script>"))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn run_to_string(source: &str, mode: ExecutionMode) -> String {
        let output = run_with_output(source, mode, Vec::new()).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_modes_agree() {
        let source = "var a = 2; { var b = a * 3; a = b - 1; } print a; print a > 4 && \"big\";";
        assert_eq!(run_to_string(source, ExecutionMode::TreeWalk), "5\nbig\n");
        assert_eq!(run_to_string(source, ExecutionMode::Bytecode), "5\nbig\n");
    }

    #[test]
    fn test_legacy_mode_reports_variables() {
        let output = run_to_string("var total = 10 + 20; var half = 30 / 2;", ExecutionMode::Legacy);
        assert_eq!(output, "total = 30\nhalf = 15\n");
    }

    #[test]
    fn test_evaluate_each_mode() {
        for mode in [ExecutionMode::TreeWalk, ExecutionMode::Bytecode, ExecutionMode::Legacy] {
            assert_eq!(evaluate("(-1 + 2) * 3 - -4", mode).unwrap(), Value::Int(7));
        }
    }

    #[test]
    fn test_parse_errors_are_collected() {
        let err = parse("var = 1;\nprint 2\nprint 3;").unwrap_err();
        match err {
            RelicError::Parse(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected parse errors, got {:?}", other),
        }
    }

    #[test]
    fn test_run_legacy_by_name() {
        let vars = run_legacy("var x = 7; var y = x2; ", EngineVersion::V5);
        assert!(vars.is_err());

        let vars = run_legacy("var x = 7 * 6; var y; y = -5;", EngineVersion::V4).unwrap();
        assert_eq!(vars.get("x"), Some(&42));
        assert_eq!(vars.get("y"), Some(&-5));
    }
}
