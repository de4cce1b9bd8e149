//! Lowers arithmetic expressions into legacy expression instructions.
//!
//! One instruction is `[expression][var:u16 LE]` followed by sub-operations
//! and the `0xFF` terminator. Operands are emitted in push order, so the
//! first value pushed is the left operand.

use std::collections::HashMap;

use crate::ast::*;
use crate::bytecode::chunk::Chunk;
use crate::error::CompileError;
use crate::legacy::opcode::{EngineVersion, OpcodeTable, SubOp, END, MAX_VARIABLE};
use crate::span::Span;
use crate::value::Value;

pub type CompileResult<T> = Result<T, CompileError>;

/// Code generator for the legacy dialect.
#[derive(Debug)]
pub struct LegacyCompiler {
    table: OpcodeTable,
    chunk: Chunk,
    /// Variable numbers, allocated in declaration order.
    variables: HashMap<String, u16>,
}

impl LegacyCompiler {
    pub fn new(version: EngineVersion) -> Self {
        Self::with_table(version.opcode_table())
    }

    pub fn with_table(table: OpcodeTable) -> Self {
        Self {
            table,
            chunk: Chunk::new(),
            variables: HashMap::new(),
        }
    }

    pub fn table(&self) -> &OpcodeTable {
        &self.table
    }

    /// Variable numbers assigned by [`compile`](Self::compile).
    pub fn variables(&self) -> &HashMap<String, u16> {
        &self.variables
    }

    /// Compile one expression whose result is stored in `result_var`.
    pub fn compile_expression(&mut self, expr: &Expr, result_var: u16) -> CompileResult<Chunk> {
        self.chunk = Chunk::new();
        self.emit_instruction(expr, result_var, expr.line() as u32)?;
        Ok(self.finish())
    }

    /// Compile a program of declarations and assignments. Every
    /// `var name = expr;` gets the next variable number.
    pub fn compile(&mut self, program: &Program) -> CompileResult<Chunk> {
        self.chunk = Chunk::new();
        self.variables.clear();

        for stmt in &program.statements {
            self.compile_statement(stmt)?;
        }

        Ok(self.finish())
    }

    fn finish(&mut self) -> Chunk {
        let chunk = std::mem::take(&mut self.chunk);
        tracing::debug!(
            version = %self.table.version(),
            bytes = chunk.len(),
            variables = self.variables.len(),
            "compiled legacy chunk"
        );
        chunk
    }

    fn compile_statement(&mut self, stmt: &Stmt) -> CompileResult<()> {
        let line = stmt.span.line as u32;

        match &stmt.kind {
            StmtKind::Var { name, initializer } => {
                let var = self.declare(name, stmt.span)?;
                if let Some(expr) = initializer {
                    self.emit_instruction(expr, var, line)?;
                }
                Ok(())
            }

            StmtKind::Expression(expr) => match &expr.kind {
                ExprKind::Assign { name, value } => {
                    let var = *self
                        .variables
                        .get(name)
                        .ok_or_else(|| CompileError::UndefinedVariable(name.clone(), expr.span))?;
                    self.emit_instruction(value, var, line)
                }
                _ => Err(CompileError::unsupported_in_legacy(
                    "expression statement",
                    stmt.span,
                )),
            },

            StmtKind::Print(_) => Err(CompileError::unsupported_in_legacy("print", stmt.span)),
            StmtKind::Block(_) => Err(CompileError::unsupported_in_legacy("block", stmt.span)),
        }
    }

    /// Number for `name`, allocating one on first declaration.
    fn declare(&mut self, name: &str, span: Span) -> CompileResult<u16> {
        if let Some(&var) = self.variables.get(name) {
            return Ok(var);
        }
        let next = self.variables.len();
        if next > MAX_VARIABLE as usize {
            return Err(CompileError::TooManyVariables(span));
        }
        self.variables.insert(name.to_string(), next as u16);
        Ok(next as u16)
    }

    fn emit_instruction(&mut self, expr: &Expr, var: u16, line: u32) -> CompileResult<()> {
        self.chunk.write_byte(self.table.expression(), line);
        self.chunk.write_u16(var, line);
        self.emit_sub_ops(expr, line)?;
        self.chunk.write_byte(END, line);
        Ok(())
    }

    fn emit_sub_ops(&mut self, expr: &Expr, line: u32) -> CompileResult<()> {
        match &expr.kind {
            ExprKind::Literal(Value::Int(n)) => self.emit_push(*n, expr.span, line),

            ExprKind::Literal(other) => Err(CompileError::unsupported_in_legacy(
                format!("{} literal", other.type_name()),
                expr.span,
            )),

            ExprKind::Grouping(inner) => self.emit_sub_ops(inner, line),

            ExprKind::Unary {
                operator: UnaryOp::Negate,
                operand,
            } => match int_literal(operand) {
                Some(n) => {
                    let negated = n
                        .checked_neg()
                        .ok_or(CompileError::LiteralOutOfRange { value: n, span: expr.span })?;
                    self.emit_push(negated, expr.span, line)
                }
                None => Err(CompileError::unsupported_in_legacy(
                    "negation of a non-literal",
                    expr.span,
                )),
            },

            ExprKind::Binary {
                left,
                operator,
                right,
            } => {
                let op = match operator {
                    BinaryOp::Add => SubOp::Add,
                    BinaryOp::Subtract => SubOp::Subtract,
                    BinaryOp::Multiply => SubOp::Multiply,
                    BinaryOp::Divide => SubOp::Divide,
                    other => {
                        return Err(CompileError::unsupported_in_legacy(
                            format!("operator '{}'", other),
                            expr.span,
                        ))
                    }
                };
                self.emit_sub_ops(left, line)?;
                self.emit_sub_ops(right, line)?;
                self.chunk.write_byte(op as u8, line);
                Ok(())
            }

            ExprKind::Unary {
                operator: UnaryOp::Not,
                ..
            } => Err(CompileError::unsupported_in_legacy("operator '!'", expr.span)),
            ExprKind::Logical { operator, .. } => Err(CompileError::unsupported_in_legacy(
                format!("operator '{}'", operator),
                expr.span,
            )),
            ExprKind::Variable(_) => Err(CompileError::unsupported_in_legacy(
                "variable reference",
                expr.span,
            )),
            ExprKind::Assign { .. } => Err(CompileError::unsupported_in_legacy(
                "nested assignment",
                expr.span,
            )),
        }
    }

    fn emit_push(&mut self, value: i64, span: Span, line: u32) -> CompileResult<()> {
        let word = i16::try_from(value).map_err(|_| CompileError::LiteralOutOfRange { value, span })?;
        self.chunk.write_byte(SubOp::Push as u8, line);
        self.chunk.write_u16(word as u16, line);
        Ok(())
    }
}

/// The integer behind any number of groupings, if that is all there is.
fn int_literal(expr: &Expr) -> Option<i64> {
    match &expr.kind {
        ExprKind::Literal(Value::Int(n)) => Some(*n),
        ExprKind::Grouping(inner) => int_literal(inner),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::legacy::vm::LegacyVm;
    use crate::lexer::Scanner;
    use crate::parser::Parser;

    fn parse_expr(source: &str) -> Expr {
        let tokens = Scanner::new(source).scan_tokens().unwrap();
        Parser::new(tokens).parse_expression().unwrap()
    }

    fn compile_expr(source: &str, var: u16) -> CompileResult<Chunk> {
        LegacyCompiler::new(EngineVersion::V5).compile_expression(&parse_expr(source), var)
    }

    #[test]
    fn test_sum_layout() {
        let chunk = compile_expr("10 + 20", 0x0102).unwrap();
        assert_eq!(
            chunk.code,
            vec![0xAC, 0x02, 0x01, 0x01, 0x0A, 0x00, 0x01, 0x14, 0x00, 0x02, 0xFF]
        );
        assert_eq!(chunk.lines.len(), chunk.code.len());
        assert!(chunk.constants.is_empty());
    }

    #[test]
    fn test_operand_order_and_nesting() {
        let chunk = compile_expr("(8 - 2) / -3", 0).unwrap();
        assert_eq!(
            chunk.code,
            vec![
                0xAC, 0x00, 0x00, // header
                0x01, 0x08, 0x00, // push 8
                0x01, 0x02, 0x00, // push 2
                0x03, // subtract
                0x01, 0xFD, 0xFF, // push -3
                0x05, // divide
                0xFF,
            ]
        );
    }

    #[test]
    fn test_literal_range() {
        assert!(compile_expr("32767 + -32768", 0).is_ok());
        assert!(matches!(
            compile_expr("32768", 0),
            Err(CompileError::LiteralOutOfRange { value: 32768, .. })
        ));
        assert!(matches!(
            compile_expr("-(40000)", 0),
            Err(CompileError::LiteralOutOfRange { value: -40000, .. })
        ));
    }

    #[test]
    fn test_unsupported_shapes() {
        for source in ["1 < 2", "x + 1", "1.5", "\"s\"", "!true", "true && false", "-(1 + 2)"] {
            let err = compile_expr(source, 0).unwrap_err();
            assert!(
                matches!(err, CompileError::UnsupportedInLegacy { .. }),
                "{}: {:?}",
                source,
                err
            );
        }
    }

    #[test]
    fn test_program_allocates_variables() {
        let tokens = Scanner::new("var a = 1; var b; b = 2 * 3; a = 4;")
            .scan_tokens()
            .unwrap();
        let program = Parser::new(tokens).parse().into_result().unwrap();
        let mut compiler = LegacyCompiler::new(EngineVersion::V3);
        let chunk = compiler.compile(&program).unwrap();

        assert_eq!(compiler.variables().get("a"), Some(&0));
        assert_eq!(compiler.variables().get("b"), Some(&1));
        assert_eq!(
            chunk.code,
            vec![
                0xAC, 0x00, 0x00, 0x01, 0x01, 0x00, 0xFF, // a = 1
                0xAC, 0x01, 0x00, 0x01, 0x02, 0x00, 0x01, 0x03, 0x00, 0x04, 0xFF, // b = 2 * 3
                0xAC, 0x00, 0x00, 0x01, 0x04, 0x00, 0xFF, // a = 4
            ]
        );
    }

    #[test]
    fn test_program_rejects_other_statements() {
        for source in ["print 1;", "{ var a = 1; }", "1 + 2;", "c = 1;"] {
            let tokens = Scanner::new(source).scan_tokens().unwrap();
            let program = Parser::new(tokens).parse().into_result().unwrap();
            let err = LegacyCompiler::new(EngineVersion::V5)
                .compile(&program)
                .unwrap_err();
            assert!(matches!(
                err,
                CompileError::UnsupportedInLegacy { .. } | CompileError::UndefinedVariable(..)
            ));
        }
    }

    #[test]
    fn test_variable_number_limit() {
        let chunk = compile_expr("1", MAX_VARIABLE).unwrap();
        assert_eq!(chunk.code[..3].to_vec(), vec![0xAC, 0xFF, 0xFF]);

        let mut vm = LegacyVm::new(EngineVersion::V5);
        vm.interpret(chunk).unwrap();
        assert_eq!(vm.variable(MAX_VARIABLE), 1);

        let statements = (0..=MAX_VARIABLE as usize + 1)
            .map(|i| {
                Stmt::new(
                    StmtKind::Var {
                        name: format!("v{}", i),
                        initializer: None,
                    },
                    Span::at_line(i + 1),
                )
            })
            .collect();
        let err = LegacyCompiler::new(EngineVersion::V5)
            .compile(&Program::new(statements))
            .unwrap_err();
        assert!(matches!(err, CompileError::TooManyVariables(span) if span.line == 65_537));
    }
}
