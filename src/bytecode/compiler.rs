//! Lowers the AST into generic-dialect bytecode.

use crate::ast::*;
use crate::bytecode::chunk::Chunk;
use crate::bytecode::instruction::OpCode;
use crate::error::CompileError;
use crate::span::Span;
use crate::value::Value;

pub type CompileResult<T> = Result<T, CompileError>;

/// Locals are addressed by a one-byte stack slot.
pub const MAX_LOCALS: usize = 256;

/// A block-scoped variable living in a VM stack slot.
#[derive(Debug, Clone)]
struct Local {
    name: String,
    /// `None` while the initializer is being compiled.
    depth: Option<usize>,
}

/// The generic-dialect code generator.
///
/// Top-level `var` declarations become globals; declarations inside a block
/// become stack-slot locals that are popped when the block ends.
#[derive(Debug, Default)]
pub struct Compiler {
    chunk: Chunk,
    locals: Vec<Local>,
    scope_depth: usize,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile a program in statement context. Every statement leaves the
    /// operand stack as it found it.
    pub fn compile(&mut self, program: &Program) -> CompileResult<Chunk> {
        self.reset();
        for stmt in &program.statements {
            self.compile_statement(stmt)?;
        }
        Ok(self.finish())
    }

    /// Compile a single expression. The resulting chunk leaves exactly one
    /// value on the operand stack.
    pub fn compile_expression(&mut self, expr: &Expr) -> CompileResult<Chunk> {
        self.reset();
        self.compile_expr(expr)?;
        Ok(self.finish())
    }

    fn reset(&mut self) {
        self.chunk = Chunk::new();
        self.locals.clear();
        self.scope_depth = 0;
    }

    fn finish(&mut self) -> Chunk {
        let chunk = std::mem::take(&mut self.chunk);
        tracing::debug!(
            bytes = chunk.len(),
            constants = chunk.constants.len(),
            "compiled generic chunk"
        );
        chunk
    }

    /// Compile a statement.
    fn compile_statement(&mut self, stmt: &Stmt) -> CompileResult<()> {
        let line = stmt.span.line as u32;

        match &stmt.kind {
            StmtKind::Expression(expr) => {
                self.compile_expr(expr)?;
                self.emit_op(OpCode::Pop, expr.line() as u32);
            }

            StmtKind::Print(expr) => {
                self.compile_expr(expr)?;
                self.emit_op(OpCode::Print, line);
            }

            StmtKind::Var { name, initializer } => {
                if self.scope_depth > 0 {
                    self.declare_local(name.clone(), stmt.span)?;
                    self.compile_initializer(initializer.as_ref(), line)?;
                    self.mark_initialized();
                } else {
                    let index = self.identifier_constant(name, line)?;
                    self.compile_initializer(initializer.as_ref(), line)?;
                    self.emit_op(OpCode::DefineGlobal, line);
                    self.emit_byte(index, line);
                }
            }

            StmtKind::Block(statements) => {
                self.begin_scope();
                for stmt in statements {
                    self.compile_statement(stmt)?;
                }
                let end_line = self
                    .chunk
                    .lines
                    .last()
                    .copied()
                    .unwrap_or(line);
                self.end_scope(end_line);
            }
        }

        Ok(())
    }

    fn compile_initializer(&mut self, initializer: Option<&Expr>, line: u32) -> CompileResult<()> {
        match initializer {
            Some(expr) => self.compile_expr(expr),
            None => {
                self.emit_op(OpCode::Nil, line);
                Ok(())
            }
        }
    }

    /// Compile an expression, leaving its value on the stack.
    fn compile_expr(&mut self, expr: &Expr) -> CompileResult<()> {
        let line = expr.line() as u32;

        match &expr.kind {
            ExprKind::Literal(value) => match value {
                Value::Nil => self.emit_op(OpCode::Nil, line),
                Value::Bool(true) => self.emit_op(OpCode::True, line),
                Value::Bool(false) => self.emit_op(OpCode::False, line),
                Value::Int(_) | Value::Double(_) | Value::String(_) => {
                    let index = self.chunk.add_constant(value.clone(), line)?;
                    self.emit_op(OpCode::Constant, line);
                    self.emit_byte(index, line);
                }
            },

            ExprKind::Grouping(inner) => self.compile_expr(inner)?,

            ExprKind::Variable(name) => {
                if let Some(slot) = self.resolve_local(name) {
                    self.emit_op(OpCode::GetLocal, line);
                    self.emit_byte(slot, line);
                } else {
                    let index = self.identifier_constant(name, line)?;
                    self.emit_op(OpCode::GetGlobal, line);
                    self.emit_byte(index, line);
                }
            }

            ExprKind::Assign { name, value } => {
                self.compile_expr(value)?;
                if let Some(slot) = self.resolve_local(name) {
                    self.emit_op(OpCode::SetLocal, line);
                    self.emit_byte(slot, line);
                } else {
                    let index = self.identifier_constant(name, line)?;
                    self.emit_op(OpCode::SetGlobal, line);
                    self.emit_byte(index, line);
                }
            }

            ExprKind::Binary {
                left,
                operator,
                right,
            } => {
                self.compile_expr(left)?;
                self.compile_expr(right)?;
                let op = match operator {
                    BinaryOp::Add => OpCode::Add,
                    BinaryOp::Subtract => OpCode::Subtract,
                    BinaryOp::Multiply => OpCode::Multiply,
                    BinaryOp::Divide => OpCode::Divide,
                    BinaryOp::Equal => OpCode::Equal,
                    BinaryOp::NotEqual => OpCode::NotEqual,
                    BinaryOp::Less => OpCode::Less,
                    BinaryOp::LessEqual => OpCode::LessEqual,
                    BinaryOp::Greater => OpCode::Greater,
                    BinaryOp::GreaterEqual => OpCode::GreaterEqual,
                };
                self.emit_op(op, line);
            }

            // The jump keeps the left value on the stack; when it does not
            // decide the result it is popped and the right side takes its place.
            ExprKind::Logical {
                left,
                operator,
                right,
            } => {
                self.compile_expr(left)?;
                let jump_op = match operator {
                    LogicalOp::And => OpCode::JumpIfFalse,
                    LogicalOp::Or => OpCode::JumpIfTrue,
                };
                let jump = self.emit_jump(jump_op, line);
                self.emit_op(OpCode::Pop, line);
                self.compile_expr(right)?;
                self.patch_jump(jump, expr.span)?;
            }

            ExprKind::Unary { operator, operand } => {
                self.compile_expr(operand)?;
                match operator {
                    UnaryOp::Negate => self.emit_op(OpCode::Negate, line),
                    UnaryOp::Not => self.emit_op(OpCode::Not, line),
                }
            }
        }

        Ok(())
    }

    // ===== Scopes =====

    fn begin_scope(&mut self) {
        self.scope_depth += 1;
    }

    fn end_scope(&mut self, line: u32) {
        self.scope_depth -= 1;

        // Pop locals going out of scope
        while let Some(local) = self.locals.last() {
            if local.depth.is_some_and(|depth| depth <= self.scope_depth) {
                break;
            }
            self.emit_op(OpCode::Pop, line);
            self.locals.pop();
        }
    }

    fn declare_local(&mut self, name: String, span: Span) -> CompileResult<()> {
        if self.locals.len() >= MAX_LOCALS {
            return Err(CompileError::TooManyLocals(span));
        }
        self.locals.push(Local { name, depth: None });
        Ok(())
    }

    fn mark_initialized(&mut self) {
        let depth = self.scope_depth;
        if let Some(local) = self.locals.last_mut() {
            local.depth = Some(depth);
        }
    }

    /// Innermost initialized local with this name. A local still being
    /// initialized is skipped, so `var a = a;` reads the enclosing `a`.
    fn resolve_local(&self, name: &str) -> Option<u8> {
        self.locals
            .iter()
            .enumerate()
            .rev()
            .find(|(_, local)| local.name == name && local.depth.is_some())
            .map(|(slot, _)| slot as u8)
    }

    // ===== Emission =====

    fn emit_op(&mut self, op: OpCode, line: u32) {
        self.chunk.write_op(op, line);
    }

    fn emit_byte(&mut self, byte: u8, line: u32) {
        self.chunk.write_byte(byte, line);
    }

    fn emit_jump(&mut self, op: OpCode, line: u32) -> usize {
        self.emit_op(op, line);
        let offset = self.chunk.current_offset();
        self.chunk.write_u16(0xFFFF, line); // Placeholder
        offset
    }

    fn patch_jump(&mut self, offset: usize, span: Span) -> CompileResult<()> {
        let distance = self.chunk.current_offset() - offset - 2;
        let distance = u16::try_from(distance).map_err(|_| CompileError::JumpTooLarge(span))?;
        self.chunk.patch_u16(offset, distance)
    }

    fn identifier_constant(&mut self, name: &str, line: u32) -> CompileResult<u8> {
        self.chunk.add_constant(Value::String(name.to_string()), line)
    }
}
