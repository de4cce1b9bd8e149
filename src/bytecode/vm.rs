//! Stack-based virtual machine for the generic bytecode dialect.

use std::collections::HashMap;
use std::io::{self, Stdout, Write};

use crate::ast::{BinaryOp, UnaryOp};
use crate::bytecode::chunk::Chunk;
use crate::bytecode::compiler::MAX_LOCALS;
use crate::bytecode::disassembler::disassemble_instruction;
use crate::bytecode::instruction::OpCode;
use crate::error::{RuntimeError, VmError};
use crate::ops::{self, OpFault};
use crate::parser::MAX_NESTING;
use crate::span::Span;
use crate::value::Value;

/// Result type for VM operations.
pub type VmResult<T> = Result<T, VmError>;

/// Default operand stack capacity: every local slot the compiler can hand
/// out, plus room for the temporaries of the deepest expression the parser
/// accepts.
pub const STACK_MAX: usize = MAX_LOCALS + MAX_NESTING;

/// Knobs for a VM instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmConfig {
    /// Fixed operand stack capacity, locals included.
    pub stack_capacity: usize,
    /// Emit every instruction through `tracing::trace!` before running it.
    pub trace: bool,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            stack_capacity: STACK_MAX,
            trace: false,
        }
    }
}

/// Lifecycle of a VM run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmState {
    Idle,
    Running,
    Halted,
    Faulted,
}

/// The generic virtual machine.
///
/// A chunk is moved in, run from offset 0 until its last byte or a `RETURN`,
/// and the stack is returned to where it started. Globals survive across runs.
pub struct Vm<W: Write = Stdout> {
    config: VmConfig,
    state: VmState,
    chunk: Chunk,
    ip: usize,
    stack: Vec<Value>,
    /// Stack height when the current run started. Local slots are relative to it.
    base: usize,
    globals: HashMap<String, Value>,
    output: W,
}

impl Vm<Stdout> {
    pub fn new() -> Self {
        Self::with_config(VmConfig::default())
    }

    pub fn with_config(config: VmConfig) -> Self {
        Self {
            config,
            state: VmState::Idle,
            chunk: Chunk::new(),
            ip: 0,
            stack: Vec::with_capacity(config.stack_capacity),
            base: 0,
            globals: HashMap::new(),
            output: io::stdout(),
        }
    }
}

impl Default for Vm<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Vm<W> {
    /// Redirect `print` output.
    pub fn with_output<O: Write>(self, output: O) -> Vm<O> {
        Vm {
            config: self.config,
            state: self.state,
            chunk: self.chunk,
            ip: self.ip,
            stack: self.stack,
            base: self.base,
            globals: self.globals,
            output,
        }
    }

    pub fn state(&self) -> VmState {
        self.state
    }

    pub fn config(&self) -> VmConfig {
        self.config
    }

    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }

    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Run a statement-context chunk.
    pub fn interpret(&mut self, chunk: Chunk) -> VmResult<()> {
        self.start(chunk);
        let result = self.execute();
        self.finish(result)
    }

    /// Run an expression-context chunk and pop its single result.
    pub fn evaluate(&mut self, chunk: Chunk) -> VmResult<Value> {
        self.start(chunk);
        let result = self.execute().and_then(|()| self.pop());
        self.finish(result)
    }

    fn start(&mut self, chunk: Chunk) {
        self.chunk = chunk;
        self.ip = 0;
        self.base = self.stack.len();
        self.state = VmState::Running;
        tracing::debug!(bytes = self.chunk.len(), base = self.base, "vm running");
    }

    /// Restore the stack to the run's base on every exit path.
    fn finish<T>(&mut self, result: VmResult<T>) -> VmResult<T> {
        if self.stack.len() > self.base {
            tracing::debug!(leftover = self.stack.len() - self.base, "discarding stack values");
        }
        self.stack.truncate(self.base);

        match result {
            Ok(value) => {
                self.state = VmState::Halted;
                tracing::debug!(ip = self.ip, "vm halted");
                self.output.flush()?;
                Ok(value)
            }
            Err(err) => {
                self.state = VmState::Faulted;
                tracing::debug!(ip = self.ip, error = %err, "vm faulted");
                Err(err)
            }
        }
    }

    /// Main execution loop.
    fn execute(&mut self) -> VmResult<()> {
        while self.ip < self.chunk.code.len() {
            let offset = self.ip;

            if self.config.trace {
                let (text, _) = disassemble_instruction(&self.chunk, offset);
                tracing::trace!(stack = self.stack.len() - self.base, "{}", text);
            }

            let byte = self.chunk.code[offset];
            let opcode =
                OpCode::from_u8(byte).ok_or(VmError::UnknownOpcode { byte, offset })?;
            if offset + opcode.operand_len() >= self.chunk.code.len() {
                return Err(VmError::TruncatedInstruction { offset });
            }
            self.ip += 1;

            match opcode {
                OpCode::Constant => {
                    let index = self.read_byte() as usize;
                    let value = self.chunk.constant(index).cloned().ok_or(
                        VmError::InvalidConstant {
                            index,
                            line: self.line(offset),
                        },
                    )?;
                    self.push(value, offset)?;
                }

                OpCode::Nil => self.push(Value::Nil, offset)?,
                OpCode::True => self.push(Value::Bool(true), offset)?,
                OpCode::False => self.push(Value::Bool(false), offset)?,

                OpCode::Pop => {
                    self.pop_at(offset)?;
                }

                OpCode::GetGlobal => {
                    let name = self.read_name(offset)?;
                    let value = self.globals.get(&name).cloned().ok_or_else(|| {
                        RuntimeError::undefined_variable(
                            name,
                            Span::at_line(self.line(offset)),
                        )
                    })?;
                    self.push(value, offset)?;
                }

                OpCode::SetGlobal => {
                    let name = self.read_name(offset)?;
                    if !self.globals.contains_key(&name) {
                        return Err(RuntimeError::undefined_variable(
                            name,
                            Span::at_line(self.line(offset)),
                        )
                        .into());
                    }
                    let value = self.peek(offset)?.clone();
                    self.globals.insert(name, value);
                }

                OpCode::DefineGlobal => {
                    let name = self.read_name(offset)?;
                    let value = self.pop_at(offset)?;
                    self.globals.insert(name, value);
                }

                OpCode::GetLocal => {
                    let slot = self.base + self.read_byte() as usize;
                    let value = self
                        .stack
                        .get(slot)
                        .cloned()
                        .ok_or(VmError::StackUnderflow {
                            line: self.line(offset),
                        })?;
                    self.push(value, offset)?;
                }

                OpCode::SetLocal => {
                    let slot = self.base + self.read_byte() as usize;
                    let value = self.peek(offset)?.clone();
                    match self.stack.get_mut(slot) {
                        Some(target) => *target = value,
                        None => {
                            return Err(VmError::StackUnderflow {
                                line: self.line(offset),
                            })
                        }
                    }
                }

                OpCode::Equal => self.binary_op(BinaryOp::Equal, offset)?,
                OpCode::NotEqual => self.binary_op(BinaryOp::NotEqual, offset)?,
                OpCode::Less => self.binary_op(BinaryOp::Less, offset)?,
                OpCode::LessEqual => self.binary_op(BinaryOp::LessEqual, offset)?,
                OpCode::Greater => self.binary_op(BinaryOp::Greater, offset)?,
                OpCode::GreaterEqual => self.binary_op(BinaryOp::GreaterEqual, offset)?,
                OpCode::Add => self.binary_op(BinaryOp::Add, offset)?,
                OpCode::Subtract => self.binary_op(BinaryOp::Subtract, offset)?,
                OpCode::Multiply => self.binary_op(BinaryOp::Multiply, offset)?,
                OpCode::Divide => self.binary_op(BinaryOp::Divide, offset)?,

                OpCode::Not => self.unary_op(UnaryOp::Not, offset)?,
                OpCode::Negate => self.unary_op(UnaryOp::Negate, offset)?,

                OpCode::Print => {
                    let value = self.pop_at(offset)?;
                    writeln!(self.output, "{}", value)?;
                }

                OpCode::JumpIfFalse => {
                    let distance = self.read_u16()?;
                    if !self.peek(offset)?.is_truthy() {
                        self.jump(distance)?;
                    }
                }

                OpCode::JumpIfTrue => {
                    let distance = self.read_u16()?;
                    if self.peek(offset)?.is_truthy() {
                        self.jump(distance)?;
                    }
                }

                OpCode::Return => return Ok(()),
            }
        }

        Ok(())
    }

    fn line(&self, offset: usize) -> usize {
        self.chunk.get_line(offset) as usize
    }

    /// Operand bytes are bounds-checked before dispatch.
    fn read_byte(&mut self) -> u8 {
        let byte = self.chunk.code[self.ip];
        self.ip += 1;
        byte
    }

    fn read_u16(&mut self) -> VmResult<u16> {
        let value = self
            .chunk
            .read_u16(self.ip)
            .map_err(|_| VmError::TruncatedInstruction { offset: self.ip - 1 })?;
        self.ip += 2;
        Ok(value)
    }

    fn read_name(&mut self, offset: usize) -> VmResult<String> {
        let index = self.read_byte() as usize;
        match self.chunk.constant(index) {
            Some(Value::String(name)) => Ok(name.clone()),
            _ => Err(VmError::InvalidConstant {
                index,
                line: self.line(offset),
            }),
        }
    }

    fn jump(&mut self, distance: u16) -> VmResult<()> {
        let target = self.ip + distance as usize;
        if target > self.chunk.code.len() {
            return Err(VmError::InvalidJump { target });
        }
        self.ip = target;
        Ok(())
    }

    fn push(&mut self, value: Value, offset: usize) -> VmResult<()> {
        if self.stack.len() >= self.config.stack_capacity {
            return Err(VmError::StackOverflow {
                capacity: self.config.stack_capacity,
                line: self.line(offset),
            });
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self) -> VmResult<Value> {
        let line = self.chunk.lines.last().copied().unwrap_or(0) as usize;
        self.pop_line(line)
    }

    fn pop_at(&mut self, offset: usize) -> VmResult<Value> {
        let line = self.line(offset);
        self.pop_line(line)
    }

    fn pop_line(&mut self, line: usize) -> VmResult<Value> {
        if self.stack.len() <= self.base {
            return Err(VmError::StackUnderflow { line });
        }
        self.stack.pop().ok_or(VmError::StackUnderflow { line })
    }

    fn peek(&self, offset: usize) -> VmResult<&Value> {
        if self.stack.len() <= self.base {
            return Err(VmError::StackUnderflow {
                line: self.line(offset),
            });
        }
        self.stack.last().ok_or(VmError::StackUnderflow {
            line: self.line(offset),
        })
    }

    fn binary_op(&mut self, op: BinaryOp, offset: usize) -> VmResult<()> {
        let b = self.pop_at(offset)?;
        let a = self.pop_at(offset)?;
        let line = self.line(offset);

        let result = ops::binary(op, &a, &b).map_err(|fault| match fault {
            OpFault::DivisionByZero => VmError::DivisionByZero { line },
            OpFault::Overflow => VmError::IntegerOverflow { line },
            OpFault::Unsupported | OpFault::NotNumber | OpFault::NotBool => {
                VmError::UnsupportedOperands {
                    operator: op.symbol(),
                    left: a.type_name(),
                    right: b.type_name(),
                    line,
                }
            }
        })?;
        self.push(result, offset)
    }

    fn unary_op(&mut self, op: UnaryOp, offset: usize) -> VmResult<()> {
        let value = self.pop_at(offset)?;
        let line = self.line(offset);

        let result = ops::unary(op, &value).map_err(|fault| match fault {
            OpFault::Overflow => VmError::IntegerOverflow { line },
            OpFault::NotBool => VmError::TypeMismatch {
                message: format!("operand of '!' must be a bool, got {}", value.type_name()),
                line,
            },
            _ => VmError::TypeMismatch {
                message: format!("operand of '{}' must be a number, got {}", op, value.type_name()),
                line,
            },
        })?;
        self.push(result, offset)
    }
}
