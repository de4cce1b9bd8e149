//! Virtual machine for legacy expression instructions.

use std::collections::HashMap;

use crate::bytecode::chunk::Chunk;
use crate::bytecode::vm::{VmConfig, VmState};
use crate::error::VmError;
use crate::legacy::disassembler::disassemble_instruction;
use crate::legacy::opcode::{EngineVersion, OpcodeTable, SubOp, END};

pub type VmResult<T> = Result<T, VmError>;

/// Executes expression instructions and stores each result in the variable
/// table. Operands are 32-bit integers and arithmetic wraps.
#[derive(Debug)]
pub struct LegacyVm {
    table: OpcodeTable,
    config: VmConfig,
    state: VmState,
    stack: Vec<i32>,
    variables: HashMap<u16, i32>,
}

impl LegacyVm {
    pub fn new(version: EngineVersion) -> Self {
        Self::with_config(version, VmConfig::default())
    }

    pub fn with_config(version: EngineVersion, config: VmConfig) -> Self {
        Self {
            table: version.opcode_table(),
            config,
            state: VmState::Idle,
            stack: Vec::with_capacity(config.stack_capacity),
            variables: HashMap::new(),
        }
    }

    pub fn state(&self) -> VmState {
        self.state
    }

    pub fn table(&self) -> &OpcodeTable {
        &self.table
    }

    /// Current value of a variable. Unwritten variables read as 0.
    pub fn variable(&self, number: u16) -> i32 {
        self.variables.get(&number).copied().unwrap_or(0)
    }

    pub fn variables(&self) -> &HashMap<u16, i32> {
        &self.variables
    }

    pub fn interpret(&mut self, chunk: Chunk) -> VmResult<()> {
        self.state = VmState::Running;
        tracing::debug!(version = %self.table.version(), bytes = chunk.len(), "legacy vm running");

        let result = self.execute(&chunk);
        self.stack.clear();

        match &result {
            Ok(()) => {
                self.state = VmState::Halted;
                tracing::debug!("legacy vm halted");
            }
            Err(err) => {
                self.state = VmState::Faulted;
                tracing::debug!(error = %err, "legacy vm faulted");
            }
        }
        result
    }

    fn execute(&mut self, chunk: &Chunk) -> VmResult<()> {
        let mut ip = 0;

        while ip < chunk.code.len() {
            let offset = ip;

            if self.config.trace {
                let (text, _) = disassemble_instruction(chunk, &self.table, offset);
                tracing::trace!("{}", text);
            }

            let byte = chunk.code[offset];
            if byte != self.table.expression() {
                return Err(VmError::UnknownOpcode { byte, offset });
            }
            let var = chunk
                .read_u16(offset + 1)
                .map_err(|_| VmError::TruncatedInstruction { offset })?;
            let line = chunk.get_line(offset) as usize;
            ip = self.run_expression(chunk, offset + 3, offset, line)?;

            let result = self.pop(line)?;
            if !self.stack.is_empty() {
                tracing::debug!(leftover = self.stack.len(), "discarding legacy stack values");
                self.stack.clear();
            }
            self.variables.insert(var, result);
        }

        Ok(())
    }

    /// Run sub-operations from `ip` through the terminator. Returns the
    /// offset after the terminator.
    fn run_expression(&mut self, chunk: &Chunk, mut ip: usize, start: usize, line: usize) -> VmResult<usize> {
        loop {
            let byte = *chunk
                .code
                .get(ip)
                .ok_or(VmError::TruncatedInstruction { offset: start })?;
            if byte == END {
                return Ok(ip + 1);
            }

            let op = SubOp::from_u8(byte).ok_or(VmError::UnknownOpcode { byte, offset: ip })?;
            ip += 1;

            match op {
                SubOp::Push => {
                    let word = chunk
                        .read_u16(ip)
                        .map_err(|_| VmError::TruncatedInstruction { offset: start })?;
                    ip += 2;
                    self.push(word as i16 as i32, line)?;
                }
                SubOp::Add => self.binary_op(line, |a, b| Ok(a.wrapping_add(b)))?,
                SubOp::Subtract => self.binary_op(line, |a, b| Ok(a.wrapping_sub(b)))?,
                SubOp::Multiply => self.binary_op(line, |a, b| Ok(a.wrapping_mul(b)))?,
                SubOp::Divide => self.binary_op(line, |a, b| {
                    if b == 0 {
                        Err(VmError::DivisionByZero { line })
                    } else {
                        Ok(a.wrapping_div(b))
                    }
                })?,
            }
        }
    }

    fn push(&mut self, value: i32, line: usize) -> VmResult<()> {
        if self.stack.len() >= self.config.stack_capacity {
            return Err(VmError::StackOverflow {
                capacity: self.config.stack_capacity,
                line,
            });
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self, line: usize) -> VmResult<i32> {
        self.stack.pop().ok_or(VmError::StackUnderflow { line })
    }

    fn binary_op<F>(&mut self, line: usize, op: F) -> VmResult<()>
    where
        F: FnOnce(i32, i32) -> VmResult<i32>,
    {
        let b = self.pop(line)?;
        let a = self.pop(line)?;
        let result = op(a, b)?;
        self.push(result, line)
    }
}
