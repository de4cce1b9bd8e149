//! Bytecode chunk: instructions, a per-byte line table and a constant pool.
//!
//! Both dialects emit into the same container. The generic dialect
//! references the constant pool; the legacy dialect only uses code and lines.

use crate::bytecode::instruction::OpCode;
use crate::error::CompileError;
use crate::span::Span;
use crate::value::Value;

/// Constant indices are one byte wide and the pool holds at most this many entries.
pub const MAX_CONSTANTS: usize = 255;

/// A chunk of bytecode. `code` and `lines` always have the same length.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Chunk {
    /// The bytecode instructions.
    pub code: Vec<u8>,
    /// Source line of every byte in `code`.
    pub lines: Vec<u32>,
    /// The constant pool.
    pub constants: Vec<Value>,
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write an opcode to the chunk.
    pub fn write_op(&mut self, op: OpCode, line: u32) {
        self.write_byte(op as u8, line);
    }

    /// Write a raw byte to the chunk.
    pub fn write_byte(&mut self, byte: u8, line: u32) {
        self.code.push(byte);
        self.lines.push(line);
    }

    /// Write a 16-bit value to the chunk (little-endian).
    pub fn write_u16(&mut self, value: u16, line: u32) {
        for byte in value.to_le_bytes() {
            self.write_byte(byte, line);
        }
    }

    pub fn read_byte(&self, offset: usize) -> Result<u8, CompileError> {
        self.code
            .get(offset)
            .copied()
            .ok_or(CompileError::OutOfBounds {
                offset,
                len: self.code.len(),
            })
    }

    /// Decode the opcode at `offset`.
    pub fn read_op(&self, offset: usize) -> Result<OpCode, CompileError> {
        let byte = self.read_byte(offset)?;
        OpCode::from_u8(byte).ok_or(CompileError::UnknownOpcode { byte, offset })
    }

    /// Read a 16-bit value from the chunk at offset (little-endian).
    pub fn read_u16(&self, offset: usize) -> Result<u16, CompileError> {
        let lo = self.read_byte(offset)?;
        let hi = self.read_byte(offset + 1)?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    /// Overwrite a previously written 16-bit value.
    pub fn patch_u16(&mut self, offset: usize, value: u16) -> Result<(), CompileError> {
        if offset + 1 >= self.code.len() {
            return Err(CompileError::OutOfBounds {
                offset: offset + 1,
                len: self.code.len(),
            });
        }
        let [lo, hi] = value.to_le_bytes();
        self.code[offset] = lo;
        self.code[offset + 1] = hi;
        Ok(())
    }

    /// Add a constant to the pool and return its index. Identical constants
    /// share one slot.
    pub fn add_constant(&mut self, value: Value, line: u32) -> Result<u8, CompileError> {
        if let Some(index) = self
            .constants
            .iter()
            .position(|existing| same_constant(existing, &value))
        {
            return Ok(index as u8);
        }
        self.push_constant(value, line)
    }

    /// Append a constant without de-duplication.
    pub fn push_constant(&mut self, value: Value, line: u32) -> Result<u8, CompileError> {
        let index = self.constants.len();
        if index >= MAX_CONSTANTS {
            return Err(CompileError::TooManyConstants(Span::at_line(line as usize)));
        }
        self.constants.push(value);
        Ok(index as u8)
    }

    pub fn constant(&self, index: usize) -> Option<&Value> {
        self.constants.get(index)
    }

    /// Get the current offset in the code.
    pub fn current_offset(&self) -> usize {
        self.code.len()
    }

    /// Get the line number at a given offset, or 0 past the end.
    pub fn get_line(&self, offset: usize) -> u32 {
        self.lines.get(offset).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }
}

/// Pool identity: like `==`, but `0.0` and `-0.0` stay distinct.
fn same_constant(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Double(x), Value::Double(y)) => x.to_bits() == y.to_bits(),
        _ => a == b,
    }
}
