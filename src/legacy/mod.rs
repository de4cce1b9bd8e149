//! The legacy micro-encoded expression dialect.
//!
//! A whole arithmetic expression is packed into one outer instruction:
//! `[expression][var:u16 LE]`, a stream of sub-operations, then `0xFF`.
//! The outer opcode byte depends on the engine version and is looked up in
//! an [`OpcodeTable`] built for that version.

pub mod assembler;
pub mod compiler;
pub mod disassembler;
pub mod opcode;
pub mod vm;

pub use assembler::assemble;
pub use compiler::LegacyCompiler;
pub use disassembler::{disassemble, disassemble_instruction};
pub use opcode::{EngineVersion, OpcodeTable, SubOp, END, MAX_VARIABLE};
pub use vm::LegacyVm;
