//! Generic stack bytecode: chunk container, compiler, virtual machine and
//! listing tools.
//!
//! # Architecture
//!
//! - `instruction`: OpCode definitions for the bytecode instruction set
//! - `chunk`: Bytecode chunks with a per-byte line table and a constant pool,
//!   shared with the legacy dialect
//! - `compiler`: Transforms AST into bytecode
//! - `vm`: Stack-based virtual machine for executing bytecode
//! - `disassembler` / `assembler`: Listing output and its exact inverse

pub mod assembler;
pub mod chunk;
pub mod compiler;
pub mod disassembler;
pub mod instruction;
pub mod vm;

pub use assembler::assemble;
pub use chunk::{Chunk, MAX_CONSTANTS};
pub use compiler::Compiler;
pub use disassembler::{disassemble_chunk, disassemble_instruction};
pub use instruction::OpCode;
pub use vm::{Vm, VmConfig, VmState};
