//! Bytecode disassembler for debugging.
//!
//! The listing is also the input format of [`crate::bytecode::assemble`], so
//! every byte of the chunk appears in it exactly once.

use crate::bytecode::chunk::Chunk;
use crate::bytecode::instruction::OpCode;
use crate::error::CompileError;

/// Disassemble a chunk into a human-readable listing.
pub fn disassemble_chunk(chunk: &Chunk, name: &str) -> String {
    let mut output = format!("== {} ==\n", name);

    output.push_str(";; constants\n");
    for (index, constant) in chunk.constants.iter().enumerate() {
        output.push_str(&format!("const[{:03}] = {}\n", index, constant.to_literal()));
    }

    output.push_str(";; code\n");
    let mut offset = 0;
    while offset < chunk.code.len() {
        let (text, next) = disassemble_instruction(chunk, offset);
        output.push_str(&text);
        output.push('\n');
        offset = next;
    }

    output
}

/// Disassemble a single instruction. Returns the line of text and the offset
/// of the next instruction.
pub fn disassemble_instruction(chunk: &Chunk, offset: usize) -> (String, usize) {
    let mut text = format!("{:04} ", offset);

    // Print line number (or | if same as previous)
    let line = chunk.get_line(offset);
    if offset > 0 && line == chunk.get_line(offset - 1) {
        text.push_str("   | ");
    } else {
        text.push_str(&format!("{:4} ", line));
    }

    let opcode = match chunk.read_op(offset) {
        Ok(op) => op,
        Err(CompileError::UnknownOpcode { byte, .. }) => {
            text.push_str(&format!("DB 0x{:02X} ; unknown opcode", byte));
            return (text, offset + 1);
        }
        Err(_) => {
            text.push_str("; end of chunk");
            return (text, offset + 1);
        }
    };
    let byte = opcode as u8;

    let operand_len = opcode.operand_len();
    if offset + operand_len >= chunk.code.len() {
        text.push_str(&format!("DB 0x{:02X} ; truncated {}", byte, opcode));
        return (text, offset + 1);
    }

    match opcode {
        OpCode::Constant => {
            let index = chunk.code[offset + 1];
            text.push_str(&format!("{} {}", opcode, index));
            if let Some(value) = chunk.constant(index as usize) {
                text.push_str(&format!(" ; {}", value.to_literal()));
            }
        }

        OpCode::GetGlobal | OpCode::SetGlobal | OpCode::DefineGlobal => {
            let index = chunk.code[offset + 1];
            text.push_str(&format!("{} {}", opcode, index));
            if let Some(name) = chunk.constant(index as usize) {
                text.push_str(&format!(" ; {}", name.to_literal()));
            }
        }

        OpCode::GetLocal | OpCode::SetLocal => {
            text.push_str(&format!("{} {}", opcode, chunk.code[offset + 1]));
        }

        OpCode::JumpIfFalse | OpCode::JumpIfTrue => {
            let distance = u16::from_le_bytes([chunk.code[offset + 1], chunk.code[offset + 2]]);
            let target = offset + 3 + distance as usize;
            text.push_str(&format!("{} {} ; -> {:04}", opcode, distance, target));
        }

        _ => text.push_str(opcode.mnemonic()),
    }

    (text, offset + 1 + operand_len)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::value::Value;

    #[test]
    fn test_listing_layout() {
        let mut chunk = Chunk::new();
        let ten = chunk.add_constant(Value::Int(10), 1).unwrap();
        let twenty = chunk.add_constant(Value::Int(20), 1).unwrap();
        chunk.write_op(OpCode::Constant, 1);
        chunk.write_byte(ten, 1);
        chunk.write_op(OpCode::Constant, 1);
        chunk.write_byte(twenty, 1);
        chunk.write_op(OpCode::Add, 1);
        chunk.write_op(OpCode::Print, 2);

        let expected = "\
== test ==
;; constants
const[000] = 10
const[001] = 20
;; code
0000    1 CONSTANT 0 ; 10
0002    | CONSTANT 1 ; 20
0004    | ADD
0005    2 PRINT
";
        assert_eq!(disassemble_chunk(&chunk, "test"), expected);
    }

    #[test]
    fn test_unknown_and_truncated_bytes() {
        let mut chunk = Chunk::new();
        chunk.write_byte(0xEE, 1);
        chunk.write_op(OpCode::JumpIfFalse, 1);
        chunk.write_byte(0, 1);

        let listing = disassemble_chunk(&chunk, "bad");
        assert!(listing.contains("0000    1 DB 0xEE ; unknown opcode"));
        assert!(listing.contains("0001    | DB 0x17 ; truncated JUMP_IF_FALSE"));
        assert!(listing.contains("0002    | DB 0x00 ; truncated CONSTANT"));
        assert_eq!(disassemble_instruction(&chunk, 3).0, "0003    0 ; end of chunk");
    }

    #[test]
    fn test_jump_target() {
        let mut chunk = Chunk::new();
        chunk.write_op(OpCode::True, 1);
        chunk.write_op(OpCode::JumpIfTrue, 1);
        chunk.write_u16(1, 1);
        chunk.write_op(OpCode::Pop, 1);
        chunk.write_op(OpCode::False, 1);

        let (text, next) = disassemble_instruction(&chunk, 1);
        assert_eq!(text, "0001    | JUMP_IF_TRUE 1 ; -> 0005");
        assert_eq!(next, 4);
    }
}
