//! Listing output for legacy chunks.
//!
//! ```text
//! == name (v5) ==
//! 0000    1 EXPRESSION var=0
//!   PUSH 10
//!   PUSH 20
//!   ADD
//!   END
//! ```
//!
//! Bytes that do not decode are listed as `DB 0xNN` so the listing still
//! covers the whole chunk.

use crate::bytecode::chunk::Chunk;
use crate::legacy::opcode::{OpcodeTable, SubOp, END};

pub fn disassemble(chunk: &Chunk, table: &OpcodeTable, name: &str) -> String {
    let mut output = format!("== {} ({}) ==\n", name, table.version());

    let mut offset = 0;
    while offset < chunk.code.len() {
        let (text, next) = disassemble_instruction(chunk, table, offset);
        output.push_str(&text);
        output.push('\n');
        offset = next;
    }

    output
}

/// Disassemble the outer instruction at `offset`, sub-operations included.
/// Returns the text and the offset of the next outer instruction.
pub fn disassemble_instruction(chunk: &Chunk, table: &OpcodeTable, offset: usize) -> (String, usize) {
    let mut text = format!("{:04} ", offset);

    let line = chunk.get_line(offset);
    if offset > 0 && line == chunk.get_line(offset - 1) {
        text.push_str("   | ");
    } else {
        text.push_str(&format!("{:4} ", line));
    }

    let byte = chunk.code[offset];
    if byte != table.expression() {
        text.push_str(&format!("DB 0x{:02X} ; unknown opcode", byte));
        return (text, offset + 1);
    }
    if offset + 2 >= chunk.code.len() {
        text.push_str(&format!("DB 0x{:02X} ; truncated EXPRESSION", byte));
        return (text, offset + 1);
    }

    let var = u16::from_le_bytes([chunk.code[offset + 1], chunk.code[offset + 2]]);
    text.push_str(&format!("EXPRESSION var={}", var));

    let mut ip = offset + 3;
    loop {
        let Some(&byte) = chunk.code.get(ip) else {
            text.push_str("\n  ; missing END");
            return (text, ip);
        };

        if byte == END {
            text.push_str("\n  END");
            return (text, ip + 1);
        }

        match SubOp::from_u8(byte) {
            Some(SubOp::Push) if ip + 2 < chunk.code.len() => {
                let word = i16::from_le_bytes([chunk.code[ip + 1], chunk.code[ip + 2]]);
                text.push_str(&format!("\n  PUSH {}", word));
                ip += 3;
            }
            Some(SubOp::Push) => {
                text.push_str(&format!("\n  DB 0x{:02X} ; truncated PUSH", byte));
                ip += 1;
            }
            Some(op) => {
                text.push_str(&format!("\n  {}", op));
                ip += 1;
            }
            None => {
                text.push_str(&format!("\n  DB 0x{:02X} ; unknown sub-op", byte));
                ip += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::legacy::opcode::EngineVersion;

    #[test]
    fn test_listing() {
        let mut chunk = Chunk::new();
        for byte in [0xAC, 0x00, 0x00, 0x01, 0x0A, 0x00, 0x01, 0xEC, 0xFF, 0x02, 0xFF] {
            chunk.write_byte(byte, 1);
        }
        for byte in [0xAC, 0x01, 0x00, 0x01, 0x02, 0x00, 0xFF] {
            chunk.write_byte(byte, 2);
        }

        let expected = "\
== sum (v5) ==
0000    1 EXPRESSION var=0
  PUSH 10
  PUSH -20
  ADD
  END
0011    2 EXPRESSION var=1
  PUSH 2
  END
";
        let table = EngineVersion::V5.opcode_table();
        assert_eq!(disassemble(&chunk, &table, "sum"), expected);
    }

    #[test]
    fn test_malformed_bytes() {
        let mut chunk = Chunk::new();
        for byte in [0x42, 0xAC, 0x03, 0x00, 0x07, 0x01, 0x05] {
            chunk.write_byte(byte, 3);
        }

        let table = EngineVersion::V3.opcode_table();
        let listing = disassemble(&chunk, &table, "bad");
        assert_eq!(
            listing,
            "\
== bad (v3) ==
0000    3 DB 0x42 ; unknown opcode
0001    | EXPRESSION var=3
  DB 0x07 ; unknown sub-op
  DB 0x01 ; truncated PUSH
  DIVIDE
  ; missing END
"
        );
    }
}
