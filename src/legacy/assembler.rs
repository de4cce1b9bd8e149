//! Re-encodes a legacy listing produced by [`disassemble`](super::disassemble).
//!
//! Outer lines start with an offset. Indented lines belong to the expression
//! opened above them and share its source line.

use crate::bytecode::chunk::Chunk;
use crate::error::CompileError;
use crate::legacy::opcode::{OpcodeTable, SubOp, END};

pub fn assemble(source: &str, table: &OpcodeTable) -> Result<Chunk, CompileError> {
    let mut chunk = Chunk::new();
    // Line of the expression whose sub-operations are being read.
    let mut open: Option<u32> = None;

    for (idx, raw_line) in source.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = raw_line.trim();
        if trimmed.is_empty() || trimmed.starts_with("==") || trimmed.starts_with(';') {
            continue;
        }

        let code = match trimmed.split_once(';') {
            Some((code, _comment)) => code.trim(),
            None => trimmed,
        };

        if raw_line.starts_with(char::is_whitespace) {
            let line = open.ok_or_else(|| {
                CompileError::assembly(line_no, "sub-operation outside an expression")
            })?;
            assemble_sub_op(&mut chunk, code, line, line_no)?;
        } else {
            open = assemble_outer(&mut chunk, table, code, line_no)?;
        }
    }

    Ok(chunk)
}

/// Returns the source line when the instruction opens an expression.
fn assemble_outer(
    chunk: &mut Chunk,
    table: &OpcodeTable,
    code: &str,
    line_no: usize,
) -> Result<Option<u32>, CompileError> {
    let mut fields = code.split_whitespace();

    let offset = fields
        .next()
        .and_then(|field| field.parse::<usize>().ok())
        .ok_or_else(|| CompileError::assembly(line_no, "missing offset"))?;
    if offset != chunk.current_offset() {
        return Err(CompileError::assembly(
            line_no,
            format!("offset {:04} does not follow {:04}", offset, chunk.current_offset()),
        ));
    }

    let line = match fields.next() {
        Some("|") => chunk
            .lines
            .last()
            .copied()
            .ok_or_else(|| CompileError::assembly(line_no, "`|` on the first instruction"))?,
        Some(field) => field
            .parse::<u32>()
            .map_err(|_| CompileError::assembly(line_no, format!("bad line number `{}`", field)))?,
        None => return Err(CompileError::assembly(line_no, "missing line number")),
    };

    match (fields.next(), fields.next(), fields.next()) {
        (Some("DB"), Some(byte), None) => {
            chunk.write_byte(parse_hex_byte(byte, line_no)?, line);
            Ok(None)
        }
        (Some("EXPRESSION"), Some(operand), None) => {
            let var = operand
                .strip_prefix("var=")
                .and_then(|digits| digits.parse::<u16>().ok())
                .ok_or_else(|| CompileError::assembly(line_no, format!("bad variable `{}`", operand)))?;
            chunk.write_byte(table.expression(), line);
            chunk.write_u16(var, line);
            Ok(Some(line))
        }
        _ => Err(CompileError::assembly(
            line_no,
            format!("cannot assemble `{}`", code),
        )),
    }
}

fn assemble_sub_op(chunk: &mut Chunk, code: &str, line: u32, line_no: usize) -> Result<(), CompileError> {
    let mut fields = code.split_whitespace();
    let mnemonic = fields.next().unwrap_or_default();

    match (mnemonic, fields.next(), fields.next()) {
        ("END", None, None) => chunk.write_byte(END, line),
        ("DB", Some(byte), None) => chunk.write_byte(parse_hex_byte(byte, line_no)?, line),
        ("PUSH", Some(word), None) => {
            let word = word
                .parse::<i16>()
                .map_err(|_| CompileError::assembly(line_no, format!("PUSH expects a 16-bit word, got `{}`", word)))?;
            chunk.write_byte(SubOp::Push as u8, line);
            chunk.write_u16(word as u16, line);
        }
        (name, None, None) => match SubOp::from_mnemonic(name) {
            Some(op) if op.operand_len() == 0 => chunk.write_byte(op as u8, line),
            Some(op) => {
                return Err(CompileError::assembly(
                    line_no,
                    format!("{} expects an operand", op.mnemonic()),
                ))
            }
            None => {
                return Err(CompileError::malformed_legacy(
                    chunk.current_offset(),
                    format!("unknown sub-operation `{}` on listing line {}", name, line_no),
                ))
            }
        },
        _ => {
            return Err(CompileError::assembly(
                line_no,
                format!("cannot assemble `{}`", code),
            ))
        }
    }

    Ok(())
}

fn parse_hex_byte(field: &str, line_no: usize) -> Result<u8, CompileError> {
    field
        .strip_prefix("0x")
        .and_then(|digits| u8::from_str_radix(digits, 16).ok())
        .ok_or_else(|| CompileError::assembly(line_no, format!("bad byte `{}`", field)))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::legacy::disassemble;
    use crate::legacy::opcode::EngineVersion;

    #[test]
    fn test_assemble_listing() {
        let listing = "\
== sum (v5) ==
0000    4 EXPRESSION var=2
  PUSH 10
  PUSH -1
  MULTIPLY
  END
";
        let table = EngineVersion::V5.opcode_table();
        let chunk = assemble(listing, &table).unwrap();
        assert_eq!(
            chunk.code,
            vec![0xAC, 0x02, 0x00, 0x01, 0x0A, 0x00, 0x01, 0xFF, 0xFF, 0x04, 0xFF]
        );
        assert_eq!(chunk.lines, vec![4; 11]);
    }

    #[test]
    fn test_round_trip_with_malformed_bytes() {
        let mut chunk = Chunk::new();
        for byte in [0xAC, 0x00, 0x00, 0x01, 0x07, 0x00, 0x09, 0xFF] {
            chunk.write_byte(byte, 1);
        }
        for byte in [0x10, 0xAC, 0x05, 0x00, 0x01, 0x02] {
            chunk.write_byte(byte, 6);
        }

        let table = EngineVersion::V4.opcode_table();
        let listing = disassemble(&chunk, &table, "odd");
        assert_eq!(assemble(&listing, &table).unwrap(), chunk);
    }

    #[test]
    fn test_rejects_orphan_sub_op() {
        let table = EngineVersion::V5.opcode_table();
        let err = assemble("  ADD\n", &table).unwrap_err();
        assert!(matches!(err, CompileError::Assembly { line: 1, .. }));
    }

    #[test]
    fn test_rejects_out_of_range_push() {
        let table = EngineVersion::V5.opcode_table();
        let err = assemble("0000    1 EXPRESSION var=0\n  PUSH 40000\n", &table).unwrap_err();
        assert!(matches!(err, CompileError::Assembly { line: 2, .. }));
    }

    #[test]
    fn test_unknown_sub_operation_is_malformed() {
        let table = EngineVersion::V5.opcode_table();
        let listing = "0000    1 EXPRESSION var=0\n  PUSH 2\n  MODULO\n  END\n";
        let err = assemble(listing, &table).unwrap_err();
        assert!(matches!(
            err,
            CompileError::MalformedLegacy { offset: 6, ref message } if message.contains("MODULO")
        ));

        let err = assemble("0000    1 EXPRESSION var=0\n  PUSH\n", &table).unwrap_err();
        assert!(matches!(err, CompileError::Assembly { line: 2, .. }));
    }
}
