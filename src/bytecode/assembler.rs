//! Re-encodes a disassembly listing into a chunk.
//!
//! Accepts exactly what [`disassemble_chunk`](super::disassemble_chunk)
//! produces:
//!
//! ```text
//! == name ==
//! ;; constants
//! const[000] = 10
//! ;; code
//! 0000    1 CONSTANT 0 ; 10
//! 0002    | ADD
//! ```
//!
//! Header lines are ignored, `;` starts a comment on code lines and `|` in
//! the line column repeats the previous byte's line.

use crate::bytecode::chunk::Chunk;
use crate::bytecode::instruction::OpCode;
use crate::error::CompileError;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    Constants,
    Code,
}

/// Assemble a listing into a [`Chunk`].
pub fn assemble(source: &str) -> Result<Chunk, CompileError> {
    let mut chunk = Chunk::new();
    let mut section = Section::Preamble;

    for (idx, raw_line) in source.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with("==") {
            continue;
        }

        if let Some(marker) = line.strip_prefix(";;") {
            section = match marker.trim() {
                "constants" => Section::Constants,
                "code" => Section::Code,
                other => {
                    return Err(CompileError::assembly(
                        line_no,
                        format!("unknown section `{}`", other),
                    ))
                }
            };
            continue;
        }

        match section {
            Section::Constants => assemble_constant(&mut chunk, line, line_no)?,
            Section::Code => assemble_instruction(&mut chunk, line, line_no)?,
            Section::Preamble => {
                return Err(CompileError::assembly(line_no, "content before any section"));
            }
        }
    }

    Ok(chunk)
}

fn assemble_constant(chunk: &mut Chunk, line: &str, line_no: usize) -> Result<(), CompileError> {
    let (slot, literal) = line
        .split_once('=')
        .ok_or_else(|| CompileError::assembly(line_no, "expected `const[NNN] = value`"))?;

    let index = slot
        .trim()
        .strip_prefix("const[")
        .and_then(|rest| rest.strip_suffix(']'))
        .and_then(|digits| digits.parse::<usize>().ok())
        .ok_or_else(|| CompileError::assembly(line_no, format!("bad constant slot `{}`", slot.trim())))?;

    if index != chunk.constants.len() {
        return Err(CompileError::assembly(
            line_no,
            format!("constant {} listed out of order", index),
        ));
    }

    let value = parse_literal(literal.trim())
        .ok_or_else(|| CompileError::assembly(line_no, format!("bad literal `{}`", literal.trim())))?;
    chunk
        .push_constant(value, line_no as u32)
        .map_err(|_| CompileError::assembly(line_no, "constant pool is full"))?;
    Ok(())
}

fn assemble_instruction(chunk: &mut Chunk, line: &str, line_no: usize) -> Result<(), CompileError> {
    let code = match line.split_once(';') {
        Some((code, _comment)) => code,
        None => line,
    };
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

    let source_line = match fields.next() {
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

    let mnemonic = fields
        .next()
        .ok_or_else(|| CompileError::assembly(line_no, "missing mnemonic"))?;

    if mnemonic == "DB" {
        let byte = fields
            .next()
            .and_then(parse_hex_byte)
            .ok_or_else(|| CompileError::assembly(line_no, "DB expects a byte like 0x2A"))?;
        chunk.write_byte(byte, source_line);
        return expect_end(fields, line_no);
    }

    let op = OpCode::from_mnemonic(mnemonic)
        .ok_or_else(|| CompileError::assembly(line_no, format!("unknown mnemonic `{}`", mnemonic)))?;
    chunk.write_op(op, source_line);

    match op.operand_len() {
        0 => {}
        1 => {
            let operand = fields
                .next()
                .and_then(|field| field.parse::<u8>().ok())
                .ok_or_else(|| CompileError::assembly(line_no, format!("{} expects a byte operand", op)))?;
            chunk.write_byte(operand, source_line);
        }
        _ => {
            let operand = fields
                .next()
                .and_then(|field| field.parse::<u16>().ok())
                .ok_or_else(|| CompileError::assembly(line_no, format!("{} expects a 16-bit operand", op)))?;
            chunk.write_u16(operand, source_line);
        }
    }

    expect_end(fields, line_no)
}

fn expect_end<'a>(mut fields: impl Iterator<Item = &'a str>, line_no: usize) -> Result<(), CompileError> {
    match fields.next() {
        Some(extra) => Err(CompileError::assembly(
            line_no,
            format!("unexpected `{}`", extra),
        )),
        None => Ok(()),
    }
}

fn parse_hex_byte(field: &str) -> Option<u8> {
    let digits = field.strip_prefix("0x").or_else(|| field.strip_prefix("0X"))?;
    u8::from_str_radix(digits, 16).ok()
}

/// Parse a literal written by [`Value::to_literal`].
pub(crate) fn parse_literal(input: &str) -> Option<Value> {
    match input {
        "nil" => return Some(Value::Nil),
        "true" => return Some(Value::Bool(true)),
        "false" => return Some(Value::Bool(false)),
        _ => {}
    }

    if input.starts_with('"') {
        return parse_string_literal(input).map(Value::String);
    }

    if let Ok(n) = input.parse::<i64>() {
        return Some(Value::Int(n));
    }
    input.parse::<f64>().ok().map(Value::Double)
}

fn parse_string_literal(input: &str) -> Option<String> {
    let body = input.strip_prefix('"')?.strip_suffix('"')?;

    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = match chars.next()? {
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            '"' => '"',
            '\\' => '\\',
            _ => return None,
        };
        out.push(escaped);
    }

    Some(out)
}
