//! Opcode tables of the legacy micro-encoded dialect.

use std::fmt;

/// Terminates the sub-operation stream of one expression instruction.
pub const END: u8 = 0xFF;

/// Highest variable number an expression instruction can encode.
pub const MAX_VARIABLE: u16 = u16::MAX;

/// Engine generations the legacy encoding is emitted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EngineVersion {
    V3,
    V4,
    #[default]
    V5,
}

impl EngineVersion {
    pub const ALL: [EngineVersion; 3] = [EngineVersion::V3, EngineVersion::V4, EngineVersion::V5];

    pub fn number(self) -> u8 {
        match self {
            EngineVersion::V3 => 3,
            EngineVersion::V4 => 4,
            EngineVersion::V5 => 5,
        }
    }

    pub fn from_number(number: u8) -> Option<EngineVersion> {
        Self::ALL.iter().copied().find(|v| v.number() == number)
    }

    /// Build the opcode table for this version.
    pub fn opcode_table(self) -> OpcodeTable {
        OpcodeTable::new(self)
    }
}

impl fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.number())
    }
}

/// Outer opcode assignments for one engine version.
///
/// Built once and passed by reference to whatever needs it; nothing reads a
/// process-wide table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeTable {
    version: EngineVersion,
    expression: u8,
}

impl OpcodeTable {
    pub fn new(version: EngineVersion) -> Self {
        let expression = match version {
            EngineVersion::V3 | EngineVersion::V4 | EngineVersion::V5 => 0xAC,
        };
        Self {
            version,
            expression,
        }
    }

    pub fn version(&self) -> EngineVersion {
        self.version
    }

    /// Byte introducing a micro-encoded expression.
    pub fn expression(&self) -> u8 {
        self.expression
    }
}

/// Operations inside an expression's sub-operation stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SubOp {
    /// Push a signed 16-bit literal: PUSH <word:i16 LE>
    Push = 0x01,
    Add = 0x02,
    Subtract = 0x03,
    Multiply = 0x04,
    Divide = 0x05,
}

impl SubOp {
    pub const ALL: [SubOp; 5] = [
        SubOp::Push,
        SubOp::Add,
        SubOp::Subtract,
        SubOp::Multiply,
        SubOp::Divide,
    ];

    pub fn from_u8(byte: u8) -> Option<SubOp> {
        Self::ALL.iter().copied().find(|op| *op as u8 == byte)
    }

    pub fn operand_len(self) -> usize {
        match self {
            SubOp::Push => 2,
            _ => 0,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            SubOp::Push => "PUSH",
            SubOp::Add => "ADD",
            SubOp::Subtract => "SUBTRACT",
            SubOp::Multiply => "MULTIPLY",
            SubOp::Divide => "DIVIDE",
        }
    }

    pub fn from_mnemonic(name: &str) -> Option<SubOp> {
        Self::ALL.iter().copied().find(|op| op.mnemonic() == name)
    }
}

impl fmt::Display for SubOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expression_opcode_per_version() {
        for version in EngineVersion::ALL {
            let table = version.opcode_table();
            assert_eq!(table.expression(), 0xAC);
            assert_eq!(table.version(), version);
            assert_eq!(EngineVersion::from_number(version.number()), Some(version));
        }
        assert_eq!(EngineVersion::from_number(6), None);
        assert_eq!(EngineVersion::V4.to_string(), "v4");
    }

    #[test]
    fn test_sub_op_bytes() {
        assert_eq!(SubOp::from_u8(0x01), Some(SubOp::Push));
        assert_eq!(SubOp::from_u8(0x05), Some(SubOp::Divide));
        assert_eq!(SubOp::from_u8(0x00), None);
        assert_eq!(SubOp::from_u8(0x06), None);
        assert_eq!(SubOp::from_u8(END), None);
        assert_eq!(SubOp::from_mnemonic("MULTIPLY"), Some(SubOp::Multiply));
    }
}
