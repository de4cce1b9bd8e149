//! Instruction set of the generic stack dialect.

/// Opcodes for the generic bytecode virtual machine.
///
/// Operands follow the opcode byte. Constant and global-name indices and
/// local slots are one byte; jump offsets are two bytes, little-endian,
/// measured from the end of the jump instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    // ============ Constants & Stack ============
    /// Load a constant from the constant pool: CONSTANT <index:u8>
    Constant = 0,
    /// Push nil onto the stack
    Nil,
    /// Push true onto the stack
    True,
    /// Push false onto the stack
    False,
    /// Pop the top value from the stack
    Pop,

    // ============ Variables ============
    /// Get a global variable: GET_GLOBAL <name_index:u8>
    GetGlobal,
    /// Set an existing global, leaving the value on the stack: SET_GLOBAL <name_index:u8>
    SetGlobal,
    /// Pop a value into a new global: DEFINE_GLOBAL <name_index:u8>
    DefineGlobal,
    /// Get a block-local variable: GET_LOCAL <slot:u8>
    GetLocal,
    /// Set a block-local variable: SET_LOCAL <slot:u8>
    SetLocal,

    // ============ Comparison ============
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,

    // ============ Arithmetic ============
    Add,
    Subtract,
    Multiply,
    Divide,
    Not,
    Negate,

    // ============ Statements & Control ============
    /// Pop and print the top value
    Print,
    /// Jump forward if the top value is falsey, without popping: JUMP_IF_FALSE <offset:u16>
    JumpIfFalse,
    /// Jump forward if the top value is truthy, without popping: JUMP_IF_TRUE <offset:u16>
    JumpIfTrue,
    /// Stop execution
    Return,
}

impl OpCode {
    const ALL: [OpCode; 26] = [
        OpCode::Constant,
        OpCode::Nil,
        OpCode::True,
        OpCode::False,
        OpCode::Pop,
        OpCode::GetGlobal,
        OpCode::SetGlobal,
        OpCode::DefineGlobal,
        OpCode::GetLocal,
        OpCode::SetLocal,
        OpCode::Equal,
        OpCode::NotEqual,
        OpCode::Less,
        OpCode::LessEqual,
        OpCode::Greater,
        OpCode::GreaterEqual,
        OpCode::Add,
        OpCode::Subtract,
        OpCode::Multiply,
        OpCode::Divide,
        OpCode::Not,
        OpCode::Negate,
        OpCode::Print,
        OpCode::JumpIfFalse,
        OpCode::JumpIfTrue,
        OpCode::Return,
    ];

    /// Convert a byte to an opcode.
    pub fn from_u8(byte: u8) -> Option<OpCode> {
        Self::ALL.get(byte as usize).copied()
    }

    /// Number of operand bytes following the opcode.
    pub fn operand_len(self) -> usize {
        match self {
            OpCode::Constant
            | OpCode::GetGlobal
            | OpCode::SetGlobal
            | OpCode::DefineGlobal
            | OpCode::GetLocal
            | OpCode::SetLocal => 1,
            OpCode::JumpIfFalse | OpCode::JumpIfTrue => 2,
            _ => 0,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            OpCode::Constant => "CONSTANT",
            OpCode::Nil => "NIL",
            OpCode::True => "TRUE",
            OpCode::False => "FALSE",
            OpCode::Pop => "POP",
            OpCode::GetGlobal => "GET_GLOBAL",
            OpCode::SetGlobal => "SET_GLOBAL",
            OpCode::DefineGlobal => "DEFINE_GLOBAL",
            OpCode::GetLocal => "GET_LOCAL",
            OpCode::SetLocal => "SET_LOCAL",
            OpCode::Equal => "EQUAL",
            OpCode::NotEqual => "NOT_EQUAL",
            OpCode::Less => "LESS",
            OpCode::LessEqual => "LESS_EQUAL",
            OpCode::Greater => "GREATER",
            OpCode::GreaterEqual => "GREATER_EQUAL",
            OpCode::Add => "ADD",
            OpCode::Subtract => "SUBTRACT",
            OpCode::Multiply => "MULTIPLY",
            OpCode::Divide => "DIVIDE",
            OpCode::Not => "NOT",
            OpCode::Negate => "NEGATE",
            OpCode::Print => "PRINT",
            OpCode::JumpIfFalse => "JUMP_IF_FALSE",
            OpCode::JumpIfTrue => "JUMP_IF_TRUE",
            OpCode::Return => "RETURN",
        }
    }

    pub fn from_mnemonic(name: &str) -> Option<OpCode> {
        Self::ALL.iter().copied().find(|op| op.mnemonic() == name)
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}
