//! Error types for all compilation and execution phases.

use colored::Colorize;
use thiserror::Error;

use crate::span::Span;

/// Scanner errors.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Unexpected character '{0}' at {1}")]
    UnexpectedChar(char, Span),

    #[error("Unterminated string at {0}")]
    UnterminatedString(Span),

    #[error("Invalid number '{0}' at {1}")]
    InvalidNumber(String, Span),
}

impl ScanError {
    pub fn unexpected_char(c: char, span: Span) -> Self {
        Self::UnexpectedChar(c, span)
    }

    pub fn unterminated_string(span: Span) -> Self {
        Self::UnterminatedString(span)
    }

    pub fn invalid_number(s: String, span: Span) -> Self {
        Self::InvalidNumber(s, span)
    }

    pub fn span(&self) -> Span {
        match self {
            Self::UnexpectedChar(_, span) => *span,
            Self::UnterminatedString(span) => *span,
            Self::InvalidNumber(_, span) => *span,
        }
    }

    pub fn line(&self) -> usize {
        self.span().line
    }
}

/// Parser errors. Each one is tied to the token where it was detected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Expected expression, found '{found}' at {span}")]
    ExpectedExpression { found: String, span: Span },

    #[error("Expected ')' after expression at {0}")]
    ExpectedClosingParen(Span),

    #[error("Expected '}}' after block at {0}")]
    ExpectedClosingBrace(Span),

    #[error("Expected ';' after {after} at {span}")]
    ExpectedSemicolon { after: String, span: Span },

    #[error("Expected variable name at {0}")]
    ExpectedVariableName(Span),

    #[error("Invalid assignment target at {0}")]
    InvalidAssignment(Span),

    #[error("Unexpected token '{found}' after expression at {span}")]
    UnexpectedToken { found: String, span: Span },

    #[error("Nesting too deep at {0}")]
    TooDeep(Span),
}

impl ParseError {
    pub fn expected_expression(found: impl Into<String>, span: Span) -> Self {
        Self::ExpectedExpression {
            found: found.into(),
            span,
        }
    }

    pub fn expected_semicolon(after: impl Into<String>, span: Span) -> Self {
        Self::ExpectedSemicolon {
            after: after.into(),
            span,
        }
    }

    pub fn unexpected_token(found: impl Into<String>, span: Span) -> Self {
        Self::UnexpectedToken {
            found: found.into(),
            span,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::ExpectedExpression { span, .. } => *span,
            Self::ExpectedClosingParen(span) => *span,
            Self::ExpectedClosingBrace(span) => *span,
            Self::ExpectedSemicolon { span, .. } => *span,
            Self::ExpectedVariableName(span) => *span,
            Self::InvalidAssignment(span) => *span,
            Self::UnexpectedToken { span, .. } => *span,
            Self::TooDeep(span) => *span,
        }
    }

    pub fn line(&self) -> usize {
        self.span().line
    }
}

/// Name-resolution errors shared by the interpreter and the generic VM.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("Undefined variable '{0}' at {1}")]
    UndefinedVariable(String, Span),
}

impl RuntimeError {
    pub fn undefined_variable(name: impl Into<String>, span: Span) -> Self {
        Self::UndefinedVariable(name.into(), span)
    }

    pub fn span(&self) -> Span {
        match self {
            Self::UndefinedVariable(_, span) => *span,
        }
    }
}

/// Tree-walking interpreter errors.
#[derive(Debug, Error)]
pub enum InterpreterError {
    #[error("Unsupported operands for '{operator}': {left} and {right} at {span}")]
    UnsupportedOperands {
        operator: String,
        left: &'static str,
        right: &'static str,
        span: Span,
    },

    #[error("Type mismatch: {message} at {span}")]
    TypeMismatch { message: String, span: Span },

    #[error("Division by zero at {0}")]
    DivisionByZero(Span),

    #[error("Integer overflow at {0}")]
    IntegerOverflow(Span),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}

impl InterpreterError {
    pub fn unsupported_operands(
        operator: impl Into<String>,
        left: &'static str,
        right: &'static str,
        span: Span,
    ) -> Self {
        Self::UnsupportedOperands {
            operator: operator.into(),
            left,
            right,
            span,
        }
    }

    pub fn type_mismatch(message: impl Into<String>, span: Span) -> Self {
        Self::TypeMismatch {
            message: message.into(),
            span,
        }
    }

    pub fn division_by_zero(span: Span) -> Self {
        Self::DivisionByZero(span)
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::UnsupportedOperands { span, .. } => Some(*span),
            Self::TypeMismatch { span, .. } => Some(*span),
            Self::DivisionByZero(span) => Some(*span),
            Self::IntegerOverflow(span) => Some(*span),
            Self::Runtime(err) => Some(err.span()),
            Self::Io(_) => None,
        }
    }
}

/// Code generation, chunk access and assembly errors.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Unknown opcode 0x{byte:02x} at offset {offset}")]
    UnknownOpcode { byte: u8, offset: usize },

    #[error("Too many constants in one chunk at {0}")]
    TooManyConstants(Span),

    #[error("Too many local variables in one chunk at {0}")]
    TooManyLocals(Span),

    #[error("Too many variables for the legacy variable table at {0}")]
    TooManyVariables(Span),

    #[error("Undefined variable '{0}' at {1}")]
    UndefinedVariable(String, Span),

    #[error("Chunk access out of bounds: offset {offset}, length {len}")]
    OutOfBounds { offset: usize, len: usize },

    #[error("Malformed legacy expression at offset {offset}: {message}")]
    MalformedLegacy { offset: usize, message: String },

    #[error("{construct} is not supported by the legacy dialect at {span}")]
    UnsupportedInLegacy { construct: String, span: Span },

    #[error("Literal {value} does not fit a legacy word at {span}")]
    LiteralOutOfRange { value: i64, span: Span },

    #[error("Jump too large at {0}")]
    JumpTooLarge(Span),

    #[error("Assembly error on line {line}: {message}")]
    Assembly { line: usize, message: String },
}

impl CompileError {
    pub fn unsupported_in_legacy(construct: impl Into<String>, span: Span) -> Self {
        Self::UnsupportedInLegacy {
            construct: construct.into(),
            span,
        }
    }

    pub fn malformed_legacy(offset: usize, message: impl Into<String>) -> Self {
        Self::MalformedLegacy {
            offset,
            message: message.into(),
        }
    }

    pub fn assembly(line: usize, message: impl Into<String>) -> Self {
        Self::Assembly {
            line,
            message: message.into(),
        }
    }

    /// Source line, for errors raised while lowering an AST node.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::TooManyConstants(span)
            | Self::TooManyLocals(span)
            | Self::TooManyVariables(span)
            | Self::UndefinedVariable(_, span)
            | Self::JumpTooLarge(span) => Some(span.line),
            Self::UnsupportedInLegacy { span, .. } | Self::LiteralOutOfRange { span, .. } => {
                Some(span.line)
            }
            Self::UnknownOpcode { .. }
            | Self::OutOfBounds { .. }
            | Self::MalformedLegacy { .. }
            | Self::Assembly { .. } => None,
        }
    }
}

/// Virtual machine errors. Lines come from the chunk's line table.
#[derive(Debug, Error)]
pub enum VmError {
    #[error("Stack overflow (capacity {capacity}) on line {line}")]
    StackOverflow { capacity: usize, line: usize },

    #[error("Stack underflow on line {line}")]
    StackUnderflow { line: usize },

    #[error("Division by zero on line {line}")]
    DivisionByZero { line: usize },

    #[error("Unknown opcode 0x{byte:02x} at offset {offset}")]
    UnknownOpcode { byte: u8, offset: usize },

    #[error("Invalid constant index {index} on line {line}")]
    InvalidConstant { index: usize, line: usize },

    #[error("Truncated instruction at offset {offset}")]
    TruncatedInstruction { offset: usize },

    #[error("Jump to offset {target} outside the chunk")]
    InvalidJump { target: usize },

    #[error("Unsupported operands for '{operator}': {left} and {right} on line {line}")]
    UnsupportedOperands {
        operator: &'static str,
        left: &'static str,
        right: &'static str,
        line: usize,
    },

    #[error("Type mismatch: {message} on line {line}")]
    TypeMismatch { message: String, line: usize },

    #[error("Integer overflow on line {line}")]
    IntegerOverflow { line: usize },

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}

impl VmError {
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::StackOverflow { line, .. }
            | Self::StackUnderflow { line }
            | Self::DivisionByZero { line }
            | Self::InvalidConstant { line, .. }
            | Self::UnsupportedOperands { line, .. }
            | Self::TypeMismatch { line, .. }
            | Self::IntegerOverflow { line } => Some(*line),
            Self::Runtime(err) => Some(err.span().line),
            Self::UnknownOpcode { .. }
            | Self::TruncatedInstruction { .. }
            | Self::InvalidJump { .. }
            | Self::Io(_) => None,
        }
    }
}

/// A unified error type for all phases.
#[derive(Debug, Error)]
pub enum RelicError {
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("Parse error: {}", join_parse_errors(.0))]
    Parse(Vec<ParseError>),

    #[error("Runtime error: {0}")]
    Interpreter(#[from] InterpreterError),

    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("VM error: {0}")]
    Vm(#[from] VmError),
}

impl From<Vec<ParseError>> for RelicError {
    fn from(errors: Vec<ParseError>) -> Self {
        Self::Parse(errors)
    }
}

impl From<ParseError> for RelicError {
    fn from(err: ParseError) -> Self {
        Self::Parse(vec![err])
    }
}

fn join_parse_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl RelicError {
    /// Lines this error points at, in reporting order.
    pub fn lines(&self) -> Vec<usize> {
        match self {
            Self::Scan(err) => vec![err.line()],
            Self::Parse(errors) => errors.iter().map(|e| e.line()).collect(),
            Self::Interpreter(err) => err.span().map(|s| s.line).into_iter().collect(),
            Self::Compile(err) => err.line().into_iter().collect(),
            Self::Vm(err) => err.line().into_iter().collect(),
        }
    }
}

/// Render a diagnostic with the offending source lines underneath.
pub fn render(err: &RelicError, source: &str) -> String {
    let mut out = String::new();
    let messages: Vec<String> = match err {
        RelicError::Parse(errors) => errors.iter().map(|e| e.to_string()).collect(),
        other => vec![other.to_string()],
    };
    let lines = err.lines();

    for (i, message) in messages.iter().enumerate() {
        out.push_str(&format!("{} {}\n", "error:".red().bold(), message));
        let Some(&line) = lines.get(i) else {
            continue;
        };
        if let Some(text) = source.lines().nth(line.saturating_sub(1)) {
            let gutter = format!("{:>4} |", line);
            out.push_str(&format!("{} {}\n", gutter.blue(), text));
        }
    }

    out
}
