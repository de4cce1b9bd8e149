//! Tree-walking interpreter: evaluates the AST directly, no bytecode.

pub mod environment;
mod executor;

use std::io::{self, Stdout, Write};

use crate::interpreter::environment::Environment;

pub use executor::InterpreterResult;

/// The relic tree-walking interpreter.
///
/// `print` output goes to `W`, stdout by default. Bindings persist across
/// calls, and an error never rolls back bindings committed before it.
pub struct Interpreter<W: Write = Stdout> {
    pub(crate) environment: Environment,
    pub(crate) output: W,
}

impl Interpreter<Stdout> {
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl Default for Interpreter<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Interpreter<W> {
    pub fn with_output(output: W) -> Self {
        Self {
            environment: Environment::new(),
            output,
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }
}
