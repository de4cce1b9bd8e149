//! Parser module for relic.

mod core;
mod expressions;
mod precedence;
mod statements;


pub use self::core::{ParseOutput, Parser, MAX_NESTING};
pub use self::precedence::Precedence;
