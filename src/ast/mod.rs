//! Abstract Syntax Tree for relic.

pub mod expr;
pub mod printer;
pub mod stmt;

pub use expr::{BinaryOp, Expr, ExprKind, LogicalOp, UnaryOp};
pub use printer::{print_expr, print_program, print_stmt};
pub use stmt::{Program, Stmt, StmtKind};
