//! Parenthesized prefix rendering of the AST, for debugging and tests.

use crate::ast::expr::{Expr, ExprKind};
use crate::ast::stmt::{Program, Stmt, StmtKind};

/// Render an expression as an s-expression, e.g. `(+ 1 (* 2 3))`.
pub fn print_expr(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Literal(value) => value.to_literal(),
        ExprKind::Variable(name) => name.clone(),
        ExprKind::Assign { name, value } => format!("(= {} {})", name, print_expr(value)),
        ExprKind::Binary {
            left,
            operator,
            right,
        } => format!("({} {} {})", operator, print_expr(left), print_expr(right)),
        ExprKind::Logical {
            left,
            operator,
            right,
        } => format!("({} {} {})", operator, print_expr(left), print_expr(right)),
        ExprKind::Unary { operator, operand } => {
            format!("({} {})", operator, print_expr(operand))
        }
        ExprKind::Grouping(inner) => format!("(group {})", print_expr(inner)),
    }
}

pub fn print_stmt(stmt: &Stmt) -> String {
    match &stmt.kind {
        StmtKind::Expression(expr) => format!("(expr {})", print_expr(expr)),
        StmtKind::Print(expr) => format!("(print {})", print_expr(expr)),
        StmtKind::Var { name, initializer } => match initializer {
            Some(init) => format!("(var {} {})", name, print_expr(init)),
            None => format!("(var {})", name),
        },
        StmtKind::Block(statements) => {
            let inner: Vec<String> = statements.iter().map(print_stmt).collect();
            if inner.is_empty() {
                "(block)".to_string()
            } else {
                format!("(block {})", inner.join(" "))
            }
        }
    }
}

/// One statement per line.
pub fn print_program(program: &Program) -> String {
    program
        .statements
        .iter()
        .map(print_stmt)
        .collect::<Vec<_>>()
        .join("\n")
}
