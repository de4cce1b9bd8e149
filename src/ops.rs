//! Operator semantics shared by the tree-walking interpreter and the generic VM.
//!
//! Arithmetic tries `Int` with `Int` first, then `Double` with `Double`.
//! Mixed operands are rejected rather than promoted.

use crate::ast::{BinaryOp, UnaryOp};
use crate::value::Value;

/// Why an operator could not produce a value. Callers attach the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpFault {
    /// No rule for this pair of operand types.
    Unsupported,
    DivisionByZero,
    Overflow,
    /// Unary `-` on something that is not a number.
    NotNumber,
    /// Unary `!` on something that is not a bool.
    NotBool,
}

pub type OpResult = Result<Value, OpFault>;

pub fn binary(op: BinaryOp, left: &Value, right: &Value) -> OpResult {
    match op {
        BinaryOp::Add => add(left, right),
        BinaryOp::Subtract => subtract(left, right),
        BinaryOp::Multiply => multiply(left, right),
        BinaryOp::Divide => divide(left, right),
        BinaryOp::Equal => Ok(Value::Bool(left == right)),
        BinaryOp::NotEqual => Ok(Value::Bool(left != right)),
        BinaryOp::Less => compare(left, right, |o| o.is_lt()),
        BinaryOp::LessEqual => compare(left, right, |o| o.is_le()),
        BinaryOp::Greater => compare(left, right, |o| o.is_gt()),
        BinaryOp::GreaterEqual => compare(left, right, |o| o.is_ge()),
    }
}

pub fn unary(op: UnaryOp, operand: &Value) -> OpResult {
    match op {
        UnaryOp::Negate => negate(operand),
        UnaryOp::Not => not(operand),
    }
}

pub fn add(left: &Value, right: &Value) -> OpResult {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => a.checked_add(*b).map(Value::Int).ok_or(OpFault::Overflow),
        (Value::Double(a), Value::Double(b)) => Ok(Value::Double(a + b)),
        (Value::String(a), Value::String(b)) => {
            let mut joined = String::with_capacity(a.len() + b.len());
            joined.push_str(a);
            joined.push_str(b);
            Ok(Value::String(joined))
        }
        _ => Err(OpFault::Unsupported),
    }
}

pub fn subtract(left: &Value, right: &Value) -> OpResult {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => a.checked_sub(*b).map(Value::Int).ok_or(OpFault::Overflow),
        (Value::Double(a), Value::Double(b)) => Ok(Value::Double(a - b)),
        _ => Err(OpFault::Unsupported),
    }
}

pub fn multiply(left: &Value, right: &Value) -> OpResult {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => a.checked_mul(*b).map(Value::Int).ok_or(OpFault::Overflow),
        (Value::Double(a), Value::Double(b)) => Ok(Value::Double(a * b)),
        _ => Err(OpFault::Unsupported),
    }
}

/// The divisor is checked before anything else, so `x / 0` and `x / 0.0`
/// always report division by zero.
pub fn divide(left: &Value, right: &Value) -> OpResult {
    if right.is_zero() {
        return Err(OpFault::DivisionByZero);
    }
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => a.checked_div(*b).map(Value::Int).ok_or(OpFault::Overflow),
        (Value::Double(a), Value::Double(b)) => Ok(Value::Double(a / b)),
        _ => Err(OpFault::Unsupported),
    }
}

fn compare(left: &Value, right: &Value, test: fn(std::cmp::Ordering) -> bool) -> OpResult {
    let ordering = match (left, right) {
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::Double(a), Value::Double(b)) => match a.partial_cmp(b) {
            Some(ordering) => ordering,
            // NaN compares false against everything.
            None => return Ok(Value::Bool(false)),
        },
        (Value::String(a), Value::String(b)) => a.cmp(b),
        _ => return Err(OpFault::Unsupported),
    };
    Ok(Value::Bool(test(ordering)))
}

pub fn negate(operand: &Value) -> OpResult {
    match operand {
        Value::Int(n) => n.checked_neg().map(Value::Int).ok_or(OpFault::Overflow),
        Value::Double(n) => Ok(Value::Double(-n)),
        _ => Err(OpFault::NotNumber),
    }
}

pub fn not(operand: &Value) -> OpResult {
    match operand {
        Value::Bool(b) => Ok(Value::Bool(!b)),
        _ => Err(OpFault::NotBool),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_then_double() {
        assert_eq!(add(&Value::Int(2), &Value::Int(3)), Ok(Value::Int(5)));
        assert_eq!(
            multiply(&Value::Double(1.5), &Value::Double(2.0)),
            Ok(Value::Double(3.0))
        );
        assert_eq!(
            add(&Value::Int(1), &Value::Double(2.0)),
            Err(OpFault::Unsupported)
        );
    }

    #[test]
    fn test_string_concatenation_only_for_add() {
        assert_eq!(
            add(&Value::from("ab"), &Value::from("cd")),
            Ok(Value::from("abcd"))
        );
        assert_eq!(
            subtract(&Value::from("ab"), &Value::from("cd")),
            Err(OpFault::Unsupported)
        );
    }

    #[test]
    fn test_division_checks_zero_first() {
        assert_eq!(
            divide(&Value::Int(10), &Value::Int(0)),
            Err(OpFault::DivisionByZero)
        );
        assert_eq!(
            divide(&Value::Double(1.0), &Value::Double(0.0)),
            Err(OpFault::DivisionByZero)
        );
        assert_eq!(divide(&Value::Int(7), &Value::Int(2)), Ok(Value::Int(3)));
    }

    #[test]
    fn test_overflow() {
        assert_eq!(
            add(&Value::Int(i64::MAX), &Value::Int(1)),
            Err(OpFault::Overflow)
        );
        assert_eq!(negate(&Value::Int(i64::MIN)), Err(OpFault::Overflow));
        assert_eq!(
            divide(&Value::Int(i64::MIN), &Value::Int(-1)),
            Err(OpFault::Overflow)
        );
    }

    #[test]
    fn test_comparisons() {
        let lt = binary(BinaryOp::Less, &Value::Int(1), &Value::Int(2));
        assert_eq!(lt, Ok(Value::Bool(true)));
        let ge = binary(BinaryOp::GreaterEqual, &Value::from("b"), &Value::from("a"));
        assert_eq!(ge, Ok(Value::Bool(true)));
        let mixed = binary(BinaryOp::Less, &Value::Int(1), &Value::Double(2.0));
        assert_eq!(mixed, Err(OpFault::Unsupported));
        let eq = binary(BinaryOp::Equal, &Value::Int(1), &Value::Double(1.0));
        assert_eq!(eq, Ok(Value::Bool(false)));
    }

    #[test]
    fn test_unary() {
        assert_eq!(unary(UnaryOp::Not, &Value::Bool(true)), Ok(Value::Bool(false)));
        assert_eq!(unary(UnaryOp::Not, &Value::Nil), Err(OpFault::NotBool));
        assert_eq!(unary(UnaryOp::Negate, &Value::Int(4)), Ok(Value::Int(-4)));
        assert_eq!(unary(UnaryOp::Negate, &Value::Bool(true)), Err(OpFault::NotNumber));
    }
}
