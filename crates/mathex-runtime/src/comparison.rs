//! Comparison operators.
//!
//! Scalar comparisons yield booleans. When either side is a matrix or range
//! the comparison runs elementwise and yields a 0/1 matrix. Strings compare
//! lexicographically with other strings.

use crate::{broadcast_binary, operand, Operand};
use mathex_builtins::{register_builtin, Value};

fn relational(
    symbol: &str,
    a: &Value,
    b: &Value,
    f: impl Fn(f64, f64) -> bool,
) -> Result<Value, String> {
    match (operand(a), operand(b)) {
        (Some(Operand::Scalar(x)), Some(Operand::Scalar(y))) => Ok(Value::Bool(f(x, y))),
        (Some(_), Some(_)) => {
            broadcast_binary(symbol, a, b, |x, y| Ok(if f(x, y) { 1.0 } else { 0.0 }))
        }
        _ => Err(format!("cannot compare {a:?} and {b:?} with {symbol}")),
    }
}

/// Equality: `a == b`. NaN is not equal to anything, itself included.
pub fn equal(a: &Value, b: &Value) -> Result<Value, String> {
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => Ok(Value::Bool(x == y)),
        _ => relational("==", a, b, |x, y| x == y),
    }
}

/// Inequality: `a != b`.
pub fn unequal(a: &Value, b: &Value) -> Result<Value, String> {
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => Ok(Value::Bool(x != y)),
        _ => relational("!=", a, b, |x, y| x != y),
    }
}

/// Less than: `a < b`.
pub fn smaller(a: &Value, b: &Value) -> Result<Value, String> {
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => Ok(Value::Bool(x < y)),
        _ => relational("<", a, b, |x, y| x < y),
    }
}

/// Less than or equal: `a <= b`.
pub fn smaller_eq(a: &Value, b: &Value) -> Result<Value, String> {
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => Ok(Value::Bool(x <= y)),
        _ => relational("<=", a, b, |x, y| x <= y),
    }
}

/// Greater than: `a > b`.
pub fn larger(a: &Value, b: &Value) -> Result<Value, String> {
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => Ok(Value::Bool(x > y)),
        _ => relational(">", a, b, |x, y| x > y),
    }
}

/// Greater than or equal: `a >= b`.
pub fn larger_eq(a: &Value, b: &Value) -> Result<Value, String> {
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => Ok(Value::Bool(x >= y)),
        _ => relational(">=", a, b, |x, y| x >= y),
    }
}

fn equal_builtin(args: &[Value]) -> Result<Value, String> {
    equal(&args[0], &args[1])
}
register_builtin!(
    equal_builtin,
    name = "equal",
    category = "operator/comparison",
    summary = "Test two values for equality",
    arity = 2
);

fn unequal_builtin(args: &[Value]) -> Result<Value, String> {
    unequal(&args[0], &args[1])
}
register_builtin!(
    unequal_builtin,
    name = "unequal",
    category = "operator/comparison",
    summary = "Test two values for inequality",
    arity = 2
);

fn smaller_builtin(args: &[Value]) -> Result<Value, String> {
    smaller(&args[0], &args[1])
}
register_builtin!(
    smaller_builtin,
    name = "smaller",
    category = "operator/comparison",
    summary = "Test whether a is less than b",
    arity = 2
);

fn smaller_eq_builtin(args: &[Value]) -> Result<Value, String> {
    smaller_eq(&args[0], &args[1])
}
register_builtin!(
    smaller_eq_builtin,
    name = "smallerEq",
    category = "operator/comparison",
    summary = "Test whether a is at most b",
    arity = 2
);

fn larger_builtin(args: &[Value]) -> Result<Value, String> {
    larger(&args[0], &args[1])
}
register_builtin!(
    larger_builtin,
    name = "larger",
    category = "operator/comparison",
    summary = "Test whether a is greater than b",
    arity = 2
);

fn larger_eq_builtin(args: &[Value]) -> Result<Value, String> {
    larger_eq(&args[0], &args[1])
}
register_builtin!(
    larger_eq_builtin,
    name = "largerEq",
    category = "operator/comparison",
    summary = "Test whether a is at least b",
    arity = 2
);
