//! Logical and bitwise operators.
//!
//! `&&`, `||` and `!` work on truthiness: booleans as themselves, numbers as
//! nonzero-and-not-NaN. The evaluator short-circuits `&&` and `||` before
//! dispatch; the registered functions exist for explicit calls and always
//! evaluate both sides. Bitwise operators require integer-valued numbers and
//! operate on 64-bit two's complement.

use crate::{broadcast_binary, operand, Operand};
use mathex_builtins::{register_builtin, Matrix, Value};

/// Truthiness of a condition value. Matrices are not conditions.
pub fn truthy(value: &Value) -> Result<bool, String> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Num(n) => Ok(*n != 0.0 && !n.is_nan()),
        other => Err(format!(
            "condition must be a boolean or a number, got {other:?}"
        )),
    }
}

fn element_truthy(x: f64) -> bool {
    x != 0.0 && !x.is_nan()
}

fn logical(
    symbol: &str,
    a: &Value,
    b: &Value,
    f: impl Fn(bool, bool) -> bool,
) -> Result<Value, String> {
    match (operand(a), operand(b)) {
        (Some(Operand::Scalar(x)), Some(Operand::Scalar(y))) => {
            Ok(Value::Bool(f(element_truthy(x), element_truthy(y))))
        }
        (Some(_), Some(_)) => broadcast_binary(symbol, a, b, |x, y| {
            Ok(if f(element_truthy(x), element_truthy(y)) {
                1.0
            } else {
                0.0
            })
        }),
        _ => Err(format!(
            "unsupported operand types for {symbol}: {a:?} {symbol} {b:?}"
        )),
    }
}

/// Logical conjunction: `a && b`.
pub fn and(a: &Value, b: &Value) -> Result<Value, String> {
    logical("&&", a, b, |x, y| x && y)
}

/// Logical disjunction: `a || b`.
pub fn or(a: &Value, b: &Value) -> Result<Value, String> {
    logical("||", a, b, |x, y| x || y)
}

/// Logical negation: `!a`.
pub fn not(a: &Value) -> Result<Value, String> {
    match operand(a) {
        Some(Operand::Scalar(x)) => Ok(Value::Bool(!element_truthy(x))),
        Some(Operand::Grid(m)) => {
            let data: Vec<f64> = m
                .data
                .iter()
                .map(|x| if element_truthy(*x) { 0.0 } else { 1.0 })
                .collect();
            Ok(Value::Matrix(Matrix::new(data, m.rows, m.cols)?))
        }
        None => Err(format!("unsupported operand type for !: {a:?}")),
    }
}

fn to_integer(symbol: &str, x: f64) -> Result<i64, String> {
    if x.is_finite() && x.fract() == 0.0 {
        Ok(x as i64)
    } else {
        Err(format!("integers expected for {symbol}, got {x}"))
    }
}

/// Bitwise conjunction: `a & b`.
pub fn bit_and(a: &Value, b: &Value) -> Result<Value, String> {
    broadcast_binary("&", a, b, |x, y| {
        Ok((to_integer("&", x)? & to_integer("&", y)?) as f64)
    })
}

/// Bitwise disjunction: `a | b`.
pub fn bit_or(a: &Value, b: &Value) -> Result<Value, String> {
    broadcast_binary("|", a, b, |x, y| {
        Ok((to_integer("|", x)? | to_integer("|", y)?) as f64)
    })
}

/// Bitwise complement: `~a`.
pub fn bit_not(a: &Value) -> Result<Value, String> {
    match operand(a) {
        Some(Operand::Scalar(x)) => Ok(Value::Num(!to_integer("~", x)? as f64)),
        Some(Operand::Grid(m)) => {
            let data = m
                .data
                .iter()
                .map(|x| Ok(!to_integer("~", *x)? as f64))
                .collect::<Result<Vec<f64>, String>>()?;
            Ok(Value::Matrix(Matrix::new(data, m.rows, m.cols)?))
        }
        None => Err(format!("unsupported operand type for ~: {a:?}")),
    }
}

fn and_builtin(args: &[Value]) -> Result<Value, String> {
    and(&args[0], &args[1])
}
register_builtin!(
    and_builtin,
    name = "and",
    category = "operator/logical",
    summary = "Logical conjunction",
    arity = 2
);

fn or_builtin(args: &[Value]) -> Result<Value, String> {
    or(&args[0], &args[1])
}
register_builtin!(
    or_builtin,
    name = "or",
    category = "operator/logical",
    summary = "Logical disjunction",
    arity = 2
);

fn not_builtin(args: &[Value]) -> Result<Value, String> {
    not(&args[0])
}
register_builtin!(
    not_builtin,
    name = "not",
    category = "operator/logical",
    summary = "Logical negation",
    arity = 1
);

fn bit_and_builtin(args: &[Value]) -> Result<Value, String> {
    bit_and(&args[0], &args[1])
}
register_builtin!(
    bit_and_builtin,
    name = "bitAnd",
    category = "operator/bitwise",
    summary = "Bitwise conjunction",
    arity = 2
);

fn bit_or_builtin(args: &[Value]) -> Result<Value, String> {
    bit_or(&args[0], &args[1])
}
register_builtin!(
    bit_or_builtin,
    name = "bitOr",
    category = "operator/bitwise",
    summary = "Bitwise disjunction",
    arity = 2
);

fn bit_not_builtin(args: &[Value]) -> Result<Value, String> {
    bit_not(&args[0])
}
register_builtin!(
    bit_not_builtin,
    name = "bitNot",
    category = "operator/bitwise",
    summary = "Bitwise complement",
    arity = 1
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(truthy(&Value::Bool(true)).unwrap());
        assert!(truthy(&Value::Num(2.0)).unwrap());
        assert!(!truthy(&Value::Num(0.0)).unwrap());
        assert!(!truthy(&Value::Num(f64::NAN)).unwrap());
        assert!(truthy(&Value::Str("x".into())).is_err());
    }

    #[test]
    fn logical_operators() {
        assert_eq!(and(&Value::Bool(true), &Value::Num(3.0)).unwrap(), Value::Bool(true));
        assert_eq!(and(&Value::Num(0.0), &Value::Bool(true)).unwrap(), Value::Bool(false));
        assert_eq!(or(&Value::Num(0.0), &Value::Num(0.0)).unwrap(), Value::Bool(false));
        assert_eq!(not(&Value::Num(0.0)).unwrap(), Value::Bool(true));
        assert_eq!(not(&Value::Bool(true)).unwrap(), Value::Bool(false));
    }

    #[test]
    fn bitwise_operators() {
        assert_eq!(bit_and(&Value::Num(12.0), &Value::Num(10.0)).unwrap(), Value::Num(8.0));
        assert_eq!(bit_or(&Value::Num(12.0), &Value::Num(10.0)).unwrap(), Value::Num(14.0));
        assert_eq!(bit_not(&Value::Num(2.0)).unwrap(), Value::Num(-3.0));
        assert!(bit_and(&Value::Num(1.5), &Value::Num(1.0)).is_err());
        assert!(bit_not(&Value::Num(f64::INFINITY)).is_err());
    }
}
