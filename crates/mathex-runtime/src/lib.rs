//! Runtime library for the expression language.
//!
//! Implements the semantics behind every operator and named function the
//! evaluator can emit: arithmetic and elementwise operators, comparisons,
//! logical and bitwise operators, the scalar math library, matrix helpers,
//! named constants, and one-based index access.
//!
//! Every operation is registered in the global builtin inventory under the
//! name the compiler emits, so dispatch is always by name through
//! [`call_builtin`].

use mathex_builtins::{lookup_builtin, Matrix, Value};

pub mod arithmetic;
pub mod comparison;
pub mod constants;
pub mod indexing;
pub mod logical;
pub mod mathematics;
pub mod matrices;

pub use arithmetic::*;
pub use comparison::*;
pub use indexing::*;
pub use logical::*;
pub use matrices::*;

/// Call a registered builtin by name.
///
/// Fixed-arity builtins are checked before the implementation runs; variadic
/// builtins validate their own argument lists.
pub fn call_builtin(name: &str, args: &[Value]) -> Result<Value, String> {
    let builtin = lookup_builtin(name).ok_or_else(|| format!("unknown function `{name}`"))?;
    if let Some(arity) = builtin.arity {
        if args.len() != arity {
            return Err(format!(
                "`{name}` expects {arity} argument(s), got {}",
                args.len()
            ));
        }
    }
    (builtin.implementation)(args)
}

/// Operand view used by the elementwise operators: anything numeric collapses
/// to a scalar or a grid of scalars. Ranges take part as their materialized
/// matrix.
pub(crate) enum Operand {
    Scalar(f64),
    Grid(Matrix),
}

pub(crate) fn operand(value: &Value) -> Option<Operand> {
    match value {
        Value::Num(n) => Some(Operand::Scalar(*n)),
        Value::Bool(b) => Some(Operand::Scalar(if *b { 1.0 } else { 0.0 })),
        Value::Matrix(m) => Some(Operand::Grid(m.clone())),
        Value::Range(r) => Some(Operand::Grid(r.to_matrix())),
        _ => None,
    }
}

/// Apply a scalar function elementwise to two operands, broadcasting scalars
/// against matrices. `symbol` only feeds error messages.
pub(crate) fn broadcast_binary(
    symbol: &str,
    a: &Value,
    b: &Value,
    f: impl Fn(f64, f64) -> Result<f64, String>,
) -> Result<Value, String> {
    match (operand(a), operand(b)) {
        (Some(Operand::Scalar(x)), Some(Operand::Scalar(y))) => Ok(Value::Num(f(x, y)?)),
        (Some(Operand::Grid(m)), Some(Operand::Scalar(y))) => {
            let data = m
                .data
                .iter()
                .map(|x| f(*x, y))
                .collect::<Result<Vec<f64>, String>>()?;
            Ok(Value::Matrix(Matrix::new(data, m.rows, m.cols)?))
        }
        (Some(Operand::Scalar(x)), Some(Operand::Grid(m))) => {
            let data = m
                .data
                .iter()
                .map(|y| f(x, *y))
                .collect::<Result<Vec<f64>, String>>()?;
            Ok(Value::Matrix(Matrix::new(data, m.rows, m.cols)?))
        }
        (Some(Operand::Grid(m1)), Some(Operand::Grid(m2))) => {
            if m1.rows != m2.rows || m1.cols != m2.cols {
                return Err(format!(
                    "matrix dimensions must agree for {}: {}x{} {} {}x{}",
                    symbol, m1.rows, m1.cols, symbol, m2.rows, m2.cols
                ));
            }
            let data = m1
                .data
                .iter()
                .zip(m2.data.iter())
                .map(|(x, y)| f(*x, *y))
                .collect::<Result<Vec<f64>, String>>()?;
            Ok(Value::Matrix(Matrix::new(data, m1.rows, m1.cols)?))
        }
        _ => Err(format!(
            "unsupported operand types for {symbol}: {a:?} {symbol} {b:?}"
        )),
    }
}

/// Apply a scalar function elementwise to one operand.
pub(crate) fn map_unary(
    name: &str,
    value: &Value,
    f: impl Fn(f64) -> f64,
) -> Result<Value, String> {
    match operand(value) {
        Some(Operand::Scalar(x)) => Ok(Value::Num(f(x))),
        Some(Operand::Grid(m)) => {
            let data: Vec<f64> = m.data.iter().map(|x| f(*x)).collect();
            Ok(Value::Matrix(Matrix::new(data, m.rows, m.cols)?))
        }
        None => Err(format!("`{name}` is not defined for {value:?}")),
    }
}

/// Extract a scalar from a numeric value, coercing booleans to 0/1.
pub(crate) fn numeric_scalar(name: &str, value: &Value) -> Result<f64, String> {
    match value {
        Value::Num(n) => Ok(*n),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        other => Err(format!("`{name}` expects a number, got {other:?}")),
    }
}
