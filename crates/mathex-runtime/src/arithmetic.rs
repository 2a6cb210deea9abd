//! Arithmetic operators.
//!
//! Scalars and matrices mix freely: scalars broadcast over matrix operands,
//! ranges take part as their materialized row vector, and booleans coerce to
//! 0/1. `*`, `/` and `^` keep their linear-algebra meaning for matrices; the
//! dotted variants are always elementwise.

use crate::matrices::{matrix_multiply, matrix_power};
use crate::{broadcast_binary, map_unary, operand, Operand};
use mathex_builtins::{register_builtin, Value};

/// Addition: `a + b`. Concatenates when both operands are strings.
pub fn add(a: &Value, b: &Value) -> Result<Value, String> {
    if let (Value::Str(x), Value::Str(y)) = (a, b) {
        return Ok(Value::Str(format!("{x}{y}")));
    }
    broadcast_binary("+", a, b, |x, y| Ok(x + y))
}

/// Subtraction: `a - b`.
pub fn subtract(a: &Value, b: &Value) -> Result<Value, String> {
    broadcast_binary("-", a, b, |x, y| Ok(x - y))
}

/// Multiplication: `a * b`.
///
/// Matrix * matrix is the true matrix product; a 1x1 product collapses to a
/// scalar. Everything else broadcasts elementwise.
pub fn multiply(a: &Value, b: &Value) -> Result<Value, String> {
    match (operand(a), operand(b)) {
        (Some(Operand::Grid(m1)), Some(Operand::Grid(m2))) => {
            let product = matrix_multiply(&m1, &m2)?;
            if product.rows == 1 && product.cols == 1 {
                Ok(Value::Num(product.data[0]))
            } else {
                Ok(Value::Matrix(product))
            }
        }
        _ => broadcast_binary("*", a, b, |x, y| Ok(x * y)),
    }
}

/// Division: `a / b`. Division by a matrix would mean multiplication by its
/// inverse and is rejected in favor of `./`.
pub fn divide(a: &Value, b: &Value) -> Result<Value, String> {
    match (operand(a), operand(b)) {
        (Some(_), Some(Operand::Grid(_))) => {
            Err("division by a matrix is not supported, use ./ for elementwise division".to_string())
        }
        _ => broadcast_binary("/", a, b, |x, y| Ok(x / y)),
    }
}

/// Modulus: `a % b`, computed as `x - y * floor(x / y)`.
/// `mod(x, 0)` yields `x`; a negative divisor is an error.
pub fn modulus(a: &Value, b: &Value) -> Result<Value, String> {
    broadcast_binary("%", a, b, |x, y| {
        if y > 0.0 {
            Ok(x - y * (x / y).floor())
        } else if y == 0.0 {
            Ok(x)
        } else {
            Err(format!("cannot calculate mod for a negative divisor: {y}"))
        }
    })
}

/// Power: `a ^ b`. A square matrix raised to a non-negative integer uses
/// repeated matrix multiplication; other matrix forms are rejected in favor
/// of `.^`.
pub fn pow(a: &Value, b: &Value) -> Result<Value, String> {
    match (operand(a), operand(b)) {
        (Some(Operand::Grid(m)), Some(Operand::Scalar(s))) => {
            if s.fract() != 0.0 || s < 0.0 {
                return Err("matrix power requires a non-negative integer exponent".to_string());
            }
            Ok(Value::Matrix(matrix_power(&m, s as u32)?))
        }
        (Some(_), Some(Operand::Grid(_))) => {
            Err("raising to a matrix power is not supported, use .^ for elementwise power".to_string())
        }
        _ => broadcast_binary("^", a, b, |x, y| Ok(x.powf(y))),
    }
}

/// Unary minus: `-a`.
pub fn unary_minus(a: &Value) -> Result<Value, String> {
    map_unary("unaryMinus", a, |x| -x)
}

/// Unary plus: `+a`. Coerces booleans to numbers, leaves numerics unchanged.
pub fn unary_plus(a: &Value) -> Result<Value, String> {
    map_unary("unaryPlus", a, |x| x)
}

/// Elementwise multiplication: `a .* b`.
pub fn dot_multiply(a: &Value, b: &Value) -> Result<Value, String> {
    broadcast_binary(".*", a, b, |x, y| Ok(x * y))
}

/// Elementwise division: `a ./ b`.
pub fn dot_divide(a: &Value, b: &Value) -> Result<Value, String> {
    broadcast_binary("./", a, b, |x, y| Ok(x / y))
}

/// Elementwise power: `a .^ b`.
pub fn dot_pow(a: &Value, b: &Value) -> Result<Value, String> {
    broadcast_binary(".^", a, b, |x, y| Ok(x.powf(y)))
}

fn add_builtin(args: &[Value]) -> Result<Value, String> {
    add(&args[0], &args[1])
}
register_builtin!(
    add_builtin,
    name = "add",
    category = "operator/arithmetic",
    summary = "Add two values",
    arity = 2
);

fn subtract_builtin(args: &[Value]) -> Result<Value, String> {
    subtract(&args[0], &args[1])
}
register_builtin!(
    subtract_builtin,
    name = "subtract",
    category = "operator/arithmetic",
    summary = "Subtract two values",
    arity = 2
);

fn multiply_builtin(args: &[Value]) -> Result<Value, String> {
    multiply(&args[0], &args[1])
}
register_builtin!(
    multiply_builtin,
    name = "multiply",
    category = "operator/arithmetic",
    summary = "Multiply two values",
    arity = 2
);

fn divide_builtin(args: &[Value]) -> Result<Value, String> {
    divide(&args[0], &args[1])
}
register_builtin!(
    divide_builtin,
    name = "divide",
    category = "operator/arithmetic",
    summary = "Divide two values",
    arity = 2
);

fn mod_builtin(args: &[Value]) -> Result<Value, String> {
    modulus(&args[0], &args[1])
}
register_builtin!(
    mod_builtin,
    name = "mod",
    category = "operator/arithmetic",
    summary = "Floored modulus",
    arity = 2
);

fn pow_builtin(args: &[Value]) -> Result<Value, String> {
    pow(&args[0], &args[1])
}
register_builtin!(
    pow_builtin,
    name = "pow",
    category = "operator/arithmetic",
    summary = "Raise to a power",
    arity = 2
);

fn unary_minus_builtin(args: &[Value]) -> Result<Value, String> {
    unary_minus(&args[0])
}
register_builtin!(
    unary_minus_builtin,
    name = "unaryMinus",
    category = "operator/arithmetic",
    summary = "Negate a value",
    arity = 1
);

fn unary_plus_builtin(args: &[Value]) -> Result<Value, String> {
    unary_plus(&args[0])
}
register_builtin!(
    unary_plus_builtin,
    name = "unaryPlus",
    category = "operator/arithmetic",
    summary = "Numeric identity",
    arity = 1
);

fn dot_multiply_builtin(args: &[Value]) -> Result<Value, String> {
    dot_multiply(&args[0], &args[1])
}
register_builtin!(
    dot_multiply_builtin,
    name = "dotMultiply",
    category = "operator/arithmetic",
    summary = "Elementwise multiplication",
    arity = 2
);

fn dot_divide_builtin(args: &[Value]) -> Result<Value, String> {
    dot_divide(&args[0], &args[1])
}
register_builtin!(
    dot_divide_builtin,
    name = "dotDivide",
    category = "operator/arithmetic",
    summary = "Elementwise division",
    arity = 2
);

fn dot_pow_builtin(args: &[Value]) -> Result<Value, String> {
    dot_pow(&args[0], &args[1])
}
register_builtin!(
    dot_pow_builtin,
    name = "dotPow",
    category = "operator/arithmetic",
    summary = "Elementwise power",
    arity = 2
);

#[cfg(test)]
mod tests {
    use super::*;
    use mathex_builtins::{Matrix, RangeValue};

    #[test]
    fn scalar_arithmetic() {
        assert_eq!(add(&Value::Num(2.0), &Value::Num(3.0)).unwrap(), Value::Num(5.0));
        assert_eq!(subtract(&Value::Num(2.0), &Value::Num(3.0)).unwrap(), Value::Num(-1.0));
        assert_eq!(multiply(&Value::Num(2.5), &Value::Num(4.0)).unwrap(), Value::Num(10.0));
        assert_eq!(divide(&Value::Num(8.0), &Value::Num(4.0)).unwrap(), Value::Num(2.0));
        assert_eq!(pow(&Value::Num(2.0), &Value::Num(10.0)).unwrap(), Value::Num(1024.0));
    }

    #[test]
    fn booleans_coerce_to_numbers() {
        assert_eq!(add(&Value::Bool(true), &Value::Num(2.0)).unwrap(), Value::Num(3.0));
        assert_eq!(unary_minus(&Value::Bool(true)).unwrap(), Value::Num(-1.0));
    }

    #[test]
    fn string_concatenation() {
        assert_eq!(
            add(&Value::Str("foo".into()), &Value::Str("bar".into())).unwrap(),
            Value::Str("foobar".into())
        );
        assert!(add(&Value::Str("foo".into()), &Value::Num(1.0)).is_err());
    }

    #[test]
    fn division_follows_ieee() {
        assert_eq!(divide(&Value::Num(5.0), &Value::Num(0.0)).unwrap(), Value::Num(f64::INFINITY));
        let nan = divide(&Value::Num(0.0), &Value::Num(0.0)).unwrap();
        match nan {
            Value::Num(n) => assert!(n.is_nan()),
            other => panic!("expected NaN, got {other:?}"),
        }
    }

    #[test]
    fn floored_modulus() {
        assert_eq!(modulus(&Value::Num(8.0), &Value::Num(3.0)).unwrap(), Value::Num(2.0));
        assert_eq!(modulus(&Value::Num(-7.0), &Value::Num(3.0)).unwrap(), Value::Num(2.0));
        assert_eq!(modulus(&Value::Num(7.0), &Value::Num(0.0)).unwrap(), Value::Num(7.0));
        assert!(modulus(&Value::Num(7.0), &Value::Num(-3.0)).is_err());
    }

    #[test]
    fn scalar_broadcasts_over_matrix() {
        let m = Matrix::new(vec![1.0, 2.0, 3.0, 4.0], 2, 2).unwrap();
        let result = add(&Value::Matrix(m), &Value::Num(10.0)).unwrap();
        match result {
            Value::Matrix(m) => assert_eq!(m.data, vec![11.0, 12.0, 13.0, 14.0]),
            other => panic!("expected matrix, got {other:?}"),
        }
    }

    #[test]
    fn matrix_product_and_collapse() {
        let a = Matrix::new(vec![1.0, 2.0, 3.0, 4.0], 2, 2).unwrap();
        let b = Matrix::new(vec![5.0, 6.0, 7.0, 8.0], 2, 2).unwrap();
        let result = multiply(&Value::Matrix(a), &Value::Matrix(b)).unwrap();
        match result {
            Value::Matrix(m) => assert_eq!(m.data, vec![19.0, 22.0, 43.0, 50.0]),
            other => panic!("expected matrix, got {other:?}"),
        }

        let row = Matrix::row_vector(vec![1.0, 2.0, 3.0]);
        let col = Matrix::new(vec![4.0, 5.0, 6.0], 3, 1).unwrap();
        assert_eq!(
            multiply(&Value::Matrix(row), &Value::Matrix(col)).unwrap(),
            Value::Num(32.0)
        );
    }

    #[test]
    fn elementwise_variants() {
        let a = Matrix::row_vector(vec![1.0, 2.0, 3.0]);
        let b = Matrix::row_vector(vec![4.0, 5.0, 6.0]);
        let result = dot_multiply(&Value::Matrix(a), &Value::Matrix(b)).unwrap();
        match result {
            Value::Matrix(m) => assert_eq!(m.data, vec![4.0, 10.0, 18.0]),
            other => panic!("expected matrix, got {other:?}"),
        }
    }

    #[test]
    fn elementwise_dimension_mismatch() {
        let a = Matrix::row_vector(vec![1.0, 2.0]);
        let b = Matrix::row_vector(vec![1.0, 2.0, 3.0]);
        assert!(dot_multiply(&Value::Matrix(a), &Value::Matrix(b)).is_err());
    }

    #[test]
    fn ranges_act_as_row_vectors() {
        let r = RangeValue::new(1.0, 1.0, 3.0).unwrap();
        let result = multiply(&Value::Range(r), &Value::Num(2.0)).unwrap();
        match result {
            Value::Matrix(m) => assert_eq!(m.data, vec![2.0, 4.0, 6.0]),
            other => panic!("expected matrix, got {other:?}"),
        }
    }

    #[test]
    fn matrix_division_and_power_are_rejected() {
        let m = Matrix::new(vec![1.0, 2.0, 3.0, 4.0], 2, 2).unwrap();
        assert!(divide(&Value::Num(1.0), &Value::Matrix(m.clone())).is_err());
        assert!(pow(&Value::Matrix(m.clone()), &Value::Num(0.5)).is_err());
        assert!(pow(&Value::Num(2.0), &Value::Matrix(m)).is_err());
    }

    #[test]
    fn matrix_power_repeats_the_product() {
        let m = Matrix::new(vec![1.0, 1.0, 0.0, 1.0], 2, 2).unwrap();
        let result = pow(&Value::Matrix(m.clone()), &Value::Num(3.0)).unwrap();
        match result {
            Value::Matrix(p) => assert_eq!(p.data, vec![1.0, 3.0, 0.0, 1.0]),
            other => panic!("expected matrix, got {other:?}"),
        }
        let identity = pow(&Value::Matrix(m), &Value::Num(0.0)).unwrap();
        match identity {
            Value::Matrix(p) => assert_eq!(p.data, vec![1.0, 0.0, 0.0, 1.0]),
            other => panic!("expected matrix, got {other:?}"),
        }
    }

    #[test]
    fn dispatch_by_name() {
        assert_eq!(
            crate::call_builtin("add", &[Value::Num(1.0), Value::Num(2.0)]).unwrap(),
            Value::Num(3.0)
        );
        assert!(crate::call_builtin("add", &[Value::Num(1.0)]).is_err());
        assert!(crate::call_builtin("noSuchFunction", &[]).is_err());
    }
}
