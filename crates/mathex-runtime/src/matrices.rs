//! Matrix construction and shape operations.

use crate::{numeric_scalar, operand, Operand};
use mathex_builtins::{register_builtin, Matrix, Value};

/// True matrix product. Inner dimensions must agree.
pub fn matrix_multiply(a: &Matrix, b: &Matrix) -> Result<Matrix, String> {
    if a.cols != b.rows {
        return Err(format!(
            "matrix dimensions must agree for *: {}x{} * {}x{}",
            a.rows, a.cols, b.rows, b.cols
        ));
    }
    let mut data = vec![0.0; a.rows * b.cols];
    for i in 0..a.rows {
        for k in 0..a.cols {
            let x = a.data[i * a.cols + k];
            if x == 0.0 {
                continue;
            }
            for j in 0..b.cols {
                data[i * b.cols + j] += x * b.data[k * b.cols + j];
            }
        }
    }
    Matrix::new(data, a.rows, b.cols)
}

/// Identity matrix of order n.
pub fn identity_matrix(n: usize) -> Matrix {
    let mut m = Matrix::zeros(n, n);
    for i in 0..n {
        m.data[i * n + i] = 1.0;
    }
    m
}

/// Square matrix raised to a non-negative integer power by repeated
/// multiplication. `m^0` is the identity.
pub fn matrix_power(m: &Matrix, n: u32) -> Result<Matrix, String> {
    if m.rows != m.cols {
        return Err(format!(
            "matrix power requires a square matrix, got {}x{}",
            m.rows, m.cols
        ));
    }
    let mut result = identity_matrix(m.rows);
    for _ in 0..n {
        result = matrix_multiply(&result, m)?;
    }
    Ok(result)
}

fn dimension(name: &str, value: &Value) -> Result<usize, String> {
    let n = numeric_scalar(name, value)?;
    if n.fract() != 0.0 || n < 0.0 || !n.is_finite() {
        return Err(format!(
            "`{name}` expects a non-negative integer dimension, got {n}"
        ));
    }
    Ok(n as usize)
}

fn filled(name: &str, args: &[Value], fill: f64) -> Result<Value, String> {
    match args {
        [n] => {
            let len = dimension(name, n)?;
            Ok(Value::Matrix(Matrix::new(vec![fill; len], 1, len)?))
        }
        [r, c] => {
            let rows = dimension(name, r)?;
            let cols = dimension(name, c)?;
            Ok(Value::Matrix(Matrix::new(vec![fill; rows * cols], rows, cols)?))
        }
        _ => Err(format!(
            "`{name}` expects 1 or 2 arguments, got {}",
            args.len()
        )),
    }
}

fn zeros_builtin(args: &[Value]) -> Result<Value, String> {
    filled("zeros", args, 0.0)
}
register_builtin!(
    zeros_builtin,
    name = "zeros",
    category = "matrix",
    summary = "Matrix of zeros: zeros(n) or zeros(rows, cols)"
);

fn ones_builtin(args: &[Value]) -> Result<Value, String> {
    filled("ones", args, 1.0)
}
register_builtin!(
    ones_builtin,
    name = "ones",
    category = "matrix",
    summary = "Matrix of ones: ones(n) or ones(rows, cols)"
);

fn identity_builtin(args: &[Value]) -> Result<Value, String> {
    Ok(Value::Matrix(identity_matrix(dimension("identity", &args[0])?)))
}
register_builtin!(
    identity_builtin,
    name = "identity",
    category = "matrix",
    summary = "Identity matrix of order n",
    arity = 1
);

/// Shape of a value as a 1x2 row vector. Scalars are 1x1; strings report
/// their character count.
fn size_builtin(args: &[Value]) -> Result<Value, String> {
    let value = &args[0];
    let (rows, cols) = match value {
        Value::Str(s) => (1, s.chars().count()),
        other => match operand(other) {
            Some(Operand::Scalar(_)) => (1, 1),
            Some(Operand::Grid(m)) => (m.rows, m.cols),
            None => return Err(format!("`size` is not defined for {value:?}")),
        },
    };
    Ok(Value::Matrix(Matrix::row_vector(vec![
        rows as f64,
        cols as f64,
    ])))
}
register_builtin!(
    size_builtin,
    name = "size",
    category = "matrix",
    summary = "Shape of a value as a [rows, cols] vector",
    arity = 1
);

fn transpose_builtin(args: &[Value]) -> Result<Value, String> {
    match operand(&args[0]) {
        Some(Operand::Scalar(x)) => Ok(Value::Num(x)),
        Some(Operand::Grid(m)) => Ok(Value::Matrix(m.transpose())),
        None => Err(format!("`transpose` is not defined for {:?}", args[0])),
    }
}
register_builtin!(
    transpose_builtin,
    name = "transpose",
    category = "matrix",
    summary = "Matrix transpose, identity on scalars",
    arity = 1
);
