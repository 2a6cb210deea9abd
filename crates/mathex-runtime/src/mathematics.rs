//! Scalar mathematics functions.
//!
//! Every unary function applies elementwise when given a matrix or range.
//! `log` and `round` take an optional second argument; `min` and `max` are
//! variadic and flatten matrix arguments.

use crate::{broadcast_binary, map_unary, numeric_scalar, operand, Operand};
use mathex_builtins::{register_builtin, Value};

fn sin_builtin(args: &[Value]) -> Result<Value, String> {
    map_unary("sin", &args[0], f64::sin)
}
register_builtin!(
    sin_builtin,
    name = "sin",
    category = "math/trigonometry",
    summary = "Sine of an angle in radians",
    arity = 1
);

fn cos_builtin(args: &[Value]) -> Result<Value, String> {
    map_unary("cos", &args[0], f64::cos)
}
register_builtin!(
    cos_builtin,
    name = "cos",
    category = "math/trigonometry",
    summary = "Cosine of an angle in radians",
    arity = 1
);

fn tan_builtin(args: &[Value]) -> Result<Value, String> {
    map_unary("tan", &args[0], f64::tan)
}
register_builtin!(
    tan_builtin,
    name = "tan",
    category = "math/trigonometry",
    summary = "Tangent of an angle in radians",
    arity = 1
);

fn asin_builtin(args: &[Value]) -> Result<Value, String> {
    map_unary("asin", &args[0], f64::asin)
}
register_builtin!(
    asin_builtin,
    name = "asin",
    category = "math/trigonometry",
    summary = "Inverse sine, in radians",
    arity = 1
);

fn acos_builtin(args: &[Value]) -> Result<Value, String> {
    map_unary("acos", &args[0], f64::acos)
}
register_builtin!(
    acos_builtin,
    name = "acos",
    category = "math/trigonometry",
    summary = "Inverse cosine, in radians",
    arity = 1
);

fn atan_builtin(args: &[Value]) -> Result<Value, String> {
    map_unary("atan", &args[0], f64::atan)
}
register_builtin!(
    atan_builtin,
    name = "atan",
    category = "math/trigonometry",
    summary = "Inverse tangent, in radians",
    arity = 1
);

fn atan2_builtin(args: &[Value]) -> Result<Value, String> {
    broadcast_binary("atan2", &args[0], &args[1], |y, x| Ok(y.atan2(x)))
}
register_builtin!(
    atan2_builtin,
    name = "atan2",
    category = "math/trigonometry",
    summary = "Four-quadrant inverse tangent of y/x",
    arity = 2
);

fn sinh_builtin(args: &[Value]) -> Result<Value, String> {
    map_unary("sinh", &args[0], f64::sinh)
}
register_builtin!(
    sinh_builtin,
    name = "sinh",
    category = "math/trigonometry",
    summary = "Hyperbolic sine",
    arity = 1
);

fn cosh_builtin(args: &[Value]) -> Result<Value, String> {
    map_unary("cosh", &args[0], f64::cosh)
}
register_builtin!(
    cosh_builtin,
    name = "cosh",
    category = "math/trigonometry",
    summary = "Hyperbolic cosine",
    arity = 1
);

fn tanh_builtin(args: &[Value]) -> Result<Value, String> {
    map_unary("tanh", &args[0], f64::tanh)
}
register_builtin!(
    tanh_builtin,
    name = "tanh",
    category = "math/trigonometry",
    summary = "Hyperbolic tangent",
    arity = 1
);

fn exp_builtin(args: &[Value]) -> Result<Value, String> {
    map_unary("exp", &args[0], f64::exp)
}
register_builtin!(
    exp_builtin,
    name = "exp",
    category = "math/exponential",
    summary = "Exponential function e^x",
    arity = 1
);

/// `log(x)` is the natural logarithm; `log(x, base)` changes the base.
fn log_builtin(args: &[Value]) -> Result<Value, String> {
    match args {
        [x] => map_unary("log", x, f64::ln),
        [x, base] => {
            let b = numeric_scalar("log", base)?;
            map_unary("log", x, move |v| v.ln() / b.ln())
        }
        _ => Err(format!("`log` expects 1 or 2 arguments, got {}", args.len())),
    }
}
register_builtin!(
    log_builtin,
    name = "log",
    category = "math/exponential",
    summary = "Logarithm, natural by default, with an optional base"
);

fn log10_builtin(args: &[Value]) -> Result<Value, String> {
    map_unary("log10", &args[0], f64::log10)
}
register_builtin!(
    log10_builtin,
    name = "log10",
    category = "math/exponential",
    summary = "Base-10 logarithm",
    arity = 1
);

fn log2_builtin(args: &[Value]) -> Result<Value, String> {
    map_unary("log2", &args[0], f64::log2)
}
register_builtin!(
    log2_builtin,
    name = "log2",
    category = "math/exponential",
    summary = "Base-2 logarithm",
    arity = 1
);

fn sqrt_builtin(args: &[Value]) -> Result<Value, String> {
    map_unary("sqrt", &args[0], f64::sqrt)
}
register_builtin!(
    sqrt_builtin,
    name = "sqrt",
    category = "math/arithmetic",
    summary = "Square root, NaN for negative input",
    arity = 1
);

fn abs_builtin(args: &[Value]) -> Result<Value, String> {
    map_unary("abs", &args[0], f64::abs)
}
register_builtin!(
    abs_builtin,
    name = "abs",
    category = "math/arithmetic",
    summary = "Absolute value",
    arity = 1
);

/// Sign of x: -1, 0 or 1. Zero keeps its magnitude, NaN stays NaN.
fn sign_builtin(args: &[Value]) -> Result<Value, String> {
    map_unary("sign", &args[0], |x| {
        if x > 0.0 {
            1.0
        } else if x < 0.0 {
            -1.0
        } else {
            x
        }
    })
}
register_builtin!(
    sign_builtin,
    name = "sign",
    category = "math/arithmetic",
    summary = "Sign of a number: -1, 0 or 1",
    arity = 1
);

fn floor_builtin(args: &[Value]) -> Result<Value, String> {
    map_unary("floor", &args[0], f64::floor)
}
register_builtin!(
    floor_builtin,
    name = "floor",
    category = "math/rounding",
    summary = "Round towards negative infinity",
    arity = 1
);

fn ceil_builtin(args: &[Value]) -> Result<Value, String> {
    map_unary("ceil", &args[0], f64::ceil)
}
register_builtin!(
    ceil_builtin,
    name = "ceil",
    category = "math/rounding",
    summary = "Round towards positive infinity",
    arity = 1
);

/// `round(x)` rounds to the nearest integer; `round(x, n)` keeps n decimals.
fn round_builtin(args: &[Value]) -> Result<Value, String> {
    match args {
        [x] => map_unary("round", x, f64::round),
        [x, decimals] => {
            let d = numeric_scalar("round", decimals)?;
            if d.fract() != 0.0 || d < 0.0 {
                return Err(format!(
                    "`round` expects a non-negative integer number of decimals, got {d}"
                ));
            }
            let scale = 10f64.powi(d as i32);
            map_unary("round", x, move |v| (v * scale).round() / scale)
        }
        _ => Err(format!(
            "`round` expects 1 or 2 arguments, got {}",
            args.len()
        )),
    }
}
register_builtin!(
    round_builtin,
    name = "round",
    category = "math/rounding",
    summary = "Round to the nearest integer or to n decimals"
);

fn reduce_args(name: &str, args: &[Value], f: impl Fn(f64, f64) -> f64) -> Result<Value, String> {
    if args.is_empty() {
        return Err(format!("`{name}` expects at least one argument"));
    }
    let mut values = Vec::new();
    for arg in args {
        match operand(arg) {
            Some(Operand::Scalar(x)) => values.push(x),
            Some(Operand::Grid(m)) => values.extend(m.data.iter().copied()),
            None => {
                return Err(format!(
                    "`{name}` expects numbers or matrices, got {arg:?}"
                ))
            }
        }
    }
    if values.is_empty() {
        return Err(format!("cannot calculate `{name}` of an empty matrix"));
    }
    let mut acc = values[0];
    for v in &values[1..] {
        acc = f(acc, *v);
    }
    Ok(Value::Num(acc))
}

fn min_builtin(args: &[Value]) -> Result<Value, String> {
    reduce_args("min", args, f64::min)
}
register_builtin!(
    min_builtin,
    name = "min",
    category = "math/statistics",
    summary = "Smallest of the arguments, flattening matrices"
);

fn max_builtin(args: &[Value]) -> Result<Value, String> {
    reduce_args("max", args, f64::max)
}
register_builtin!(
    max_builtin,
    name = "max",
    category = "math/statistics",
    summary = "Largest of the arguments, flattening matrices"
);
