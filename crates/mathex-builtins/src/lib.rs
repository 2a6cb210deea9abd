pub use inventory;
use std::collections::HashMap;
use std::convert::TryFrom;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone)]
pub enum Value {
    Num(f64),
    Bool(bool),
    Str(String),
    Matrix(Matrix),
    Range(RangeValue),
    Object(HashMap<String, Value>),
    /// A function value: a registered builtin wrapper or a user definition.
    Lambda(Rc<dyn Callable>),
    /// The visible results of a multi-statement evaluation, in order.
    ResultSet(Vec<Value>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Num(a), Value::Num(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Matrix(a), Value::Matrix(b)) => a == b,
            (Value::Range(a), Value::Range(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Lambda(a), Value::Lambda(b)) => Rc::ptr_eq(a, b),
            (Value::ResultSet(a), Value::ResultSet(b)) => a == b,
            _ => false,
        }
    }
}

/// Function values. User definitions capture their defining scope behind
/// this trait so the value model stays independent of the evaluator.
pub trait Callable: fmt::Debug {
    fn name(&self) -> &str;
    fn arity(&self) -> usize;
    fn call(&self, args: &[Value]) -> Result<Value, String>;
}

/// Dense 2-D matrix, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    pub data: Vec<f64>,
    pub rows: usize,
    pub cols: usize,
}

impl Matrix {
    pub fn new(data: Vec<f64>, rows: usize, cols: usize) -> Result<Self, String> {
        if rows * cols != data.len() {
            return Err(format!(
                "matrix data length {} doesn't match dimensions {}x{}",
                data.len(),
                rows,
                cols
            ));
        }
        Ok(Matrix { data, rows, cols })
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Matrix {
            data: vec![0.0; rows * cols],
            rows,
            cols,
        }
    }

    pub fn ones(rows: usize, cols: usize) -> Self {
        Matrix {
            data: vec![1.0; rows * cols],
            rows,
            cols,
        }
    }

    pub fn row_vector(data: Vec<f64>) -> Self {
        let cols = data.len();
        Matrix {
            data,
            rows: 1,
            cols,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Zero-based access; bounds are the caller's concern at this layer.
    pub fn get(&self, row: usize, col: usize) -> Result<f64, String> {
        if row >= self.rows || col >= self.cols {
            return Err(format!(
                "matrix position ({row}, {col}) out of bounds for {}x{}",
                self.rows, self.cols
            ));
        }
        Ok(self.data[row * self.cols + col])
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<(), String> {
        if row >= self.rows || col >= self.cols {
            return Err(format!(
                "matrix position ({row}, {col}) out of bounds for {}x{}",
                self.rows, self.cols
            ));
        }
        self.data[row * self.cols + col] = value;
        Ok(())
    }

    pub fn transpose(&self) -> Matrix {
        let mut out = Matrix::zeros(self.cols, self.rows);
        for r in 0..self.rows {
            for c in 0..self.cols {
                out.data[c * self.rows + r] = self.data[r * self.cols + c];
            }
        }
        out
    }
}

/// A numeric range with inclusive end, kept symbolic until it is indexed or
/// forced into a matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeValue {
    pub start: f64,
    pub step: f64,
    pub end: f64,
}

impl RangeValue {
    pub fn new(start: f64, step: f64, end: f64) -> Result<Self, String> {
        if step == 0.0 {
            return Err("range step must be nonzero".to_string());
        }
        Ok(RangeValue { start, step, end })
    }

    pub fn len(&self) -> usize {
        let span = (self.end - self.start) / self.step;
        if span < 0.0 {
            0
        } else {
            // Tolerate accumulated float error at the inclusive end.
            (span + 1e-10) as usize + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn values(&self) -> Vec<f64> {
        (0..self.len())
            .map(|i| self.start + self.step * i as f64)
            .collect()
    }

    pub fn to_matrix(&self) -> Matrix {
        Matrix::row_vector(self.values())
    }
}

// -- conversions ------------------------------------------------------------

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Num(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<Matrix> for Value {
    fn from(m: Matrix) -> Self {
        Value::Matrix(m)
    }
}

impl TryFrom<&Value> for f64 {
    type Error = String;
    fn try_from(v: &Value) -> Result<Self, Self::Error> {
        match v {
            Value::Num(n) => Ok(*n),
            Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            _ => Err(format!("cannot convert {v} to a number")),
        }
    }
}

impl TryFrom<&Value> for bool {
    type Error = String;
    fn try_from(v: &Value) -> Result<Self, Self::Error> {
        match v {
            Value::Bool(b) => Ok(*b),
            Value::Num(n) => Ok(*n != 0.0),
            _ => Err(format!("cannot convert {v} to a boolean")),
        }
    }
}

impl TryFrom<&Value> for String {
    type Error = String;
    fn try_from(v: &Value) -> Result<Self, Self::Error> {
        match v {
            Value::Str(s) => Ok(s.clone()),
            _ => Err(format!("cannot convert {v} to a string")),
        }
    }
}

impl TryFrom<&Value> for Matrix {
    type Error = String;
    fn try_from(v: &Value) -> Result<Self, Self::Error> {
        match v {
            Value::Matrix(m) => Ok(m.clone()),
            Value::Range(r) => Ok(r.to_matrix()),
            Value::Num(n) => Ok(Matrix::row_vector(vec![*n])),
            _ => Err(format!("cannot convert {v} to a matrix")),
        }
    }
}

// -- registry ---------------------------------------------------------------

/// A named function supplied by the host environment, looked up by name at
/// call time.
#[derive(Debug, Clone)]
pub struct BuiltinFunction {
    pub name: &'static str,
    pub category: &'static str,
    pub summary: &'static str,
    /// Fixed argument count, or None for variadic functions (which validate
    /// their own argument lists).
    pub arity: Option<usize>,
    pub implementation: fn(&[Value]) -> Result<Value, String>,
}

impl BuiltinFunction {
    pub const fn new(
        name: &'static str,
        category: &'static str,
        summary: &'static str,
        arity: Option<usize>,
        implementation: fn(&[Value]) -> Result<Value, String>,
    ) -> Self {
        Self {
            name,
            category,
            summary,
            arity,
            implementation,
        }
    }
}

/// A named constant seeded into scopes at construction time.
#[derive(Debug, Clone)]
pub struct Constant {
    pub name: &'static str,
    pub value: f64,
}

inventory::collect!(BuiltinFunction);
inventory::collect!(Constant);

pub fn builtin_functions() -> Vec<&'static BuiltinFunction> {
    inventory::iter::<BuiltinFunction>().collect()
}

pub fn constants() -> Vec<&'static Constant> {
    inventory::iter::<Constant>().collect()
}

pub fn lookup_builtin(name: &str) -> Option<&'static BuiltinFunction> {
    inventory::iter::<BuiltinFunction>().find(|b| b.name == name)
}

pub fn lookup_constant(name: &str) -> Option<&'static Constant> {
    inventory::iter::<Constant>().find(|c| c.name == name)
}

/// Register a `fn(&[Value]) -> Result<Value, String>` as a named builtin.
/// Omitting `arity` marks the function variadic.
#[macro_export]
macro_rules! register_builtin {
    ($func:path, name = $name:literal, category = $category:literal, summary = $summary:literal) => {
        $crate::inventory::submit! {
            $crate::BuiltinFunction::new($name, $category, $summary, None, $func)
        }
    };
    ($func:path, name = $name:literal, category = $category:literal, summary = $summary:literal, arity = $arity:literal) => {
        $crate::inventory::submit! {
            $crate::BuiltinFunction::new($name, $category, $summary, Some($arity), $func)
        }
    };
}

/// Register a named numeric constant.
#[macro_export]
macro_rules! register_constant {
    (name = $name:literal, value = $value:expr) => {
        $crate::inventory::submit! {
            $crate::Constant {
                name: $name,
                value: $value,
            }
        }
    };
}

// -- display ----------------------------------------------------------------

fn format_num(n: f64) -> String {
    if n.is_nan() {
        "nan".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "inf" } else { "-inf" }.to_string()
    } else if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Num(n) => write!(f, "{}", format_num(*n)),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => write!(f, "\"{s}\""),
            Value::Matrix(m) => write!(f, "{m}"),
            Value::Range(r) => {
                write!(
                    f,
                    "{}:{}:{}",
                    format_num(r.start),
                    format_num(r.step),
                    format_num(r.end)
                )
            }
            Value::Object(fields) => {
                let mut keys: Vec<&String> = fields.keys().collect();
                keys.sort();
                write!(f, "{{")?;
                for (i, key) in keys.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {}", fields[*key])?;
                }
                write!(f, "}}")
            }
            Value::Lambda(l) => write!(f, "<function {}/{}>", l.name(), l.arity()),
            Value::ResultSet(values) => {
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{v}")?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for r in 0..self.rows {
            if r > 0 {
                write!(f, "; ")?;
            }
            for c in 0..self.cols {
                if c > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", format_num(self.data[r * self.cols + c]))?;
            }
        }
        write!(f, "]")
    }
}
