//! Stack machine executing compiled bytecode against a scope.

use crate::instr::{Bytecode, Instr};
use crate::scope::Scope;
use crate::EvalError;
use mathex_builtins::{lookup_builtin, Callable, Matrix, RangeValue, Value};
use mathex_runtime::{index_get, index_set, truthy};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A user-defined function: compiled body plus the scope it closed over.
/// Calls run in a fresh child scope with the parameters bound locally.
pub struct UserFunction {
    name: String,
    params: Vec<String>,
    body: Rc<Bytecode>,
    captured: Scope,
}

impl fmt::Debug for UserFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.params.join(", "))
    }
}

impl Callable for UserFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn arity(&self) -> usize {
        self.params.len()
    }

    fn call(&self, args: &[Value]) -> Result<Value, String> {
        if args.len() != self.params.len() {
            return Err(format!(
                "`{}` expects {} argument(s), got {}",
                self.name,
                self.params.len(),
                args.len()
            ));
        }
        let frame = self.captured.child();
        for (param, arg) in self.params.iter().zip(args) {
            frame.define(param, arg.clone());
        }
        interpret(&self.body, &frame).map_err(|e| e.to_string())
    }
}

pub fn interpret(bytecode: &Bytecode, scope: &Scope) -> Result<Value, EvalError> {
    let mut stack: Vec<Value> = Vec::new();
    let mut pc = 0usize;
    while pc < bytecode.instructions.len() {
        match &bytecode.instructions[pc] {
            Instr::Const(value) => stack.push(value.clone()),
            Instr::LoadVar(name) => {
                let value = scope
                    .get(name)?
                    .ok_or_else(|| EvalError::UndefinedSymbol(name.clone()))?;
                stack.push(value);
            }
            Instr::StoreVar(name) => {
                let value = top(&stack)?.clone();
                scope.set(name, value);
            }
            Instr::CallBuiltin(name, argc) => {
                let args = pop_args(&mut stack, *argc)?;
                stack.push(dispatch_builtin(name, &args)?);
            }
            Instr::CallFunction(name, argc) => {
                let args = pop_args(&mut stack, *argc)?;
                stack.push(call_function(scope, name, &args)?);
            }
            Instr::Jump(target) => {
                pc = *target;
                continue;
            }
            Instr::JumpIfFalse(target) => {
                let cond = pop(&mut stack)?;
                if !truthy(&cond).map_err(EvalError::Runtime)? {
                    pc = *target;
                    continue;
                }
            }
            Instr::JumpIfTrue(target) => {
                let cond = pop(&mut stack)?;
                if truthy(&cond).map_err(EvalError::Runtime)? {
                    pc = *target;
                    continue;
                }
            }
            Instr::MakeRange { with_step } => {
                let end = scalar(&pop(&mut stack)?, "range end")?;
                let step = if *with_step {
                    scalar(&pop(&mut stack)?, "range step")?
                } else {
                    1.0
                };
                let start = scalar(&pop(&mut stack)?, "range start")?;
                let range = RangeValue::new(start, step, end).map_err(EvalError::Runtime)?;
                stack.push(Value::Range(range));
            }
            Instr::MakeMatrix { rows, cols } => {
                let matrix = build_matrix(&mut stack, *rows, *cols)?;
                stack.push(Value::Matrix(matrix));
            }
            Instr::MakeObject(keys) => {
                let values = pop_args(&mut stack, keys.len())?;
                let mut object = HashMap::new();
                for (key, value) in keys.iter().zip(values) {
                    object.insert(key.clone(), value);
                }
                stack.push(Value::Object(object));
            }
            Instr::MakeResultSet(count) => {
                let values = pop_args(&mut stack, *count)?;
                stack.push(Value::ResultSet(values));
            }
            Instr::IndexGet { dims } => {
                let selectors = pop_args(&mut stack, *dims)?;
                let target = pop(&mut stack)?;
                let value = index_get(&target, &selectors).map_err(EvalError::Runtime)?;
                stack.push(value);
            }
            Instr::StoreIndexed { name, levels } => {
                let replacement = pop(&mut stack)?;
                let mut groups: Vec<Vec<Value>> = Vec::with_capacity(levels.len());
                for dims in levels.iter().rev() {
                    groups.push(pop_args(&mut stack, *dims)?);
                }
                groups.reverse();
                let updated = write_path(scope, name, &groups, &replacement)?;
                scope.set(name, updated.clone());
                stack.push(updated);
            }
            Instr::MakeClosure { name, params, body } => {
                let function = UserFunction {
                    name: name.clone(),
                    params: params.clone(),
                    body: Rc::clone(body),
                    captured: scope.clone(),
                };
                stack.push(Value::Lambda(Rc::new(function)));
            }
            Instr::Pop => {
                stack.pop();
            }
        }
        pc += 1;
    }
    pop(&mut stack)
}

fn pop(stack: &mut Vec<Value>) -> Result<Value, EvalError> {
    stack
        .pop()
        .ok_or_else(|| EvalError::Runtime("stack underflow".to_string()))
}

fn top(stack: &[Value]) -> Result<&Value, EvalError> {
    stack
        .last()
        .ok_or_else(|| EvalError::Runtime("stack underflow".to_string()))
}

/// Pop `count` values, preserving their push order.
fn pop_args(stack: &mut Vec<Value>, count: usize) -> Result<Vec<Value>, EvalError> {
    if stack.len() < count {
        return Err(EvalError::Runtime("stack underflow".to_string()));
    }
    Ok(stack.split_off(stack.len() - count))
}

fn scalar(value: &Value, what: &str) -> Result<f64, EvalError> {
    match value {
        Value::Num(n) => Ok(*n),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        other => Err(EvalError::Runtime(format!(
            "{what} must be a number, got {other:?}"
        ))),
    }
}

fn dispatch_builtin(name: &str, args: &[Value]) -> Result<Value, EvalError> {
    let builtin = lookup_builtin(name)
        .ok_or_else(|| EvalError::Runtime(format!("unknown function `{name}`")))?;
    if let Some(expected) = builtin.arity {
        if args.len() != expected {
            return Err(EvalError::Arity {
                name: name.to_string(),
                expected,
                got: args.len(),
            });
        }
    }
    (builtin.implementation)(args).map_err(EvalError::Runtime)
}

/// User definitions in the scope shadow registered builtins of the same name.
fn call_function(scope: &Scope, name: &str, args: &[Value]) -> Result<Value, EvalError> {
    match scope.get(name)? {
        Some(Value::Lambda(function)) => {
            if function.arity() != args.len() {
                return Err(EvalError::Arity {
                    name: name.to_string(),
                    expected: function.arity(),
                    got: args.len(),
                });
            }
            function.call(args).map_err(EvalError::Runtime)
        }
        Some(other) => Err(EvalError::Runtime(format!(
            "`{name}` is not a function, it is {other}"
        ))),
        None => {
            if lookup_builtin(name).is_some() {
                dispatch_builtin(name, args)
            } else {
                Err(EvalError::UndefinedSymbol(name.to_string()))
            }
        }
    }
}

/// Read-modify-write through a chain of index levels. For `a.b[2] = x` this
/// reads `a`, reads `a.b`, writes element 2 of the copy, writes the copy back
/// into `a`, and returns the updated `a`.
fn write_path(
    scope: &Scope,
    name: &str,
    groups: &[Vec<Value>],
    replacement: &Value,
) -> Result<Value, EvalError> {
    if groups.is_empty() {
        return Err(EvalError::Runtime(
            "at least one index is required".to_string(),
        ));
    }
    let root = scope
        .get(name)?
        .ok_or_else(|| EvalError::UndefinedSymbol(name.to_string()))?;
    let mut chain: Vec<Value> = Vec::with_capacity(groups.len());
    chain.push(root);
    for group in &groups[..groups.len() - 1] {
        let next = index_get(&chain[chain.len() - 1], group).map_err(EvalError::Runtime)?;
        chain.push(next);
    }
    let last = groups.len() - 1;
    let mut updated =
        index_set(&chain[last], &groups[last], replacement).map_err(EvalError::Runtime)?;
    for level in (0..last).rev() {
        updated = index_set(&chain[level], &groups[level], &updated).map_err(EvalError::Runtime)?;
    }
    Ok(updated)
}

/// Matrix literal entries concatenate within their row: scalars contribute
/// one element, ranges and row vectors contribute all of theirs. Rows must
/// come out equal length.
fn build_matrix(stack: &mut Vec<Value>, rows: usize, cols: usize) -> Result<Matrix, EvalError> {
    if rows == 0 || cols == 0 {
        return Matrix::new(Vec::new(), 0, 0).map_err(EvalError::Runtime);
    }
    let entries = pop_args(stack, rows * cols)?;
    let mut data: Vec<f64> = Vec::new();
    let mut width: Option<usize> = None;
    for (index, row_entries) in entries.chunks(cols).enumerate() {
        let mut row: Vec<f64> = Vec::new();
        for entry in row_entries {
            match entry {
                Value::Num(n) => row.push(*n),
                Value::Bool(b) => row.push(if *b { 1.0 } else { 0.0 }),
                Value::Range(r) => row.extend(r.values()),
                Value::Matrix(m) if m.rows == 1 => row.extend(m.data.iter().copied()),
                other => {
                    return Err(EvalError::Runtime(format!(
                        "matrix entries must be scalars or row vectors, got {other:?}"
                    )))
                }
            }
        }
        match width {
            None => width = Some(row.len()),
            Some(w) if w != row.len() => {
                return Err(EvalError::Runtime(format!(
                    "matrix rows must have equal length: row 1 has {w} element(s), row {} has {}",
                    index + 1,
                    row.len()
                )))
            }
            Some(_) => {}
        }
        data.extend(row);
    }
    let width = width.unwrap_or(0);
    Matrix::new(data, rows, width).map_err(EvalError::Runtime)
}
