//! Lowers expression trees to stack bytecode.
//!
//! Operators become builtin calls under their registry names; `&&`, `||` and
//! the conditional become jumps so the skipped side never runs. Forward jump
//! targets are emitted as placeholders and patched once the target is known.

use crate::instr::{Bytecode, Instr};
use crate::EvalError;
use mathex_builtins::Value;
use mathex_parser::{BinOp, BlockEntry, Literal, Node, UnOp};
use std::rc::Rc;

/// Registry name a binary operator dispatches to.
pub fn binop_builtin(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "add",
        BinOp::Sub => "subtract",
        BinOp::Mul => "multiply",
        BinOp::Div => "divide",
        BinOp::Mod => "mod",
        BinOp::Pow => "pow",
        BinOp::ElemMul => "dotMultiply",
        BinOp::ElemDiv => "dotDivide",
        BinOp::ElemPow => "dotPow",
        BinOp::AndAnd => "and",
        BinOp::OrOr => "or",
        BinOp::BitAnd => "bitAnd",
        BinOp::BitOr => "bitOr",
        BinOp::Equal => "equal",
        BinOp::NotEqual => "unequal",
        BinOp::Less => "smaller",
        BinOp::LessEqual => "smallerEq",
        BinOp::Greater => "larger",
        BinOp::GreaterEqual => "largerEq",
    }
}

/// Registry name a unary operator dispatches to.
pub fn unop_builtin(op: UnOp) -> &'static str {
    match op {
        UnOp::Plus => "unaryPlus",
        UnOp::Minus => "unaryMinus",
        UnOp::Not => "not",
        UnOp::BitNot => "bitNot",
    }
}

pub fn compile(node: &Node) -> Result<Bytecode, EvalError> {
    let mut compiler = Compiler::default();
    compiler.compile_node(node)?;
    log::debug!(
        "compiled expression to {} instruction(s)",
        compiler.instructions.len()
    );
    Ok(Bytecode {
        instructions: compiler.instructions,
    })
}

#[derive(Default)]
struct Compiler {
    instructions: Vec<Instr>,
}

impl Compiler {
    fn emit(&mut self, instr: Instr) -> usize {
        let pc = self.instructions.len();
        self.instructions.push(instr);
        pc
    }

    fn patch(&mut self, idx: usize, instr: Instr) {
        self.instructions[idx] = instr;
    }

    fn here(&self) -> usize {
        self.instructions.len()
    }

    fn compile_node(&mut self, node: &Node) -> Result<(), EvalError> {
        match node {
            Node::Constant(Literal::Number(n)) => {
                self.emit(Instr::Const(Value::Num(*n)));
            }
            Node::Constant(Literal::Str(s)) => {
                self.emit(Instr::Const(Value::Str(s.clone())));
            }
            Node::Constant(Literal::Bool(b)) => {
                self.emit(Instr::Const(Value::Bool(*b)));
            }
            Node::Symbol(name) => {
                self.emit(Instr::LoadVar(name.clone()));
            }
            Node::Unary(op, operand) => {
                self.compile_node(operand)?;
                self.emit(Instr::CallBuiltin(unop_builtin(*op).to_string(), 1));
            }
            Node::Binary(lhs, op, rhs) if *op == BinOp::AndAnd => {
                self.compile_node(lhs)?;
                let first = self.emit(Instr::JumpIfFalse(usize::MAX));
                self.compile_node(rhs)?;
                let second = self.emit(Instr::JumpIfFalse(usize::MAX));
                self.emit(Instr::Const(Value::Bool(true)));
                let done = self.emit(Instr::Jump(usize::MAX));
                let falsy = self.here();
                self.patch(first, Instr::JumpIfFalse(falsy));
                self.patch(second, Instr::JumpIfFalse(falsy));
                self.emit(Instr::Const(Value::Bool(false)));
                let end = self.here();
                self.patch(done, Instr::Jump(end));
            }
            Node::Binary(lhs, op, rhs) if *op == BinOp::OrOr => {
                self.compile_node(lhs)?;
                let first = self.emit(Instr::JumpIfTrue(usize::MAX));
                self.compile_node(rhs)?;
                let second = self.emit(Instr::JumpIfTrue(usize::MAX));
                self.emit(Instr::Const(Value::Bool(false)));
                let done = self.emit(Instr::Jump(usize::MAX));
                let truthy = self.here();
                self.patch(first, Instr::JumpIfTrue(truthy));
                self.patch(second, Instr::JumpIfTrue(truthy));
                self.emit(Instr::Const(Value::Bool(true)));
                let end = self.here();
                self.patch(done, Instr::Jump(end));
            }
            Node::Binary(lhs, op, rhs) => {
                self.compile_node(lhs)?;
                self.compile_node(rhs)?;
                self.emit(Instr::CallBuiltin(binop_builtin(*op).to_string(), 2));
            }
            Node::FunctionCall { name, args } => {
                for arg in args {
                    self.compile_node(arg)?;
                }
                self.emit(Instr::CallFunction(name.clone(), args.len()));
            }
            Node::FunctionAssign { name, params, body } => {
                // The body compiles once, here; calls only bind parameters
                // and run it.
                let body_code = compile(body)?;
                self.emit(Instr::MakeClosure {
                    name: name.clone(),
                    params: params.clone(),
                    body: Rc::new(body_code),
                });
                self.emit(Instr::StoreVar(name.clone()));
            }
            Node::Assign { target, value } => self.compile_assign(target, value)?,
            Node::Conditional {
                cond,
                then,
                otherwise,
            } => {
                self.compile_node(cond)?;
                let to_else = self.emit(Instr::JumpIfFalse(usize::MAX));
                self.compile_node(then)?;
                let to_end = self.emit(Instr::Jump(usize::MAX));
                let else_at = self.here();
                self.patch(to_else, Instr::JumpIfFalse(else_at));
                self.compile_node(otherwise)?;
                let end = self.here();
                self.patch(to_end, Instr::Jump(end));
            }
            Node::Range { start, step, end } => {
                self.compile_node(start)?;
                if let Some(step) = step {
                    self.compile_node(step)?;
                }
                self.compile_node(end)?;
                self.emit(Instr::MakeRange {
                    with_step: step.is_some(),
                });
            }
            Node::Matrix(rows) => {
                let cols = rows.first().map_or(0, |row| row.len());
                for row in rows {
                    if row.len() != cols {
                        return Err(EvalError::Runtime(format!(
                            "matrix rows must have equal entry counts: {} vs {}",
                            cols,
                            row.len()
                        )));
                    }
                    for entry in row {
                        self.compile_node(entry)?;
                    }
                }
                self.emit(Instr::MakeMatrix {
                    rows: rows.len(),
                    cols,
                });
            }
            Node::Object(pairs) => {
                let keys: Vec<String> = pairs.iter().map(|(key, _)| key.clone()).collect();
                for (_, value) in pairs {
                    self.compile_node(value)?;
                }
                self.emit(Instr::MakeObject(keys));
            }
            Node::Index { target, dims } => {
                self.compile_node(target)?;
                for dim in dims {
                    self.compile_node(dim)?;
                }
                self.emit(Instr::IndexGet { dims: dims.len() });
            }
            Node::Block(entries) => {
                let mut visible = 0usize;
                for BlockEntry { node, visible: keep } in entries {
                    self.compile_node(node)?;
                    if *keep {
                        visible += 1;
                    } else {
                        self.emit(Instr::Pop);
                    }
                }
                self.emit(Instr::MakeResultSet(visible));
            }
        }
        Ok(())
    }

    fn compile_assign(&mut self, target: &Node, value: &Node) -> Result<(), EvalError> {
        match target {
            Node::Symbol(name) => {
                self.compile_node(value)?;
                self.emit(Instr::StoreVar(name.clone()));
                Ok(())
            }
            Node::Index { .. } => {
                // Peel the index chain down to its base symbol. Selector
                // groups are pushed outermost first, the replacement last.
                let mut levels: Vec<&Vec<Node>> = Vec::new();
                let mut base = target;
                while let Node::Index { target: inner, dims } = base {
                    levels.push(dims);
                    base = inner.as_ref();
                }
                levels.reverse();
                let name = match base {
                    Node::Symbol(name) => name.clone(),
                    other => {
                        return Err(EvalError::Runtime(format!(
                            "invalid assignment target: {other}"
                        )))
                    }
                };
                for dims in &levels {
                    for dim in dims.iter() {
                        self.compile_node(dim)?;
                    }
                }
                self.compile_node(value)?;
                self.emit(Instr::StoreIndexed {
                    name,
                    levels: levels.iter().map(|dims| dims.len()).collect(),
                });
                Ok(())
            }
            other => Err(EvalError::Runtime(format!(
                "invalid assignment target: {other}"
            ))),
        }
    }
}
