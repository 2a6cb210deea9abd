//! Instruction set for the stack evaluator.

use mathex_builtins::Value;
use std::rc::Rc;

/// One instruction. Jump targets are instruction indices.
#[derive(Debug, Clone)]
pub enum Instr {
    /// Push a literal value.
    Const(Value),
    /// Push the value bound to a name.
    LoadVar(String),
    /// Bind the top of the stack to a name, leaving it on the stack:
    /// assignments are expressions.
    StoreVar(String),
    /// Pop `argc` arguments and call a registered builtin. Operators compile
    /// to this and never consult the scope.
    CallBuiltin(String, usize),
    /// Pop `argc` arguments and call a function, resolving user definitions
    /// in the scope before the builtin registry.
    CallFunction(String, usize),
    Jump(usize),
    /// Pop the condition and jump when it is falsy.
    JumpIfFalse(usize),
    /// Pop the condition and jump when it is truthy.
    JumpIfTrue(usize),
    /// Pop end, optional step and start; push a range.
    MakeRange { with_step: bool },
    /// Pop `rows * cols` entries pushed row-major and push a matrix. Entries
    /// may be scalars or row vectors, which concatenate within their row.
    MakeMatrix { rows: usize, cols: usize },
    /// Pop one value per key, last key on top, and push an object.
    MakeObject(Vec<String>),
    /// Pop `count` visible results and push a result set.
    MakeResultSet(usize),
    /// Pop `dims` selectors and the target below them; push the selection.
    IndexGet { dims: usize },
    /// Indexed assignment `name[..][..] = value`. Pops the replacement, then
    /// one selector group per level (innermost on top), reads the named
    /// container, writes through the whole path, rebinds the name and pushes
    /// the updated container.
    StoreIndexed { name: String, levels: Vec<usize> },
    /// Push a function value closing over the current scope.
    MakeClosure {
        name: String,
        params: Vec<String>,
        body: Rc<Bytecode>,
    },
    /// Discard the top of the stack.
    Pop,
}

/// A compiled program for the stack machine.
#[derive(Debug, Clone)]
pub struct Bytecode {
    pub instructions: Vec<Instr>,
}
