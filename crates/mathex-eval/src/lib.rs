//! Compile-once, evaluate-many execution of expression trees.
//!
//! [`compile`] lowers a parsed [`Node`] to stack bytecode. The resulting
//! [`Evaluator`] is immutable and can run any number of times against
//! different [`Scope`]s; all state lives in the scope.

mod compiler;
mod error;
mod instr;
pub mod scope;
mod vm;

pub use compiler::{binop_builtin, unop_builtin};
pub use error::EvalError;
pub use instr::{Bytecode, Instr};
pub use scope::{Binding, Scope, MAX_LINK_HOPS};
pub use vm::UserFunction;

use mathex_builtins::Value;
use mathex_parser::Node;

/// Compile a tree into a reusable evaluator.
pub fn compile(node: &Node) -> Result<Evaluator, EvalError> {
    Ok(Evaluator {
        bytecode: compiler::compile(node)?,
    })
}

/// A compiled expression. Evaluation mutates only the scope it runs against.
#[derive(Debug, Clone)]
pub struct Evaluator {
    bytecode: Bytecode,
}

impl Evaluator {
    pub fn evaluate(&self, scope: &Scope) -> Result<Value, EvalError> {
        vm::interpret(&self.bytecode, scope)
    }

    pub fn bytecode(&self) -> &Bytecode {
        &self.bytecode
    }
}
