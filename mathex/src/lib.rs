//! The mathex expression language in one crate.
//!
//! Parsing, pretty-printing, scope-based evaluation, and symbolic rewriting
//! live in their own member crates; this facade re-exports the surface most
//! programs need and adds [`evaluate_str`] for the common parse-compile-run
//! path:
//!
//! ```
//! use mathex::{evaluate_str, Scope, Value};
//!
//! let scope = Scope::with_builtins();
//! scope.define("x", Value::Num(5.0));
//! assert_eq!(evaluate_str("2 * x + 1", &scope).unwrap(), Value::Num(11.0));
//! ```
//!
//! Compiled expressions are reusable; keep the [`Evaluator`] and swap
//! scopes to evaluate the same source against different bindings.

use std::collections::HashMap;

use thiserror::Error;

pub use mathex_builtins::{Matrix, RangeValue, Value};
pub use mathex_eval::{compile, EvalError, Evaluator, Scope};
pub use mathex_parser::{parse, BinOp, Literal, Node, ParseError, UnOp};
pub use mathex_symbolic::{
    default_rules, derivative, derivative_str, simplify, simplify_str, simplify_with, Rule,
    RuleGroup, RuleSet, SimplifyOptions, SimplifyOutcome, SymbolicError,
};

// The member crates, for anything the flat re-exports leave out.
pub use mathex_builtins as builtins;
pub use mathex_eval as eval;
pub use mathex_lexer as lexer;
pub use mathex_parser as parser;
pub use mathex_runtime as runtime;
pub use mathex_symbolic as symbolic;

/// Any failure along the parse-compile-evaluate-rewrite pipeline.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Eval(#[from] EvalError),
    #[error(transparent)]
    Symbolic(#[from] SymbolicError),
}

/// Parse, compile, and evaluate `source` against `scope` in one call.
pub fn evaluate_str(source: &str, scope: &Scope) -> Result<Value, Error> {
    let node = parse(source)?;
    let evaluator = compile(&node)?;
    Ok(evaluator.evaluate(scope)?)
}

/// Substitutes scope bindings into `node`, then runs [`simplify`].
///
/// Symbols bound to numbers, booleans, or strings become literal constants
/// before any rule runs, so `a * x + a * 3` with `a = 2` settles at
/// `2 * x + 6`. Bindings without a literal form (matrices, ranges,
/// functions) and unbound names stay symbolic, and assignment targets are
/// never replaced. Lookup follows scope links, so a broken link chain
/// surfaces as an evaluation error.
pub fn simplify_in_scope(node: &Node, scope: &Scope) -> Result<(Node, SimplifyOutcome), Error> {
    let mut bound: HashMap<String, Node> = HashMap::new();
    let mut broken: Option<EvalError> = None;
    node.for_each(&mut |n, _, _| {
        let Node::Symbol(name) = n else { return };
        if broken.is_some() || bound.contains_key(name) {
            return;
        }
        match scope.get(name) {
            Ok(Some(Value::Num(v))) => {
                bound.insert(name.clone(), Node::Constant(Literal::Number(v)));
            }
            Ok(Some(Value::Bool(b))) => {
                bound.insert(name.clone(), Node::Constant(Literal::Bool(b)));
            }
            Ok(Some(Value::Str(s))) => {
                bound.insert(name.clone(), Node::Constant(Literal::Str(s)));
            }
            Ok(_) => {}
            Err(err) => broken = Some(err),
        }
    });
    if let Some(err) = broken {
        return Err(Error::Eval(err));
    }
    let substituted = node.map(&mut |n, path, parent| {
        let Node::Symbol(name) = n else { return None };
        if matches!(parent, Some(Node::Assign { .. })) && path.last() == Some(&0) {
            return None;
        }
        bound.get(name).cloned()
    });
    Ok(simplify(&substituted))
}
