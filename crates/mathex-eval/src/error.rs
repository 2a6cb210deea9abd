use thiserror::Error;

/// Errors surfaced while compiling or evaluating an expression tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// A name that resolves neither in the scope nor in the builtin
    /// registry, or an alias chain that never reaches a value.
    #[error("undefined symbol `{0}`")]
    UndefinedSymbol(String),

    /// A call with the wrong number of arguments, caught before the function
    /// body runs.
    #[error("`{name}` expects {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: usize,
        got: usize,
    },

    /// Everything that can only be detected mid-evaluation: type mismatches,
    /// out-of-range indices, bad ranges.
    #[error("{0}")]
    Runtime(String),
}
