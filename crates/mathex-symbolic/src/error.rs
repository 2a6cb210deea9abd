use mathex_parser::ParseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SymbolicError {
    /// The function has no differentiation rule.
    #[error("cannot compute the derivative of `{0}`")]
    UnknownFunctionDerivative(String),

    /// The tree shape has no derivative (matrices, conditionals, and so on).
    #[error("cannot differentiate {0}")]
    UnsupportedNode(&'static str),

    #[error("{0}")]
    Parse(#[from] ParseError),
}
