//! Symbolic rewriting for parsed expression trees.
//!
//! Two entry points: [`simplify`] runs prioritized rewrite rules to a
//! fixpoint over a flattened n-ary view of the tree, and [`derivative`]
//! differentiates structurally with the standard calculus rules. They
//! compose; derivatives come back raw and simplify cleans them up:
//!
//! ```
//! use mathex_symbolic::{derivative_str, simplify};
//!
//! let raw = derivative_str("2 * x ^ 2 + 3 * x + 4", "x").unwrap();
//! let (tidy, _) = simplify(&raw);
//! assert_eq!(tidy.to_string(), "4 * x + 3");
//! ```

mod derivative;
mod error;
mod nary;
mod rules;
mod simplify;

pub use derivative::{derivative, derivative_str};
pub use error::SymbolicError;
pub use nary::{flatten, unflatten, SymExpr};
pub use rules::{default_rules, Rule, RuleGroup, RuleSet};
pub use simplify::{simplify, simplify_str, simplify_with, SimplifyOptions, SimplifyOutcome};
