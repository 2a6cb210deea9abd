//! The fixpoint rewriting driver.
//!
//! Each pass walks the flattened expression innermost-first and fires at
//! most one rule per node. Passes repeat until a pass changes nothing or
//! the iteration cap runs out; hitting the cap is a reported outcome, not
//! an error.

use crate::error::SymbolicError;
use crate::nary::{flatten, normalized, normalized_shallow, unflatten, SymExpr};
use crate::rules::{default_rules, RuleSet};
use mathex_parser::Node;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimplifyOptions {
    /// Upper bound on rewrite passes before giving up on a fixpoint.
    pub max_iterations: usize,
}

impl Default for SimplifyOptions {
    fn default() -> SimplifyOptions {
        SimplifyOptions { max_iterations: 64 }
    }
}

/// How a simplification run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimplifyOutcome {
    /// A pass changed nothing; `iterations` counts that pass too.
    Fixpoint { iterations: usize },
    /// Rules were still firing when the pass budget ran out.
    IterationCapReached,
}

/// Simplify with the default rules and options.
pub fn simplify(node: &Node) -> (Node, SimplifyOutcome) {
    simplify_with(node, default_rules(), SimplifyOptions::default())
}

/// Parse and simplify in one step.
pub fn simplify_str(source: &str) -> Result<(Node, SimplifyOutcome), SymbolicError> {
    Ok(simplify(&mathex_parser::parse(source)?))
}

pub fn simplify_with(
    node: &Node,
    rules: &RuleSet,
    options: SimplifyOptions,
) -> (Node, SimplifyOutcome) {
    let mut current = normalized(flatten(node));
    for iteration in 1..=options.max_iterations {
        let next = rewrite_pass(&current, rules);
        if next == current {
            log::debug!("simplify reached a fixpoint after {iteration} passes");
            return (
                unflatten(&current),
                SimplifyOutcome::Fixpoint { iterations: iteration },
            );
        }
        current = next;
    }
    log::debug!(
        "simplify stopped at the iteration cap ({} passes)",
        options.max_iterations
    );
    (unflatten(&current), SimplifyOutcome::IterationCapReached)
}

/// One innermost-first sweep. Children are rewritten before their parent is
/// offered to the rules, and a rewritten child list is respliced so the
/// parent the rules see is in normal form. Opaque subtrees are skipped
/// whole.
fn rewrite_pass(expr: &SymExpr, rules: &RuleSet) -> SymExpr {
    let expr = match expr {
        SymExpr::Add(terms) => normalized_shallow(SymExpr::Add(
            terms.iter().map(|t| rewrite_pass(t, rules)).collect(),
        )),
        SymExpr::Mul(factors) => normalized_shallow(SymExpr::Mul(
            factors.iter().map(|x| rewrite_pass(x, rules)).collect(),
        )),
        SymExpr::Pow(base, exponent) => SymExpr::Pow(
            Box::new(rewrite_pass(base, rules)),
            Box::new(rewrite_pass(exponent, rules)),
        ),
        SymExpr::Neg(inner) => normalized_shallow(SymExpr::Neg(Box::new(rewrite_pass(
            inner, rules,
        )))),
        SymExpr::Call(name, args) => SymExpr::Call(
            name.clone(),
            args.iter().map(|a| rewrite_pass(a, rules)).collect(),
        ),
        SymExpr::Num(_) | SymExpr::Var(_) | SymExpr::Opaque(_) => expr.clone(),
    };
    for group in &rules.groups {
        for rule in &group.rules {
            if let Some(replacement) = rule.apply(&expr) {
                log::trace!("rule {} fired: {:?} -> {:?}", rule.name(), expr, replacement);
                return normalized(replacement);
            }
        }
    }
    expr
}

#[cfg(test)]
mod tests {
    use super::*;
    use mathex_parser::parse;

    fn simplified(source: &str) -> String {
        let (node, _) = simplify(&parse(source).unwrap());
        node.to_string()
    }

    #[test]
    fn constants_fold_across_nesting() {
        assert_eq!(simplified("2 + 3 * 4"), "14");
        assert_eq!(simplified("1 + x + 2"), "x + 3");
        assert_eq!(simplified("2 * x * 3"), "6 * x");
    }

    #[test]
    fn identities_disappear() {
        assert_eq!(simplified("x + 0"), "x");
        assert_eq!(simplified("0 + x"), "x");
        assert_eq!(simplified("1 * x"), "x");
        assert_eq!(simplified("x * 0"), "0");
        assert_eq!(simplified("x ^ 1"), "x");
        assert_eq!(simplified("x ^ 0"), "1");
    }

    #[test]
    fn like_terms_collect() {
        assert_eq!(simplified("x + x"), "2 * x");
        assert_eq!(simplified("2 * x + 3 * x"), "5 * x");
        assert_eq!(simplified("x - x"), "0");
        assert_eq!(simplified("x * x"), "x ^ 2");
        assert_eq!(simplified("x ^ 2 * x"), "x ^ 3");
    }

    #[test]
    fn division_cancels_through_negative_powers() {
        assert_eq!(simplified("x / x"), "1");
        assert_eq!(simplified("x ^ 2 / x"), "x");
    }

    #[test]
    fn already_simple_input_is_a_one_pass_fixpoint() {
        let (node, outcome) = simplify(&parse("x + 3").unwrap());
        assert_eq!(node.to_string(), "x + 3");
        assert_eq!(outcome, SimplifyOutcome::Fixpoint { iterations: 1 });
    }

    #[test]
    fn unsupported_shapes_pass_through_untouched() {
        assert_eq!(simplified("[1 + 1, 2]"), "[1 + 1, 2]");
        assert_eq!(simplified("[1, 2] + x + 0"), "[1, 2] + x");
    }
}
