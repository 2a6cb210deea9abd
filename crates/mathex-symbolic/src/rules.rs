//! Rewrite rules and the pattern matcher.
//!
//! A rule is either a pattern (a search expression with placeholders and a
//! replacement template) or a named procedural function. Placeholders are
//! classified by their leading letter: `c…` matches constants only, `v…`
//! matches variables only, anything else matches any subtree. A placeholder
//! repeated within one pattern must bind structurally equal subtrees.
//!
//! Sums and products match commutatively on the n-ary form. A two-term
//! pattern can also rewrite a matching pair inside a longer sum or product,
//! leaving the remaining terms in place, and a lone unrestricted placeholder
//! can absorb all leftover factors, so `c1 * n1` matches `2 * x * y` with
//! `n1 = x * y`.

use crate::error::SymbolicError;
use crate::nary::{flatten, negated, product, sum, SymExpr};
use once_cell::sync::Lazy;
use std::collections::HashMap;

type Bindings = HashMap<String, SymExpr>;

#[derive(Debug, Clone)]
pub struct Rule {
    name: String,
    kind: RuleKind,
}

#[derive(Debug, Clone)]
enum RuleKind {
    Pattern { search: SymExpr, replace: SymExpr },
    Procedural(fn(&SymExpr) -> Option<SymExpr>),
}

impl Rule {
    /// Pattern rule from source text, e.g. `Rule::pattern("double", "2 * n1",
    /// "n1 + n1")`. Both sides are parsed and flattened once, here.
    pub fn pattern(
        name: impl Into<String>,
        search: &str,
        replace: &str,
    ) -> Result<Rule, SymbolicError> {
        let search = flatten(&mathex_parser::parse(search)?);
        let replace = flatten(&mathex_parser::parse(replace)?);
        Ok(Rule {
            name: name.into(),
            kind: RuleKind::Pattern { search, replace },
        })
    }

    /// Procedural rule: a named function returning the rewritten expression,
    /// or `None` when it does not apply.
    pub fn procedural(name: impl Into<String>, apply: fn(&SymExpr) -> Option<SymExpr>) -> Rule {
        Rule {
            name: name.into(),
            kind: RuleKind::Procedural(apply),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn apply(&self, expr: &SymExpr) -> Option<SymExpr> {
        match &self.kind {
            RuleKind::Procedural(apply) => apply(expr),
            RuleKind::Pattern { search, replace } => match (search, expr) {
                (SymExpr::Add(pats), SymExpr::Add(subs)) => {
                    rewrite_nary(pats, subs, replace, NaryOp::Add)
                }
                (SymExpr::Mul(pats), SymExpr::Mul(subs)) => {
                    rewrite_nary(pats, subs, replace, NaryOp::Mul)
                }
                _ => {
                    let mut bindings = Bindings::new();
                    if match_expr(search, expr, &mut bindings) {
                        Some(substitute(replace, &bindings))
                    } else {
                        None
                    }
                }
            },
        }
    }
}

/// Rules sharing one priority level, applied in order.
#[derive(Debug, Clone)]
pub struct RuleGroup {
    pub name: String,
    pub rules: Vec<Rule>,
}

impl RuleGroup {
    pub fn new(name: impl Into<String>, rules: Vec<Rule>) -> RuleGroup {
        RuleGroup {
            name: name.into(),
            rules,
        }
    }
}

/// Ordered rule groups; earlier groups win at each node.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub groups: Vec<RuleGroup>,
}

impl RuleSet {
    pub fn new(groups: Vec<RuleGroup>) -> RuleSet {
        RuleSet { groups }
    }
}

static DEFAULT_RULES: Lazy<RuleSet> = Lazy::new(build_default_rules);

/// The built-in simplification rules: constant folding, identity removal,
/// like-term and power collection, then canonical constant placement.
pub fn default_rules() -> &'static RuleSet {
    &DEFAULT_RULES
}

fn build_default_rules() -> RuleSet {
    RuleSet::new(vec![
        RuleGroup::new(
            "fold",
            vec![
                Rule::procedural("fold-constants", fold_constants),
                Rule::procedural("fold-powers", fold_powers),
                Rule::procedural("fold-negations", fold_negations),
            ],
        ),
        RuleGroup::new(
            "identity",
            vec![
                Rule::procedural("mul-zero", annihilate_zero_products),
                Rule::procedural("add-zero", drop_zero_terms),
                Rule::procedural("mul-one", drop_unit_factors),
                Rule::procedural("pow-identities", collapse_trivial_powers),
            ],
        ),
        RuleGroup::new(
            "collect",
            vec![
                pattern_rule("cancel-terms", add2(var("n1"), neg(var("n1"))), num(0.0)),
                pattern_rule(
                    "coefficient-terms",
                    add2(mul2(var("c1"), var("n1")), mul2(var("c2"), var("n1"))),
                    mul2(add2(var("c1"), var("c2")), var("n1")),
                ),
                pattern_rule(
                    "coefficient-plus-term",
                    add2(mul2(var("c1"), var("n1")), var("n1")),
                    mul2(add2(var("c1"), num(1.0)), var("n1")),
                ),
                pattern_rule(
                    "equal-terms",
                    add2(var("n1"), var("n1")),
                    mul2(num(2.0), var("n1")),
                ),
                pattern_rule(
                    "merge-powers",
                    mul2(pow(var("n1"), var("c1")), pow(var("n1"), var("c2"))),
                    pow(var("n1"), add2(var("c1"), var("c2"))),
                ),
                pattern_rule(
                    "power-times-base",
                    mul2(pow(var("n1"), var("c1")), var("n1")),
                    pow(var("n1"), add2(var("c1"), num(1.0))),
                ),
                pattern_rule(
                    "equal-factors",
                    mul2(var("n1"), var("n1")),
                    pow(var("n1"), num(2.0)),
                ),
                pattern_rule(
                    "nested-powers",
                    pow(pow(var("n1"), var("c1")), var("c2")),
                    pow(var("n1"), mul2(var("c1"), var("c2"))),
                ),
            ],
        ),
        RuleGroup::new(
            "order",
            vec![Rule::procedural("constant-order", position_constants)],
        ),
    ])
}

fn pattern_rule(name: &str, search: SymExpr, replace: SymExpr) -> Rule {
    Rule {
        name: name.to_string(),
        kind: RuleKind::Pattern { search, replace },
    }
}

fn var(name: &str) -> SymExpr {
    SymExpr::Var(name.to_string())
}

fn num(value: f64) -> SymExpr {
    SymExpr::Num(value)
}

fn add2(a: SymExpr, b: SymExpr) -> SymExpr {
    SymExpr::Add(vec![a, b])
}

fn mul2(a: SymExpr, b: SymExpr) -> SymExpr {
    SymExpr::Mul(vec![a, b])
}

fn pow(base: SymExpr, exponent: SymExpr) -> SymExpr {
    SymExpr::Pow(Box::new(base), Box::new(exponent))
}

fn neg(inner: SymExpr) -> SymExpr {
    SymExpr::Neg(Box::new(inner))
}

// Procedural defaults.

/// Merge every literal number in a sum or product into one. The merged
/// constant goes last in a sum and first in a product.
fn fold_constants(expr: &SymExpr) -> Option<SymExpr> {
    match expr {
        SymExpr::Add(terms) => {
            if terms.iter().filter(|t| matches!(t, SymExpr::Num(_))).count() < 2 {
                return None;
            }
            let mut total = 0.0;
            let mut rest = Vec::new();
            for term in terms {
                match term {
                    SymExpr::Num(n) => total += n,
                    other => rest.push(other.clone()),
                }
            }
            rest.push(SymExpr::Num(total));
            Some(sum(rest))
        }
        SymExpr::Mul(factors) => {
            if factors.iter().filter(|x| matches!(x, SymExpr::Num(_))).count() < 2 {
                return None;
            }
            let mut total = 1.0;
            let mut rest = vec![SymExpr::Num(1.0)];
            for factor in factors {
                match factor {
                    SymExpr::Num(n) => total *= n,
                    other => rest.push(other.clone()),
                }
            }
            rest[0] = SymExpr::Num(total);
            Some(product(rest))
        }
        _ => None,
    }
}

/// `c1 ^ c2` with a finite result becomes that number.
fn fold_powers(expr: &SymExpr) -> Option<SymExpr> {
    let SymExpr::Pow(base, exponent) = expr else {
        return None;
    };
    let (SymExpr::Num(b), SymExpr::Num(e)) = (base.as_ref(), exponent.as_ref()) else {
        return None;
    };
    let value = b.powf(*e);
    value.is_finite().then_some(SymExpr::Num(value))
}

/// A negated product folds the sign into its leading constant, and a leading
/// `-1` becomes negation of the rest.
fn fold_negations(expr: &SymExpr) -> Option<SymExpr> {
    match expr {
        SymExpr::Neg(inner) => {
            let SymExpr::Mul(factors) = inner.as_ref() else {
                return None;
            };
            let Some(SymExpr::Num(c)) = factors.first() else {
                return None;
            };
            let mut out = factors.clone();
            out[0] = SymExpr::Num(-c);
            Some(SymExpr::Mul(out))
        }
        SymExpr::Mul(factors) => match factors.first() {
            Some(SymExpr::Num(c)) if *c == -1.0 && factors.len() >= 2 => {
                Some(negated(product(factors[1..].to_vec())))
            }
            _ => None,
        },
        _ => None,
    }
}

fn annihilate_zero_products(expr: &SymExpr) -> Option<SymExpr> {
    let SymExpr::Mul(factors) = expr else {
        return None;
    };
    factors
        .iter()
        .any(|x| matches!(x, SymExpr::Num(n) if *n == 0.0))
        .then_some(SymExpr::Num(0.0))
}

fn drop_zero_terms(expr: &SymExpr) -> Option<SymExpr> {
    let SymExpr::Add(terms) = expr else {
        return None;
    };
    if !terms.iter().any(|t| matches!(t, SymExpr::Num(n) if *n == 0.0)) {
        return None;
    }
    let kept: Vec<SymExpr> = terms
        .iter()
        .filter(|t| !matches!(t, SymExpr::Num(n) if *n == 0.0))
        .cloned()
        .collect();
    Some(sum(kept))
}

fn drop_unit_factors(expr: &SymExpr) -> Option<SymExpr> {
    let SymExpr::Mul(factors) = expr else {
        return None;
    };
    if !factors.iter().any(|x| matches!(x, SymExpr::Num(n) if *n == 1.0)) {
        return None;
    }
    let kept: Vec<SymExpr> = factors
        .iter()
        .filter(|x| !matches!(x, SymExpr::Num(n) if *n == 1.0))
        .cloned()
        .collect();
    Some(product(kept))
}

/// `n ^ 1` is `n`; `n ^ 0` is `1`.
fn collapse_trivial_powers(expr: &SymExpr) -> Option<SymExpr> {
    let SymExpr::Pow(base, exponent) = expr else {
        return None;
    };
    match exponent.as_ref() {
        SymExpr::Num(e) if *e == 1.0 => Some((**base).clone()),
        SymExpr::Num(e) if *e == 0.0 => Some(SymExpr::Num(1.0)),
        _ => None,
    }
}

/// Canonical placement for a lone constant: last in a sum, first in a
/// product. Gives `x + 3` and `2 * x` regardless of input order.
fn position_constants(expr: &SymExpr) -> Option<SymExpr> {
    match expr {
        SymExpr::Add(terms) => {
            if terms.iter().filter(|t| matches!(t, SymExpr::Num(_))).count() != 1 {
                return None;
            }
            let Some(pos) = terms.iter().position(|t| matches!(t, SymExpr::Num(_))) else {
                return None;
            };
            if pos == terms.len() - 1 {
                return None;
            }
            let mut out = terms.clone();
            let constant = out.remove(pos);
            out.push(constant);
            Some(SymExpr::Add(out))
        }
        SymExpr::Mul(factors) => {
            if factors.iter().filter(|x| matches!(x, SymExpr::Num(_))).count() != 1 {
                return None;
            }
            let Some(pos) = factors.iter().position(|x| matches!(x, SymExpr::Num(_))) else {
                return None;
            };
            if pos == 0 {
                return None;
            }
            let mut out = factors.clone();
            let constant = out.remove(pos);
            out.insert(0, constant);
            Some(SymExpr::Mul(out))
        }
        _ => None,
    }
}

// The matcher.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WildcardClass {
    Constant,
    Variable,
    Any,
}

fn wildcard_class(name: &str) -> WildcardClass {
    match name.chars().next() {
        Some('c') => WildcardClass::Constant,
        Some('v') => WildcardClass::Variable,
        _ => WildcardClass::Any,
    }
}

fn bind_wildcard(name: &str, subject: &SymExpr, bindings: &mut Bindings) -> bool {
    let class_ok = match wildcard_class(name) {
        WildcardClass::Constant => matches!(subject, SymExpr::Num(_)),
        WildcardClass::Variable => matches!(subject, SymExpr::Var(_)),
        WildcardClass::Any => true,
    };
    if !class_ok {
        return false;
    }
    match bindings.get(name) {
        Some(bound) => bound == subject,
        None => {
            bindings.insert(name.to_string(), subject.clone());
            true
        }
    }
}

fn match_expr(pattern: &SymExpr, subject: &SymExpr, bindings: &mut Bindings) -> bool {
    match (pattern, subject) {
        (SymExpr::Var(name), _) => bind_wildcard(name, subject, bindings),
        (SymExpr::Num(a), SymExpr::Num(b)) => a == b,
        (SymExpr::Neg(p), SymExpr::Neg(s)) => match_expr(p, s, bindings),
        (SymExpr::Pow(pb, pe), SymExpr::Pow(sb, se)) => {
            match_expr(pb, sb, bindings) && match_expr(pe, se, bindings)
        }
        (SymExpr::Call(pn, pa), SymExpr::Call(sn, sa)) => {
            pn == sn
                && pa.len() == sa.len()
                && pa.iter().zip(sa).all(|(p, s)| match_expr(p, s, bindings))
        }
        (SymExpr::Add(pats), SymExpr::Add(subs)) => match_nary(pats, subs, bindings, NaryOp::Add),
        (SymExpr::Mul(pats), SymExpr::Mul(subs)) => match_nary(pats, subs, bindings, NaryOp::Mul),
        (SymExpr::Opaque(p), SymExpr::Opaque(s)) => p == s,
        _ => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NaryOp {
    Add,
    Mul,
}

fn regroup(op: NaryOp, items: Vec<SymExpr>) -> SymExpr {
    match op {
        NaryOp::Add => sum(items),
        NaryOp::Mul => product(items),
    }
}

/// Match an n-ary pattern against the whole subject. Equal lengths try every
/// pairing; a shorter pattern may let one unrestricted placeholder absorb
/// the leftover terms as a single sum or product.
fn match_nary(pats: &[SymExpr], subs: &[SymExpr], bindings: &mut Bindings, op: NaryOp) -> bool {
    if pats.len() == subs.len() {
        for selection in selections(subs.len(), pats.len()) {
            let mut trial = bindings.clone();
            if match_selection(pats, subs, &selection, &mut trial) {
                *bindings = trial;
                return true;
            }
        }
        return false;
    }
    if pats.len() >= subs.len() {
        return false;
    }
    for (absorber, pat) in pats.iter().enumerate() {
        let SymExpr::Var(name) = pat else {
            continue;
        };
        if wildcard_class(name) != WildcardClass::Any {
            continue;
        }
        let others: Vec<&SymExpr> = pats
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != absorber)
            .map(|(_, p)| p)
            .collect();
        for selection in selections(subs.len(), others.len()) {
            let mut trial = bindings.clone();
            let matched = others
                .iter()
                .zip(&selection)
                .all(|(p, &i)| match_expr(p, &subs[i], &mut trial));
            if !matched {
                continue;
            }
            let rest: Vec<SymExpr> = subs
                .iter()
                .enumerate()
                .filter(|(i, _)| !selection.contains(i))
                .map(|(_, s)| s.clone())
                .collect();
            if bind_wildcard(name, &regroup(op, rest), &mut trial) {
                *bindings = trial;
                return true;
            }
        }
    }
    false
}

fn match_selection(
    pats: &[SymExpr],
    subs: &[SymExpr],
    selection: &[usize],
    bindings: &mut Bindings,
) -> bool {
    pats.iter()
        .zip(selection)
        .all(|(pat, &idx)| match_expr(pat, &subs[idx], bindings))
}

/// Whole-node match first; failing that, rewrite a matching sub-selection of
/// a longer sum or product and keep the remaining terms.
fn rewrite_nary(
    pats: &[SymExpr],
    subs: &[SymExpr],
    replace: &SymExpr,
    op: NaryOp,
) -> Option<SymExpr> {
    if pats.len() > subs.len() {
        return None;
    }
    let mut bindings = Bindings::new();
    if match_nary(pats, subs, &mut bindings, op) {
        return Some(substitute(replace, &bindings));
    }
    if pats.len() < subs.len() {
        for selection in selections(subs.len(), pats.len()) {
            let mut trial = Bindings::new();
            if match_selection(pats, subs, &selection, &mut trial) {
                let mut items = vec![substitute(replace, &trial)];
                items.extend(
                    subs.iter()
                        .enumerate()
                        .filter(|(i, _)| !selection.contains(i))
                        .map(|(_, s)| s.clone()),
                );
                return Some(regroup(op, items));
            }
        }
    }
    None
}

/// Every ordered pick of `k` distinct indices out of `m`.
fn selections(m: usize, k: usize) -> Vec<Vec<usize>> {
    fn extend(
        m: usize,
        k: usize,
        used: &mut Vec<bool>,
        current: &mut Vec<usize>,
        out: &mut Vec<Vec<usize>>,
    ) {
        if current.len() == k {
            out.push(current.clone());
            return;
        }
        for i in 0..m {
            if used[i] {
                continue;
            }
            used[i] = true;
            current.push(i);
            extend(m, k, used, current, out);
            current.pop();
            used[i] = false;
        }
    }
    let mut out = Vec::new();
    extend(
        m,
        k,
        &mut vec![false; m],
        &mut Vec::with_capacity(k),
        &mut out,
    );
    out
}

fn substitute(template: &SymExpr, bindings: &Bindings) -> SymExpr {
    match template {
        SymExpr::Var(name) => match bindings.get(name) {
            Some(bound) => bound.clone(),
            None => template.clone(),
        },
        SymExpr::Add(terms) => {
            SymExpr::Add(terms.iter().map(|t| substitute(t, bindings)).collect())
        }
        SymExpr::Mul(factors) => {
            SymExpr::Mul(factors.iter().map(|x| substitute(x, bindings)).collect())
        }
        SymExpr::Pow(base, exponent) => SymExpr::Pow(
            Box::new(substitute(base, bindings)),
            Box::new(substitute(exponent, bindings)),
        ),
        SymExpr::Neg(inner) => SymExpr::Neg(Box::new(substitute(inner, bindings))),
        SymExpr::Call(name, args) => SymExpr::Call(
            name.clone(),
            args.iter().map(|a| substitute(a, bindings)).collect(),
        ),
        SymExpr::Num(_) | SymExpr::Opaque(_) => template.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nary::unflatten;
    use mathex_parser::parse;

    fn flat(source: &str) -> SymExpr {
        flatten(&parse(source).unwrap())
    }

    fn applied(rule: &Rule, source: &str) -> Option<String> {
        rule.apply(&flat(source))
            .map(|e| unflatten(&crate::nary::normalized(e)).to_string())
    }

    #[test]
    fn constant_wildcards_only_match_numbers() {
        let rule = Rule::pattern("strip", "c1 * n1", "n1").unwrap();
        assert_eq!(applied(&rule, "3 * y"), Some("y".to_string()));
        assert_eq!(applied(&rule, "z * y"), None);
    }

    #[test]
    fn variable_wildcards_only_match_symbols() {
        let rule = Rule::pattern("square", "v1 * v1", "v1 ^ 2").unwrap();
        assert_eq!(applied(&rule, "x * x"), Some("x ^ 2".to_string()));
        assert_eq!(applied(&rule, "sin(x) * sin(x)"), None);
    }

    #[test]
    fn repeated_placeholders_must_bind_equal_subtrees() {
        let rule = Rule::pattern("double", "n1 + n1", "2 * n1").unwrap();
        assert_eq!(applied(&rule, "x + x"), Some("2 * x".to_string()));
        assert_eq!(applied(&rule, "sin(x) + sin(x)"), Some("2 * sin(x)".to_string()));
        assert_eq!(applied(&rule, "x + y"), None);
    }

    #[test]
    fn sums_match_commutatively() {
        let rule = Rule::pattern("strip", "n1 + c1", "n1").unwrap();
        assert_eq!(applied(&rule, "3 + x"), Some("x".to_string()));
        assert_eq!(applied(&rule, "x + 3"), Some("x".to_string()));
    }

    #[test]
    fn one_placeholder_absorbs_leftover_factors() {
        let rule = Rule::pattern("strip", "c1 * n1", "n1").unwrap();
        assert_eq!(applied(&rule, "2 * x * y"), Some("x * y".to_string()));
    }

    #[test]
    fn pair_rewrites_keep_the_other_terms() {
        let rule = Rule::pattern("double", "n1 + n1", "2 * n1").unwrap();
        assert_eq!(applied(&rule, "x + y + x"), Some("2 * x + y".to_string()));
    }

    #[test]
    fn nested_patterns_bind_consistently() {
        let rule = Rule::pattern("collect", "c1 * n1 + c2 * n1", "(c1 + c2) * n1").unwrap();
        assert_eq!(
            applied(&rule, "2 * x * y + 5 * x * y"),
            Some("(2 + 5) * x * y".to_string())
        );
        assert_eq!(applied(&rule, "2 * x + 5 * y"), None);
    }

    #[test]
    fn pattern_sources_must_parse() {
        assert!(matches!(
            Rule::pattern("broken", "+", "x"),
            Err(SymbolicError::Parse(_))
        ));
    }

    #[test]
    fn procedural_rules_apply_directly() {
        let rule = Rule::procedural("fold-constants", fold_constants);
        assert_eq!(applied(&rule, "1 + x + 2"), Some("x + 3".to_string()));
        assert_eq!(applied(&rule, "x + y"), None);
    }
}
