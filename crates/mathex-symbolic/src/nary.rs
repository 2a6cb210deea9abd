//! N-ary working form for the rewriter.
//!
//! The public tree keeps `+` and `*` binary, which makes "sum of k terms"
//! patterns depend on how the input happened to nest. [`flatten`] collapses
//! nested same-operator subtrees into one n-ary node, turns subtraction into
//! addition of negated terms and division into multiplication by reciprocal
//! powers. [`unflatten`] re-nests to left-leaning binary form, so printing
//! round-trips.

use mathex_parser::{BinOp, Literal, Node, UnOp};
use serde::{Deserialize, Serialize};

/// Rewriter view of an expression. Shapes the rewriter has no rules for
/// (matrices, conditionals, strings, ...) ride along as [`SymExpr::Opaque`]
/// and are reproduced verbatim on output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SymExpr {
    Num(f64),
    Var(String),
    /// Sum of two or more terms.
    Add(Vec<SymExpr>),
    /// Product of two or more factors.
    Mul(Vec<SymExpr>),
    Pow(Box<SymExpr>, Box<SymExpr>),
    Neg(Box<SymExpr>),
    Call(String, Vec<SymExpr>),
    Opaque(Box<Node>),
}

/// Collapse a tree into the n-ary form.
pub fn flatten(node: &Node) -> SymExpr {
    match node {
        Node::Constant(Literal::Number(n)) => SymExpr::Num(*n),
        Node::Symbol(name) => SymExpr::Var(name.clone()),
        Node::Unary(UnOp::Plus, operand) => flatten(operand),
        Node::Unary(UnOp::Minus, operand) => negated(flatten(operand)),
        Node::Binary(lhs, op, rhs) => {
            let (a, b) = (flatten(lhs), flatten(rhs));
            match op {
                BinOp::Add => join_terms(a, b),
                BinOp::Sub => join_terms(a, negated(b)),
                BinOp::Mul => join_factors(a, b),
                BinOp::Div => join_factors(a, reciprocal(b)),
                BinOp::Pow => SymExpr::Pow(Box::new(a), Box::new(b)),
                _ => SymExpr::Opaque(Box::new(node.clone())),
            }
        }
        Node::FunctionCall { name, args } => {
            SymExpr::Call(name.clone(), args.iter().map(flatten).collect())
        }
        other => SymExpr::Opaque(Box::new(other.clone())),
    }
}

fn join_terms(a: SymExpr, b: SymExpr) -> SymExpr {
    let mut terms = Vec::new();
    push_terms(&mut terms, a);
    push_terms(&mut terms, b);
    SymExpr::Add(terms)
}

fn push_terms(terms: &mut Vec<SymExpr>, expr: SymExpr) {
    match expr {
        SymExpr::Add(children) => terms.extend(children),
        other => terms.push(other),
    }
}

fn join_factors(a: SymExpr, b: SymExpr) -> SymExpr {
    let mut factors = Vec::new();
    push_factors(&mut factors, a);
    push_factors(&mut factors, b);
    SymExpr::Mul(factors)
}

fn push_factors(factors: &mut Vec<SymExpr>, expr: SymExpr) {
    match expr {
        SymExpr::Mul(children) => factors.extend(children),
        other => factors.push(other),
    }
}

/// Structural negation. Negating a sum negates each term, so the sum stays
/// one flat node.
pub(crate) fn negated(expr: SymExpr) -> SymExpr {
    match expr {
        SymExpr::Num(n) => SymExpr::Num(-n),
        SymExpr::Neg(inner) => *inner,
        SymExpr::Add(terms) => SymExpr::Add(terms.into_iter().map(negated).collect()),
        other => SymExpr::Neg(Box::new(other)),
    }
}

fn reciprocal(expr: SymExpr) -> SymExpr {
    match expr {
        SymExpr::Pow(base, exponent) => SymExpr::Pow(base, Box::new(negated(*exponent))),
        other => SymExpr::Pow(Box::new(other), Box::new(SymExpr::Num(-1.0))),
    }
}

/// Rebuild a sum without wrapping a single term or an empty list.
pub(crate) fn sum(mut terms: Vec<SymExpr>) -> SymExpr {
    match terms.len() {
        0 => SymExpr::Num(0.0),
        1 => terms.swap_remove(0),
        _ => SymExpr::Add(terms),
    }
}

/// Rebuild a product without wrapping a single factor or an empty list.
pub(crate) fn product(mut factors: Vec<SymExpr>) -> SymExpr {
    match factors.len() {
        0 => SymExpr::Num(1.0),
        1 => factors.swap_remove(0),
        _ => SymExpr::Mul(factors),
    }
}

/// One splice level: same-operator children merge into the parent, trivial
/// wrappers unwrap. Children are assumed normal already.
pub(crate) fn normalized_shallow(expr: SymExpr) -> SymExpr {
    match expr {
        SymExpr::Add(terms) => {
            let mut flat = Vec::with_capacity(terms.len());
            for term in terms {
                push_terms(&mut flat, term);
            }
            sum(flat)
        }
        SymExpr::Mul(factors) => {
            let mut flat = Vec::with_capacity(factors.len());
            for factor in factors {
                push_factors(&mut flat, factor);
            }
            product(flat)
        }
        SymExpr::Neg(inner) => negated(*inner),
        other => other,
    }
}

/// Full renormalization, used on freshly substituted rule output.
pub(crate) fn normalized(expr: SymExpr) -> SymExpr {
    match expr {
        SymExpr::Add(terms) => {
            normalized_shallow(SymExpr::Add(terms.into_iter().map(normalized).collect()))
        }
        SymExpr::Mul(factors) => {
            normalized_shallow(SymExpr::Mul(factors.into_iter().map(normalized).collect()))
        }
        SymExpr::Pow(base, exponent) => SymExpr::Pow(
            Box::new(normalized(*base)),
            Box::new(normalized(*exponent)),
        ),
        SymExpr::Neg(inner) => negated(normalized(*inner)),
        SymExpr::Call(name, args) => {
            SymExpr::Call(name, args.into_iter().map(normalized).collect())
        }
        leaf => leaf,
    }
}

/// Re-nest to the binary tree. Negated terms print as subtraction, negative
/// constant exponents as division, so flattening is invisible in the output.
pub fn unflatten(expr: &SymExpr) -> Node {
    match expr {
        SymExpr::Num(n) => number_node(*n),
        SymExpr::Var(name) => Node::Symbol(name.clone()),
        SymExpr::Neg(inner) => Node::unary(UnOp::Minus, unflatten(inner)),
        SymExpr::Add(terms) => {
            let mut iter = terms.iter();
            let mut acc = match iter.next() {
                Some(first) => unflatten(first),
                None => return Node::number(0.0),
            };
            for term in iter {
                acc = match term {
                    SymExpr::Neg(inner) => Node::binary(acc, BinOp::Sub, unflatten(inner)),
                    SymExpr::Num(n) if *n < 0.0 => {
                        Node::binary(acc, BinOp::Sub, Node::number(-n))
                    }
                    other => Node::binary(acc, BinOp::Add, unflatten(other)),
                };
            }
            acc
        }
        SymExpr::Mul(factors) => {
            let mut iter = factors.iter();
            let mut acc = match iter.next() {
                Some(first) => unflatten(first),
                None => return Node::number(1.0),
            };
            for factor in iter {
                acc = match negative_power(factor) {
                    Some(divisor) => Node::binary(acc, BinOp::Div, divisor),
                    None => Node::binary(acc, BinOp::Mul, unflatten(factor)),
                };
            }
            acc
        }
        SymExpr::Pow(base, exponent) => {
            Node::binary(unflatten(base), BinOp::Pow, unflatten(exponent))
        }
        SymExpr::Call(name, args) => Node::FunctionCall {
            name: name.clone(),
            args: args.iter().map(unflatten).collect(),
        },
        SymExpr::Opaque(node) => (**node).clone(),
    }
}

/// `b^-1` prints as `/ b`, `b^-c` as `/ b^c`.
fn negative_power(factor: &SymExpr) -> Option<Node> {
    let SymExpr::Pow(base, exponent) = factor else {
        return None;
    };
    let SymExpr::Num(e) = exponent.as_ref() else {
        return None;
    };
    if *e >= 0.0 {
        return None;
    }
    if *e == -1.0 {
        Some(unflatten(base))
    } else {
        Some(Node::binary(unflatten(base), BinOp::Pow, Node::number(-e)))
    }
}

/// Negative constants come back as unary minus so the printer's precedence
/// rules apply to them.
fn number_node(n: f64) -> Node {
    if n.is_sign_negative() && !n.is_nan() {
        Node::unary(UnOp::Minus, Node::number(-n))
    } else {
        Node::number(n)
    }
}
