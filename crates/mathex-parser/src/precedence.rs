//! The operator table shared by the parser and both renderers. The parser's
//! productions follow this order level by level; the renderers consult it to
//! decide where parentheses are required.

use crate::{BinOp, Node, UnOp};

/// Binding power classes, loosest first. The discriminant is the power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Prec {
    Assign,
    Conditional,
    Or,
    And,
    BitOr,
    BitAnd,
    Relational,
    Range,
    Additive,
    Multiplicative,
    Unary,
    Power,
    Postfix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
    None,
}

/// Which side of its parent a child sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// The full table, for documentation and tooling.
pub const LEVELS: &[(Prec, Assoc, &[&str])] = &[
    (Prec::Assign, Assoc::Right, &["="]),
    (Prec::Conditional, Assoc::Right, &["?", ":"]),
    (Prec::Or, Assoc::Left, &["||"]),
    (Prec::And, Assoc::Left, &["&&"]),
    (Prec::BitOr, Assoc::Left, &["|"]),
    (Prec::BitAnd, Assoc::Left, &["&"]),
    (
        Prec::Relational,
        Assoc::Left,
        &["==", "!=", "<", "<=", ">", ">="],
    ),
    (Prec::Range, Assoc::None, &[":"]),
    (Prec::Additive, Assoc::Left, &["+", "-"]),
    (Prec::Multiplicative, Assoc::Left, &["*", "/", "%", ".*", "./"]),
    (Prec::Unary, Assoc::Right, &["+", "-", "!", "~"]),
    (Prec::Power, Assoc::Right, &["^", ".^"]),
    (Prec::Postfix, Assoc::Left, &["()", "[]", "."]),
];

pub fn of_binop(op: BinOp) -> Prec {
    match op {
        BinOp::OrOr => Prec::Or,
        BinOp::AndAnd => Prec::And,
        BinOp::BitOr => Prec::BitOr,
        BinOp::BitAnd => Prec::BitAnd,
        BinOp::Equal
        | BinOp::NotEqual
        | BinOp::Less
        | BinOp::LessEqual
        | BinOp::Greater
        | BinOp::GreaterEqual => Prec::Relational,
        BinOp::Add | BinOp::Sub => Prec::Additive,
        BinOp::Mul | BinOp::Div | BinOp::Mod | BinOp::ElemMul | BinOp::ElemDiv => {
            Prec::Multiplicative
        }
        BinOp::Pow | BinOp::ElemPow => Prec::Power,
    }
}

pub fn assoc_of(prec: Prec) -> Assoc {
    match prec {
        Prec::Assign | Prec::Conditional | Prec::Unary | Prec::Power => Assoc::Right,
        Prec::Range => Assoc::None,
        _ => Assoc::Left,
    }
}

/// Binding power of a node, or None for atoms that never need parentheses.
pub fn of_node(node: &Node) -> Option<Prec> {
    match node {
        Node::Binary(_, op, _) => Some(of_binop(*op)),
        Node::Unary(..) => Some(Prec::Unary),
        Node::Range { .. } => Some(Prec::Range),
        Node::Conditional { .. } => Some(Prec::Conditional),
        Node::Assign { .. } | Node::FunctionAssign { .. } => Some(Prec::Assign),
        Node::Constant(_)
        | Node::Symbol(_)
        | Node::FunctionCall { .. }
        | Node::Index { .. }
        | Node::Matrix(_)
        | Node::Object(_)
        | Node::Block(_) => None,
    }
}

/// Shared parenthesization policy: a child is wrapped iff its binding power
/// is lower than the parent's, or equal on the side that would re-associate
/// differently when read back.
pub fn needs_parens(parent: Prec, side: Side, child: &Node) -> bool {
    let child_prec = match of_node(child) {
        Some(p) => p,
        None => return false,
    };
    if child_prec < parent {
        return true;
    }
    if child_prec > parent {
        return false;
    }
    match assoc_of(parent) {
        Assoc::Left => side == Side::Right,
        Assoc::Right => side == Side::Left,
        Assoc::None => true,
    }
}

pub fn binop_symbol(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::Mod => "%",
        BinOp::Pow => "^",
        BinOp::ElemMul => ".*",
        BinOp::ElemDiv => "./",
        BinOp::ElemPow => ".^",
        BinOp::AndAnd => "&&",
        BinOp::OrOr => "||",
        BinOp::BitAnd => "&",
        BinOp::BitOr => "|",
        BinOp::Equal => "==",
        BinOp::NotEqual => "!=",
        BinOp::Less => "<",
        BinOp::LessEqual => "<=",
        BinOp::Greater => ">",
        BinOp::GreaterEqual => ">=",
    }
}

pub fn unop_symbol(op: UnOp) -> &'static str {
    match op {
        UnOp::Plus => "+",
        UnOp::Minus => "-",
        UnOp::Not => "!",
        UnOp::BitNot => "~",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_ordered_by_discriminant() {
        for pair in LEVELS.windows(2) {
            assert!(pair[0].0 < pair[1].0);
        }
    }

    #[test]
    fn table_and_assoc_agree() {
        for (prec, assoc, _) in LEVELS {
            assert_eq!(assoc_of(*prec), *assoc);
        }
    }

    #[test]
    fn every_binop_symbol_is_listed_at_its_level() {
        let ops = [
            BinOp::Add,
            BinOp::Sub,
            BinOp::Mul,
            BinOp::Div,
            BinOp::Mod,
            BinOp::Pow,
            BinOp::ElemMul,
            BinOp::ElemDiv,
            BinOp::ElemPow,
            BinOp::AndAnd,
            BinOp::OrOr,
            BinOp::BitAnd,
            BinOp::BitOr,
            BinOp::Equal,
            BinOp::NotEqual,
            BinOp::Less,
            BinOp::LessEqual,
            BinOp::Greater,
            BinOp::GreaterEqual,
        ];
        for op in ops {
            let prec = of_binop(op);
            let (_, _, symbols) = LEVELS
                .iter()
                .find(|(p, _, _)| *p == prec)
                .copied()
                .unwrap();
            assert!(
                symbols.contains(&binop_symbol(op)),
                "{:?} missing from its level",
                op
            );
        }
    }
}
