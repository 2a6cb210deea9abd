//! Plain-text rendering with minimal parenthesization. The output reparses
//! to the tree it was printed from.

use crate::precedence::{self, needs_parens, Prec, Side};
use crate::{BinOp, Literal, Node};
use std::fmt;

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(f, self)
    }
}

pub(crate) fn format_number(n: f64) -> String {
    if n.is_nan() {
        "nan".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "inf" } else { "-inf" }.to_string()
    } else if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn escape_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

fn write_child(f: &mut fmt::Formatter<'_>, child: &Node, parent: Prec, side: Side) -> fmt::Result {
    if needs_parens(parent, side, child) {
        write!(f, "(")?;
        write_node(f, child)?;
        write!(f, ")")
    } else {
        write_node(f, child)
    }
}

fn write_node(f: &mut fmt::Formatter<'_>, node: &Node) -> fmt::Result {
    match node {
        Node::Constant(Literal::Number(n)) => write!(f, "{}", format_number(*n)),
        Node::Constant(Literal::Str(s)) => write!(f, "{}", escape_str(s)),
        Node::Constant(Literal::Bool(b)) => write!(f, "{b}"),
        Node::Symbol(name) => write!(f, "{name}"),
        Node::Unary(op, operand) => {
            write!(f, "{}", precedence::unop_symbol(*op))?;
            write_child(f, operand, Prec::Unary, Side::Right)
        }
        Node::Binary(lhs, op, rhs) => {
            let prec = precedence::of_binop(*op);
            write_child(f, lhs, prec, Side::Left)?;
            write!(f, " {} ", precedence::binop_symbol(*op))?;
            // The exponent production starts at unary, so a unary exponent
            // needs no parentheses.
            if matches!(op, BinOp::Pow | BinOp::ElemPow) && matches!(rhs.as_ref(), Node::Unary(..))
            {
                write_node(f, rhs)
            } else {
                write_child(f, rhs, prec, Side::Right)
            }
        }
        Node::FunctionCall { name, args } => {
            write!(f, "{name}(")?;
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write_node(f, arg)?;
            }
            write!(f, ")")
        }
        Node::FunctionAssign { name, params, body } => {
            write!(f, "{name}({}) = ", params.join(", "))?;
            write_node(f, body)
        }
        Node::Assign { target, value } => {
            write_node(f, target)?;
            write!(f, " = ")?;
            write_child(f, value, Prec::Assign, Side::Right)
        }
        Node::Conditional {
            cond,
            then,
            otherwise,
        } => {
            write_child(f, cond, Prec::Conditional, Side::Left)?;
            write!(f, " ? ")?;
            write_branch(f, then)?;
            write!(f, " : ")?;
            write_branch(f, otherwise)
        }
        Node::Range { start, step, end } => {
            write_child(f, start, Prec::Range, Side::Left)?;
            write!(f, ":")?;
            if let Some(step) = step {
                write_child(f, step, Prec::Range, Side::Left)?;
                write!(f, ":")?;
            }
            write_child(f, end, Prec::Range, Side::Right)
        }
        Node::Matrix(rows) => {
            write!(f, "[")?;
            for (r, row) in rows.iter().enumerate() {
                if r > 0 {
                    write!(f, "; ")?;
                }
                for (c, elem) in row.iter().enumerate() {
                    if c > 0 {
                        write!(f, ", ")?;
                    }
                    write_node(f, elem)?;
                }
            }
            write!(f, "]")
        }
        Node::Index { target, dims } => {
            write_child(f, target, Prec::Postfix, Side::Left)?;
            if let [Node::Constant(Literal::Str(field))] = dims.as_slice() {
                if is_identifier(field) {
                    return write!(f, ".{field}");
                }
            }
            write!(f, "[")?;
            for (i, dim) in dims.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write_node(f, dim)?;
            }
            write!(f, "]")
        }
        Node::Object(pairs) => {
            write!(f, "{{")?;
            for (i, (key, value)) in pairs.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                if is_identifier(key) {
                    write!(f, "{key}: ")?;
                } else {
                    write!(f, "{}: ", escape_str(key))?;
                }
                write_node(f, value)?;
            }
            write!(f, "}}")
        }
        Node::Block(entries) => {
            for (i, entry) in entries.iter().enumerate() {
                if i > 0 {
                    writeln!(f)?;
                }
                write_node(f, &entry.node)?;
                if !entry.visible {
                    write!(f, ";")?;
                }
            }
            Ok(())
        }
    }
}

/// A conditional branch: a bare range here would be cut at its `:` when read
/// back, so ranges always get parentheses.
fn write_branch(f: &mut fmt::Formatter<'_>, branch: &Node) -> fmt::Result {
    if matches!(branch, Node::Range { .. }) {
        write!(f, "(")?;
        write_node(f, branch)?;
        write!(f, ")")
    } else {
        write_child(f, branch, Prec::Conditional, Side::Right)
    }
}
