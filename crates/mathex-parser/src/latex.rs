//! LaTeX rendering. Follows the same parenthesization policy as Display,
//! except where TeX structure (fractions, exponent braces, cases, matrix
//! environments) already delimits the operands.

use crate::display::{format_number, is_identifier};
use crate::precedence::{needs_parens, of_binop, Prec, Side};
use crate::{BinOp, Literal, Node, UnOp};
use once_cell::sync::Lazy;
use std::collections::HashMap;

static SYMBOL_TEX: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("pi", "\\pi"),
        ("tau", "\\tau"),
        ("inf", "\\infty"),
        ("nan", "\\mathrm{NaN}"),
        ("alpha", "\\alpha"),
        ("beta", "\\beta"),
        ("gamma", "\\gamma"),
        ("delta", "\\delta"),
        ("epsilon", "\\epsilon"),
        ("theta", "\\theta"),
        ("lambda", "\\lambda"),
        ("mu", "\\mu"),
        ("sigma", "\\sigma"),
        ("phi", "\\phi"),
        ("omega", "\\omega"),
    ]
    .into_iter()
    .collect()
});

static FUNCTION_TEX: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("sin", "\\sin"),
        ("cos", "\\cos"),
        ("tan", "\\tan"),
        ("asin", "\\arcsin"),
        ("acos", "\\arccos"),
        ("atan", "\\arctan"),
        ("sinh", "\\sinh"),
        ("cosh", "\\cosh"),
        ("tanh", "\\tanh"),
        ("exp", "\\exp"),
        ("log", "\\ln"),
        ("log10", "\\log_{10}"),
        ("log2", "\\log_{2}"),
        ("min", "\\min"),
        ("max", "\\max"),
    ]
    .into_iter()
    .collect()
});

pub fn to_tex(node: &Node) -> String {
    tex(node)
}

fn infix_symbol(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul | BinOp::ElemMul => "\\cdot",
        BinOp::Div | BinOp::ElemDiv => "/",
        BinOp::Mod => "\\bmod",
        BinOp::Pow | BinOp::ElemPow => "^",
        BinOp::AndAnd => "\\wedge",
        BinOp::OrOr => "\\vee",
        BinOp::BitAnd => "\\&",
        BinOp::BitOr => "|",
        BinOp::Equal => "=",
        BinOp::NotEqual => "\\neq",
        BinOp::Less => "<",
        BinOp::LessEqual => "\\leq",
        BinOp::Greater => ">",
        BinOp::GreaterEqual => "\\geq",
    }
}

fn child(node: &Node, parent: Prec, side: Side) -> String {
    if needs_parens(parent, side, node) {
        format!("\\left({}\\right)", tex(node))
    } else {
        tex(node)
    }
}

fn symbol_tex(name: &str) -> String {
    if let Some(mapped) = SYMBOL_TEX.get(name) {
        (*mapped).to_string()
    } else if name.chars().count() > 1 {
        format!("\\mathrm{{{name}}}")
    } else {
        name.to_string()
    }
}

fn tex(node: &Node) -> String {
    match node {
        Node::Constant(Literal::Number(n)) => {
            if n.is_nan() {
                "\\mathrm{NaN}".to_string()
            } else if n.is_infinite() {
                if *n > 0.0 {
                    "\\infty".to_string()
                } else {
                    "-\\infty".to_string()
                }
            } else {
                format_number(*n)
            }
        }
        Node::Constant(Literal::Str(s)) => format!("\\text{{\"{s}\"}}"),
        Node::Constant(Literal::Bool(b)) => format!("\\mathrm{{{b}}}"),
        Node::Symbol(name) => symbol_tex(name),
        Node::Unary(op, operand) => {
            let inner = child(operand, Prec::Unary, Side::Right);
            match op {
                UnOp::Plus => format!("+{inner}"),
                UnOp::Minus => format!("-{inner}"),
                UnOp::Not => format!("\\neg {inner}"),
                UnOp::BitNot => format!("\\sim {inner}"),
            }
        }
        Node::Binary(lhs, op, rhs) => {
            let prec = of_binop(*op);
            match op {
                // A fraction delimits its operands on its own.
                BinOp::Div | BinOp::ElemDiv => {
                    format!("\\frac{{{}}}{{{}}}", tex(lhs), tex(rhs))
                }
                // So do exponent braces.
                BinOp::Pow | BinOp::ElemPow => {
                    format!("{}^{{{}}}", child(lhs, prec, Side::Left), tex(rhs))
                }
                _ => format!(
                    "{} {} {}",
                    child(lhs, prec, Side::Left),
                    infix_symbol(*op),
                    child(rhs, prec, Side::Right)
                ),
            }
        }
        Node::FunctionCall { name, args } => {
            let rendered: Vec<String> = args.iter().map(tex).collect();
            match (name.as_str(), args.len()) {
                ("sqrt", 1) => format!("\\sqrt{{{}}}", rendered[0]),
                ("abs", 1) => format!("\\left|{}\\right|", rendered[0]),
                _ => {
                    let head = FUNCTION_TEX
                        .get(name.as_str())
                        .map(|s| (*s).to_string())
                        .unwrap_or_else(|| {
                            if name.chars().count() > 1 {
                                format!("\\mathrm{{{name}}}")
                            } else {
                                name.clone()
                            }
                        });
                    format!("{}\\left({}\\right)", head, rendered.join(", "))
                }
            }
        }
        Node::FunctionAssign { name, params, body } => {
            format!(
                "{}\\left({}\\right):={}",
                symbol_tex(name),
                params.join(", "),
                tex(body)
            )
        }
        Node::Assign { target, value } => {
            format!("{}:={}", tex(target), child(value, Prec::Assign, Side::Right))
        }
        Node::Conditional {
            cond,
            then,
            otherwise,
        } => format!(
            "\\begin{{cases}}{} & \\text{{if }}{}\\\\{} & \\text{{otherwise}}\\end{{cases}}",
            tex(then),
            tex(cond),
            tex(otherwise)
        ),
        Node::Range { start, step, end } => {
            let mut out = child(start, Prec::Range, Side::Left);
            out.push(':');
            if let Some(step) = step {
                out.push_str(&child(step, Prec::Range, Side::Left));
                out.push(':');
            }
            out.push_str(&child(end, Prec::Range, Side::Right));
            out
        }
        Node::Matrix(rows) => {
            let body = rows
                .iter()
                .map(|row| row.iter().map(tex).collect::<Vec<_>>().join(" & "))
                .collect::<Vec<_>>()
                .join("\\\\");
            format!("\\begin{{bmatrix}}{body}\\end{{bmatrix}}")
        }
        Node::Index { target, dims } => {
            let base = child(target, Prec::Postfix, Side::Left);
            if let [Node::Constant(Literal::Str(field))] = dims.as_slice() {
                if is_identifier(field) {
                    return format!("{base}.\\mathrm{{{field}}}");
                }
            }
            let rendered: Vec<String> = dims.iter().map(tex).collect();
            format!("{}_{{{}}}", base, rendered.join(", "))
        }
        Node::Object(pairs) => {
            let body = pairs
                .iter()
                .map(|(key, value)| {
                    if is_identifier(key) {
                        format!("{}: {}", key, tex(value))
                    } else {
                        format!("\\text{{\"{key}\"}}: {}", tex(value))
                    }
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("\\left\\{{{body}\\right\\}}")
        }
        Node::Block(entries) => entries
            .iter()
            .map(|e| tex(&e.node))
            .collect::<Vec<_>>()
            .join("\\\\"),
    }
}
