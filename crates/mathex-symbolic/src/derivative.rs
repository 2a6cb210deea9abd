//! Structural differentiation.
//!
//! Works directly on the parsed tree with the standard calculus rules. Any
//! subtree that never mentions the variable differentiates to zero, whatever
//! it contains, so unknown functions of constants are fine. The result is
//! returned exactly as the rules produce it; run it through `simplify` to
//! tidy it up.

use crate::error::SymbolicError;
use mathex_parser::{BinOp, Node, UnOp};

/// Differentiate `node` with respect to `variable`.
pub fn derivative(node: &Node, variable: &str) -> Result<Node, SymbolicError> {
    differentiate(node, variable)
}

/// Parse and differentiate in one step.
pub fn derivative_str(source: &str, variable: &str) -> Result<Node, SymbolicError> {
    derivative(&mathex_parser::parse(source)?, variable)
}

fn depends_on(node: &Node, variable: &str) -> bool {
    let mut found = false;
    node.for_each(&mut |n, _, _| {
        if let Node::Symbol(name) = n {
            if name == variable {
                found = true;
            }
        }
    });
    found
}

fn call(name: &str, arg: Node) -> Node {
    Node::FunctionCall {
        name: name.to_string(),
        args: vec![arg],
    }
}

fn differentiate(node: &Node, variable: &str) -> Result<Node, SymbolicError> {
    if !depends_on(node, variable) {
        return Ok(Node::number(0.0));
    }
    match node {
        Node::Constant(_) => Ok(Node::number(0.0)),
        // The guard above already returned for any other symbol.
        Node::Symbol(_) => Ok(Node::number(1.0)),
        Node::Unary(op, inner) => match op {
            UnOp::Plus => differentiate(inner, variable),
            UnOp::Minus => Ok(Node::unary(UnOp::Minus, differentiate(inner, variable)?)),
            UnOp::Not => Err(SymbolicError::UnsupportedNode("logical negation")),
            UnOp::BitNot => Err(SymbolicError::UnsupportedNode("bitwise negation")),
        },
        Node::Binary(lhs, op, rhs) => match op {
            BinOp::Add | BinOp::Sub => Ok(Node::binary(
                differentiate(lhs, variable)?,
                *op,
                differentiate(rhs, variable)?,
            )),
            // f' * g + f * g'
            BinOp::Mul => Ok(Node::binary(
                Node::binary(differentiate(lhs, variable)?, BinOp::Mul, (**rhs).clone()),
                BinOp::Add,
                Node::binary((**lhs).clone(), BinOp::Mul, differentiate(rhs, variable)?),
            )),
            // (f' * g - f * g') / g ^ 2
            BinOp::Div => Ok(Node::binary(
                Node::binary(
                    Node::binary(differentiate(lhs, variable)?, BinOp::Mul, (**rhs).clone()),
                    BinOp::Sub,
                    Node::binary((**lhs).clone(), BinOp::Mul, differentiate(rhs, variable)?),
                ),
                BinOp::Div,
                Node::binary((**rhs).clone(), BinOp::Pow, Node::number(2.0)),
            )),
            BinOp::Pow => power(node, lhs, rhs, variable),
            BinOp::Mod => Err(SymbolicError::UnsupportedNode("remainder operators")),
            BinOp::ElemMul | BinOp::ElemDiv | BinOp::ElemPow => {
                Err(SymbolicError::UnsupportedNode("element-wise operators"))
            }
            BinOp::AndAnd | BinOp::OrOr => {
                Err(SymbolicError::UnsupportedNode("logical operators"))
            }
            BinOp::BitAnd | BinOp::BitOr => {
                Err(SymbolicError::UnsupportedNode("bitwise operators"))
            }
            BinOp::Equal
            | BinOp::NotEqual
            | BinOp::Less
            | BinOp::LessEqual
            | BinOp::Greater
            | BinOp::GreaterEqual => Err(SymbolicError::UnsupportedNode("comparisons")),
        },
        Node::FunctionCall { name, args } => chain(name, args, variable),
        Node::Conditional { .. } => Err(SymbolicError::UnsupportedNode("conditionals")),
        Node::Range { .. } => Err(SymbolicError::UnsupportedNode("ranges")),
        Node::Matrix(_) => Err(SymbolicError::UnsupportedNode("matrices")),
        Node::Index { .. } => Err(SymbolicError::UnsupportedNode("index expressions")),
        Node::Object(_) => Err(SymbolicError::UnsupportedNode("objects")),
        Node::Block(_) => Err(SymbolicError::UnsupportedNode("statement blocks")),
        Node::Assign { .. } => Err(SymbolicError::UnsupportedNode("assignments")),
        Node::FunctionAssign { .. } => {
            Err(SymbolicError::UnsupportedNode("function definitions"))
        }
    }
}

fn power(node: &Node, base: &Node, exponent: &Node, variable: &str) -> Result<Node, SymbolicError> {
    match (depends_on(base, variable), depends_on(exponent, variable)) {
        // g * f ^ (g - 1) * f'
        (true, false) => {
            let lowered = Node::binary(
                base.clone(),
                BinOp::Pow,
                Node::binary(exponent.clone(), BinOp::Sub, Node::number(1.0)),
            );
            Ok(Node::binary(
                Node::binary(exponent.clone(), BinOp::Mul, lowered),
                BinOp::Mul,
                differentiate(base, variable)?,
            ))
        }
        // f ^ g * log(f) * g'
        (false, true) => Ok(Node::binary(
            Node::binary(node.clone(), BinOp::Mul, call("log", base.clone())),
            BinOp::Mul,
            differentiate(exponent, variable)?,
        )),
        // f ^ g * (g' * log(f) + g * f' / f)
        (true, true) => Ok(Node::binary(
            node.clone(),
            BinOp::Mul,
            Node::binary(
                Node::binary(
                    differentiate(exponent, variable)?,
                    BinOp::Mul,
                    call("log", base.clone()),
                ),
                BinOp::Add,
                Node::binary(
                    Node::binary(exponent.clone(), BinOp::Mul, differentiate(base, variable)?),
                    BinOp::Div,
                    base.clone(),
                ),
            ),
        )),
        (false, false) => Ok(Node::number(0.0)),
    }
}

fn chain(name: &str, args: &[Node], variable: &str) -> Result<Node, SymbolicError> {
    let [arg] = args else {
        return Err(SymbolicError::UnknownFunctionDerivative(name.to_string()));
    };
    let inner = differentiate(arg, variable)?;
    let outer = match name {
        "sin" => call("cos", arg.clone()),
        "cos" => Node::unary(UnOp::Minus, call("sin", arg.clone())),
        "exp" => call("exp", arg.clone()),
        "tan" => {
            return Ok(Node::binary(
                inner,
                BinOp::Div,
                Node::binary(call("cos", arg.clone()), BinOp::Pow, Node::number(2.0)),
            ));
        }
        "log" | "ln" => return Ok(Node::binary(inner, BinOp::Div, arg.clone())),
        "sqrt" => {
            return Ok(Node::binary(
                inner,
                BinOp::Div,
                Node::binary(Node::number(2.0), BinOp::Mul, call("sqrt", arg.clone())),
            ));
        }
        _ => return Err(SymbolicError::UnknownFunctionDerivative(name.to_string())),
    };
    Ok(Node::binary(outer, BinOp::Mul, inner))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(source: &str) -> String {
        derivative_str(source, "x").unwrap().to_string()
    }

    #[test]
    fn constants_and_other_symbols_are_flat() {
        assert_eq!(d("3"), "0");
        assert_eq!(d("x"), "1");
        assert_eq!(d("y"), "0");
        assert_eq!(d("pi"), "0");
    }

    #[test]
    fn sums_differentiate_term_by_term() {
        assert_eq!(d("x + x"), "1 + 1");
        assert_eq!(d("x - 3"), "1 - 0");
        assert_eq!(d("-x"), "-1");
    }

    #[test]
    fn product_and_quotient_rules() {
        assert_eq!(d("3 * x"), "0 * x + 3 * 1");
        assert_eq!(d("1 / x"), "(0 * x - 1 * 1) / x ^ 2");
    }

    #[test]
    fn power_rules_cover_all_three_cases() {
        assert_eq!(d("x ^ 2"), "2 * x ^ (2 - 1) * 1");
        assert_eq!(d("2 ^ x"), "2 ^ x * log(2) * 1");
        assert_eq!(d("x ^ x"), "x ^ x * (1 * log(x) + x * 1 / x)");
    }

    #[test]
    fn chain_rule_table() {
        assert_eq!(d("sin(x)"), "cos(x) * 1");
        assert_eq!(d("cos(x)"), "-sin(x) * 1");
        assert_eq!(d("tan(x)"), "1 / cos(x) ^ 2");
        assert_eq!(d("exp(x)"), "exp(x) * 1");
        assert_eq!(d("log(x)"), "1 / x");
        assert_eq!(d("sqrt(x)"), "1 / (2 * sqrt(x))");
        assert_eq!(d("sin(x ^ 2)"), "cos(x ^ 2) * (2 * x ^ (2 - 1) * 1)");
    }

    #[test]
    fn output_is_left_unsimplified() {
        assert_eq!(d("2 * x"), "0 * x + 2 * 1");
    }

    #[test]
    fn calls_without_the_variable_are_constants() {
        assert_eq!(d("foo(2, 3)"), "0");
    }

    #[test]
    fn unknown_functions_of_the_variable_error() {
        assert!(matches!(
            derivative_str("foo(x)", "x"),
            Err(SymbolicError::UnknownFunctionDerivative(name)) if name == "foo"
        ));
        assert!(matches!(
            derivative_str("log(x, 2)", "x"),
            Err(SymbolicError::UnknownFunctionDerivative(name)) if name == "log"
        ));
    }

    #[test]
    fn non_algebraic_shapes_error() {
        assert!(matches!(
            derivative_str("[x, 1]", "x"),
            Err(SymbolicError::UnsupportedNode("matrices"))
        ));
        assert!(matches!(
            derivative_str("x > 1", "x"),
            Err(SymbolicError::UnsupportedNode("comparisons"))
        ));
        assert!(matches!(
            derivative_str("a = x", "x"),
            Err(SymbolicError::UnsupportedNode("assignments"))
        ));
    }
}
