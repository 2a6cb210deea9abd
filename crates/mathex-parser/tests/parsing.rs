use mathex_parser::{parse, parse_many, BinOp, BlockEntry, Literal, Node, UnOp};

fn num(n: f64) -> Node {
    Node::number(n)
}

#[test]
fn literals() {
    assert_eq!(parse("42").unwrap(), num(42.0));
    assert_eq!(parse("4.56").unwrap(), num(4.56));
    assert_eq!(parse("1e-3").unwrap(), num(0.001));
    assert_eq!(parse(".5").unwrap(), num(0.5));
    assert_eq!(
        parse("\"hi\\n\"").unwrap(),
        Node::Constant(Literal::Str("hi\n".to_string()))
    );
    assert_eq!(parse("true").unwrap(), Node::Constant(Literal::Bool(true)));
    assert_eq!(parse("x").unwrap(), Node::symbol("x"));
}

#[test]
fn addition_is_left_associative() {
    assert_eq!(
        parse("2 - 3 - 4").unwrap(),
        Node::binary(Node::binary(num(2.0), BinOp::Sub, num(3.0)), BinOp::Sub, num(4.0))
    );
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    assert_eq!(
        parse("2 + 3 * 4").unwrap(),
        Node::binary(
            num(2.0),
            BinOp::Add,
            Node::binary(num(3.0), BinOp::Mul, num(4.0))
        )
    );
}

#[test]
fn parentheses_override_precedence() {
    assert_eq!(
        parse("(2 + 3) * 4").unwrap(),
        Node::binary(
            Node::binary(num(2.0), BinOp::Add, num(3.0)),
            BinOp::Mul,
            num(4.0)
        )
    );
}

#[test]
fn power_is_right_associative() {
    assert_eq!(
        parse("2 ^ 3 ^ 2").unwrap(),
        Node::binary(
            num(2.0),
            BinOp::Pow,
            Node::binary(num(3.0), BinOp::Pow, num(2.0))
        )
    );
}

#[test]
fn unary_binds_between_multiplication_and_power() {
    // -2^2 is -(2^2)
    assert_eq!(
        parse("-2^2").unwrap(),
        Node::unary(UnOp::Minus, Node::binary(num(2.0), BinOp::Pow, num(2.0)))
    );
    // -2*3 is (-2)*3
    assert_eq!(
        parse("-2*3").unwrap(),
        Node::binary(Node::unary(UnOp::Minus, num(2.0)), BinOp::Mul, num(3.0))
    );
    // a negative exponent needs no parentheses
    assert_eq!(
        parse("2^-3").unwrap(),
        Node::binary(num(2.0), BinOp::Pow, Node::unary(UnOp::Minus, num(3.0)))
    );
}

#[test]
fn elementwise_and_mod_operators() {
    assert_eq!(
        parse("2 .* 3").unwrap(),
        Node::binary(num(2.0), BinOp::ElemMul, num(3.0))
    );
    assert_eq!(
        parse("2.^3").unwrap(),
        Node::binary(num(2.0), BinOp::ElemPow, num(3.0))
    );
    assert_eq!(
        parse("7 % 3").unwrap(),
        Node::binary(num(7.0), BinOp::Mod, num(3.0))
    );
}

#[test]
fn relational_is_looser_than_range() {
    assert_eq!(
        parse("1:n < 5").unwrap(),
        Node::binary(
            Node::Range {
                start: Box::new(num(1.0)),
                step: None,
                end: Box::new(Node::symbol("n")),
            },
            BinOp::Less,
            num(5.0)
        )
    );
}

#[test]
fn ranges_with_and_without_step() {
    assert_eq!(
        parse("1:10").unwrap(),
        Node::Range {
            start: Box::new(num(1.0)),
            step: None,
            end: Box::new(num(10.0)),
        }
    );
    assert_eq!(
        parse("1:2:10").unwrap(),
        Node::Range {
            start: Box::new(num(1.0)),
            step: Some(Box::new(num(2.0))),
            end: Box::new(num(10.0)),
        }
    );
    // the range bound may itself be an additive expression
    assert_eq!(
        parse("1:n+1").unwrap(),
        Node::Range {
            start: Box::new(num(1.0)),
            step: None,
            end: Box::new(Node::binary(Node::symbol("n"), BinOp::Add, num(1.0))),
        }
    );
}

#[test]
fn conditional_parses_and_chains_through_else() {
    let node = parse("a ? 1 : b ? 2 : 3").unwrap();
    match node {
        Node::Conditional { otherwise, .. } => {
            assert!(matches!(*otherwise, Node::Conditional { .. }));
        }
        other => panic!("expected conditional, got {other:?}"),
    }
}

#[test]
fn conditional_colon_does_not_form_a_range() {
    let node = parse("a ? 1 : 2").unwrap();
    assert_eq!(
        node,
        Node::Conditional {
            cond: Box::new(Node::symbol("a")),
            then: Box::new(num(1.0)),
            otherwise: Box::new(num(2.0)),
        }
    );
    // parenthesized ranges inside branches still work
    let node = parse("a ? (1:5) : 2").unwrap();
    match node {
        Node::Conditional { then, .. } => assert!(matches!(*then, Node::Range { .. })),
        other => panic!("expected conditional, got {other:?}"),
    }
}

#[test]
fn assignment_forms() {
    assert_eq!(
        parse("x = 1").unwrap(),
        Node::Assign {
            target: Box::new(Node::symbol("x")),
            value: Box::new(num(1.0)),
        }
    );
    // right-associative chain
    let node = parse("a = b = 2").unwrap();
    match node {
        Node::Assign { value, .. } => assert!(matches!(*value, Node::Assign { .. })),
        other => panic!("expected assignment, got {other:?}"),
    }
    // indexed target
    let node = parse("m[1, 2] = 7").unwrap();
    match node {
        Node::Assign { target, .. } => assert!(matches!(*target, Node::Index { .. })),
        other => panic!("expected assignment, got {other:?}"),
    }
}

#[test]
fn function_definition_sugar() {
    assert_eq!(
        parse("f(x, y) = x + y").unwrap(),
        Node::FunctionAssign {
            name: "f".to_string(),
            params: vec!["x".to_string(), "y".to_string()],
            body: Box::new(Node::binary(
                Node::symbol("x"),
                BinOp::Add,
                Node::symbol("y")
            )),
        }
    );
}

#[test]
fn calls_and_member_access() {
    assert_eq!(
        parse("f(1, x)").unwrap(),
        Node::FunctionCall {
            name: "f".to_string(),
            args: vec![num(1.0), Node::symbol("x")],
        }
    );
    assert_eq!(
        parse("a.b").unwrap(),
        Node::Index {
            target: Box::new(Node::symbol("a")),
            dims: vec![Node::Constant(Literal::Str("b".to_string()))],
        }
    );
    // chained member access nests
    let node = parse("a.b.c").unwrap();
    match node {
        Node::Index { target, .. } => assert!(matches!(*target, Node::Index { .. })),
        other => panic!("expected index, got {other:?}"),
    }
}

#[test]
fn index_with_multiple_selectors() {
    assert_eq!(
        parse("m[1, 2]").unwrap(),
        Node::Index {
            target: Box::new(Node::symbol("m")),
            dims: vec![num(1.0), num(2.0)],
        }
    );
    let node = parse("m[1:2, 3]").unwrap();
    match node {
        Node::Index { dims, .. } => {
            assert!(matches!(dims[0], Node::Range { .. }));
            assert_eq!(dims[1], num(3.0));
        }
        other => panic!("expected index, got {other:?}"),
    }
}

#[test]
fn matrix_literals() {
    assert_eq!(
        parse("[1, 2; 3, 4]").unwrap(),
        Node::Matrix(vec![vec![num(1.0), num(2.0)], vec![num(3.0), num(4.0)]])
    );
    assert_eq!(parse("[]").unwrap(), Node::Matrix(vec![]));
    assert_eq!(
        parse("[1; 2]").unwrap(),
        Node::Matrix(vec![vec![num(1.0)], vec![num(2.0)]])
    );
    // newlines inside brackets are layout
    assert_eq!(
        parse("[1, 2;\n 3, 4]").unwrap(),
        parse("[1, 2; 3, 4]").unwrap()
    );
}

#[test]
fn object_literals() {
    assert_eq!(
        parse("{a: 1, \"b c\": 2}").unwrap(),
        Node::Object(vec![
            ("a".to_string(), num(1.0)),
            ("b c".to_string(), num(2.0)),
        ])
    );
    assert_eq!(parse("{}").unwrap(), Node::Object(vec![]));
}

#[test]
fn blocks_track_visibility() {
    let node = parse("a = 1; b = 2\nc").unwrap();
    match node {
        Node::Block(entries) => {
            let flags: Vec<bool> = entries.iter().map(|e| e.visible).collect();
            assert_eq!(flags, vec![false, true, true]);
        }
        other => panic!("expected block, got {other:?}"),
    }
}

#[test]
fn newline_separated_entries_are_visible() {
    let node = parse("a = 1\nb = 2").unwrap();
    match node {
        Node::Block(entries) => {
            assert!(entries.iter().all(|e| e.visible));
            assert_eq!(entries.len(), 2);
        }
        other => panic!("expected block, got {other:?}"),
    }
}

#[test]
fn single_suppressed_statement_still_becomes_a_block() {
    assert_eq!(
        parse("2 + 3;").unwrap(),
        Node::Block(vec![BlockEntry {
            node: parse("2 + 3").unwrap(),
            visible: false,
        }])
    );
}

#[test]
fn comments_are_ignored() {
    assert_eq!(parse("1 + 2 # trailing note").unwrap(), parse("1 + 2").unwrap());
    assert_eq!(parse("# leading\n1 + 2").unwrap(), parse("1 + 2").unwrap());
}

#[test]
fn newlines_inside_parentheses_are_layout() {
    assert_eq!(parse("(1 +\n 2)").unwrap(), parse("1 + 2").unwrap());
    assert_eq!(parse("f(\n 1,\n 2\n)").unwrap(), parse("f(1, 2)").unwrap());
}

#[test]
fn parse_many_keeps_inputs_independent() {
    let nodes = parse_many(&["2 + 3", "x = 1"]).unwrap();
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0], parse("2 + 3").unwrap());
    assert!(parse_many(&["2 + 3", "y ="]).is_err());
}

#[test]
fn ast_serializes_and_deserializes() {
    let tree = parse("f(x) = x^2 + 1").unwrap();
    let json = serde_json::to_string(&tree).unwrap();
    let back: Node = serde_json::from_str(&json).unwrap();
    assert_eq!(back, tree);
}
