//! Tree traversal and rewriting. All three entry points are non-destructive:
//! the receiver is never mutated, rewrites build fresh trees.

use crate::{BlockEntry, Node};

impl Node {
    /// Ordered child list. Structural metadata (operator kinds, names,
    /// visibility flags, object keys) is not a child.
    pub fn children(&self) -> Vec<&Node> {
        match self {
            Node::Constant(_) | Node::Symbol(_) => Vec::new(),
            Node::Unary(_, operand) => vec![operand],
            Node::Binary(lhs, _, rhs) => vec![lhs, rhs],
            Node::FunctionCall { args, .. } => args.iter().collect(),
            Node::FunctionAssign { body, .. } => vec![body],
            Node::Assign { target, value } => vec![target, value],
            Node::Conditional {
                cond,
                then,
                otherwise,
            } => vec![cond, then, otherwise],
            Node::Range { start, step, end } => match step {
                Some(step) => vec![start, step, end],
                None => vec![start, end],
            },
            Node::Matrix(rows) => rows.iter().flatten().collect(),
            Node::Index { target, dims } => {
                let mut out = Vec::with_capacity(dims.len() + 1);
                out.push(target.as_ref());
                out.extend(dims.iter());
                out
            }
            Node::Object(pairs) => pairs.iter().map(|(_, v)| v).collect(),
            Node::Block(entries) => entries.iter().map(|e| &e.node).collect(),
        }
    }

    /// Rebuild this node with replacement children in `children()` order.
    /// The replacement list must have exactly as many entries.
    fn with_children(&self, new_children: Vec<Node>) -> Node {
        debug_assert_eq!(new_children.len(), self.children().len());
        let mut it = new_children.into_iter();
        let mut take = move || it.next().unwrap();
        match self {
            Node::Constant(_) | Node::Symbol(_) => self.clone(),
            Node::Unary(op, _) => Node::Unary(*op, Box::new(take())),
            Node::Binary(_, op, _) => Node::Binary(Box::new(take()), *op, Box::new(take())),
            Node::FunctionCall { name, args } => Node::FunctionCall {
                name: name.clone(),
                args: (0..args.len()).map(|_| take()).collect(),
            },
            Node::FunctionAssign { name, params, .. } => Node::FunctionAssign {
                name: name.clone(),
                params: params.clone(),
                body: Box::new(take()),
            },
            Node::Assign { .. } => Node::Assign {
                target: Box::new(take()),
                value: Box::new(take()),
            },
            Node::Conditional { .. } => Node::Conditional {
                cond: Box::new(take()),
                then: Box::new(take()),
                otherwise: Box::new(take()),
            },
            Node::Range { step, .. } => {
                let start = Box::new(take());
                let step = step.as_ref().map(|_| Box::new(take()));
                let end = Box::new(take());
                Node::Range { start, step, end }
            }
            Node::Matrix(rows) => Node::Matrix(
                rows.iter()
                    .map(|row| row.iter().map(|_| take()).collect())
                    .collect(),
            ),
            Node::Index { dims, .. } => Node::Index {
                target: Box::new(take()),
                dims: (0..dims.len()).map(|_| take()).collect(),
            },
            Node::Object(pairs) => Node::Object(
                pairs
                    .iter()
                    .map(|(key, _)| (key.clone(), take()))
                    .collect(),
            ),
            Node::Block(entries) => Node::Block(
                entries
                    .iter()
                    .map(|e| BlockEntry {
                        node: take(),
                        visible: e.visible,
                    })
                    .collect(),
            ),
        }
    }

    /// Pre-order rewrite. The callback returns a replacement or None to keep
    /// the node; recursion continues into the children of whichever tree the
    /// callback chose.
    pub fn transform(&self, f: &mut dyn FnMut(&Node) -> Option<Node>) -> Node {
        let current = f(self).unwrap_or_else(|| self.clone());
        let new_children: Vec<Node> = current
            .children()
            .into_iter()
            .map(|c| c.transform(f))
            .collect();
        current.with_children(new_children)
    }

    /// Read-only pre-order walk. The callback sees each node with its path
    /// (child indices from the root) and its parent.
    pub fn for_each(&self, f: &mut dyn FnMut(&Node, &[usize], Option<&Node>)) {
        fn walk(
            node: &Node,
            parent: Option<&Node>,
            path: &mut Vec<usize>,
            f: &mut dyn FnMut(&Node, &[usize], Option<&Node>),
        ) {
            f(node, path, parent);
            for (i, c) in node.children().into_iter().enumerate() {
                path.push(i);
                walk(c, Some(node), path, f);
                path.pop();
            }
        }
        let mut path = Vec::new();
        walk(self, None, &mut path, f);
    }

    /// Shape-preserving bottom-up rebuild. Children of the original tree are
    /// always visited; the callback then gets the rebuilt node together with
    /// the original path and parent, and may swap in a replacement.
    pub fn map(
        &self,
        f: &mut dyn FnMut(&Node, &[usize], Option<&Node>) -> Option<Node>,
    ) -> Node {
        fn walk(
            node: &Node,
            parent: Option<&Node>,
            path: &mut Vec<usize>,
            f: &mut dyn FnMut(&Node, &[usize], Option<&Node>) -> Option<Node>,
        ) -> Node {
            let new_children: Vec<Node> = node
                .children()
                .into_iter()
                .enumerate()
                .map(|(i, c)| {
                    path.push(i);
                    let mapped = walk(c, Some(node), path, f);
                    path.pop();
                    mapped
                })
                .collect();
            let rebuilt = node.with_children(new_children);
            f(&rebuilt, path, parent).unwrap_or(rebuilt)
        }
        let mut path = Vec::new();
        walk(self, None, &mut path, f)
    }
}

#[cfg(test)]
mod tests {
    use crate::{parse, Literal, Node};

    #[test]
    fn children_round_trip_through_with_children() {
        let tree = parse("f(1 + 2, [3, 4; 5, 6], {a: 7})").unwrap();
        let copies: Vec<Node> = tree.children().into_iter().cloned().collect();
        assert_eq!(tree.with_children(copies), tree);
    }

    #[test]
    fn transform_replaces_symbols_and_recurses_into_replacements() {
        let tree = parse("x + y").unwrap();
        let out = tree.transform(&mut |n| match n {
            Node::Symbol(s) if s == "x" => Some(parse("a * b").unwrap()),
            _ => None,
        });
        assert_eq!(out.to_string(), "a * b + y");
    }

    #[test]
    fn for_each_paths_address_every_node() {
        let tree = parse("1 + 2 * 3").unwrap();
        let mut seen = Vec::new();
        tree.for_each(&mut |node, path, parent| {
            seen.push((node.to_string(), path.to_vec(), parent.is_some()));
        });
        assert_eq!(seen[0], ("1 + 2 * 3".to_string(), vec![], false));
        assert!(seen.contains(&("2 * 3".to_string(), vec![1], true)));
        assert!(seen.contains(&("3".to_string(), vec![1, 1], true)));
    }

    #[test]
    fn map_sees_parents_for_context_sensitive_rewrites() {
        // Decrement numeric selectors, but only directly under an Index.
        let tree = parse("m[2, n + 1] + 2").unwrap();
        let out = tree.map(&mut |node, _path, parent| {
            if !matches!(parent, Some(Node::Index { .. })) {
                return None;
            }
            match node {
                Node::Constant(Literal::Number(n)) => Some(Node::number(n - 1.0)),
                _ => None,
            }
        });
        // The 2 outside the index and the 1 nested inside the addition are
        // untouched.
        assert_eq!(out.to_string(), "m[1, n + 1] + 2");
    }

    #[test]
    fn traversal_leaves_the_original_alone() {
        let tree = parse("x + 1").unwrap();
        let before = tree.clone();
        let _ = tree.transform(&mut |_| Some(Node::number(0.0)));
        assert_eq!(tree, before);
    }
}
