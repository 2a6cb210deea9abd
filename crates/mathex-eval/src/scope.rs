//! Mutable evaluation scopes.
//!
//! A scope is a shared mutable map from names to bindings. Scopes form a
//! parent chain for function bodies. A binding is either a plain value or a
//! link aliasing a name in another scope; links are re-followed on every
//! read, so a change to the target is immediately visible through the alias.
//! Chains are bounded to catch cycles.

use crate::EvalError;
use mathex_builtins::{constants, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Longest alias chain a read follows before reporting a cycle.
pub const MAX_LINK_HOPS: usize = 64;

#[derive(Clone)]
pub enum Binding {
    Value(Value),
    Link { scope: Scope, name: String },
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Value(v) => f.debug_tuple("Value").field(v).finish(),
            // The target scope may link back here, so print only the name.
            Binding::Link { name, .. } => f.debug_tuple("Link").field(name).finish(),
        }
    }
}

#[derive(Clone, Default)]
pub struct Scope {
    inner: Rc<RefCell<ScopeInner>>,
}

#[derive(Default)]
struct ScopeInner {
    bindings: HashMap<String, Binding>,
    parent: Option<Scope>,
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        let mut names: Vec<&String> = inner.bindings.keys().collect();
        names.sort();
        f.debug_struct("Scope")
            .field("names", &names)
            .field("has_parent", &inner.parent.is_some())
            .finish()
    }
}

impl Scope {
    /// Scope with no bindings at all, not even constants.
    pub fn empty() -> Scope {
        Scope::default()
    }

    /// Scope seeded with every registered constant (`pi`, `e`, ...). The
    /// seeds are ordinary bindings and can be shadowed by assignment.
    pub fn with_builtins() -> Scope {
        let scope = Scope::default();
        for constant in constants() {
            scope.define(constant.name, Value::Num(constant.value));
        }
        scope
    }

    /// Child scope for a function body. Parameters bind locally; other
    /// assignments write through to the enclosing scope.
    pub fn child(&self) -> Scope {
        Scope {
            inner: Rc::new(RefCell::new(ScopeInner {
                bindings: HashMap::new(),
                parent: Some(self.clone()),
            })),
        }
    }

    /// Bind a value in this scope, shadowing any parent binding.
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.inner
            .borrow_mut()
            .bindings
            .insert(name.into(), Binding::Value(value));
    }

    /// Alias `name` to `target_name` inside `target`. The target does not
    /// have to exist yet; reads fail until it does. Assigning to `name`
    /// replaces the alias with a plain value.
    pub fn link(&self, name: impl Into<String>, target: &Scope, target_name: impl Into<String>) {
        self.inner.borrow_mut().bindings.insert(
            name.into(),
            Binding::Link {
                scope: target.clone(),
                name: target_name.into(),
            },
        );
    }

    fn find_binding(&self, name: &str) -> Option<Binding> {
        let inner = self.inner.borrow();
        if let Some(binding) = inner.bindings.get(name) {
            return Some(binding.clone());
        }
        inner.parent.as_ref().and_then(|p| p.find_binding(name))
    }

    /// Resolve a name, walking the parent chain and following alias links.
    /// Values are cloned out; nothing is cached between reads. A chain
    /// longer than [`MAX_LINK_HOPS`] never reaches a value and reads as an
    /// undefined symbol.
    pub fn get(&self, name: &str) -> Result<Option<Value>, EvalError> {
        let mut scope = self.clone();
        let mut current = name.to_string();
        for _ in 0..MAX_LINK_HOPS {
            match scope.find_binding(&current) {
                None => return Ok(None),
                Some(Binding::Value(value)) => return Ok(Some(value)),
                Some(Binding::Link {
                    scope: target,
                    name: target_name,
                }) => {
                    scope = target;
                    current = target_name;
                }
            }
        }
        Err(EvalError::UndefinedSymbol(name.to_string()))
    }

    /// Assign a value. An existing binding is updated in the scope where it
    /// lives, so assignments inside function bodies reach enclosing scopes; a
    /// brand-new name binds in the outermost scope.
    pub fn set(&self, name: &str, value: Value) {
        if self.inner.borrow().bindings.contains_key(name) {
            self.define(name, value);
            return;
        }
        let parent = self.inner.borrow().parent.clone();
        match parent {
            Some(parent) => parent.set(name, value),
            None => self.define(name, value),
        }
    }

    /// Whether the name currently resolves to a value.
    pub fn contains(&self, name: &str) -> bool {
        matches!(self.get(name), Ok(Some(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_and_get() {
        let scope = Scope::empty();
        assert_eq!(scope.get("x").unwrap(), None);
        scope.define("x", Value::Num(1.0));
        assert_eq!(scope.get("x").unwrap(), Some(Value::Num(1.0)));
    }

    #[test]
    fn seeded_constants_are_shadowable() {
        let scope = Scope::with_builtins();
        assert_eq!(
            scope.get("pi").unwrap(),
            Some(Value::Num(std::f64::consts::PI))
        );
        scope.set("pi", Value::Num(3.0));
        assert_eq!(scope.get("pi").unwrap(), Some(Value::Num(3.0)));

        let fresh = Scope::with_builtins();
        assert_eq!(
            fresh.get("pi").unwrap(),
            Some(Value::Num(std::f64::consts::PI))
        );
    }

    #[test]
    fn child_reads_parent_and_shadows_locally() {
        let parent = Scope::empty();
        parent.define("x", Value::Num(1.0));
        let child = parent.child();
        assert_eq!(child.get("x").unwrap(), Some(Value::Num(1.0)));

        child.define("x", Value::Num(2.0));
        assert_eq!(child.get("x").unwrap(), Some(Value::Num(2.0)));
        assert_eq!(parent.get("x").unwrap(), Some(Value::Num(1.0)));
    }

    #[test]
    fn set_routes_existing_bindings_to_their_scope() {
        let parent = Scope::empty();
        parent.define("x", Value::Num(1.0));
        let child = parent.child();
        child.set("x", Value::Num(5.0));
        assert_eq!(parent.get("x").unwrap(), Some(Value::Num(5.0)));

        child.set("fresh", Value::Num(7.0));
        assert_eq!(parent.get("fresh").unwrap(), Some(Value::Num(7.0)));
    }

    #[test]
    fn links_follow_reassignment() {
        let a = Scope::empty();
        let b = Scope::empty();
        a.link("alias", &b, "x");

        // Forward reference: the target does not exist yet.
        assert_eq!(a.get("alias").unwrap(), None);

        b.define("x", Value::Num(1.0));
        assert_eq!(a.get("alias").unwrap(), Some(Value::Num(1.0)));

        b.define("x", Value::Num(2.0));
        assert_eq!(a.get("alias").unwrap(), Some(Value::Num(2.0)));
    }

    #[test]
    fn assigning_over_a_link_breaks_it() {
        let a = Scope::empty();
        let b = Scope::empty();
        b.define("x", Value::Num(1.0));
        a.link("alias", &b, "x");
        a.set("alias", Value::Num(9.0));
        assert_eq!(a.get("alias").unwrap(), Some(Value::Num(9.0)));
        assert_eq!(b.get("x").unwrap(), Some(Value::Num(1.0)));
    }

    #[test]
    fn link_cycles_are_bounded() {
        let a = Scope::empty();
        let b = Scope::empty();
        a.link("x", &b, "y");
        b.link("y", &a, "x");
        assert_eq!(
            a.get("x").unwrap_err(),
            EvalError::UndefinedSymbol("x".into())
        );
    }

    #[test]
    fn link_chains_within_the_bound_resolve() {
        let s = Scope::empty();
        s.define("v0", Value::Num(42.0));
        for i in 1..=10 {
            s.link(format!("v{i}"), &s, format!("v{}", i - 1));
        }
        assert_eq!(s.get("v10").unwrap(), Some(Value::Num(42.0)));
    }
}
