use mathex_builtins::Value;
use mathex_eval::{compile, EvalError, Scope};
use mathex_parser::parse;

fn eval(source: &str, scope: &Scope) -> Result<Value, EvalError> {
    compile(&parse(source).unwrap()).unwrap().evaluate(scope)
}

#[test]
fn links_resolve_through_evaluation() {
    let shared = Scope::empty();
    let local = Scope::empty();
    local.link("alias", &shared, "x");

    shared.define("x", Value::Num(41.0));
    assert_eq!(eval("alias + 1", &local).unwrap(), Value::Num(42.0));
}

#[test]
fn links_are_followed_on_every_read() {
    let shared = Scope::empty();
    let local = Scope::empty();
    local.link("alias", &shared, "x");
    shared.define("x", Value::Num(1.0));

    let evaluator = compile(&parse("alias * 10").unwrap()).unwrap();
    assert_eq!(evaluator.evaluate(&local).unwrap(), Value::Num(10.0));

    // Same evaluator, same scope: the read must see the new target value.
    shared.define("x", Value::Num(5.0));
    assert_eq!(evaluator.evaluate(&local).unwrap(), Value::Num(50.0));
}

#[test]
fn assigning_over_a_link_breaks_it() {
    let shared = Scope::empty();
    let local = Scope::empty();
    local.link("alias", &shared, "x");
    shared.define("x", Value::Num(1.0));

    eval("alias = 99", &local).unwrap();
    assert_eq!(eval("alias", &local).unwrap(), Value::Num(99.0));
    // The link target is untouched.
    assert_eq!(shared.get("x").unwrap(), Some(Value::Num(1.0)));
}

#[test]
fn link_cycles_are_reported() {
    let a = Scope::empty();
    let b = Scope::empty();
    a.link("p", &b, "q");
    b.link("q", &a, "p");

    assert_eq!(eval("p", &a), Err(EvalError::UndefinedSymbol("p".into())));
}

#[test]
fn dangling_links_read_as_undefined() {
    let shared = Scope::empty();
    let local = Scope::empty();
    local.link("alias", &shared, "x");

    assert_eq!(
        eval("alias", &local),
        Err(EvalError::UndefinedSymbol("alias".into()))
    );
}
