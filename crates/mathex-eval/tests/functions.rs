use mathex_builtins::Value;
use mathex_eval::{compile, EvalError, Scope};
use mathex_parser::parse;

fn eval(source: &str, scope: &Scope) -> Result<Value, EvalError> {
    compile(&parse(source).unwrap()).unwrap().evaluate(scope)
}

fn eval_num(source: &str, scope: &Scope) -> f64 {
    match eval(source, scope).unwrap() {
        Value::Num(n) => n,
        other => panic!("expected number from `{source}`, got {other:?}"),
    }
}

#[test]
fn function_assignment_defines_and_yields_the_function() {
    let scope = Scope::empty();
    assert!(matches!(
        eval("f(x) = x ^ 2 + 1", &scope).unwrap(),
        Value::Lambda(_)
    ));
    assert_eq!(eval_num("f(4)", &scope), 17.0);
    assert_eq!(eval_num("f(0)", &scope), 1.0);
}

#[test]
fn multiple_parameters() {
    let scope = Scope::with_builtins();
    eval("hyp(a, b) = sqrt(a ^ 2 + b ^ 2)", &scope).unwrap();
    assert_eq!(eval_num("hyp(3, 4)", &scope), 5.0);
}

#[test]
fn recursion() {
    let scope = Scope::empty();
    eval("fact(n) = n <= 1 ? 1 : n * fact(n - 1)", &scope).unwrap();
    assert_eq!(eval_num("fact(5)", &scope), 120.0);
    assert_eq!(eval_num("fact(1)", &scope), 1.0);
}

#[test]
fn scope_functions_shadow_builtins() {
    let scope = Scope::empty();
    eval("sin(x) = 42 * x", &scope).unwrap();
    assert_eq!(eval_num("sin(2)", &scope), 84.0);
    // A fresh scope still reaches the registered builtin.
    assert_eq!(eval_num("sin(0)", &Scope::empty()), 0.0);
}

#[test]
fn user_function_arity_is_checked() {
    let scope = Scope::empty();
    eval("f(x) = x + 1", &scope).unwrap();
    assert_eq!(
        eval("f(1, 2)", &scope),
        Err(EvalError::Arity {
            name: "f".into(),
            expected: 1,
            got: 2,
        })
    );
}

#[test]
fn calling_a_plain_value_fails() {
    let scope = Scope::empty();
    scope.define("x", Value::Num(5.0));
    assert!(matches!(eval("x(1)", &scope), Err(EvalError::Runtime(_))));
}

#[test]
fn inner_definitions_capture_the_call_frame() {
    let scope = Scope::empty();
    eval("adder(n) = (inc(x) = x + n)", &scope).unwrap();
    assert!(matches!(eval("adder(10)", &scope).unwrap(), Value::Lambda(_)));
    // `inc` was a new name inside the call frame, so it landed in this scope,
    // and its body still sees the `n` from the call that created it.
    assert_eq!(eval_num("inc(5)", &scope), 15.0);
}

#[test]
fn body_assignments_reach_the_defining_scope() {
    let scope = Scope::empty();
    eval("setter(v) = (cache = v)", &scope).unwrap();
    assert_eq!(eval_num("setter(7)", &scope), 7.0);
    assert_eq!(scope.get("cache").unwrap(), Some(Value::Num(7.0)));
}

#[test]
fn parameters_do_not_leak() {
    let scope = Scope::empty();
    eval("f(x) = x * 2", &scope).unwrap();
    eval("f(3)", &scope).unwrap();
    assert_eq!(scope.get("x").unwrap(), None);
}

#[test]
fn bodies_see_the_scope_at_call_time() {
    let scope = Scope::empty();
    eval("f(x) = x + offset", &scope).unwrap();
    match eval("f(1)", &scope) {
        Err(EvalError::Runtime(msg)) => assert!(msg.contains("undefined symbol")),
        other => panic!("expected a runtime error, got {other:?}"),
    }
    scope.define("offset", Value::Num(100.0));
    assert_eq!(eval_num("f(1)", &scope), 101.0);
}
