mod common;

use common::{engine, hints, uints};
use sigil::{
    Body, DispatchError, EngineError, Expr, Format, FunctionDef, HiddenParam, Param, Signature,
    Type, Value,
};
use std::sync::Arc;

fn hidden(name: &str, ty: Expr) -> HiddenParam {
    HiddenParam {
        name: name.to_string(),
        ty,
    }
}

fn param(name: &str, ty: Expr) -> Param {
    Param {
        name: name.to_string(),
        ty,
    }
}

#[test]
fn element_types_are_inferred_from_the_argument() {
    let engine = engine();
    let resolution = engine.resolve("len", &[uints(&[1, 2, 3])], &[]).unwrap();
    assert_eq!(resolution.hidden.get("t"), Some(&Value::Type(Type::Uint)));
    assert_eq!(
        engine.evaluate("len", vec![uints(&[1, 2, 3])], vec![]).unwrap(),
        Value::uint(3)
    );
}

#[test]
fn a_hint_overrides_inference_when_membership_still_holds() {
    let engine = engine();
    let h = hints(&[("t", Value::Type(Type::Int))]);
    let resolution = engine.resolve("len", &[uints(&[1, 2, 3])], &h).unwrap();
    assert_eq!(resolution.hidden.get("t"), Some(&Value::Type(Type::Int)));
    assert_eq!(resolution.param_types, vec![Type::List(Box::new(Type::Int))]);
}

#[test]
fn a_hint_that_breaks_membership_disqualifies() {
    let engine = engine();
    let h = hints(&[("t", Value::Type(Type::Bool))]);
    let err = engine.resolve("len", &[uints(&[1, 2, 3])], &h).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Dispatch(DispatchError::NoMatch { .. })
    ));
}

#[test]
fn a_hint_naming_no_hidden_parameter_disqualifies() {
    let engine = engine();
    let h = hints(&[("n", Value::uint(3))]);
    let err = engine.resolve("len", &[uints(&[1, 2, 3])], &h).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Dispatch(DispatchError::NoMatch { .. })
    ));
}

fn two_hidden() -> FunctionDef {
    FunctionDef::new(
        "pair_check",
        vec![Signature::new(
            vec![hidden("a", Expr::var("type")), hidden("b", Expr::var("type"))],
            vec![param("x", Expr::var("a")), param("y", Expr::var("b"))],
            Expr::var("bool"),
            Body::Expr(Expr::call("eq", vec![Expr::var("x"), Expr::var("y")])),
        )],
    )
}

#[test]
fn hints_must_follow_declaration_order() {
    let mut engine = engine();
    engine.register(two_hidden()).unwrap();
    let args = [Value::uint(1), Value::uint(1)];

    let ordered = hints(&[
        ("a", Value::Type(Type::Uint)),
        ("b", Value::Type(Type::Uint)),
    ]);
    assert!(engine.resolve("pair_check", &args, &ordered).is_ok());

    let reversed = hints(&[
        ("b", Value::Type(Type::Uint)),
        ("a", Value::Type(Type::Uint)),
    ]);
    let err = engine.resolve("pair_check", &args, &reversed).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Dispatch(DispatchError::NoMatch { .. })
    ));
}

#[test]
fn hidden_parameters_never_reach_the_body() {
    let mut engine = engine();
    engine
        .register(FunctionDef::new(
            "leaky",
            vec![Signature::new(
                vec![hidden("t", Expr::var("type"))],
                vec![param("xs", Expr::call("list", vec![Expr::var("t")]))],
                Expr::var("any"),
                // `t` is declared but invisible here: it must not resolve to
                // the inferred binding, nor fall through to a global.
                Body::Expr(Expr::var("t")),
            )],
        ))
        .unwrap();
    let result = engine
        .evaluate("leaky", vec![uints(&[1, 2])], vec![])
        .unwrap();
    assert!(result.as_error().is_some());
}

#[test]
fn vectors_and_tuples_dispatch_only_through_hints() {
    let count: Body = Body::Builtin {
        f: Arc::new(|args: &[Value]| match args {
            [Value::List(xs)] => Value::uint(xs.len() as u64),
            _ => Value::error("expected a list"),
        }),
        widens: false,
    };
    let mut engine = engine();
    engine
        .register(FunctionDef::new(
            "sized",
            vec![
                Signature::new(
                    vec![hidden("t", Expr::var("type"))],
                    vec![param("xs", Expr::call("list", vec![Expr::var("t")]))],
                    Expr::var("uint"),
                    count.clone(),
                ),
                Signature::new(
                    vec![hidden("t", Expr::var("type")), hidden("n", Expr::var("uint"))],
                    vec![param(
                        "xs",
                        Expr::call("vector", vec![Expr::var("t"), Expr::var("n")]),
                    )],
                    Expr::var("uint"),
                    count,
                ),
            ],
        ))
        .unwrap();

    // A plain list carries no length knowledge: the list overload wins and
    // the vector one cannot even evaluate its parameter type.
    let plain = engine.resolve("sized", &[uints(&[1, 2, 3])], &[]).unwrap();
    assert_eq!(plain.signature, 0);
    assert_eq!(
        plain.param_types,
        vec![Type::List(Box::new(Type::Uint))]
    );

    // Supplying the length turns the same argument into a vector call.
    let h = hints(&[("n", Value::uint(3))]);
    let hinted = engine.resolve("sized", &[uints(&[1, 2, 3])], &h).unwrap();
    assert_eq!(hinted.signature, 1);
    assert_eq!(
        hinted.param_types,
        vec![Type::Vector(Box::new(Type::Uint), 3)]
    );
    assert_eq!(hinted.hidden.get("n"), Some(&Value::uint(3)));

    // A wrong length fails membership rather than resolving loosely.
    let h = hints(&[("n", Value::uint(2))]);
    assert!(engine.resolve("sized", &[uints(&[1, 2, 3])], &h).is_err());
}

#[test]
fn dependent_parameters_check_against_earlier_arguments() {
    let mut engine = engine();
    engine.register(common::first_def()).unwrap();

    let resolution = engine
        .resolve("first", &[Value::Type(Type::Uint), uints(&[7, 8])], &[])
        .unwrap();
    assert_eq!(
        resolution.param_types,
        vec![Type::Type, Type::List(Box::new(Type::Uint))]
    );
    assert_eq!(
        engine
            .evaluate("first", vec![Value::Type(Type::Uint), uints(&[7, 8])], vec![])
            .unwrap(),
        Value::uint(7)
    );

    // A list that is not a member of `list t` for the passed `t` fails the
    // precondition rather than resolving loosely.
    let err = engine
        .resolve("first", &[Value::Type(Type::Bool), uints(&[7, 8])], &[])
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Dispatch(DispatchError::NoMatch { .. })
    ));

    // The same list passes or fails depending only on the earlier argument.
    let negatives = Value::List(vec![Value::int(-1)]);
    assert!(engine
        .resolve("first", &[Value::Type(Type::Int), negatives.clone()], &[])
        .is_ok());
    assert!(engine
        .resolve("first", &[Value::Type(Type::Uint), negatives], &[])
        .is_err());
}

#[test]
fn an_unused_unbound_hidden_parameter_is_legal() {
    let mut engine = engine();
    engine
        .register(FunctionDef::new(
            "tagged",
            vec![Signature::new(
                vec![hidden("t", Expr::var("type"))],
                vec![param("n", Expr::var("uint"))],
                // The return type needs `t`; without a hint it stays
                // unresolvable and the compiled return format is opaque.
                Expr::var("t"),
                Body::Expr(Expr::var("n")),
            )],
        ))
        .unwrap();
    let resolution = engine.resolve("tagged", &[Value::uint(5)], &[]).unwrap();
    assert_eq!(resolution.hidden.get("t"), None);

    let artifact = engine.prepare("tagged", &[Value::uint(5)], &[]).unwrap();
    assert_eq!(artifact.ret_format(), &Format::Opaque);
    assert_eq!(
        engine.evaluate("tagged", vec![Value::uint(5)], vec![]).unwrap(),
        Value::uint(5)
    );
}
