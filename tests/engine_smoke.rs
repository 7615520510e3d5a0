mod common;

use common::{engine, engine_with};
use sigil::{
    Body, EngineError, Expr, Fault, FunctionDef, Limits, Param, Signature, Type, Value,
};

fn fact() -> FunctionDef {
    FunctionDef::new(
        "fact",
        vec![Signature::new(
            vec![],
            vec![Param {
                name: "n".to_string(),
                ty: Expr::var("uint"),
            }],
            Expr::var("uint"),
            Body::Expr(Expr::if_(
                Expr::call("eq", vec![Expr::var("n"), Expr::int(0)]),
                Expr::int(1),
                Expr::call(
                    "mul",
                    vec![
                        Expr::var("n"),
                        Expr::call(
                            "fact",
                            vec![Expr::call("sub", vec![Expr::var("n"), Expr::int(1)])],
                        ),
                    ],
                ),
            )),
        )],
    )
}

#[test]
fn recursive_user_function_evaluates() {
    let mut engine = engine();
    engine.register(fact()).unwrap();
    let result = engine.evaluate("fact", vec![Value::uint(6)], vec![]).unwrap();
    assert_eq!(result, Value::uint(720));
}

#[test]
fn zero_arg_definitions_act_as_named_values() {
    let mut engine = engine();
    engine
        .register(FunctionDef::new(
            "answer",
            vec![Signature::new(
                vec![],
                vec![],
                Expr::var("uint"),
                Body::Expr(Expr::int(42)),
            )],
        ))
        .unwrap();
    engine
        .register(FunctionDef::new(
            "answer_plus_one",
            vec![Signature::new(
                vec![],
                vec![],
                Expr::var("uint"),
                // Free variable position: resolves through the global table.
                Body::Expr(Expr::call("add", vec![Expr::var("answer"), Expr::int(1)])),
            )],
        ))
        .unwrap();
    assert_eq!(
        engine.evaluate("answer_plus_one", vec![], vec![]).unwrap(),
        Value::uint(43)
    );
}

#[test]
fn boolean_operators_short_circuit_past_errors() {
    let mut engine = engine();
    engine
        .register(FunctionDef::new(
            "guarded",
            vec![Signature::new(
                vec![],
                vec![Param {
                    name: "x".to_string(),
                    ty: Expr::var("any"),
                }],
                Expr::var("bool"),
                // The right operand compares across categories when x is not
                // a number; the left operand must mask it.
                Body::Expr(Expr::or(
                    Expr::call("eq", vec![Expr::var("x"), Expr::var("x")]),
                    Expr::call("eq", vec![Expr::var("x"), Expr::int(0)]),
                )),
            )],
        ))
        .unwrap();
    assert_eq!(
        engine
            .evaluate("guarded", vec![Value::uint(7)], vec![])
            .unwrap(),
        Value::truth(true)
    );
    assert_eq!(
        engine
            .evaluate("guarded", vec![Value::Type(Type::Int)], vec![])
            .unwrap(),
        Value::truth(true)
    );
}

#[test]
fn untaken_branch_errors_are_invisible() {
    let mut engine = engine();
    engine
        .register(FunctionDef::new(
            "safe",
            vec![Signature::new(
                vec![],
                vec![Param {
                    name: "n".to_string(),
                    ty: Expr::var("uint"),
                }],
                Expr::var("uint"),
                Body::Expr(Expr::if_(
                    Expr::call("eq", vec![Expr::var("n"), Expr::int(0)]),
                    Expr::int(0),
                    // Cross-category comparison: an error value if evaluated.
                    Expr::call("eq", vec![Expr::var("n"), Expr::list(vec![])]),
                )),
            )],
        ))
        .unwrap();
    assert_eq!(
        engine.evaluate("safe", vec![Value::uint(0)], vec![]).unwrap(),
        Value::uint(0)
    );
    let taken = engine.evaluate("safe", vec![Value::uint(1)], vec![]).unwrap();
    assert!(taken.as_error().is_some(), "taken branch error surfaces");
}

#[test]
fn error_arguments_propagate_without_dispatch() {
    let engine = engine();
    let result = engine
        .evaluate("add", vec![Value::error("boom"), Value::uint(1)], vec![])
        .unwrap();
    assert_eq!(result, Value::error("boom"));
}

#[test]
fn runaway_recursion_hits_the_depth_bound() {
    let mut engine = engine();
    engine
        .register(FunctionDef::new(
            "forever",
            vec![Signature::new(
                vec![],
                vec![],
                Expr::var("uint"),
                Body::Expr(Expr::call("forever", vec![])),
            )],
        ))
        .unwrap();
    let err = engine.evaluate("forever", vec![], vec![]).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Fault(Fault::DepthExceeded { .. })
    ));
}

#[test]
fn tight_fuel_budget_faults_before_depth() {
    let mut engine = engine_with(Limits {
        max_depth: 1024,
        max_fuel: 200,
    });
    engine.register(fact()).unwrap();
    let err = engine
        .evaluate("fact", vec![Value::uint(1_000)], vec![])
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Fault(Fault::FuelExhausted { limit: 200 })
    ));
}

#[test]
fn registration_rejects_duplicates_and_empty_sets() {
    let mut engine = engine();
    assert!(engine
        .register(FunctionDef::new("eq", vec![]))
        .is_err());
    assert!(engine
        .register(FunctionDef::new(
            "eq",
            vec![Signature::new(
                vec![],
                vec![],
                Expr::var("uint"),
                Body::Expr(Expr::int(0)),
            )],
        ))
        .is_err());
    assert!(engine
        .register(FunctionDef::new(
            "twice",
            vec![Signature::new(
                vec![],
                vec![
                    Param {
                        name: "x".to_string(),
                        ty: Expr::var("int"),
                    },
                    Param {
                        name: "x".to_string(),
                        ty: Expr::var("int"),
                    },
                ],
                Expr::var("int"),
                Body::Expr(Expr::var("x")),
            )],
        ))
        .is_err());
}
