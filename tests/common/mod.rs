#![allow(dead_code)]

use std::sync::Arc;

use sigil::{corelib, Body, Engine, Expr, FunctionDef, Limits, Param, Signature, Value};

/// An engine with the prelude installed and default limits.
pub fn engine() -> Engine {
    engine_with(Limits::default())
}

pub fn engine_with(limits: Limits) -> Engine {
    let mut engine = Engine::new(limits);
    corelib::install(&mut engine).expect("prelude installs");
    engine
}

pub fn uints(ns: &[u64]) -> Value {
    Value::List(ns.iter().copied().map(Value::uint).collect())
}

pub fn hints(pairs: &[(&str, Value)]) -> Vec<(String, Value)> {
    pairs
        .iter()
        .map(|(n, v)| (n.to_string(), v.clone()))
        .collect()
}

/// `first(t: type, xs: list t) -> t`: the second parameter's type and the
/// return type both depend on the first explicit argument.
pub fn first_def() -> FunctionDef {
    FunctionDef::new(
        "first",
        vec![Signature::new(
            vec![],
            vec![
                Param {
                    name: "t".to_string(),
                    ty: Expr::var("type"),
                },
                Param {
                    name: "xs".to_string(),
                    ty: Expr::call("list", vec![Expr::var("t")]),
                },
            ],
            Expr::var("t"),
            Body::Builtin {
                f: Arc::new(|args: &[Value]| match args {
                    [_, Value::List(xs)] => xs
                        .first()
                        .cloned()
                        .unwrap_or_else(|| Value::error("first of an empty list")),
                    _ => Value::error("expected a type and a list"),
                }),
                widens: false,
            },
        )],
    )
}
