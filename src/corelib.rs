//! The prelude: type constructors, equality, and integer arithmetic.
//!
//! Everything here is an ordinary registered function; the engine has no
//! built-in names. Type constructors are functions returning type values,
//! so `list (list int)` is just nested application.

use std::sync::Arc;

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::ast::{Body, BuiltinFn, Expr, FunctionDef, HiddenParam, Param, Signature};
use crate::equality::equals;
use crate::error::RegisterError;
use crate::interpreter::Engine;
use crate::value::{Type, Value};

/// Registers the prelude into an engine. Call before loading user code;
/// user definitions may not reuse these names.
pub fn install(engine: &mut Engine) -> Result<(), RegisterError> {
    engine.register(constant("bool", Type::Bool))?;
    engine.register(constant("int", Type::Int))?;
    engine.register(constant("uint", Type::Uint))?;
    engine.register(constant("any", Type::Any))?;
    engine.register(constant("type", Type::Type))?;
    engine.register(constant("true", Type::True))?;
    engine.register(constant("false", Type::False))?;

    engine.register(list_constructor())?;
    engine.register(vector_constructor())?;
    engine.register(tuple_constructor())?;

    engine.register(eq())?;
    engine.register(len())?;

    engine.register(binary_arith("add", true, |a, b| a + b))?;
    engine.register(binary_arith("mul", true, |a, b| a * b))?;
    engine.register(sub())?;
    engine.register(neg())?;
    Ok(())
}

fn builtin(f: impl Fn(&[Value]) -> Value + Send + Sync + 'static, widens: bool) -> Body {
    Body::Builtin {
        f: Arc::new(f) as BuiltinFn,
        widens,
    }
}

/// A named type value: a zero-argument definition used as a value.
fn constant(name: &str, ty: Type) -> FunctionDef {
    FunctionDef::new(
        name,
        vec![Signature::new(
            vec![],
            vec![],
            Expr::var("type"),
            builtin(move |_| Value::Type(ty.clone()), false),
        )],
    )
}

fn param(name: &str, ty: Expr) -> Param {
    Param {
        name: name.to_string(),
        ty,
    }
}

fn list_constructor() -> FunctionDef {
    FunctionDef::new(
        "list",
        vec![Signature::new(
            vec![],
            vec![param("t", Expr::var("type"))],
            Expr::var("type"),
            builtin(
                |args| match args {
                    [Value::Type(t)] => Value::Type(Type::List(Box::new(t.clone()))),
                    _ => Value::error("list expects a type"),
                },
                false,
            ),
        )],
    )
}

fn vector_constructor() -> FunctionDef {
    FunctionDef::new(
        "vector",
        vec![Signature::new(
            vec![],
            vec![param("t", Expr::var("type")), param("n", Expr::var("uint"))],
            Expr::var("type"),
            builtin(
                |args| match args {
                    [Value::Type(t), n] => match n.as_bigint().and_then(|n| n.to_usize()) {
                        Some(n) => Value::Type(Type::Vector(Box::new(t.clone()), n)),
                        None => Value::error("vector length out of range"),
                    },
                    _ => Value::error("vector expects a type and a length"),
                },
                false,
            ),
        )],
    )
}

fn tuple_constructor() -> FunctionDef {
    FunctionDef::new(
        "tuple",
        vec![Signature::new(
            vec![],
            vec![param(
                "ts",
                Expr::call("list", vec![Expr::var("type")]),
            )],
            Expr::var("type"),
            builtin(
                |args| match args {
                    [Value::List(ts)] => {
                        let mut types = Vec::with_capacity(ts.len());
                        for t in ts {
                            match t.as_type() {
                                Some(t) => types.push(t.clone()),
                                None => return Value::error("tuple expects a list of types"),
                            }
                        }
                        Value::Type(Type::Tuple(types))
                    }
                    _ => Value::error("tuple expects a list of types"),
                },
                false,
            ),
        )],
    )
}

fn eq() -> FunctionDef {
    FunctionDef::new(
        "eq",
        vec![Signature::new(
            vec![],
            vec![param("a", Expr::var("any")), param("b", Expr::var("any"))],
            Expr::var("bool"),
            builtin(
                |args| match args {
                    [a, b] => match equals(a, b) {
                        Ok(v) => Value::truth(v),
                        Err(e) => Value::Error(e),
                    },
                    _ => Value::error("eq expects two arguments"),
                },
                false,
            ),
        )],
    )
}

fn len() -> FunctionDef {
    FunctionDef::new(
        "len",
        vec![Signature::new(
            vec![HiddenParam {
                name: "t".to_string(),
                ty: Expr::var("type"),
            }],
            vec![param("xs", Expr::call("list", vec![Expr::var("t")]))],
            Expr::var("uint"),
            builtin(
                |args| match args {
                    [Value::List(xs)] => Value::uint(xs.len() as u64),
                    _ => Value::error("len expects a list"),
                },
                false,
            ),
        )],
    )
}

/// An arithmetic operation closed over each integer type: a `uint` refinement
/// over the general `int` signature. On overlapping (nonnegative) inputs the
/// two agree, differing only in the resolved return type.
fn binary_arith(
    name: &str,
    widens: bool,
    op: impl Fn(BigInt, BigInt) -> BigInt + Clone + Send + Sync + 'static,
) -> FunctionDef {
    let sig = |ty: &str, op: Box<dyn Fn(BigInt, BigInt) -> BigInt + Send + Sync>| {
        Signature::new(
            vec![],
            vec![param("a", Expr::var(ty)), param("b", Expr::var(ty))],
            Expr::var(ty),
            builtin(
                move |args| match args {
                    [a, b] => match (a.as_bigint(), b.as_bigint()) {
                        (Some(a), Some(b)) => Value::integer(op(a, b)),
                        _ => Value::error("arithmetic expects integers"),
                    },
                    _ => Value::error("arithmetic expects two arguments"),
                },
                widens,
            ),
        )
    };
    let op2 = op.clone();
    FunctionDef::new(name, vec![sig("int", Box::new(op)), sig("uint", Box::new(op2))])
}

fn sub() -> FunctionDef {
    FunctionDef::new(
        "sub",
        vec![Signature::new(
            vec![],
            vec![param("a", Expr::var("int")), param("b", Expr::var("int"))],
            Expr::var("int"),
            builtin(
                |args| match args {
                    [a, b] => match (a.as_bigint(), b.as_bigint()) {
                        (Some(a), Some(b)) => Value::integer(a - b),
                        _ => Value::error("arithmetic expects integers"),
                    },
                    _ => Value::error("arithmetic expects two arguments"),
                },
                true,
            ),
        )],
    )
}

fn neg() -> FunctionDef {
    FunctionDef::new(
        "neg",
        vec![Signature::new(
            vec![],
            vec![param("n", Expr::var("int"))],
            Expr::var("int"),
            builtin(
                |args| match args {
                    [n] => match n.as_bigint() {
                        Some(n) => Value::integer(-n),
                        _ => Value::error("arithmetic expects integers"),
                    },
                    _ => Value::error("arithmetic expects one argument"),
                },
                false,
            ),
        )],
    )
}
