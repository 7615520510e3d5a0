//! Type membership, the coercion lattice, and signature specificity.

use std::cmp::Ordering;

use crate::value::{is_nonnegative, Type, Value};

/// Membership test: whether `value` is a member of `ty`. Total for every
/// well-formed type; a type is strictly a predicate here, independent of the
/// `==` relation.
pub fn is_a(value: &Value, ty: &Type) -> bool {
    match ty {
        Type::Any => true,
        Type::False => false,
        Type::True => matches!(value, Value::List(xs) if xs.is_empty()),
        Type::Bool => matches!(value, Value::Type(Type::True | Type::False)),
        Type::Uint => match value {
            Value::Uint(_) => true,
            Value::Int(n) => is_nonnegative(n),
            _ => false,
        },
        Type::Int => matches!(value, Value::Uint(_) | Value::Int(_)),
        Type::Type => value.is_type(),
        Type::List(t) => match value {
            Value::List(xs) => xs.iter().all(|x| is_a(x, t)),
            _ => false,
        },
        Type::Vector(t, n) => match value {
            Value::List(xs) => xs.len() == *n && xs.iter().all(|x| is_a(x, t)),
            _ => false,
        },
        Type::Tuple(ts) => match value {
            Value::List(xs) => {
                xs.len() == ts.len() && xs.iter().zip(ts).all(|(x, t)| is_a(x, t))
            }
            _ => false,
        },
    }
}

/// Whether every member of `sub` is a member of `sup`.
///
/// The coercions, beyond reflexivity:
///
/// - `false <: t` (uninhabited)
/// - `uint <: int` (the one signature-observable builtin subtype; the
///   converse requires a nonnegative value and fails per call, not statically)
/// - `t <: any`
/// - `list t0 <: list t1` if `t0 <: t1`
/// - `vector t0 n <: list t1` if `t0 <: t1`
/// - `tuple ts <: list t1` if each of `ts <: t1`
/// - `vector t0 m <: vector t1 n` if `t0 <: t1` and `m == n`
/// - `tuple ts <: vector t1 n` / `vector t0 n <: tuple ts` on matching
///   lengths with elementwise coercion
/// - `tuple ts0 <: tuple ts1` pointwise on matching lengths
pub fn subtype(sub: &Type, sup: &Type) -> bool {
    if sub == sup || matches!(sub, Type::False) || matches!(sup, Type::Any) {
        return true;
    }
    match sup {
        Type::Int => matches!(sub, Type::Uint),
        Type::List(t1) => match sub {
            Type::List(t0) | Type::Vector(t0, _) => subtype(t0, t1),
            Type::Tuple(ts) => ts.iter().all(|t| subtype(t, t1)),
            _ => false,
        },
        Type::Vector(t1, n) => match sub {
            Type::Vector(t0, m) => m == n && (*n == 0 || subtype(t0, t1)),
            Type::Tuple(ts) => ts.len() == *n && ts.iter().all(|t| subtype(t, t1)),
            _ => false,
        },
        Type::Tuple(ts1) => match sub {
            Type::Tuple(ts0) => {
                ts0.len() == ts1.len() && ts0.iter().zip(ts1).all(|(a, b)| subtype(a, b))
            }
            Type::Vector(t0, n) => *n == ts1.len() && ts1.iter().all(|t| subtype(t0, t)),
            _ => false,
        },
        _ => false,
    }
}

/// Least upper bound under the coercion lattice, falling back to `any`.
pub fn lub(a: &Type, b: &Type) -> Type {
    if subtype(a, b) {
        return b.clone();
    }
    if subtype(b, a) {
        return a.clone();
    }
    match (a, b) {
        (Type::List(x), Type::List(y)) => Type::List(Box::new(lub(x, y))),
        _ => Type::Any,
    }
}

/// The runtime type a value carries.
///
/// This is deliberately weak for lists: a runtime list knows its element type
/// but not a vector length or a tuple shape, so those hidden arguments are
/// never invented from a plain list; they arrive via call-site hints.
pub fn principal_type(value: &Value) -> Type {
    match value {
        Value::Uint(_) => Type::Uint,
        Value::Int(_) => Type::Int,
        // The boolean values are type members, but `bool` pins them down
        // more tightly than `type` does.
        Value::Type(Type::True | Type::False) => Type::Bool,
        Value::Type(_) => Type::Type,
        Value::List(xs) => {
            let elem = xs
                .iter()
                .map(principal_type)
                .reduce(|a, b| lub(&a, &b))
                .unwrap_or(Type::Any);
            Type::List(Box::new(elem))
        }
        Value::Func(_) | Value::Error(_) => Type::Any,
    }
}

/// The specificity partial order used to pick among multiple matching
/// signatures. `Some(Ordering::Less)` means the first candidate accepts
/// strictly fewer values (is more specific); `None` means incomparable,
/// which the resolver reports as ambiguity.
///
/// This is the extension point flagged by the design notes: the order among
/// arbitrary predicate-style types is not fixed by the language, so front
/// ends may install their own comparator via `Engine::with_specificity`.
pub trait SpecificityOrder: Send + Sync {
    fn compare(&self, a: &[Type], b: &[Type]) -> Option<Ordering>;
}

/// The default order: pointwise comparison of resolved explicit parameter
/// types under the coercion lattice. `vector t n` beats `list t`, `uint`
/// beats `int`, everything beats `any`.
pub struct SubtypeSpecificity;

impl SpecificityOrder for SubtypeSpecificity {
    fn compare(&self, a: &[Type], b: &[Type]) -> Option<Ordering> {
        if a.len() != b.len() {
            return None;
        }
        let a_below = a.iter().zip(b).all(|(x, y)| subtype(x, y));
        let b_below = a.iter().zip(b).all(|(x, y)| subtype(y, x));
        match (a_below, b_below) {
            (true, true) => Some(Ordering::Equal),
            (true, false) => Some(Ordering::Less),
            (false, true) => Some(Ordering::Greater),
            (false, false) => None,
        }
    }
}
