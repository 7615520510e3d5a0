//! The `==` relation over values.
//!
//! Reflexive, symmetric, and transitive within any single category; not total
//! across categories. Functions are never comparable.

use crate::value::{ErrorValue, Type, Value};

/// Compares two values, following the rules in priority order:
///
/// - an error operand propagates (unless masked by the list rule below);
/// - integers compare numerically regardless of signedness tag;
/// - lists compare length first (`false` on mismatch without inspecting
///   elements), then elementwise left to right, returning at the first
///   `false` or the first error, so an early mismatch masks a later erroring
///   element;
/// - types compare structurally on canonical form, with
///   `vector t n == tuple [t; n]`;
/// - everything else is a category mismatch.
pub fn equals(a: &Value, b: &Value) -> Result<bool, ErrorValue> {
    match (a, b) {
        (Value::Error(e), _) | (_, Value::Error(e)) => Err(e.clone()),
        (Value::Uint(_) | Value::Int(_), Value::Uint(_) | Value::Int(_)) => {
            // Both sides are integers, so as_bigint cannot fail.
            Ok(a.as_bigint() == b.as_bigint())
        }
        (Value::List(xs), Value::List(ys)) => {
            if xs.len() != ys.len() {
                return Ok(false);
            }
            for (x, y) in xs.iter().zip(ys) {
                if !equals(x, y)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (Value::Type(t), Value::Type(u)) => Ok(type_equal(t, u)),
        (Value::Func(_), _) | (_, Value::Func(_)) => {
            Err(ErrorValue::new("functions are not comparable"))
        }
        _ => Err(ErrorValue::new(format!(
            "cannot compare {:?} with {:?}",
            a.category(),
            b.category()
        ))),
    }
}

/// Structural type equality on canonical written form. `vector t n`
/// canonicalizes to `tuple [t; n]`, so a vector and a tuple of `n` copies of
/// `t` are the same type; two zero-length vectors are equal regardless of
/// element type.
pub fn type_equal(a: &Type, b: &Type) -> bool {
    match (a, b) {
        (Type::List(x), Type::List(y)) => type_equal(x, y),
        (Type::Vector(x, n), Type::Vector(y, m)) => n == m && (*n == 0 || type_equal(x, y)),
        (Type::Vector(x, n), Type::Tuple(ts)) | (Type::Tuple(ts), Type::Vector(x, n)) => {
            ts.len() == *n && ts.iter().all(|t| type_equal(x, t))
        }
        (Type::Tuple(xs), Type::Tuple(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| type_equal(x, y))
        }
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_equality_ignores_signedness_tag() {
        assert_eq!(equals(&Value::uint(4), &Value::uint(4)), Ok(true));
        assert_eq!(
            equals(&Value::Int(4.into()), &Value::uint(4)),
            Ok(true),
            "a positive int compares equal to the same uint"
        );
        assert_eq!(equals(&Value::int(-1), &Value::uint(1)), Ok(false));
    }

    #[test]
    fn cross_category_comparison_errors() {
        assert!(equals(&Value::uint(1), &Value::truth(true)).is_err());
        assert!(equals(&Value::List(vec![]), &Value::uint(0)).is_err());
    }

    #[test]
    fn unequal_lengths_never_inspect_elements() {
        let a = Value::List(vec![Value::error("boom")]);
        let b = Value::List(vec![Value::uint(1), Value::uint(2)]);
        assert_eq!(equals(&a, &b), Ok(false));
    }

    #[test]
    fn early_mismatch_masks_later_error() {
        let a = Value::List(vec![Value::uint(1), Value::uint(2), Value::error("boom")]);
        let b = Value::List(vec![Value::uint(1), Value::uint(3), Value::uint(9)]);
        assert_eq!(equals(&a, &b), Ok(false));
    }

    #[test]
    fn error_after_all_true_prefix_propagates() {
        let a = Value::List(vec![Value::uint(1), Value::error("boom")]);
        let b = Value::List(vec![Value::uint(1), Value::uint(2)]);
        assert!(equals(&a, &b).is_err());
    }

    #[test]
    fn vector_tuple_identity() {
        let v = Type::Vector(Box::new(Type::Int), 3);
        let t = Type::Tuple(vec![Type::Int, Type::Int, Type::Int]);
        assert!(type_equal(&v, &t));
        assert!(type_equal(&t, &v));
        assert!(!type_equal(&v, &Type::Tuple(vec![Type::Int, Type::Int])));
        assert!(type_equal(
            &Type::Vector(Box::new(Type::Int), 0),
            &Type::Vector(Box::new(Type::Bool), 0)
        ));
    }

    #[test]
    fn functions_are_never_comparable() {
        let f = Value::Func(std::sync::Arc::new(crate::ast::FunctionDef::new(
            "f",
            vec![],
        )));
        assert!(equals(&f, &f).is_err());
    }
}
