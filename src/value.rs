use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use num_bigint::{BigInt, BigUint, Sign};

use crate::ast::FunctionDef;

/// A type value: the subset of [`Value`] that acts as a membership predicate.
///
/// Derived equality on this enum is representation equality, used for cache
/// keys. Language-level type equality (with the `t^n == tuple [t; n]`
/// identity) is [`crate::equality::type_equal`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    /// The uninhabited type.
    False,
    /// The type whose sole member is the empty list `[]`.
    True,
    /// The type whose members are the type values `true` and `false`.
    Bool,
    Int,
    Uint,
    /// The universal type; every value is a member.
    Any,
    List(Box<Type>),
    Vector(Box<Type>, usize),
    Tuple(Vec<Type>),
    /// The type of types.
    Type,
}

/// A value-level error marker. First class and recoverable only through
/// short-circuit avoidance; distinct from dispatch errors and faults.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ErrorValue {
    pub message: String,
}

impl ErrorValue {
    pub fn new(message: impl Into<String>) -> Self {
        ErrorValue {
            message: message.into(),
        }
    }
}

/// A runtime value. Immutable once constructed; structural sharing is safe.
///
/// There are no boolean values as such: booleans are the type members
/// `Type::True` / `Type::False` used as values, and the sole inhabitant of
/// `true` is the empty list.
#[derive(Clone)]
pub enum Value {
    Uint(BigUint),
    /// Normalized construction keeps only negative integers here; see
    /// [`Value::integer`].
    Int(BigInt),
    List(Vec<Value>),
    Func(Arc<FunctionDef>),
    Error(ErrorValue),
    Type(Type),
}

/// The coarse category of a value, used to fail fast on cross-category
/// operations. No implicit coercion ever crosses categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    Numeric,
    List,
    Function,
    Error,
    Type,
}

impl Value {
    /// Builds an integer value, normalizing nonnegative integers to `Uint`
    /// (a nonnegative literal is a `uint`).
    pub fn integer(n: BigInt) -> Value {
        match n.to_biguint() {
            Some(u) => Value::Uint(u),
            None => Value::Int(n),
        }
    }

    pub fn uint(n: u64) -> Value {
        Value::Uint(BigUint::from(n))
    }

    pub fn int(n: i64) -> Value {
        Value::integer(BigInt::from(n))
    }

    /// The boolean values: the type members `true` / `false`.
    pub fn truth(b: bool) -> Value {
        Value::Type(if b { Type::True } else { Type::False })
    }

    pub fn error(message: impl Into<String>) -> Value {
        Value::Error(ErrorValue::new(message))
    }

    pub fn category(&self) -> Category {
        match self {
            Value::Uint(_) | Value::Int(_) => Category::Numeric,
            Value::List(_) => Category::List,
            Value::Func(_) => Category::Function,
            Value::Error(_) => Category::Error,
            Value::Type(_) => Category::Type,
        }
    }

    /// Whether this value is a type (and may be used as a predicate).
    pub fn is_type(&self) -> bool {
        matches!(self, Value::Type(_))
    }

    pub fn as_error(&self) -> Option<&ErrorValue> {
        match self {
            Value::Error(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<&Type> {
        match self {
            Value::Type(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Type(Type::True) => Some(true),
            Value::Type(Type::False) => Some(false),
            _ => None,
        }
    }

    /// The numeric content of an integer value, regardless of signedness tag.
    pub fn as_bigint(&self) -> Option<BigInt> {
        match self {
            Value::Uint(u) => Some(BigInt::from(u.clone())),
            Value::Int(i) => Some(i.clone()),
            _ => None,
        }
    }
}

// Representation equality: structural, with functions compared by name.
// This backs format-key identity and is distinct from the language's `==`
// relation in `equality`.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Uint(a), Value::Uint(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Func(a), Value::Func(b)) => a.name == b.name,
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Type(a), Value::Type(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Uint(u) => {
                state.write_u8(0);
                u.hash(state);
            }
            Value::Int(i) => {
                state.write_u8(1);
                i.hash(state);
            }
            Value::List(xs) => {
                state.write_u8(2);
                xs.hash(state);
            }
            Value::Func(def) => {
                state.write_u8(3);
                def.name.hash(state);
            }
            Value::Error(e) => {
                state.write_u8(4);
                e.hash(state);
            }
            Value::Type(t) => {
                state.write_u8(5);
                t.hash(state);
            }
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::False => write!(f, "false"),
            Type::True => write!(f, "true"),
            Type::Bool => write!(f, "bool"),
            Type::Int => write!(f, "int"),
            Type::Uint => write!(f, "uint"),
            Type::Any => write!(f, "any"),
            Type::Type => write!(f, "type"),
            Type::List(t) => {
                write!(f, "list ")?;
                fmt_type_atom(t, f)
            }
            Type::Vector(t, n) => {
                write!(f, "vector ")?;
                fmt_type_atom(t, f)?;
                write!(f, " {n}")
            }
            Type::Tuple(ts) => {
                write!(f, "tuple [")?;
                for (i, t) in ts.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{t}")?;
                }
                write!(f, "]")
            }
        }
    }
}

fn fmt_type_atom(t: &Type, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match t {
        Type::List(..) | Type::Vector(..) => write!(f, "({t})"),
        _ => write!(f, "{t}"),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Uint(u) => write!(f, "{u}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::List(xs) => {
                write!(f, "[")?;
                for (i, x) in xs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{x}")?;
                }
                write!(f, "]")
            }
            Value::Func(def) => write!(f, "fn {}", def.name),
            Value::Error(e) => write!(f, "error({})", e.message),
            Value::Type(t) => write!(f, "{t}"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

/// Sign query that tolerates both integer representations.
pub(crate) fn is_nonnegative(n: &BigInt) -> bool {
    n.sign() != Sign::Minus
}
