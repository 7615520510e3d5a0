use std::fmt;
use std::sync::Arc;

use num_bigint::BigInt;

use crate::value::Value;

/// An expression. Type expressions are ordinary expressions that evaluate to
/// a type value during resolution, so the same form covers bodies, parameter
/// types, and return types.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Int(BigInt),
    Var(String),
    Call {
        func: String,
        args: Vec<Expr>,
        /// Call-site hidden-argument hints, `{name=value}` in surface syntax.
        hints: Vec<(String, Expr)>,
    },
    List(Vec<Expr>),
    If {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn int(n: i64) -> Expr {
        Expr::Int(BigInt::from(n))
    }

    pub fn var(name: impl Into<String>) -> Expr {
        Expr::Var(name.into())
    }

    pub fn call(func: impl Into<String>, args: Vec<Expr>) -> Expr {
        Expr::Call {
            func: func.into(),
            args,
            hints: Vec::new(),
        }
    }

    pub fn call_with_hints(
        func: impl Into<String>,
        args: Vec<Expr>,
        hints: Vec<(String, Expr)>,
    ) -> Expr {
        Expr::Call {
            func: func.into(),
            args,
            hints,
        }
    }

    pub fn list(items: Vec<Expr>) -> Expr {
        Expr::List(items)
    }

    pub fn if_(cond: Expr, then: Expr, otherwise: Expr) -> Expr {
        Expr::If {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    pub fn and(lhs: Expr, rhs: Expr) -> Expr {
        Expr::And(Box::new(lhs), Box::new(rhs))
    }

    pub fn or(lhs: Expr, rhs: Expr) -> Expr {
        Expr::Or(Box::new(lhs), Box::new(rhs))
    }
}

/// A hidden (implicit) parameter, `{name:Type}` in surface syntax. Hidden
/// parameters drive resolution and precondition checking only; they are never
/// visible inside a function body.
#[derive(Clone, Debug, PartialEq)]
pub struct HiddenParam {
    pub name: String,
    pub ty: Expr,
}

/// An explicit (positional) parameter. Its name is in scope in the type
/// expressions of later parameters and in the return type.
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: Expr,
}

/// The executable part of a signature.
#[derive(Clone)]
pub enum Body {
    Expr(Expr),
    Builtin {
        f: BuiltinFn,
        /// The builtin's result may overflow its operands' integer format, so
        /// the compiled return format is widened one step.
        widens: bool,
    },
}

/// A host-provided builtin. Receives explicit argument values only (hidden
/// arguments are never passed through) and reports failures as error values.
pub type BuiltinFn = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Expr(e) => f.debug_tuple("Expr").field(e).finish(),
            Body::Builtin { widens, .. } => f
                .debug_struct("Builtin")
                .field("widens", widens)
                .finish_non_exhaustive(),
        }
    }
}

/// One overload of a function: hidden parameters, explicit parameters, a
/// return type expression, and a body.
#[derive(Clone, Debug)]
pub struct Signature {
    pub hidden: Vec<HiddenParam>,
    pub params: Vec<Param>,
    pub ret: Expr,
    pub body: Body,
}

impl Signature {
    pub fn new(hidden: Vec<HiddenParam>, params: Vec<Param>, ret: Expr, body: Body) -> Self {
        Signature {
            hidden,
            params,
            ret,
            body,
        }
    }

    /// Names declared by this signature (hidden first, then explicit), used
    /// to shadow globals inside its type expressions.
    pub(crate) fn local_names(&self) -> impl Iterator<Item = &str> {
        self.hidden
            .iter()
            .map(|h| h.name.as_str())
            .chain(self.params.iter().map(|p| p.name.as_str()))
    }
}

/// A named function: a nonempty ordered overload set. Overloads are
/// refinement, not ad-hoc overloading: on overlapping inputs all applicable
/// signatures must agree (the resolver does not enforce this; see
/// `Engine::evaluate_signature` for auditing support).
#[derive(Clone, Debug)]
pub struct FunctionDef {
    pub name: String,
    pub signatures: Vec<Signature>,
}

impl FunctionDef {
    pub fn new(name: impl Into<String>, signatures: Vec<Signature>) -> Self {
        FunctionDef {
            name: name.into(),
            signatures,
        }
    }
}
