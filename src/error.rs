//! Engine-level failures. These are never values: value-level errors live in
//! [`crate::value::ErrorValue`] and flow through evaluation as results.

use std::fmt;

/// Registration-time validation failures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegisterError {
    DuplicateFunction { name: String },
    EmptyOverloadSet { function: String },
    DuplicateParameter { function: String, name: String },
}

impl fmt::Display for RegisterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterError::DuplicateFunction { name } => {
                write!(f, "duplicate function definition: {name}")
            }
            RegisterError::EmptyOverloadSet { function } => {
                write!(f, "function {function} has no signatures")
            }
            RegisterError::DuplicateParameter { function, name } => {
                write!(f, "duplicate parameter name {name} in {function}")
            }
        }
    }
}

impl std::error::Error for RegisterError {}

/// A call-site defect detected before any body executes. Reported beside the
/// value domain, never coerced into a value-level error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchError {
    UnknownFunction { name: String },
    /// No signature accepted the call's arguments and hints.
    NoMatch { function: String, arity: usize },
    /// Multiple candidates survive and are incomparable under the
    /// specificity order; the indices are the surviving signatures.
    Ambiguous {
        function: String,
        candidates: Vec<usize>,
    },
    NoSuchSignature { function: String, index: usize },
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::UnknownFunction { name } => write!(f, "unknown function: {name}"),
            DispatchError::NoMatch { function, arity } => {
                write!(f, "no signature of {function} matches {arity} argument(s)")
            }
            DispatchError::Ambiguous {
                function,
                candidates,
            } => write!(
                f,
                "ambiguous call to {function}: signatures {candidates:?} are equally specific"
            ),
            DispatchError::NoSuchSignature { function, index } => {
                write!(f, "{function} has no signature #{index}")
            }
        }
    }
}

impl std::error::Error for DispatchError {}

/// A fatal resource fault. Aborts the in-progress evaluation; not
/// representable as a value and not recoverable by program logic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fault {
    DepthExceeded { limit: usize },
    FuelExhausted { limit: u64 },
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::DepthExceeded { limit } => {
                write!(f, "call depth limit exceeded ({limit})")
            }
            Fault::FuelExhausted { limit } => {
                write!(f, "evaluation fuel exhausted ({limit} steps)")
            }
        }
    }
}

impl std::error::Error for Fault {}

/// Everything `evaluate` can report besides a value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineError {
    Dispatch(DispatchError),
    Fault(Fault),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Dispatch(e) => write!(f, "{e}"),
            EngineError::Fault(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<DispatchError> for EngineError {
    fn from(e: DispatchError) -> Self {
        EngineError::Dispatch(e)
    }
}

impl From<Fault> for EngineError {
    fn from(e: Fault) -> Self {
        EngineError::Fault(e)
    }
}
