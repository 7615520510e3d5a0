#![forbid(unsafe_code)]

//! Sigil: the signature-resolution and format-compilation core of a small
//! dependently-typed interpreted language.
//!
//! The crate owns the runtime value/type domain, the `==` relation, type
//! membership and subtyping, multi-signature dispatch with hidden (implicit)
//! parameter inference, a memoizing format compiler, and the expression
//! evaluator. Parsing, the full builtin library, and any CLI/REPL front end
//! are external collaborators that drive this core through [`Engine`].

/// Expression and declaration forms consumed by the engine.
pub mod ast;

/// Runtime values and the type subset of the value domain.
pub mod value;

/// The `==` relation over values.
pub mod equality;

/// Type membership, the coercion lattice, and signature specificity.
pub mod typeck;

/// Signature resolution and hidden-argument inference.
pub mod resolve;

/// Physical formats, format keys, and the compiled-artifact cache.
pub mod format;

/// Cache instrumentation counters.
pub mod metrics;

/// Dispatch, fault, and registration errors.
pub mod error;

/// The engine facade and expression evaluator.
pub mod interpreter;

/// Prelude definitions: type constructors and the core builtins.
pub mod corelib;

pub use ast::{Body, Expr, FunctionDef, HiddenParam, Param, Signature};
pub use error::{DispatchError, EngineError, Fault, RegisterError};
pub use format::{CompiledArtifact, Format, FormatKey, IntWidth};
pub use interpreter::{Engine, Limits};
pub use metrics::CacheMetrics;
pub use resolve::{HiddenArgs, Resolution};
pub use typeck::{SpecificityOrder, SubtypeSpecificity};
pub use value::{Category, ErrorValue, Type, Value};
