//! The engine facade and expression evaluator.
//!
//! A call expression resolves a signature (consulting hidden-argument
//! inference and the type predicate), obtains a compiled artifact from the
//! format cache, and executes it, re-entering the evaluator for sub-calls.
//! One engine may serve multiple concurrent top-level evaluations; the
//! format cache is the only shared mutable structure.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use crate::ast::{Body, Expr, FunctionDef, Signature};
use crate::error::{DispatchError, EngineError, Fault, RegisterError};
use crate::format::{format_of, widen, CompiledArtifact, Format, FormatCache, FormatKey};
use crate::metrics::CacheMetrics;
use crate::resolve::Resolution;
use crate::typeck::{SpecificityOrder, SubtypeSpecificity};
use crate::value::Value;

/// Host-configured resource bounds. Evaluation that exhausts either bound
/// stops with a [`Fault`], never with a value: non-termination is cut off,
/// not detected.
#[derive(Clone, Copy, Debug)]
pub struct Limits {
    pub max_depth: usize,
    pub max_fuel: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_depth: 256,
            max_fuel: 1_000_000,
        }
    }
}

/// The function name table. Loaded before any call references it and
/// immutable afterwards; recursive and mutually recursive functions refer to
/// each other by name through this table, never by direct pointer.
#[derive(Default)]
struct Registry {
    funcs: FxHashMap<String, Arc<FunctionDef>>,
}

impl Registry {
    fn get(&self, name: &str) -> Option<&Arc<FunctionDef>> {
        self.funcs.get(name)
    }

    fn insert(&mut self, def: FunctionDef) -> Result<(), RegisterError> {
        if def.signatures.is_empty() {
            return Err(RegisterError::EmptyOverloadSet { function: def.name });
        }
        for sig in &def.signatures {
            let mut seen = FxHashSet::default();
            for name in sig.local_names() {
                if !seen.insert(name) {
                    return Err(RegisterError::DuplicateParameter {
                        function: def.name.clone(),
                        name: name.to_string(),
                    });
                }
            }
        }
        if self.funcs.contains_key(&def.name) {
            return Err(RegisterError::DuplicateFunction { name: def.name });
        }
        self.funcs.insert(def.name.clone(), Arc::new(def));
        Ok(())
    }
}

/// Per-evaluation resource accounting: one logical call tree per top-level
/// request.
pub(crate) struct EvalCtx {
    depth: usize,
    fuel_left: u64,
    limits: Limits,
}

impl EvalCtx {
    pub(crate) fn new(limits: Limits) -> Self {
        EvalCtx {
            depth: 0,
            fuel_left: limits.max_fuel,
            limits,
        }
    }

    fn enter(&mut self) -> Result<(), Fault> {
        self.depth += 1;
        if self.depth > self.limits.max_depth {
            Err(Fault::DepthExceeded {
                limit: self.limits.max_depth,
            })
        } else {
            Ok(())
        }
    }

    fn exit(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn spend(&mut self, steps: u64) -> Result<(), Fault> {
        if self.fuel_left < steps {
            Err(Fault::FuelExhausted {
                limit: self.limits.max_fuel,
            })
        } else {
            self.fuel_left -= steps;
            Ok(())
        }
    }
}

/// A lexical scope for one body or type expression: explicit bindings plus
/// the set of signature-local names that shadow globals. A declared name
/// without a binding (an unbound hidden parameter, or a hidden parameter
/// seen from a body) evaluates to an error value rather than leaking to the
/// global table.
pub(crate) struct Scope {
    bindings: FxHashMap<String, Value>,
    declared: FxHashSet<String>,
}

enum Lookup<'a> {
    Bound(&'a Value),
    Shadowed,
    Free,
}

impl Scope {
    pub(crate) fn for_signature(sig: &Signature) -> Self {
        Scope {
            bindings: FxHashMap::default(),
            declared: sig.local_names().map(str::to_string).collect(),
        }
    }

    pub(crate) fn bind(&mut self, name: &str, value: Value) {
        self.bindings.insert(name.to_string(), value);
    }

    fn lookup(&self, name: &str) -> Lookup<'_> {
        match self.bindings.get(name) {
            Some(value) => Lookup::Bound(value),
            None if self.declared.contains(name) => Lookup::Shadowed,
            None => Lookup::Free,
        }
    }
}

/// The engine: registry, format cache, limits, and specificity order.
///
/// Registration happens through `&mut self` before evaluation starts;
/// evaluation is `&self` and may run from several threads at once, sharing
/// the format cache.
pub struct Engine {
    registry: Registry,
    cache: FormatCache,
    limits: Limits,
    specificity: Box<dyn SpecificityOrder>,
}

impl Engine {
    pub fn new(limits: Limits) -> Self {
        Self::with_specificity(limits, Box::new(SubtypeSpecificity))
    }

    pub fn with_specificity(limits: Limits, specificity: Box<dyn SpecificityOrder>) -> Self {
        Engine {
            registry: Registry::default(),
            cache: FormatCache::new(),
            limits,
            specificity,
        }
    }

    /// Loads a function definition. Must precede any call that references
    /// it; forward and mutual references resolve by name at call time.
    pub fn register(&mut self, def: FunctionDef) -> Result<(), RegisterError> {
        self.registry.insert(def)
    }

    /// Evaluates a call. Value-level errors come back as `Ok(Value::Error)`;
    /// dispatch failures and resource faults are [`EngineError`]s.
    pub fn evaluate(
        &self,
        function: &str,
        args: Vec<Value>,
        hints: Vec<(String, Value)>,
    ) -> Result<Value, EngineError> {
        let mut ctx = EvalCtx::new(self.limits);
        self.call(function, args, hints, &mut ctx)
    }

    /// Resolves and compiles a call without executing it, returning the
    /// cached artifact. Two calls with the same format key return the
    /// identical `Arc`.
    pub fn prepare(
        &self,
        function: &str,
        args: &[Value],
        hints: &[(String, Value)],
    ) -> Result<Arc<CompiledArtifact>, EngineError> {
        let def = self.lookup(function)?;
        let mut ctx = EvalCtx::new(self.limits);
        let resolution = self.resolve_in(function, args, hints, &mut ctx)?;
        self.prepare_in(&def, &resolution, &mut ctx)
    }

    /// Runs one specific signature, bypassing specificity selection (the
    /// signature must still accept the arguments). Intended for auditing
    /// the refinement invariant: overlapping signatures of a well-formed
    /// function must agree, and this lets a harness compare them.
    pub fn evaluate_signature(
        &self,
        function: &str,
        index: usize,
        args: Vec<Value>,
        hints: Vec<(String, Value)>,
    ) -> Result<Value, EngineError> {
        let def = self.lookup(function)?;
        let sig = def
            .signatures
            .get(index)
            .ok_or_else(|| DispatchError::NoSuchSignature {
                function: function.to_string(),
                index,
            })?;
        let mut ctx = EvalCtx::new(self.limits);
        ctx.enter().map_err(EngineError::from)?;
        if let Some(error) = first_error(&args, &hints) {
            return Ok(error);
        }
        let resolution = self
            .try_candidate(index, sig, &args, &hints, &mut ctx)?
            .ok_or_else(|| DispatchError::NoMatch {
                function: function.to_string(),
                arity: args.len(),
            })?;
        let artifact = self.prepare_in(&def, &resolution, &mut ctx)?;
        self.run_artifact(&def, &artifact, args, &mut ctx)
    }

    pub fn cache_metrics(&self) -> CacheMetrics {
        self.cache.metrics()
    }

    pub fn reset_cache(&self) {
        self.cache.reset();
    }

    pub(crate) fn limits(&self) -> Limits {
        self.limits
    }

    pub(crate) fn specificity(&self) -> &dyn SpecificityOrder {
        self.specificity.as_ref()
    }

    pub(crate) fn lookup(&self, name: &str) -> Result<Arc<FunctionDef>, DispatchError> {
        self.registry
            .get(name)
            .cloned()
            .ok_or_else(|| DispatchError::UnknownFunction {
                name: name.to_string(),
            })
    }

    pub(crate) fn call(
        &self,
        function: &str,
        args: Vec<Value>,
        hints: Vec<(String, Value)>,
        ctx: &mut EvalCtx,
    ) -> Result<Value, EngineError> {
        ctx.enter().map_err(EngineError::from)?;
        let result = self.call_inner(function, args, hints, ctx);
        ctx.exit();
        result
    }

    fn call_inner(
        &self,
        function: &str,
        args: Vec<Value>,
        hints: Vec<(String, Value)>,
        ctx: &mut EvalCtx,
    ) -> Result<Value, EngineError> {
        trace!(function, "call");
        if let Some(error) = first_error(&args, &hints) {
            return Ok(error);
        }
        let def = self.lookup(function)?;

        // Constant fast path: a nullary single-signature builtin is a named
        // constant (the prelude type constructors). Dispatching it through
        // the artifact pipeline would re-evaluate its own return type
        // expression, which for `type` is the constant itself.
        if args.is_empty() && hints.is_empty() && def.signatures.len() == 1 {
            let sig = &def.signatures[0];
            if sig.hidden.is_empty() && sig.params.is_empty() {
                if let Body::Builtin { f, .. } = &sig.body {
                    ctx.spend(1).map_err(EngineError::from)?;
                    return Ok(f(&[]));
                }
            }
        }

        let resolution = self.resolve_in(function, &args, &hints, ctx)?;
        let artifact = self.prepare_in(&def, &resolution, ctx)?;
        self.run_artifact(&def, &artifact, args, ctx)
    }

    /// Builds the format key for a resolved call and fetches (or compiles)
    /// its artifact. The return-format decision uses hidden bindings alone:
    /// a return type that depends on explicit argument values stays a
    /// runtime-dependent logical type with an opaque physical format.
    pub(crate) fn prepare_in(
        &self,
        def: &FunctionDef,
        resolution: &Resolution,
        ctx: &mut EvalCtx,
    ) -> Result<Arc<CompiledArtifact>, EngineError> {
        let sig = def
            .signatures
            .get(resolution.signature)
            .ok_or_else(|| DispatchError::NoSuchSignature {
                function: def.name.clone(),
                index: resolution.signature,
            })?;

        let mut scope = Scope::for_signature(sig);
        for (name, value) in resolution.hidden.bound() {
            scope.bind(name, value.clone());
        }
        let ret_base = self
            .eval_type_expr(&sig.ret, &scope, ctx)?
            .map(|ty| format_of(&ty))
            .unwrap_or(Format::Opaque);
        let ret_format = match &sig.body {
            Body::Builtin { widens: true, .. } => widen(&ret_base),
            _ => ret_base,
        };

        let key = FormatKey {
            function: def.name.clone(),
            signature: resolution.signature,
            hidden: resolution.hidden.bound_vec(),
            params: resolution.param_types.iter().map(format_of).collect(),
            ret: ret_format,
        };
        let body = sig.body.clone();
        let artifact_key = key.clone();
        self.cache.get_or_compile(&key, move || {
            Ok(CompiledArtifact {
                key: artifact_key,
                body,
            })
        })
    }

    fn run_artifact(
        &self,
        def: &FunctionDef,
        artifact: &CompiledArtifact,
        args: Vec<Value>,
        ctx: &mut EvalCtx,
    ) -> Result<Value, EngineError> {
        match &artifact.body {
            Body::Builtin { f, .. } => {
                ctx.spend(1).map_err(EngineError::from)?;
                Ok(f(&args))
            }
            Body::Expr(body) => {
                let sig = def.signatures.get(artifact.key.signature).ok_or_else(|| {
                    DispatchError::NoSuchSignature {
                        function: def.name.clone(),
                        index: artifact.key.signature,
                    }
                })?;
                // Hidden parameters stay out of the body's scope: they are
                // declared (shadowing globals) but never bound.
                let mut scope = Scope::for_signature(sig);
                for (param, value) in sig.params.iter().zip(args) {
                    scope.bind(&param.name, value);
                }
                self.eval_expr(body, &scope, ctx)
            }
        }
    }

    pub(crate) fn eval_expr(
        &self,
        expr: &Expr,
        scope: &Scope,
        ctx: &mut EvalCtx,
    ) -> Result<Value, EngineError> {
        ctx.spend(1).map_err(EngineError::from)?;
        match expr {
            Expr::Int(n) => Ok(Value::integer(n.clone())),
            Expr::Var(name) => match scope.lookup(name) {
                Lookup::Bound(value) => Ok(value.clone()),
                Lookup::Shadowed => {
                    Ok(Value::error(format!("`{name}` is not bound in this scope")))
                }
                // A free variable is a zero-argument definition used as a
                // named value.
                Lookup::Free => self.call(name, Vec::new(), Vec::new(), ctx),
            },
            Expr::List(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    let value = self.eval_expr(item, scope, ctx)?;
                    if value.as_error().is_some() {
                        return Ok(value);
                    }
                    values.push(value);
                }
                Ok(Value::List(values))
            }
            Expr::Call { func, args, hints } => {
                let mut arg_values = Vec::with_capacity(args.len());
                for arg in args {
                    let value = self.eval_expr(arg, scope, ctx)?;
                    if value.as_error().is_some() {
                        return Ok(value);
                    }
                    arg_values.push(value);
                }
                let mut hint_values = Vec::with_capacity(hints.len());
                for (name, hint) in hints {
                    let value = self.eval_expr(hint, scope, ctx)?;
                    if value.as_error().is_some() {
                        return Ok(value);
                    }
                    hint_values.push((name.clone(), value));
                }
                self.call(func, arg_values, hint_values, ctx)
            }
            Expr::If {
                cond,
                then,
                otherwise,
            } => {
                let cond = self.eval_expr(cond, scope, ctx)?;
                match cond.as_bool() {
                    // Exactly one branch is evaluated; an error in the
                    // untaken branch is invisible.
                    Some(true) => self.eval_expr(then, scope, ctx),
                    Some(false) => self.eval_expr(otherwise, scope, ctx),
                    None => Ok(error_or(cond, "if condition must be a boolean")),
                }
            }
            Expr::And(lhs, rhs) => self.eval_bool_op(lhs, rhs, false, scope, ctx),
            Expr::Or(lhs, rhs) => self.eval_bool_op(lhs, rhs, true, scope, ctx),
        }
    }

    fn eval_bool_op(
        &self,
        lhs: &Expr,
        rhs: &Expr,
        short_on: bool,
        scope: &Scope,
        ctx: &mut EvalCtx,
    ) -> Result<Value, EngineError> {
        let left = self.eval_expr(lhs, scope, ctx)?;
        match left.as_bool() {
            // The right operand is untouched once the left decides.
            Some(value) if value == short_on => Ok(Value::truth(short_on)),
            Some(_) => {
                let right = self.eval_expr(rhs, scope, ctx)?;
                match right.as_bool() {
                    Some(value) => Ok(Value::truth(value)),
                    None => Ok(error_or(right, "boolean operator needs boolean operands")),
                }
            }
            None => Ok(error_or(left, "boolean operator needs boolean operands")),
        }
    }
}

fn first_error(args: &[Value], hints: &[(String, Value)]) -> Option<Value> {
    args.iter()
        .chain(hints.iter().map(|(_, v)| v))
        .find(|v| v.as_error().is_some())
        .cloned()
}

fn error_or(value: Value, message: &str) -> Value {
    if value.as_error().is_some() {
        value
    } else {
        Value::error(message)
    }
}
