//! Signature resolution and hidden-argument inference.
//!
//! Resolution is data-driven candidate filtering: every signature of the
//! callee is tried against the call's explicit arguments and hidden-argument
//! hints, and the survivors are ranked by the engine's specificity order.
//! Hidden arguments exist purely to drive resolution and precondition
//! checking; they are never visible to a function body.

use std::cmp::Ordering;

use num_bigint::BigUint;
use tracing::debug;

use crate::ast::{Expr, Signature};
use crate::error::DispatchError;
use crate::error::EngineError;
use crate::interpreter::{Engine, EvalCtx, Scope};
use crate::typeck::{is_a, principal_type};
use crate::value::{Type, Value};

/// A partial assignment of hidden parameters, kept in declaration order.
/// Built fresh per call-site resolution and consumed into a format key.
#[derive(Clone, Debug, PartialEq)]
pub struct HiddenArgs {
    entries: Vec<(String, Option<Value>)>,
}

impl HiddenArgs {
    pub(crate) fn for_signature(sig: &Signature) -> Self {
        HiddenArgs {
            entries: sig
                .hidden
                .iter()
                .map(|h| (h.name.clone(), None))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_ref())
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Binds a declared hidden parameter. Returns `false` for undeclared
    /// names; existing bindings are never overwritten.
    pub(crate) fn bind(&mut self, name: &str, value: Value) -> bool {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => {
                if slot.is_none() {
                    *slot = Some(value);
                }
                true
            }
            None => false,
        }
    }

    /// Bound entries in declaration order.
    pub fn bound(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries
            .iter()
            .filter_map(|(n, v)| v.as_ref().map(|v| (n.as_str(), v)))
    }

    pub(crate) fn bound_vec(&self) -> Vec<(String, Value)> {
        self.bound()
            .map(|(n, v)| (n.to_string(), v.clone()))
            .collect()
    }
}

/// The outcome of resolving one call site: the selected signature, the
/// hidden-argument assignment, and the resolved explicit parameter types.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolution {
    pub signature: usize,
    pub hidden: HiddenArgs,
    pub param_types: Vec<Type>,
}

/// Structural inference: binds still-unbound hidden names where the
/// argument's principal runtime type forces them. A plain list infers the
/// element type under a `list t` pattern but never a vector length or a
/// tuple shape; a runtime list carries no such knowledge, so those arrive
/// via hints. Pre-existing bindings are left alone; the membership check
/// validates them.
fn unify(pattern: &Expr, actual: &Type, hidden: &mut HiddenArgs) {
    match pattern {
        Expr::Var(name) => {
            if hidden.is_declared(name) && hidden.get(name).is_none() {
                hidden.bind(name, Value::Type(actual.clone()));
            }
        }
        Expr::Call { func, args, .. } => match (func.as_str(), args.as_slice(), actual) {
            ("list", [elem], Type::List(t))
            | ("list", [elem], Type::Vector(t, _))
            | ("vector", [elem, _], Type::List(t)) => unify(elem, t, hidden),
            ("vector", [elem, len], Type::Vector(t, n)) => {
                unify(elem, t, hidden);
                bind_length(len, *n, hidden);
            }
            ("tuple", [shape], Type::Tuple(ts)) => {
                if let Expr::Var(name) = shape {
                    if hidden.is_declared(name) && hidden.get(name).is_none() {
                        let types = ts.iter().cloned().map(Value::Type).collect();
                        hidden.bind(name, Value::List(types));
                    }
                }
            }
            _ => {}
        },
        _ => {}
    }
}

fn bind_length(pattern: &Expr, n: usize, hidden: &mut HiddenArgs) {
    if let Expr::Var(name) = pattern {
        if hidden.is_declared(name) && hidden.get(name).is_none() {
            hidden.bind(name, Value::Uint(BigUint::from(n)));
        }
    }
}

impl Engine {
    /// Picks the signature of `function` applicable to the given explicit
    /// arguments and hidden hints: the unique most specific candidate under
    /// the engine's specificity order.
    pub fn resolve(
        &self,
        function: &str,
        args: &[Value],
        hints: &[(String, Value)],
    ) -> Result<Resolution, EngineError> {
        let mut ctx = EvalCtx::new(self.limits());
        self.resolve_in(function, args, hints, &mut ctx)
    }

    pub(crate) fn resolve_in(
        &self,
        function: &str,
        args: &[Value],
        hints: &[(String, Value)],
        ctx: &mut EvalCtx,
    ) -> Result<Resolution, EngineError> {
        let def = self.lookup(function)?;
        let mut candidates = Vec::new();
        for (index, sig) in def.signatures.iter().enumerate() {
            if let Some(candidate) = self.try_candidate(index, sig, args, hints, ctx)? {
                candidates.push(candidate);
            }
        }
        match candidates.len() {
            0 => Err(DispatchError::NoMatch {
                function: function.to_string(),
                arity: args.len(),
            }
            .into()),
            1 => {
                let resolution = candidates.swap_remove(0);
                debug!(function, signature = resolution.signature, "resolved call");
                Ok(resolution)
            }
            _ => self.select_most_specific(function, candidates),
        }
    }

    /// Tries one signature: hint validation (labels must name hidden
    /// parameters and arrive in declaration order, the call-site ordering
    /// constraint), structural inference, then the precondition check of
    /// each explicit argument against its evaluated parameter type, with
    /// earlier explicit parameters in scope for later type expressions.
    pub(crate) fn try_candidate(
        &self,
        index: usize,
        sig: &Signature,
        args: &[Value],
        hints: &[(String, Value)],
        ctx: &mut EvalCtx,
    ) -> Result<Option<Resolution>, EngineError> {
        if sig.params.len() != args.len() {
            return Ok(None);
        }

        let mut hidden = HiddenArgs::for_signature(sig);
        let mut last_position = None;
        for (name, value) in hints {
            let Some(position) = sig.hidden.iter().position(|h| &h.name == name) else {
                return Ok(None);
            };
            if last_position.is_some_and(|prev| position <= prev) {
                return Ok(None);
            }
            last_position = Some(position);
            hidden.bind(name, value.clone());
        }

        for (param, arg) in sig.params.iter().zip(args) {
            unify(&param.ty, &principal_type(arg), &mut hidden);
        }

        let mut scope = Scope::for_signature(sig);
        for (name, value) in hidden.bound() {
            scope.bind(name, value.clone());
        }
        let mut param_types = Vec::with_capacity(args.len());
        for (param, arg) in sig.params.iter().zip(args) {
            // A type expression that needs an unbound hidden parameter, or
            // that does not evaluate to a type, disqualifies the signature.
            let Some(ty) = self.eval_type_expr(&param.ty, &scope, ctx)? else {
                return Ok(None);
            };
            if !is_a(arg, &ty) {
                return Ok(None);
            }
            scope.bind(&param.name, arg.clone());
            param_types.push(ty);
        }

        Ok(Some(Resolution {
            signature: index,
            hidden,
            param_types,
        }))
    }

    pub(crate) fn eval_type_expr(
        &self,
        expr: &Expr,
        scope: &Scope,
        ctx: &mut EvalCtx,
    ) -> Result<Option<Type>, EngineError> {
        let value = self.eval_expr(expr, scope, ctx)?;
        Ok(value.as_type().cloned())
    }

    fn select_most_specific(
        &self,
        function: &str,
        candidates: Vec<Resolution>,
    ) -> Result<Resolution, EngineError> {
        let dominated: Vec<bool> = candidates
            .iter()
            .enumerate()
            .map(|(i, candidate)| {
                candidates.iter().enumerate().any(|(j, other)| {
                    i != j
                        && self
                            .specificity()
                            .compare(&other.param_types, &candidate.param_types)
                            == Some(Ordering::Less)
                })
            })
            .collect();
        let mut survivors: Vec<Resolution> = candidates
            .into_iter()
            .zip(dominated)
            .filter(|(_, dominated)| !dominated)
            .map(|(candidate, _)| candidate)
            .collect();
        if survivors.len() == 1 {
            let resolution = survivors.swap_remove(0);
            debug!(
                function,
                signature = resolution.signature,
                "resolved call (most specific of several)"
            );
            Ok(resolution)
        } else {
            Err(DispatchError::Ambiguous {
                function: function.to_string(),
                candidates: survivors.iter().map(|c| c.signature).collect(),
            }
            .into())
        }
    }
}
