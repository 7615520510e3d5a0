//! Physical formats, format keys, and the compiled-artifact cache.
//!
//! A format is the compile-time-fixed physical encoding of a type, distinct
//! from the logical type it encodes. One artifact is compiled per distinct
//! (function, signature, hidden-argument assignment, parameter formats,
//! return-format decision) and reused by reference for the cache's lifetime.

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::ast::Body;
use crate::error::EngineError;
use crate::metrics::{CacheCounters, CacheMetrics};
use crate::value::{Type, Value};

/// The ladder of physical integer widths. Widening on possible overflow
/// moves one step up and saturates at arbitrary precision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
    Big,
}

impl IntWidth {
    pub fn wider(self) -> IntWidth {
        match self {
            IntWidth::W8 => IntWidth::W16,
            IntWidth::W16 => IntWidth::W32,
            IntWidth::W32 => IntWidth::W64,
            IntWidth::W64 => IntWidth::Big,
            IntWidth::Big => IntWidth::Big,
        }
    }
}

/// A physical representation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    Uint(IntWidth),
    Int(IntWidth),
    /// The single inhabitant of `true` (the empty list) needs no storage.
    Unit,
    /// Members of `bool` are the type values `true`/`false`: one tag bit.
    BoolTag,
    /// Types as values: an interned tag.
    TypeTag,
    Vector(Box<Format>, usize),
    List(Box<Format>),
    Tuple(Vec<Format>),
    /// The logical type is runtime-dependent; the physical layout stays
    /// generic (boxed).
    Opaque,
}

/// The declared format policy: integer types map to 64-bit words unless a
/// builtin's widening decision says otherwise.
pub fn format_of(ty: &Type) -> Format {
    match ty {
        Type::Uint => Format::Uint(IntWidth::W64),
        Type::Int => Format::Int(IntWidth::W64),
        Type::True => Format::Unit,
        Type::Bool => Format::BoolTag,
        Type::Type => Format::TypeTag,
        // Uninhabited, so any representation is vacuously correct.
        Type::False => Format::Opaque,
        Type::Any => Format::Opaque,
        Type::List(t) => Format::List(Box::new(format_of(t))),
        Type::Vector(t, n) => Format::Vector(Box::new(format_of(t)), *n),
        Type::Tuple(ts) => Format::Tuple(ts.iter().map(format_of).collect()),
    }
}

/// The fixed overflow policy: widen an integer format one step; leave
/// everything else alone.
pub fn widen(format: &Format) -> Format {
    match format {
        Format::Uint(w) => Format::Uint(w.wider()),
        Format::Int(w) => Format::Int(w.wider()),
        other => other.clone(),
    }
}

/// Identifies one compiled specialization of a function. Identical keys
/// always map to the identical artifact (referential reuse, not
/// recomputation).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FormatKey {
    pub function: String,
    pub signature: usize,
    /// Bound hidden arguments in declaration order. Unbound-but-unused
    /// hidden parameters are absent.
    pub hidden: Vec<(String, Value)>,
    /// Resolved explicit parameter formats. Dependent parameter types make
    /// these vary per call even under one hidden assignment, so they are
    /// part of the specialization's identity.
    pub params: Vec<Format>,
    /// The return-format decision, including any overflow-driven widening.
    pub ret: Format,
}

/// One compiled, reusable specialization. Its physical layout is exactly
/// what its key declares.
#[derive(Debug)]
pub struct CompiledArtifact {
    pub key: FormatKey,
    pub(crate) body: Body,
}

impl CompiledArtifact {
    pub fn param_formats(&self) -> &[Format] {
        &self.key.params
    }

    pub fn ret_format(&self) -> &Format {
        &self.key.ret
    }
}

#[derive(Clone)]
enum Slot {
    /// Claimed by a compiling evaluation; readers wait for publication.
    InFlight,
    Ready(Arc<CompiledArtifact>),
}

/// The shared memoizing artifact store. Safe to use from concurrently
/// running evaluations: at most one compilation runs per key, via a
/// claim-then-compile-then-publish protocol. A failed or panicked compile
/// unclaims without publishing a partial artifact.
#[derive(Default)]
pub struct FormatCache {
    slots: Mutex<FxHashMap<FormatKey, Slot>>,
    published: Condvar,
    counters: CacheCounters,
}

impl FormatCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the artifact for `key`, compiling it at most once. Readers
    /// that observe another evaluation's claim block until it publishes or
    /// abandons.
    pub fn get_or_compile<F>(
        &self,
        key: &FormatKey,
        compile: F,
    ) -> Result<Arc<CompiledArtifact>, EngineError>
    where
        F: FnOnce() -> Result<CompiledArtifact, EngineError>,
    {
        let mut slots = self.slots.lock();
        loop {
            match slots.get(key) {
                Some(Slot::Ready(artifact)) => {
                    self.counters.record_hit();
                    return Ok(Arc::clone(artifact));
                }
                Some(Slot::InFlight) => {
                    self.counters.record_wait();
                    self.published.wait(&mut slots);
                }
                None => break,
            }
        }
        slots.insert(key.clone(), Slot::InFlight);
        drop(slots);

        let mut claim = Claim {
            cache: self,
            key,
            published: false,
        };
        let artifact = Arc::new(compile()?);

        let mut slots = self.slots.lock();
        slots.insert(key.clone(), Slot::Ready(Arc::clone(&artifact)));
        claim.published = true;
        drop(slots);
        self.published.notify_all();
        self.counters.record_compile();
        debug!(function = %key.function, signature = key.signature, "compiled format artifact");
        Ok(artifact)
    }

    /// Drops every published artifact. In-flight claims are left to their
    /// owners. Subsequent use of a dropped key compiles afresh.
    pub fn reset(&self) {
        let mut slots = self.slots.lock();
        slots.retain(|_, slot| matches!(slot, Slot::InFlight));
        self.counters.record_reset();
    }

    pub fn metrics(&self) -> CacheMetrics {
        self.counters.snapshot()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots.lock().len()
    }
}

struct Claim<'a> {
    cache: &'a FormatCache,
    key: &'a FormatKey,
    published: bool,
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        if self.published {
            return;
        }
        let mut slots = self.cache.slots.lock();
        if matches!(slots.get(self.key), Some(Slot::InFlight)) {
            slots.remove(self.key);
        }
        drop(slots);
        self.cache.published.notify_all();
        self.cache.counters.record_abandoned();
    }
}
