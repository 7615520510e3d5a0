use std::sync::atomic::{AtomicU64, Ordering};

/// A snapshot of format-cache activity.
///
/// Collection is best-effort and meant for profiling and tests; counters are
/// monotone for the cache's lifetime except across `reset`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheMetrics {
    /// Lookups answered by an already-published artifact.
    pub hits: u64,
    /// Fresh compilations published to the cache.
    pub compiles: u64,
    /// Lookups that blocked on another evaluation's in-flight compile.
    pub waits: u64,
    /// Claims abandoned without publishing (failed or panicked compiles).
    pub abandoned: u64,
    /// Explicit cache resets.
    pub resets: u64,
}

#[derive(Debug, Default)]
pub(crate) struct CacheCounters {
    hits: AtomicU64,
    compiles: AtomicU64,
    waits: AtomicU64,
    abandoned: AtomicU64,
    resets: AtomicU64,
}

impl CacheCounters {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_compile(&self) {
        self.compiles.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_wait(&self) {
        self.waits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_abandoned(&self) {
        self.abandoned.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_reset(&self) {
        self.resets.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> CacheMetrics {
        CacheMetrics {
            hits: self.hits.load(Ordering::Relaxed),
            compiles: self.compiles.load(Ordering::Relaxed),
            waits: self.waits.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
            resets: self.resets.load(Ordering::Relaxed),
        }
    }
}
