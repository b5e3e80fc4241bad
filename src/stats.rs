//! Allocation statistics counters.
//!
//! All counters use `Relaxed` ordering — they are observational only and not
//! used as synchronization primitives. The allocator's own locks provide the
//! ordering guarantees for correctness; these counters are purely for
//! monitoring.
//!
//! # Usage
//!
//! ```ignore
//! let snap = tiered_alloc::stats::snapshot();
//! println!("allocs: {}", snap.alloc_count);
//! ```

use core::sync::atomic::{AtomicU64, Ordering};

pub(crate) struct Stats {
    /// Total calls to allocate with size > 0.
    pub alloc_count: AtomicU64,
    /// Total calls to deallocate with size > 0.
    pub dealloc_count: AtomicU64,
    /// Sum of all requested byte sizes passed to allocate.
    pub alloc_bytes: AtomicU64,

    /// Allocations served from the calling thread's cache (fast path, no lock).
    pub thread_cache_hits: AtomicU64,
    /// Allocations that missed the thread cache and fell through.
    pub thread_cache_misses: AtomicU64,
    /// Allocations served by the central cache without a page-cache call.
    pub central_cache_hits: AtomicU64,
    /// Allocations that required a fresh span from the page cache.
    pub page_cache_allocs: AtomicU64,
    /// Large allocations (> MAX_SMALL) served directly by the page cache.
    pub large_allocs: AtomicU64,

    /// Calls to `platform::page_alloc`.
    pub os_alloc_count: AtomicU64,
    /// Bytes requested from the OS via `platform::page_alloc`.
    pub os_alloc_bytes: AtomicU64,
    /// Times a span was split to satisfy a smaller request.
    pub span_splits: AtomicU64,
    /// Times two adjacent free spans were merged.
    pub span_coalesces: AtomicU64,
}

impl Stats {
    const fn new() -> Self {
        Self {
            alloc_count: AtomicU64::new(0),
            dealloc_count: AtomicU64::new(0),
            alloc_bytes: AtomicU64::new(0),
            thread_cache_hits: AtomicU64::new(0),
            thread_cache_misses: AtomicU64::new(0),
            central_cache_hits: AtomicU64::new(0),
            page_cache_allocs: AtomicU64::new(0),
            large_allocs: AtomicU64::new(0),
            os_alloc_count: AtomicU64::new(0),
            os_alloc_bytes: AtomicU64::new(0),
            span_splits: AtomicU64::new(0),
            span_coalesces: AtomicU64::new(0),
        }
    }
}

pub(crate) static STATS: Stats = Stats::new();

/// A point-in-time snapshot of all allocation statistics.
///
/// Individual fields are each atomically read, but the snapshot as a whole
/// is not globally consistent — concurrent allocations may race between
/// loads. For monitoring purposes this is always sufficient.
#[derive(Clone, Copy, Debug, Default)]
pub struct Snapshot {
    pub alloc_count: u64,
    pub dealloc_count: u64,
    pub alloc_bytes: u64,
    pub thread_cache_hits: u64,
    pub thread_cache_misses: u64,
    pub central_cache_hits: u64,
    pub page_cache_allocs: u64,
    pub large_allocs: u64,
    pub os_alloc_count: u64,
    pub os_alloc_bytes: u64,
    pub span_splits: u64,
    pub span_coalesces: u64,
}

/// Load all counters with `Relaxed` ordering and return a [`Snapshot`].
pub fn snapshot() -> Snapshot {
    let s = &STATS;
    Snapshot {
        alloc_count: s.alloc_count.load(Ordering::Relaxed),
        dealloc_count: s.dealloc_count.load(Ordering::Relaxed),
        alloc_bytes: s.alloc_bytes.load(Ordering::Relaxed),
        thread_cache_hits: s.thread_cache_hits.load(Ordering::Relaxed),
        thread_cache_misses: s.thread_cache_misses.load(Ordering::Relaxed),
        central_cache_hits: s.central_cache_hits.load(Ordering::Relaxed),
        page_cache_allocs: s.page_cache_allocs.load(Ordering::Relaxed),
        large_allocs: s.large_allocs.load(Ordering::Relaxed),
        os_alloc_count: s.os_alloc_count.load(Ordering::Relaxed),
        os_alloc_bytes: s.os_alloc_bytes.load(Ordering::Relaxed),
        span_splits: s.span_splits.load(Ordering::Relaxed),
        span_coalesces: s.span_coalesces.load(Ordering::Relaxed),
    }
}
