//! The page cache: owns every page obtained from the OS, serves
//! page-granular spans, splits on demand, and coalesces adjacent free spans
//! on return.
//!
//! Protected by a single blocking mutex rather than a spin lock: page-cache
//! operations are rare compared to block-cache operations (they only occur
//! on span exhaustion) and may themselves enter the OS, so spinning here
//! would waste cycles under contention.

use crate::platform;
use crate::span::Span;
use crate::{stat_add, stat_inc, PAGE_SIZE};
use std::collections::BTreeMap;
use std::sync::Mutex;

struct PageCacheInner {
    /// Free spans keyed by page count; each bucket is a singly-linked chain
    /// through `Span::next`, enabling best-fit via `BTreeMap::range`.
    free_spans: BTreeMap<usize, *mut Span>,
    /// Every live or free span keyed by start address, for O(log n)
    /// coalescing lookups on return.
    span_by_addr: BTreeMap<usize, *mut Span>,
}

// SAFETY: PageCacheInner is only ever reached through the surrounding Mutex.
unsafe impl Send for PageCacheInner {}

impl PageCacheInner {
    const fn new() -> Self {
        Self {
            free_spans: BTreeMap::new(),
            span_by_addr: BTreeMap::new(),
        }
    }

    /// Remove a specific span from its `free_spans` bucket (head or
    /// mid-list), used when coalescing picks up a non-head neighbor.
    unsafe fn unlink_free(&mut self, span: *mut Span) -> bool {
        let pages = unsafe { (*span).pages };
        let Some(&head) = self.free_spans.get(&pages) else {
            return false;
        };
        if head == span {
            let next = unsafe { (*span).next };
            if next.is_null() {
                self.free_spans.remove(&pages);
            } else {
                self.free_spans.insert(pages, next);
            }
            return true;
        }
        let mut prev = head;
        loop {
            let next = unsafe { (*prev).next };
            if next.is_null() {
                return false;
            }
            if next == span {
                unsafe { (*prev).next = (*span).next };
                return true;
            }
            prev = next;
        }
    }

    fn insert_free(&mut self, span: *mut Span) {
        let pages = unsafe { (*span).pages };
        let head = self.free_spans.get(&pages).copied().unwrap_or(std::ptr::null_mut());
        unsafe { (*span).next = head };
        self.free_spans.insert(pages, span);
    }
}

pub struct PageCache {
    inner: Mutex<PageCacheInner>,
}

impl PageCache {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(PageCacheInner::new()),
        }
    }

    fn system_alloc(&self, pages: usize) -> *mut u8 {
        let bytes = pages * PAGE_SIZE;
        let ptr = unsafe { platform::page_alloc(bytes) };
        stat_inc!(os_alloc_count);
        stat_add!(os_alloc_bytes, bytes);
        ptr
    }

    /// Allocate a span of exactly `pages` pages. Returns a pointer to its
    /// metadata, or null on OS failure. The returned span's `size_class` is
    /// `None`; callers that carve it into blocks set that field themselves.
    pub fn allocate_span(&self, pages: usize) -> *mut Span {
        let mut guard = self.inner.lock().unwrap();

        if let Some((&bucket, &head)) = guard.free_spans.range(pages..).next() {
            let span = head;
            let next = unsafe { (*span).next };
            if next.is_null() {
                guard.free_spans.remove(&bucket);
            } else {
                guard.free_spans.insert(bucket, next);
            }

            if bucket > pages {
                let remainder = crate::span::alloc_span();
                if remainder.is_null() {
                    // Can't record the split; put the whole span back and fail.
                    unsafe { (*span).pages = bucket };
                    guard.insert_free(span);
                    return std::ptr::null_mut();
                }
                unsafe {
                    (*remainder).start = (*span).start + pages * PAGE_SIZE;
                    (*remainder).pages = bucket - pages;
                    (*span).pages = pages;
                }
                guard.span_by_addr.insert(unsafe { (*remainder).start }, remainder);
                guard.insert_free(remainder);
                stat_inc!(span_splits);
            }

            guard.span_by_addr.insert(unsafe { (*span).start }, span);
            stat_inc!(page_cache_allocs);
            return span;
        }

        drop(guard);
        let ptr = self.system_alloc(pages);
        if ptr.is_null() {
            return std::ptr::null_mut();
        }

        let span = crate::span::alloc_span();
        if span.is_null() {
            unsafe { platform::page_dealloc(ptr, pages * PAGE_SIZE) };
            return std::ptr::null_mut();
        }
        unsafe {
            (*span).start = ptr as usize;
            (*span).pages = pages;
        }

        let mut guard = self.inner.lock().unwrap();
        guard.span_by_addr.insert(unsafe { (*span).start }, span);
        stat_inc!(page_cache_allocs);
        span
    }

    /// Return a span to the page cache by its start address, attempting a
    /// single forward coalescing step with its immediate right neighbor.
    /// `pages` is the caller's expectation of the span's size; it is not
    /// otherwise used, since the span's own recorded page count is
    /// authoritative (mirrors the upstream implementation this was grounded
    /// on, which accepts and does not consult the parameter either).
    pub fn deallocate_span(&self, address: usize, pages: usize) {
        let mut guard = self.inner.lock().unwrap();

        let Some(&span) = guard.span_by_addr.get(&address) else {
            return;
        };
        debug_assert_eq!(unsafe { (*span).pages }, pages);

        let next_addr = unsafe { (*span).start + (*span).pages * PAGE_SIZE };
        if let Some(&next_span) = guard.span_by_addr.get(&next_addr) {
            if unsafe { guard.unlink_free(next_span) } {
                unsafe {
                    (*span).pages += (*next_span).pages;
                }
                guard.span_by_addr.remove(&next_addr);
                unsafe { crate::span::dealloc_span(next_span) };
                stat_inc!(span_coalesces);
            }
        }

        guard.insert_free(span);
    }
}

impl Default for PageCache {
    fn default() -> Self {
        Self::new()
    }
}
