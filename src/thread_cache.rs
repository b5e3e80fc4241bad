//! Per-thread front cache.
//!
//! One instance per thread, created lazily on first use and never shared.
//! No synchronization is needed for its own state; it only synchronizes
//! (via the central cache) when it refills or drains.

use crate::size_class::{class_of, class_to_size};
use crate::span::FreeObject;
use crate::{stat_inc, CENTRAL_CACHE, DEFAULT_THREAD_CACHE_THRESHOLD, MAX_SMALL, NUM_CLASSES, PAGE_CACHE};
use core::cell::UnsafeCell;
use core::ptr;
use std::thread_local;

pub struct ThreadCache {
    free_list: Box<[*mut FreeObject]>,
    count: Box<[u32]>,
    threshold: u32,
}

impl ThreadCache {
    fn new() -> Self {
        Self {
            free_list: vec![ptr::null_mut(); NUM_CLASSES].into_boxed_slice(),
            count: vec![0u32; NUM_CLASSES].into_boxed_slice(),
            threshold: DEFAULT_THREAD_CACHE_THRESHOLD,
        }
    }

    /// Allocate a block for a request of `n` bytes, `n <= MAX_SMALL`.
    pub fn allocate(&mut self, n: usize) -> *mut u8 {
        debug_assert!(n <= MAX_SMALL);
        let k = class_of(n);

        let head = self.free_list[k];
        if !head.is_null() {
            self.free_list[k] = unsafe { (*head).next };
            self.count[k] -= 1;
            stat_inc!(thread_cache_hits);
            return head as *mut u8;
        }

        stat_inc!(thread_cache_misses);
        self.fetch_from_central_cache(k)
    }

    /// Return a block of `n` bytes, `n <= MAX_SMALL`, to this thread's cache.
    pub fn deallocate(&mut self, address: *mut u8, n: usize) {
        debug_assert!(n <= MAX_SMALL);
        let k = class_of(n);

        let block = address as *mut FreeObject;
        unsafe { (*block).next = self.free_list[k] };
        self.free_list[k] = block;
        self.count[k] += 1;

        if self.count[k] > self.threshold {
            self.return_to_central_cache(k);
        }
    }

    fn fetch_from_central_cache(&mut self, k: usize) -> *mut u8 {
        let chain = CENTRAL_CACHE.fetch_range(k, &PAGE_CACHE);
        if chain.is_null() {
            return ptr::null_mut();
        }

        let result = chain;
        let rest = unsafe { (*result).next };
        unsafe { (*result).next = ptr::null_mut() };

        self.free_list[k] = rest;
        self.count[k] += count_chain(rest);

        result as *mut u8
    }

    fn return_to_central_cache(&mut self, k: usize) {
        let total = self.count[k];
        let keep = (total.div_ceil(4)).max(1);
        let to_return = total - keep;
        if to_return == 0 {
            return;
        }

        let head = self.free_list[k];
        debug_assert!(!head.is_null());

        // Walk keep - 1 links to find the split node.
        let mut split = head;
        let mut walked = 1u32;
        while walked < keep {
            let next = unsafe { (*split).next };
            if next.is_null() {
                break;
            }
            split = next;
            walked += 1;
        }

        let tail_head = unsafe { (*split).next };
        unsafe { (*split).next = ptr::null_mut() };

        if tail_head.is_null() {
            // Chain was shorter than expected; nothing left to return.
            self.count[k] = walked;
            return;
        }

        let actually_returned = count_chain(tail_head);
        let size = class_to_size(k);
        CENTRAL_CACHE.return_range(tail_head, actually_returned * size, k);

        self.free_list[k] = head;
        self.count[k] = walked;
    }
}

fn count_chain(mut node: *mut FreeObject) -> u32 {
    let mut n = 0u32;
    while !node.is_null() {
        n += 1;
        node = unsafe { (*node).next };
    }
    n
}

thread_local! {
    static LOCAL: UnsafeCell<Option<ThreadCache>> = const { UnsafeCell::new(None) };
}

/// Run `f` against the calling thread's cache, constructing it on first use.
pub fn with_thread_cache<R>(f: impl FnOnce(&mut ThreadCache) -> R) -> R {
    LOCAL.with(|cell| {
        let slot = unsafe { &mut *cell.get() };
        let tc = slot.get_or_insert_with(ThreadCache::new);
        f(tc)
    })
}
