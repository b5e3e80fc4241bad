//! The allocator's public surface: a bare `allocate`/`deallocate` pair
//! matching the programmatic contract, plus a `GlobalAlloc` wrapper for
//! dropping this crate in as `#[global_allocator]`.

use crate::thread_cache::with_thread_cache;
use crate::{stat_add, stat_inc, ALIGNMENT, MAX_SMALL, PAGE_CACHE, PAGE_SIZE};
use core::alloc::{GlobalAlloc, Layout};
use core::ptr;

/// Allocate `size` bytes. Returns a pointer to `round_up(size)` usable
/// bytes, suitably aligned for any primitive up to [`ALIGNMENT`], or null
/// on out-of-memory.
pub fn allocate(size: usize) -> *mut u8 {
    stat_inc!(alloc_count);
    stat_add!(alloc_bytes, size);

    if size > MAX_SMALL {
        allocate_large(size)
    } else {
        with_thread_cache(|tc| tc.allocate(size))
    }
}

/// Return a block previously obtained from [`allocate`]. `size` must equal
/// the value originally passed to `allocate` — not its rounded-up class
/// size.
pub fn deallocate(address: *mut u8, size: usize) {
    if address.is_null() {
        return;
    }
    stat_inc!(dealloc_count);

    if size > MAX_SMALL {
        deallocate_large(address, size);
    } else {
        with_thread_cache(|tc| tc.deallocate(address, size));
    }
}

fn pages_for(size: usize) -> usize {
    size.div_ceil(PAGE_SIZE).max(1)
}

fn allocate_large(size: usize) -> *mut u8 {
    stat_inc!(large_allocs);
    let span = PAGE_CACHE.allocate_span(pages_for(size));
    if span.is_null() {
        return ptr::null_mut();
    }
    unsafe { (*span).start_addr() }
}

fn deallocate_large(address: *mut u8, size: usize) {
    PAGE_CACHE.deallocate_span(address as usize, pages_for(size));
}

/// Whether a request of `size` bytes aligned to `align` must be served by
/// the page-granular path rather than the size-classed one.
///
/// Every span the page cache hands out starts at a page-aligned address
/// (`PAGE_SIZE`-aligned), so any `align <= PAGE_SIZE` is satisfied by
/// promoting the request to the large path, even if `size` itself is
/// small. Alignments beyond `PAGE_SIZE` are not supported.
fn must_use_page_path(size: usize, align: usize) -> bool {
    size > MAX_SMALL || align > ALIGNMENT
}

/// Zero-sized type implementing [`GlobalAlloc`]; install with
/// `#[global_allocator]`.
pub struct TieredAlloc;

unsafe impl GlobalAlloc for TieredAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let size = layout.size().max(1);
        let align = layout.align();

        if align > PAGE_SIZE {
            return ptr::null_mut();
        }

        if must_use_page_path(size, align) {
            allocate_large(size)
        } else {
            allocate(size)
        }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        let size = layout.size().max(1);
        let align = layout.align();

        if must_use_page_path(size, align) {
            deallocate_large(ptr, size);
        } else {
            deallocate(ptr, size);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_deallocate_small() {
        let p = allocate(40);
        assert!(!p.is_null());
        unsafe { p.write_bytes(0xAB, 40) };
        deallocate(p, 40);
    }

    #[test]
    fn allocate_deallocate_large() {
        let p = allocate(MAX_SMALL + 1);
        assert!(!p.is_null());
        unsafe { p.write_bytes(0xCD, MAX_SMALL + 1) };
        deallocate(p, MAX_SMALL + 1);
    }

    #[test]
    fn allocate_zero_returns_a_valid_block() {
        let p = allocate(0);
        assert!(!p.is_null());
        deallocate(p, 0);
    }

    #[test]
    fn boundary_max_small_uses_small_path() {
        let p = allocate(MAX_SMALL);
        assert!(!p.is_null());
        deallocate(p, MAX_SMALL);
    }

    #[test]
    fn global_alloc_respects_alignment() {
        let alloc = TieredAlloc;
        for &align in &[8usize, 16, 64, 256, 4096] {
            for &size in &[align, align * 2] {
                let layout = Layout::from_size_align(size, align).unwrap();
                let ptr = unsafe { alloc.alloc(layout) };
                assert!(!ptr.is_null());
                assert_eq!(ptr as usize % align, 0);
                unsafe {
                    ptr.write_bytes(0xEF, size);
                    alloc.dealloc(ptr, layout);
                }
            }
        }
    }
}
