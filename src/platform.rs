//! OS platform abstraction for virtual memory allocation.
//!
//! Provides `page_alloc`/`page_dealloc`/`page_decommit`/`page_recommit`
//! wrapping the platform-specific virtual memory API: `mmap`/`munmap` on
//! Unix, `VirtualAlloc`/`VirtualFree` on Windows, and a Miri-compatible
//! shim (backed by `alloc::alloc`) everywhere else so the unsafe pointer
//! logic in the rest of the crate can be checked under Miri without real
//! OS syscalls.

#[cfg(all(windows, not(miri)))]
mod windows;

#[cfg(all(unix, not(miri)))]
mod unix;

#[cfg(miri)]
mod miri;

/// Allocate `size` bytes of virtual memory, page-aligned and zero-initialized.
/// Returns null on failure.
///
/// # Safety
/// Caller must eventually call `page_dealloc` with the returned pointer and
/// the same `size`.
#[inline]
pub unsafe fn page_alloc(size: usize) -> *mut u8 {
    cfg_if::cfg_if! {
        if #[cfg(miri)] {
            unsafe { miri::page_alloc(size) }
        } else if #[cfg(windows)] {
            unsafe { windows::page_alloc(size) }
        } else {
            unsafe { unix::page_alloc(size) }
        }
    }
}

/// Free virtual memory previously allocated by `page_alloc`.
///
/// # Safety
/// `ptr` must have been returned by `page_alloc`, and `size` must match the
/// original allocation size.
#[inline]
pub unsafe fn page_dealloc(ptr: *mut u8, size: usize) {
    cfg_if::cfg_if! {
        if #[cfg(miri)] {
            unsafe { miri::page_dealloc(ptr, size) };
        } else if #[cfg(windows)] {
            let _ = size;
            unsafe { windows::page_dealloc(ptr) };
        } else {
            unsafe { unix::page_dealloc(ptr, size) };
        }
    }
}

/// Decommit pages (return physical memory to the OS but keep the virtual
/// address range reserved).
///
/// # Safety
/// `ptr` and `size` must refer to a range within a live `page_alloc`
/// allocation.
#[inline]
pub unsafe fn page_decommit(ptr: *mut u8, size: usize) {
    cfg_if::cfg_if! {
        if #[cfg(miri)] {
            unsafe { miri::page_decommit(ptr, size) };
        } else if #[cfg(windows)] {
            unsafe { windows::page_decommit(ptr, size) };
        } else {
            unsafe { unix::page_decommit(ptr, size) };
        }
    }
}

/// Recommit previously decommitted pages.
///
/// # Safety
/// `ptr` and `size` must refer to a range within a live `page_alloc`
/// allocation that was previously decommitted.
#[inline]
pub unsafe fn page_recommit(ptr: *mut u8, size: usize) {
    cfg_if::cfg_if! {
        if #[cfg(miri)] {
            unsafe { miri::page_recommit(ptr, size) };
        } else if #[cfg(windows)] {
            unsafe { windows::page_recommit(ptr, size) };
        } else {
            // madvise(MADV_DONTNEED) doesn't unmap; touching the pages
            // again automatically recommits them. Nothing to do.
            let _ = (ptr, size);
        }
    }
}
