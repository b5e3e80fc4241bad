//! Alignment edge-case tests through the `GlobalAlloc` surface.

use std::alloc::{GlobalAlloc, Layout};
use tiered_alloc::TieredAlloc;

#[global_allocator]
static GLOBAL: TieredAlloc = TieredAlloc;

#[test]
fn standard_alignments() {
    for align in [1, 2, 4, 8] {
        for &size in &[1, 7, 8, 15, 16, 31, 64, 255, 256, 1024, 4096] {
            if size < align {
                continue;
            }
            let layout = Layout::from_size_align(size, align).unwrap();
            let ptr = unsafe { GLOBAL.alloc(layout) };
            assert!(!ptr.is_null(), "alloc failed: size={size}, align={align}");
            assert_eq!(ptr as usize % align, 0, "misaligned: size={size}, align={align}");
            unsafe { ptr.write_bytes(0xAB, size) };
            unsafe { GLOBAL.dealloc(ptr, layout) };
        }
    }
}

#[test]
fn over_aligned_small_objects() {
    for align in [16usize, 32, 64, 256] {
        for &size in &[align, align * 2] {
            let layout = Layout::from_size_align(size, align).unwrap();
            let ptr = unsafe { GLOBAL.alloc(layout) };
            assert!(!ptr.is_null(), "alloc failed: size={size}, align={align}");
            assert_eq!(ptr as usize % align, 0);
            unsafe { ptr.write_bytes(0xCD, size) };
            unsafe { GLOBAL.dealloc(ptr, layout) };
        }
    }
}

#[test]
fn over_aligned_at_page_size() {
    let align = 4096;
    for &size in &[4096usize, 8192, 16384] {
        let layout = Layout::from_size_align(size, align).unwrap();
        let ptr = unsafe { GLOBAL.alloc(layout) };
        assert!(!ptr.is_null(), "alloc failed: size={size}, align={align}");
        assert_eq!(ptr as usize % align, 0);
        unsafe { ptr.write_bytes(0x77, size) };
        unsafe { GLOBAL.dealloc(ptr, layout) };
    }
}

#[test]
fn large_object_crosses_max_small() {
    let size = 300_000;
    let layout = Layout::from_size_align(size, 8).unwrap();
    let ptr = unsafe { GLOBAL.alloc(layout) };
    assert!(!ptr.is_null());
    unsafe {
        ptr.write_bytes(0xBE, size);
        for i in 0..size {
            assert_eq!(*ptr.add(i), 0xBE);
        }
        GLOBAL.dealloc(ptr, layout);
    }
}

#[test]
fn realloc_grow_preserves_content() {
    let size = 64;
    let layout = Layout::from_size_align(size, 8).unwrap();
    let ptr = unsafe { GLOBAL.alloc(layout) };
    assert!(!ptr.is_null());
    unsafe { ptr.write_bytes(0xBB, size) };

    let new_size = 4096;
    let new_ptr = unsafe { GLOBAL.realloc(ptr, layout, new_size) };
    assert!(!new_ptr.is_null());
    for i in 0..size {
        assert_eq!(unsafe { *new_ptr.add(i) }, 0xBB);
    }

    let new_layout = Layout::from_size_align(new_size, 8).unwrap();
    unsafe { GLOBAL.dealloc(new_ptr, new_layout) };
}

#[test]
fn zero_size_layout_does_not_crash() {
    let layout = Layout::from_size_align(0, 1).unwrap();
    let ptr = unsafe { GLOBAL.alloc(layout) };
    if !ptr.is_null() {
        unsafe { GLOBAL.dealloc(ptr, layout) };
    }
}

#[test]
fn many_aligned_allocations_do_not_overlap() {
    let align = 64;
    let size = 64;
    let layout = Layout::from_size_align(size, align).unwrap();
    let count = 500;

    let mut ptrs = Vec::with_capacity(count);
    for _ in 0..count {
        let ptr = unsafe { GLOBAL.alloc(layout) };
        assert!(!ptr.is_null());
        assert_eq!(ptr as usize % align, 0);
        unsafe { ptr.write_bytes(0xDD, size) };
        ptrs.push(ptr);
    }

    for &ptr in &ptrs {
        for i in 0..size {
            assert_eq!(unsafe { *ptr.add(i) }, 0xDD);
        }
    }

    for ptr in ptrs {
        unsafe { GLOBAL.dealloc(ptr, layout) };
    }
}
