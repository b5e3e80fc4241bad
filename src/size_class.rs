//! Size-class arithmetic.
//!
//! Unlike a curated tcmalloc-style table of a few dozen hand-picked sizes,
//! this allocator uses one class per 8-byte step: `S(k) = (k + 1) * ALIGNMENT`.
//! `class_of` and `round_up` are pure `const fn`s with no table lookup.

use crate::{ALIGNMENT, MAX_SMALL, NUM_CLASSES};

/// Rounds `n` up to the nearest multiple of [`ALIGNMENT`].
#[inline]
pub const fn round_up(n: usize) -> usize {
    let n = if n == 0 { ALIGNMENT } else { n };
    (n + ALIGNMENT - 1) & !(ALIGNMENT - 1)
}

/// Maps a request size to its size class.
///
/// Undefined for `n > MAX_SMALL`; callers must gate on that threshold
/// before calling.
#[inline]
pub const fn class_of(n: usize) -> usize {
    let n = if n == 0 { ALIGNMENT } else { n };
    round_up(n) / ALIGNMENT - 1
}

/// Maps a size class back to the block size it serves.
#[inline]
pub const fn class_to_size(k: usize) -> usize {
    (k + 1) * ALIGNMENT
}

/// Number of blocks a span of `pages` pages yields for class `k`.
#[inline]
pub const fn blocks_per_span(k: usize, pages: usize, page_size: usize) -> usize {
    (pages * page_size) / class_to_size(k)
}
