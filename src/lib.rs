//! tiered-alloc: a tiered, thread-aware general-purpose memory allocator.
//!
//! Three tiers, thread cache to central cache to page cache:
//! - Thread cache (fast path, no locks, one per OS thread)
//! - Central cache (per-size-class spin-locked free lists)
//! - Page cache (span management, OS interface, one blocking mutex)
//!
//! # Usage
//!
//! ```ignore
//! #[global_allocator]
//! static GLOBAL: tiered_alloc::TieredAlloc = tiered_alloc::TieredAlloc;
//! ```

pub mod allocator;
pub mod central_cache;
#[cfg(feature = "ffi")]
pub mod ffi;
pub mod macros;
pub mod page_cache;
pub mod platform;
pub mod size_class;
pub mod span;
#[cfg(feature = "stats")]
pub mod stats;
pub mod sync;
pub mod thread_cache;

include!(concat!(env!("OUT_DIR"), "/config_gen.rs"));

pub use allocator::{allocate, deallocate, TieredAlloc};

pub(crate) static CENTRAL_CACHE: central_cache::CentralCache = central_cache::CentralCache::new();
pub(crate) static PAGE_CACHE: page_cache::PageCache = page_cache::PageCache::new();
