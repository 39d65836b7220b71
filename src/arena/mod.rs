//! Bounded scratch arena with an explicit initialize/finalize lifecycle.
//!
//! The arena owns exactly one region, sized once at `initialize`, and hands
//! out aligned blocks from it. It never grows. A capture session creates one
//! arena, carves the facility's work buffer and output buffer out of it, and
//! tears it down before returning.
//!
//! ```text
//!   Arena::new()          Uninitialized (no region)
//!        │ initialize(n)
//!        ▼
//!   Ready ── allocate / deallocate ──┐
//!        │ ◄─────────────────────────┘
//!        │ finalize() / drop
//!        ▼
//!   Uninitialized
//! ```
//!
//! The type is neither `Clone` nor `Copy`: the region has a single owner.
//! Moving an `Arena` value does not move the region, so pointers it handed
//! out stay valid until they are deallocated or the arena is finalized.

mod free_list;
mod region;

use std::ptr::NonNull;

use tracing::{debug, warn};

use crate::error::{ArenaError, ArenaResult};
use free_list::FreeList;
use region::Region;

pub use free_list::GRANULE;
pub use region::{FALLBACK_PAGE_SIZE, page_size};

/// Alignment used by [`Arena::allocate_default`].
pub const DEFAULT_ALIGNMENT: usize = std::mem::size_of::<*const u8>();

/// Fixed-capacity allocator over one owned region.
#[derive(Debug, Default)]
pub struct Arena {
    region: Option<Region>,
    blocks: FreeList,
}

impl Arena {
    /// Create an arena with no backing region.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and initialize an arena in one step.
    pub fn with_capacity(size: usize) -> ArenaResult<Self> {
        let mut arena = Self::new();
        arena.initialize(size)?;
        Ok(arena)
    }

    /// Acquire a region of exactly `size` bytes.
    ///
    /// Aborts the process if the global allocator cannot provide it.
    pub fn initialize(&mut self, size: usize) -> ArenaResult<()> {
        if self.region.is_some() {
            return Err(ArenaError::AlreadyInitialized);
        }
        if size == 0 {
            return Err(ArenaError::ZeroCapacity);
        }

        let region = Region::acquire(size)?;
        debug!(capacity = size, base = format_args!("{:#x}", region.base()), "arena initialized");
        self.blocks = FreeList::new(size);
        self.region = Some(region);
        Ok(())
    }

    /// Release the region and all bookkeeping.
    ///
    /// Any pointer obtained from [`allocate`](Self::allocate) dangles
    /// afterwards. No-op on an uninitialized arena.
    pub fn finalize(&mut self) {
        let Some(region) = self.region.take() else {
            return;
        };

        let outstanding = self.blocks.live_count();
        if outstanding > 0 {
            warn!(outstanding, "arena finalized with live allocations");
        }
        self.blocks = FreeList::default();
        drop(region);
        debug!("arena finalized");
    }

    /// Allocate `size` zero-filled bytes aligned to `alignment`.
    ///
    /// `alignment` must be a power of two. Fails with
    /// [`ArenaError::Exhausted`] when no free span fits; the arena never grows.
    pub fn allocate(&mut self, size: usize, alignment: usize) -> ArenaResult<NonNull<u8>> {
        if !alignment.is_power_of_two() {
            return Err(ArenaError::InvalidAlignment(alignment));
        }
        let region = self.region.as_ref().ok_or(ArenaError::Uninitialized)?;

        let (offset, len) = self
            .blocks
            .reserve(region.base(), size, alignment)
            .inspect_err(|err| warn!(size, alignment, %err, "arena allocation failed"))?;
        Ok(region.zeroed_block(offset, len))
    }

    /// [`allocate`](Self::allocate) with pointer-size alignment.
    pub fn allocate_default(&mut self, size: usize) -> ArenaResult<NonNull<u8>> {
        self.allocate(size, DEFAULT_ALIGNMENT)
    }

    /// Return a block to the arena. A null pointer is ignored.
    pub fn deallocate(&mut self, ptr: *mut u8) -> ArenaResult<()> {
        if ptr.is_null() {
            return Ok(());
        }
        let region = self.region.as_ref().ok_or(ArenaError::Uninitialized)?;

        let addr = ptr.addr();
        let released = addr
            .checked_sub(region.base())
            .filter(|&offset| offset < region.len())
            .is_some_and(|offset| self.blocks.release(offset));
        if released {
            Ok(())
        } else {
            Err(ArenaError::UnknownAllocation(addr))
        }
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.region.is_some()
    }

    /// Region size in bytes, 0 when uninitialized.
    pub fn capacity(&self) -> usize {
        self.region.as_ref().map_or(0, Region::len)
    }

    /// Bytes held by live blocks, including granule rounding.
    pub fn used(&self) -> usize {
        self.blocks.used()
    }

    /// Free bytes, possibly fragmented.
    pub fn remaining(&self) -> usize {
        self.capacity() - self.used()
    }

    /// Largest request (at granule alignment) that can currently succeed.
    pub fn largest_free_block(&self) -> usize {
        self.blocks.largest_free_span()
    }

    pub fn live_allocations(&self) -> usize {
        self.blocks.live_count()
    }

    /// Whether `ptr` points into the region.
    pub fn contains(&self, ptr: *const u8) -> bool {
        self.region.as_ref().is_some_and(|region| {
            ptr.addr()
                .checked_sub(region.base())
                .is_some_and(|offset| offset < region.len())
        })
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        self.finalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_arena_is_uninitialized() {
        let mut arena = Arena::new();
        assert!(!arena.is_initialized());
        assert_eq!(arena.capacity(), 0);
        assert_eq!(arena.allocate(8, 8), Err(ArenaError::Uninitialized));
    }

    #[test]
    fn test_initialize_rejects_zero_and_double_init() {
        let mut arena = Arena::new();
        assert_eq!(arena.initialize(0), Err(ArenaError::ZeroCapacity));
        arena.initialize(1024).unwrap();
        assert_eq!(arena.initialize(1024), Err(ArenaError::AlreadyInitialized));
        assert_eq!(arena.capacity(), 1024);
    }

    #[test]
    fn test_allocation_is_aligned_and_inside_region() {
        let mut arena = Arena::with_capacity(4 * page_size()).unwrap();
        for align in [1, 2, 8, 64, 256, page_size()] {
            let ptr = arena.allocate(100, align).unwrap();
            assert_eq!(ptr.as_ptr().addr() % align, 0, "align {align}");
            assert!(arena.contains(ptr.as_ptr()));
        }
    }

    #[test]
    fn test_allocate_default_uses_pointer_alignment() {
        let mut arena = Arena::with_capacity(256).unwrap();
        arena.allocate(1, 1).unwrap();
        let ptr = arena.allocate_default(16).unwrap();
        assert_eq!(ptr.as_ptr().addr() % DEFAULT_ALIGNMENT, 0);
    }

    #[test]
    fn test_invalid_alignment() {
        let mut arena = Arena::with_capacity(256).unwrap();
        assert_eq!(arena.allocate(8, 0), Err(ArenaError::InvalidAlignment(0)));
        assert_eq!(arena.allocate(8, 24), Err(ArenaError::InvalidAlignment(24)));
    }

    #[test]
    fn test_exhaustion_is_reported() {
        let mut arena = Arena::with_capacity(128).unwrap();
        arena.allocate(96, 8).unwrap();
        let err = arena.allocate(64, 8).unwrap_err();
        assert_eq!(err, ArenaError::Exhausted { requested: 64, remaining: 32 });
        // Failed requests leave no trace.
        assert_eq!(arena.live_allocations(), 1);
    }

    #[test]
    fn test_blocks_are_zero_filled_on_reuse() {
        let mut arena = Arena::with_capacity(64).unwrap();
        let ptr = arena.allocate(64, 8).unwrap();
        unsafe { std::ptr::write_bytes(ptr.as_ptr(), 0xAB, 64) };
        arena.deallocate(ptr.as_ptr()).unwrap();

        let again = arena.allocate(64, 8).unwrap();
        let bytes = unsafe { std::slice::from_raw_parts(again.as_ptr(), 64) };
        assert!(bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_deallocate_null_is_noop() {
        let mut arena = Arena::with_capacity(64).unwrap();
        arena.allocate(8, 8).unwrap();
        let used = arena.used();
        arena.deallocate(std::ptr::null_mut()).unwrap();
        assert_eq!(arena.used(), used);
        assert_eq!(arena.live_allocations(), 1);

        // Also fine before initialize.
        Arena::new().deallocate(std::ptr::null_mut()).unwrap();
    }

    #[test]
    fn test_deallocate_foreign_pointer() {
        let mut arena = Arena::with_capacity(64).unwrap();
        let ptr = arena.allocate(16, 8).unwrap();
        let inner = unsafe { ptr.as_ptr().add(8) };
        assert_eq!(arena.deallocate(inner), Err(ArenaError::UnknownAllocation(inner.addr())));

        let mut outside = 0u8;
        let foreign = &mut outside as *mut u8;
        assert!(matches!(arena.deallocate(foreign), Err(ArenaError::UnknownAllocation(_))));

        arena.deallocate(ptr.as_ptr()).unwrap();
        assert!(arena.deallocate(ptr.as_ptr()).is_err());
    }

    #[test]
    fn test_live_count_returns_to_zero() {
        let mut arena = Arena::with_capacity(4096).unwrap();
        assert_eq!(arena.live_allocations(), 0);

        let a = arena.allocate(100, 16).unwrap();
        let b = arena.allocate(200, 64).unwrap();
        let c = arena.allocate_default(7).unwrap();
        assert_eq!(arena.live_allocations(), 3);

        arena.deallocate(b.as_ptr()).unwrap();
        arena.deallocate(a.as_ptr()).unwrap();
        arena.deallocate(c.as_ptr()).unwrap();
        assert_eq!(arena.live_allocations(), 0);
        assert_eq!(arena.used(), 0);
        assert_eq!(arena.largest_free_block(), 4096);

        arena.finalize();
        assert!(!arena.is_initialized());
    }

    #[test]
    fn test_finalize_then_reinitialize() {
        let mut arena = Arena::with_capacity(128).unwrap();
        arena.allocate(64, 8).unwrap();
        arena.finalize();
        assert_eq!(arena.live_allocations(), 0);
        assert_eq!(arena.allocate(8, 8), Err(ArenaError::Uninitialized));

        arena.initialize(256).unwrap();
        assert_eq!(arena.capacity(), 256);
        assert_eq!(arena.remaining(), 256);
        arena.finalize();
        arena.finalize();
    }
}
