//! Allocation properties of the scratch arena.
//!
//! Run with: cargo test --test arena_properties

use std::ptr::NonNull;

use proptest::prelude::*;
use softkbd::arena::{GRANULE, page_size};
use softkbd::{Arena, ArenaError};

fn granules(size: usize) -> usize {
    size.max(1).next_multiple_of(GRANULE)
}

proptest! {
    #[test]
    fn blocks_are_aligned_zeroed_and_inside(
        requests in proptest::collection::vec((1_usize..2048, 0_u32..13), 1..24)
    ) {
        let mut arena = Arena::with_capacity(1 << 20).unwrap();
        for (size, shift) in requests {
            let align = 1_usize << shift;
            let Ok(ptr) = arena.allocate(size, align) else { continue };
            prop_assert_eq!(ptr.as_ptr().addr() % align, 0);
            prop_assert!(arena.contains(ptr.as_ptr()));
            prop_assert!(arena.contains(ptr.as_ptr().wrapping_add(size - 1)));
            let bytes = unsafe { std::slice::from_raw_parts_mut(ptr.as_ptr(), size) };
            prop_assert!(bytes.iter().all(|&b| b == 0));
            // Dirty the block so reuse would show up as non-zero.
            bytes.fill(0xCD);
        }
        prop_assert!(arena.used() <= arena.capacity());
    }

    #[test]
    fn requests_that_fit_never_fail(sizes in proptest::collection::vec(0_usize..512, 1..64)) {
        let total: usize = sizes.iter().map(|&s| granules(s)).sum();
        let mut arena = Arena::with_capacity(total).unwrap();
        for &size in &sizes {
            prop_assert!(arena.allocate(size, GRANULE).is_ok());
        }
        prop_assert_eq!(arena.used(), total);
        prop_assert_eq!(arena.remaining(), 0);
        let exhausted = matches!(arena.allocate(1, 1), Err(ArenaError::Exhausted { .. }));
        prop_assert!(exhausted);
    }

    #[test]
    fn whole_capacity_fits_one_allocation(capacity in 1_usize..16384, shift in 0_u32..13) {
        // The region is page-aligned, so any alignment up to 4 KiB starts at offset 0.
        let mut arena = Arena::with_capacity(capacity).unwrap();
        let ptr = arena.allocate(capacity, 1 << shift);
        prop_assert!(ptr.is_ok(), "capacity {} failed: {:?}", capacity, ptr);
        prop_assert_eq!(arena.live_allocations(), 1);
        prop_assert_eq!(arena.remaining(), 0);
        prop_assert_eq!(arena.deallocate(ptr.unwrap().as_ptr()), Ok(()));
        prop_assert_eq!(arena.largest_free_block(), capacity);
    }

    #[test]
    fn interleaved_allocate_and_release_stay_consistent(
        ops in proptest::collection::vec(
            (any::<bool>(), 1_usize..2048, 0_u32..7, any::<prop::sample::Index>()),
            1..96,
        )
    ) {
        let capacity = 16 * 1024;
        let mut arena = Arena::with_capacity(capacity).unwrap();
        let mut live: Vec<(NonNull<u8>, usize)> = Vec::new();

        for (alloc, size, shift, pick) in ops {
            if !alloc && !live.is_empty() {
                let (ptr, _) = live.swap_remove(pick.index(live.len()));
                prop_assert_eq!(arena.deallocate(ptr.as_ptr()), Ok(()));
            } else {
                let align = 1_usize << shift;
                match arena.allocate(size, align) {
                    Ok(ptr) => {
                        let addr = ptr.as_ptr().addr();
                        prop_assert_eq!(addr % align, 0);
                        for &(other, other_size) in &live {
                            let other = other.as_ptr().addr();
                            prop_assert!(addr + size <= other || other + other_size <= addr);
                        }
                        live.push((ptr, size));
                    }
                    // Fragmentation can leave enough free bytes in total while no
                    // single span holds the block plus its alignment padding.
                    Err(ArenaError::Exhausted { requested, .. }) => {
                        prop_assert_eq!(requested, size);
                        prop_assert!(arena.largest_free_block() < size + align);
                    }
                    Err(err) => prop_assert!(false, "unexpected error: {}", err),
                }
            }

            prop_assert_eq!(arena.live_allocations(), live.len());
            prop_assert!(arena.used() >= live.iter().map(|&(_, size)| size).sum::<usize>());
            prop_assert!(arena.used() <= capacity);
        }

        for (ptr, _) in live {
            prop_assert_eq!(arena.deallocate(ptr.as_ptr()), Ok(()));
        }
        prop_assert_eq!(arena.live_allocations(), 0);
        prop_assert_eq!(arena.remaining(), capacity);
        prop_assert_eq!(arena.largest_free_block(), capacity);
    }

    #[test]
    fn releasing_everything_restores_capacity(
        sizes in proptest::collection::vec(1_usize..4096, 1..32),
        reverse in any::<bool>(),
    ) {
        let mut arena = Arena::with_capacity(256 * 1024).unwrap();
        let mut blocks: Vec<_> = sizes
            .iter()
            .filter_map(|&size| arena.allocate_default(size).ok())
            .collect();
        if reverse {
            blocks.reverse();
        }
        for ptr in blocks {
            prop_assert_eq!(arena.deallocate(ptr.as_ptr()), Ok(()));
        }
        prop_assert_eq!(arena.live_allocations(), 0);
        prop_assert_eq!(arena.remaining(), arena.capacity());
        prop_assert_eq!(arena.largest_free_block(), arena.capacity());
    }

    #[test]
    fn oversized_requests_are_rejected(extra in 1_usize..4096) {
        let capacity = 4 * page_size();
        let mut arena = Arena::with_capacity(capacity).unwrap();
        let err = arena.allocate(capacity + extra, GRANULE).unwrap_err();
        let is_exhausted = matches!(err, ArenaError::Exhausted { remaining, .. } if remaining == capacity);
        prop_assert!(is_exhausted);
        prop_assert_eq!(arena.live_allocations(), 0);
    }
}

#[test]
fn null_deallocation_is_ignored() {
    let mut arena = Arena::with_capacity(4096).unwrap();
    assert_eq!(arena.deallocate(std::ptr::null_mut()), Ok(()));
    assert_eq!(arena.live_allocations(), 0);
}

#[test]
fn page_aligned_blocks_for_keyboard_buffers() {
    let page = page_size();
    let mut arena = Arena::with_capacity(3 * page).unwrap();
    let work = arena.allocate(page, page).unwrap();
    let text = arena.allocate(1002, page).unwrap();
    assert_eq!(work.as_ptr().addr() % page, 0);
    assert_eq!(text.as_ptr().addr() % page, 0);
    arena.deallocate(text.as_ptr()).unwrap();
    arena.deallocate(work.as_ptr()).unwrap();
    arena.finalize();
    assert!(!arena.is_initialized());
}
