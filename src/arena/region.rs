//! Backing region for the arena.
//!
//! One page-aligned, zero-filled block taken from the global allocator and
//! returned to it on drop. Failing to acquire it aborts through
//! `handle_alloc_error`.

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use crate::error::{ArenaError, ArenaResult};

/// Page size used when the OS cannot be asked.
pub const FALLBACK_PAGE_SIZE: usize = 4096;

/// Memory page size of the host, in bytes.
///
/// Scratch blocks handed to the text-input facility are aligned to this.
pub fn page_size() -> usize {
    #[cfg(unix)]
    {
        // SAFETY: sysconf has no preconditions.
        let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        if size > 0 && (size as usize).is_power_of_two() {
            return size as usize;
        }
    }
    FALLBACK_PAGE_SIZE
}

#[derive(Debug)]
pub(crate) struct Region {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl Region {
    /// Acquire `size` bytes. `size` must be non-zero.
    pub(crate) fn acquire(size: usize) -> ArenaResult<Self> {
        debug_assert!(size > 0);
        let layout = Layout::from_size_align(size, page_size())
            .map_err(|_| ArenaError::CapacityOverflow(size))?;

        // SAFETY: layout has a non-zero size.
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let Some(ptr) = NonNull::new(raw) else {
            tracing::error!(size, "cannot acquire arena backing region");
            alloc::handle_alloc_error(layout);
        };

        Ok(Self { ptr, layout })
    }

    #[inline]
    pub(crate) fn base(&self) -> usize {
        self.ptr.as_ptr().addr()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.layout.size()
    }

    /// Pointer to `offset` bytes into the region, zero-filled for `len` bytes.
    ///
    /// `offset + len` must not exceed `self.len()`.
    pub(crate) fn zeroed_block(&self, offset: usize, len: usize) -> NonNull<u8> {
        debug_assert!(offset + len <= self.len());
        // SAFETY: the range lies inside the live allocation owned by `self`.
        unsafe {
            let ptr = self.ptr.as_ptr().add(offset);
            std::ptr::write_bytes(ptr, 0, len);
            NonNull::new_unchecked(ptr)
        }
    }
}

impl Drop for Region {
    fn drop(&mut self) {
        // SAFETY: ptr was returned by alloc_zeroed with this exact layout.
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_is_power_of_two() {
        assert!(page_size().is_power_of_two());
        assert!(page_size() >= 512);
    }

    #[test]
    fn test_region_is_page_aligned_and_zeroed() {
        let region = Region::acquire(3 * 1024).unwrap();
        assert_eq!(region.base() % page_size(), 0);
        assert_eq!(region.len(), 3 * 1024);

        let block = region.zeroed_block(0, region.len());
        let bytes = unsafe { std::slice::from_raw_parts(block.as_ptr(), region.len()) };
        assert!(bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_oversized_region_is_rejected() {
        let err = Region::acquire(usize::MAX - 1).unwrap_err();
        assert_eq!(err, ArenaError::CapacityOverflow(usize::MAX - 1));
    }
}
