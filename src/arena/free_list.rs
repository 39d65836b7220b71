//! First-fit free list over a fixed span of offsets.
//!
//! Bookkeeping lives outside the region, so releasing a bad address is
//! detected instead of corrupting a block header.
//!
//! ```text
//!  0                                                       capacity
//!  ┌────────┬──────┬────────────┬──────┬────────────────────────┐
//!  │  live  │ free │    live    │ free │          free          │
//!  └────────┴──────┴────────────┴──────┴────────────────────────┘
//!            ▲ spans are sorted and never touch: freeing merges
//!              a block with both neighbours
//! ```

use std::collections::BTreeMap;

use crate::error::{ArenaError, ArenaResult};

/// Every block is a multiple of this many bytes.
pub const GRANULE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    offset: usize,
    len: usize,
}

impl Span {
    #[inline]
    fn end(&self) -> usize {
        self.offset + self.len
    }
}

#[derive(Debug, Default)]
pub(crate) struct FreeList {
    capacity: usize,
    free: Vec<Span>,
    /// offset -> block length
    live: BTreeMap<usize, usize>,
}

impl FreeList {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            free: vec![Span { offset: 0, len: capacity }],
            live: BTreeMap::new(),
        }
    }

    /// Carve a block of at least `size` bytes whose absolute address
    /// (`base + offset`) is a multiple of `align`.
    ///
    /// Blocks are rounded up to [`GRANULE`] unless the rounding would run
    /// past the end of the span; then the block ends with the span.
    /// Returns `(offset, len)` of the block.
    pub(crate) fn reserve(
        &mut self,
        base: usize,
        size: usize,
        align: usize,
    ) -> ArenaResult<(usize, usize)> {
        debug_assert!(align.is_power_of_two());
        let want = size.max(1);
        let rounded = round_up(want, GRANULE).unwrap_or(want);

        let found = self.free.iter().enumerate().find_map(|(i, span)| {
            let start = round_up(base.checked_add(span.offset)?, align)?.checked_sub(base)?;
            let room = span.end().checked_sub(start)?;
            let len = if rounded <= room {
                rounded
            } else if want <= room {
                room
            } else {
                return None;
            };
            Some((i, start, len))
        });
        let Some((index, offset, len)) = found else {
            return Err(ArenaError::Exhausted {
                requested: size,
                remaining: self.free_bytes(),
            });
        };

        let span = self.free.remove(index);
        let tail = Span { offset: offset + len, len: span.end() - (offset + len) };
        let head = Span { offset: span.offset, len: offset - span.offset };
        if tail.len > 0 {
            self.free.insert(index, tail);
        }
        if head.len > 0 {
            self.free.insert(index, head);
        }

        self.live.insert(offset, len);
        Ok((offset, len))
    }

    /// Return the block starting at `offset` to the free spans.
    ///
    /// Returns `false` when no live block starts there.
    pub(crate) fn release(&mut self, offset: usize) -> bool {
        let Some(len) = self.live.remove(&offset) else {
            return false;
        };

        let index = self.free.partition_point(|span| span.offset < offset);
        self.free.insert(index, Span { offset, len });

        // Merge with the following span, then the preceding one.
        if index + 1 < self.free.len() && self.free[index].end() == self.free[index + 1].offset {
            let next = self.free.remove(index + 1);
            self.free[index].len += next.len;
        }
        if index > 0 && self.free[index - 1].end() == self.free[index].offset {
            let current = self.free.remove(index);
            self.free[index - 1].len += current.len;
        }
        true
    }

    pub(crate) fn used(&self) -> usize {
        self.live.values().sum()
    }

    pub(crate) fn free_bytes(&self) -> usize {
        self.capacity - self.used()
    }

    pub(crate) fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Size of the largest contiguous free span.
    pub(crate) fn largest_free_span(&self) -> usize {
        self.free.iter().map(|span| span.len).max().unwrap_or(0)
    }
}

/// Round `value` up to a multiple of `align` (a power of two).
#[inline]
pub(crate) fn round_up(value: usize, align: usize) -> Option<usize> {
    Some(value.checked_add(align - 1)? & !(align - 1))
}
