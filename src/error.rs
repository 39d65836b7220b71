//! Error types for softkbd.
//!
//! Arena misuse and exhaustion are reported as values instead of being left
//! undefined. The only unrecoverable condition is failing to acquire the
//! arena's backing region, which aborts through `handle_alloc_error`.

use thiserror::Error;

/// Errors raised by [`crate::arena::Arena`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArenaError {
    /// `initialize` was asked for a zero-byte region.
    #[error("arena capacity must be positive")]
    ZeroCapacity,

    /// `initialize` was called on an arena that already owns a region.
    #[error("arena is already initialized")]
    AlreadyInitialized,

    /// The requested region size cannot be described as a page-aligned layout.
    #[error("arena capacity {0} is too large")]
    CapacityOverflow(usize),

    /// `allocate` was called before `initialize` or after `finalize`.
    #[error("arena is not initialized")]
    Uninitialized,

    /// The requested alignment is zero or not a power of two.
    #[error("alignment {0} is not a power of two")]
    InvalidAlignment(usize),

    /// No free span can hold the request.
    #[error("arena exhausted: requested {requested} bytes, {remaining} bytes free")]
    Exhausted {
        /// Bytes asked for, as passed to `allocate`.
        requested: usize,
        /// Total free bytes left in the region (possibly fragmented).
        remaining: usize,
    },

    /// `deallocate` got an address this arena never handed out, or one
    /// already released.
    #[error("address {0:#x} is not a live allocation of this arena")]
    UnknownAllocation(usize),
}

/// Errors raised by [`crate::capture::CaptureAdapter`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// Scratch memory could not be provided.
    #[error("scratch arena: {0}")]
    Arena(#[from] ArenaError),

    /// The caller's destination cannot hold the encoded text.
    #[error("destination too small: {required} bytes required, {available} available")]
    BufferTooSmall {
        /// Bytes the encoded text needs.
        required: usize,
        /// Bytes the destination offers.
        available: usize,
    },

    /// A configuration value could not be parsed.
    #[error("invalid setting {key}: {reason}")]
    Config {
        /// Environment key that failed.
        key: &'static str,
        /// What was wrong with it.
        reason: String,
    },
}

pub type ArenaResult<T> = Result<T, ArenaError>;
pub type CaptureResult<T> = Result<T, CaptureError>;
