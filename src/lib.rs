//! # softkbd
//!
//! Capture a line of text from a software keyboard and hand it to the host
//! as big-endian UTF-16 bytes.
//!
//! ## Architecture
//!
//! Every capture provisions a private [`Arena`], carves the keyboard's two
//! scratch buffers out of it, runs one blocking keyboard session, drains
//! the text and tears the arena down again:
//! ```text
//! CaptureSettings → Arena (page-aligned blocks) → TextInputFacility::show_keyboard
//!                                               → UTF-16 units → big-endian bytes
//! ```
//!
//! ## Modules
//!
//! - [`arena`] - Bounded first-fit allocator over one zero-filled region
//! - [`keyboard`] - Facility contract, configuration, scripted mock
//! - [`capture`] - Session sequencing and UTF-16 → byte conversion
//! - [`terminal`] - Facility backed by the controlling terminal
//! - [`config`] - Capture settings and `SOFTKBD_*` environment overrides
//! - [`logging`] - `tracing` subscriber setup
//!
//! The C ABI exports at the bottom of this file drive [`TerminalKeyboard`].

pub mod arena;
pub mod capture;
pub mod config;
pub mod error;
pub mod keyboard;
pub mod logging;
pub mod terminal;

pub use arena::Arena;
pub use capture::{CaptureAdapter, CaptureOutcome, CapturedText, Drained, capture};
pub use config::{ArenaSizing, CaptureSettings};
pub use error::{ArenaError, ArenaResult, CaptureError, CaptureResult};
pub use keyboard::{
    FacilityFailure, KeyboardConfig, KeyboardFlags, KeyboardMode, MockKeyboard, Preset,
    ScriptedSession, ShowResult, TextInputFacility,
};
pub use terminal::TerminalKeyboard;

use std::ptr;

// =============================================================================
// C ABI
// =============================================================================

/// `dest` was null.
pub const SOFTKBD_ERR_NULL_DEST: i32 = -1;
/// The captured text did not fit in `capacity` bytes.
pub const SOFTKBD_ERR_BUFFER_TOO_SMALL: i32 = -2;
/// The scratch arena could not serve the keyboard's buffers.
pub const SOFTKBD_ERR_ARENA: i32 = -3;
/// A `SOFTKBD_*` environment variable could not be parsed.
pub const SOFTKBD_ERR_CONFIG: i32 = -4;

pub const SOFTKBD_STATUS_COMPLETED: u32 = 0;
pub const SOFTKBD_STATUS_CANCELED: u32 = 1;
pub const SOFTKBD_STATUS_FAILED: u32 = 2;

/// Capture text into `dest`, high byte first.
///
/// Returns the number of UTF-16 code units written (`2 ×` that many bytes)
/// or a negative `SOFTKBD_ERR_*` code. Canceled and failed sessions still
/// report whatever text the keyboard left behind.
///
/// # Safety
///
/// `dest` must be null or valid for writes of `capacity` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn softkbd_capture(dest: *mut u8, capacity: usize) -> i32 {
    // SAFETY: forwarded caller contract; a null status is never written.
    unsafe { softkbd_capture_status(dest, capacity, ptr::null_mut()) }
}

/// [`softkbd_capture`] that also reports how the session ended.
///
/// On a non-negative return `*status` holds one of the
/// `SOFTKBD_STATUS_*` values. It is left untouched on errors.
///
/// # Safety
///
/// `dest` must be null or valid for writes of `capacity` bytes. `status`
/// must be null or valid for a `u32` write.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn softkbd_capture_status(dest: *mut u8, capacity: usize, status: *mut u32) -> i32 {
    let settings = match CaptureSettings::from_env() {
        Ok(settings) => settings,
        Err(err) => {
            tracing::error!(%err, "invalid capture settings");
            return SOFTKBD_ERR_CONFIG;
        }
    };
    let keyboard = TerminalKeyboard::with_max_text_units(settings.max_text_units);
    // SAFETY: forwarded caller contract.
    unsafe { capture_to_raw(keyboard, settings, dest, capacity, status) }
}

/// Destination bytes needed for the longest text the keyboard accepts.
#[unsafe(no_mangle)]
pub extern "C" fn softkbd_required_capacity() -> usize {
    let settings = CaptureSettings::from_env().unwrap_or_else(|err| {
        tracing::warn!(%err, "invalid capture settings, assuming defaults");
        CaptureSettings::default()
    });
    required_capacity(&settings)
}

/// Install the stderr log subscriber.
///
/// Returns 0 on success, 1 when a subscriber was already installed.
#[unsafe(no_mangle)]
pub extern "C" fn softkbd_init_logging() -> u32 {
    match logging::init() {
        Ok(()) => 0,
        Err(_) => 1,
    }
}

fn required_capacity(settings: &CaptureSettings) -> usize {
    settings.max_text_units.saturating_mul(2)
}

/// Run one session on `facility` and write the result through raw pointers.
///
/// # Safety
///
/// Same contract as [`softkbd_capture_status`].
unsafe fn capture_to_raw<F: TextInputFacility>(
    facility: F,
    settings: CaptureSettings,
    dest: *mut u8,
    capacity: usize,
    status: *mut u32,
) -> i32 {
    if dest.is_null() {
        tracing::error!("capture called with a null destination");
        return SOFTKBD_ERR_NULL_DEST;
    }
    // SAFETY: dest is non-null and the caller vouches for capacity bytes.
    let dest = unsafe { std::slice::from_raw_parts_mut(dest, capacity) };

    let drained = match CaptureAdapter::new(facility, settings).capture_into(dest) {
        Ok(drained) => drained,
        Err(err) => {
            tracing::error!(%err, "capture failed");
            return match err {
                CaptureError::BufferTooSmall { .. } => SOFTKBD_ERR_BUFFER_TOO_SMALL,
                CaptureError::Arena(_) => SOFTKBD_ERR_ARENA,
                CaptureError::Config { .. } => SOFTKBD_ERR_CONFIG,
            };
        }
    };

    if !status.is_null() {
        let code = match drained.result {
            ShowResult::Success => SOFTKBD_STATUS_COMPLETED,
            ShowResult::Canceled => SOFTKBD_STATUS_CANCELED,
            ShowResult::Failed(_) => SOFTKBD_STATUS_FAILED,
        };
        // SAFETY: non-null and valid per the caller contract.
        unsafe { status.write(code) };
    }
    i32::try_from(drained.units).unwrap_or(i32::MAX)
}
