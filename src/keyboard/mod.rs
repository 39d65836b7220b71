//! Contract of the platform text-input facility.
//!
//! The facility is a black box: it declares how much scratch memory it
//! needs, accepts a configuration plus a work buffer, blocks while the
//! operator types, and leaves a null-terminated UTF-16 string in the output
//! buffer however the session ends.
//!
//! ```text
//!   required_work_buffer_size()    ─┐
//!   required_string_buffer_size()  ─┤ caller allocates both
//!                                   ▼
//!   show_keyboard(&mut OutputString, ShowKeyboardArg) ── blocks ──► ShowResult
//!                                   │
//!                                   └─► OutputString holds text + 0x0000
//! ```

pub mod config;
pub mod mock;
pub mod result;

pub use config::{
    DEFAULT_MAX_TEXT_UNITS, GUIDE_TEXT_MAX_UNITS, KeyboardConfig, KeyboardFlags, KeyboardMode,
    Preset,
};
pub use mock::{MockKeyboard, ScriptedSession};
pub use result::{FacilityFailure, ShowResult};

/// A platform on-screen keyboard.
pub trait TextInputFacility {
    /// Bytes of scratch memory one session needs.
    fn required_work_buffer_size(&self) -> usize;

    /// Bytes of output buffer one session needs, terminator included.
    fn required_string_buffer_size(&self) -> usize;

    /// Run one blocking session.
    ///
    /// Must leave a null-terminated UTF-16 string in `out` on every return.
    fn show_keyboard(&mut self, out: &mut OutputString<'_>, arg: ShowKeyboardArg<'_>) -> ShowResult;
}

impl<F: TextInputFacility + ?Sized> TextInputFacility for &mut F {
    fn required_work_buffer_size(&self) -> usize {
        (**self).required_work_buffer_size()
    }

    fn required_string_buffer_size(&self) -> usize {
        (**self).required_string_buffer_size()
    }

    fn show_keyboard(&mut self, out: &mut OutputString<'_>, arg: ShowKeyboardArg<'_>) -> ShowResult {
        (**self).show_keyboard(out, arg)
    }
}

/// Arguments of one keyboard session.
#[derive(Debug)]
pub struct ShowKeyboardArg<'a> {
    pub config: KeyboardConfig,
    /// Scratch memory, at least `required_work_buffer_size()` bytes.
    pub work_buffer: &'a mut [u8],
}

/// Output buffer the facility writes the entered text into.
#[derive(Debug)]
pub struct OutputString<'a> {
    units: &'a mut [u16],
}

impl<'a> OutputString<'a> {
    pub fn new(units: &'a mut [u16]) -> Self {
        Self { units }
    }

    /// Capacity in code units, terminator included.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.units.len()
    }

    pub fn as_units(&self) -> &[u16] {
        &*self.units
    }

    pub fn as_units_mut(&mut self) -> &mut [u16] {
        &mut *self.units
    }

    /// Store `text` followed by a terminator.
    ///
    /// Characters that do not fit before the terminator are dropped whole.
    /// Returns the number of code units stored.
    pub fn write_str(&mut self, text: &str) -> usize {
        let Some(limit) = self.units.len().checked_sub(1) else {
            return 0;
        };

        let mut written = 0;
        let mut pair = [0u16; 2];
        for ch in text.chars() {
            let encoded = ch.encode_utf16(&mut pair);
            if written + encoded.len() > limit {
                break;
            }
            self.units[written..written + encoded.len()].copy_from_slice(encoded);
            written += encoded.len();
        }
        self.units[written] = 0;
        written
    }

    /// Store the empty string.
    pub fn clear(&mut self) {
        if let Some(first) = self.units.first_mut() {
            *first = 0;
        }
    }
}
