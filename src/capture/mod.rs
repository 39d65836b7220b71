//! Input capture: one keyboard session backed by a throwaway arena.
//!
//! # Flow
//!
//! ```text
//!   Arena::with_capacity(sizing)         one arena per capture
//!        │
//!        ├─ allocate(work,   page)       facility scratch
//!        ├─ allocate(string, page)       UTF-16 output
//!        │
//!   show_keyboard(out, config + work)    blocks on the operator
//!        │
//!   drain out → big-endian bytes         every outcome, cancel included
//!        │
//!        ├─ deallocate(string)
//!        ├─ deallocate(work)
//!   finalize
//! ```
//!
//! A canceled session still returns whatever the operator typed before
//! dismissing the keyboard; callers that want cancel to mean "no text"
//! check [`CaptureOutcome::is_canceled`].

pub mod convert;

use std::slice;

use tracing::{debug, info, warn};

use crate::arena::{self, Arena};
use crate::config::CaptureSettings;
use crate::error::CaptureResult;
use crate::keyboard::{FacilityFailure, OutputString, ShowKeyboardArg, ShowResult, TextInputFacility};

/// Text produced by a session, as big-endian UTF-16 bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedText {
    bytes: Vec<u8>,
}

impl CapturedText {
    /// Encode the terminated prefix of `units`.
    pub fn from_units(units: &[u16]) -> Self {
        Self {
            bytes: convert::encode_be(units),
        }
    }

    /// Number of UTF-16 code units.
    #[inline]
    pub fn units(&self) -> usize {
        self.bytes.len() / 2
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// The code units, decoded back from the byte stream.
    pub fn code_units(&self) -> impl Iterator<Item = u16> + '_ {
        self.bytes
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
    }

    /// Decode as UTF-16, replacing unpaired surrogates with U+FFFD.
    pub fn to_string_lossy(&self) -> String {
        char::decode_utf16(self.code_units())
            .map(|ch| ch.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()
    }
}

/// How a capture ended, with the text drained from the output buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Completed(CapturedText),
    Canceled(CapturedText),
    Failed {
        failure: FacilityFailure,
        text: CapturedText,
    },
}

impl CaptureOutcome {
    fn new(result: ShowResult, text: CapturedText) -> Self {
        match result {
            ShowResult::Success => CaptureOutcome::Completed(text),
            ShowResult::Canceled => CaptureOutcome::Canceled(text),
            ShowResult::Failed(failure) => CaptureOutcome::Failed { failure, text },
        }
    }

    pub fn text(&self) -> &CapturedText {
        match self {
            CaptureOutcome::Completed(text)
            | CaptureOutcome::Canceled(text)
            | CaptureOutcome::Failed { text, .. } => text,
        }
    }

    pub fn into_text(self) -> CapturedText {
        match self {
            CaptureOutcome::Completed(text)
            | CaptureOutcome::Canceled(text)
            | CaptureOutcome::Failed { text, .. } => text,
        }
    }

    /// Code units drained, whatever the outcome.
    #[inline]
    pub fn units(&self) -> usize {
        self.text().units()
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, CaptureOutcome::Completed(_))
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, CaptureOutcome::Canceled(_))
    }

    pub fn failure(&self) -> Option<&FacilityFailure> {
        match self {
            CaptureOutcome::Failed { failure, .. } => Some(failure),
            _ => None,
        }
    }
}

/// Result of [`CaptureAdapter::capture_into`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drained {
    pub result: ShowResult,
    /// Code units written to the destination.
    pub units: usize,
}

impl Drained {
    #[inline]
    pub fn bytes_written(&self) -> usize {
        self.units * 2
    }
}

/// Runs keyboard sessions against a [`TextInputFacility`].
#[derive(Debug)]
pub struct CaptureAdapter<F> {
    facility: F,
    settings: CaptureSettings,
}

impl<F: TextInputFacility> CaptureAdapter<F> {
    pub fn new(facility: F, settings: CaptureSettings) -> Self {
        Self { facility, settings }
    }

    pub fn with_defaults(facility: F) -> Self {
        Self::new(facility, CaptureSettings::default())
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    pub fn facility(&self) -> &F {
        &self.facility
    }

    pub fn facility_mut(&mut self) -> &mut F {
        &mut self.facility
    }

    pub fn into_facility(self) -> F {
        self.facility
    }

    /// Run one session and return its outcome and text.
    pub fn capture(&mut self) -> CaptureResult<CaptureOutcome> {
        let (result, text) = self.run_session(CapturedText::from_units)?;
        Ok(CaptureOutcome::new(result, text))
    }

    /// Run one session and write its text into `dest`, high byte first.
    ///
    /// Fails with [`CaptureError::BufferTooSmall`](crate::CaptureError::BufferTooSmall)
    /// without touching `dest` when the text does not fit.
    pub fn capture_into(&mut self, dest: &mut [u8]) -> CaptureResult<Drained> {
        let (result, units) = self.run_session(|units| convert::write_be(units, dest))?;
        Ok(Drained { result, units: units? })
    }

    fn run_session<T>(&mut self, drain: impl FnOnce(&[u16]) -> T) -> CaptureResult<(ShowResult, T)> {
        let work_size = self.facility.required_work_buffer_size();
        let string_size = self.facility.required_string_buffer_size();
        let page = arena::page_size();
        let capacity = self.settings.arena.capacity(work_size, string_size, page)?;

        let mut arena = Arena::with_capacity(capacity)?;
        let work = arena.allocate(work_size, page)?;
        let string = match arena.allocate(string_size, page) {
            Ok(ptr) => ptr,
            Err(err) => {
                arena.deallocate(work.as_ptr())?;
                return Err(err.into());
            }
        };
        debug!(capacity, work_size, string_size, "scratch buffers allocated");

        let (result, drained) = {
            // SAFETY: both blocks are live, zero-filled, disjoint and at least
            // as long as requested until they are deallocated below. Page
            // alignment covers u16. The slices do not outlive this block.
            let work_buffer = unsafe { slice::from_raw_parts_mut(work.as_ptr(), work_size) };
            let units =
                unsafe { slice::from_raw_parts_mut(string.as_ptr().cast::<u16>(), string_size / 2) };
            let mut out = OutputString::new(units);

            let config = self.settings.keyboard_config();
            info!(guide = config.guide_text(), mode = ?config.mode, "showing keyboard");
            let result = self.facility.show_keyboard(&mut out, ShowKeyboardArg { config, work_buffer });
            (result, drain(out.as_units()))
        };

        match &result {
            ShowResult::Success => info!("keyboard session completed"),
            ShowResult::Canceled => info!("keyboard session canceled"),
            ShowResult::Failed(failure) => warn!(%failure, "keyboard session failed"),
        }

        arena.deallocate(string.as_ptr())?;
        arena.deallocate(work.as_ptr())?;
        arena.finalize();
        Ok((result, drained))
    }
}

/// Run one session with default settings.
pub fn capture<F: TextInputFacility>(facility: F) -> CaptureResult<CaptureOutcome> {
    CaptureAdapter::with_defaults(facility).capture()
}
