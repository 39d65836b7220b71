//! Result codes returned by a keyboard session.

use std::fmt;

/// How a keyboard session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShowResult {
    /// The operator confirmed the text.
    Success,
    /// The operator dismissed the keyboard.
    Canceled,
    /// The facility could not run the session.
    Failed(FacilityFailure),
}

impl ShowResult {
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, ShowResult::Success)
    }

    #[inline]
    pub fn is_canceled(&self) -> bool {
        matches!(self, ShowResult::Canceled)
    }
}

/// Facility-specific failure code with a short description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacilityFailure {
    pub code: u32,
    pub message: String,
}

impl FacilityFailure {
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for FacilityFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "facility error {:#06x}: {}", self.code, self.message)
    }
}
