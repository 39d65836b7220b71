//! Scripted keyboard for tests.
//!
//! Plays back queued sessions instead of asking an operator, and records
//! what each session was shown so tests can assert on the configuration and
//! buffers the caller provided.

use std::collections::VecDeque;

use super::config::{DEFAULT_MAX_TEXT_UNITS, KeyboardConfig};
use super::result::{FacilityFailure, ShowResult};
use super::{OutputString, ShowKeyboardArg, TextInputFacility};

/// Work buffer size the mock asks for by default.
pub const MOCK_WORK_BUFFER_SIZE: usize = 16 * 1024;

/// Failure code reported when the script runs dry.
pub const SCRIPT_EXHAUSTED: u32 = 0xFFFF;

/// One queued session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedSession {
    /// Units copied verbatim into the output buffer. No terminator is added.
    pub units: Vec<u16>,
    pub result: ShowResult,
}

impl ScriptedSession {
    /// Session that leaves `units` in the buffer exactly as given.
    pub fn raw(units: Vec<u16>, result: ShowResult) -> Self {
        Self { units, result }
    }

    pub fn completed(text: &str) -> Self {
        Self::raw(terminated(text), ShowResult::Success)
    }

    pub fn canceled(text: &str) -> Self {
        Self::raw(terminated(text), ShowResult::Canceled)
    }

    pub fn failed(code: u32, message: &str, text: &str) -> Self {
        Self::raw(terminated(text), ShowResult::Failed(FacilityFailure::new(code, message)))
    }
}

fn terminated(text: &str) -> Vec<u16> {
    text.encode_utf16().chain(std::iter::once(0)).collect()
}

/// What a session received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShownSession {
    pub config: KeyboardConfig,
    pub work_buffer_len: usize,
    /// Address of the work buffer, for alignment checks.
    pub work_buffer_addr: usize,
    pub output_capacity: usize,
    /// Address of the output buffer, for alignment checks.
    pub output_addr: usize,
}

/// Facility that replays [`ScriptedSession`]s.
#[derive(Debug)]
pub struct MockKeyboard {
    work_buffer_size: usize,
    string_buffer_size: usize,
    script: VecDeque<ScriptedSession>,
    shown: Vec<ShownSession>,
}

impl MockKeyboard {
    pub fn new() -> Self {
        Self::with_buffer_sizes(MOCK_WORK_BUFFER_SIZE, (DEFAULT_MAX_TEXT_UNITS + 1) * 2)
    }

    pub fn with_buffer_sizes(work_buffer_size: usize, string_buffer_size: usize) -> Self {
        Self {
            work_buffer_size,
            string_buffer_size,
            script: VecDeque::new(),
            shown: Vec::new(),
        }
    }

    /// Queue a session.
    pub fn push(&mut self, session: ScriptedSession) -> &mut Self {
        self.script.push_back(session);
        self
    }

    /// Builder form of [`push`](Self::push).
    pub fn with_session(mut self, session: ScriptedSession) -> Self {
        self.script.push_back(session);
        self
    }

    pub fn pending(&self) -> usize {
        self.script.len()
    }

    pub fn shown(&self) -> &[ShownSession] {
        &self.shown
    }

    pub fn last_shown(&self) -> Option<&ShownSession> {
        self.shown.last()
    }
}

impl Default for MockKeyboard {
    fn default() -> Self {
        Self::new()
    }
}

impl TextInputFacility for MockKeyboard {
    fn required_work_buffer_size(&self) -> usize {
        self.work_buffer_size
    }

    fn required_string_buffer_size(&self) -> usize {
        self.string_buffer_size
    }

    fn show_keyboard(&mut self, out: &mut OutputString<'_>, arg: ShowKeyboardArg<'_>) -> ShowResult {
        self.shown.push(ShownSession {
            config: arg.config,
            work_buffer_len: arg.work_buffer.len(),
            work_buffer_addr: arg.work_buffer.as_ptr().addr(),
            output_capacity: out.capacity(),
            output_addr: out.as_units().as_ptr().addr(),
        });
        // A real keyboard scribbles over its work area.
        arg.work_buffer.fill(0xA5);

        let Some(session) = self.script.pop_front() else {
            out.clear();
            return ShowResult::Failed(FacilityFailure::new(SCRIPT_EXHAUSTED, "no scripted session"));
        };

        let units = out.as_units_mut();
        let len = session.units.len().min(units.len());
        units[..len].copy_from_slice(&session.units[..len]);
        session.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::KeyboardConfig;

    fn show(mock: &mut MockKeyboard, capacity: usize) -> (ShowResult, Vec<u16>) {
        let mut work = vec![0u8; mock.required_work_buffer_size()];
        let mut units = vec![0xEEEEu16; capacity];
        let mut out = OutputString::new(&mut units);
        let result = mock.show_keyboard(
            &mut out,
            ShowKeyboardArg {
                config: KeyboardConfig::default(),
                work_buffer: &mut work,
            },
        );
        (result, units)
    }

    #[test]
    fn test_plays_sessions_in_order() {
        let mut mock = MockKeyboard::new()
            .with_session(ScriptedSession::completed("AB"))
            .with_session(ScriptedSession::canceled(""));

        let (result, units) = show(&mut mock, 8);
        assert_eq!(result, ShowResult::Success);
        assert_eq!(&units[..3], &[0x41, 0x42, 0]);

        let (result, units) = show(&mut mock, 8);
        assert!(result.is_canceled());
        assert_eq!(units[0], 0);

        assert_eq!(mock.pending(), 0);
        assert_eq!(mock.shown().len(), 2);
    }

    #[test]
    fn test_empty_script_fails_with_empty_text() {
        let mut mock = MockKeyboard::new();
        let (result, units) = show(&mut mock, 4);
        assert!(matches!(result, ShowResult::Failed(ref f) if f.code == SCRIPT_EXHAUSTED));
        assert_eq!(units[0], 0);
    }

    #[test]
    fn test_records_buffers() {
        let mut mock = MockKeyboard::with_buffer_sizes(128, 16).with_session(ScriptedSession::completed("x"));
        show(&mut mock, 8);
        let shown = mock.last_shown().unwrap();
        assert_eq!(shown.work_buffer_len, 128);
        assert_eq!(shown.output_capacity, 8);
    }
}
