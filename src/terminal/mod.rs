//! Terminal keyboard.
//!
//! A [`TextInputFacility`] for hosts whose operator sits at a terminal.
//! The prompt is drawn on stderr; keystrokes come from stdin.
//!
//! ```text
//!   stdin ──read──► work buffer ──► InputParser ──► LineEditor
//!                   (4 KiB, arena)     KeyEvent        │
//!                                                      ├─ Enter   → Success
//!                                                      ├─ Esc/^C  → Canceled
//!                                                      └─ redraw prompt (stderr)
//! ```
//!
//! When stdin is not a terminal (piped input, CI) one line is read in
//! cooked mode and filtered through the same editor rules.

pub mod ansi;
pub mod editor;
pub mod parser;
pub mod raw;

use std::io::{self, BufRead, Write};

use crate::keyboard::{
    DEFAULT_MAX_TEXT_UNITS, FacilityFailure, KeyboardConfig, KeyboardFlags, OutputString,
    ShowKeyboardArg, ShowResult, TextInputFacility,
};

pub use editor::{EditResult, LineEditor};
pub use parser::{InputParser, KeyCode, KeyEvent, Modifier};
pub use raw::RawModeGuard;

/// Bytes of stdin staged per read.
pub const TERMINAL_WORK_BUFFER_SIZE: usize = 4096;

/// How long a lone ESC waits for the rest of a sequence.
pub const ESCAPE_TIMEOUT_MS: i32 = 25;

/// Failure code: the work buffer handed in was smaller than requested.
pub const ERR_WORK_BUFFER: u32 = 0x0001;

/// Failure code: reading the terminal failed.
pub const ERR_TERMINAL_IO: u32 = 0x0002;

const PROMPT: &str = "> ";

/// Keyboard driven from the controlling terminal.
#[derive(Debug, Clone)]
pub struct TerminalKeyboard {
    max_text_units: usize,
}

impl TerminalKeyboard {
    pub fn new() -> Self {
        Self::with_max_text_units(DEFAULT_MAX_TEXT_UNITS)
    }

    /// Keyboard whose string buffer holds `max_text_units` plus a terminator.
    pub fn with_max_text_units(max_text_units: usize) -> Self {
        Self { max_text_units }
    }

    pub fn max_text_units(&self) -> usize {
        self.max_text_units
    }
}

impl Default for TerminalKeyboard {
    fn default() -> Self {
        Self::new()
    }
}

impl TextInputFacility for TerminalKeyboard {
    fn required_work_buffer_size(&self) -> usize {
        TERMINAL_WORK_BUFFER_SIZE
    }

    fn required_string_buffer_size(&self) -> usize {
        self.max_text_units.saturating_add(1).saturating_mul(2)
    }

    fn show_keyboard(&mut self, out: &mut OutputString<'_>, arg: ShowKeyboardArg<'_>) -> ShowResult {
        let ShowKeyboardArg { config, work_buffer } = arg;
        if work_buffer.len() < TERMINAL_WORK_BUFFER_SIZE {
            out.clear();
            return ShowResult::Failed(FacilityFailure::new(
                ERR_WORK_BUFFER,
                format!("work buffer of {} bytes, need {TERMINAL_WORK_BUFFER_SIZE}", work_buffer.len()),
            ));
        }
        if config.prediction_enabled() {
            tracing::debug!("word prediction requested; terminal keyboard has none");
        }

        let max_units = config
            .max_text_units
            .min(self.max_text_units)
            .min(out.capacity().saturating_sub(1));
        let session = if raw::stdin_is_tty() {
            run_interactive(&config, work_buffer, max_units)
        } else {
            run_line(&config, max_units)
        };

        match session {
            Ok((result, text)) => {
                out.write_str(&text);
                result
            }
            Err(err) => {
                tracing::error!(error = %err, "terminal keyboard failed");
                out.clear();
                ShowResult::Failed(FacilityFailure::new(ERR_TERMINAL_IO, err.to_string()))
            }
        }
    }
}

/// Raw-mode editing session.
fn run_interactive(
    config: &KeyboardConfig,
    work: &mut [u8],
    max_units: usize,
) -> io::Result<(ShowResult, String)> {
    let _raw = RawModeGuard::enable()?;
    let prompt = Prompt::new(config);
    let mut editor = LineEditor::new(config.mode, max_units);
    let mut parser = InputParser::new();
    let mut stderr = io::stderr().lock();

    prompt.draw(&mut stderr, &editor)?;
    loop {
        let events = if parser.has_pending() && !raw::poll_stdin(ESCAPE_TIMEOUT_MS)? {
            parser.flush_pending()
        } else {
            let n = raw::read_stdin(work)?;
            if n == 0 {
                prompt.finish(&mut stderr)?;
                return Ok((ShowResult::Canceled, editor.into_text()));
            }
            parser.parse(&work[..n])
        };

        for event in &events {
            match editor.handle_key(event) {
                EditResult::Submit => {
                    prompt.finish(&mut stderr)?;
                    return Ok((ShowResult::Success, editor.into_text()));
                }
                EditResult::Cancel => {
                    prompt.finish(&mut stderr)?;
                    return Ok((ShowResult::Canceled, editor.into_text()));
                }
                EditResult::Edited | EditResult::Ignored => {}
            }
        }
        prompt.draw(&mut stderr, &editor)?;
    }
}

/// Cooked-mode fallback: one line from stdin.
fn run_line(config: &KeyboardConfig, max_units: usize) -> io::Result<(ShowResult, String)> {
    let guide = config.guide_text();
    if !guide.is_empty() {
        let mut stderr = io::stderr().lock();
        write!(stderr, "{guide}{PROMPT}")?;
        stderr.flush()?;
    }

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        tracing::debug!("stdin closed before a line was entered");
        return Ok((ShowResult::Canceled, String::new()));
    }

    let mut editor = LineEditor::new(config.mode, max_units);
    for ch in line.trim_end_matches(['\r', '\n']).chars() {
        editor.insert(ch);
    }
    Ok((ShowResult::Success, editor.into_text()))
}

/// Draws the prompt line.
#[derive(Debug)]
struct Prompt<'a> {
    guide: &'a str,
    masked: bool,
}

impl<'a> Prompt<'a> {
    fn new(config: &'a KeyboardConfig) -> Self {
        Self {
            guide: config.guide_text(),
            masked: config.flags.contains(KeyboardFlags::MASKED),
        }
    }

    /// Redraw the whole line and place the cursor.
    fn draw<W: Write>(&self, w: &mut W, editor: &LineEditor) -> io::Result<()> {
        let mut out = Vec::with_capacity(128);
        ansi::cursor_hide(&mut out)?;
        ansi::cursor_column_zero(&mut out)?;
        ansi::erase_line(&mut out)?;
        out.extend_from_slice(PROMPT.as_bytes());

        let column = if editor.is_empty() {
            ansi::dim(&mut out)?;
            out.extend_from_slice(self.guide.as_bytes());
            ansi::reset(&mut out)?;
            0
        } else {
            out.extend_from_slice(editor.display(self.masked).as_bytes());
            editor.cursor_column(self.masked)
        };

        ansi::cursor_column_zero(&mut out)?;
        let target = PROMPT.len() + column;
        ansi::cursor_forward(&mut out, u16::try_from(target).unwrap_or(u16::MAX))?;
        ansi::cursor_show(&mut out)?;

        w.write_all(&out)?;
        w.flush()
    }

    /// Leave the line as typed and move below it.
    fn finish<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let mut out = Vec::with_capacity(8);
        ansi::reset(&mut out)?;
        ansi::newline(&mut out)?;
        w.write_all(&out)?;
        w.flush()
    }
}
