//! Escape sequence parser for keyboard input.
//!
//! Turns raw stdin bytes into key events:
//! - Control keys (bytes 0-31, DEL)
//! - CSI sequences (arrows, Home, End, Delete)
//! - SS3 sequences (alternate arrow/Home/End encodings)
//! - Alt+key (ESC + char)
//! - UTF-8 multi-byte characters
//!
//! A lone ESC byte is ambiguous until more input arrives or a short timeout
//! passes; the caller decides by calling [`InputParser::flush_pending`].

use bitflags::bitflags;

// =============================================================================
// Types
// =============================================================================

/// A key event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifier,
}

/// Key code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyCode {
    Char(char),
    Enter,
    Tab,
    Backspace,
    Escape,
    Delete,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    Null,
}

bitflags! {
    /// Keyboard modifiers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Modifier: u8 {
        const NONE  = 0;
        const SHIFT = 1 << 0;
        const ALT   = 1 << 1;
        const CTRL  = 1 << 2;
    }
}

// =============================================================================
// Parser
// =============================================================================

/// Input parser state machine.
#[derive(Debug)]
pub struct InputParser {
    buf: Vec<u8>,
}

impl InputParser {
    pub fn new() -> Self {
        Self { buf: Vec::with_capacity(64) }
    }

    /// Parse a byte sequence into key events.
    ///
    /// Bytes of an incomplete sequence are kept for the next call.
    pub fn parse(&mut self, data: &[u8]) -> Vec<KeyEvent> {
        self.buf.extend_from_slice(data);
        let mut events = Vec::new();

        while !self.buf.is_empty() {
            match self.try_parse_one() {
                ParseResult::Event(ev) => events.push(ev),
                ParseResult::Skip => {}
                ParseResult::Incomplete => break,
            }
        }

        events
    }

    /// Whether an incomplete sequence is waiting for more bytes.
    pub fn has_pending(&self) -> bool {
        !self.buf.is_empty()
    }

    /// Give up waiting: a lone ESC is the Escape key. Unfinished sequences
    /// such as `ESC [` are dropped.
    pub fn flush_pending(&mut self) -> Vec<KeyEvent> {
        let events = match self.buf.as_slice() {
            [0x1B] => vec![key(KeyCode::Escape, Modifier::NONE)],
            _ => Vec::new(),
        };
        self.buf.clear();
        events
    }

    fn try_parse_one(&mut self) -> ParseResult {
        let first = self.buf[0];

        match first {
            0x1B => self.parse_escape(),
            0x00 => self.emit(1, KeyCode::Null, Modifier::CTRL),
            0x08 | 0x7F => self.emit(1, KeyCode::Backspace, Modifier::NONE),
            0x09 => self.emit(1, KeyCode::Tab, Modifier::NONE),
            0x0A | 0x0D => self.emit(1, KeyCode::Enter, Modifier::NONE),
            0x01..=0x1A => {
                let ch = (first + b'a' - 1) as char;
                self.emit(1, KeyCode::Char(ch), Modifier::CTRL)
            }
            0x20..=0x7E => self.emit(1, KeyCode::Char(first as char), Modifier::NONE),
            0x80..=0xFF => self.parse_utf8(),
            _ => {
                self.consume(1);
                ParseResult::Skip
            }
        }
    }

    fn parse_escape(&mut self) -> ParseResult {
        if self.buf.len() < 2 {
            return ParseResult::Incomplete;
        }

        match self.buf[1] {
            b'[' => self.parse_csi(),
            b'O' => self.parse_ss3(),
            0x20..=0x7E => {
                let ch = self.buf[1] as char;
                self.emit(2, KeyCode::Char(ch), Modifier::ALT)
            }
            0x1B => self.emit(2, KeyCode::Escape, Modifier::ALT),
            _ => self.emit(1, KeyCode::Escape, Modifier::NONE),
        }
    }

    fn parse_csi(&mut self) -> ParseResult {
        // Find the final byte (0x40-0x7E)
        let Some(end) = self.buf[2..]
            .iter()
            .position(|b| (0x40..=0x7E).contains(b))
            .map(|pos| pos + 2)
        else {
            return ParseResult::Incomplete;
        };

        let params: Vec<u32> = String::from_utf8_lossy(&self.buf[2..end])
            .split(';')
            .map(|s| s.parse::<u32>().unwrap_or(0))
            .collect();
        let modifiers = match params.get(1) {
            Some(&param) if param > 0 => decode_modifier(param),
            _ => Modifier::NONE,
        };

        let code = match self.buf[end] {
            b'A' => Some(KeyCode::Up),
            b'B' => Some(KeyCode::Down),
            b'C' => Some(KeyCode::Right),
            b'D' => Some(KeyCode::Left),
            b'H' => Some(KeyCode::Home),
            b'F' => Some(KeyCode::End),
            b'~' => match params.first().copied().unwrap_or(0) {
                1 | 7 => Some(KeyCode::Home),
                3 => Some(KeyCode::Delete),
                4 | 8 => Some(KeyCode::End),
                _ => None,
            },
            _ => None,
        };

        self.consume(end + 1);
        match code {
            Some(code) => ParseResult::Event(KeyEvent { code, modifiers }),
            None => ParseResult::Skip,
        }
    }

    fn parse_ss3(&mut self) -> ParseResult {
        if self.buf.len() < 3 {
            return ParseResult::Incomplete;
        }

        let code = match self.buf[2] {
            b'A' => Some(KeyCode::Up),
            b'B' => Some(KeyCode::Down),
            b'C' => Some(KeyCode::Right),
            b'D' => Some(KeyCode::Left),
            b'H' => Some(KeyCode::Home),
            b'F' => Some(KeyCode::End),
            _ => None,
        };

        self.consume(3);
        match code {
            Some(code) => ParseResult::Event(key(code, Modifier::NONE)),
            None => ParseResult::Skip,
        }
    }

    fn parse_utf8(&mut self) -> ParseResult {
        let first = self.buf[0];
        let expected_len = if first & 0xE0 == 0xC0 {
            2
        } else if first & 0xF0 == 0xE0 {
            3
        } else if first & 0xF8 == 0xF0 {
            4
        } else {
            self.consume(1);
            return ParseResult::Skip;
        };

        if self.buf.len() < expected_len {
            return ParseResult::Incomplete;
        }

        let decoded = std::str::from_utf8(&self.buf[..expected_len])
            .ok()
            .and_then(|s| s.chars().next());
        match decoded {
            Some(ch) => self.emit(expected_len, KeyCode::Char(ch), Modifier::NONE),
            None => {
                self.consume(1);
                ParseResult::Skip
            }
        }
    }

    fn emit(&mut self, len: usize, code: KeyCode, modifiers: Modifier) -> ParseResult {
        self.consume(len);
        ParseResult::Event(KeyEvent { code, modifiers })
    }

    fn consume(&mut self, n: usize) {
        self.buf.drain(..n);
    }
}

impl Default for InputParser {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Helpers
// =============================================================================

enum ParseResult {
    Event(KeyEvent),
    Skip,
    Incomplete,
}

pub(crate) fn key(code: KeyCode, modifiers: Modifier) -> KeyEvent {
    KeyEvent { code, modifiers }
}

/// Decode CSI modifier parameter (1-based).
fn decode_modifier(param: u32) -> Modifier {
    let val = param.saturating_sub(1);
    let mut m = Modifier::NONE;
    if val & 1 != 0 { m |= Modifier::SHIFT; }
    if val & 2 != 0 { m |= Modifier::ALT; }
    if val & 4 != 0 { m |= Modifier::CTRL; }
    m
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_bytes(data: &[u8]) -> Vec<KeyEvent> {
        let mut parser = InputParser::new();
        parser.parse(data)
    }

    #[test]
    fn test_ascii_chars() {
        let events = parse_bytes(b"abc");
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], key(KeyCode::Char('a'), Modifier::NONE));
        assert_eq!(events[2], key(KeyCode::Char('c'), Modifier::NONE));
    }

    #[test]
    fn test_enter_and_backspace() {
        assert_eq!(parse_bytes(b"\r")[0], key(KeyCode::Enter, Modifier::NONE));
        assert_eq!(parse_bytes(b"\n")[0], key(KeyCode::Enter, Modifier::NONE));
        assert_eq!(parse_bytes(b"\x7f")[0], key(KeyCode::Backspace, Modifier::NONE));
        assert_eq!(parse_bytes(b"\x08")[0], key(KeyCode::Backspace, Modifier::NONE));
    }

    #[test]
    fn test_ctrl_c() {
        assert_eq!(parse_bytes(b"\x03")[0], key(KeyCode::Char('c'), Modifier::CTRL));
    }

    #[test]
    fn test_arrow_keys() {
        assert_eq!(parse_bytes(b"\x1b[A")[0], key(KeyCode::Up, Modifier::NONE));
        assert_eq!(parse_bytes(b"\x1b[C")[0], key(KeyCode::Right, Modifier::NONE));
        assert_eq!(parse_bytes(b"\x1b[D")[0], key(KeyCode::Left, Modifier::NONE));
        assert_eq!(parse_bytes(b"\x1bOH")[0], key(KeyCode::Home, Modifier::NONE));
    }

    #[test]
    fn test_modified_arrow() {
        assert_eq!(parse_bytes(b"\x1b[1;5D")[0], key(KeyCode::Left, Modifier::CTRL));
    }

    #[test]
    fn test_delete_home_end() {
        assert_eq!(parse_bytes(b"\x1b[3~")[0], key(KeyCode::Delete, Modifier::NONE));
        assert_eq!(parse_bytes(b"\x1b[1~")[0], key(KeyCode::Home, Modifier::NONE));
        assert_eq!(parse_bytes(b"\x1b[4~")[0], key(KeyCode::End, Modifier::NONE));
    }

    #[test]
    fn test_unknown_csi_is_skipped() {
        let events = parse_bytes(b"\x1b[15~x");
        assert_eq!(events, vec![key(KeyCode::Char('x'), Modifier::NONE)]);
    }

    #[test]
    fn test_alt_key() {
        assert_eq!(parse_bytes(b"\x1bx")[0], key(KeyCode::Char('x'), Modifier::ALT));
    }

    #[test]
    fn test_utf8_chars() {
        let events = parse_bytes("あ😀".as_bytes());
        assert_eq!(events[0], key(KeyCode::Char('あ'), Modifier::NONE));
        assert_eq!(events[1], key(KeyCode::Char('😀'), Modifier::NONE));
    }

    #[test]
    fn test_split_utf8_waits_for_rest() {
        let bytes = "あ".as_bytes();
        let mut parser = InputParser::new();
        assert!(parser.parse(&bytes[..1]).is_empty());
        assert!(parser.has_pending());
        assert_eq!(parser.parse(&bytes[1..]), vec![key(KeyCode::Char('あ'), Modifier::NONE)]);
        assert!(!parser.has_pending());
    }

    #[test]
    fn test_lone_escape_needs_flush() {
        let mut parser = InputParser::new();
        assert!(parser.parse(b"\x1b").is_empty());
        assert!(parser.has_pending());
        assert_eq!(parser.flush_pending(), vec![key(KeyCode::Escape, Modifier::NONE)]);
        assert!(!parser.has_pending());
    }

    #[test]
    fn test_partial_sequences_are_dropped_on_flush() {
        let mut parser = InputParser::new();
        let partials: [&[u8]; 3] = [b"\x1b[", b"\x1b[1;5", b"\x1bO"];
        for partial in partials {
            assert!(parser.parse(partial).is_empty());
            assert!(parser.has_pending());
            assert!(parser.flush_pending().is_empty());
            assert!(!parser.has_pending());
        }
        assert_eq!(parser.parse(b"a"), vec![key(KeyCode::Char('a'), Modifier::NONE)]);
    }

    #[test]
    fn test_modifier_decode() {
        assert_eq!(decode_modifier(2), Modifier::SHIFT);
        assert_eq!(decode_modifier(3), Modifier::ALT);
        assert_eq!(decode_modifier(5), Modifier::CTRL);
    }
}
