//! Single-line text editing.
//!
//! Handles character insertion, grapheme-aware deletion and cursor
//! movement, keyboard-mode filtering and the UTF-16 length limit. The text
//! lives in a `String`; the cursor is a byte offset that always sits on a
//! grapheme cluster boundary.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use super::parser::{KeyCode, KeyEvent, Modifier};
use crate::keyboard::KeyboardMode;

/// What a key did to the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditResult {
    /// Key not handled, or rejected by the mode or length limit.
    Ignored,
    /// Text or cursor changed.
    Edited,
    /// Operator confirmed the text.
    Submit,
    /// Operator backed out.
    Cancel,
}

/// Text editor for the prompt line.
#[derive(Debug, Clone)]
pub struct LineEditor {
    text: String,
    cursor: usize,
    mode: KeyboardMode,
    max_units: usize,
    units: usize,
}

impl LineEditor {
    pub fn new(mode: KeyboardMode, max_units: usize) -> Self {
        Self {
            text: String::new(),
            cursor: 0,
            mode,
            max_units,
            units: 0,
        }
    }

    /// Handle a key event.
    pub fn handle_key(&mut self, key: &KeyEvent) -> EditResult {
        match &key.code {
            KeyCode::Char(ch) if key.modifiers.contains(Modifier::CTRL) => match *ch {
                'c' => EditResult::Cancel,
                'd' if self.text.is_empty() => EditResult::Cancel,
                'd' => edited(self.delete_forward()),
                'a' => edited(self.move_home()),
                'e' => edited(self.move_end()),
                'u' => edited(self.delete_to_start()),
                _ => EditResult::Ignored,
            },
            KeyCode::Char(_) if key.modifiers.contains(Modifier::ALT) => EditResult::Ignored,
            KeyCode::Char(ch) => edited(self.insert(*ch)),
            KeyCode::Enter => EditResult::Submit,
            KeyCode::Escape => EditResult::Cancel,
            KeyCode::Backspace => edited(self.delete_backward()),
            KeyCode::Delete => edited(self.delete_forward()),
            KeyCode::Left => edited(self.move_left()),
            KeyCode::Right => edited(self.move_right()),
            KeyCode::Home => edited(self.move_home()),
            KeyCode::End => edited(self.move_end()),
            KeyCode::Tab | KeyCode::Up | KeyCode::Down | KeyCode::Null => EditResult::Ignored,
        }
    }

    /// Insert `ch` at the cursor. Returns false when the mode rejects it or
    /// it would push the text past the UTF-16 limit.
    pub fn insert(&mut self, ch: char) -> bool {
        if ch.is_control() || !self.mode.accepts(ch) {
            return false;
        }
        let units = ch.len_utf16();
        if self.units + units > self.max_units {
            return false;
        }
        self.text.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
        self.units += units;
        true
    }

    /// Remove the grapheme cluster before the cursor.
    pub fn delete_backward(&mut self) -> bool {
        let Some(start) = self.prev_boundary() else {
            return false;
        };
        self.remove(start..self.cursor);
        self.cursor = start;
        true
    }

    /// Remove the grapheme cluster after the cursor.
    pub fn delete_forward(&mut self) -> bool {
        let Some(end) = self.next_boundary() else {
            return false;
        };
        self.remove(self.cursor..end);
        true
    }

    fn delete_to_start(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.remove(0..self.cursor);
        self.cursor = 0;
        true
    }

    pub fn move_left(&mut self) -> bool {
        match self.prev_boundary() {
            Some(pos) => {
                self.cursor = pos;
                true
            }
            None => false,
        }
    }

    pub fn move_right(&mut self) -> bool {
        match self.next_boundary() {
            Some(pos) => {
                self.cursor = pos;
                true
            }
            None => false,
        }
    }

    pub fn move_home(&mut self) -> bool {
        let moved = self.cursor != 0;
        self.cursor = 0;
        moved
    }

    pub fn move_end(&mut self) -> bool {
        let moved = self.cursor != self.text.len();
        self.cursor = self.text.len();
        moved
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Length of the text in UTF-16 code units.
    pub fn utf16_len(&self) -> usize {
        self.units
    }

    /// Byte offset of the cursor.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// What the terminal shows: the text, or one `*` per grapheme when masked.
    pub fn display(&self, masked: bool) -> String {
        if masked {
            "*".repeat(self.text.graphemes(true).count())
        } else {
            self.text.clone()
        }
    }

    /// Terminal column of the cursor relative to the start of the text.
    pub fn cursor_column(&self, masked: bool) -> usize {
        let before = &self.text[..self.cursor];
        if masked {
            before.graphemes(true).count()
        } else {
            before.width()
        }
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.text[..self.cursor]
            .grapheme_indices(true)
            .next_back()
            .map(|(idx, _)| idx)
    }

    fn next_boundary(&self) -> Option<usize> {
        self.text[self.cursor..]
            .graphemes(true)
            .next()
            .map(|g| self.cursor + g.len())
    }

    fn remove(&mut self, range: std::ops::Range<usize>) {
        let removed: usize = self.text[range.clone()].chars().map(char::len_utf16).sum();
        self.text.replace_range(range, "");
        self.units -= removed;
    }
}

#[inline]
fn edited(changed: bool) -> EditResult {
    if changed { EditResult::Edited } else { EditResult::Ignored }
}
