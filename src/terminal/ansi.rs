//! ANSI escape sequences for the prompt line.
//!
//! Only what a single-line editor needs: column moves, line erase, the dim
//! attribute for the guide text, and cursor visibility.

use std::io::Write;

/// Move cursor to beginning of line.
#[inline]
pub fn cursor_column_zero<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\r")
}

/// Move cursor forward (right) by n columns.
#[inline]
pub fn cursor_forward<W: Write>(w: &mut W, n: u16) -> std::io::Result<()> {
    if n > 0 {
        write!(w, "\x1b[{}C", n)
    } else {
        Ok(())
    }
}

/// Clear entire line.
#[inline]
pub fn erase_line<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[2K")
}

#[inline]
pub fn cursor_hide<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[?25l")
}

#[inline]
pub fn cursor_show<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[?25h")
}

/// Start dim (faint) text.
#[inline]
pub fn dim<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[2m")
}

/// Reset all attributes and colors.
#[inline]
pub fn reset<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[0m")
}

/// Carriage return plus line feed. Raw mode turns off output post-processing,
/// so a bare `\n` would not return to column zero.
#[inline]
pub fn newline<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_string<F: FnOnce(&mut Vec<u8>) -> std::io::Result<()>>(f: F) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_cursor_movement() {
        assert_eq!(to_string(cursor_column_zero), "\r");
        assert_eq!(to_string(|w| cursor_forward(w, 2)), "\x1b[2C");
        assert_eq!(to_string(|w| cursor_forward(w, 0)), "");
    }

    #[test]
    fn test_line_control() {
        assert_eq!(to_string(erase_line), "\x1b[2K");
        assert_eq!(to_string(newline), "\r\n");
    }

    #[test]
    fn test_attributes() {
        assert_eq!(to_string(dim), "\x1b[2m");
        assert_eq!(to_string(reset), "\x1b[0m");
        assert_eq!(to_string(cursor_hide), "\x1b[?25l");
        assert_eq!(to_string(cursor_show), "\x1b[?25h");
    }
}
