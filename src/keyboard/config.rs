//! Keyboard configuration handed to the text-input facility.

use bitflags::bitflags;

/// Longest guide text the facility displays, in UTF-16 code units.
pub const GUIDE_TEXT_MAX_UNITS: usize = 64;

/// Default bound on the entered text, in UTF-16 code units.
pub const DEFAULT_MAX_TEXT_UNITS: usize = 500;

/// Starting points for a [`KeyboardConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    #[default]
    Default,
    Password,
    UserName,
    DownloadCode,
}

/// Which characters the keyboard offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyboardMode {
    /// Any character, including kana/kanji conversion on hosts that have it.
    #[default]
    Full,
    /// Digits only.
    Numeric,
    /// Printable ASCII only.
    Ascii,
}

impl KeyboardMode {
    /// Whether `ch` may be entered in this mode.
    pub fn accepts(self, ch: char) -> bool {
        match self {
            KeyboardMode::Full => !ch.is_control(),
            KeyboardMode::Numeric => ch.is_ascii_digit(),
            KeyboardMode::Ascii => ch.is_ascii_graphic() || ch == ' ',
        }
    }
}

bitflags! {
    /// Keyboard behaviour switches.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct KeyboardFlags: u32 {
        /// Offer word prediction while typing.
        const PREDICTION    = 1 << 0;
        /// Hide entered characters.
        const MASKED        = 1 << 1;
        /// Allow line breaks in the text.
        const NEWLINE       = 1 << 2;
        /// Show a cancel control.
        const CANCEL_BUTTON = 1 << 3;
    }
}

/// Full keyboard configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardConfig {
    pub preset: Preset,
    pub mode: KeyboardMode,
    pub flags: KeyboardFlags,
    /// Upper bound on entered text, in UTF-16 code units.
    pub max_text_units: usize,
    guide_text: String,
}

impl KeyboardConfig {
    /// Build the configuration a preset describes.
    pub fn preset(preset: Preset) -> Self {
        let (mode, flags, max_text_units) = match preset {
            Preset::Default => (KeyboardMode::Full, KeyboardFlags::CANCEL_BUTTON, DEFAULT_MAX_TEXT_UNITS),
            Preset::Password => (
                KeyboardMode::Ascii,
                KeyboardFlags::CANCEL_BUTTON | KeyboardFlags::MASKED,
                DEFAULT_MAX_TEXT_UNITS,
            ),
            Preset::UserName => (KeyboardMode::Full, KeyboardFlags::CANCEL_BUTTON, 32),
            Preset::DownloadCode => (KeyboardMode::Ascii, KeyboardFlags::CANCEL_BUTTON, 16),
        };

        Self {
            preset,
            mode,
            flags,
            max_text_units,
            guide_text: String::new(),
        }
    }

    /// Set the hint shown while the field is empty.
    ///
    /// Text beyond [`GUIDE_TEXT_MAX_UNITS`] UTF-16 units is dropped, never
    /// splitting a character.
    pub fn set_guide_text_utf8(&mut self, text: &str) {
        let mut units = 0;
        let end = text
            .char_indices()
            .find(|(_, ch)| {
                units += ch.len_utf16();
                units > GUIDE_TEXT_MAX_UNITS
            })
            .map_or(text.len(), |(index, _)| index);
        self.guide_text = text[..end].to_owned();
    }

    pub fn guide_text(&self) -> &str {
        &self.guide_text
    }

    #[inline]
    pub fn prediction_enabled(&self) -> bool {
        self.flags.contains(KeyboardFlags::PREDICTION)
    }

    pub fn set_prediction(&mut self, enabled: bool) {
        self.flags.set(KeyboardFlags::PREDICTION, enabled);
    }
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self::preset(Preset::Default)
    }
}
