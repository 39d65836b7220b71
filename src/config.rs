//! Capture settings.
//!
//! `CaptureSettings::default()` reproduces the stock session: default
//! preset, full keyboard, prediction on, the "please input word." hint.
//! The C ABI entry point takes no parameters, so hosts adjust it through
//! environment variables read by [`CaptureSettings::from_env`].

use crate::arena::GRANULE;
use crate::error::{ArenaError, CaptureError, CaptureResult};
use crate::keyboard::{DEFAULT_MAX_TEXT_UNITS, KeyboardConfig, KeyboardMode, Preset};

/// Fixed arena ceiling used before sizing followed the facility.
pub const LEGACY_ARENA_BYTES: usize = 128 * 1024 * 1024;

/// Hint shown in the empty text field.
pub const DEFAULT_GUIDE_TEXT: &str = "please input word.";

/// Largest accepted `SOFTKBD_MAX_TEXT_UNITS`.
pub const MAX_TEXT_UNITS_LIMIT: usize = 0x10000;

pub const ENV_GUIDE_TEXT: &str = "SOFTKBD_GUIDE_TEXT";
pub const ENV_ARENA_BYTES: &str = "SOFTKBD_ARENA_BYTES";
pub const ENV_MAX_TEXT_UNITS: &str = "SOFTKBD_MAX_TEXT_UNITS";
pub const ENV_PREDICTION: &str = "SOFTKBD_PREDICTION";

/// How large the per-capture arena is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArenaSizing {
    /// Both scratch buffers, each rounded to a page, plus one page of slack.
    #[default]
    FromFacility,
    /// A fixed ceiling in bytes.
    Fixed(usize),
}

impl ArenaSizing {
    /// Arena capacity for a session needing `work` and `text` bytes with
    /// page-aligned blocks.
    pub fn capacity(self, work: usize, text: usize, page: usize) -> CaptureResult<usize> {
        match self {
            ArenaSizing::Fixed(bytes) => Ok(bytes),
            ArenaSizing::FromFacility => {
                let overflow = || CaptureError::Arena(ArenaError::CapacityOverflow(usize::MAX));
                let block = |size: usize| {
                    size.max(GRANULE)
                        .checked_next_multiple_of(page)
                        .ok_or_else(overflow)
                };
                block(work)?
                    .checked_add(block(text)?)
                    .and_then(|sum| sum.checked_add(page))
                    .ok_or_else(overflow)
            }
        }
    }
}

/// Everything that shapes one capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSettings {
    pub preset: Preset,
    pub keyboard_mode: KeyboardMode,
    pub prediction: bool,
    pub guide_text: String,
    pub max_text_units: usize,
    pub arena: ArenaSizing,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            preset: Preset::Default,
            keyboard_mode: KeyboardMode::Full,
            prediction: true,
            guide_text: DEFAULT_GUIDE_TEXT.to_owned(),
            max_text_units: DEFAULT_MAX_TEXT_UNITS,
            arena: ArenaSizing::FromFacility,
        }
    }
}

impl CaptureSettings {
    /// Keyboard configuration for one session.
    pub fn keyboard_config(&self) -> KeyboardConfig {
        let mut config = KeyboardConfig::preset(self.preset);
        config.mode = self.keyboard_mode;
        config.max_text_units = self.max_text_units;
        config.set_prediction(self.prediction);
        config.set_guide_text_utf8(&self.guide_text);
        config
    }

    /// Defaults overridden by `SOFTKBD_*` environment variables.
    pub fn from_env() -> CaptureResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each key.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CaptureResult<Self> {
        let mut settings = Self::default();

        if let Some(text) = lookup(ENV_GUIDE_TEXT) {
            settings.guide_text = text;
        }
        if let Some(raw) = lookup(ENV_ARENA_BYTES) {
            settings.arena = ArenaSizing::Fixed(parse_positive(ENV_ARENA_BYTES, &raw)?);
        }
        if let Some(raw) = lookup(ENV_MAX_TEXT_UNITS) {
            let units = parse_positive(ENV_MAX_TEXT_UNITS, &raw)?;
            if units > MAX_TEXT_UNITS_LIMIT {
                return Err(CaptureError::Config {
                    key: ENV_MAX_TEXT_UNITS,
                    reason: format!("{units} exceeds the limit of {MAX_TEXT_UNITS_LIMIT}"),
                });
            }
            settings.max_text_units = units;
        }
        if let Some(raw) = lookup(ENV_PREDICTION) {
            settings.prediction = parse_switch(ENV_PREDICTION, &raw)?;
        }

        Ok(settings)
    }
}

fn parse_positive(key: &'static str, raw: &str) -> CaptureResult<usize> {
    match raw.trim().parse::<usize>() {
        Ok(0) => Err(CaptureError::Config {
            key,
            reason: "must be greater than zero".to_owned(),
        }),
        Ok(value) => Ok(value),
        Err(err) => Err(CaptureError::Config {
            key,
            reason: format!("{raw:?}: {err}"),
        }),
    }
}

fn parse_switch(key: &'static str, raw: &str) -> CaptureResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        _ => Err(CaptureError::Config {
            key,
            reason: format!("{raw:?} is not a boolean"),
        }),
    }
}
