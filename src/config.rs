// this_file: src/config.rs
//! Probe configuration: what to render and how.
//!
//! Every field has a default, so a config file only needs the fields it
//! changes:
//!
//! ```json
//! { "test_char": "界", "font_size": 19, "pause_ms": 0 }
//! ```

use crate::error::{Error, Result};
use crate::font_info::{BltPixel, FontInfoMask, FontStyle};
use crate::platform::OutputFlags;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Maximum accepted config file size (64KB)
pub const MAX_CONFIG_SIZE: u64 = 64 * 1024;

/// Maximum test string length in characters
pub const MAX_TEXT_LENGTH: usize = 1_000;

/// Largest font size a probe may request
pub const MAX_FONT_SIZE: u16 = 512;

/// Largest origin coordinate accepted for the string render
pub const MAX_ORIGIN: u32 = 8_192;

/// Mixed Latin and CJK test string
pub const DEFAULT_TEST_STRING: &str = "Hello 你好 World 世界";

/// CJK character for "middle"
pub const DEFAULT_TEST_CHAR: char = '中';

/// Settings for one probe run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbeConfig {
    /// String rendered as a whole; must contain a non-ASCII character
    pub test_string: String,
    /// Single character rendered through `get_glyph`
    pub test_char: char,
    /// Requested font family
    pub font_name: String,
    /// Requested font size in pixels
    pub font_size: u16,
    /// Requested style
    pub font_style: FontStyle,
    pub foreground: BltPixel,
    pub background: BltPixel,
    /// Fields the renderer may substitute
    pub font_info_mask: FontInfoMask,
    /// Where the string is placed inside the rendered image
    pub origin: (u32, u32),
    /// Flags passed to `string_to_image`
    pub output_flags: OutputFlags,
    /// Pause after the report, in milliseconds
    pub pause_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            test_string: DEFAULT_TEST_STRING.to_string(),
            test_char: DEFAULT_TEST_CHAR,
            font_name: "StandardFont".to_string(),
            font_size: 16,
            font_style: FontStyle::empty(),
            foreground: BltPixel::WHITE,
            background: BltPixel::BLACK,
            font_info_mask: FontInfoMask::ACCEPT_ANY,
            origin: (10, 100),
            output_flags: OutputFlags::CLIP,
            pause_ms: 2_000,
        }
    }
}

impl ProbeConfig {
    /// Load a JSON config file and validate it.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let size = std::fs::metadata(path)?.len();
        if size > MAX_CONFIG_SIZE {
            return Err(Error::InvalidParameter(format!(
                "config file {} is {} bytes, limit is {}",
                path.display(),
                size,
                MAX_CONFIG_SIZE
            )));
        }
        let json = std::fs::read_to_string(path)?;
        debug!("loaded probe config from {}", path.display());
        Self::from_json(&json)
    }

    /// Parse a JSON config and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ProbeConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configs that cannot exercise CJK rendering.
    pub fn validate(&self) -> Result<()> {
        if self.test_string.is_empty() {
            return Err(Error::InvalidParameter("test string is empty".into()));
        }
        let chars = self.test_string.chars().count();
        if chars > MAX_TEXT_LENGTH {
            return Err(Error::InvalidParameter(format!(
                "test string has {} characters, limit is {}",
                chars, MAX_TEXT_LENGTH
            )));
        }
        if self.test_string.is_ascii() {
            return Err(Error::InvalidParameter(
                "test string needs at least one character outside basic Latin".into(),
            ));
        }
        if self.test_char.is_ascii() {
            return Err(Error::InvalidParameter(format!(
                "test character {:?} is basic Latin",
                self.test_char
            )));
        }
        if self.font_size == 0 || self.font_size > MAX_FONT_SIZE {
            return Err(Error::InvalidParameter(format!(
                "font size {} outside 1..={}",
                self.font_size, MAX_FONT_SIZE
            )));
        }
        let (x, y) = self.origin;
        if x > MAX_ORIGIN || y > MAX_ORIGIN {
            return Err(Error::InvalidParameter(format!(
                "origin ({}, {}) outside 0..={}",
                x, y, MAX_ORIGIN
            )));
        }
        if self.font_name.is_empty() {
            return Err(Error::InvalidParameter("font name is empty".into()));
        }
        Ok(())
    }

    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }
}
