// this_file: src/font_info.rs

//! Font display configuration passed to every render call.
//!
//! Bit values follow the UEFI HII font definitions so a firmware-backed
//! platform can hand these structures straight to its font protocol.

use crate::error::{Error, Result};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// One pixel in blue/green/red/reserved order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BltPixel {
    pub blue: u8,
    pub green: u8,
    pub red: u8,
    #[serde(default)]
    pub reserved: u8,
}

impl BltPixel {
    pub const BLACK: BltPixel = BltPixel::rgb(0x00, 0x00, 0x00);
    pub const WHITE: BltPixel = BltPixel::rgb(0xFF, 0xFF, 0xFF);

    /// Build an opaque pixel from red, green and blue.
    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self {
            blue,
            green,
            red,
            reserved: 0,
        }
    }

    /// True when any colour channel is nonzero. The reserved channel is ignored.
    #[inline]
    pub fn is_non_background(&self) -> bool {
        self.red != 0 || self.green != 0 || self.blue != 0
    }
}

bitflags! {
    /// Requested font style.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct FontStyle: u32 {
        const BOLD = 0x0000_0001;
        const ITALIC = 0x0000_0002;
        const EMBOSS = 0x0001_0000;
        const OUTLINE = 0x0002_0000;
        const SHADOW = 0x0004_0000;
        const UNDERLINE = 0x0008_0000;
        const DBL_UNDER = 0x0010_0000;
    }
}

bitflags! {
    /// Which fields of a [`FontDisplayInfo`] the renderer may substitute.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct FontInfoMask: u32 {
        const SYS_FONT = 0x0000_0001;
        const SYS_SIZE = 0x0000_0002;
        const SYS_STYLE = 0x0000_0004;
        const SYS_FORE_COLOR = 0x0000_0010;
        const SYS_BACK_COLOR = 0x0000_0020;
        const RESIZE = 0x0000_0040;
        const RESTYLE = 0x0000_0080;
        const ANY_FONT = 0x0000_0100;
        const ANY_SIZE = 0x0000_0200;
        const ANY_STYLE = 0x0000_0400;
    }
}

impl FontInfoMask {
    /// Mask that lets rendering succeed regardless of cosmetic mismatch.
    pub const ACCEPT_ANY: FontInfoMask = FontInfoMask::ANY_FONT
        .union(FontInfoMask::ANY_SIZE)
        .union(FontInfoMask::ANY_STYLE);
}

/// Font name, size, style, colours and substitution mask for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FontDisplayInfo {
    font_name: String,
    font_size: u16,
    font_style: FontStyle,
    foreground: BltPixel,
    background: BltPixel,
    mask: FontInfoMask,
}

impl FontDisplayInfo {
    /// Build the display info, reserving the name buffer fallibly.
    ///
    /// Allocation failure surfaces as [`Error::OutOfResources`].
    pub fn try_new(
        font_name: &str,
        font_size: u16,
        font_style: FontStyle,
        foreground: BltPixel,
        background: BltPixel,
        mask: FontInfoMask,
    ) -> Result<Self> {
        let mut name = String::new();
        name.try_reserve_exact(font_name.len()).map_err(|e| {
            Error::OutOfResources(format!("font name buffer ({} bytes): {}", font_name.len(), e))
        })?;
        name.push_str(font_name);

        Ok(Self {
            font_name: name,
            font_size,
            font_style,
            foreground,
            background,
            mask,
        })
    }

    /// Bytes a firmware implementation allocates for this structure:
    /// the fixed header plus a NUL-terminated UCS-2 name.
    pub fn pool_size(font_name: &str) -> usize {
        const HEADER: usize = 4 + 4 + 2 + 4 + 4 + 4;
        HEADER + (font_name.encode_utf16().count() + 1) * 2
    }

    pub fn font_name(&self) -> &str {
        &self.font_name
    }

    pub fn font_size(&self) -> u16 {
        self.font_size
    }

    pub fn font_style(&self) -> FontStyle {
        self.font_style
    }

    pub fn foreground(&self) -> BltPixel {
        self.foreground
    }

    pub fn background(&self) -> BltPixel {
        self.background
    }

    pub fn mask(&self) -> FontInfoMask {
        self.mask
    }
}
