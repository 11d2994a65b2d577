// this_file: src/platform.rs

//! Host capabilities consumed by the probe.
//!
//! A platform is whatever hosts the probe: real firmware, the software
//! platform in [`crate::software`], or a scripted double in tests. The probe
//! only ever talks to these traits.

use crate::error::{Error, Result};
use crate::font_info::{BltPixel, FontDisplayInfo};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Optional services the probe looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceId {
    /// Font rendering service (HII Font)
    Font,
    /// Font/string database service (HII Database)
    Database,
    /// Graphics output surface (GOP)
    Graphics,
}

impl ServiceId {
    /// Probe order.
    pub const ALL: [ServiceId; 3] = [ServiceId::Font, ServiceId::Database, ServiceId::Graphics];

    /// Human-readable service name used in the console report.
    pub fn display_name(self) -> &'static str {
        match self {
            ServiceId::Font => "HII Font Protocol",
            ServiceId::Database => "HII Database Protocol",
            ServiceId::Graphics => "Graphics Output Protocol",
        }
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

bitflags! {
    /// Output flags accepted by [`FontService::string_to_image`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct OutputFlags: u32 {
        const CLIP = 0x0000_0001;
        const WRAP = 0x0000_0002;
        const CLIP_CLEAN_Y = 0x0000_0004;
        const CLIP_CLEAN_X = 0x0000_0008;
        const TRANSPARENT = 0x0000_0010;
        const IGNORE_IF_NO_GLYPH = 0x0000_0020;
        const IGNORE_LINE_BREAK = 0x0000_0040;
        const DIRECT_TO_SCREEN = 0x0000_0080;
    }
}

/// Raw bitmap returned by a font service.
///
/// `bitmap` may be `None` when a service reports success without drawing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageOutput {
    pub width: u32,
    pub height: u32,
    pub bitmap: Option<Vec<BltPixel>>,
}

impl ImageOutput {
    /// Image filled with a single colour.
    pub fn filled(width: u32, height: u32, color: BltPixel) -> Self {
        Self {
            width,
            height,
            bitmap: Some(vec![color; width as usize * height as usize]),
        }
    }

    /// Number of pixels the dimensions describe.
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// True when there is nothing to inspect: no buffer or no area.
    pub fn is_void(&self) -> bool {
        self.bitmap.is_none() || self.area() == 0
    }

    /// Pixel at (x, y), if inside the image and the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&BltPixel> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y as usize * self.width as usize + x as usize;
        self.bitmap.as_ref()?.get(idx)
    }
}

/// Font rendering service.
pub trait FontService {
    /// Render a whole string into a new image, placing the text at (x, y).
    fn string_to_image(
        &self,
        flags: OutputFlags,
        text: &str,
        info: &FontDisplayInfo,
        x: u32,
        y: u32,
    ) -> Result<ImageOutput>;

    /// Render one character, returning the image and its baseline offset.
    fn get_glyph(&self, ch: char, info: &FontDisplayInfo) -> Result<(ImageOutput, u32)>;

    /// Return an image's buffer to the host.
    fn release_image(&self, image: ImageOutput);
}

/// Font/string database service.
pub trait FontDatabase {
    /// Families the database knows about.
    fn font_families(&self) -> Vec<String>;
}

/// Graphics output surface.
pub trait GraphicsSurface {
    /// Current mode resolution, if known.
    fn resolution(&self) -> Option<(u32, u32)>;

    /// Present a rendered image for visual inspection.
    fn blit(&self, label: &str, image: &ImageOutput) -> Result<()>;
}

/// A located service.
#[derive(Clone, Copy)]
pub enum ServiceHandle<'a> {
    Font(&'a dyn FontService),
    Database(&'a dyn FontDatabase),
    Graphics(&'a dyn GraphicsSurface),
}

impl ServiceHandle<'_> {
    /// Which service this handle belongs to.
    pub fn id(&self) -> ServiceId {
        match self {
            ServiceHandle::Font(_) => ServiceId::Font,
            ServiceHandle::Database(_) => ServiceId::Database,
            ServiceHandle::Graphics(_) => ServiceId::Graphics,
        }
    }
}

impl fmt::Debug for ServiceHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceHandle({:?})", self.id())
    }
}

/// The host environment.
pub trait Platform {
    /// Locate an optional service. Absence is `Err(Error::NotFound(_))`.
    fn locate_service(&self, id: ServiceId) -> Result<ServiceHandle<'_>>;

    /// Ask the host pool allocator for `bytes`.
    fn allocate_pool(&self, bytes: usize) -> Result<()> {
        let _ = bytes;
        Ok(())
    }

    /// Return `bytes` obtained from [`Platform::allocate_pool`].
    fn free_pool(&self, bytes: usize) {
        let _ = bytes;
    }

    /// Block for `duration`.
    fn stall(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Helper for platforms: the standard "service absent" error.
pub fn not_found(id: ServiceId) -> Error {
    Error::NotFound(format!("{} not present", id.display_name()))
}
