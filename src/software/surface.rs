// this_file: src/software/surface.rs
//! Graphics surface that writes each presented image to a PNG file.

use crate::error::{Error, Result};
use crate::font_info::BltPixel;
use crate::platform::{GraphicsSurface, ImageOutput};
use image::RgbaImage;
use log::info;
use std::path::{Path, PathBuf};

/// Presents images as `<dir>/<label>.png`.
#[derive(Debug)]
pub struct PngSurface {
    dir: PathBuf,
    resolution: (u32, u32),
}

impl PngSurface {
    /// Use `dir` as the surface, creating it if needed.
    pub fn new<P: AsRef<Path>>(dir: P, resolution: (u32, u32)) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, resolution })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where an image with `label` is written.
    pub fn path_for(&self, label: &str) -> PathBuf {
        let safe: String = label
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.png", safe))
    }
}

/// Convert BLT pixels into an opaque RGBA image.
pub fn to_rgba(image: &ImageOutput) -> Result<RgbaImage> {
    let bitmap = match &image.bitmap {
        Some(bitmap) if !image.is_void() && bitmap.len() >= image.area() => bitmap,
        _ => {
            return Err(Error::InvalidParameter(format!(
                "cannot present a {}x{} image without a full buffer",
                image.width, image.height
            )))
        }
    };
    let mut raw = Vec::with_capacity(image.area() * 4);
    for px in &bitmap[..image.area()] {
        raw.extend_from_slice(&[px.red, px.green, px.blue, 0xFF]);
    }
    RgbaImage::from_raw(image.width, image.height, raw)
        .ok_or_else(|| Error::Rendering("RGBA buffer size mismatch".into()))
}

/// Convert a decoded image back into BLT pixels. Alpha is dropped.
pub fn from_rgba(image: &RgbaImage) -> ImageOutput {
    let bitmap = image
        .pixels()
        .map(|p| BltPixel::rgb(p.0[0], p.0[1], p.0[2]))
        .collect();
    ImageOutput {
        width: image.width(),
        height: image.height(),
        bitmap: Some(bitmap),
    }
}

impl GraphicsSurface for PngSurface {
    fn resolution(&self) -> Option<(u32, u32)> {
        Some(self.resolution)
    }

    fn blit(&self, label: &str, image: &ImageOutput) -> Result<()> {
        let rgba = to_rgba(image)?;
        let path = self.path_for(label);
        rgba.save(&path)?;
        info!("presented {} render at {}", label, path.display());
        Ok(())
    }
}
