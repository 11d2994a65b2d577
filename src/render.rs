// this_file: src/render.rs

//! Glyph rendering through the platform font service.
//!
//! Every image a font service hands out is wrapped in a [`RenderedImage`],
//! which returns the buffer to the service when dropped. Callers never
//! release buffers by hand, so no exit path can leak one or free it twice.

use crate::analyze::{self, Visibility};
use crate::error::{Error, Result};
use crate::font_info::FontDisplayInfo;
use crate::platform::{FontService, ImageOutput, OutputFlags};
use log::{debug, warn};
use serde::Serialize;
use std::fmt;

/// Scoped owner of one image produced by a [`FontService`].
pub struct RenderedImage<'a> {
    image: ImageOutput,
    service: &'a dyn FontService,
}

impl<'a> RenderedImage<'a> {
    /// Take ownership of `image`; it goes back to `service` on drop.
    pub fn new(image: ImageOutput, service: &'a dyn FontService) -> Self {
        Self { image, service }
    }

    pub fn image(&self) -> &ImageOutput {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image().width
    }

    pub fn height(&self) -> u32 {
        self.image().height
    }

    /// Inspect the pixels, then release the buffer.
    pub fn inspect(self) -> Visibility {
        analyze::inspect(self.image())
    }
}

impl Drop for RenderedImage<'_> {
    fn drop(&mut self) {
        let released = ImageOutput {
            width: 0,
            height: 0,
            bitmap: None,
        };
        let image = std::mem::replace(&mut self.image, released);
        debug!("releasing {}x{} image", image.width, image.height);
        self.service.release_image(image);
    }
}

impl fmt::Debug for RenderedImage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RenderedImage({}x{})", self.image.width, self.image.height)
    }
}

/// Renders the probe payloads with one fixed display configuration.
pub struct GlyphRenderer<'a> {
    service: &'a dyn FontService,
    info: &'a FontDisplayInfo,
}

impl<'a> GlyphRenderer<'a> {
    pub fn new(service: &'a dyn FontService, info: &'a FontDisplayInfo) -> Self {
        Self { service, info }
    }

    pub fn info(&self) -> &FontDisplayInfo {
        self.info
    }

    /// Render a whole string placed at `origin`.
    pub fn render_text(
        &self,
        text: &str,
        origin: (u32, u32),
        flags: OutputFlags,
    ) -> Result<RenderedImage<'a>> {
        if text.is_empty() {
            return Err(Error::InvalidParameter("cannot render an empty string".into()));
        }
        debug!(
            "string_to_image {:?} at {:?} flags={:?}",
            text, origin, flags
        );
        let image = self
            .service
            .string_to_image(flags, text, self.info, origin.0, origin.1)?;
        Ok(RenderedImage::new(image, self.service))
    }

    /// Render one character; also returns its baseline offset.
    pub fn render_glyph(&self, ch: char) -> Result<(RenderedImage<'a>, u32)> {
        debug!("get_glyph U+{:04X}", ch as u32);
        let (image, baseline) = self.service.get_glyph(ch, self.info)?;
        Ok((RenderedImage::new(image, self.service), baseline))
    }
}

/// What happened to one render attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RenderCheck {
    /// Not attempted because an earlier stage ended the run
    Skipped,
    /// The service returned an image, which was inspected
    Rendered {
        width: u32,
        height: u32,
        visibility: Visibility,
        #[serde(skip_serializing_if = "Option::is_none")]
        baseline: Option<u32>,
    },
    /// The service refused the request
    Failed { status: String, reason: String },
}

impl RenderCheck {
    /// Non-fatal render errors become a `Failed` check.
    pub fn failed(err: &Error) -> Self {
        warn!("render failed: {}", err);
        RenderCheck::Failed {
            status: err.status().to_string(),
            reason: err.to_string(),
        }
    }

    /// Inspect and release a successful render.
    pub fn from_image(image: RenderedImage<'_>, baseline: Option<u32>) -> Self {
        let (width, height) = (image.width(), image.height());
        let visibility = image.inspect();
        RenderCheck::Rendered {
            width,
            height,
            visibility,
            baseline,
        }
    }

    pub fn is_visible(&self) -> bool {
        matches!(
            self,
            RenderCheck::Rendered {
                visibility: Visibility { visible: true, .. },
                ..
            }
        )
    }

    pub fn non_background(&self) -> usize {
        match self {
            RenderCheck::Rendered { visibility, .. } => visibility.non_background,
            _ => 0,
        }
    }

    /// Summary wording.
    pub fn as_supported(&self) -> &'static str {
        if self.is_visible() {
            "SUPPORTED"
        } else {
            "NOT SUPPORTED"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font_info::{BltPixel, FontInfoMask, FontStyle};
    use std::cell::Cell;

    #[derive(Default)]
    struct Counting {
        released: Cell<usize>,
        fail: bool,
    }

    impl FontService for Counting {
        fn string_to_image(
            &self,
            _flags: OutputFlags,
            text: &str,
            _info: &FontDisplayInfo,
            _x: u32,
            _y: u32,
        ) -> Result<ImageOutput> {
            if self.fail {
                return Err(Error::Rendering("no glyphs".into()));
            }
            Ok(ImageOutput::filled(text.chars().count() as u32, 1, BltPixel::WHITE))
        }

        fn get_glyph(&self, _ch: char, _info: &FontDisplayInfo) -> Result<(ImageOutput, u32)> {
            if self.fail {
                return Err(Error::NotFound("glyph".into()));
            }
            Ok((ImageOutput::filled(16, 16, BltPixel::BLACK), 13))
        }

        fn release_image(&self, _image: ImageOutput) {
            self.released.set(self.released.get() + 1);
        }
    }

    fn info() -> FontDisplayInfo {
        FontDisplayInfo::try_new(
            "StandardFont",
            16,
            FontStyle::empty(),
            BltPixel::WHITE,
            BltPixel::BLACK,
            FontInfoMask::ACCEPT_ANY,
        )
        .unwrap()
    }

    #[test]
    fn dropping_releases_once() {
        let service = Counting::default();
        let info = info();
        let renderer = GlyphRenderer::new(&service, &info);
        {
            let image = renderer
                .render_text("你好", (0, 0), OutputFlags::CLIP)
                .unwrap();
            assert_eq!(image.width(), 2);
        }
        assert_eq!(service.released.get(), 1);
    }

    #[test]
    fn inspect_releases_after_analysis() {
        let service = Counting::default();
        let info = info();
        let renderer = GlyphRenderer::new(&service, &info);
        let (image, baseline) = renderer.render_glyph('中').unwrap();
        let check = RenderCheck::from_image(image, Some(baseline));
        assert_eq!(service.released.get(), 1);
        assert!(!check.is_visible());
        assert_eq!(check.as_supported(), "NOT SUPPORTED");
    }

    #[test]
    fn failures_release_nothing() {
        let service = Counting {
            fail: true,
            ..Default::default()
        };
        let info = info();
        let renderer = GlyphRenderer::new(&service, &info);
        let err = renderer.render_glyph('中').unwrap_err();
        let check = RenderCheck::failed(&err);
        assert_eq!(service.released.get(), 0);
        assert!(matches!(check, RenderCheck::Failed { ref status, .. } if status == "Not Found"));
    }

    #[test]
    fn empty_text_is_rejected_before_the_service() {
        let service = Counting::default();
        let info = info();
        let renderer = GlyphRenderer::new(&service, &info);
        assert!(matches!(
            renderer.render_text("", (0, 0), OutputFlags::empty()),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn visible_string_is_supported() {
        let service = Counting::default();
        let info = info();
        let renderer = GlyphRenderer::new(&service, &info);
        let image = renderer.render_text("世界", (10, 100), OutputFlags::CLIP).unwrap();
        let check = RenderCheck::from_image(image, None);
        assert!(check.is_visible());
        assert_eq!(check.non_background(), 2);
    }
}
