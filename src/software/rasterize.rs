// this_file: src/software/rasterize.rs

//! CPU font service: skrifa outlines rasterized with zeno into BLT pixels.

use super::fonts::{FontStore, LoadedFace};
use crate::error::{Error, Result};
use crate::font_info::{BltPixel, FontDisplayInfo, FontInfoMask, FontStyle};
use crate::platform::{FontService, ImageOutput, OutputFlags};
use log::{debug, trace, warn};
use read_fonts::types::GlyphId;
use skrifa::instance::{LocationRef, Size};
use skrifa::outline::{DrawSettings, OutlinePen};
use skrifa::{FontRef, MetadataProvider};
use std::cell::Cell;
use zeno::{Command, Mask, Transform};

/// Pixel height of the firmware system font, used for `SYS_SIZE`.
pub const SYSTEM_FONT_SIZE: u16 = 19;

/// Default bound on rendered image size.
pub const DEFAULT_MAX_IMAGE: (u32, u32) = (1024, 768);

/// Font service backed by a [`FontStore`].
#[derive(Debug)]
pub struct SoftwareFontService {
    store: FontStore,
    max_image: (u32, u32),
    outstanding: Cell<usize>,
    released: Cell<usize>,
}

/// A face usable for one request, with the parsed font.
struct Candidate<'a> {
    face: &'a LoadedFace,
    font: FontRef<'a>,
}

/// Resolved line metrics in pixels.
#[derive(Debug, Clone, Copy)]
struct LineMetrics {
    ascent: f32,
    line_height: u32,
}

/// One glyph placed by the string layout.
struct Placed {
    candidate: usize,
    glyph_id: GlyphId,
    x: f32,
    line: u32,
    advance: f32,
}

impl SoftwareFontService {
    pub fn new(store: FontStore) -> Self {
        Self {
            store,
            max_image: DEFAULT_MAX_IMAGE,
            outstanding: Cell::new(0),
            released: Cell::new(0),
        }
    }

    /// Bound rendered images to `width` x `height` pixels.
    pub fn with_max_image(mut self, width: u32, height: u32) -> Self {
        self.max_image = (width.max(1), height.max(1));
        self
    }

    pub fn store(&self) -> &FontStore {
        &self.store
    }

    /// Images handed out and not yet released.
    pub fn outstanding_images(&self) -> usize {
        self.outstanding.get()
    }

    /// Images released so far.
    pub fn released_images(&self) -> usize {
        self.released.get()
    }

    /// Faces matching the requested family and style, honouring the mask.
    fn candidates(&self, info: &FontDisplayInfo) -> Result<Vec<Candidate<'_>>> {
        let mask = info.mask();
        let any_font = mask.intersects(FontInfoMask::ANY_FONT | FontInfoMask::SYS_FONT);
        let any_style = mask.intersects(FontInfoMask::ANY_STYLE | FontInfoMask::SYS_STYLE);
        let style = info.font_style();

        let mut candidates = Vec::new();
        for face in self.store.faces() {
            if !any_font && !face.family().eq_ignore_ascii_case(info.font_name()) {
                continue;
            }
            if !any_style
                && (style.contains(FontStyle::BOLD) != face.is_bold()
                    || style.contains(FontStyle::ITALIC) != face.is_italic())
            {
                continue;
            }
            candidates.push(Candidate {
                face,
                font: face.font_ref()?,
            });
        }

        if candidates.is_empty() {
            return Err(Error::NotFound(format!(
                "no font matches '{}' style {:?}",
                info.font_name(),
                style
            )));
        }
        Ok(candidates)
    }

    fn size(info: &FontDisplayInfo) -> f32 {
        if info.mask().contains(FontInfoMask::SYS_SIZE) {
            SYSTEM_FONT_SIZE as f32
        } else {
            info.font_size() as f32
        }
    }

    fn colors(info: &FontDisplayInfo) -> (BltPixel, BltPixel) {
        let mask = info.mask();
        let fg = if mask.contains(FontInfoMask::SYS_FORE_COLOR) {
            BltPixel::WHITE
        } else {
            info.foreground()
        };
        let bg = if mask.contains(FontInfoMask::SYS_BACK_COLOR) {
            BltPixel::BLACK
        } else {
            info.background()
        };
        (fg, bg)
    }

    /// Line box tall enough for every face in `fonts`.
    fn line_metrics(fonts: &[&FontRef<'_>], size: f32) -> LineMetrics {
        let mut ascent = 0.0f32;
        let mut descent = 0.0f32;
        for font in fonts {
            let metrics = font.metrics(Size::new(size), LocationRef::default());
            ascent = ascent.max(metrics.ascent);
            descent = descent.min(metrics.descent);
        }
        LineMetrics {
            ascent,
            line_height: ((ascent - descent).ceil() as u32).max(1),
        }
    }

    fn advance(font: &FontRef<'_>, glyph_id: GlyphId, size: f32) -> f32 {
        font.glyph_metrics(Size::new(size), LocationRef::default())
            .advance_width(glyph_id)
            .unwrap_or(size * 0.5)
    }

    /// First candidate whose charmap covers `ch`.
    fn lookup(candidates: &[Candidate<'_>], ch: char) -> Option<(usize, GlyphId)> {
        candidates.iter().enumerate().find_map(|(idx, candidate)| {
            candidate
                .font
                .charmap()
                .map(ch)
                .filter(|gid| gid.to_u32() != 0)
                .map(|gid| (idx, gid))
        })
    }

    fn hand_out(&self, image: ImageOutput) -> ImageOutput {
        self.outstanding.set(self.outstanding.get() + 1);
        trace!("handing out {}x{} image", image.width, image.height);
        image
    }
}

impl FontService for SoftwareFontService {
    fn string_to_image(
        &self,
        flags: OutputFlags,
        text: &str,
        info: &FontDisplayInfo,
        x: u32,
        y: u32,
    ) -> Result<ImageOutput> {
        if text.is_empty() {
            return Err(Error::InvalidParameter("empty string".into()));
        }

        let candidates = self.candidates(info)?;
        let size = Self::size(info);
        let (max_w, max_h) = self.max_image;
        let wrap_width = max_w.saturating_sub(x) as f32;

        // Layout
        let mut placed = Vec::new();
        let mut pen_x = 0.0f32;
        let mut line = 0u32;
        let mut widest = 0.0f32;
        let mut missing = 0usize;
        for ch in text.chars() {
            if ch == '\r' {
                continue;
            }
            if ch == '\n' {
                if !flags.contains(OutputFlags::IGNORE_LINE_BREAK) {
                    widest = widest.max(pen_x);
                    pen_x = 0.0;
                    line += 1;
                }
                continue;
            }

            let Some((candidate, glyph_id)) = Self::lookup(&candidates, ch) else {
                missing += 1;
                if flags.contains(OutputFlags::IGNORE_IF_NO_GLYPH) {
                    continue;
                }
                warn!("no glyph for U+{:04X}, leaving a blank cell", ch as u32);
                pen_x += size * 0.5;
                continue;
            };
            let advance = Self::advance(&candidates[candidate].font, glyph_id, size);

            if flags.contains(OutputFlags::WRAP) && pen_x > 0.0 && pen_x + advance > wrap_width {
                widest = widest.max(pen_x);
                pen_x = 0.0;
                line += 1;
            }
            placed.push(Placed {
                candidate,
                glyph_id,
                x: pen_x,
                line,
                advance,
            });
            pen_x += advance;
        }
        widest = widest.max(pen_x);

        let mut used = vec![false; candidates.len()];
        for glyph in &placed {
            used[glyph.candidate] = true;
        }
        let mut fonts: Vec<&FontRef<'_>> = candidates
            .iter()
            .zip(&used)
            .filter(|(_, hit)| **hit)
            .map(|(candidate, _)| &candidate.font)
            .collect();
        if fonts.is_empty() {
            fonts.push(&candidates[0].font);
        }
        let metrics = Self::line_metrics(&fonts, size);

        // Saturate so an origin near u32::MAX clips under CLIP and fails otherwise.
        let needed_w = x.saturating_add(widest.ceil() as u32);
        let needed_h = y.saturating_add((line + 1).saturating_mul(metrics.line_height));
        let clip = flags.contains(OutputFlags::CLIP);
        if (needed_w > max_w || needed_h > max_h) && !clip {
            return Err(Error::Rendering(format!(
                "string needs {}x{} pixels, limit is {}x{}",
                needed_w, needed_h, max_w, max_h
            )));
        }
        let width = needed_w.min(max_w);
        let height = needed_h.min(max_h);

        let (fg, bg) = Self::colors(info);
        let base = if flags.contains(OutputFlags::TRANSPARENT) {
            BltPixel::BLACK
        } else {
            bg
        };
        let mut canvas = Canvas::new(width, height, fg, base);

        let line_height = metrics.line_height as f32;
        for glyph in &placed {
            let left = x as f32 + glyph.x;
            let top = y as f32 + glyph.line as f32 * line_height;
            if left >= width as f32 || top >= height as f32 {
                continue;
            }
            if flags.contains(OutputFlags::CLIP_CLEAN_X) && (left + glyph.advance).ceil() > width as f32
            {
                continue;
            }
            if flags.contains(OutputFlags::CLIP_CLEAN_Y) && top + line_height > height as f32 {
                continue;
            }
            canvas.draw_glyph(
                &candidates[glyph.candidate].font,
                glyph.glyph_id,
                size,
                left,
                top + metrics.ascent,
            )?;
        }

        debug!(
            "rendered {} glyph(s) ({} missing) into {}x{}",
            placed.len(),
            missing,
            width,
            height
        );
        Ok(self.hand_out(canvas.into_image()))
    }

    fn get_glyph(&self, ch: char, info: &FontDisplayInfo) -> Result<(ImageOutput, u32)> {
        let candidates = self.candidates(info)?;
        let Some((candidate, glyph_id)) = Self::lookup(&candidates, ch) else {
            return Err(Error::NotFound(format!("no glyph for U+{:04X}", ch as u32)));
        };

        let font = &candidates[candidate].font;
        let size = Self::size(info);
        let metrics = Self::line_metrics(&[font], size);
        let width = (Self::advance(font, glyph_id, size).ceil() as u32).max(1);
        let baseline = metrics.ascent.ceil() as u32;

        let (fg, bg) = Self::colors(info);
        let mut canvas = Canvas::new(width, metrics.line_height, fg, bg);
        canvas.draw_glyph(font, glyph_id, size, 0.0, baseline as f32)?;

        debug!(
            "glyph U+{:04X} from {} -> {}x{}, baseline {}",
            ch as u32,
            candidates[candidate].face.family(),
            width,
            metrics.line_height,
            baseline
        );
        Ok((self.hand_out(canvas.into_image()), baseline))
    }

    fn release_image(&self, image: ImageOutput) {
        self.outstanding.set(self.outstanding.get().saturating_sub(1));
        self.released.set(self.released.get() + 1);
        trace!("released {}x{} image", image.width, image.height);
    }
}

impl Drop for SoftwareFontService {
    fn drop(&mut self) {
        let outstanding = self.outstanding.get();
        if outstanding > 0 {
            warn!("{} rendered image(s) were never released", outstanding);
        }
    }
}

/// BLT pixel canvas with a fixed foreground/background pair.
struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<BltPixel>,
    fg: BltPixel,
    bg: BltPixel,
}

impl Canvas {
    fn new(width: u32, height: u32, fg: BltPixel, bg: BltPixel) -> Self {
        Self {
            width,
            height,
            pixels: vec![bg; width as usize * height as usize],
            fg,
            bg,
        }
    }

    /// Rasterize one glyph with its origin at (x, baseline_y).
    fn draw_glyph(
        &mut self,
        font: &FontRef<'_>,
        glyph_id: GlyphId,
        size: f32,
        x: f32,
        baseline_y: f32,
    ) -> Result<()> {
        let Some(outline) = font.outline_glyphs().get(glyph_id) else {
            return Ok(());
        };

        let mut commands = Vec::new();
        let mut pen = ZenoPen::new(&mut commands);
        let settings = DrawSettings::unhinted(Size::new(size), LocationRef::default());
        outline.draw(settings, &mut pen).map_err(|e| {
            Error::Rendering(format!("Failed to draw outline of glyph {}: {}", glyph_id, e))
        })?;
        if commands.is_empty() {
            return Ok(());
        }

        let mut mask = Mask::new(&commands[..]);
        mask.transform(Some(Transform::translation(x, baseline_y)));
        let (alpha, placement) = mask.render();

        for my in 0..placement.height {
            let py = placement.top + my as i32;
            if py < 0 || py >= self.height as i32 {
                continue;
            }
            for mx in 0..placement.width {
                let px = placement.left + mx as i32;
                if px < 0 || px >= self.width as i32 {
                    continue;
                }
                let a = alpha[(my * placement.width + mx) as usize];
                if a > 0 {
                    self.blend(px as u32, py as u32, a);
                }
            }
        }
        Ok(())
    }

    /// Mix foreground into the pixel by `alpha` coverage.
    fn blend(&mut self, x: u32, y: u32, alpha: u8) {
        let idx = (y * self.width + x) as usize;
        let dst = self.pixels[idx];
        let mix = |f: u8, d: u8| -> u8 {
            let a = alpha as u16;
            ((f as u16 * a + d as u16 * (255 - a)) / 255) as u8
        };
        self.pixels[idx] = BltPixel {
            blue: mix(self.fg.blue, dst.blue),
            green: mix(self.fg.green, dst.green),
            red: mix(self.fg.red, dst.red),
            reserved: self.bg.reserved,
        };
    }

    fn into_image(self) -> ImageOutput {
        ImageOutput {
            width: self.width,
            height: self.height,
            bitmap: Some(self.pixels),
        }
    }
}

/// Adapter from skrifa's OutlinePen to zeno commands, flipping Y so the
/// outline's baseline sits at y = 0 with ascenders going up.
struct ZenoPen<'a> {
    commands: &'a mut Vec<Command>,
}

impl<'a> ZenoPen<'a> {
    fn new(commands: &'a mut Vec<Command>) -> Self {
        Self { commands }
    }
}

impl OutlinePen for ZenoPen<'_> {
    fn move_to(&mut self, x: f32, y: f32) {
        self.commands.push(Command::MoveTo([x, -y].into()));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.commands.push(Command::LineTo([x, -y].into()));
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        self.commands
            .push(Command::QuadTo([cx0, -cy0].into(), [x, -y].into()));
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        self.commands.push(Command::CurveTo(
            [cx0, -cy0].into(),
            [cx1, -cy1].into(),
            [x, -y].into(),
        ));
    }

    fn close(&mut self) {
        self.commands.push(Command::Close);
    }
}
