// this_file: src/analyze.rs
//! Pixel analysis: did a render actually put anything on screen?
//!
//! The test is deliberately crude. A pixel counts as content when any of its
//! red, green or blue channels is nonzero; the reserved channel is ignored.
//! This is independent of glyph shape, antialiasing and foreground colour,
//! but it cannot tell a glyph from renderer noise, and a glyph drawn in pure
//! black on a black background reads as blank. Latin letters in a mixed
//! string also count, so a string render can be visible without any CJK
//! coverage; the single-character glyph check is the CJK-specific signal.

use crate::font_info::BltPixel;
use crate::platform::ImageOutput;
use serde::Serialize;

/// Outcome of inspecting one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Visibility {
    /// At least one non-background pixel was seen
    pub visible: bool,
    /// Number of non-background pixels (diagnostics only)
    pub non_background: usize,
}

impl Visibility {
    pub const BLANK: Visibility = Visibility {
        visible: false,
        non_background: 0,
    };
}

/// Pixels the image dimensions cover. Null or zero-area images yield nothing.
fn covered_pixels(image: &ImageOutput) -> &[BltPixel] {
    match &image.bitmap {
        Some(bitmap) if image.area() > 0 => &bitmap[..image.area().min(bitmap.len())],
        _ => &[],
    }
}

/// True when the image has at least one non-background pixel.
///
/// `None`, a missing buffer, or zero width/height are all `false` without
/// scanning. Stops at the first hit.
pub fn has_visible_content(image: Option<&ImageOutput>) -> bool {
    match image {
        Some(image) if !image.is_void() => covered_pixels(image)
            .iter()
            .any(BltPixel::is_non_background),
        _ => false,
    }
}

/// Count of non-background pixels in row-major order.
pub fn non_background_pixels(image: &ImageOutput) -> usize {
    if image.is_void() {
        return 0;
    }
    covered_pixels(image)
        .iter()
        .filter(|px| px.is_non_background())
        .count()
}

/// Full inspection: verdict plus diagnostic count.
pub fn inspect(image: &ImageOutput) -> Visibility {
    let non_background = non_background_pixels(image);
    Visibility {
        visible: non_background > 0,
        non_background,
    }
}

/// Tight bounding box (x, y, w, h) of non-background pixels, if any.
pub fn content_bbox(image: &ImageOutput) -> Option<(u32, u32, u32, u32)> {
    if image.is_void() {
        return None;
    }

    let mut min_x = image.width;
    let mut min_y = image.height;
    let mut max_x = 0u32;
    let mut max_y = 0u32;

    for y in 0..image.height {
        for x in 0..image.width {
            if image.pixel(x, y).is_some_and(BltPixel::is_non_background) {
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
            }
        }
    }

    if min_x > max_x {
        return None;
    }
    Some((min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
}
