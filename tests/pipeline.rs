// this_file: tests/pipeline.rs
//! End-to-end pipeline tests against a scripted platform

use cjkprobe::capability::CapabilityStatus;
use cjkprobe::font_info::{BltPixel, FontDisplayInfo};
use cjkprobe::platform::{
    not_found, FontDatabase, FontService, GraphicsSurface, ImageOutput, OutputFlags, Platform,
    ServiceHandle, ServiceId,
};
use cjkprobe::render::RenderCheck;
use cjkprobe::{run_probe, Error, FailureReason, ProbeConfig, Result, Verdict};
use std::cell::{Cell, RefCell};
use std::time::Duration;

/// What a scripted render call returns.
#[derive(Clone, Copy)]
enum Script {
    Visible,
    Blank,
    NullBuffer,
    Refuse,
}

impl Script {
    fn image(self, width: u32, height: u32) -> Result<ImageOutput> {
        match self {
            Script::Visible => {
                let mut image = ImageOutput::filled(width, height, BltPixel::BLACK);
                if let Some(bitmap) = image.bitmap.as_mut() {
                    bitmap[0] = BltPixel::WHITE;
                    bitmap[1] = BltPixel::rgb(0, 0, 1);
                }
                Ok(image)
            }
            Script::Blank => Ok(ImageOutput::filled(width, height, BltPixel::BLACK)),
            Script::NullBuffer => Ok(ImageOutput {
                width,
                height,
                bitmap: None,
            }),
            Script::Refuse => Err(Error::NotFound("no glyph".into())),
        }
    }
}

struct ScriptedFont {
    string: Script,
    glyph: Script,
    string_calls: Cell<usize>,
    glyph_calls: Cell<usize>,
    handed_out: Cell<usize>,
    released: Cell<usize>,
}

impl ScriptedFont {
    fn new(string: Script, glyph: Script) -> Self {
        Self {
            string,
            glyph,
            string_calls: Cell::new(0),
            glyph_calls: Cell::new(0),
            handed_out: Cell::new(0),
            released: Cell::new(0),
        }
    }

    fn hand_out(&self, result: Result<ImageOutput>) -> Result<ImageOutput> {
        if result.is_ok() {
            self.handed_out.set(self.handed_out.get() + 1);
        }
        result
    }
}

impl FontService for ScriptedFont {
    fn string_to_image(
        &self,
        _flags: OutputFlags,
        _text: &str,
        _info: &FontDisplayInfo,
        _x: u32,
        _y: u32,
    ) -> Result<ImageOutput> {
        self.string_calls.set(self.string_calls.get() + 1);
        self.hand_out(self.string.image(64, 16))
    }

    fn get_glyph(&self, _ch: char, _info: &FontDisplayInfo) -> Result<(ImageOutput, u32)> {
        self.glyph_calls.set(self.glyph_calls.get() + 1);
        Ok((self.hand_out(self.glyph.image(16, 16))?, 13))
    }

    fn release_image(&self, _image: ImageOutput) {
        self.released.set(self.released.get() + 1);
    }
}

struct Catalog;

impl FontDatabase for Catalog {
    fn font_families(&self) -> Vec<String> {
        vec!["Unifont".into()]
    }
}

#[derive(Default)]
struct Screen {
    blits: RefCell<Vec<String>>,
}

impl GraphicsSurface for Screen {
    fn resolution(&self) -> Option<(u32, u32)> {
        Some((800, 600))
    }

    fn blit(&self, label: &str, _image: &ImageOutput) -> Result<()> {
        self.blits.borrow_mut().push(label.to_string());
        Ok(())
    }
}

struct ScriptedPlatform {
    font: Option<ScriptedFont>,
    database: Option<Catalog>,
    graphics: Option<Screen>,
    pool_exhausted: bool,
    pool_outstanding: Cell<isize>,
    stalled: Cell<Option<Duration>>,
}

impl ScriptedPlatform {
    fn new(font: Option<ScriptedFont>) -> Self {
        Self {
            font,
            database: Some(Catalog),
            graphics: Some(Screen::default()),
            pool_exhausted: false,
            pool_outstanding: Cell::new(0),
            stalled: Cell::new(None),
        }
    }

    fn font(&self) -> &ScriptedFont {
        self.font.as_ref().expect("font service scripted")
    }
}

impl Platform for ScriptedPlatform {
    fn locate_service(&self, id: ServiceId) -> Result<ServiceHandle<'_>> {
        let handle = match id {
            ServiceId::Font => self.font.as_ref().map(|f| ServiceHandle::Font(f)),
            ServiceId::Database => self.database.as_ref().map(|d| ServiceHandle::Database(d)),
            ServiceId::Graphics => self.graphics.as_ref().map(|g| ServiceHandle::Graphics(g)),
        };
        handle.ok_or_else(|| not_found(id))
    }

    fn allocate_pool(&self, bytes: usize) -> Result<()> {
        if self.pool_exhausted {
            return Err(Error::OutOfResources(format!("{} bytes", bytes)));
        }
        self.pool_outstanding.set(self.pool_outstanding.get() + 1);
        Ok(())
    }

    fn free_pool(&self, _bytes: usize) {
        self.pool_outstanding.set(self.pool_outstanding.get() - 1);
    }

    fn stall(&self, duration: Duration) {
        self.stalled.set(Some(duration));
    }
}

fn run(platform: &ScriptedPlatform) -> (cjkprobe::TestReport, String) {
    let config = ProbeConfig::default();
    let mut out = Vec::new();
    let report = run_probe(platform, &config, &mut out).unwrap();
    (report, String::from_utf8(out).unwrap())
}

#[test]
fn test_missing_font_service_fails_without_rendering() {
    let platform = ScriptedPlatform::new(None);
    let (report, console) = run(&platform);

    assert_eq!(report.verdict, Verdict::Fail);
    assert_eq!(report.reason, Some(FailureReason::NoFontService));
    assert_eq!(report.string_render, RenderCheck::Skipped);
    assert_eq!(report.glyph_render, RenderCheck::Skipped);
    assert_eq!(platform.pool_outstanding.get(), 0);

    assert!(console.contains("[FAIL] HII Font Protocol not found. Chinese display not supported."));
    assert!(console.contains("Status: Not Found"));
    assert!(console.contains("HII Font Protocol: NOT FOUND"));
    assert_eq!(report.capabilities.database, CapabilityStatus::NotProbed);
    assert_eq!(report.capabilities.graphics, CapabilityStatus::NotProbed);
    assert!(console.contains("HII Database Protocol: NOT PROBED"));
    assert!(console.contains("Graphics Output Protocol: NOT PROBED"));
    assert!(!console.contains("text-mode assumed"));
    assert!(!console.contains("Displaying test string"));
    assert!(console.contains("Reason: HII Font Protocol not available (NoFontService)"));
    assert!(console.trim_end().ends_with("Test completed."));
    assert_eq!(platform.stalled.get(), Some(Duration::from_secs(2)));
}

#[test]
fn test_text_mode_pass_with_blank_glyph() {
    let mut platform = ScriptedPlatform::new(Some(ScriptedFont::new(
        Script::Visible,
        Script::Blank,
    )));
    platform.graphics = None;
    let (report, console) = run(&platform);

    assert_eq!(report.verdict, Verdict::Pass);
    assert_eq!(report.reason, None);
    assert_eq!(report.capabilities.graphics, CapabilityStatus::Absent);
    assert!(report.string_render.is_visible());
    assert!(!report.glyph_render.is_visible());

    assert!(console.contains("[WARN] Graphics Output Protocol not found. Testing in text mode."));
    assert!(console.contains("Graphics Output Protocol: NOT FOUND (text-mode assumed)"));
    assert!(console.contains("Rendered image has 2 non-zero pixels - Chinese display confirmed!"));
    assert!(console.contains("GetGlyph for '中': [PASS] baseline 13"));
    assert!(console.contains("Glyph has no non-zero pixels"));
    assert!(console.contains("Chinese Character Rendering: SUPPORTED"));
    assert!(console.contains("[RESULT] PASS"));
    assert!(!console.contains("Reason:"));

    let font = platform.font();
    assert_eq!(font.handed_out.get(), 2);
    assert_eq!(font.released.get(), 2);
    assert_eq!(platform.pool_outstanding.get(), 0);
}

#[test]
fn test_blank_renders_mean_glyphs_not_available() {
    let platform = ScriptedPlatform::new(Some(ScriptedFont::new(Script::Blank, Script::Blank)));
    let (report, console) = run(&platform);

    assert_eq!(report.verdict, Verdict::Fail);
    assert_eq!(report.reason, Some(FailureReason::GlyphsNotAvailable));
    assert!(console.contains("HII Font Protocol: FOUND"));
    assert!(console.contains("Chinese Character Rendering: NOT SUPPORTED"));
    assert!(console.contains("Reason: CJK glyphs not available in font database (GlyphsNotAvailable)"));
    assert_eq!(platform.font().released.get(), 2);
}

#[test]
fn test_out_of_resources_aborts_before_rendering() {
    let mut platform = ScriptedPlatform::new(Some(ScriptedFont::new(
        Script::Visible,
        Script::Visible,
    )));
    platform.pool_exhausted = true;
    let (report, console) = run(&platform);

    assert_eq!(report.verdict, Verdict::Fail);
    assert_eq!(report.reason, Some(FailureReason::OutOfResources));
    assert_eq!(report.capabilities.font, CapabilityStatus::Present);
    assert_eq!(report.string_render, RenderCheck::Skipped);

    let font = platform.font();
    assert_eq!(font.string_calls.get(), 0);
    assert_eq!(font.glyph_calls.get(), 0);
    assert_eq!(font.released.get(), 0);

    assert!(console.contains("[FAIL] Failed to allocate memory for font display info."));
    assert!(console.contains("Status: Out of Resources"));
    assert!(!console.contains("The test string displayed above"));
    assert!(console.trim_end().ends_with("Test completed."));
}

#[test]
fn test_failed_string_render_falls_back_to_glyph() {
    let platform = ScriptedPlatform::new(Some(ScriptedFont::new(
        Script::Refuse,
        Script::Visible,
    )));
    let (report, console) = run(&platform);

    assert_eq!(report.verdict, Verdict::Pass);
    assert!(matches!(report.string_render, RenderCheck::Failed { .. }));
    assert!(console.contains("[INFO] StringToImage failed with status: Not Found"));
    assert!(console.contains("Glyph has 2 non-zero pixels"));

    let font = platform.font();
    assert_eq!(font.handed_out.get(), 1);
    assert_eq!(font.released.get(), 1);
}

#[test]
fn test_null_buffers_count_as_blank_and_are_released() {
    let platform = ScriptedPlatform::new(Some(ScriptedFont::new(
        Script::NullBuffer,
        Script::NullBuffer,
    )));
    let (report, _) = run(&platform);

    assert_eq!(report.reason, Some(FailureReason::GlyphsNotAvailable));
    assert_eq!(platform.font().released.get(), 2);
}

#[test]
fn test_glyph_refused_reports_status() {
    let platform = ScriptedPlatform::new(Some(ScriptedFont::new(
        Script::Blank,
        Script::Refuse,
    )));
    let (report, console) = run(&platform);

    assert_eq!(report.verdict, Verdict::Fail);
    assert!(console.contains("GetGlyph for '中': [FAIL] Status: Not Found"));
    assert_eq!(platform.font().released.get(), 1);
}

#[test]
fn test_missing_database_does_not_affect_verdict() {
    let mut platform = ScriptedPlatform::new(Some(ScriptedFont::new(
        Script::Visible,
        Script::Visible,
    )));
    platform.database = None;
    let (report, console) = run(&platform);

    assert_eq!(report.verdict, Verdict::Pass);
    assert_eq!(report.capabilities.database, CapabilityStatus::Absent);
    assert!(console.contains("[WARN] HII Database Protocol not found."));
    assert!(console.contains("HII Database Protocol: NOT FOUND"));
}

#[test]
fn test_renders_are_presented_on_the_surface() {
    let platform = ScriptedPlatform::new(Some(ScriptedFont::new(
        Script::Visible,
        Script::Visible,
    )));
    let (_, console) = run(&platform);

    assert!(console.contains("[PASS] Graphics Output Protocol found (800x600)."));
    let screen = platform.graphics.as_ref().unwrap();
    assert_eq!(*screen.blits.borrow(), vec!["string".to_string(), "glyph".to_string()]);
}

#[test]
fn test_console_order_is_fixed() {
    let platform = ScriptedPlatform::new(Some(ScriptedFont::new(
        Script::Visible,
        Script::Visible,
    )));
    let (_, console) = run(&platform);

    let markers = [
        "HII Font Protocol found",
        "HII Database Protocol found",
        "Graphics Output Protocol found",
        "Hello 你好 World 世界",
        "StringToImage succeeded",
        "GetGlyph for",
        "=== Test Summary ===",
        "[RESULT]",
        "Test completed.",
    ];
    let positions: Vec<usize> = markers
        .iter()
        .map(|m| console.find(m).unwrap_or_else(|| panic!("missing {:?}", m)))
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{:?}", positions);
}
