// this_file: src/probe.rs
//! The verification pipeline.
//!
//! Runs strictly in order: probe font service, probe database, probe graphics,
//! show the test string, build the display info, render the string, render
//! the single test character, aggregate. A missing font service or a failed
//! display-info allocation ends the run early; everything else degrades into
//! the report.

use crate::capability::{probe, Capabilities};
use crate::config::ProbeConfig;
use crate::error::{Error, Result};
use crate::font_info::FontDisplayInfo;
use crate::logging::StageTimer;
use crate::platform::{GraphicsSurface, Platform, ServiceHandle, ServiceId};
use crate::render::{GlyphRenderer, RenderCheck, RenderedImage};
use crate::report::{aggregate, FailureReason, TestReport};
use log::{debug, info, warn};
use std::io::Write;

/// One probe run against one platform.
pub struct DisplayProbe<'p, P: Platform + ?Sized> {
    platform: &'p P,
    config: &'p ProbeConfig,
}

impl<'p, P: Platform + ?Sized> DisplayProbe<'p, P> {
    pub fn new(platform: &'p P, config: &'p ProbeConfig) -> Self {
        Self { platform, config }
    }

    /// Run every check, write the console report to `out`, and pause.
    ///
    /// Check failures end up in the returned report; only console write
    /// errors are returned as `Err`.
    pub fn run<W: Write>(&self, out: &mut W) -> Result<TestReport> {
        writeln!(out)?;
        writeln!(out, "=== Chinese Display Support Test ===")?;
        writeln!(
            out,
            "This application tests whether the firmware supports Chinese character display."
        )?;
        writeln!(out)?;

        let report = self.run_checks(out)?;
        report.write_summary(out)?;

        if report.string_render != RenderCheck::Skipped {
            writeln!(out)?;
            writeln!(
                out,
                "The test string displayed above was: \"{}\"",
                self.config.test_string
            )?;
            writeln!(
                out,
                "Visually inspect the output to confirm Chinese character rendering."
            )?;
        }

        info!(
            "probe finished: {:?}{}",
            report.verdict,
            report
                .reason
                .map(|r| format!(" ({})", r.code()))
                .unwrap_or_default()
        );

        writeln!(out)?;
        writeln!(out, "Test completed.")?;
        out.flush()?;
        self.platform.stall(self.config.pause());
        Ok(report)
    }

    fn run_checks<W: Write>(&self, out: &mut W) -> Result<TestReport> {
        let font = {
            let _t = StageTimer::start("probe-font");
            probe(self.platform, ServiceId::Font)
        };
        let font_service = match font.handle() {
            Some(ServiceHandle::Font(service)) => {
                writeln!(out, "[PASS] {} found.", ServiceId::Font)?;
                service
            }
            _ => {
                writeln!(
                    out,
                    "[FAIL] {} not found. Chinese display not supported.",
                    ServiceId::Font
                )?;
                writeln!(out, "Status: {}", font.status_name())?;
                return Ok(TestReport::aborted(
                    Capabilities::font_absent(),
                    FailureReason::NoFontService,
                ));
            }
        };

        let database = {
            let _t = StageTimer::start("probe-database");
            probe(self.platform, ServiceId::Database)
        };
        match database.handle() {
            Some(ServiceHandle::Database(db)) => {
                writeln!(out, "[PASS] {} found.", ServiceId::Database)?;
                let families = db.font_families();
                info!("font database lists {} families: {:?}", families.len(), families);
            }
            _ => {
                writeln!(out, "[WARN] {} not found.", ServiceId::Database)?;
                writeln!(out, "Status: {}", database.status_name())?;
            }
        }

        let graphics = {
            let _t = StageTimer::start("probe-graphics");
            probe(self.platform, ServiceId::Graphics)
        };
        let surface = match graphics.handle() {
            Some(ServiceHandle::Graphics(surface)) => {
                match surface.resolution() {
                    Some((w, h)) => {
                        writeln!(out, "[PASS] {} found ({}x{}).", ServiceId::Graphics, w, h)?
                    }
                    None => writeln!(out, "[PASS] {} found.", ServiceId::Graphics)?,
                }
                Some(surface)
            }
            _ => {
                writeln!(
                    out,
                    "[WARN] {} not found. Testing in text mode.",
                    ServiceId::Graphics
                )?;
                None
            }
        };

        let capabilities = Capabilities {
            font: font.status(),
            database: database.status(),
            graphics: graphics.status(),
        };

        writeln!(out)?;
        writeln!(out, "Displaying test string:")?;
        writeln!(out, "{}", self.config.test_string)?;
        writeln!(out)?;
        writeln!(
            out,
            "If you see Chinese characters correctly displayed above, your firmware supports Chinese."
        )?;
        writeln!(
            out,
            "If you see boxes, question marks, or garbage characters, Chinese is not supported."
        )?;
        writeln!(out)?;

        let (info, _pool) = match self.build_display_info() {
            Ok(built) => built,
            Err(e) if e.is_fatal() => {
                warn!("aborting run: {}", e);
                writeln!(out, "[FAIL] Failed to allocate memory for font display info.")?;
                writeln!(out, "Status: {}", e.status())?;
                return Ok(TestReport::aborted(capabilities, FailureReason::OutOfResources));
            }
            Err(e) => return Err(e),
        };

        let renderer = GlyphRenderer::new(font_service, &info);
        let string_render = self.check_string(out, &renderer, surface)?;

        writeln!(out)?;
        writeln!(out, "Testing individual Chinese character rendering:")?;
        let glyph_render = self.check_glyph(out, &renderer, surface)?;

        Ok(aggregate(capabilities, string_render, glyph_render))
    }

    /// Reserve host memory and build the display info. Any failure here is
    /// an allocation failure and ends the run; a reservation made before the
    /// failure is returned to the host when the guard drops.
    fn build_display_info(&self) -> Result<(FontDisplayInfo, PoolReservation<'p, P>)> {
        let _t = StageTimer::start("build-display-info");
        let config = self.config;
        let bytes = FontDisplayInfo::pool_size(&config.font_name);
        self.platform.allocate_pool(bytes).map_err(|e| match e {
            Error::OutOfResources(_) => e,
            other => Error::OutOfResources(other.to_string()),
        })?;
        let reservation = PoolReservation {
            platform: self.platform,
            bytes,
        };
        debug!("allocated {} bytes for font display info", bytes);

        let info = FontDisplayInfo::try_new(
            &config.font_name,
            config.font_size,
            config.font_style,
            config.foreground,
            config.background,
            config.font_info_mask,
        )?;
        Ok((info, reservation))
    }

    fn check_string<W: Write>(
        &self,
        out: &mut W,
        renderer: &GlyphRenderer<'_>,
        surface: Option<&dyn GraphicsSurface>,
    ) -> Result<RenderCheck> {
        let _t = StageTimer::start("render-string");
        let rendered = renderer.render_text(
            &self.config.test_string,
            self.config.origin,
            self.config.output_flags,
        );
        let image = match rendered {
            Ok(image) => image,
            Err(e) => {
                writeln!(out, "[INFO] StringToImage failed with status: {}", e.status())?;
                writeln!(out, "This may indicate limited Chinese character support.")?;
                return Ok(RenderCheck::failed(&e));
            }
        };

        writeln!(
            out,
            "[INFO] StringToImage succeeded ({}x{}).",
            image.width(),
            image.height()
        )?;
        present(surface, "string", &image);
        let check = RenderCheck::from_image(image, None);
        if check.is_visible() {
            writeln!(
                out,
                "Rendered image has {} non-zero pixels - Chinese display confirmed!",
                check.non_background()
            )?;
        } else {
            writeln!(
                out,
                "Rendered image has no non-zero pixels - string not drawn."
            )?;
        }
        Ok(check)
    }

    fn check_glyph<W: Write>(
        &self,
        out: &mut W,
        renderer: &GlyphRenderer<'_>,
        surface: Option<&dyn GraphicsSurface>,
    ) -> Result<RenderCheck> {
        let _t = StageTimer::start("render-glyph");
        let ch = self.config.test_char;
        let (image, baseline) = match renderer.render_glyph(ch) {
            Ok(rendered) => rendered,
            Err(e) => {
                writeln!(out, "GetGlyph for '{}': [FAIL] Status: {}", ch, e.status())?;
                return Ok(RenderCheck::failed(&e));
            }
        };

        writeln!(out, "GetGlyph for '{}': [PASS] baseline {}", ch, baseline)?;
        present(surface, "glyph", &image);
        let check = RenderCheck::from_image(image, Some(baseline));
        if check.is_visible() {
            writeln!(
                out,
                "  Glyph has {} non-zero pixels - Chinese character rendering confirmed!",
                check.non_background()
            )?;
        } else {
            writeln!(
                out,
                "  Glyph has no non-zero pixels - character not rendered properly"
            )?;
        }
        Ok(check)
    }
}

/// Host pool memory backing the display info, freed on drop.
struct PoolReservation<'p, P: Platform + ?Sized> {
    platform: &'p P,
    bytes: usize,
}

impl<P: Platform + ?Sized> Drop for PoolReservation<'_, P> {
    fn drop(&mut self) {
        debug!("freeing {} bytes of font display info", self.bytes);
        self.platform.free_pool(self.bytes);
    }
}

/// Show a render on the graphics surface. Never affects the verdict.
fn present(surface: Option<&dyn GraphicsSurface>, label: &str, image: &RenderedImage<'_>) {
    if let Some(surface) = surface {
        if let Err(e) = surface.blit(label, image.image()) {
            warn!("could not present {} render: {}", label, e);
        }
    }
}

/// Run the probe with `config` against `platform`, writing to `out`.
pub fn run_probe<P, W>(platform: &P, config: &ProbeConfig, out: &mut W) -> Result<TestReport>
where
    P: Platform + ?Sized,
    W: Write,
{
    DisplayProbe::new(platform, config).run(out)
}
