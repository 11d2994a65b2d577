// this_file: src/report.rs
//! Result aggregation and the final console summary.

use crate::capability::{Capabilities, CapabilityStatus};
use crate::error::Result;
use crate::render::RenderCheck;
use serde::Serialize;
use std::fmt;
use std::io::Write;

/// Overall outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    pub fn is_pass(self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

/// Why a run failed. Declared in reporting priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum FailureReason {
    /// The font rendering service is not present
    NoFontService,
    /// The font display info could not be allocated
    OutOfResources,
    /// The service exists but nothing visible was drawn
    GlyphsNotAvailable,
}

impl FailureReason {
    /// Stable identifier for scripts.
    pub fn code(self) -> &'static str {
        match self {
            FailureReason::NoFontService => "NoFontService",
            FailureReason::OutOfResources => "OutOfResources",
            FailureReason::GlyphsNotAvailable => "GlyphsNotAvailable",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FailureReason::NoFontService => "HII Font Protocol not available",
            FailureReason::OutOfResources => "out of resources building font display info",
            FailureReason::GlyphsNotAvailable => "CJK glyphs not available in font database",
        };
        f.write_str(text)
    }
}

/// Everything one run found out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestReport {
    pub capabilities: Capabilities,
    pub string_render: RenderCheck,
    pub glyph_render: RenderCheck,
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,
}

/// Combine probe and render results into a report.
///
/// Passes iff the font service is present and at least one render showed
/// visible pixels. Service presence alone proves nothing: a database without
/// CJK ranges still advertises the protocol.
pub fn aggregate(
    capabilities: Capabilities,
    string_render: RenderCheck,
    glyph_render: RenderCheck,
) -> TestReport {
    let font_present = capabilities.font.is_present();
    let any_visible = string_render.is_visible() || glyph_render.is_visible();

    let (verdict, reason) = match (font_present, any_visible) {
        (false, _) => (Verdict::Fail, Some(FailureReason::NoFontService)),
        (true, true) => (Verdict::Pass, None),
        (true, false) => (Verdict::Fail, Some(FailureReason::GlyphsNotAvailable)),
    };

    TestReport {
        capabilities,
        string_render,
        glyph_render,
        verdict,
        reason,
    }
}

impl TestReport {
    /// Report for a run that stopped before rendering.
    pub fn aborted(capabilities: Capabilities, reason: FailureReason) -> Self {
        let mut report = aggregate(capabilities, RenderCheck::Skipped, RenderCheck::Skipped);
        report.reason = Some(report.reason.map_or(reason, |r| r.min(reason)));
        report.verdict = Verdict::Fail;
        report
    }

    pub fn passed(&self) -> bool {
        self.verdict.is_pass()
    }

    /// True when either render showed pixels.
    pub fn rendering_supported(&self) -> bool {
        self.string_render.is_visible() || self.glyph_render.is_visible()
    }

    /// Write the summary block.
    pub fn write_summary<W: Write>(&self, out: &mut W) -> Result<()> {
        let caps = &self.capabilities;
        writeln!(out)?;
        writeln!(out, "=== Test Summary ===")?;
        writeln!(out, "HII Font Protocol: {}", caps.font.as_found())?;
        writeln!(out, "HII Database Protocol: {}", caps.database.as_found())?;
        match caps.graphics {
            CapabilityStatus::Present => writeln!(out, "Graphics Output Protocol: FOUND")?,
            CapabilityStatus::Absent => {
                writeln!(out, "Graphics Output Protocol: NOT FOUND (text-mode assumed)")?
            }
            CapabilityStatus::NotProbed => writeln!(out, "Graphics Output Protocol: NOT PROBED")?,
        }
        writeln!(out, "String Rendering: {}", self.string_render.as_supported())?;
        writeln!(out, "Glyph Rendering: {}", self.glyph_render.as_supported())?;
        writeln!(
            out,
            "Chinese Character Rendering: {}",
            if self.rendering_supported() {
                "SUPPORTED"
            } else {
                "NOT SUPPORTED"
            }
        )?;

        writeln!(out)?;
        match self.verdict {
            Verdict::Pass => writeln!(
                out,
                "[RESULT] PASS: your firmware supports Chinese character display."
            )?,
            Verdict::Fail => writeln!(
                out,
                "[RESULT] FAIL: your firmware does NOT support Chinese character display."
            )?,
        }
        if let Some(reason) = self.reason {
            writeln!(out, "  Reason: {} ({})", reason, reason.code())?;
        }
        Ok(())
    }

    /// Serialize as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
