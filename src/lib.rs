// this_file: src/lib.rs
//! cjkprobe - checks whether a platform can display CJK text
//!
//! The probe looks for a font rendering service, a font database and a
//! graphics surface, then renders a mixed Latin/CJK string and a single CJK
//! character and inspects the bitmaps for visible pixels. The result is a
//! PASS/FAIL verdict with a reason.
//!
//! Platforms are pluggable (see [`platform::Platform`]); [`software`] provides
//! one backed by local font files.

pub mod analyze;
pub mod capability;
pub mod config;
pub mod error;
pub mod font_info;
pub mod logging;
pub mod platform;
pub mod probe;
pub mod render;
pub mod report;
pub mod software;

// Re-export commonly used types
pub use config::ProbeConfig;
pub use error::{Error, Result};
pub use platform::{Platform, ServiceId};
pub use probe::{run_probe, DisplayProbe};
pub use report::{FailureReason, TestReport, Verdict};
pub use software::SoftwarePlatform;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
