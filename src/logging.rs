// this_file: src/logging.rs
//! Logging setup for the probe binary.
//!
//! Logs go to stderr so the console report on stdout stays clean.

use env_logger::{Builder, Target};
use log::{Level, LevelFilter};
use std::io::Write;
use std::time::Instant;

/// Default log level for debug builds
#[cfg(debug_assertions)]
pub fn default_level() -> &'static str {
    "debug"
}

/// Default log level for release builds
#[cfg(not(debug_assertions))]
pub fn default_level() -> &'static str {
    "warn"
}

/// Map a level name onto a filter, falling back to `Warn` for unknown names.
pub fn parse_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" | "warning" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        "off" => LevelFilter::Off,
        _ => {
            eprintln!("Invalid log level '{}', using 'warn'", level);
            LevelFilter::Warn
        }
    }
}

/// Initialize the stderr logger with a coloured level column.
pub fn init_logging(level: &str, quiet: bool, timestamps: bool) {
    let level_filter = if quiet {
        LevelFilter::Error
    } else {
        parse_level(level)
    };

    let mut builder = Builder::new();
    builder.filter_level(level_filter).target(Target::Stderr);

    builder.format(move |buf, record| {
        let level_style = match record.level() {
            Level::Error => "\x1b[31m",
            Level::Warn => "\x1b[33m",
            Level::Info => "\x1b[32m",
            Level::Debug => "\x1b[34m",
            Level::Trace => "\x1b[35m",
        };
        let reset = "\x1b[0m";

        if timestamps {
            writeln!(
                buf,
                "{} {}{:5}{} [{}] {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                level_style,
                record.level(),
                reset,
                record.target(),
                record.args()
            )
        } else {
            writeln!(
                buf,
                "{}{:5}{} [{}] {}",
                level_style,
                record.level(),
                reset,
                record.target(),
                record.args()
            )
        }
    });

    if let Ok(rust_log) = std::env::var("RUST_LOG") {
        builder.parse_filters(&rust_log);
    }

    // A second init (tests, embedding) keeps the first logger.
    let _ = builder.try_init();
}

/// Logs how long one pipeline stage took when dropped.
pub struct StageTimer {
    stage: &'static str,
    start: Instant,
}

impl StageTimer {
    /// Start timing `stage`
    pub fn start(stage: &'static str) -> Self {
        log::trace!("stage {} started", stage);
        Self {
            stage,
            start: Instant::now(),
        }
    }

    /// Name of the timed stage
    pub fn stage(&self) -> &'static str {
        self.stage
    }
}

impl Drop for StageTimer {
    fn drop(&mut self) {
        log::debug!(
            "stage {} finished in {:.3}ms",
            self.stage,
            self.start.elapsed().as_secs_f64() * 1000.0
        );
    }
}
