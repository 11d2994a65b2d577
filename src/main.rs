// this_file: src/main.rs
//! cjkprobe CLI - CJK display support check

use anyhow::{Context, Result};
use cjkprobe::analyze;
use cjkprobe::software::surface::from_rgba;
use cjkprobe::{logging, run_probe, ProbeConfig, ServiceId, SoftwarePlatform};
use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// cjkprobe - does this platform draw Chinese characters?
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Set log level (error, warn, info, debug, trace)
    #[arg(short = 'l', long, global = true, default_value = "warn")]
    log_level: String,

    /// Enable quiet mode (only errors)
    #[arg(short = 'q', long, global = true, conflicts_with = "log_level")]
    quiet: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the display check on the software platform
    Run {
        /// Font file to install (TTF, OTF or TTC); repeatable
        #[arg(short, long = "font", value_name = "PATH")]
        fonts: Vec<PathBuf>,

        /// Enable the graphics surface, writing renders as PNG into DIR
        #[arg(short, long, value_name = "DIR")]
        surface: Option<PathBuf>,

        /// Simulate an absent service; repeatable
        #[arg(long, value_enum, value_name = "SERVICE")]
        disable: Vec<Service>,

        /// JSON probe config; flags below override it
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// String to render
        #[arg(long)]
        text: Option<String>,

        /// Single character to render
        #[arg(long = "char")]
        test_char: Option<char>,

        /// Font size in pixels
        #[arg(long)]
        size: Option<u16>,

        /// Pause after the report, in milliseconds
        #[arg(long)]
        pause_ms: Option<u64>,

        /// Print the report as JSON after the console output
        #[arg(long)]
        json: bool,

        /// Exit 0 even when the check fails
        #[arg(long)]
        always_succeed: bool,
    },

    /// Check an image file for visible pixels
    Analyze {
        /// Image to inspect (PNG, JPEG)
        image: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Clone, Copy, ValueEnum)]
enum Service {
    Font,
    Database,
    Graphics,
}

impl From<Service> for ServiceId {
    fn from(service: Service) -> Self {
        match service {
            Service::Font => ServiceId::Font,
            Service::Database => ServiceId::Database,
            Service::Graphics => ServiceId::Graphics,
        }
    }
}

struct RunArgs {
    fonts: Vec<PathBuf>,
    surface: Option<PathBuf>,
    disable: Vec<Service>,
    config: Option<PathBuf>,
    text: Option<String>,
    test_char: Option<char>,
    size: Option<u16>,
    pause_ms: Option<u64>,
    json: bool,
    always_succeed: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let log_level = if cli.quiet { "error".to_string() } else { cli.log_level.clone() };
    logging::init_logging(&log_level, cli.quiet, true);

    match cli.command {
        Commands::Run {
            fonts,
            surface,
            disable,
            config,
            text,
            test_char,
            size,
            pause_ms,
            json,
            always_succeed,
        } => run(RunArgs {
            fonts,
            surface,
            disable,
            config,
            text,
            test_char,
            size,
            pause_ms,
            json,
            always_succeed,
        }),
        Commands::Analyze { image } => analyze_image(&image),
        Commands::Version => {
            println!("cjkprobe version {}", cjkprobe::VERSION);
            println!("CJK display support check");
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Build the probe config from the optional file plus flag overrides.
fn load_config(args: &RunArgs) -> Result<ProbeConfig> {
    let mut config = match &args.config {
        Some(path) => ProbeConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ProbeConfig::default(),
    };
    if let Some(text) = &args.text {
        config.test_string = text.clone();
    }
    if let Some(ch) = args.test_char {
        config.test_char = ch;
    }
    if let Some(size) = args.size {
        config.font_size = size;
    }
    if let Some(pause_ms) = args.pause_ms {
        config.pause_ms = pause_ms;
    }
    config.validate().context("invalid probe config")?;
    Ok(config)
}

fn run(args: RunArgs) -> Result<ExitCode> {
    let config = load_config(&args)?;

    let mut builder = SoftwarePlatform::builder().fonts(args.fonts.iter().cloned()).stall(true);
    if let Some(dir) = &args.surface {
        builder = builder.surface(dir);
    }
    for service in &args.disable {
        builder = builder.disable((*service).into());
    }
    let platform = match builder.build() {
        Ok(platform) => platform,
        Err(e) => {
            error!("Failed to set up software platform: {}", e);
            return Err(e.into());
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let report = run_probe(&platform, &config, &mut out)?;
    if args.json {
        writeln!(out, "{}", report.to_json()?)?;
    }

    if report.passed() || args.always_succeed {
        Ok(ExitCode::SUCCESS)
    } else {
        info!("exiting with failure status");
        Ok(ExitCode::FAILURE)
    }
}

fn analyze_image(path: &Path) -> Result<ExitCode> {
    let decoded = image::open(path)
        .with_context(|| format!("opening image {}", path.display()))?
        .to_rgba8();
    let image = from_rgba(&decoded);
    let visibility = analyze::inspect(&image);

    println!("{}: {}x{}", path.display(), image.width, image.height);
    println!("Non-zero pixels: {}", visibility.non_background);
    if let Some((x, y, w, h)) = analyze::content_bbox(&image) {
        println!("Content box: {}x{} at ({}, {})", w, h, x, y);
    }

    if visibility.visible {
        println!("[PASS] Image has visible content.");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("[FAIL] Image is blank.");
        Ok(ExitCode::FAILURE)
    }
}
