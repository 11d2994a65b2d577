// this_file: src/software/mod.rs

//! Software platform for running the probe on a development machine.
//!
//! Font files stand in for the firmware font database, a CPU rasterizer for
//! the font protocol, and a PNG directory for the graphics output. Any
//! service can be switched off to rehearse the degraded paths.

pub mod fonts;
pub mod rasterize;
pub mod surface;

use crate::error::{Error, Result};
use crate::platform::{not_found, FontDatabase, Platform, ServiceHandle, ServiceId};
use fonts::FontStore;
use log::{debug, info};
use rasterize::{SoftwareFontService, DEFAULT_MAX_IMAGE};
use std::cell::Cell;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use surface::PngSurface;

pub use rasterize::SYSTEM_FONT_SIZE;

/// Builder for [`SoftwarePlatform`].
#[derive(Debug, Default)]
pub struct SoftwarePlatformBuilder {
    fonts: Vec<PathBuf>,
    surface: Option<PathBuf>,
    disabled: HashSet<ServiceId>,
    max_image: Option<(u32, u32)>,
    pool_limit: Option<usize>,
    stall: bool,
}

impl SoftwarePlatformBuilder {
    /// Add a font file (TTF, OTF or TTC).
    pub fn font(mut self, path: impl Into<PathBuf>) -> Self {
        self.fonts.push(path.into());
        self
    }

    pub fn fonts<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.fonts.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Enable the graphics surface, writing PNGs into `dir`.
    pub fn surface(mut self, dir: impl Into<PathBuf>) -> Self {
        self.surface = Some(dir.into());
        self
    }

    /// Pretend `id` is not installed.
    pub fn disable(mut self, id: ServiceId) -> Self {
        self.disabled.insert(id);
        self
    }

    /// Bound rendered images (and the surface resolution).
    pub fn max_image(mut self, width: u32, height: u32) -> Self {
        self.max_image = Some((width, height));
        self
    }

    /// Cap the pool allocator at `bytes`.
    pub fn pool_limit(mut self, bytes: usize) -> Self {
        self.pool_limit = Some(bytes);
        self
    }

    /// Actually sleep in [`Platform::stall`]. Off by default.
    pub fn stall(mut self, enabled: bool) -> Self {
        self.stall = enabled;
        self
    }

    pub fn build(self) -> Result<SoftwarePlatform> {
        let mut store = FontStore::new();
        for path in &self.fonts {
            store.load(path)?;
        }

        let (width, height) = self.max_image.unwrap_or(DEFAULT_MAX_IMAGE);
        let fonts = SoftwareFontService::new(store).with_max_image(width, height);

        let surface = match self.surface {
            Some(dir) => Some(PngSurface::new(dir, (width, height))?),
            None => None,
        };

        info!(
            "software platform: {} face(s), surface {}, disabled {:?}",
            fonts.store().faces().len(),
            surface
                .as_ref()
                .map(|s| s.dir().display().to_string())
                .unwrap_or_else(|| "none".into()),
            self.disabled
        );

        Ok(SoftwarePlatform {
            fonts,
            surface,
            disabled: self.disabled,
            pool_limit: self.pool_limit,
            pool_used: Cell::new(0),
            stall: self.stall,
        })
    }
}

/// [`Platform`] backed by local font files.
#[derive(Debug)]
pub struct SoftwarePlatform {
    fonts: SoftwareFontService,
    surface: Option<PngSurface>,
    disabled: HashSet<ServiceId>,
    pool_limit: Option<usize>,
    pool_used: Cell<usize>,
    stall: bool,
}

impl SoftwarePlatform {
    pub fn builder() -> SoftwarePlatformBuilder {
        SoftwarePlatformBuilder::default()
    }

    pub fn font_service(&self) -> &SoftwareFontService {
        &self.fonts
    }

    /// Pool bytes currently allocated.
    pub fn pool_in_use(&self) -> usize {
        self.pool_used.get()
    }

    fn enabled(&self, id: ServiceId) -> bool {
        !self.disabled.contains(&id)
    }
}

impl FontDatabase for SoftwarePlatform {
    fn font_families(&self) -> Vec<String> {
        self.fonts.store().families()
    }
}

impl Platform for SoftwarePlatform {
    fn locate_service(&self, id: ServiceId) -> Result<ServiceHandle<'_>> {
        if !self.enabled(id) {
            return Err(not_found(id));
        }
        match id {
            ServiceId::Font if !self.fonts.store().is_empty() => Ok(ServiceHandle::Font(&self.fonts)),
            ServiceId::Font => Err(Error::NotFound("no fonts loaded".into())),
            ServiceId::Database => Ok(ServiceHandle::Database(self)),
            ServiceId::Graphics => match &self.surface {
                Some(surface) => Ok(ServiceHandle::Graphics(surface)),
                None => Err(not_found(id)),
            },
        }
    }

    fn allocate_pool(&self, bytes: usize) -> Result<()> {
        let used = self.pool_used.get();
        if let Some(limit) = self.pool_limit {
            if used + bytes > limit {
                return Err(Error::OutOfResources(format!(
                    "pool request of {} bytes exceeds limit ({} of {} in use)",
                    bytes, used, limit
                )));
            }
        }
        self.pool_used.set(used + bytes);
        debug!("pool: +{} bytes, {} in use", bytes, used + bytes);
        Ok(())
    }

    fn free_pool(&self, bytes: usize) {
        let used = self.pool_used.get().saturating_sub(bytes);
        self.pool_used.set(used);
        debug!("pool: -{} bytes, {} in use", bytes, used);
    }

    fn stall(&self, duration: Duration) {
        if self.stall && !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}
