// this_file: src/software/fonts.rs

//! Font files backing the software font service.
//!
//! Files are memory mapped once; every face inside (TTC collections hold
//! several) becomes a [`LoadedFace`] that can hand out zero-copy `FontRef`s.

use crate::error::{Error, Result};
use log::{debug, info, warn};
use memmap2::Mmap;
use read_fonts::FileRef;
use skrifa::attribute::Style;
use skrifa::string::StringId;
use skrifa::{FontRef, MetadataProvider};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Largest font file accepted (64MB; CJK collections are big)
pub const MAX_FONT_FILE_SIZE: u64 = 64 * 1024 * 1024;

/// One face of a loaded font file.
pub struct LoadedFace {
    data: Arc<Mmap>,
    index: u32,
    path: PathBuf,
    family: String,
    bold: bool,
    italic: bool,
}

impl LoadedFace {
    /// Zero-copy view of this face.
    pub fn font_ref(&self) -> Result<FontRef<'_>> {
        FontRef::from_index(&self.data[..], self.index).map_err(|e| {
            Error::Font(format!(
                "Failed to read face {} of {}: {}",
                self.index,
                self.path.display(),
                e
            ))
        })
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_bold(&self) -> bool {
        self.bold
    }

    pub fn is_italic(&self) -> bool {
        self.italic
    }
}

impl std::fmt::Debug for LoadedFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LoadedFace({} #{} of {})", self.family, self.index, self.path.display())
    }
}

/// All faces available to the software platform.
#[derive(Debug, Default)]
pub struct FontStore {
    faces: Vec<LoadedFace>,
}

impl FontStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a font file and register every face it contains.
    ///
    /// Returns the number of faces added.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            Error::Font(format!("Failed to open font file {}: {}", path.display(), e))
        })?;
        let size = file.metadata()?.len();
        if size == 0 {
            return Err(Error::Font(format!("Font file {} is empty", path.display())));
        }
        if size > MAX_FONT_FILE_SIZE {
            return Err(Error::Font(format!(
                "Font file {} is {} bytes, limit is {}",
                path.display(),
                size,
                MAX_FONT_FILE_SIZE
            )));
        }

        // SAFETY: the mapping is read-only and the probe never writes font files.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| {
            Error::Font(format!("Failed to map font file {}: {}", path.display(), e))
        })?;

        if !is_valid_font_signature(&mmap) {
            return Err(Error::Font(format!(
                "Invalid font file format in {} (expected TTF/OTF/TTC)",
                path.display()
            )));
        }

        let data = Arc::new(mmap);
        let file_ref = FileRef::new(&data[..])
            .map_err(|e| Error::Font(format!("Failed to parse {}: {}", path.display(), e)))?;

        let mut added = Vec::new();
        for (index, font) in file_ref.fonts().enumerate() {
            let font = match font {
                Ok(font) => font,
                Err(e) => {
                    warn!("Skipping face {} of {}: {}", index, path.display(), e);
                    continue;
                }
            };
            let family = font
                .localized_strings(StringId::FAMILY_NAME)
                .english_or_first()
                .map(|name| name.chars().collect::<String>())
                .unwrap_or_else(|| {
                    path.file_stem()
                        .map(|stem| stem.to_string_lossy().into_owned())
                        .unwrap_or_default()
                });
            let attributes = font.attributes();
            let face = LoadedFace {
                data: Arc::clone(&data),
                index: index as u32,
                path: path.to_path_buf(),
                family,
                bold: attributes.weight.value() >= 600.0,
                italic: !matches!(attributes.style, Style::Normal),
            };
            debug!("Registered {:?}", face);
            added.push(face);
        }

        if added.is_empty() {
            return Err(Error::Font(format!(
                "No usable faces in {}",
                path.display()
            )));
        }

        let count = added.len();
        info!("Loaded {} face(s) from {}", count, path.display());
        self.faces.extend(added);
        Ok(count)
    }

    pub fn faces(&self) -> &[LoadedFace] {
        &self.faces
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Distinct family names, in load order.
    pub fn families(&self) -> Vec<String> {
        let mut families: Vec<String> = Vec::new();
        for face in &self.faces {
            if !families.iter().any(|f| f == face.family()) {
                families.push(face.family().to_string());
            }
        }
        families
    }
}

/// Check for a TrueType, OpenType or collection header.
pub fn is_valid_font_signature(data: &[u8]) -> bool {
    if data.len() < 4 {
        return false;
    }
    matches!(
        &data[0..4],
        b"\x00\x01\x00\x00" | b"OTTO" | b"ttcf" | b"true"
    )
}
