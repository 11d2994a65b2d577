// this_file: src/error.rs
//! Error types for the cjkprobe library

use thiserror::Error;

/// Main error type for cjkprobe operations
#[derive(Debug, Error)]
pub enum Error {
    /// Font file loading or parsing error
    #[error("Font error: {0}")]
    Font(String),

    /// Rendering error reported by a font service
    #[error("Rendering error: {0}")]
    Rendering(String),

    /// Requested service, font or glyph does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Host allocator refused a request
    #[error("Out of resources: {0}")]
    OutOfResources(String),

    /// Invalid input parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// IO operation error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Image encoding or decoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl Error {
    /// Short firmware-style status name, printed on `Status:` lines.
    pub fn status(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "Not Found",
            Error::OutOfResources(_) => "Out of Resources",
            Error::InvalidParameter(_) => "Invalid Parameter",
            Error::Font(_) | Error::Rendering(_) | Error::Image(_) => "Device Error",
            Error::Io(_) | Error::Json(_) => "Load Error",
        }
    }

    /// True when the error must abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::OutOfResources(_))
    }
}

/// Result type alias for cjkprobe operations
pub type Result<T> = std::result::Result<T, Error>;
