//! Error types for the export pipeline

use thiserror::Error;

/// Result type alias for export operations
pub type Result<T> = std::result::Result<T, Error>;

/// Message shown to the user when there is no surface to export
pub const NOTHING_TO_EXPORT: &str = "Nothing to export";

/// Message shown to the user for every other export failure
pub const EXPORT_FAILED: &str = "Failed to export PDF";

/// Errors that can occur while capturing or exporting a surface
#[derive(Error, Debug)]
pub enum Error {
    /// No render surface was supplied to the export call
    #[error("Nothing to export: no render surface was provided")]
    NoContent,

    /// The surface could not be rasterized
    #[error("Capture failed: {0}")]
    CaptureError(String),

    /// The captured raster would exceed the configured height limit
    #[error("Content too large: raster height {height}px exceeds the {max}px limit")]
    ContentTooLarge { height: u64, max: u32 },

    /// The raster could not be encoded for embedding
    #[error("Image encoding failed: {0}")]
    EncodingError(String),

    /// The paginated document could not be assembled
    #[error("Page assembly failed: {0}")]
    AssemblyError(String),

    /// The finished document could not be saved
    #[error("Failed to save document: {0}")]
    SaveError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

impl Error {
    /// Human-readable message for the notification channel.
    ///
    /// Only a missing surface gets its own wording; capture, encoding and
    /// assembly failures all collapse to the generic failure message.
    pub fn user_message(&self) -> &'static str {
        match self {
            Error::NoContent => NOTHING_TO_EXPORT,
            _ => EXPORT_FAILED,
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::EncodingError(err.to_string())
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::AssemblyError(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::SaveError(err.to_string())
    }
}
