//! Renderer error types.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur during rendering and export.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Rejected before any work started.
    #[error("{0}")]
    Validation(String),

    /// A font could not be fetched or parsed.
    #[error("Failed to load font '{family}': {message}")]
    Font {
        /// Requested family.
        family: String,
        /// Cause.
        message: String,
    },

    /// A remote resource could not be fetched.
    #[error("Network error: {0}")]
    Network(String),

    /// SVG parsing or rasterization failed.
    #[error("Rasterization failed: {0}")]
    Raster(String),

    /// Image encoding failed.
    #[error("Export failed: {0}")]
    Export(String),

    /// Archive creation failed.
    #[error("Packaging failed: {0}")]
    Package(String),

    /// Writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Capturing one post of a batch failed; the batch was aborted.
    #[error("Failed to export post {}: {source}", index + 1)]
    Capture {
        /// Zero-based position of the failing post in the batch.
        index: usize,
        /// Underlying failure.
        #[source]
        source: Box<RenderError>,
    },

    /// Another export is running.
    #[error("An export is already in progress")]
    Busy,

    /// The off-screen root already holds a rendered post.
    #[error("Off-screen root is already mounted")]
    AlreadyMounted,
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        Self::Validation(format!("Invalid project file: {err}"))
    }
}

impl From<reqwest::Error> for RenderError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<zip::result::ZipError> for RenderError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::Package(err.to_string())
    }
}
