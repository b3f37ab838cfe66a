//! Renderer error types.

use ink_core::CanvasError;
use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur during rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The generated SVG could not be parsed back.
    #[error("SVG parsing failed: {0}")]
    Svg(String),

    /// Pixel buffer could not be allocated.
    #[error("Rasterization failed: {0}")]
    Raster(String),

    /// A format encoder rejected the image.
    #[error("{format} encoding failed: {message}")]
    Encode {
        /// Output format name.
        format: &'static str,
        /// Encoder message.
        message: String,
    },

    /// PDF assembly failed.
    #[error("PDF generation failed: {0}")]
    Pdf(String),
}

impl RenderError {
    pub(crate) fn encode(format: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Encode {
            format,
            message: err.to_string(),
        }
    }
}

impl From<RenderError> for CanvasError {
    fn from(err: RenderError) -> Self {
        Self::Export(err.to_string())
    }
}
