//! Render and asset errors.

use thiserror::Error;

/// Errors raised while rasterizing or encoding a frame.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("SVG parsing failed: {0}")]
    Svg(String),
    #[error("Failed to allocate a {width}x{height} surface")]
    Surface { width: u32, height: u32 },
    #[error("PNG encoding failed: {0}")]
    Png(String),
    #[error("JPEG encoding failed: {0}")]
    Jpeg(String),
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors raised while fetching or decoding an image asset.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AssetError {
    #[error("Fetch of {url} failed: {reason}")]
    Fetch { url: String, reason: String },
    #[error("Malformed data URL: {0}")]
    DataUrl(String),
    #[error("Could not decode image: {0}")]
    Decode(String),
}
