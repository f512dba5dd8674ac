use aria_core::CoreError;
use thiserror::Error;

/// Errors that can occur while deriving a theme colour
#[derive(Debug, Error)]
pub enum ArtworkError {
    /// Cover could not be downloaded
    #[error("Failed to fetch cover: {0}")]
    Fetch(#[from] reqwest::Error),

    /// Bytes are not a supported image
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// Image has no usable (opaque) pixels
    #[error("Image has no usable pixels")]
    EmptyImage,

    /// Persisting the theme failed
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<image::ImageError> for ArtworkError {
    fn from(err: image::ImageError) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Result type for artwork operations
pub type Result<T> = std::result::Result<T, ArtworkError>;
