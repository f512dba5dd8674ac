//! Error types for playback management

use aria_core::CoreError;
use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// No usable URL could be resolved
    #[error("No playable URL for {hash}: {reason}")]
    Unavailable { hash: String, reason: String },

    /// Service or storage failure
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
