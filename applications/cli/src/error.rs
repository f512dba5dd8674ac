use aria_artwork::ArtworkError;
use aria_client::ServiceError;
use aria_core::CoreError;
use aria_playback::PlaybackError;
use aria_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Artwork(#[from] ArtworkError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid QR image: {0}")]
    QrImage(String),
}

impl From<config::ConfigError> for CliError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
