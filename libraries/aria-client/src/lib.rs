//! Aria Music Service Client
//!
//! HTTP client for the music service API that backs Aria Player.
//!
//! # Features
//!
//! - **Health gate**: requests wait (bounded) for the backend to report healthy
//! - **Authentication**: phone code, password, open-platform, QR login, token refresh
//! - **Library**: song URL resolution, lyrics, playlists, search, user profile
//! - **Error classification**: status/transport categories mapped to user messages
//!
//! # Example
//!
//! ```ignore
//! use aria_client::{ClientConfig, MusicServiceClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = MusicServiceClient::new(ClientConfig::default())?;
//!
//!     let login = client.auth().login_password("user", "password").await?;
//!     println!("Logged in as {}", login.nickname);
//!
//!     let tracks = client.library().playlist_tracks("collection_3_1_1", 1, 20).await?;
//!     println!("Found {} tracks", tracks.len());
//!
//!     Ok(())
//! }
//! ```

mod auth;
mod client;
mod error;
mod library;
mod service;
mod types;

// Re-export main types
pub use client::MusicServiceClient;
pub use error::{ErrorKind, Result, ServiceError};
pub use types::{
    ClientConfig, PlaylistInfo, QrCode, QrStatus, RemoteSong, SearchSong, SingerInfo, UserProfile,
    WxQrCode, WxQrImage, WxStatus, DEFAULT_BASE_URL, UNKNOWN_ARTIST,
};

// Re-export sub-clients for direct use if needed
pub use auth::AuthClient;
pub use library::LibraryClient;
