//! Aria Player Core
//!
//! Shared domain types, service seams and error handling for Aria Player.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `SongUrl`, `LyricCandidate`, `Session`
//! - **Core Traits**: `MusicService` (remote API), `KeyValueStore` (persistence)
//! - **Error Handling**: Unified `CoreError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use aria_core::{Track, DEFAULT_COVER_SIZE};
//!
//! let track = Track::new("5f3a", "My Favorite Song", "Artist", "https://img/{size}/c.jpg");
//! assert!(!track.is_resolved());
//! assert_eq!(track.cover_at(DEFAULT_COVER_SIZE), "https://img/64/c.jpg");
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{CoreError, Result};
pub use traits::{KeyValueStore, KeyValueStoreExt, MusicService};
pub use types::{
    LoginInfo, LyricCandidate, Session, SongUrl, Track, COVER_SIZE_PLACEHOLDER,
    DEFAULT_COVER_SIZE,
};
