//! Aria Playback - queue store, track resolution and media engine state
//!
//! The [`PlaybackManager`] owns the play queue and a single media output.
//! Selecting a track resolves its stream URL (and, best-effort, its lyric)
//! through a [`MusicService`](aria_core::MusicService) before the output is
//! asked to load it. Overlapping selections are safe: only the most recent
//! request is applied.
//!
//! # Example
//!
//! ```rust,no_run
//! use aria_playback::{PlaybackConfig, PlaybackManager, RecordingOutput};
//! # async fn example(service: std::sync::Arc<dyn aria_core::MusicService>) {
//! let manager = PlaybackManager::new(PlaybackConfig::default(), service, RecordingOutput::new());
//! let _events = manager.subscribe();
//!
//! manager.enqueue(aria_core::Track::new("hash", "Song", "Artist", ""));
//! manager.select_and_resolve("hash").await;
//! # }
//! ```

#![forbid(unsafe_code)]

mod engine;
mod error;
mod events;
mod manager;
mod output;
mod queue;
pub mod resolver;
mod shuffle;
mod snapshot;
mod types;

pub use engine::{EngineAdapter, EngineReaction};
pub use error::{PlaybackError, Result};
pub use events::{NoticeLevel, PlaybackEvent};
pub use manager::{PlaybackManager, NO_MORE_SONGS};
pub use output::{DeviceEvent, MediaOutput, OutputCommand, OutputError, RecordingOutput};
pub use queue::Queue;
pub use snapshot::{PlaybackSnapshot, PLAYBACK_KEY};
pub use types::{
    Direction, LoadMoreOutcome, MediaState, PlayMode, PlaybackConfig, PlaybackPosition,
    PlaylistContext, SelectOutcome,
};
