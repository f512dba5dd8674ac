//! Core types for playback management

use serde::{Deserialize, Serialize};

/// Next/previous selection policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayMode {
    /// Queue order, wrapping at both ends
    #[default]
    Sequential,

    /// Replay the current track
    SingleRepeat,

    /// Uniformly random track other than the current one
    Shuffle,
}

impl PlayMode {
    /// Sequential -> SingleRepeat -> Shuffle -> Sequential
    pub fn cycle(self) -> Self {
        match self {
            PlayMode::Sequential => PlayMode::SingleRepeat,
            PlayMode::SingleRepeat => PlayMode::Shuffle,
            PlayMode::Shuffle => PlayMode::Sequential,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PlayMode::Sequential => "sequential",
            PlayMode::SingleRepeat => "single repeat",
            PlayMode::Shuffle => "shuffle",
        }
    }
}

/// Navigation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// Media handle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MediaState {
    /// No source loaded
    #[default]
    Idle,

    /// Source set, buffering
    Loading,

    /// Audible
    Playing,

    /// Source loaded, not playing (also after a rejected play)
    Paused,

    /// Device reported an error
    Errored,
}

/// Active track plus transport position
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlaybackPosition {
    /// Hash of the active track, `None` when nothing is selected
    pub active: Option<String>,

    /// Elapsed seconds
    pub elapsed: f64,

    /// Total seconds, 0 until the device reports it
    pub duration: f64,

    pub playing: bool,
}

/// Where the queue was loaded from, for paging in more tracks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistContext {
    pub playlist_id: String,

    /// Last page fetched (pages start at 1)
    pub page: u32,

    pub page_size: u32,

    /// A short page was seen; nothing more to fetch
    #[serde(default)]
    pub exhausted: bool,
}

/// Playback manager configuration
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    /// Initial output volume (0.0 - 1.0)
    pub volume: f32,

    /// Tracks per page when loading more of a playlist
    pub page_size: u32,

    /// Fixed seed for shuffle selection (`None` = entropy)
    pub shuffle_seed: Option<u64>,

    /// Capacity of the event broadcast channel
    pub event_capacity: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            volume: 0.7,
            page_size: 20,
            shuffle_seed: None,
            event_capacity: 64,
        }
    }
}

/// Result of a select/advance request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    /// Track was already resolved and was loaded immediately
    Started,

    /// Track was resolved and loaded
    Resolved,

    /// A newer selection superseded this one; its result was discarded
    Stale,

    /// No playable URL; nothing was loaded
    Unavailable,

    /// Identifier (or the active track) is not in the queue
    NotInQueue,
}

/// Result of paging more tracks into the queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadMoreOutcome {
    /// Queue did not come from a playlist
    NoPlaylist,

    /// A previous page was short
    Exhausted,

    /// Page fetched
    Loaded { added: usize, exhausted: bool },
}
