//! Playback Events
//!
//! Observers subscribe to the manager's broadcast channel instead of
//! watching shared state. Events are emitted at key points:
//! - Media state transitions (loading/playing/paused/errored)
//! - Active track changes and resolution results
//! - Queue and play-mode changes
//! - User-facing notices (track unavailable, no more songs)

use crate::types::{MediaState, PlayMode};
use serde::{Deserialize, Serialize};

/// Severity of a user-facing notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Events emitted by the playback system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// Media handle changed state
    StateChanged { state: MediaState },

    /// Active track changed
    TrackChanged {
        track_id: Option<String>,
        previous_track_id: Option<String>,
    },

    /// URL (and possibly lyric) attached to a queue entry
    TrackResolved { track_id: String, has_lyric: bool },

    /// Position update from the device
    PositionUpdate { elapsed: f64, duration: f64 },

    /// Queue contents changed
    QueueChanged { length: usize },

    PlayModeChanged { mode: PlayMode },

    VolumeChanged { volume: f32 },

    /// Message meant for the user
    Notice { level: NoticeLevel, message: String },

    /// Device or playback error
    Error { message: String },
}

impl PlaybackEvent {
    pub(crate) fn notice(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self::Notice {
            level,
            message: message.into(),
        }
    }
}
