//! Persisted queue/position/mode snapshot

use crate::types::{PlayMode, PlaylistContext};
use aria_core::Track;
use serde::{Deserialize, Serialize};

/// Storage key for the playback snapshot
pub const PLAYBACK_KEY: &str = "playback";

/// Everything needed to rebuild the player after a restart
///
/// Resolved URLs are not kept: the service hands out short-lived links, so
/// tracks are resolved again when played. Lyrics are kept.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    pub tracks: Vec<Track>,

    #[serde(default)]
    pub active: Option<String>,

    /// Elapsed seconds of the active track
    #[serde(default)]
    pub elapsed: f64,

    #[serde(default)]
    pub mode: PlayMode,

    #[serde(default)]
    pub playlist: Option<PlaylistContext>,
}
