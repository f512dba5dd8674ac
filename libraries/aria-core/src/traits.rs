/// Core traits for Aria Player
use crate::error::Result;
use crate::types::{LyricCandidate, SongUrl, Track};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Remote music service as seen by the playback layer
///
/// The HTTP client implements this; tests substitute scripted services.
#[async_trait]
pub trait MusicService: Send + Sync {
    /// Candidate playable URLs for a track
    async fn song_url(&self, hash: &str) -> Result<SongUrl>;

    /// Lyric candidates for a track, best match first
    async fn search_lyric(&self, hash: &str) -> Result<Vec<LyricCandidate>>;

    /// Decoded lyric text for a candidate
    async fn lyric(&self, candidate: &LyricCandidate) -> Result<String>;

    /// One page of a playlist's tracks (pages start at 1)
    async fn playlist_tracks(
        &self,
        playlist_id: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Track>>;
}

/// String key-value persistence that survives process restarts
pub trait KeyValueStore: Send + Sync {
    /// Raw value for `key`, if present
    fn get_raw(&self, key: &str) -> Result<Option<String>>;

    /// Store a raw value under `key`
    fn set_raw(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing an absent key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

/// Typed JSON helpers over any [`KeyValueStore`]
pub trait KeyValueStoreExt {
    /// Load and deserialize the value under `key`
    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>>;

    /// Serialize and store `value` under `key`
    fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStoreExt for S {
    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_raw(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.set_raw(key, &raw)
    }
}
