//! Ordered, identifier-unique track queue
//!
//! Insertion order is playback order in sequential mode. No two entries
//! share a hash; every mutation goes through the methods below.

use crate::shuffle::pick_other;
use crate::types::{Direction, PlayMode};
use aria_core::Track;
use rand::Rng;
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct Queue {
    tracks: Vec<Track>,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a queue from tracks, keeping the first occurrence of each hash
    pub fn from_tracks(tracks: impl IntoIterator<Item = Track>) -> Self {
        let mut queue = Self::new();
        queue.replace(tracks);
        queue
    }

    /// Append at the tail unless the hash is already present
    ///
    /// Returns whether the queue changed.
    pub fn push_unique(&mut self, track: Track) -> bool {
        if self.contains(&track.hash) {
            return false;
        }
        self.tracks.push(track);
        true
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    /// Replace the whole queue, dropping duplicate hashes
    pub fn replace(&mut self, tracks: impl IntoIterator<Item = Track>) {
        let mut seen = HashSet::new();
        self.tracks = tracks
            .into_iter()
            .filter(|t| seen.insert(t.hash.clone()))
            .collect();
    }

    /// Attach resolution results to the entry with this hash
    ///
    /// Returns `false` if the track has left the queue meanwhile.
    pub fn apply_resolution(&mut self, hash: &str, url: String, lyric: Option<String>) -> bool {
        match self.get_mut(hash) {
            Some(track) => {
                track.url = Some(url);
                track.lyric = lyric;
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.index_of(hash).is_some()
    }

    pub fn index_of(&self, hash: &str) -> Option<usize> {
        self.tracks.iter().position(|t| t.hash == hash)
    }

    pub fn get(&self, hash: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.hash == hash)
    }

    fn get_mut(&mut self, hash: &str) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| t.hash == hash)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Index selected by `advance` from `current`
    ///
    /// `None` if the queue is empty or `current` is out of range.
    pub fn target_index<R: Rng + ?Sized>(
        &self,
        current: usize,
        direction: Direction,
        mode: PlayMode,
        rng: &mut R,
    ) -> Option<usize> {
        let len = self.len();
        if current >= len {
            return None;
        }

        let target = match mode {
            PlayMode::Sequential => match direction {
                Direction::Next => (current + 1) % len,
                Direction::Previous => (current + len - 1) % len,
            },
            PlayMode::SingleRepeat => current,
            PlayMode::Shuffle => pick_other(len, current, rng),
        };
        Some(target)
    }
}
