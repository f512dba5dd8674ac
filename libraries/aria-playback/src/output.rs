//! Platform media output abstraction
//!
//! The engine adapter owns exactly one `MediaOutput` for its lifetime and
//! is the only component that issues commands to it. Device-side events flow
//! back as [`DeviceEvent`]s.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::info;

/// Media output errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OutputError {
    /// Device refused to start playback (e.g. autoplay policy)
    #[error("Playback rejected: {0}")]
    Rejected(String),

    /// Device-level failure
    #[error("Device error: {0}")]
    Device(String),
}

/// Platform media handle
///
/// Implementations wrap an audio element, a native player, or a test double.
#[cfg_attr(test, mockall::automock)]
pub trait MediaOutput: Send {
    /// Point the device at a new source URL
    fn set_source(&mut self, url: &str);

    /// Start buffering the current source
    fn load(&mut self);

    /// Start or resume playback
    fn play(&mut self) -> Result<(), OutputError>;

    fn pause(&mut self);

    /// Jump to `seconds` from the start
    fn seek(&mut self, seconds: f64);

    /// Volume in 0.0 - 1.0
    fn set_volume(&mut self, volume: f32);

    /// Unload the source
    fn stop(&mut self);
}

/// Events reported by the device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeviceEvent {
    /// Playback position advanced (seconds)
    TimeUpdate(f64),

    /// Metadata loaded; total duration in seconds
    DurationChanged(f64),

    /// Stalled waiting for data
    Waiting,

    /// Enough data buffered to play
    CanPlay,

    /// Reached the end of the source
    Ended,

    /// Device error
    Error(String),
}

/// Command issued to a [`RecordingOutput`]
#[derive(Debug, Clone, PartialEq)]
pub enum OutputCommand {
    SetSource(String),
    Load,
    Play,
    Pause,
    Seek(f64),
    SetVolume(f32),
    Stop,
}

/// Output that records and logs every command without producing sound
///
/// Used by headless front ends and tests. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingOutput {
    commands: Arc<Mutex<Vec<OutputCommand>>>,
    reject_play: Arc<Mutex<Option<String>>>,
}

impl RecordingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `play` calls fail with `reason`, or succeed with `None`
    pub fn set_reject_play(&self, reason: Option<&str>) {
        *self
            .reject_play
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = reason.map(str::to_string);
    }

    /// All commands issued so far
    pub fn commands(&self) -> Vec<OutputCommand> {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Most recent source URL
    pub fn current_source(&self) -> Option<String> {
        self.commands()
            .into_iter()
            .rev()
            .find_map(|c| match c {
                OutputCommand::SetSource(url) => Some(url),
                OutputCommand::Stop => Some(String::new()),
                _ => None,
            })
            .filter(|url| !url.is_empty())
    }

    fn record(&self, command: OutputCommand) {
        info!(?command, "Media output");
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command);
    }
}

impl MediaOutput for RecordingOutput {
    fn set_source(&mut self, url: &str) {
        self.record(OutputCommand::SetSource(url.to_string()));
    }

    fn load(&mut self) {
        self.record(OutputCommand::Load);
    }

    fn play(&mut self) -> Result<(), OutputError> {
        self.record(OutputCommand::Play);
        let rejection = self
            .reject_play
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match rejection {
            Some(reason) => Err(OutputError::Rejected(reason)),
            None => Ok(()),
        }
    }

    fn pause(&mut self) {
        self.record(OutputCommand::Pause);
    }

    fn seek(&mut self, seconds: f64) {
        self.record(OutputCommand::Seek(seconds));
    }

    fn set_volume(&mut self, volume: f32) {
        self.record(OutputCommand::SetVolume(volume));
    }

    fn stop(&mut self) {
        self.record(OutputCommand::Stop);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_log() {
        let output = RecordingOutput::new();
        let mut handle = output.clone();
        handle.set_source("https://x/a.mp3");
        handle.load();

        assert_eq!(
            output.commands(),
            vec![
                OutputCommand::SetSource("https://x/a.mp3".into()),
                OutputCommand::Load
            ]
        );
        assert_eq!(output.current_source().as_deref(), Some("https://x/a.mp3"));
    }

    #[test]
    fn test_stop_clears_current_source() {
        let mut output = RecordingOutput::new();
        output.set_source("u");
        output.stop();
        assert_eq!(output.current_source(), None);
    }

    #[test]
    fn test_reject_play() {
        let mut output = RecordingOutput::new();
        output.set_reject_play(Some("autoplay blocked"));
        assert_eq!(
            output.play(),
            Err(OutputError::Rejected("autoplay blocked".into()))
        );
        output.set_reject_play(None);
        assert!(output.play().is_ok());
    }
}
