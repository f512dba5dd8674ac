//! Media engine adapter
//!
//! Owns the single [`MediaOutput`] and drives it through an explicit
//! state machine:
//!
//! ```text
//!            load            play ok
//!   Idle ──────────► Loading ────────► Playing ◄──┐
//!    ▲                 │  ▲   play err    │ pause │ play
//!    │ stop            │  └─ Waiting ─────┤       │
//!    │                 ▼                  ▼       │
//!    └──────────── Paused ◄───────────────┴───────┘
//!                   device error ─► Errored
//! ```
//!
//! Transitions push [`PlaybackEvent`]s onto a pending list that the owner
//! drains after each call.

use crate::events::PlaybackEvent;
use crate::output::{DeviceEvent, MediaOutput};
use crate::types::MediaState;
use aria_core::Track;
use tracing::{debug, error, warn};

/// What the owner should do after a device event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineReaction {
    None,

    /// Track ended; select the next one
    AdvanceNext,
}

pub struct EngineAdapter<O: MediaOutput> {
    output: O,
    state: MediaState,
    source: Option<String>,
    elapsed: f64,
    duration: f64,
    playing: bool,
    volume: f32,
    pending_events: Vec<PlaybackEvent>,
}

impl<O: MediaOutput> EngineAdapter<O> {
    pub fn new(mut output: O, volume: f32) -> Self {
        let volume = volume.clamp(0.0, 1.0);
        output.set_volume(volume);
        Self {
            output,
            state: MediaState::Idle,
            source: None,
            elapsed: 0.0,
            duration: 0.0,
            playing: false,
            volume,
            pending_events: Vec::new(),
        }
    }

    // ===== Transport =====

    /// Load a resolved track and try to start it
    ///
    /// A rejected play leaves the engine `Paused`; it is logged, not returned.
    /// Returns whether playback started.
    pub fn load(&mut self, track: &Track) -> bool {
        let Some(url) = track.url.as_deref().filter(|u| !u.is_empty()) else {
            error!(hash = %track.hash, "Cannot load track without a URL");
            return false;
        };

        debug!(hash = %track.hash, url = %url, "Loading track");
        self.output.set_source(url);
        self.source = Some(url.to_string());
        self.elapsed = 0.0;
        self.duration = 0.0;
        self.output.load();
        self.set_state(MediaState::Loading);

        self.attempt_play()
    }

    /// Load a resolved track paused at `at` seconds
    pub fn cue(&mut self, track: &Track, at: f64) {
        let Some(url) = track.url.as_deref().filter(|u| !u.is_empty()) else {
            return;
        };

        self.output.set_source(url);
        self.source = Some(url.to_string());
        self.output.load();
        self.duration = 0.0;
        self.elapsed = at.max(0.0);
        if self.elapsed > 0.0 {
            self.output.seek(self.elapsed);
        }
        self.playing = false;
        self.set_state(MediaState::Paused);
    }

    /// Resume the loaded source; no-op (logged) without one
    pub fn play(&mut self) -> bool {
        if self.source.is_none() {
            error!("play() called with no source loaded");
            return false;
        }
        if self.playing && self.state == MediaState::Playing {
            return true;
        }
        self.attempt_play()
    }

    pub fn pause(&mut self) {
        if self.source.is_none() {
            return;
        }
        self.output.pause();
        self.playing = false;
        if matches!(self.state, MediaState::Playing | MediaState::Loading) {
            self.set_state(MediaState::Paused);
        }
    }

    /// Pause when playing, otherwise play
    pub fn toggle(&mut self) -> bool {
        if self.playing {
            self.pause();
            false
        } else {
            self.play()
        }
    }

    /// Forward a seek to the device; the caller clamps
    pub fn seek(&mut self, seconds: f64) {
        if self.source.is_none() {
            debug!(seconds, "Ignoring seek without a source");
            return;
        }
        self.output.seek(seconds);
        self.elapsed = seconds;
        self.emit_position();
    }

    /// Unload the source and return to `Idle`
    pub fn stop(&mut self) {
        if self.source.is_some() {
            self.output.stop();
        }
        self.source = None;
        self.playing = false;
        self.elapsed = 0.0;
        self.duration = 0.0;
        self.set_state(MediaState::Idle);
    }

    pub fn set_volume(&mut self, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        if (volume - self.volume).abs() < f32::EPSILON {
            return;
        }
        self.volume = volume;
        self.output.set_volume(volume);
        self.pending_events
            .push(PlaybackEvent::VolumeChanged { volume });
    }

    fn attempt_play(&mut self) -> bool {
        match self.output.play() {
            Ok(()) => {
                self.playing = true;
                self.set_state(MediaState::Playing);
                true
            }
            Err(e) => {
                warn!(error = %e, "Device rejected playback");
                self.playing = false;
                self.set_state(MediaState::Paused);
                false
            }
        }
    }

    // ===== Device Events =====

    /// Fold a device event into engine state
    pub fn handle(&mut self, event: DeviceEvent) -> EngineReaction {
        if self.source.is_none() {
            debug!(?event, "Ignoring device event without a source");
            return EngineReaction::None;
        }

        match event {
            DeviceEvent::TimeUpdate(t) => {
                let mut t = if t.is_finite() { t.max(0.0) } else { 0.0 };
                if self.duration > 0.0 {
                    t = t.min(self.duration);
                }
                self.elapsed = t;
                self.emit_position();
            }
            DeviceEvent::DurationChanged(d) => {
                self.duration = if d.is_finite() && d > 0.0 { d } else { 0.0 };
                if self.duration > 0.0 && self.elapsed > self.duration {
                    self.elapsed = self.duration;
                }
                self.emit_position();
            }
            DeviceEvent::Waiting => {
                if self.state == MediaState::Playing {
                    self.set_state(MediaState::Loading);
                }
            }
            DeviceEvent::CanPlay => {
                if self.state == MediaState::Loading && self.playing {
                    self.set_state(MediaState::Playing);
                }
            }
            DeviceEvent::Ended => {
                debug!("Track ended");
                self.playing = false;
                if self.duration > 0.0 {
                    self.elapsed = self.duration;
                }
                self.set_state(MediaState::Paused);
                return EngineReaction::AdvanceNext;
            }
            DeviceEvent::Error(message) => {
                error!(error = %message, "Media device error");
                self.playing = false;
                self.set_state(MediaState::Errored);
                self.pending_events
                    .push(PlaybackEvent::Error { message });
            }
        }

        EngineReaction::None
    }

    // ===== State Queries =====

    pub fn state(&self) -> MediaState {
        self.state
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Take events produced since the last drain
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    fn set_state(&mut self, state: MediaState) {
        if self.state != state {
            self.state = state;
            self.pending_events
                .push(PlaybackEvent::StateChanged { state });
        }
    }

    fn emit_position(&mut self) {
        self.pending_events.push(PlaybackEvent::PositionUpdate {
            elapsed: self.elapsed,
            duration: self.duration,
        });
    }
}
