//! Playback manager - queue store and orchestration
//!
//! Owns the queue, the active track and the play mode, and drives the
//! engine adapter. Cloning the manager yields another handle to the same
//! state.
//!
//! Resolution runs without holding the state lock. Each selection takes a
//! ticket carrying a generation number; a result is written back only if no
//! newer selection (or queue reset) has happened since, so the last request
//! wins regardless of response order.

use crate::{
    engine::{EngineAdapter, EngineReaction},
    error::Result,
    events::{NoticeLevel, PlaybackEvent},
    output::{DeviceEvent, MediaOutput},
    queue::Queue,
    resolver,
    snapshot::{PlaybackSnapshot, PLAYBACK_KEY},
    types::{
        Direction, LoadMoreOutcome, MediaState, PlayMode, PlaybackConfig, PlaybackPosition,
        PlaylistContext, SelectOutcome,
    },
};
use aria_core::{KeyValueStore, KeyValueStoreExt, MusicService, Track};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Notice shown when a playlist has no further pages
pub const NO_MORE_SONGS: &str = "No more songs";

/// Identifies one in-flight selection
#[derive(Debug, Clone)]
struct Ticket {
    hash: String,
    generation: u64,
}

enum Dispatch {
    NotInQueue,
    Started,
    Resolve { ticket: Ticket, previous: Option<String> },
}

enum Resume {
    Done(bool),
    Reselect(String),
}

struct Inner<O: MediaOutput> {
    queue: Queue,
    active: Option<String>,
    mode: PlayMode,
    playlist: Option<PlaylistContext>,
    engine: EngineAdapter<O>,
    generation: u64,
    rng: StdRng,
    page_size: u32,
    /// Position to restore once the given track is next loaded
    resume: Option<(String, f64)>,
    pending_events: Vec<PlaybackEvent>,
}

/// Playback queue store
pub struct PlaybackManager<O: MediaOutput> {
    inner: Arc<Mutex<Inner<O>>>,
    service: Arc<dyn MusicService>,
    events: broadcast::Sender<PlaybackEvent>,
}

impl<O: MediaOutput> Clone for PlaybackManager<O> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            service: Arc::clone(&self.service),
            events: self.events.clone(),
        }
    }
}

impl<O: MediaOutput> PlaybackManager<O> {
    /// Create a manager owning `output` for its whole lifetime
    pub fn new(config: PlaybackConfig, service: Arc<dyn MusicService>, output: O) -> Self {
        let rng = match config.shuffle_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let (events, _) = broadcast::channel(config.event_capacity.max(1));

        let inner = Inner {
            queue: Queue::new(),
            active: None,
            mode: PlayMode::default(),
            playlist: None,
            engine: EngineAdapter::new(output, config.volume),
            generation: 0,
            rng,
            page_size: config.page_size.max(1),
            resume: None,
            pending_events: Vec::new(),
        };

        Self {
            inner: Arc::new(Mutex::new(inner)),
            service,
            events,
        }
    }

    /// Register an observer
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    // ===== Queue Management =====

    /// Append unless the hash is already queued; returns whether it was added
    pub fn enqueue(&self, track: Track) -> bool {
        self.with_inner(|inner| {
            let added = inner.queue.push_unique(track);
            if added {
                inner.emit_queue_changed();
            }
            added
        })
    }

    /// Empty the queue and deselect
    pub fn clear(&self) {
        self.with_inner(|inner| {
            inner.generation += 1;
            inner.queue.clear();
            inner.playlist = None;
            inner.resume = None;
            inner.engine.stop();
            inner.set_active(None);
            inner.emit_queue_changed();
        });
    }

    /// Replace the queue wholesale (duplicates dropped)
    ///
    /// The active track stays selected if it is still queued.
    pub fn replace(&self, tracks: Vec<Track>) {
        self.with_inner(|inner| inner.replace_queue(tracks));
    }

    /// Replace the queue with the first page of a playlist and start playing
    ///
    /// Starts at `start_hash` when given, otherwise at the first track.
    pub async fn load_playlist(
        &self,
        playlist_id: &str,
        tracks: Vec<Track>,
        start_hash: Option<&str>,
    ) -> SelectOutcome {
        let page_size = self.with_inner(|inner| inner.page_size);
        self.load_playlist_page(playlist_id, 1, page_size, tracks, start_hash)
            .await
    }

    /// Like [`load_playlist`](Self::load_playlist) for an arbitrary page
    ///
    /// `page` and `page_size` describe how `tracks` were fetched, so the next
    /// [`load_more`](Self::load_more) continues from `page + 1`.
    pub async fn load_playlist_page(
        &self,
        playlist_id: &str,
        page: u32,
        page_size: u32,
        tracks: Vec<Track>,
        start_hash: Option<&str>,
    ) -> SelectOutcome {
        let target = self.with_inner(|inner| {
            inner.replace_queue(tracks);
            inner.playlist = Some(PlaylistContext {
                playlist_id: playlist_id.to_string(),
                page: page.max(1),
                page_size: page_size.max(1),
                exhausted: false,
            });
            info!(playlist_id = %playlist_id, page, tracks = inner.queue.len(), "Loaded playlist");

            start_hash
                .map(str::to_string)
                .or_else(|| inner.queue.tracks().first().map(|t| t.hash.clone()))
        });

        match target {
            Some(hash) => self.select_and_resolve(&hash).await,
            None => SelectOutcome::NotInQueue,
        }
    }

    /// Fetch the next page of the current playlist and append it
    ///
    /// A page shorter than the page size marks the playlist exhausted and
    /// raises a "no more songs" notice.
    pub async fn load_more(&self) -> Result<LoadMoreOutcome> {
        let Some(context) = self.with_inner(|inner| inner.playlist.clone()) else {
            return Ok(LoadMoreOutcome::NoPlaylist);
        };
        if context.exhausted {
            self.with_inner(|inner| inner.notice(NoticeLevel::Info, NO_MORE_SONGS));
            return Ok(LoadMoreOutcome::Exhausted);
        }

        let next_page = context.page + 1;
        let tracks = match self
            .service
            .playlist_tracks(&context.playlist_id, next_page, context.page_size)
            .await
        {
            Ok(tracks) => tracks,
            Err(e) => {
                warn!(playlist_id = %context.playlist_id, page = next_page, error = %e, "Failed to load more tracks");
                self.with_inner(|inner| inner.notice(NoticeLevel::Error, e.to_string()));
                return Err(e.into());
            }
        };

        let outcome = self.with_inner(|inner| {
            let Some(current) = inner.playlist.as_mut() else {
                return LoadMoreOutcome::NoPlaylist;
            };
            if current.playlist_id != context.playlist_id || current.page != context.page {
                debug!(playlist_id = %context.playlist_id, "Playlist changed while loading more");
                return LoadMoreOutcome::Loaded {
                    added: 0,
                    exhausted: current.exhausted,
                };
            }

            let exhausted = tracks.len() < context.page_size as usize;
            current.page = next_page;
            current.exhausted = exhausted;

            let mut added = 0;
            for track in tracks {
                if inner.queue.push_unique(track) {
                    added += 1;
                }
            }
            if added > 0 {
                inner.emit_queue_changed();
            }
            if exhausted {
                inner.notice(NoticeLevel::Info, NO_MORE_SONGS);
            }
            LoadMoreOutcome::Loaded { added, exhausted }
        });

        Ok(outcome)
    }

    // ===== Selection =====

    /// Make `hash` the active track and get it playing
    ///
    /// Unknown hashes are logged and leave state untouched. Unresolved tracks
    /// go through URL then lyric resolution before the engine is told to load.
    pub async fn select_and_resolve(&self, hash: &str) -> SelectOutcome {
        let (ticket, previous) = match self.with_inner(|inner| inner.begin_selection(hash)) {
            Dispatch::NotInQueue => return SelectOutcome::NotInQueue,
            Dispatch::Started => return SelectOutcome::Started,
            Dispatch::Resolve { ticket, previous } => (ticket, previous),
        };

        let url = match resolver::resolve_url(self.service.as_ref(), hash).await {
            Ok(url) => url,
            Err(e) => {
                return self.with_inner(|inner| inner.fail_resolution(&ticket, previous, &e));
            }
        };

        if !self.with_inner(|inner| inner.is_current(&ticket)) {
            debug!(hash = %hash, "Selection superseded before lyric lookup");
            return SelectOutcome::Stale;
        }

        let lyric = resolver::resolve_lyric(self.service.as_ref(), hash).await;
        self.with_inner(|inner| inner.finish_resolution(&ticket, url, lyric))
    }

    /// Select the next/previous track according to the play mode
    pub async fn advance(&self, direction: Direction) -> SelectOutcome {
        let target = self.with_inner(|inner| {
            let current = inner
                .active
                .as_deref()
                .and_then(|hash| inner.queue.index_of(hash))?;
            let index = inner
                .queue
                .target_index(current, direction, inner.mode, &mut inner.rng)?;
            Some(inner.queue.tracks()[index].hash.clone())
        });

        match target {
            Some(hash) => self.select_and_resolve(&hash).await,
            None => {
                debug!(?direction, "Nothing to advance to");
                SelectOutcome::NotInQueue
            }
        }
    }

    pub async fn next(&self) -> SelectOutcome {
        self.advance(Direction::Next).await
    }

    pub async fn previous(&self) -> SelectOutcome {
        self.advance(Direction::Previous).await
    }

    // ===== Play Mode =====

    /// Rotate Sequential -> SingleRepeat -> Shuffle -> Sequential
    pub fn cycle_play_mode(&self) -> PlayMode {
        self.with_inner(|inner| {
            let mode = inner.mode.cycle();
            inner.set_mode(mode);
            mode
        })
    }

    pub fn set_play_mode(&self, mode: PlayMode) {
        self.with_inner(|inner| inner.set_mode(mode));
    }

    pub fn play_mode(&self) -> PlayMode {
        self.with_inner(|inner| inner.mode)
    }

    // ===== Playback Control =====

    /// Resume playback
    ///
    /// If the active track has no loaded source (e.g. after a restore) it is
    /// resolved and loaded first.
    pub async fn play(&self) -> bool {
        let resume = self.with_inner(|inner| {
            if inner.engine.has_source() {
                return Resume::Done(inner.engine.play());
            }
            match inner.active.clone() {
                Some(hash) => Resume::Reselect(hash),
                None => Resume::Done(inner.engine.play()),
            }
        });

        match resume {
            Resume::Done(playing) => playing,
            Resume::Reselect(hash) => {
                self.select_and_resolve(&hash).await;
                self.is_playing()
            }
        }
    }

    pub fn pause(&self) {
        self.with_inner(|inner| inner.engine.pause());
    }

    /// Pause when playing, otherwise play; returns the new playing flag
    pub async fn toggle_play(&self) -> bool {
        let toggled = self.with_inner(|inner| {
            inner
                .engine
                .has_source()
                .then(|| inner.engine.toggle())
        });
        match toggled {
            Some(playing) => playing,
            None => self.play().await,
        }
    }

    /// Seek within the loaded track, clamped to `[0, duration]`
    pub fn seek(&self, seconds: f64) {
        self.with_inner(|inner| {
            let mut target = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
            let duration = inner.engine.duration();
            if duration > 0.0 {
                target = target.min(duration);
            }
            inner.engine.seek(target);
        });
    }

    pub fn set_volume(&self, volume: f32) {
        self.with_inner(|inner| inner.engine.set_volume(volume));
    }

    // ===== Device Events =====

    /// Fold a device event into state; end-of-track advances to the next track
    pub async fn handle_device_event(&self, event: DeviceEvent) -> Option<SelectOutcome> {
        let reaction = self.with_inner(|inner| inner.engine.handle(event));
        match reaction {
            EngineReaction::AdvanceNext => Some(self.advance(Direction::Next).await),
            EngineReaction::None => None,
        }
    }

    /// Pump device events from a channel until it closes
    pub fn spawn_device_bridge(&self, mut events: mpsc::Receiver<DeviceEvent>) -> JoinHandle<()>
    where
        O: 'static,
    {
        let manager = self.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                manager.handle_device_event(event).await;
            }
            debug!("Device event bridge closed");
        })
    }

    // ===== State Queries =====

    pub fn position(&self) -> PlaybackPosition {
        self.with_inner(|inner| PlaybackPosition {
            active: inner.active.clone(),
            elapsed: inner.engine.elapsed(),
            duration: inner.engine.duration(),
            playing: inner.engine.is_playing(),
        })
    }

    pub fn active_track(&self) -> Option<Track> {
        self.with_inner(|inner| {
            inner
                .active
                .as_deref()
                .and_then(|hash| inner.queue.get(hash))
                .cloned()
        })
    }

    pub fn queue(&self) -> Vec<Track> {
        self.with_inner(|inner| inner.queue.tracks().to_vec())
    }

    pub fn queue_len(&self) -> usize {
        self.with_inner(|inner| inner.queue.len())
    }

    pub fn playlist(&self) -> Option<PlaylistContext> {
        self.with_inner(|inner| inner.playlist.clone())
    }

    pub fn state(&self) -> MediaState {
        self.with_inner(|inner| inner.engine.state())
    }

    pub fn is_playing(&self) -> bool {
        self.with_inner(|inner| inner.engine.is_playing())
    }

    pub fn volume(&self) -> f32 {
        self.with_inner(|inner| inner.engine.volume())
    }

    // ===== Persistence =====

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.with_inner(|inner| PlaybackSnapshot {
            tracks: inner
                .queue
                .tracks()
                .iter()
                .cloned()
                .map(|mut track| {
                    track.url = None;
                    track
                })
                .collect(),
            active: inner.active.clone(),
            elapsed: inner.engine.elapsed(),
            mode: inner.mode,
            playlist: inner.playlist.clone(),
        })
    }

    /// Rebuild state from a snapshot without starting playback
    pub fn restore(&self, snapshot: PlaybackSnapshot) {
        self.with_inner(|inner| {
            inner.generation += 1;
            inner.engine.stop();
            inner.queue.replace(snapshot.tracks);
            inner.set_mode(snapshot.mode);
            inner.playlist = snapshot.playlist;

            let active = snapshot.active.filter(|hash| inner.queue.contains(hash));
            inner.resume = active
                .clone()
                .filter(|_| snapshot.elapsed > 0.0)
                .map(|hash| (hash, snapshot.elapsed));
            inner.set_active(active);
            inner.emit_queue_changed();
        });
    }

    pub fn save(&self, store: &dyn KeyValueStore) -> Result<()> {
        store.save(PLAYBACK_KEY, &self.snapshot())?;
        Ok(())
    }

    /// Restore from `store`; returns whether a snapshot was found
    pub fn load(&self, store: &dyn KeyValueStore) -> Result<bool> {
        match store.load::<PlaybackSnapshot>(PLAYBACK_KEY)? {
            Some(snapshot) => {
                debug!(tracks = snapshot.tracks.len(), "Restoring playback snapshot");
                self.restore(snapshot);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Run `f` under the state lock, then broadcast the events it produced
    fn with_inner<R>(&self, f: impl FnOnce(&mut Inner<O>) -> R) -> R {
        let (result, events) = {
            let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            let result = f(&mut inner);
            (result, inner.take_events())
        };
        for event in events {
            // No subscribers is fine
            let _ = self.events.send(event);
        }
        result
    }
}

impl<O: MediaOutput> Inner<O> {
    fn begin_selection(&mut self, hash: &str) -> Dispatch {
        let Some(track) = self.queue.get(hash).cloned() else {
            warn!(hash = %hash, "Selected track is not in the queue");
            return Dispatch::NotInQueue;
        };

        self.generation += 1;
        let previous = self.set_active(Some(hash.to_string()));

        if track.is_resolved() {
            debug!(hash = %hash, "Track already resolved");
            self.load_track(&track);
            return Dispatch::Started;
        }

        Dispatch::Resolve {
            ticket: Ticket {
                hash: hash.to_string(),
                generation: self.generation,
            },
            previous,
        }
    }

    fn is_current(&self, ticket: &Ticket) -> bool {
        self.generation == ticket.generation && self.active.as_deref() == Some(ticket.hash.as_str())
    }

    fn fail_resolution(
        &mut self,
        ticket: &Ticket,
        previous: Option<String>,
        error: &crate::error::PlaybackError,
    ) -> SelectOutcome {
        warn!(hash = %ticket.hash, error = %error, "Track unavailable");
        if !self.is_current(ticket) {
            return SelectOutcome::Stale;
        }

        let name = self
            .queue
            .get(&ticket.hash)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| ticket.hash.clone());
        self.notice(NoticeLevel::Warning, format!("{name} is unavailable"));

        let previous = previous.filter(|hash| self.queue.contains(hash));
        self.set_active(previous);
        SelectOutcome::Unavailable
    }

    fn finish_resolution(
        &mut self,
        ticket: &Ticket,
        url: String,
        lyric: Option<String>,
    ) -> SelectOutcome {
        if !self.is_current(ticket) {
            debug!(hash = %ticket.hash, "Discarding stale resolution");
            return SelectOutcome::Stale;
        }

        let has_lyric = lyric.is_some();
        if !self.queue.apply_resolution(&ticket.hash, url, lyric) {
            return SelectOutcome::Stale;
        }
        self.emit(PlaybackEvent::TrackResolved {
            track_id: ticket.hash.clone(),
            has_lyric,
        });

        let Some(track) = self.queue.get(&ticket.hash).cloned() else {
            return SelectOutcome::Stale;
        };
        self.load_track(&track);
        SelectOutcome::Resolved
    }

    fn load_track(&mut self, track: &Track) {
        match self.resume.take() {
            Some((hash, at)) if hash == track.hash => {
                self.engine.cue(track, at);
                self.engine.play();
            }
            _ => {
                self.engine.load(track);
            }
        }
    }

    fn replace_queue(&mut self, tracks: Vec<Track>) {
        self.queue.replace(tracks);
        self.playlist = None;

        let still_queued = self
            .active
            .as_deref()
            .is_some_and(|hash| self.queue.contains(hash));
        if !still_queued && self.active.is_some() {
            self.generation += 1;
            self.resume = None;
            self.engine.stop();
            self.set_active(None);
        }
        self.emit_queue_changed();
    }

    /// Returns the previous active id
    fn set_active(&mut self, active: Option<String>) -> Option<String> {
        if self.active == active {
            return self.active.clone();
        }
        let previous = std::mem::replace(&mut self.active, active.clone());
        self.emit(PlaybackEvent::TrackChanged {
            track_id: active,
            previous_track_id: previous.clone(),
        });
        previous
    }

    fn set_mode(&mut self, mode: PlayMode) {
        if self.mode != mode {
            self.mode = mode;
            info!(mode = mode.label(), "Play mode changed");
            self.emit(PlaybackEvent::PlayModeChanged { mode });
        }
    }

    fn notice(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.emit(PlaybackEvent::notice(level, message));
    }

    fn emit_queue_changed(&mut self) {
        let length = self.queue.len();
        self.emit(PlaybackEvent::QueueChanged { length });
    }

    /// Queue an event after anything the engine produced so far
    fn emit(&mut self, event: PlaybackEvent) {
        let engine_events = self.engine.drain_events();
        self.pending_events.extend(engine_events);
        self.pending_events.push(event);
    }

    fn take_events(&mut self) -> Vec<PlaybackEvent> {
        let engine_events = self.engine.drain_events();
        self.pending_events.extend(engine_events);
        std::mem::take(&mut self.pending_events)
    }
}
