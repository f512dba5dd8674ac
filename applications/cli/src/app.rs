//! Application wiring shared by the CLI commands
//!
//! Ties the service client, persisted stores and playback manager together.
//! Each command runs against state restored from the data directory and
//! saves the playback snapshot back when it changes the queue.

use crate::config::AppConfig;
use crate::error::{CliError, Result};
use aria_artwork::{ColorExtractor, Rgb, ThemeStore};
use aria_client::{MusicServiceClient, QrCode, WxQrCode};
use aria_core::{KeyValueStore, LoginInfo, MusicService, Session, Track};
use aria_playback::{
    Direction, LoadMoreOutcome, PlayMode, PlaybackManager, RecordingOutput, SelectOutcome,
};
use aria_storage::{FileStore, SessionStore};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct App {
    client: Arc<MusicServiceClient>,
    store: Arc<dyn KeyValueStore>,
    session: SessionStore,
    theme: ThemeStore,
    player: PlaybackManager<RecordingOutput>,
    output: RecordingOutput,
    extractor: ColorExtractor,
    http: reqwest::Client,
}

impl App {
    /// Open the data directory and restore persisted state
    pub fn open(config: &AppConfig) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> =
            Arc::new(FileStore::open(&config.storage.data_dir)?);
        let session = SessionStore::load(Arc::clone(&store));
        let theme = ThemeStore::load(Arc::clone(&store));

        let token = session.is_authenticated().then(|| session.token());
        let client = Arc::new(MusicServiceClient::new(config.client_config(token))?);

        let output = RecordingOutput::new();
        let service: Arc<dyn MusicService> = client.clone();
        let player = PlaybackManager::new(config.playback_config(), service, output.clone());
        match player.load(store.as_ref()) {
            Ok(true) => debug!(tracks = player.queue_len(), "Restored playback state"),
            Ok(false) => {}
            Err(e) => warn!(error = %e, "Ignoring unreadable playback state"),
        }

        Ok(Self {
            client,
            store,
            session,
            theme,
            player,
            output,
            extractor: ColorExtractor::default(),
            http: reqwest::Client::new(),
        })
    }

    pub fn client(&self) -> &MusicServiceClient {
        &self.client
    }

    pub fn player(&self) -> &PlaybackManager<RecordingOutput> {
        &self.player
    }

    /// Commands the headless output received during this run
    pub fn output(&self) -> &RecordingOutput {
        &self.output
    }

    pub fn theme(&self) -> &ThemeStore {
        &self.theme
    }

    // ===== Startup =====

    /// Refresh the stored token; returns whether a refresh happened
    pub async fn refresh_session(&self) -> Result<bool> {
        if !self.session.is_authenticated() {
            return Ok(false);
        }
        let fresh = self
            .client
            .auth()
            .refresh_token(&self.session.token(), &self.session.user_id())
            .await?;
        self.session.set_token(fresh)?;
        info!(user_id = %self.session.user_id(), "Session refreshed");
        Ok(true)
    }

    /// Startup refresh; failures are logged, never fatal
    pub async fn startup(&self) {
        if let Err(e) = self.refresh_session().await {
            warn!(error = %e, "Token refresh failed, continuing with stored session");
        }
    }

    pub async fn health(&self) -> Result<()> {
        self.client.ensure_ready().await?;
        Ok(())
    }

    // ===== Session =====

    pub async fn login_password(&self, username: &str, password: &str) -> Result<LoginInfo> {
        let login = self.client.auth().login_password(username, password).await?;
        self.session.set_login(login.clone())?;
        Ok(login)
    }

    pub async fn send_phone_code(&self, mobile: &str) -> Result<()> {
        self.client.auth().send_phone_code(mobile).await?;
        Ok(())
    }

    pub async fn login_code(&self, mobile: &str, code: &str) -> Result<LoginInfo> {
        let login = self.client.auth().login_cellphone(mobile, code).await?;
        self.session.set_login(login.clone())?;
        Ok(login)
    }

    /// New QR key plus its rendered code
    pub async fn qr_begin(&self) -> Result<(String, QrCode)> {
        let auth = self.client.auth();
        let key = auth.qr_key().await?;
        let code = auth.qr_create(&key).await?;
        Ok((key, code))
    }

    pub async fn qr_wait(
        &self,
        key: &str,
        interval: Duration,
        max_polls: u32,
    ) -> Result<LoginInfo> {
        let login = self
            .client
            .auth()
            .poll_qr_login(key, interval, max_polls)
            .await?;
        self.session.set_login(login.clone())?;
        Ok(login)
    }

    pub async fn wx_begin(&self) -> Result<WxQrCode> {
        Ok(self.client.auth().wx_create().await?)
    }

    /// Wait for WeChat authorization and persist the resulting session
    pub async fn wx_wait(
        &self,
        uuid: &str,
        interval: Duration,
        max_polls: u32,
    ) -> Result<LoginInfo> {
        let login = self
            .client
            .auth()
            .poll_wx_login(uuid, interval, max_polls)
            .await?;
        self.session.set_login(login.clone())?;
        Ok(login)
    }

    pub async fn logout(&self) -> Result<()> {
        self.client.clear_token().await;
        self.session.logout()?;
        Ok(())
    }

    pub fn session(&self) -> Session {
        self.session.session()
    }

    // ===== Library =====

    /// Search tracks, optionally appending the results to the queue
    pub async fn search(
        &self,
        keywords: &str,
        page: u32,
        page_size: u32,
        enqueue: bool,
    ) -> Result<Vec<Track>> {
        let tracks = self
            .client
            .library()
            .search(keywords, page, page_size)
            .await?;
        if enqueue {
            let mut added = 0;
            for track in &tracks {
                if self.player.enqueue(track.clone()) {
                    added += 1;
                }
            }
            info!(added, "Queued search results");
            self.save()?;
        }
        Ok(tracks)
    }

    /// Replace the queue with a playlist page and start its first track
    pub async fn load_playlist(
        &self,
        playlist_id: &str,
        page: u32,
        page_size: u32,
    ) -> Result<SelectOutcome> {
        let tracks = self
            .client
            .library()
            .playlist_tracks(playlist_id, page, page_size)
            .await?;
        let outcome = self
            .player
            .load_playlist_page(playlist_id, page, page_size, tracks, None)
            .await;
        self.save()?;
        Ok(outcome)
    }

    /// Append the next playlist page to the queue
    pub async fn load_more(&self) -> Result<LoadMoreOutcome> {
        let outcome = self.player.load_more().await?;
        self.save()?;
        Ok(outcome)
    }

    // ===== Playback =====

    pub async fn play(&self, hash: &str) -> Result<SelectOutcome> {
        let outcome = self.player.select_and_resolve(hash).await;
        self.save()?;
        Ok(outcome)
    }

    pub async fn advance(&self, direction: Direction) -> Result<SelectOutcome> {
        let outcome = self.player.advance(direction).await;
        self.save()?;
        Ok(outcome)
    }

    pub fn cycle_mode(&self) -> Result<PlayMode> {
        let mode = self.player.cycle_play_mode();
        self.save()?;
        Ok(mode)
    }

    pub fn queue(&self) -> (Vec<Track>, Option<String>) {
        (self.player.queue(), self.player.position().active)
    }

    pub fn save(&self) -> Result<()> {
        self.player.save(self.store.as_ref())?;
        Ok(())
    }

    // ===== Theme =====

    /// Switch theme mode by name; returns whether it was accepted
    pub fn set_theme_mode(&self, mode: &str) -> Result<bool> {
        Ok(self.theme.set_mode(mode)?)
    }

    /// Derive the accent colour from a cover image URL
    pub async fn apply_cover(&self, url: &str) -> Result<Rgb> {
        let accent = self
            .theme
            .apply_cover_url(&self.extractor, &self.http, url)
            .await?;
        Ok(accent)
    }
}

/// Decode a `data:image/png;base64,...` URI (or bare base64) to bytes
pub fn decode_qr_image(data: &str) -> Result<Vec<u8>> {
    let payload = match data.split_once(',') {
        Some((header, payload)) if header.starts_with("data:") => payload,
        _ => data,
    };
    if payload.trim().is_empty() {
        return Err(CliError::QrImage("no image data".to_string()));
    }
    STANDARD
        .decode(payload.trim())
        .map_err(|e| CliError::QrImage(e.to_string()))
}
