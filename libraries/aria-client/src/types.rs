//! Types for music service requests and responses.

use aria_core::{LoginInfo, LyricCandidate, SongUrl, Track};
use serde::{Deserialize, Deserializer};
use std::time::Duration;

/// Default backend address (the bundled API server listens locally).
pub const DEFAULT_BASE_URL: &str = "http://localhost:12345";

/// Configuration for connecting to the music service.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API (e.g., "http://localhost:12345")
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Health polls before a request is abandoned
    pub health_attempts: u32,
    /// Delay between health polls
    pub health_delay: Duration,
    /// Timeout for a single health poll
    pub health_timeout: Duration,
    /// Bearer token, if signed in
    pub token: Option<String>,
}

impl ClientConfig {
    /// Create a config with default timings.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
            health_attempts: 30,
            health_delay: Duration::from_secs(1),
            health_timeout: Duration::from_secs(1),
            token: None,
        }
    }

    /// Attach an existing token (e.g., restored from the session store).
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = (!token.is_empty()).then_some(token);
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

// =============================================================================
// Deserialization helpers
// =============================================================================

/// Accept either a string or a number and keep it as a string.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Str(s)) => s,
        Some(Raw::Int(n)) => n.to_string(),
        Some(Raw::Float(n)) => n.to_string(),
        None => String::new(),
    })
}

/// Accept a single string, a list of strings, or null.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::One(s)) => vec![s],
        Some(Raw::Many(v)) => v,
        None => Vec::new(),
    })
}

/// `{ "data": ... }` wrapper used by most endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct DataEnvelope<T> {
    pub data: T,
}

// =============================================================================
// Song / Lyric Types
// =============================================================================

/// Response from `/song/url`.
#[derive(Debug, Deserialize)]
pub(crate) struct SongUrlResponse {
    #[serde(default, deserialize_with = "one_or_many")]
    pub url: Vec<String>,
    #[serde(default, rename = "backupUrl", deserialize_with = "one_or_many")]
    pub backup_url: Vec<String>,
}

impl From<SongUrlResponse> for SongUrl {
    fn from(response: SongUrlResponse) -> Self {
        SongUrl {
            url: response.url,
            backup_url: response.backup_url,
        }
    }
}

/// Response from `/search/lyric`.
#[derive(Debug, Deserialize)]
pub(crate) struct LyricSearchResponse {
    #[serde(default)]
    pub candidates: Vec<LyricCandidateDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LyricCandidateDto {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub accesskey: String,
}

impl From<LyricCandidateDto> for LyricCandidate {
    fn from(dto: LyricCandidateDto) -> Self {
        LyricCandidate {
            id: dto.id,
            accesskey: dto.accesskey,
        }
    }
}

/// Response from `/lyric`.
#[derive(Debug, Deserialize)]
pub(crate) struct LyricResponse {
    #[serde(default, rename = "decodeContent")]
    pub decode_content: String,
}

// =============================================================================
// Library Types
// =============================================================================

/// Singer entry attached to playlist songs.
#[derive(Debug, Clone, Deserialize)]
pub struct SingerInfo {
    #[serde(default)]
    pub name: String,
}

/// A song as listed inside a playlist.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteSong {
    pub hash: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub singerinfo: Vec<SingerInfo>,
    #[serde(default)]
    pub cover: String,
}

/// Artist shown when a song has no singer info.
pub const UNKNOWN_ARTIST: &str = "Unknown artist";

impl RemoteSong {
    /// Convert into an unresolved queue track.
    pub fn into_track(self) -> Track {
        let artist = self
            .singerinfo
            .into_iter()
            .next()
            .map(|s| s.name)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| UNKNOWN_ARTIST.to_string());
        Track::new(self.hash, self.name, artist, self.cover)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlaylistSongs {
    #[serde(default)]
    pub songs: Vec<RemoteSong>,
}

/// A search hit from `/search`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchSong {
    #[serde(rename = "FileHash", alias = "hash")]
    pub hash: String,
    #[serde(default, rename = "SongName", alias = "name")]
    pub name: String,
    #[serde(default, rename = "SingerName", alias = "singername")]
    pub singer: String,
    #[serde(default, rename = "Image", alias = "cover")]
    pub cover: String,
}

impl SearchSong {
    pub fn into_track(self) -> Track {
        let artist = if self.singer.is_empty() {
            UNKNOWN_ARTIST.to_string()
        } else {
            self.singer
        };
        Track::new(self.hash, self.name, artist, self.cover)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResults {
    #[serde(default)]
    pub lists: Vec<SearchSong>,
}

/// Playlist summary from `/playlist/detail`.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistInfo {
    #[serde(
        rename = "global_collection_id",
        alias = "listid",
        alias = "id",
        deserialize_with = "string_or_number"
    )]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "pic", alias = "cover")]
    pub cover: String,
    #[serde(default)]
    pub count: u64,
}

/// Profile from `/user/detail`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    #[serde(default, rename = "userid", deserialize_with = "string_or_number")]
    pub user_id: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default, rename = "pic")]
    pub avatar: String,
}

// =============================================================================
// Authentication Types
// =============================================================================

/// Login payload shared by all sign-in endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct LoginData {
    pub token: String,
    #[serde(default, rename = "userid", deserialize_with = "string_or_number")]
    pub user_id: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default, rename = "pic")]
    pub avatar: String,
}

impl From<LoginData> for LoginInfo {
    fn from(data: LoginData) -> Self {
        LoginInfo {
            token: data.token,
            user_id: data.user_id,
            nickname: data.nickname,
            avatar: data.avatar,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct QrKeyData {
    pub qrcode: String,
}

/// A rendered login QR code.
#[derive(Debug, Clone, Deserialize)]
pub struct QrCode {
    /// URL encoded in the code
    #[serde(default)]
    pub url: String,
    /// PNG image as a `data:image/png;base64,...` URI, when requested
    #[serde(default)]
    pub base64: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QrCheckData {
    pub status: i64,
    #[serde(default)]
    pub token: String,
    #[serde(default, rename = "userid", deserialize_with = "string_or_number")]
    pub user_id: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default, rename = "pic")]
    pub avatar: String,
}

/// State of a QR login key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrStatus {
    /// Key expired; a new one must be generated
    Expired,
    /// Waiting for the code to be scanned
    Waiting,
    /// Scanned, waiting for confirmation on the phone
    Scanned,
    /// Confirmed; carries the login
    Confirmed(LoginInfo),
}

impl From<QrCheckData> for QrStatus {
    fn from(data: QrCheckData) -> Self {
        match data.status {
            0 => QrStatus::Expired,
            2 => QrStatus::Scanned,
            4 => QrStatus::Confirmed(LoginInfo {
                token: data.token,
                user_id: data.user_id,
                nickname: data.nickname,
                avatar: data.avatar,
            }),
            _ => QrStatus::Waiting,
        }
    }
}

/// WeChat QR login code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WxQrCode {
    /// Identifier polled with `/login/wx/check`
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub qrcode: WxQrImage,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WxQrImage {
    #[serde(default, rename = "qrcodeurl")]
    pub url: String,
    /// PNG image, bare base64 or a data URI
    #[serde(default, rename = "qrcodebase64")]
    pub base64: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WxCheckData {
    #[serde(default)]
    pub wx_errcode: i64,
    #[serde(default)]
    pub wx_code: String,
}

/// State of a WeChat QR login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WxStatus {
    /// Waiting for the code to be scanned
    Waiting,
    /// Scanned, waiting for confirmation in WeChat
    Scanned,
    /// Expired or cancelled; a new code must be generated
    Expired,
    /// Authorized; carries the code for `/login/openplat`
    Authorized(String),
}

impl From<WxCheckData> for WxStatus {
    fn from(data: WxCheckData) -> Self {
        match data.wx_errcode {
            405 if !data.wx_code.is_empty() => WxStatus::Authorized(data.wx_code),
            404 => WxStatus::Scanned,
            402 | 403 => WxStatus::Expired,
            _ => WxStatus::Waiting,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenData {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_song_url_accepts_single_string() {
        let response: SongUrlResponse =
            serde_json::from_value(json!({ "url": "https://x/a.mp3", "backupUrl": null }))
                .unwrap();
        assert_eq!(response.url, vec!["https://x/a.mp3"]);
        assert!(response.backup_url.is_empty());
    }

    #[test]
    fn test_song_url_missing_fields_are_empty() {
        let response: SongUrlResponse = serde_json::from_value(json!({ "status": 2 })).unwrap();
        let urls = SongUrl::from(response);
        assert!(urls.playable_url().is_none());
    }

    #[test]
    fn test_lyric_candidate_numeric_id() {
        let response: LyricSearchResponse = serde_json::from_value(json!({
            "candidates": [{ "id": 123456, "accesskey": "ABC" }]
        }))
        .unwrap();
        assert_eq!(response.candidates[0].id, "123456");
    }

    #[test]
    fn test_remote_song_without_singer_uses_placeholder() {
        let song: RemoteSong = serde_json::from_value(json!({
            "hash": "h1",
            "name": "Song",
            "singerinfo": [],
            "cover": "https://img/{size}/c.jpg"
        }))
        .unwrap();
        let track = song.into_track();
        assert_eq!(track.artist, UNKNOWN_ARTIST);
        assert_eq!(track.cover_at(64), "https://img/64/c.jpg");
    }

    #[test]
    fn test_qr_status_mapping() {
        let check = |status: i64| -> QrStatus {
            serde_json::from_value::<QrCheckData>(json!({ "status": status, "token": "t", "userid": 9 }))
                .unwrap()
                .into()
        };
        assert_eq!(check(0), QrStatus::Expired);
        assert_eq!(check(1), QrStatus::Waiting);
        assert_eq!(check(2), QrStatus::Scanned);
        assert!(matches!(check(4), QrStatus::Confirmed(info) if info.user_id == "9"));
    }

    #[test]
    fn test_wx_status_codes() {
        let check = |body: serde_json::Value| -> WxStatus {
            serde_json::from_value::<WxCheckData>(body).unwrap().into()
        };
        assert_eq!(check(json!({ "wx_errcode": 408 })), WxStatus::Waiting);
        assert_eq!(check(json!({ "wx_errcode": 404 })), WxStatus::Scanned);
        assert_eq!(check(json!({ "wx_errcode": 402 })), WxStatus::Expired);
        assert_eq!(
            check(json!({ "wx_errcode": 405, "wx_code": "c1" })),
            WxStatus::Authorized("c1".into())
        );
        assert_eq!(check(json!({ "wx_errcode": 405 })), WxStatus::Waiting);
        assert_eq!(check(json!({})), WxStatus::Waiting);
    }

    #[test]
    fn test_with_token_ignores_empty() {
        assert!(ClientConfig::default().with_token("").token.is_none());
        assert_eq!(
            ClientConfig::default().with_token("t").token.as_deref(),
            Some("t")
        );
    }
}
