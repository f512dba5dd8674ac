//! Domain types shared by the client, playback and storage crates

use serde::{Deserialize, Serialize};

/// Placeholder the music service leaves in cover-art URLs
pub const COVER_SIZE_PLACEHOLDER: &str = "{size}";

/// Cover size used for queue thumbnails
pub const DEFAULT_COVER_SIZE: u32 = 64;

/// A track in the playback queue
///
/// Created with `url` and `lyric` empty; both are filled in place once the
/// track has been resolved against the music service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Opaque content hash, unique within a queue
    pub hash: String,

    /// Display name
    pub name: String,

    /// Artist name
    pub artist: String,

    /// Cover-art URL (may contain a `{size}` placeholder)
    pub cover: String,

    /// Resolved playable URL
    #[serde(default)]
    pub url: Option<String>,

    /// Resolved lyric text (LRC)
    #[serde(default)]
    pub lyric: Option<String>,
}

impl Track {
    /// Create an unresolved track
    pub fn new(
        hash: impl Into<String>,
        name: impl Into<String>,
        artist: impl Into<String>,
        cover: impl Into<String>,
    ) -> Self {
        Self {
            hash: hash.into(),
            name: name.into(),
            artist: artist.into(),
            cover: cover.into(),
            url: None,
            lyric: None,
        }
    }

    /// Whether a playable URL is known
    pub fn is_resolved(&self) -> bool {
        self.url.as_deref().is_some_and(|u| !u.is_empty())
    }

    /// Cover URL with the size placeholder substituted
    pub fn cover_at(&self, size: u32) -> String {
        self.cover.replace(COVER_SIZE_PLACEHOLDER, &size.to_string())
    }
}

/// Candidate URLs for a track, as returned by the music service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongUrl {
    /// Primary URLs, ordered by preference
    #[serde(default)]
    pub url: Vec<String>,

    /// Fallback URLs, consulted only when no primary URL is usable
    #[serde(default, rename = "backupUrl")]
    pub backup_url: Vec<String>,
}

impl SongUrl {
    /// First usable URL: primary entries first, then fallback entries
    pub fn playable_url(&self) -> Option<&str> {
        self.url
            .iter()
            .chain(self.backup_url.iter())
            .map(|u| u.trim())
            .find(|u| !u.is_empty())
    }
}

/// A lyric search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricCandidate {
    pub id: String,
    pub accesskey: String,
}

/// Profile fields returned by a successful login
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginInfo {
    pub token: String,
    pub user_id: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub avatar: String,
}

/// Persisted authentication state
///
/// An empty string means the field is unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub avatar: String,
}

impl Session {
    /// Whether a token is present
    pub fn is_authenticated(&self) -> bool {
        !self.token.is_empty()
    }
}

impl From<LoginInfo> for Session {
    fn from(info: LoginInfo) -> Self {
        Self {
            token: info.token,
            user_id: info.user_id,
            nickname: info.nickname,
            avatar: info.avatar,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_track_is_unresolved() {
        let track = Track::new("h1", "Song", "Artist", "https://img/{size}/a.jpg");
        assert!(!track.is_resolved());
        assert!(track.lyric.is_none());
    }

    #[test]
    fn test_empty_url_is_not_resolved() {
        let mut track = Track::new("h1", "Song", "Artist", "");
        track.url = Some(String::new());
        assert!(!track.is_resolved());
    }

    #[test]
    fn test_cover_at_replaces_placeholder() {
        let track = Track::new("h1", "Song", "Artist", "https://img/{size}/a.jpg");
        assert_eq!(track.cover_at(DEFAULT_COVER_SIZE), "https://img/64/a.jpg");
    }

    #[test]
    fn test_playable_url_prefers_primary() {
        let urls = SongUrl {
            url: vec!["https://x/a.mp3".into()],
            backup_url: vec!["https://x/b.mp3".into()],
        };
        assert_eq!(urls.playable_url(), Some("https://x/a.mp3"));
    }

    #[test]
    fn test_playable_url_falls_back() {
        let urls = SongUrl {
            url: vec![String::new()],
            backup_url: vec!["https://x/b.mp3".into()],
        };
        assert_eq!(urls.playable_url(), Some("https://x/b.mp3"));
    }

    #[test]
    fn test_playable_url_none_when_both_empty() {
        assert_eq!(SongUrl::default().playable_url(), None);
    }

    #[test]
    fn test_session_from_login() {
        let session = Session::from(LoginInfo {
            token: "t".into(),
            user_id: "42".into(),
            nickname: "n".into(),
            avatar: String::new(),
        });
        assert!(session.is_authenticated());
        assert_eq!(session.user_id, "42");
        assert!(!Session::default().is_authenticated());
    }
}
