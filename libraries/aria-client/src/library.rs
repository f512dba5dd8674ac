//! Song, lyric, playlist, search and user endpoints.

use crate::client::MusicServiceClient;
use crate::error::{Result, ServiceError};
use crate::types::{
    DataEnvelope, LyricResponse, LyricSearchResponse, PlaylistInfo, PlaylistSongs, SearchResults,
    SongUrlResponse, UserProfile,
};
use aria_core::{LyricCandidate, SongUrl, Track};
use serde_json::Value;
use tracing::debug;

/// Library client.
pub struct LibraryClient<'a> {
    client: &'a MusicServiceClient,
}

impl<'a> LibraryClient<'a> {
    pub(crate) fn new(client: &'a MusicServiceClient) -> Self {
        Self { client }
    }

    /// Candidate playable URLs for a track.
    pub async fn song_url(&self, hash: &str) -> Result<SongUrl> {
        let response: SongUrlResponse = self
            .client
            .get_json("/song/url", &[("hash", hash.to_string())], "song URL")
            .await?;
        let urls = SongUrl::from(response);
        debug!(
            hash = %hash,
            primary = urls.url.len(),
            fallback = urls.backup_url.len(),
            "Resolved song URLs"
        );
        Ok(urls)
    }

    /// Lyric candidates for a track.
    pub async fn search_lyric(&self, hash: &str) -> Result<Vec<LyricCandidate>> {
        let response: LyricSearchResponse = self
            .client
            .get_json(
                "/search/lyric",
                &[("hash", hash.to_string()), ("man", "yes".to_string())],
                "lyric search",
            )
            .await?;
        Ok(response.candidates.into_iter().map(Into::into).collect())
    }

    /// Decoded LRC text for a lyric candidate.
    pub async fn lyric(&self, id: &str, accesskey: &str) -> Result<String> {
        let response: LyricResponse = self
            .client
            .get_json(
                "/lyric",
                &[
                    ("id", id.to_string()),
                    ("accesskey", accesskey.to_string()),
                    ("fmt", "lrc".to_string()),
                    ("decode", "true".to_string()),
                ],
                "lyric",
            )
            .await?;
        Ok(response.decode_content)
    }

    /// Track privilege/metadata, returned as-is.
    pub async fn music_detail(&self, hash: &str) -> Result<Value> {
        self.client
            .get_json("/privilege/lite", &[("hash", hash.to_string())], "music detail")
            .await
    }

    /// Search tracks by keyword.
    pub async fn search(&self, keywords: &str, page: u32, page_size: u32) -> Result<Vec<Track>> {
        let envelope: DataEnvelope<SearchResults> = self
            .client
            .get_json(
                "/search",
                &[
                    ("keywords", keywords.to_string()),
                    ("page", page.to_string()),
                    ("pagesize", page_size.to_string()),
                ],
                "search results",
            )
            .await?;
        Ok(envelope
            .data
            .lists
            .into_iter()
            .map(|song| song.into_track())
            .collect())
    }

    /// Playlist summaries for a comma-separated id list.
    pub async fn playlist_detail(&self, ids: &str) -> Result<Vec<PlaylistInfo>> {
        let envelope: DataEnvelope<Vec<PlaylistInfo>> = self
            .client
            .get_json("/playlist/detail", &[("ids", ids.to_string())], "playlist detail")
            .await?;
        Ok(envelope.data)
    }

    /// One page of a playlist's tracks (pages start at 1).
    pub async fn playlist_tracks(
        &self,
        playlist_id: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Track>> {
        let envelope: DataEnvelope<PlaylistSongs> = self
            .client
            .get_json(
                "/playlist/track/all",
                &[
                    ("id", playlist_id.to_string()),
                    ("page", page.to_string()),
                    ("pagesize", page_size.to_string()),
                ],
                "playlist tracks",
            )
            .await?;
        debug!(
            playlist_id = %playlist_id,
            page,
            count = envelope.data.songs.len(),
            "Fetched playlist page"
        );
        Ok(envelope
            .data
            .songs
            .into_iter()
            .map(|song| song.into_track())
            .collect())
    }

    /// Profile of the signed-in user.
    pub async fn user_detail(&self) -> Result<UserProfile> {
        if !self.client.is_authenticated().await {
            return Err(ServiceError::AuthRequired);
        }
        let envelope: DataEnvelope<UserProfile> =
            self.client.get_json("/user/detail", &[], "user detail").await?;
        Ok(envelope.data)
    }
}
