//! [`MusicService`] implementation consumed by the playback layer.

use crate::client::MusicServiceClient;
use aria_core::{LyricCandidate, MusicService, SongUrl, Track};
use async_trait::async_trait;

#[async_trait]
impl MusicService for MusicServiceClient {
    async fn song_url(&self, hash: &str) -> aria_core::Result<SongUrl> {
        Ok(self.library().song_url(hash).await?)
    }

    async fn search_lyric(&self, hash: &str) -> aria_core::Result<Vec<LyricCandidate>> {
        Ok(self.library().search_lyric(hash).await?)
    }

    async fn lyric(&self, candidate: &LyricCandidate) -> aria_core::Result<String> {
        Ok(self
            .library()
            .lyric(&candidate.id, &candidate.accesskey)
            .await?)
    }

    async fn playlist_tracks(
        &self,
        playlist_id: &str,
        page: u32,
        page_size: u32,
    ) -> aria_core::Result<Vec<Track>> {
        Ok(self
            .library()
            .playlist_tracks(playlist_id, page, page_size)
            .await?)
    }
}
