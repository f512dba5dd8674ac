//! Track resolution against the music service
//!
//! URL resolution is mandatory; lyric resolution is best-effort and never
//! fails the caller.

use crate::error::{PlaybackError, Result};
use aria_core::MusicService;
use tracing::{debug, warn};

/// Resolve the first usable URL (primary list, then fallback list)
pub async fn resolve_url(service: &dyn MusicService, hash: &str) -> Result<String> {
    let urls = service
        .song_url(hash)
        .await
        .map_err(|e| PlaybackError::Unavailable {
            hash: hash.to_string(),
            reason: e.to_string(),
        })?;

    urls.playable_url()
        .map(str::to_string)
        .ok_or_else(|| PlaybackError::Unavailable {
            hash: hash.to_string(),
            reason: "response carried no usable URL".to_string(),
        })
}

/// Fetch lyric text for the first candidate, swallowing any failure
pub async fn resolve_lyric(service: &dyn MusicService, hash: &str) -> Option<String> {
    let candidates = match service.search_lyric(hash).await {
        Ok(candidates) => candidates,
        Err(e) => {
            warn!(hash = %hash, error = %e, "Lyric search failed");
            return None;
        }
    };

    let Some(first) = candidates.first() else {
        debug!(hash = %hash, "No lyric candidates");
        return None;
    };

    match service.lyric(first).await {
        Ok(text) if !text.is_empty() => Some(text),
        Ok(_) => None,
        Err(e) => {
            warn!(hash = %hash, candidate = %first.id, error = %e, "Lyric fetch failed");
            None
        }
    }
}
