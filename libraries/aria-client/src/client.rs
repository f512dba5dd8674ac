//! Main music service client.

use crate::auth::AuthClient;
use crate::error::{Result, ServiceError};
use crate::library::LibraryClient;
use crate::types::ClientConfig;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Client for the music service HTTP API.
///
/// Every request except `/health` is gated on the backend reporting healthy.
/// Once healthy, readiness is cached until a request fails to connect.
///
/// # Example
///
/// ```ignore
/// use aria_client::{ClientConfig, MusicServiceClient};
///
/// let client = MusicServiceClient::new(ClientConfig::new("http://localhost:12345"))?;
/// let login = client.auth().login_password("user", "secret").await?;
/// let urls = client.library().song_url("5F3A...").await?;
/// ```
pub struct MusicServiceClient {
    http: Client,
    base_url: String,
    config: ClientConfig,
    token: Arc<RwLock<Option<String>>>,
    ready: AtomicBool,
}

impl MusicServiceClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(ServiceError::InvalidUrl("URL cannot be empty".into()));
        }

        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ServiceError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }
        url::Url::parse(&base_url).map_err(|e| ServiceError::InvalidUrl(e.to_string()))?;

        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("AriaPlayer/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        let token = config.token.clone().filter(|t| !t.is_empty());

        Ok(Self {
            http,
            base_url,
            config,
            token: Arc::new(RwLock::new(token)),
            ready: AtomicBool::new(false),
        })
    }

    /// Normalized base URL (no trailing slash).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Authentication endpoints.
    pub fn auth(&self) -> AuthClient<'_> {
        AuthClient::new(self)
    }

    /// Song, lyric, playlist, search and user endpoints.
    pub fn library(&self) -> LibraryClient<'_> {
        LibraryClient::new(self)
    }

    // ===== Token =====

    /// Set the bearer token used for subsequent requests.
    pub async fn set_token(&self, token: impl Into<String>) {
        let token = token.into();
        *self.token.write().await = (!token.is_empty()).then_some(token);
    }

    /// Drop the bearer token.
    pub async fn clear_token(&self) {
        *self.token.write().await = None;
    }

    /// Current bearer token.
    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    // ===== Health =====

    /// Single health probe. Not gated.
    pub async fn health(&self) -> Result<()> {
        let url = format!("{}/health", self.base_url);

        let response = self
            .http
            .get(&url)
            .timeout(self.config.health_timeout)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ServiceError::Http {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            })
        }
    }

    /// Poll `/health` until it succeeds or attempts run out.
    pub async fn ensure_ready(&self) -> Result<()> {
        if self.ready.load(Ordering::Acquire) {
            return Ok(());
        }

        let attempts = self.config.health_attempts;
        for attempt in 1..=attempts {
            match self.health().await {
                Ok(()) => {
                    self.ready.store(true, Ordering::Release);
                    if attempt > 1 {
                        info!(attempt, "Backend became ready");
                    }
                    return Ok(());
                }
                Err(e) => {
                    debug!(attempt, error = %e, "Backend not ready yet");
                    if attempt < attempts {
                        tokio::time::sleep(self.config.health_delay).await;
                    }
                }
            }
        }

        warn!(attempts, url = %self.base_url, "Backend did not become ready");
        Err(ServiceError::BackendNotReady { attempts })
    }

    /// Whether readiness is currently cached.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    // ===== Requests =====

    /// Gated GET returning the parsed JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        what: &str,
    ) -> Result<T> {
        self.ensure_ready().await?;

        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, query = ?query, "Sending request");

        let mut request = self
            .http
            .get(&url)
            .query(query)
            .header(ACCEPT, "application/json");
        if let Some(token) = self.token.read().await.as_deref() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_connect() {
                self.ready.store(false, Ordering::Release);
            }
            classify_transport(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(url = %url, status = %status, "Request failed");
            return Err(ServiceError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ServiceError::ParseError(format!("Failed to parse {}: {}", what, e)))?;
        check_envelope(&body)?;

        serde_json::from_value(body)
            .map_err(|e| ServiceError::ParseError(format!("Failed to parse {}: {}", what, e)))
    }
}

fn classify_transport(e: reqwest::Error) -> ServiceError {
    if e.is_connect() {
        ServiceError::ConnectionRefused(e.to_string())
    } else if e.is_timeout() {
        ServiceError::Timeout(e.to_string())
    } else {
        ServiceError::Request(e)
    }
}

/// Reject bodies whose `code` field is set to anything but 200.
fn check_envelope(body: &Value) -> Result<()> {
    let Some(code) = body.get("code").and_then(Value::as_i64) else {
        return Ok(());
    };
    if code == 0 || code == 200 {
        return Ok(());
    }

    let message = body
        .get("message")
        .or_else(|| body.get("msg"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    warn!(code, message = %message, "API returned error code");
    Err(ServiceError::Api { code, message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_without_code_passes() {
        assert!(check_envelope(&json!({ "data": {} })).is_ok());
        assert!(check_envelope(&json!({ "code": 200 })).is_ok());
        assert!(check_envelope(&json!({ "code": 0 })).is_ok());
    }

    #[test]
    fn test_envelope_error_code_rejected() {
        let err = check_envelope(&json!({ "code": 502, "message": "upstream down" })).unwrap_err();
        match err {
            ServiceError::Api { code, message } => {
                assert_eq!(code, 502);
                assert_eq!(message, "upstream down");
            }
            other => panic!("Expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_bad_urls() {
        assert!(MusicServiceClient::new(ClientConfig::new("")).is_err());
        assert!(MusicServiceClient::new(ClientConfig::new("ftp://x")).is_err());
        assert!(MusicServiceClient::new(ClientConfig::new("localhost:12345")).is_err());
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = MusicServiceClient::new(ClientConfig::new("http://localhost:12345/")).unwrap();
        assert_eq!(client.base_url(), "http://localhost:12345");
        assert!(!client.is_ready());
    }
}
