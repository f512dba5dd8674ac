/// CLI configuration
use crate::error::{CliError, Result};
use aria_client::{ClientConfig, DEFAULT_BASE_URL};
use aria_playback::PlaybackConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file read from the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "aria.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default = "default_api")]
    pub api: ApiSettings,

    #[serde(default = "default_storage")]
    pub storage: StorageSettings,

    #[serde(default = "default_playback")]
    pub playback: PlaybackSettings,

    #[serde(default = "default_log")]
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Health probes before a request is abandoned
    #[serde(default = "default_health_attempts")]
    pub health_attempts: u32,

    #[serde(default = "default_health_delay_ms")]
    pub health_delay_ms: u64,

    #[serde(default = "default_health_timeout_ms")]
    pub health_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    /// Directory holding session, theme and playback documents
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackSettings {
    #[serde(default = "default_volume")]
    pub volume: f32,

    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogSettings {
    /// Used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl AppConfig {
    /// Load from `path` (or `aria.toml` if present) and `ARIA_*` variables
    ///
    /// Nested keys use a double underscore: `ARIA_API__BASE_URL`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) if !path.exists() => {
                return Err(CliError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            Some(path) => {
                settings = settings.add_source(config::File::from(path));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("ARIA")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(CliError::Config(
                "API base URL is required (set ARIA_API__BASE_URL)".to_string(),
            ));
        }

        if self.api.health_attempts == 0 {
            return Err(CliError::Config(
                "api.health_attempts must be at least 1".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.playback.volume) {
            return Err(CliError::Config(format!(
                "playback.volume must be within 0.0-1.0, got {}",
                self.playback.volume
            )));
        }

        if self.playback.page_size == 0 {
            return Err(CliError::Config(
                "playback.page_size must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Client settings, carrying `token` when one is stored
    pub fn client_config(&self, token: Option<String>) -> ClientConfig {
        let config = ClientConfig {
            base_url: self.api.base_url.clone(),
            timeout: Duration::from_secs(self.api.timeout_secs),
            health_attempts: self.api.health_attempts,
            health_delay: Duration::from_millis(self.api.health_delay_ms),
            health_timeout: Duration::from_millis(self.api.health_timeout_ms),
            token: None,
        };
        match token {
            Some(token) => config.with_token(token),
            None => config,
        }
    }

    pub fn playback_config(&self) -> PlaybackConfig {
        PlaybackConfig {
            volume: self.playback.volume,
            page_size: self.playback.page_size,
            ..PlaybackConfig::default()
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: default_api(),
            storage: default_storage(),
            playback: default_playback(),
            log: default_log(),
        }
    }
}

// Default values
fn default_api() -> ApiSettings {
    ApiSettings {
        base_url: default_base_url(),
        timeout_secs: default_timeout_secs(),
        health_attempts: default_health_attempts(),
        health_delay_ms: default_health_delay_ms(),
        health_timeout_ms: default_health_timeout_ms(),
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_health_attempts() -> u32 {
    30
}

fn default_health_delay_ms() -> u64 {
    1000
}

fn default_health_timeout_ms() -> u64 {
    1000
}

fn default_storage() -> StorageSettings {
    StorageSettings {
        data_dir: default_data_dir(),
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_playback() -> PlaybackSettings {
    PlaybackSettings {
        volume: default_volume(),
        page_size: default_page_size(),
    }
}

fn default_volume() -> f32 {
    0.7
}

fn default_page_size() -> u32 {
    20
}

fn default_log() -> LogSettings {
    LogSettings {
        filter: default_log_filter(),
    }
}

fn default_log_filter() -> String {
    "aria=info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.playback.volume, 0.7);
        assert_eq!(config.playback.page_size, 20);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[api]\nbase_url = \"http://music.local:3000\"\nhealth_attempts = 5\n\n[playback]\nvolume = 0.4"
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.api.base_url, "http://music.local:3000");
        assert_eq!(config.api.health_attempts, 5);
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.playback.volume, 0.4);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = AppConfig::load(Some(Path::new("/nonexistent/aria.toml"))).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let mut config = AppConfig::default();
        config.api.health_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_base_url() {
        let mut config = AppConfig::default();
        config.api.base_url = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_client_config_carries_token() {
        let config = AppConfig::default();
        let client = config.client_config(Some("tok".into()));
        assert_eq!(client.token.as_deref(), Some("tok"));
        assert_eq!(client.health_attempts, 30);
        assert_eq!(client.health_delay, Duration::from_secs(1));
    }
}
