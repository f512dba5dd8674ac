//! Error types for the music service client.

use aria_core::CoreError;
use thiserror::Error;

/// Errors that can occur when talking to the music service.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// HTTP request failed for a reason other than connect/timeout
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Server error ({status}): {message}")]
    Http { status: u16, message: String },

    /// Body carried an application error code
    #[error("API error ({code}): {message}")]
    Api { code: i64, message: String },

    /// Connection refused or host unreachable
    #[error("Connection refused: {0}")]
    ConnectionRefused(String),

    /// Request timed out
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Health endpoint never reported ready
    #[error("Backend not ready after {attempts} attempts")]
    BackendNotReady { attempts: u32 },

    /// Operation needs a token and none is set
    #[error("Authentication required")]
    AuthRequired,

    /// QR login key expired before it was confirmed
    #[error("QR code expired")]
    QrExpired,

    /// QR login was not confirmed within the allowed number of polls
    #[error("QR login not confirmed after {polls} polls")]
    QrTimedOut { polls: u32 },

    /// Invalid base URL
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse server response
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

/// Coarse classification used for user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    ServerError,
    BadGateway,
    Http(u16),
    Api,
    ConnectionRefused,
    Timeout,
    Network,
    BackendNotReady,
    QrLogin,
    InvalidUrl,
    Parse,
}

impl ServiceError {
    /// Classify by status code or transport category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Http { status, .. } => match status {
                400 => ErrorKind::BadRequest,
                401 => ErrorKind::Unauthorized,
                403 => ErrorKind::Forbidden,
                404 => ErrorKind::NotFound,
                500 => ErrorKind::ServerError,
                502 => ErrorKind::BadGateway,
                other => ErrorKind::Http(*other),
            },
            Self::Api { .. } => ErrorKind::Api,
            Self::AuthRequired => ErrorKind::Unauthorized,
            Self::ConnectionRefused(_) => ErrorKind::ConnectionRefused,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Request(e) if e.is_timeout() => ErrorKind::Timeout,
            Self::Request(e) if e.is_connect() => ErrorKind::ConnectionRefused,
            Self::Request(e) if e.is_decode() => ErrorKind::Parse,
            Self::Request(_) => ErrorKind::Network,
            Self::BackendNotReady { .. } => ErrorKind::BackendNotReady,
            Self::QrExpired | Self::QrTimedOut { .. } => ErrorKind::QrLogin,
            Self::InvalidUrl(_) => ErrorKind::InvalidUrl,
            Self::ParseError(_) => ErrorKind::Parse,
        }
    }

    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::BadRequest => "Invalid request parameters".to_string(),
            ErrorKind::Unauthorized => "Not authorized, please log in".to_string(),
            ErrorKind::Forbidden => "Access denied".to_string(),
            ErrorKind::NotFound => "Requested resource does not exist".to_string(),
            ErrorKind::ServerError => "Internal server error".to_string(),
            ErrorKind::BadGateway => "Gateway error, please check the backend service".to_string(),
            ErrorKind::Http(status) => format!("Request failed with status {status}"),
            ErrorKind::Api => match self {
                Self::Api { message, .. } if !message.is_empty() => message.clone(),
                _ => "Error".to_string(),
            },
            ErrorKind::ConnectionRefused => {
                "Waiting for the backend to start, or the connection was refused".to_string()
            }
            ErrorKind::Timeout => {
                "Request timed out, please check the network or try again later".to_string()
            }
            ErrorKind::Network => "Network error, please check the connection".to_string(),
            ErrorKind::BackendNotReady => {
                "Backend service is not ready, please try again later".to_string()
            }
            ErrorKind::QrLogin => "QR code expired, please request a new one".to_string(),
            ErrorKind::InvalidUrl => "Request configuration error".to_string(),
            ErrorKind::Parse => "Unexpected response from the server".to_string(),
        }
    }
}

impl From<ServiceError> for CoreError {
    fn from(err: ServiceError) -> Self {
        CoreError::service(err.to_string())
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16) -> ServiceError {
        ServiceError::Http {
            status,
            message: String::new(),
        }
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(http(400).kind(), ErrorKind::BadRequest);
        assert_eq!(http(401).kind(), ErrorKind::Unauthorized);
        assert_eq!(http(403).kind(), ErrorKind::Forbidden);
        assert_eq!(http(404).kind(), ErrorKind::NotFound);
        assert_eq!(http(500).kind(), ErrorKind::ServerError);
        assert_eq!(http(502).kind(), ErrorKind::BadGateway);
        assert_eq!(http(418).kind(), ErrorKind::Http(418));
    }

    #[test]
    fn test_api_message_passes_through() {
        let err = ServiceError::Api {
            code: 20010,
            message: "Song not available".into(),
        };
        assert_eq!(err.user_message(), "Song not available");

        let err = ServiceError::Api {
            code: 20010,
            message: String::new(),
        };
        assert_eq!(err.user_message(), "Error");
    }

    #[test]
    fn test_transport_messages() {
        assert!(ServiceError::ConnectionRefused("x".into())
            .user_message()
            .contains("Waiting for the backend"));
        assert!(ServiceError::Timeout("x".into())
            .user_message()
            .contains("timed out"));
        assert_eq!(
            ServiceError::BackendNotReady { attempts: 30 }.kind(),
            ErrorKind::BackendNotReady
        );
    }

    #[test]
    fn test_converts_into_core_error() {
        let core: CoreError = http(404).into();
        assert!(matches!(core, CoreError::Service(msg) if msg.contains("404")));
    }
}
