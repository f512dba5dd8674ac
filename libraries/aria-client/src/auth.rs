//! Authentication endpoints.

use crate::client::MusicServiceClient;
use crate::error::{Result, ServiceError};
use crate::types::{
    DataEnvelope, LoginData, QrCheckData, QrCode, QrKeyData, QrStatus, TokenData, WxCheckData,
    WxQrCode, WxStatus,
};
use aria_core::LoginInfo;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Authentication client.
///
/// Successful logins store the returned token on the parent client.
pub struct AuthClient<'a> {
    client: &'a MusicServiceClient,
}

/// Cache-busting timestamp sent with QR requests.
fn timestamp() -> String {
    chrono::Utc::now().timestamp_millis().to_string()
}

impl<'a> AuthClient<'a> {
    pub(crate) fn new(client: &'a MusicServiceClient) -> Self {
        Self { client }
    }

    /// Request an SMS verification code.
    pub async fn send_phone_code(&self, mobile: &str) -> Result<()> {
        debug!(mobile = %mobile, "Requesting phone code");
        let _: Value = self
            .client
            .get_json("/captcha/sent", &[("mobile", mobile.to_string())], "captcha response")
            .await?;
        Ok(())
    }

    /// Login with a phone number and SMS code.
    pub async fn login_cellphone(&self, mobile: &str, code: &str) -> Result<LoginInfo> {
        debug!(mobile = %mobile, "Attempting phone login");
        self.login(
            "/login/cellphone",
            &[("mobile", mobile.to_string()), ("code", code.to_string())],
        )
        .await
    }

    /// Login with username and password.
    pub async fn login_password(&self, username: &str, password: &str) -> Result<LoginInfo> {
        debug!(username = %username, "Attempting password login");
        self.login(
            "/login",
            &[
                ("username", username.to_string()),
                ("password", password.to_string()),
            ],
        )
        .await
    }

    /// Login with an open-platform (WeChat) authorization code.
    pub async fn login_openplat(&self, code: &str) -> Result<LoginInfo> {
        debug!("Attempting open-platform login");
        self.login("/login/openplat", &[("code", code.to_string())]).await
    }

    async fn login(&self, path: &str, query: &[(&str, String)]) -> Result<LoginInfo> {
        let envelope: DataEnvelope<LoginData> =
            self.client.get_json(path, query, "login response").await?;
        let login = LoginInfo::from(envelope.data);
        if login.token.is_empty() {
            warn!(path = %path, "Login response carried no token");
            return Err(ServiceError::ParseError("Login response carried no token".into()));
        }

        self.client.set_token(login.token.clone()).await;
        info!(user_id = %login.user_id, "Login successful");
        Ok(login)
    }

    // ===== QR login =====

    /// Generate a QR login key.
    pub async fn qr_key(&self) -> Result<String> {
        let envelope: DataEnvelope<QrKeyData> = self
            .client
            .get_json("/login/qr/key", &[("timestamp", timestamp())], "QR key")
            .await?;
        Ok(envelope.data.qrcode)
    }

    /// Render the QR code for a key (including a base64 PNG).
    pub async fn qr_create(&self, key: &str) -> Result<QrCode> {
        let envelope: DataEnvelope<QrCode> = self
            .client
            .get_json(
                "/login/qr/create",
                &[
                    ("key", key.to_string()),
                    ("qrimg", "true".to_string()),
                    ("timestamp", timestamp()),
                ],
                "QR code",
            )
            .await?;
        Ok(envelope.data)
    }

    /// Check the status of a QR key once.
    pub async fn qr_check(&self, key: &str) -> Result<QrStatus> {
        let envelope: DataEnvelope<QrCheckData> = self
            .client
            .get_json(
                "/login/qr/check",
                &[("key", key.to_string()), ("timestamp", timestamp())],
                "QR status",
            )
            .await?;
        Ok(envelope.data.into())
    }

    /// Poll a QR key until it is confirmed or expires.
    ///
    /// On confirmation the token is stored on the client.
    pub async fn poll_qr_login(
        &self,
        key: &str,
        interval: Duration,
        max_polls: u32,
    ) -> Result<LoginInfo> {
        for poll in 1..=max_polls {
            match self.qr_check(key).await? {
                QrStatus::Confirmed(login) => {
                    self.client.set_token(login.token.clone()).await;
                    info!(user_id = %login.user_id, "QR login confirmed");
                    return Ok(login);
                }
                QrStatus::Expired => {
                    warn!(poll, "QR code expired");
                    return Err(ServiceError::QrExpired);
                }
                status => debug!(poll, ?status, "Waiting for QR confirmation"),
            }

            if poll < max_polls {
                tokio::time::sleep(interval).await;
            }
        }

        Err(ServiceError::QrTimedOut { polls: max_polls })
    }

    // ===== WeChat QR login =====

    /// Generate a WeChat login QR code.
    pub async fn wx_create(&self) -> Result<WxQrCode> {
        let envelope: DataEnvelope<WxQrCode> = self
            .client
            .get_json("/login/wx/create", &[("timestamp", timestamp())], "WeChat QR code")
            .await?;
        if envelope.data.uuid.is_empty() {
            return Err(ServiceError::ParseError("WeChat QR code carried no uuid".into()));
        }
        Ok(envelope.data)
    }

    /// Check the status of a WeChat QR code once.
    pub async fn wx_check(&self, uuid: &str) -> Result<WxStatus> {
        let envelope: DataEnvelope<WxCheckData> = self
            .client
            .get_json(
                "/login/wx/check",
                &[("uuid", uuid.to_string()), ("timestamp", timestamp())],
                "WeChat QR status",
            )
            .await?;
        Ok(envelope.data.into())
    }

    /// Poll a WeChat QR code until authorized, then exchange the code.
    pub async fn poll_wx_login(
        &self,
        uuid: &str,
        interval: Duration,
        max_polls: u32,
    ) -> Result<LoginInfo> {
        for poll in 1..=max_polls {
            match self.wx_check(uuid).await? {
                WxStatus::Authorized(code) => {
                    debug!(poll, "WeChat login authorized");
                    return self.login_openplat(&code).await;
                }
                WxStatus::Expired => {
                    warn!(poll, "WeChat QR code expired");
                    return Err(ServiceError::QrExpired);
                }
                status => debug!(poll, ?status, "Waiting for WeChat authorization"),
            }

            if poll < max_polls {
                tokio::time::sleep(interval).await;
            }
        }

        Err(ServiceError::QrTimedOut { polls: max_polls })
    }

    // ===== Token refresh =====

    /// Exchange a stored token for a fresh one.
    ///
    /// The new token replaces the client's current token.
    pub async fn refresh_token(&self, token: &str, user_id: &str) -> Result<String> {
        debug!(user_id = %user_id, "Refreshing token");
        let envelope: DataEnvelope<TokenData> = self
            .client
            .get_json(
                "/login/token",
                &[("token", token.to_string()), ("userid", user_id.to_string())],
                "refresh response",
            )
            .await?;

        let fresh = envelope.data.token;
        if fresh.is_empty() {
            return Err(ServiceError::ParseError("Refresh response carried no token".into()));
        }
        self.client.set_token(fresh.clone()).await;
        debug!("Token refresh successful");
        Ok(fresh)
    }
}
