//! Login and token refresh calls against the authentication service.

use crate::credential_store::TokenRefresher;
use crate::device::DeviceId;
use crate::error::{AuthError, Result};
use crate::types::{Credentials, Profile, Session};
use async_trait::async_trait;
use bridge_traits::http::HttpResponse;
use chrono::{DateTime, Utc};
use core_runtime::config::ClientConfig;
use core_runtime::logging::redact_if_sensitive;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const LOGIN_PATH: &str = "/auth/lkfl";
const REFRESH_PATH: &str = "/auth/token";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeviceInfo<'a> {
    app_version: &'a str,
    source_type: &'a str,
    source_device_id: &'a str,
    meta_details: MetaDetails<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MetaDetails<'a> {
    user_agent: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
    device_info: DeviceInfo<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    device_info: DeviceInfo<'a>,
    refresh_token: &'a str,
}

/// Token answer shared by login and refresh.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    token: String,
    token_expire_in: DateTime<Utc>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    profile: Option<Profile>,
}

/// Client for the two authentication endpoints.
///
/// Requests are sent once; any non-2xx answer becomes
/// [`AuthError::AuthenticationFailed`] with the status and raw body.
#[derive(Debug, Clone)]
pub struct AuthApi {
    config: Arc<ClientConfig>,
    device_id: DeviceId,
}

impl AuthApi {
    pub fn new(config: Arc<ClientConfig>, device_id: DeviceId) -> Self {
        Self { config, device_id }
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    /// Log in with a username (phone number or INN) and password.
    ///
    /// # Errors
    ///
    /// - [`AuthError::AuthenticationFailed`] on a non-success status
    /// - [`AuthError::Transport`] if no response was received
    /// - [`AuthError::InvalidResponse`] if the answer lacks a refresh token
    ///   or cannot be parsed
    #[instrument(skip(self, username, password), fields(username = %redact_if_sensitive("username", username)))]
    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        let body = LoginRequest {
            username,
            password,
            device_info: self.device_info(),
        };

        let request = self
            .config
            .post(LOGIN_PATH, &self.config.referers.authentication)
            .json(&body)?;

        info!("Authenticating");
        let response = self.config.http_client.execute(request).await?;
        let token_response = Self::parse_token_response(&response, "authentication")?;

        let refresh_token = token_response.refresh_token.ok_or_else(|| {
            AuthError::InvalidResponse("authentication answer has no refresh token".to_string())
        })?;

        let profile = token_response.profile.unwrap_or_default();
        info!(
            expires_at = %token_response.token_expire_in,
            has_tax_id = profile.tax_id().is_some(),
            "Authenticated"
        );

        Ok(Session {
            credentials: Credentials::new(
                token_response.token,
                refresh_token,
                token_response.token_expire_in,
            ),
            profile,
        })
    }

    /// Exchange `refresh_token` for a new token pair.
    ///
    /// If the service does not rotate the refresh token, the current one is
    /// kept.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<Credentials> {
        let body = RefreshRequest {
            device_info: self.device_info(),
            refresh_token,
        };

        let request = self
            .config
            .post(REFRESH_PATH, &self.config.referers.refresh)
            .json(&body)?;

        debug!("Requesting new access token");
        let response = self.config.http_client.execute(request).await?;
        let token_response = Self::parse_token_response(&response, "token refresh")?;

        Ok(Credentials::new(
            token_response.token,
            token_response
                .refresh_token
                .unwrap_or_else(|| refresh_token.to_string()),
            token_response.token_expire_in,
        ))
    }

    fn device_info(&self) -> DeviceInfo<'_> {
        let info = &self.config.device_info;
        DeviceInfo {
            app_version: &info.app_version,
            source_type: &info.source_type,
            source_device_id: self.device_id.as_str(),
            meta_details: MetaDetails {
                user_agent: &info.user_agent,
            },
        }
    }

    fn parse_token_response(response: &HttpResponse, operation: &str) -> Result<TokenResponse> {
        if !response.is_success() {
            let body = response.text_lossy();
            warn!(status = response.status, operation, "Authentication service rejected the call");
            return Err(AuthError::AuthenticationFailed {
                status: response.status,
                body,
            });
        }

        response.json().map_err(|e| {
            AuthError::InvalidResponse(format!("failed to parse {} answer: {}", operation, e))
        })
    }
}

#[async_trait]
impl TokenRefresher for AuthApi {
    async fn refresh(&self, refresh_token: &str) -> Result<Credentials> {
        self.refresh_token(refresh_token).await
    }
}
