//! # Client Configuration Module
//!
//! Provides configuration management for the income-registration client.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! `ClientConfig` instance that holds every endpoint, header value, timeout
//! and injected bridge the client needs. Every value has a default matching
//! the public service, and every value can be overridden. The builder
//! validates eagerly so a misconfigured client fails at construction instead
//! of on its first request.
//!
//! ## Injected Dependencies
//!
//! - `HttpClient` - HTTP transport (desktop default: reqwest, via `desktop-shims`)
//! - `Clock` - time source for expiry checks and timestamps (default: `SystemClock`)
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::ClientConfig;
//! use std::time::Duration;
//!
//! let config = ClientConfig::builder()
//!     .device_id_prefix("srv")
//!     .zone_offset("+03:00")
//!     .connect_timeout(Duration::from_secs(10))
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! Invalid values produce [`Error::Config`] with an actionable message. A
//! missing transport without the `desktop-shims` feature produces
//! [`Error::CapabilityMissing`].

use crate::error::{Error, Result};
use bridge_traits::{Clock, HttpClient, HttpRequest, SystemClock};
use chrono::FixedOffset;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Base path of the public API
pub const DEFAULT_API_PATH: &str = "https://lknpd.nalog.ru/api/v1";

/// `Accept` header sent with every request
pub const ACCEPT_HEADER_VALUE: &str = "application/json, text/plain, */*";

/// Connection timeout applied to every request
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(4);

pub const DEFAULT_REFERER_HEADER: &str = "Referer";

pub const DEFAULT_ACCEPT_LANGUAGE: &str = "ru,en;q=0.9";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0";

/// Largest offset accepted for receipt timestamps (±18:00)
const MAX_OFFSET_SECONDS: i32 = 18 * 3600;

/// Referer values sent with each call type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefererConfig {
    /// Sent with the username/password login call
    pub authentication: String,
    /// Sent with the token refresh call
    pub refresh: String,
    /// Sent with the income submission call
    pub income: String,
}

impl Default for RefererConfig {
    fn default() -> Self {
        Self {
            authentication: "https://lknpd.nalog.ru/auth/login".to_string(),
            refresh: "https://lknpd.nalog.ru/sales".to_string(),
            income: "https://lknpd.nalog.ru/sales/create".to_string(),
        }
    }
}

/// Metadata describing this client instance in login and refresh payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfoConfig {
    pub app_version: String,
    pub source_type: String,
    pub user_agent: String,
}

impl Default for DeviceInfoConfig {
    fn default() -> Self {
        Self {
            app_version: "1.0.0".to_string(),
            source_type: "WEB".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Configuration for the income-registration client.
///
/// Use [`ClientConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct ClientConfig {
    /// Base API path, without a trailing slash
    pub api_path: String,

    /// Prefix of the generated device identifier
    pub device_id_prefix: String,

    /// Offset used to render operation/request timestamps
    pub zone_offset: FixedOffset,

    /// Name of the header carrying the referer value
    pub referer_header: String,

    /// Referer values per call type
    pub referers: RefererConfig,

    /// `Accept-Language` header value
    pub accept_language: String,

    /// Connection-level timeout; the only timeout the client applies
    pub connect_timeout: Duration,

    /// A token is treated as expired once `now + leeway` passes its expiry
    pub token_refresh_leeway: Duration,

    /// Device metadata embedded in authentication payloads
    pub device_info: DeviceInfoConfig,

    /// HTTP transport
    pub http_client: Arc<dyn HttpClient>,

    /// Time source
    pub clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_path", &self.api_path)
            .field("device_id_prefix", &self.device_id_prefix)
            .field("zone_offset", &self.zone_offset)
            .field("referer_header", &self.referer_header)
            .field("referers", &self.referers)
            .field("accept_language", &self.accept_language)
            .field("connect_timeout", &self.connect_timeout)
            .field("token_refresh_leeway", &self.token_refresh_leeway)
            .field("device_info", &self.device_info)
            .field("http_client", &"HttpClient { ... }")
            .field("clock", &"Clock { ... }")
            .finish()
    }
}

impl ClientConfig {
    /// Creates a new builder for constructing a `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Joins a service path (e.g. `/auth/token`) onto the base API path.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_path, path.trim_start_matches('/'))
    }

    /// Starts a `POST` to `path` carrying the headers shared by every call:
    /// `Accept`, `Accept-Language` and the referer for this call type.
    pub fn post(&self, path: &str, referer: &str) -> HttpRequest {
        HttpRequest::post(self.endpoint(path))
            .header("Accept", ACCEPT_HEADER_VALUE)
            .header("Accept-Language", self.accept_language.as_str())
            .header(self.referer_header.as_str(), referer)
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - The API path is an absolute http(s) URL
    /// - Header names and values are not empty
    /// - The connection timeout is greater than zero
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.api_path)
            .map_err(|e| Error::Config(format!("Invalid API path '{}': {}", self.api_path, e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "API path must use http or https, got '{}'",
                url.scheme()
            )));
        }

        if self.referer_header.trim().is_empty() {
            return Err(Error::Config(
                "Referer header name cannot be empty".to_string(),
            ));
        }

        if self.accept_language.trim().is_empty() {
            return Err(Error::Config(
                "Accept-Language value cannot be empty".to_string(),
            ));
        }

        if self.connect_timeout.is_zero() {
            return Err(Error::Config(
                "Connect timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Parses a UTC offset such as `Z`, `+3`, `+03`, `+0300` or `-03:30`.
pub fn parse_zone_offset(value: &str) -> Result<FixedOffset> {
    let invalid = || {
        Error::Config(format!(
            "Invalid zone offset '{}': expected 'Z', '+HH', '+HHMM' or '+HH:MM'",
            value
        ))
    };

    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let (sign, digits) = if let Some(rest) = trimmed.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = trimmed.strip_prefix('-') {
        (-1, rest)
    } else {
        return Err(invalid());
    };

    if !digits.bytes().all(|b| b.is_ascii_digit() || b == b':') {
        return Err(invalid());
    }

    let (hours, minutes) = match digits.len() {
        1 | 2 => (digits, "0"),
        4 => digits.split_at(2),
        5 if digits.as_bytes()[2] == b':' => (&digits[..2], &digits[3..]),
        _ => return Err(invalid()),
    };

    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    let total = hours * 3600 + minutes * 60;

    if minutes > 59 || total > MAX_OFFSET_SECONDS {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * total).ok_or_else(invalid)
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(connect_timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::with_connect_timeout(connect_timeout).map_err(|e| {
        Error::Internal(format!("Failed to initialize default HttpClient: {}", e))
    })?;
    let client: Arc<dyn HttpClient> = Arc::new(client);
    Ok(client)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(_connect_timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    Err(Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required for every remote call. \
                 Desktop: enable the 'desktop-shims' feature to use the default ReqwestHttpClient. \
                 Otherwise: inject an implementation with .http_client()."
            .to_string(),
    })
}

/// Builder for constructing [`ClientConfig`] instances.
///
/// Unset values fall back to the service defaults when
/// [`build()`](ClientConfigBuilder::build) is called.
#[derive(Default)]
pub struct ClientConfigBuilder {
    api_path: Option<String>,
    device_id_prefix: Option<String>,
    zone_offset: Option<String>,
    referer_header: Option<String>,
    referers: RefererConfig,
    accept_language: Option<String>,
    connect_timeout: Option<Duration>,
    token_refresh_leeway: Option<Duration>,
    device_info: Option<DeviceInfoConfig>,
    http_client: Option<Arc<dyn HttpClient>>,
    clock: Option<Arc<dyn Clock>>,
}

impl ClientConfigBuilder {
    /// Sets the base API path (default: `https://lknpd.nalog.ru/api/v1`).
    pub fn api_path(mut self, path: impl Into<String>) -> Self {
        self.api_path = Some(path.into());
        self
    }

    /// Sets the device identifier prefix (default: empty).
    pub fn device_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.device_id_prefix = Some(prefix.into());
        self
    }

    /// Sets the UTC offset used for timestamps (default: `Z`).
    pub fn zone_offset(mut self, offset: impl Into<String>) -> Self {
        self.zone_offset = Some(offset.into());
        self
    }

    /// Sets the name of the referer header (default: `Referer`).
    pub fn referer_header(mut self, name: impl Into<String>) -> Self {
        self.referer_header = Some(name.into());
        self
    }

    pub fn authentication_referer(mut self, value: impl Into<String>) -> Self {
        self.referers.authentication = value.into();
        self
    }

    pub fn refresh_referer(mut self, value: impl Into<String>) -> Self {
        self.referers.refresh = value.into();
        self
    }

    pub fn income_referer(mut self, value: impl Into<String>) -> Self {
        self.referers.income = value.into();
        self
    }

    /// Replaces all referer values at once.
    pub fn referers(mut self, referers: RefererConfig) -> Self {
        self.referers = referers;
        self
    }

    pub fn accept_language(mut self, value: impl Into<String>) -> Self {
        self.accept_language = Some(value.into());
        self
    }

    /// Sets the connection timeout (default: 4 seconds).
    ///
    /// Only used to build the default transport; an injected `HttpClient`
    /// is responsible for its own timeouts.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Treat tokens as expired this long before their stated expiry (default: 0).
    pub fn token_refresh_leeway(mut self, leeway: Duration) -> Self {
        self.token_refresh_leeway = Some(leeway);
        self
    }

    pub fn device_info(mut self, info: DeviceInfoConfig) -> Self {
        self.device_info = Some(info);
        self
    }

    /// Injects the HTTP transport.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Injects the time source.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Builds the final `ClientConfig` instance.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if a value fails validation
    /// - [`Error::CapabilityMissing`] if no transport is injected and no
    ///   platform default is available
    pub fn build(self) -> Result<ClientConfig> {
        let api_path = self
            .api_path
            .unwrap_or_else(|| DEFAULT_API_PATH.to_string())
            .trim_end_matches('/')
            .to_string();

        let zone_offset = match self.zone_offset {
            Some(offset) => parse_zone_offset(&offset)?,
            None => parse_zone_offset("Z")?,
        };

        let connect_timeout = self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT);

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client(connect_timeout)?,
        };

        let config = ClientConfig {
            api_path,
            device_id_prefix: self.device_id_prefix.unwrap_or_default(),
            zone_offset,
            referer_header: self
                .referer_header
                .unwrap_or_else(|| DEFAULT_REFERER_HEADER.to_string()),
            referers: self.referers,
            accept_language: self
                .accept_language
                .unwrap_or_else(|| DEFAULT_ACCEPT_LANGUAGE.to_string()),
            connect_timeout,
            token_refresh_leeway: self.token_refresh_leeway.unwrap_or(Duration::ZERO),
            device_info: self.device_info.unwrap_or_default(),
            http_client,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
        };

        config.validate()?;

        Ok(config)
    }
}
