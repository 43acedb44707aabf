use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Access/refresh token pair issued together by the authentication service.
///
/// The whole record is replaced on every refresh, so the two tokens and the
/// expiry are always consistent with each other.
///
/// # Security
///
/// The `Debug` implementation never prints token values.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

impl Credentials {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expires_at,
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    /// Expiry of the access token (UTC)
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Whether the access token is past its expiry at `now`.
    ///
    /// `leeway` pulls the effective expiry earlier; with a zero leeway the
    /// token is still usable at exactly `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>, leeway: chrono::Duration) -> bool {
        self.expires_at
            .checked_sub_signed(leeway)
            .map_or(true, |deadline| now > deadline)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// User attributes returned by a successful login.
///
/// Every attribute is optional: the service adds and omits fields over time
/// and unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub last_name: Option<String>,
    pub id: Option<i64>,
    pub display_name: Option<String>,
    pub middle_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Taxpayer identification number, used to build receipt URLs
    pub inn: Option<String>,
    pub snils: Option<String>,
    pub avatar_exists: Option<bool>,
    pub initial_registration_date: Option<String>,
    pub registration_date: Option<String>,
    pub first_receipt_register_time: Option<String>,
    pub first_receipt_cancel_time: Option<String>,
    pub hide_cancelled_receipt: Option<bool>,
    pub register_available: Option<String>,
    pub status: Option<String>,
    pub restricted_mode: Option<bool>,
    pub pfr_url: Option<String>,
    pub login: Option<String>,
}

impl Profile {
    /// Taxpayer identification number, if the service returned one
    pub fn tax_id(&self) -> Option<&str> {
        self.inn.as_deref().filter(|inn| !inn.is_empty())
    }
}

/// Outcome of a successful login: the token pair plus the user's profile.
#[derive(Debug, Clone)]
pub struct Session {
    pub credentials: Credentials,
    pub profile: Profile,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn expiry() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_credentials_expiry_boundary() {
        let creds = Credentials::new("a", "r", expiry());

        assert!(!creds.is_expired_at(expiry() - Duration::seconds(1), Duration::zero()));
        assert!(!creds.is_expired_at(expiry(), Duration::zero()));
        assert!(creds.is_expired_at(expiry() + Duration::milliseconds(1), Duration::zero()));
    }

    #[test]
    fn test_credentials_expiry_with_leeway() {
        let creds = Credentials::new("a", "r", expiry());
        let now = expiry() - Duration::seconds(10);

        assert!(!creds.is_expired_at(now, Duration::seconds(5)));
        assert!(creds.is_expired_at(now, Duration::seconds(30)));
    }

    #[test]
    fn test_credentials_debug_redacts_tokens() {
        let creds = Credentials::new("secret-access", "secret-refresh", expiry());
        let debug = format!("{:?}", creds);

        assert!(!debug.contains("secret-access"));
        assert!(!debug.contains("secret-refresh"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_profile_deserializes_partial_payload() {
        let profile: Profile = serde_json::from_value(serde_json::json!({
            "lastName": "Ivanov",
            "id": 1000001,
            "inn": "771234567890",
            "avatarExists": false,
            "registerAvailable": "true",
            "somethingNew": {"nested": 1}
        }))
        .unwrap();

        assert_eq!(profile.last_name.as_deref(), Some("Ivanov"));
        assert_eq!(profile.id, Some(1000001));
        assert_eq!(profile.tax_id(), Some("771234567890"));
        assert_eq!(profile.avatar_exists, Some(false));
        assert!(profile.email.is_none());
    }

    #[test]
    fn test_profile_empty_inn_is_not_a_tax_id() {
        let profile = Profile {
            inn: Some(String::new()),
            ..Profile::default()
        };
        assert_eq!(profile.tax_id(), None);
    }
}
