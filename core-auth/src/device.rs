//! Client-instance fingerprint sent with every login and refresh call.

use crate::error::{AuthError, Result};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::fmt;

/// Length of every generated device identifier.
pub const DEVICE_ID_LENGTH: usize = 21;

/// Opaque, fixed-length identifier of a client instance.
///
/// Generated once per client and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceId(String);

impl DeviceId {
    /// Generate an identifier starting with `prefix`, padded to
    /// [`DEVICE_ID_LENGTH`] characters with random `[A-Za-z0-9]` characters.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidArgument`] when the prefix is longer than
    /// [`DEVICE_ID_LENGTH`].
    ///
    /// # Examples
    ///
    /// ```
    /// use core_auth::DeviceId;
    ///
    /// let id = DeviceId::generate("web").unwrap();
    /// assert_eq!(id.as_str().len(), 21);
    /// assert!(id.as_str().starts_with("web"));
    /// ```
    pub fn generate(prefix: &str) -> Result<Self> {
        let prefix_len = prefix.chars().count();
        if prefix_len > DEVICE_ID_LENGTH {
            return Err(AuthError::InvalidArgument(format!(
                "device id prefix is {} characters long, maximum is {}",
                prefix_len, DEVICE_ID_LENGTH
            )));
        }

        // ThreadRng is a CSPRNG reseeded from the OS
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(DEVICE_ID_LENGTH - prefix_len)
            .map(char::from)
            .collect();

        Ok(Self(format!("{}{}", prefix, suffix)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_has_fixed_length() {
        for prefix in ["", "a", "web-", "exactly21characters!!"] {
            let id = DeviceId::generate(prefix).unwrap();
            assert_eq!(id.as_str().chars().count(), DEVICE_ID_LENGTH);
            assert!(id.as_str().starts_with(prefix));
        }
    }

    #[test]
    fn test_generate_uses_alphanumeric_suffix() {
        let id = DeviceId::generate("pre").unwrap();
        assert!(id.as_str()[3..].chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_generate_rejects_long_prefix() {
        let err = DeviceId::generate("this-prefix-is-far-too-long").unwrap_err();
        assert!(matches!(err, AuthError::InvalidArgument(_)));
    }

    #[test]
    fn test_generate_is_random() {
        let first = DeviceId::generate("").unwrap();
        let second = DeviceId::generate("").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_display_matches_inner_value() {
        let id = DeviceId::generate("x").unwrap();
        assert_eq!(id.to_string(), id.as_str());
    }
}
