//! # Credential Store
//!
//! Single owner of the current [`Credentials`]. Hands out [`TokenLease`]s for
//! business calls and refreshes an expired access token on demand.
//!
//! ## Coordination
//!
//! Credentials sit behind a fair `tokio::sync::RwLock`:
//!
//! - A lease is a read guard. It is held for the whole business call, so any
//!   number of calls can use the same token concurrently.
//! - A refresh takes the write lock. It waits until every outstanding lease is
//!   dropped, and callers arriving while it is queued wait behind it.
//! - Refreshes are serialized by a separate gate. Each completed attempt bumps
//!   a generation counter stored next to the credentials; a caller that
//!   observed the expired token before the bump takes that attempt's outcome
//!   instead of starting another refresh.
//!
//! A caller must not ask for a new token while it still holds a lease from
//! the same store: the refresh would wait for that lease forever.

use crate::error::{AuthError, Result};
use crate::types::Credentials;
use async_trait::async_trait;
use bridge_traits::time::Clock;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock, RwLockReadGuard};
use tracing::{debug, info, warn};

/// Exchanges a refresh token for a new token pair.
///
/// Implemented by [`AuthApi`](crate::AuthApi); tests substitute doubles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> Result<Credentials>;
}

struct Slot {
    credentials: Option<Credentials>,
    /// Number of finished refresh attempts, successful or not
    generation: u64,
}

/// Concurrency-safe holder of the current token pair.
pub struct CredentialStore {
    slot: RwLock<Slot>,
    /// Outcome of the most recent refresh attempt
    refresh_gate: Mutex<Option<AuthError>>,
    clock: Arc<dyn Clock>,
    leeway: chrono::Duration,
}

impl CredentialStore {
    /// Create an empty (unauthenticated) store.
    ///
    /// The access token is treated as expired once `now + leeway` is past its
    /// expiry.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidArgument`] if `leeway` does not fit a
    /// signed time delta.
    pub fn new(clock: Arc<dyn Clock>, leeway: Duration) -> Result<Self> {
        let leeway = chrono::Duration::from_std(leeway).map_err(|e| {
            AuthError::InvalidArgument(format!("token refresh leeway out of range: {}", e))
        })?;

        Ok(Self {
            slot: RwLock::new(Slot {
                credentials: None,
                generation: 0,
            }),
            refresh_gate: Mutex::new(None),
            clock,
            leeway,
        })
    }

    /// Install the credentials obtained by a login.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidState`] if the store already holds
    /// credentials. Call [`reset`](Self::reset) first to authenticate again.
    pub async fn initialize(&self, credentials: Credentials) -> Result<()> {
        let mut slot = self.slot.write().await;
        if slot.credentials.is_some() {
            warn!("Credential store is already initialized");
            return Err(AuthError::InvalidState);
        }

        debug!(expires_at = %credentials.expires_at(), "Credential store initialized");
        slot.credentials = Some(credentials);
        Ok(())
    }

    /// Drop the current credentials, returning to the unauthenticated state.
    ///
    /// Waits for outstanding leases to be released.
    pub async fn reset(&self) {
        let mut slot = self.slot.write().await;
        if slot.credentials.take().is_some() {
            debug!("Credential store reset");
        }
    }

    pub async fn is_authenticated(&self) -> bool {
        self.slot.read().await.credentials.is_some()
    }

    /// Expiry of the current access token, if authenticated
    pub async fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.slot
            .read()
            .await
            .credentials
            .as_ref()
            .map(Credentials::expires_at)
    }

    /// Return a lease on a currently valid access token, refreshing it first
    /// if it has expired.
    ///
    /// Concurrent callers that find the same expired token trigger exactly one
    /// call to `refresher` and all observe its outcome. A failed refresh
    /// leaves the stored credentials untouched; the next call tries again.
    ///
    /// # Errors
    ///
    /// - [`AuthError::NotAuthenticated`] if the store was never initialized
    ///   (or was reset)
    /// - whatever the refresher returned, if the refresh failed
    pub async fn get_valid_token(&self, refresher: &dyn TokenRefresher) -> Result<TokenLease<'_>> {
        let observed_generation = {
            let slot = self.slot.read().await;
            let expired = match slot.credentials.as_ref() {
                None => return Err(AuthError::NotAuthenticated),
                Some(credentials) => self.is_expired(credentials),
            };

            if !expired {
                return Self::lease(slot);
            }
            slot.generation
        };

        debug!("Access token expired, waiting for refresh gate");
        let mut last_failure = self.refresh_gate.lock().await;
        let mut slot = self.slot.write().await;

        if slot.generation != observed_generation {
            // Another caller refreshed since this one saw the expired token
            if let Some(err) = last_failure.as_ref() {
                debug!(error = %err, "Sharing failed refresh outcome");
                return Err(err.clone());
            }
            drop(last_failure);
            return Self::lease(slot.downgrade());
        }

        let (expired, refresh_token) = match slot.credentials.as_ref() {
            None => return Err(AuthError::NotAuthenticated),
            Some(credentials) => (
                self.is_expired(credentials),
                credentials.refresh_token().to_string(),
            ),
        };

        if !expired {
            // Replaced by a new login while waiting
            drop(last_failure);
            return Self::lease(slot.downgrade());
        }

        info!("Refreshing access token");
        let outcome = refresher.refresh(&refresh_token).await;
        slot.generation += 1;

        match outcome {
            Ok(credentials) => {
                info!(expires_at = %credentials.expires_at(), "Access token refreshed");
                slot.credentials = Some(credentials);
                *last_failure = None;
                drop(last_failure);
                Self::lease(slot.downgrade())
            }
            Err(err) => {
                warn!(error = %err, "Access token refresh failed");
                *last_failure = Some(err.clone());
                Err(err)
            }
        }
    }

    fn is_expired(&self, credentials: &Credentials) -> bool {
        credentials.is_expired_at(self.clock.now(), self.leeway)
    }

    fn lease(slot: RwLockReadGuard<'_, Slot>) -> Result<TokenLease<'_>> {
        RwLockReadGuard::try_map(slot, |slot| slot.credentials.as_ref())
            .map(|credentials| TokenLease { credentials })
            .map_err(|_| AuthError::NotAuthenticated)
    }
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore")
            .field("leeway", &self.leeway)
            .finish_non_exhaustive()
    }
}

/// Read access to the current credentials for the duration of one business
/// call.
///
/// While any lease is alive the credentials cannot be refreshed or reset.
/// Drop it as soon as the response has been received.
pub struct TokenLease<'a> {
    credentials: RwLockReadGuard<'a, Credentials>,
}

impl TokenLease<'_> {
    pub fn access_token(&self) -> &str {
        self.credentials.access_token()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.credentials.expires_at()
    }
}

impl fmt::Debug for TokenLease<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenLease")
            .field("expires_at", &self.expires_at())
            .finish()
    }
}
