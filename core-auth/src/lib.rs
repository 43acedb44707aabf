//! # Authentication Module
//!
//! Login, token lifecycle and device identity for the income-registration
//! client.
//!
//! ## Overview
//!
//! - [`DeviceId`] identifies the client instance in every login and refresh.
//! - [`AuthApi`] performs the login (`/auth/lkfl`) and refresh (`/auth/token`)
//!   calls.
//! - [`CredentialStore`] owns the token pair and hands out [`TokenLease`]s,
//!   refreshing an expired access token exactly once no matter how many
//!   callers notice the expiry at the same time.
//!
//! ## Example
//!
//! ```ignore
//! let api = AuthApi::new(config.clone(), DeviceId::generate("")?);
//! let store = CredentialStore::new(config.clock.clone(), config.token_refresh_leeway)?;
//!
//! let session = api.login("79001234567", "password").await?;
//! store.initialize(session.credentials).await?;
//!
//! let lease = store.get_valid_token(&api).await?;
//! // use lease.access_token() for the whole business call, then drop the lease
//! ```

pub mod api;
pub mod credential_store;
pub mod device;
pub mod error;
pub mod types;

pub use api::AuthApi;
pub use credential_store::{CredentialStore, TokenLease, TokenRefresher};
pub use device::{DeviceId, DEVICE_ID_LENGTH};
pub use error::{AuthError, Result};
pub use types::{Credentials, Profile, Session};
