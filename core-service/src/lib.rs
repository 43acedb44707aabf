//! Core service façade.
//!
//! [`AuthClient`] ties the pieces together: it logs in through
//! `core-auth`, keeps the issued tokens in a
//! [`CredentialStore`](core_auth::CredentialStore), and registers incomes
//! through `core-income`, refreshing the access token on demand.
//!
//! Desktop hosts enable the `desktop-shims` feature (on by default), which
//! lets [`ClientConfig`](core_runtime::ClientConfig) fall back to the reqwest
//! transport from `bridge-desktop` when no `HttpClient` is injected.

pub mod client;
pub mod error;

pub use client::{AuthClient, SubmitHandle};
pub use error::{CoreError, Result};

pub use core_auth::{DeviceId, Profile};
pub use core_income::{Amount, IncomeItem, IncomeRequest, Receipt};
pub use core_runtime::{ClientConfig, ClientConfigBuilder};
