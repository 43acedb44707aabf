use bridge_traits::BridgeError;
use thiserror::Error;

/// Failures of the authentication half of the client.
///
/// `Clone` so that the outcome of a single token refresh can be handed to
/// every caller that waited on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Credential store is already initialized; reset it before authenticating again")]
    InvalidState,

    #[error("Authentication failed with status {status}: {body}")]
    AuthenticationFailed { status: u16, body: String },

    #[error("Transport failure: {0}")]
    Transport(#[from] BridgeError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid response from authentication service: {0}")]
    InvalidResponse(String),
}

impl AuthError {
    /// HTTP status carried by a rejected login or refresh call.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            AuthError::AuthenticationFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
