use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IncomeError {
    #[error("Income registration failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Transport failure: {0}")]
    Transport(#[from] BridgeError),

    #[error("Invalid income request: {0}")]
    InvalidRequest(String),

    #[error("Invalid response from income service: {0}")]
    InvalidResponse(String),

    #[error("Authenticated profile has no tax identifier")]
    MissingTaxId,
}

impl IncomeError {
    /// HTTP status carried by a rejected submission.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            IncomeError::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, IncomeError>;
