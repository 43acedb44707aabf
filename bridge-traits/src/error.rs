use thiserror::Error;

/// Failure raised by a bridge implementation.
///
/// Transport failures are values, not references to the underlying client
/// error, so they can be cloned and handed to every caller waiting on the
/// same outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Request interrupted: {0}")]
    Interrupted(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),
}

impl BridgeError {
    /// Whether the failure happened before a response was received.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            BridgeError::Timeout(_) | BridgeError::Connection(_) | BridgeError::Interrupted(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
