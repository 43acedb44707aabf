use core_auth::AuthError;
use core_income::IncomeError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Income error: {0}")]
    Income(#[from] IncomeError),

    #[error("Submission task failed: {0}")]
    TaskFailed(String),
}

impl CoreError {
    /// HTTP status of a rejected remote call, if that is what failed.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            CoreError::Auth(err) => err.status_code(),
            CoreError::Income(err) => err.status_code(),
            _ => None,
        }
    }

    /// Whether the failure happened below HTTP (connect, timeout, reset).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            CoreError::Auth(AuthError::Transport(_)) | CoreError::Income(IncomeError::Transport(_))
        )
    }

    pub fn is_not_authenticated(&self) -> bool {
        matches!(self, CoreError::Auth(AuthError::NotAuthenticated))
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
