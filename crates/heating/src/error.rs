use shared::error::{ApiError, ErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HeatingError {
    /// Malformed or out-of-range input. Nothing was changed.
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    /// The command is not valid for the current session state.
    #[error("{0}")]
    Conflict(String),
    #[error("program catalog unavailable: {0:#}")]
    Store(anyhow::Error),
}

impl HeatingError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn store(err: impl Into<anyhow::Error>) -> Self {
        Self::Store(err.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            HeatingError::Validation(_) => ErrorCode::Validation,
            HeatingError::NotFound(_) => ErrorCode::NotFound,
            HeatingError::Conflict(_) => ErrorCode::Conflict,
            HeatingError::Store(_) => ErrorCode::Internal,
        }
    }
}

impl From<HeatingError> for ApiError {
    fn from(value: HeatingError) -> Self {
        ApiError::new(value.code(), value.to_string())
    }
}
