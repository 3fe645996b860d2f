use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    NotFound,
    Validation,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{code:?}: {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Classifies a free-form backend message. The backend has no error codes, so
    /// this keys off the phrases its endpoints actually return.
    pub fn from_backend_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_ascii_lowercase();
        let code = if lower.contains("invalid or expired token")
            || lower.contains("not logged in")
            || lower.contains("invalid username/email or password")
            || lower.contains("unauthorized")
        {
            ErrorCode::Unauthorized
        } else if lower.contains("not found") {
            ErrorCode::NotFound
        } else if lower.contains("invalid")
            || lower.contains("unsupported")
            || lower.contains("no transcript")
            || lower.contains("no api key")
            || lower.contains("empty")
            || lower.contains("no valid data")
        {
            ErrorCode::Validation
        } else {
            ErrorCode::Internal
        };
        Self { code, message }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.code == ErrorCode::Unauthorized
    }
}
