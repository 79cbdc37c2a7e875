//! Errors surfaced by the execution clients.

/// Errors from venue order operations.
///
/// `Venue` is a business rejection carrying the venue's own error code or
/// message; the caller logs it and retries. `Transport` and `Parse` cover the
/// HTTP and decode paths. Authentication failures are not distinguished from
/// other venue errors at this layer.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExecutionError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("venue error code {code}: {message}")]
    Venue { code: i64, message: String },
}

impl ExecutionError {
    pub fn venue_code(code: i64) -> Self {
        ExecutionError::Venue {
            code,
            message: String::new(),
        }
    }

    pub fn venue_message(message: impl Into<String>) -> Self {
        ExecutionError::Venue {
            code: 0,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for ExecutionError {
    fn from(err: reqwest::Error) -> Self {
        ExecutionError::Transport(err.to_string())
    }
}
