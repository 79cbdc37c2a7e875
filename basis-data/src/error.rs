//! Errors surfaced by the market-data adapters.

/// Errors from the streaming and polling data paths.
///
/// These stay inside the adapters: the streaming harness reconnects on
/// `Transport`, and `Protocol` failures become error books/quotes so the hub
/// can retain the previous good entry.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DataError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("protocol error: {0}")]
    Protocol(String),
}

impl From<reqwest::Error> for DataError {
    fn from(err: reqwest::Error) -> Self {
        DataError::Transport(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for DataError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        DataError::Transport(err.to_string())
    }
}
