//! Engine-level errors. All of these are fatal at startup only; steady-state
//! failures are handled inside the data and execution layers.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("venue {venue} failed to start: {reason}")]
    VenueStartup { venue: String, reason: String },

    #[error("fx startup failed for {currency}: {reason}")]
    FxStartup { currency: String, reason: String },
}
