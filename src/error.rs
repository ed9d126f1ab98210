//! Error types for the wakeline gateway

use thiserror::Error;

/// Result type alias for wakeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the wakeline gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Caller supplied no session identifier
    #[error("no session_id provided")]
    MissingSessionId,

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Answer collaborator error
    #[error("answer error: {0}")]
    Answer(String),

    /// Intent analysis error
    #[error("intent error: {0}")]
    Intent(String),

    /// Weather lookup error
    #[error("weather error: {0}")]
    Weather(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
