//! Error handling - Hierarchical errors shared by the whole crate

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Tick-order error hierarchy
#[derive(Debug, Error)]
pub enum Error {
    /// Order constructed with a missing service or a bad threshold
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Caller passed a malformed tick
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Order service rejected or failed a trade
    #[error("Exchange error: {0}")]
    Exchange(String),

    /// Configuration file errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Tick decoding
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for misuse errors that are returned straight to the caller.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::InvalidConfiguration(_) | Error::InvalidInput(_))
    }

    /// The bare message without the category prefix.
    pub fn message(&self) -> String {
        match self {
            Error::InvalidConfiguration(m)
            | Error::InvalidInput(m)
            | Error::Exchange(m)
            | Error::Config(m) => m.clone(),
            Error::Serialization(e) => e.to_string(),
            Error::Io(e) => e.to_string(),
        }
    }
}
