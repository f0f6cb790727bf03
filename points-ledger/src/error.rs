//! Error types for the points ledger

use crate::validation::ValidationError;
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Rejected input (payer, points or timestamp)
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Spend request the plan could not fully cover
    #[error("Cannot spend more than available: requested {requested}, available {available}")]
    InsufficientPoints {
        /// Points the caller asked to spend
        requested: i64,
        /// Points the spending plan could cover
        available: i64,
    },

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for failures caused by the caller's input rather than the system
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::InsufficientPoints { .. })
    }
}

impl From<prometheus::Error> for Error {
    fn from(err: prometheus::Error) -> Self {
        Error::Config(format!("Metrics registration failed: {}", err))
    }
}
