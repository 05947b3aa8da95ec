use std::time::Duration;
use thiserror::Error as ThisError;

use super::IsRetryable;

/// Substrings that mark a remote failure as transient (transport unusable right now).
pub const CONNECTION_ERROR_MARKERS: [&str; 4] = ["unavailable", "disconnected", "reset", "timeout"];

#[derive(Debug, ThisError)]
pub enum DbError {
    /// Any failure reported by the remote backend or its transport.
    #[error("Remote database error: {0}")]
    Remote(String),

    #[error("Remote connection timeout after {0:?}")]
    ConnectTimeout(Duration),

    #[error("Local database error: {0}")]
    Local(#[from] sqlx::Error),

    #[error(
        "Parameter count mismatch: query has {expected} placeholders but {supplied} values were supplied"
    )]
    ParameterCount { expected: usize, supplied: usize },

    #[error("Invalid remote connection string: {0}")]
    InvalidConnectionString(String),

    #[error("Remote database is not configured")]
    RemoteNotConfigured,

    #[error("Database connection is not available")]
    NotConnected,
}

impl DbError {
    pub fn remote(message: impl Into<String>) -> Self {
        DbError::Remote(message.into())
    }
}

fn has_connection_marker(message: &str) -> bool {
    let lowered = message.to_ascii_lowercase();
    CONNECTION_ERROR_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

impl IsRetryable for DbError {
    fn is_retryable(&self) -> bool {
        match self {
            DbError::Remote(message) => has_connection_marker(message),
            DbError::ConnectTimeout(_) => true,
            DbError::Local(_)
            | DbError::ParameterCount { .. }
            | DbError::InvalidConnectionString(_)
            | DbError::RemoteNotConfigured
            | DbError::NotConnected => false,
        }
    }
}
