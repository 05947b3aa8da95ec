use thiserror::Error as ThisError;

use super::DbError;

/// Top-level error for the `folio` and `folio-migrate` binaries.
#[derive(Debug, ThisError)]
pub enum FolioError {
    #[error(transparent)]
    Database(#[from] DbError),

    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
