mod db;
mod folio;

pub use db::{CONNECTION_ERROR_MARKERS, DbError};
pub use folio::FolioError;

pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}
