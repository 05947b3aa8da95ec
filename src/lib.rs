pub mod config;
pub mod db;
pub mod error;
pub mod server;
pub mod utils;

pub use db::{ConnectionManager, SqlValue};
pub use error::{DbError, FolioError};
