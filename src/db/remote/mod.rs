//! Remote backend seam.
//!
//! The remote driver has no bound parameters: callers hand it fully inlined SQL text and
//! receive the raw JSON result, whose shape is normalized by [`crate::db::shape`].

mod cloud;

pub use cloud::{CloudConnector, CloudTarget};

use crate::error::DbError;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// An open connection to the remote backend.
#[async_trait]
pub trait RemoteConnection: Send + Sync {
    /// Runs one statement and returns the backend's raw result.
    async fn execute(&self, sql: &str) -> Result<Value, DbError>;

    /// Closes the connection. Later calls to `execute` fail with a connection-class error.
    async fn close(&self);
}

/// Opens new remote connections.
#[async_trait]
pub trait RemoteConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn RemoteConnection>, DbError>;
}
