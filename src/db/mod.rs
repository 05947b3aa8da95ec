//! Database layer: a connection manager over a local SQLite store and a cloud SQLite service.
//!
//! Layout:
//! - `manager/`: the backend-agnostic query surface, reconnection and heartbeat
//! - `local.rs`: the embedded store (sqlx pool, bound parameters)
//! - `remote/`: the remote driver seam and the cloud HTTP driver
//! - `literal.rs` / `shape.rs`: query translation and result normalization for the remote path
//! - `schema.rs`: SQL DDL for the portfolio tables
//! - `migrate.rs`: one-shot copy of local tables into the remote store
//! - `sample.rs`: demo rows for a fresh remote store

pub mod backoff;
pub mod literal;
pub mod local;
pub mod manager;
pub mod migrate;
pub mod remote;
pub mod sample;
pub mod schema;
pub mod shape;
pub mod value;

pub use backoff::ReconnectPolicy;
pub use local::LocalStore;
pub use manager::{BackendKind, ConnectionManager, HealthSnapshot, ReconnectOutcome};
pub use remote::{CloudConnector, RemoteConnection, RemoteConnector};
pub use schema::{PORTFOLIO_TABLES, SQLITE_INIT};
pub use value::{Row, SqlValue, WriteResult};
