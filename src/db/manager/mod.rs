//! Backend-agnostic query surface over a local store and an optional remote store.
//!
//! Exactly one handle is active at a time. When a remote connection string is configured
//! the manager keeps the remote connection alive with a periodic heartbeat, reconnects on
//! connection-class failures, and permanently falls back to the local store once the
//! reconnection budget is exhausted.

mod health;
mod heartbeat;
mod reconnect;

pub use health::HealthSnapshot;
pub use reconnect::ReconnectOutcome;

use super::backoff::ReconnectPolicy;
use super::literal::inline_params;
use super::local::LocalStore;
use super::remote::{CloudConnector, RemoteConnection, RemoteConnector};
use super::shape;
use super::value::{Row, SqlValue, WriteResult};
use crate::config::DatabaseConfig;
use crate::error::{DbError, IsRetryable};
use heartbeat::Heartbeat;
use reconnect::Trigger;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Trivial statement used for connection probes.
pub(crate) const PROBE_SQL: &str = "SELECT 1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Local,
    Remote,
}

#[derive(Clone)]
enum Handle {
    Local(LocalStore),
    Remote(Arc<dyn RemoteConnection>),
}

impl Handle {
    async fn probe(&self) -> Result<(), DbError> {
        match self {
            Handle::Local(store) => store.probe().await,
            Handle::Remote(conn) => conn.execute(PROBE_SQL).await.map(|_| ()),
        }
    }

    async fn close(&self) {
        match self {
            Handle::Local(store) => store.close().await,
            Handle::Remote(conn) => conn.close().await,
        }
    }
}

struct Active {
    kind: BackendKind,
    handle: Option<Handle>,
    /// Bumped every time a handle is installed.
    generation: u64,
}

struct Inner {
    local_url: String,
    connector: Option<Arc<dyn RemoteConnector>>,
    policy: ReconnectPolicy,
    active: RwLock<Active>,
    retries: AtomicU32,
    reconnect_lock: Mutex<()>,
    reconnecting: AtomicBool,
    heartbeat: Mutex<Option<Heartbeat>>,
    reconnect_task: Mutex<Option<JoinHandle<()>>>,
    shutdown: CancellationToken,
}

enum Checkout {
    Local(LocalStore),
    Remote {
        conn: Arc<dyn RemoteConnection>,
        generation: u64,
    },
}

/// Shared handle to the process-wide connection manager.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

impl ConnectionManager {
    /// Builds the manager from configuration, using the cloud driver when a remote URL is set.
    pub async fn initialize(cfg: &DatabaseConfig) -> Result<Self, DbError> {
        let policy = cfg.reconnect_policy();
        let connector: Option<Arc<dyn RemoteConnector>> = match cfg.remote_url() {
            Some(url) => match CloudConnector::new(url, policy.connect_timeout) {
                Ok(connector) => Some(Arc::new(connector)),
                Err(e) => {
                    warn!(error = %e, "Remote connection string rejected, using local database");
                    None
                }
            },
            None => None,
        };
        Self::with_connector(&cfg.local_url, connector, policy).await
    }

    /// Builds the manager over an arbitrary remote driver.
    ///
    /// With a connector, one remote connection is attempted; any failure selects the local
    /// store for the rest of the process without retrying.
    pub async fn with_connector(
        local_url: &str,
        connector: Option<Arc<dyn RemoteConnector>>,
        policy: ReconnectPolicy,
    ) -> Result<Self, DbError> {
        let manager = Self {
            inner: Arc::new(Inner {
                local_url: local_url.to_string(),
                connector,
                policy,
                active: RwLock::new(Active {
                    kind: BackendKind::Local,
                    handle: None,
                    generation: 0,
                }),
                retries: AtomicU32::new(0),
                reconnect_lock: Mutex::new(()),
                reconnecting: AtomicBool::new(false),
                heartbeat: Mutex::new(None),
                reconnect_task: Mutex::new(None),
                shutdown: CancellationToken::new(),
            }),
        };

        if let Some(connector) = manager.inner.connector.clone() {
            match manager.open_remote(connector.as_ref()).await {
                Ok(conn) => {
                    manager.install(Handle::Remote(conn), BackendKind::Remote).await;
                    manager.start_heartbeat().await;
                    info!("Connected to remote database");
                    return Ok(manager);
                }
                Err(e) => {
                    warn!(error = %e, "Remote database not available, using local database");
                }
            }
        }

        let store = LocalStore::open(&manager.inner.local_url).await?;
        manager.install(Handle::Local(store), BackendKind::Local).await;
        Ok(manager)
    }

    pub async fn backend(&self) -> BackendKind {
        self.inner.active.read().await.kind
    }

    /// Reconnection attempts made by the sequence currently in progress.
    pub fn retries(&self) -> u32 {
        self.inner.retries.load(Ordering::SeqCst)
    }

    pub fn is_reconnecting(&self) -> bool {
        self.inner.reconnecting.load(Ordering::SeqCst)
    }

    pub async fn execute_read(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, DbError> {
        match self.checkout().await? {
            Checkout::Local(store) => store.fetch_all(sql, params).await,
            Checkout::Remote { conn, generation } => {
                let text = inline_params(sql, params)?;
                let raw = self.run_remote(conn, generation, &text).await?;
                Ok(shape::rows(raw))
            }
        }
    }

    pub async fn execute_read_one(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<Option<Row>, DbError> {
        match self.checkout().await? {
            Checkout::Local(store) => store.fetch_optional(sql, params).await,
            Checkout::Remote { conn, generation } => {
                let text = inline_params(sql, params)?;
                let raw = self.run_remote(conn, generation, &text).await?;
                Ok(shape::first_row(raw))
            }
        }
    }

    pub async fn execute_write(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<WriteResult, DbError> {
        match self.checkout().await? {
            Checkout::Local(store) => store.execute(sql, params).await,
            Checkout::Remote { conn, generation } => {
                let text = inline_params(sql, params)?;
                let raw = self.run_remote(conn, generation, &text).await?;
                Ok(shape::write_result(&raw))
            }
        }
    }

    /// Cancels the heartbeat and any reconnection in progress, then closes the active handle.
    pub async fn shutdown(&self) {
        if self.inner.shutdown.is_cancelled() {
            return;
        }
        self.inner.shutdown.cancel();

        self.stop_heartbeat().await;
        let task = self.inner.reconnect_task.lock().await.take();
        if let Some(task) = task {
            let _ = task.await;
        }

        let handle = self.inner.active.write().await.handle.take();
        if let Some(handle) = handle {
            handle.close().await;
        }
        info!("Database connection manager shut down");
    }

    async fn checkout(&self) -> Result<Checkout, DbError> {
        let active = self.inner.active.read().await;
        match &active.handle {
            Some(Handle::Local(store)) => Ok(Checkout::Local(store.clone())),
            Some(Handle::Remote(conn)) => Ok(Checkout::Remote {
                conn: conn.clone(),
                generation: active.generation,
            }),
            None => Err(DbError::NotConnected),
        }
    }

    /// Runs `sql` on the remote handle, reconnecting and retrying once on a connection-class error.
    async fn run_remote(
        &self,
        conn: Arc<dyn RemoteConnection>,
        generation: u64,
        sql: &str,
    ) -> Result<Value, DbError> {
        let err = match conn.execute(sql).await {
            Ok(raw) => return Ok(raw),
            Err(err) if err.is_retryable() => err,
            Err(err) => return Err(err),
        };

        warn!(error = %err, "Remote query hit a connection error, reconnecting");
        match self.reconnect(generation, Trigger::Query).await {
            ReconnectOutcome::Reconnected => match self.checkout().await? {
                Checkout::Remote { conn, .. } => conn.execute(sql).await,
                Checkout::Local(_) => Err(err),
            },
            ReconnectOutcome::FellBack
            | ReconnectOutcome::Skipped
            | ReconnectOutcome::Cancelled => Err(err),
        }
    }

    /// Installs `handle` as the active handle unless the manager has been shut down.
    async fn install(&self, handle: Handle, kind: BackendKind) -> bool {
        let mut active = self.inner.active.write().await;
        if self.inner.shutdown.is_cancelled() {
            drop(active);
            handle.close().await;
            return false;
        }
        active.kind = kind;
        active.handle = Some(handle);
        active.generation += 1;
        self.inner.retries.store(0, Ordering::SeqCst);
        true
    }
}
