use super::{BackendKind, ConnectionManager, Handle, PROBE_SQL};
use crate::db::local::LocalStore;
use crate::db::remote::{RemoteConnection, RemoteConnector};
use crate::error::DbError;
use backon::Retryable;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Result of a reconnection trigger, as observed by the caller that raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectOutcome {
    /// A fresh remote handle is installed (by this trigger or by the sequence it waited on).
    Reconnected,
    /// The remote budget is exhausted; the local store is now active for good.
    FellBack,
    /// Another sequence was already running; nothing was done.
    Skipped,
    /// The manager shut down before the sequence finished.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Trigger {
    /// Heartbeat probe failure: a no-op while another sequence runs.
    Heartbeat,
    /// Query failure: waits for a running sequence and adopts its outcome.
    Query,
}

impl ConnectionManager {
    /// Replaces the remote handle observed at `observed_generation`.
    pub(super) async fn reconnect(
        &self,
        observed_generation: u64,
        trigger: Trigger,
    ) -> ReconnectOutcome {
        let _guard = match trigger {
            Trigger::Heartbeat => match self.inner.reconnect_lock.try_lock() {
                Ok(guard) => guard,
                Err(_) => {
                    debug!("Reconnection already in progress, ignoring heartbeat trigger");
                    return ReconnectOutcome::Skipped;
                }
            },
            Trigger::Query => self.inner.reconnect_lock.lock().await,
        };

        if self.inner.shutdown.is_cancelled() {
            return ReconnectOutcome::Cancelled;
        }

        {
            let active = self.inner.active.read().await;
            if active.generation != observed_generation || active.kind == BackendKind::Local {
                // Someone else already replaced the handle we saw fail.
                return match (&active.kind, &active.handle) {
                    (BackendKind::Remote, Some(_)) => ReconnectOutcome::Reconnected,
                    _ => ReconnectOutcome::FellBack,
                };
            }
        }

        self.inner.reconnecting.store(true, Ordering::SeqCst);
        let outcome = match self.inner.connector.clone() {
            Some(connector) => self.reconnect_sequence(connector).await,
            None => self.fall_back().await,
        };
        self.inner.reconnecting.store(false, Ordering::SeqCst);
        outcome
    }

    async fn reconnect_sequence(&self, connector: Arc<dyn RemoteConnector>) -> ReconnectOutcome {
        self.stop_heartbeat().await;

        let stale = self.inner.active.read().await.handle.clone();
        if let Some(Handle::Remote(conn)) = stale {
            conn.close().await;
        }

        let policy = &self.inner.policy;
        if policy.max_retries == 0 {
            return self.fall_back().await;
        }

        let this = self;
        let attempt = move || {
            let connector = connector.clone();
            async move {
                let attempt = this.inner.retries.fetch_add(1, Ordering::SeqCst) + 1;
                info!(
                    attempt,
                    max_retries = this.inner.policy.max_retries,
                    "Reconnecting to remote database"
                );
                this.open_remote(connector.as_ref()).await
            }
        };
        let sequence = attempt
            .retry(policy.backoff())
            .notify(|err: &DbError, delay: Duration| {
                warn!(
                    error = %err,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "Remote reconnection attempt failed, backing off"
                );
            });

        let result = tokio::select! {
            () = self.inner.shutdown.cancelled() => return ReconnectOutcome::Cancelled,
            result = sequence => result,
        };

        match result {
            Ok(conn) => {
                if !self.install(Handle::Remote(conn), BackendKind::Remote).await {
                    return ReconnectOutcome::Cancelled;
                }
                self.start_heartbeat().await;
                info!("Reconnected to remote database");
                ReconnectOutcome::Reconnected
            }
            Err(e) => {
                error!(
                    error = %e,
                    attempts = policy.max_retries,
                    "Remote database unreachable, falling back to local database permanently"
                );
                self.fall_back().await
            }
        }
    }

    /// Switches to the local store for the rest of the process.
    async fn fall_back(&self) -> ReconnectOutcome {
        match LocalStore::open(&self.inner.local_url).await {
            Ok(store) => {
                if !self.install(Handle::Local(store), BackendKind::Local).await {
                    return ReconnectOutcome::Cancelled;
                }
                warn!("Using local database");
            }
            Err(e) => {
                error!(error = %e, "Failed to open local database after remote fallback");
                let mut active = self.inner.active.write().await;
                active.kind = BackendKind::Local;
                active.handle = None;
                active.generation += 1;
            }
        }
        ReconnectOutcome::FellBack
    }

    /// Connects and probes the remote, bounded by the connect timeout.
    pub(super) async fn open_remote(
        &self,
        connector: &dyn RemoteConnector,
    ) -> Result<Arc<dyn RemoteConnection>, DbError> {
        let timeout = self.inner.policy.connect_timeout;
        tokio::time::timeout(timeout, async {
            let conn = connector.connect().await?;
            conn.execute(PROBE_SQL).await?;
            Ok(conn)
        })
        .await
        .map_err(|_| DbError::ConnectTimeout(timeout))?
    }
}
