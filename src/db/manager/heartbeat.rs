use super::reconnect::Trigger;
use super::{ConnectionManager, Handle, Inner, PROBE_SQL};
use crate::db::remote::RemoteConnection;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub(super) struct Heartbeat {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl Heartbeat {
    async fn stop(self) {
        self.token.cancel();
        let _ = self.task.await;
    }
}

impl ConnectionManager {
    pub(super) async fn start_heartbeat(&self) {
        let previous = {
            let mut slot = self.inner.heartbeat.lock().await;
            // Shutdown cancels before it empties this slot.
            if self.inner.shutdown.is_cancelled() {
                return;
            }
            let token = self.inner.shutdown.child_token();
            let task = tokio::spawn(run_heartbeat(
                Arc::downgrade(&self.inner),
                token.clone(),
                self.inner.policy.heartbeat_interval,
            ));
            slot.replace(Heartbeat { token, task })
        };
        if let Some(previous) = previous {
            previous.stop().await;
        }
    }

    pub(super) async fn stop_heartbeat(&self) {
        let heartbeat = self.inner.heartbeat.lock().await.take();
        if let Some(heartbeat) = heartbeat {
            heartbeat.stop().await;
        }
    }

    pub(super) async fn has_heartbeat(&self) -> bool {
        self.inner.heartbeat.lock().await.is_some()
    }

    async fn remote_handle(&self) -> Option<(Arc<dyn RemoteConnection>, u64)> {
        let active = self.inner.active.read().await;
        match &active.handle {
            Some(Handle::Remote(conn)) => Some((conn.clone(), active.generation)),
            _ => None,
        }
    }

    /// Runs a reconnection in the background; the task is joined by `shutdown`.
    async fn spawn_reconnect(&self, generation: u64) {
        let task = tokio::spawn(background_reconnect(self.clone(), generation));
        // A previous task has already finished: heartbeats only run between sequences.
        let _previous = self.inner.reconnect_task.lock().await.replace(task);
    }
}

/// Boxed so the heartbeat and reconnection futures do not name each other's types.
fn background_reconnect(
    manager: ConnectionManager,
    generation: u64,
) -> Pin<Box<dyn Future<Output = ()> + Send>> {
    Box::pin(async move {
        manager.reconnect(generation, Trigger::Heartbeat).await;
    })
}

async fn run_heartbeat(inner: Weak<Inner>, token: CancellationToken, interval: Duration) {
    loop {
        tokio::select! {
            () = token.cancelled() => break,
            () = tokio::time::sleep(interval) => {}
        }

        let Some(strong) = inner.upgrade() else { break };
        let manager = ConnectionManager { inner: strong };
        let Some((conn, generation)) = manager.remote_handle().await else {
            break;
        };

        let probe = tokio::select! {
            () = token.cancelled() => break,
            probe = conn.execute(PROBE_SQL) => probe,
        };
        match probe {
            Ok(_) => debug!("Heartbeat probe succeeded"),
            Err(e) => {
                warn!(error = %e, "Heartbeat probe failed, reconnecting");
                manager.spawn_reconnect(generation).await;
                break;
            }
        }
    }
}
