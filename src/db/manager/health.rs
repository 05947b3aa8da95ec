use super::{BackendKind, ConnectionManager};
use crate::error::DbError;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::time::{Duration, Instant};

/// Point-in-time view of the connection, serialized for the admin dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    #[serde(rename = "type")]
    pub kind: BackendKind,
    pub is_connected: bool,
    pub is_healthy: bool,
    pub retries: u32,
    pub has_heartbeat: bool,
    pub last_error: Option<String>,
    /// Probe round trip, serialized in milliseconds.
    #[serde(rename = "responseTime", serialize_with = "serialize_millis")]
    pub latency: Option<Duration>,
    pub timestamp: DateTime<Utc>,
}

fn serialize_millis<S>(latency: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match latency {
        Some(d) => serializer.serialize_some(&u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
        None => serializer.serialize_none(),
    }
}

impl ConnectionManager {
    /// Probes the active handle once; a failed probe is reported, never retried.
    pub async fn health_snapshot(&self) -> HealthSnapshot {
        let (kind, handle) = {
            let active = self.inner.active.read().await;
            (active.kind, active.handle.clone())
        };
        let has_heartbeat = self.has_heartbeat().await;
        let is_connected =
            handle.is_some() && !self.is_reconnecting() && !self.inner.shutdown.is_cancelled();

        let (is_healthy, last_error, latency) = match handle {
            None => (false, Some(DbError::NotConnected.to_string()), None),
            Some(handle) => {
                let started = Instant::now();
                match handle.probe().await {
                    Ok(()) => (true, None, Some(started.elapsed())),
                    Err(e) => (false, Some(e.to_string()), None),
                }
            }
        };

        HealthSnapshot {
            kind,
            is_connected,
            is_healthy,
            retries: self.retries(),
            has_heartbeat,
            last_error,
            latency,
            timestamp: Utc::now(),
        }
    }
}
