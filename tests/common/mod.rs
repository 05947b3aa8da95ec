#![allow(dead_code)]

use async_trait::async_trait;
use folio::db::{RemoteConnection, RemoteConnector};
use folio::error::DbError;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub const PROBE_SQL: &str = "SELECT 1";

/// A temp-file SQLite URL, removed (with its WAL files) on drop.
pub struct TempDb {
    path: PathBuf,
}

impl TempDb {
    pub fn new(label: &str) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before UNIX_EPOCH")
            .as_nanos();
        let mut path = std::env::temp_dir();
        path.push(format!(
            "folio-{label}-{}-{}.sqlite",
            std::process::id(),
            nanos
        ));
        Self { path }
    }

    pub fn url(&self) -> String {
        format!("sqlite:{}", self.path.display())
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{suffix}", self.path.display()));
        }
    }
}

#[derive(Default)]
struct FakeState {
    /// Connections opened so far; connection ids start at 1.
    connects: AtomicUsize,
    /// Upcoming connect calls that fail.
    failing_connects: AtomicUsize,
    /// Connections with an id up to this value answer every call with a reset error.
    broken_upto: AtomicUsize,
    /// Delay applied inside `connect`.
    connect_delay_ms: AtomicUsize,
    /// Errors returned, in order, by upcoming non-probe statements.
    query_errors: Mutex<VecDeque<String>>,
    /// Statements containing the pattern fail with the paired message.
    failing_pattern: Mutex<Option<(String, String)>>,
    /// Results returned, in order, by upcoming non-probe statements.
    responses: Mutex<VecDeque<Value>>,
    /// Non-probe statements received, with the id of the connection that ran them.
    executed: Mutex<Vec<(usize, String)>>,
    probes: AtomicUsize,
}

/// In-process remote backend with scripted failures.
#[derive(Clone, Default)]
pub struct FakeCloud {
    state: Arc<FakeState>,
}

impl FakeCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connector(&self) -> Arc<dyn RemoteConnector> {
        Arc::new(self.clone())
    }

    pub fn connects(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    pub fn probes(&self) -> usize {
        self.state.probes.load(Ordering::SeqCst)
    }

    pub fn fail_next_connects(&self, n: usize) {
        self.state.failing_connects.store(n, Ordering::SeqCst);
    }

    pub fn set_connect_delay(&self, delay: Duration) {
        let ms = usize::try_from(delay.as_millis()).unwrap_or(usize::MAX);
        self.state.connect_delay_ms.store(ms, Ordering::SeqCst);
    }

    /// Breaks every connection opened so far.
    pub fn break_connections(&self) {
        let current = self.connects();
        self.state.broken_upto.store(current, Ordering::SeqCst);
    }

    pub fn fail_next_query(&self, message: &str) {
        self.state
            .query_errors
            .lock()
            .unwrap()
            .push_back(message.to_string());
    }

    pub fn fail_matching(&self, pattern: &str, message: &str) {
        *self.state.failing_pattern.lock().unwrap() =
            Some((pattern.to_string(), message.to_string()));
    }

    pub fn respond_with(&self, value: Value) {
        self.state.responses.lock().unwrap().push_back(value);
    }

    pub fn executed(&self) -> Vec<(usize, String)> {
        self.state.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteConnector for FakeCloud {
    async fn connect(&self) -> Result<Arc<dyn RemoteConnection>, DbError> {
        let delay = self.state.connect_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay as u64)).await;
        }
        let id = self.state.connects.fetch_add(1, Ordering::SeqCst) + 1;
        let failing = self.state.failing_connects.load(Ordering::SeqCst);
        if failing > 0 {
            self.state
                .failing_connects
                .store(failing - 1, Ordering::SeqCst);
            return Err(DbError::remote("service unavailable"));
        }
        Ok(Arc::new(FakeConnection {
            id,
            state: self.state.clone(),
            closed: Mutex::new(false),
        }))
    }
}

struct FakeConnection {
    id: usize,
    state: Arc<FakeState>,
    closed: Mutex<bool>,
}

#[async_trait]
impl RemoteConnection for FakeConnection {
    async fn execute(&self, sql: &str) -> Result<Value, DbError> {
        if *self.closed.lock().unwrap() {
            return Err(DbError::remote("connection disconnected"));
        }
        if self.id <= self.state.broken_upto.load(Ordering::SeqCst) {
            return Err(DbError::remote("connection reset by peer"));
        }
        if sql == PROBE_SQL {
            self.state.probes.fetch_add(1, Ordering::SeqCst);
            return Ok(json!([{ "1": 1 }]));
        }

        self.state
            .executed
            .lock()
            .unwrap()
            .push((self.id, sql.to_string()));
        if let Some((pattern, message)) = self.state.failing_pattern.lock().unwrap().as_ref() {
            if sql.contains(pattern.as_str()) {
                return Err(DbError::Remote(message.clone()));
            }
        }
        if let Some(message) = self.state.query_errors.lock().unwrap().pop_front() {
            return Err(DbError::Remote(message));
        }
        Ok(self
            .state
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| json!([])))
    }

    async fn close(&self) {
        *self.closed.lock().unwrap() = true;
    }
}

/// Polls `check` every 10ms until it holds or `timeout` elapses.
pub async fn wait_until<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Millisecond-scale policy so failover tests finish quickly on a real clock.
pub fn fast_policy() -> folio::db::ReconnectPolicy {
    folio::db::ReconnectPolicy {
        max_retries: 3,
        backoff: vec![
            Duration::from_millis(20),
            Duration::from_millis(60),
            Duration::from_millis(100),
        ],
        connect_timeout: Duration::from_secs(1),
        heartbeat_interval: Duration::from_millis(50),
    }
}
