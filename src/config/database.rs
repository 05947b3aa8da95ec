use crate::db::ReconnectPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Database configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// sqlx URL of the local embedded store.
    /// TOML: `database.local_url`. Default: `sqlite://portfolio.db`.
    #[serde(default = "default_local_url")]
    pub local_url: String,

    /// Cloud connection string; empty means local only.
    /// TOML: `database.remote_url`. Env: `SQLITECLOUD_CONNECTION_STRING`.
    #[serde(default)]
    pub remote_url: Option<String>,

    /// Reconnection attempts before falling back to the local store.
    /// TOML: `database.max_retries`. Default: `3`.
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Delay before each further attempt, indexed by attempt; the last value repeats.
    /// TOML: `database.backoff_ms`. Default: `[1000, 3000, 5000]`.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: Vec<u64>,

    /// TOML: `database.connect_timeout_secs`. Default: `10`.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// TOML: `database.heartbeat_interval_secs`. Default: `30`.
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            local_url: default_local_url(),
            remote_url: None,
            max_retries: default_max_retries(),
            backoff_ms: default_backoff_ms(),
            connect_timeout_secs: default_connect_timeout_secs(),
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
        }
    }
}

impl DatabaseConfig {
    /// Remote connection string, if one is configured and non-blank.
    pub fn remote_url(&self) -> Option<&str> {
        self.remote_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub(crate) fn apply_remote_override(&mut self, url: &str) {
        if !url.trim().is_empty() {
            self.remote_url = Some(url.trim().to_string());
        }
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            max_retries: self.max_retries,
            backoff: self
                .backoff_ms
                .iter()
                .copied()
                .map(Duration::from_millis)
                .collect(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            heartbeat_interval: Duration::from_secs(self.heartbeat_interval_secs),
        }
    }
}

fn default_local_url() -> String {
    "sqlite://portfolio.db".to_string()
}

fn default_max_retries() -> usize {
    3
}

fn default_backoff_ms() -> Vec<u64> {
    vec![1000, 3000, 5000]
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_heartbeat_interval_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_remote_url_means_local_only() {
        let mut cfg = DatabaseConfig {
            remote_url: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(cfg.remote_url(), None);

        cfg.apply_remote_override("");
        assert_eq!(cfg.remote_url(), None);

        cfg.apply_remote_override(" sqlitecloud://host.sqlite.cloud:8860/portfolio ");
        assert_eq!(
            cfg.remote_url(),
            Some("sqlitecloud://host.sqlite.cloud:8860/portfolio")
        );
    }

    #[test]
    fn default_policy_matches_documented_schedule() {
        let policy = DatabaseConfig::default().reconnect_policy();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(
            policy.backoff,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(3),
                Duration::from_secs(5)
            ]
        );
        assert_eq!(policy.connect_timeout, Duration::from_secs(10));
        assert_eq!(policy.heartbeat_interval, Duration::from_secs(30));
    }
}
