use super::{RemoteConnection, RemoteConnector};
use crate::error::DbError;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;
use tracing::debug;
use url::Url;

const CLOUD_SCHEME: &str = "sqlitecloud";
const SQL_ENDPOINT_PATH: &str = "/v2/weblite/sql";
const USER_AGENT: &str = concat!("folio/", env!("CARGO_PKG_VERSION"));
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const ERROR_PREVIEW_CHARS: usize = 256;

/// Where and how to reach the cloud SQLite service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudTarget {
    pub endpoint: Url,
    pub database: Option<String>,
    pub request_timeout: Duration,
    bearer: String,
}

impl CloudTarget {
    /// Parses `sqlitecloud://[user:pass@]host[:port]/database[?timeout=N&apikey=K]`.
    pub fn parse(connection_string: &str) -> Result<Self, DbError> {
        let trimmed = connection_string.trim();
        let url = Url::parse(trimmed)
            .map_err(|e| DbError::InvalidConnectionString(format!("{e}")))?;

        if url.scheme() != CLOUD_SCHEME {
            return Err(DbError::InvalidConnectionString(format!(
                "expected scheme `{CLOUD_SCHEME}`, got `{}`",
                url.scheme()
            )));
        }
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| DbError::InvalidConnectionString("missing host".to_string()))?;

        let database = url
            .path()
            .trim_matches('/')
            .split('/')
            .next()
            .filter(|db| !db.is_empty())
            .map(str::to_string);

        let request_timeout = url
            .query_pairs()
            .find(|(k, _)| k == "timeout")
            .and_then(|(_, v)| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map_or(DEFAULT_REQUEST_TIMEOUT, Duration::from_secs);

        let endpoint = Url::parse(&format!("https://{host}{SQL_ENDPOINT_PATH}"))
            .map_err(|e| DbError::InvalidConnectionString(format!("{e}")))?;

        Ok(Self {
            endpoint,
            database,
            request_timeout,
            bearer: trimmed.to_string(),
        })
    }
}

/// Connects to the cloud service's HTTP SQL endpoint.
pub struct CloudConnector {
    target: Arc<CloudTarget>,
    connect_timeout: Duration,
}

impl CloudConnector {
    pub fn new(connection_string: &str, connect_timeout: Duration) -> Result<Self, DbError> {
        Ok(Self {
            target: Arc::new(CloudTarget::parse(connection_string)?),
            connect_timeout,
        })
    }

    pub fn target(&self) -> &CloudTarget {
        &self.target
    }
}

#[async_trait]
impl RemoteConnector for CloudConnector {
    async fn connect(&self) -> Result<Arc<dyn RemoteConnection>, DbError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(self.connect_timeout)
            .timeout(self.target.request_timeout)
            .build()
            .map_err(|e| DbError::remote(format!("failed to build HTTP client: {e}")))?;

        debug!(endpoint = %self.target.endpoint, "Opening cloud database connection");
        Ok(Arc::new(CloudConnection {
            client,
            target: self.target.clone(),
            closed: AtomicBool::new(false),
        }))
    }
}

#[derive(Serialize)]
struct SqlRequest<'a> {
    sql: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<&'a str>,
}

struct CloudConnection {
    client: reqwest::Client,
    target: Arc<CloudTarget>,
    closed: AtomicBool,
}

#[async_trait]
impl RemoteConnection for CloudConnection {
    async fn execute(&self, sql: &str) -> Result<Value, DbError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(DbError::remote("connection disconnected"));
        }

        let resp = self
            .client
            .post(self.target.endpoint.clone())
            .bearer_auth(&self.target.bearer)
            .json(&SqlRequest {
                sql,
                database: self.target.database.as_deref(),
            })
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        if status.is_success() {
            return resp.json::<Value>().await.map_err(transport_error);
        }

        let body = resp.text().await.unwrap_or_default();
        Err(status_error(status, &body))
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

fn transport_error(e: reqwest::Error) -> DbError {
    if e.is_timeout() {
        DbError::remote(format!("request timeout: {e}"))
    } else if e.is_connect() {
        DbError::remote(format!("connection unavailable: {e}"))
    } else if e.is_decode() {
        DbError::remote(format!("malformed response: {e}"))
    } else if e.is_request() || e.is_body() {
        DbError::remote(format!("connection reset: {e}"))
    } else {
        DbError::remote(format!("request failed: {e}"))
    }
}

fn status_error(status: StatusCode, body: &str) -> DbError {
    match status {
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            DbError::remote(format!("service unavailable ({status})"))
        }
        _ => {
            let message = serde_json::from_str::<Value>(body)
                .ok()
                .and_then(|v| error_message(&v))
                .unwrap_or_else(|| format!("{body:.len$}", len = ERROR_PREVIEW_CHARS));
            DbError::remote(format!("{status}: {message}"))
        }
    }
}

fn error_message(body: &Value) -> Option<String> {
    let err = body.get("error")?;
    match err {
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => obj
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}
