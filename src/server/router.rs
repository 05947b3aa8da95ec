use crate::db::ConnectionManager;
use crate::server::guards::auth::RequireAdminKey;
use crate::server::routes::health::{connection_status, health};

use axum::{
    Router,
    extract::Request,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header::USER_AGENT},
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use base64::Engine as _;
use rand::RngCore;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

const MAX_REQUEST_ID_LEN: usize = 128;
const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Shared state handed to every route.
#[derive(Clone)]
pub struct FolioState {
    pub db: ConnectionManager,
    pub admin_key: Arc<str>,
}

impl FolioState {
    pub fn new(db: ConnectionManager, admin_key: Arc<str>) -> Self {
        Self { db, admin_key }
    }
}

/// Reuses a sane caller-supplied request id, otherwise mints 96 random bits.
fn request_id(headers: &HeaderMap) -> String {
    if let Some(id) = headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN)
    {
        return id.to_string();
    }
    let mut bytes = [0u8; 12];
    rand::rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

async fn access_log(req: Request, next: Next) -> Response {
    let request_id = request_id(req.headers());
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let version = req.version();
    let user_agent = req
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    let started = Instant::now();
    let mut resp = next.run(req).await;
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        resp.headers_mut().insert(X_REQUEST_ID, value);
    }

    let status = resp.status().as_u16();
    macro_rules! log_request {
        ($level:ident) => {
            $level!(
                status,
                request_id = %request_id,
                method = %method,
                path = %path,
                version = ?version,
                latency_ms,
                user_agent = %user_agent,
                "request"
            )
        };
    }
    if resp.status().is_server_error() {
        log_request!(error);
    } else if resp.status().is_client_error() {
        log_request!(warn);
    } else {
        log_request!(info);
    }

    resp
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

pub fn folio_router(state: FolioState) -> Router {
    let admin = Router::new()
        .route("/api/admin/dashboard/connection-status", get(connection_status))
        .route_layer(middleware::from_extractor_with_state::<RequireAdminKey, _>(
            state.clone(),
        ));

    Router::new()
        .route("/health", get(health))
        .merge(admin)
        .fallback(not_found)
        .with_state(state)
        .layer(middleware::from_fn(access_log))
}
