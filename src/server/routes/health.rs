use crate::db::HealthSnapshot;
use crate::server::router::FolioState;
use axum::{Json, extract::State};
use chrono::Utc;
use serde_json::{Value, json};

/// Liveness of the HTTP process itself; does not touch the database.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "OK", "timestamp": Utc::now() }))
}

pub async fn connection_status(State(state): State<FolioState>) -> Json<HealthSnapshot> {
    Json(state.db.health_snapshot().await)
}
