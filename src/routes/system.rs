use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

pub async fn index() -> Json<Value> {
    Json(json!({ "message": "NextFab API is running!" }))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "OK", "timestamp": Utc::now().to_rfc3339() }))
}
