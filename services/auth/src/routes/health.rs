use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "auth-service",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
