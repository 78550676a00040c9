use axum::response::Json;
use serde_json::{json, Value};

pub async fn health_check() -> &'static str {
    "Bloga is running!"
}

/// API 根：列出可用版本
/// GET /api
pub async fn api_root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "versions": {
                "v1": "/api/v1/",
                "v2": "/api/v2/"
            }
        }
    }))
}
