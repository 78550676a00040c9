use crate::{
    error::Result,
    models::user::{LoginRequest, LoginResponse},
    state::AppState,
};
use axum::{extract::State, response::Json, routing::post, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/login", post(login))
}

/// 登录并获取令牌
/// POST /api/auth/login
async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>> {
    debug!("Login attempt for {}", request.username);

    let user = state.user_service.authenticate(request).await?;
    let token = state.auth_service.issue_token(&user)?;

    info!("User {} logged in", user.username);

    Ok(Json(json!({
        "success": true,
        "data": LoginResponse {
            token,
            user: user.to_response(),
        }
    })))
}
