use crate::{
    error::Result,
    models::user::*,
    state::AppState,
    utils::middleware::RequireAuth,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/user", get(list_users).post(create_user))
        .route(
            "/user/:username",
            get(get_user)
                .put(update_user)
                .patch(update_user)
                .delete(delete_user),
        )
}

/// 用户列表
/// GET /user
async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    let users: Vec<UserResponse> = state
        .user_service
        .list_users()
        .await?
        .iter()
        .map(User::to_response)
        .collect();

    Ok(Json(json!({
        "success": true,
        "data": users
    })))
}

/// 注册
/// POST /user
async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    debug!("Registering user {}", request.username);

    let user = state.user_service.create_user(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": user.to_response()
        })),
    ))
}

/// GET /user/:username
async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<Value>> {
    let user = state.user_service.get_user_by_username(&username).await?;

    Ok(Json(json!({
        "success": true,
        "data": user.to_response()
    })))
}

/// PUT|PATCH /user/:username
async fn update_user(
    State(state): State<Arc<AppState>>,
    RequireAuth(actor): RequireAuth,
    Path(username): Path<String>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<Value>> {
    let user = state
        .user_service
        .update_user(&actor, &username, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": user.to_response()
    })))
}

/// DELETE /user/:username
async fn delete_user(
    State(state): State<Arc<AppState>>,
    RequireAuth(actor): RequireAuth,
    Path(username): Path<String>,
) -> Result<Json<Value>> {
    state.user_service.delete_user(&actor, &username).await?;

    Ok(Json(json!({
        "success": true,
        "message": "User deleted successfully"
    })))
}
