use crate::{
    error::Result,
    models::profile::*,
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
        .route("/profiles", get(list_profiles).post(create_profile))
        .route("/profiles/me", get(my_profile))
        .route(
            "/profiles/:id",
            get(get_profile).put(update_profile).patch(update_profile),
        )
}

/// GET /profiles
async fn list_profiles(
    State(state): State<Arc<AppState>>,
    RequireAuth(_actor): RequireAuth,
) -> Result<Json<Value>> {
    let profiles = state.profile_service.list_profiles().await?;
    let data = state.profile_service.to_responses(profiles).await?;

    Ok(Json(json!({
        "success": true,
        "data": data
    })))
}

/// POST /profiles
async fn create_profile(
    State(state): State<Arc<AppState>>,
    RequireAuth(actor): RequireAuth,
    Json(request): Json<CreateProfileRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let profile = state.profile_service.create_profile(&actor, request).await?;
    let data = state.profile_service.to_response(profile).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": data
        })),
    ))
}

/// 当前用户的资料，不存在时创建
/// GET /profiles/me
async fn my_profile(
    State(state): State<Arc<AppState>>,
    RequireAuth(actor): RequireAuth,
) -> Result<Json<Value>> {
    let profile = state.profile_service.get_or_create_profile(&actor.id).await?;
    let data = state.profile_service.to_response(profile).await?;

    Ok(Json(json!({
        "success": true,
        "data": data
    })))
}

/// GET /profiles/:id
async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let profile = state.profile_service.get_profile(&id).await?;
    let data = state.profile_service.to_response(profile).await?;

    Ok(Json(json!({
        "success": true,
        "data": data
    })))
}

/// PUT|PATCH /profiles/:id
async fn update_profile(
    State(state): State<Arc<AppState>>,
    RequireAuth(actor): RequireAuth,
    Path(id): Path<String>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<Value>> {
    debug!("User {} updating profile {}", actor.id, id);

    let profile = state
        .profile_service
        .update_profile(&actor, &id, request)
        .await?;
    let data = state.profile_service.to_response(profile).await?;

    Ok(Json(json!({
        "success": true,
        "data": data
    })))
}
