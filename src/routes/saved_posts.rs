use crate::{
    error::Result,
    models::saved_post::*,
    routes::{resolve_outcome, single},
    state::AppState,
    utils::middleware::RequireAuth,
};
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

/// 收藏接口全部需要登录，且只能访问自己的收藏
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/saved-post", get(list_saved).post(save_post))
        .route("/saved-post/:id", get(get_saved).delete(delete_saved))
}

/// GET /saved-post
async fn list_saved(
    State(state): State<Arc<AppState>>,
    RequireAuth(actor): RequireAuth,
) -> Result<Json<Value>> {
    let saved = state.saved_post_service.list_saved(&actor).await?;
    let data = state.saved_post_service.to_responses(saved).await?;

    Ok(Json(json!({
        "success": true,
        "data": data
    })))
}

/// POST /saved-post
async fn save_post(
    State(state): State<Arc<AppState>>,
    RequireAuth(actor): RequireAuth,
    Json(request): Json<CreateSavedPostRequest>,
) -> Result<Response> {
    let service = &state.saved_post_service;
    let outcome = service.save_post(&actor, request).await?;
    let outcome = resolve_outcome(outcome, |saved| async move {
        single(service.to_responses(vec![saved]).await?)
    })
    .await?;

    Ok(outcome.into_response())
}

/// GET /saved-post/:id
async fn get_saved(
    State(state): State<Arc<AppState>>,
    RequireAuth(actor): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let saved = state.saved_post_service.get_saved(&actor, &id).await?;
    let data = single(state.saved_post_service.to_responses(vec![saved]).await?)?;

    Ok(Json(json!({
        "success": true,
        "data": data
    })))
}

/// DELETE /saved-post/:id
async fn delete_saved(
    State(state): State<Arc<AppState>>,
    RequireAuth(actor): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    state.saved_post_service.delete_saved(&actor, &id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Saved post removed"
    })))
}
