use crate::{
    error::Result,
    models::post::*,
    state::AppState,
    utils::middleware::{OptionalAuth, RequireAuth},
};
use axum::{
    extract::{Path, Query, State},
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
        .route("/post", get(list_posts).post(create_post))
        .route(
            "/post/:link",
            get(get_post)
                .put(update_post)
                .patch(update_post)
                .delete(delete_post),
        )
}

/// 已发布文章和自己的草稿
/// GET /post?tag=
async fn list_posts(
    State(state): State<Arc<AppState>>,
    OptionalAuth(viewer): OptionalAuth,
    Query(query): Query<PostQuery>,
) -> Result<Json<Value>> {
    let posts = state
        .post_service
        .list_posts(viewer.as_ref(), query.tag.as_deref())
        .await?;
    let data = state.post_service.to_responses(posts).await?;

    Ok(Json(json!({
        "success": true,
        "data": data
    })))
}

/// POST /post
async fn create_post(
    State(state): State<Arc<AppState>>,
    RequireAuth(author): RequireAuth,
    Json(request): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    debug!("User {} creating post", author.id);

    let post = state.post_service.create_post(&author, request).await?;
    let data = state.post_service.to_response(post).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": data
        })),
    ))
}

/// GET /post/:link
async fn get_post(
    State(state): State<Arc<AppState>>,
    OptionalAuth(viewer): OptionalAuth,
    Path(link): Path<String>,
) -> Result<Json<Value>> {
    let post = state
        .post_service
        .get_post_by_link(&link, viewer.as_ref())
        .await?;
    let data = state.post_service.to_response(post).await?;

    Ok(Json(json!({
        "success": true,
        "data": data
    })))
}

/// PUT|PATCH /post/:link
async fn update_post(
    State(state): State<Arc<AppState>>,
    RequireAuth(actor): RequireAuth,
    Path(link): Path<String>,
    Json(request): Json<UpdatePostRequest>,
) -> Result<Json<Value>> {
    let post = state.post_service.update_post(&actor, &link, request).await?;
    let data = state.post_service.to_response(post).await?;

    Ok(Json(json!({
        "success": true,
        "data": data
    })))
}

/// DELETE /post/:link
async fn delete_post(
    State(state): State<Arc<AppState>>,
    RequireAuth(actor): RequireAuth,
    Path(link): Path<String>,
) -> Result<Json<Value>> {
    state.post_service.delete_post(&actor, &link).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Post deleted successfully"
    })))
}
