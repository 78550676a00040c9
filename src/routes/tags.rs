use crate::{error::Result, state::AppState};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tags", get(list_tags))
        .route("/tags/:name/posts", get(posts_for_tag))
}

/// GET /tags
async fn list_tags(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    let tags = state.tag_service.list_tags().await?;

    Ok(Json(json!({
        "success": true,
        "data": tags
    })))
}

/// GET /tags/:name/posts
async fn posts_for_tag(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Value>> {
    let posts = state.tag_service.posts_for_tag(&name).await?;
    let data = state.post_service.to_responses(posts).await?;

    Ok(Json(json!({
        "success": true,
        "data": data
    })))
}
