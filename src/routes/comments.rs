use crate::{
    error::Result,
    models::{comment::*, WriteOutcome},
    routes::resolve_outcome,
    state::AppState,
    utils::middleware::RequireAuth,
};
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/comment", get(list_comments).post(create_comment))
        .route(
            "/comment/:id",
            get(get_comment)
                .put(update_comment)
                .patch(update_comment)
                .delete(delete_comment),
        )
}

/// GET /comment?post=
async fn list_comments(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CommentQuery>,
) -> Result<Json<Value>> {
    let comments = state
        .comment_service
        .list_comments(query.post.as_deref())
        .await?;
    let data = state.comment_service.to_responses(comments).await?;

    Ok(Json(json!({
        "success": true,
        "data": data
    })))
}

/// POST /comment
async fn create_comment(
    State(state): State<Arc<AppState>>,
    RequireAuth(actor): RequireAuth,
    Json(request): Json<CreateCommentRequest>,
) -> Result<Response> {
    debug!("User {} commenting on {}", actor.id, request.post);

    let outcome = state.comment_service.create_comment(&actor, request).await?;
    let outcome = resolve_outcome(outcome, |comment| {
        state.comment_service.to_response(comment)
    })
    .await?;

    Ok(outcome.into_response())
}

/// GET /comment/:id
async fn get_comment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let comment = state.comment_service.get_comment(&id).await?;
    let data = state.comment_service.to_response(comment).await?;

    Ok(Json(json!({
        "success": true,
        "data": data
    })))
}

/// PUT|PATCH /comment/:id
async fn update_comment(
    State(state): State<Arc<AppState>>,
    RequireAuth(actor): RequireAuth,
    Path(id): Path<String>,
    Json(request): Json<UpdateCommentRequest>,
) -> Result<Json<Value>> {
    let outcome = state
        .comment_service
        .update_comment(&actor, &id, request)
        .await?;

    match outcome {
        WriteOutcome::Created(comment) => {
            let data = state.comment_service.to_response(comment).await?;
            Ok(Json(json!({
                "success": true,
                "updated": true,
                "data": data
            })))
        }
        WriteOutcome::Ignored(reason) => Ok(Json(json!({
            "success": true,
            "updated": false,
            "reason": reason
        }))),
    }
}

/// DELETE /comment/:id
async fn delete_comment(
    State(state): State<Arc<AppState>>,
    RequireAuth(actor): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    state.comment_service.delete_comment(&actor, &id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Comment deleted successfully"
    })))
}
