use crate::{
    error::Result,
    models::reaction::*,
    routes::{resolve_outcome, single},
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

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/post-reaction", get(list_post_reactions).post(create_post_reaction))
        .route(
            "/post-reaction/:id",
            get(get_post_reaction).delete(delete_post_reaction),
        )
        .route(
            "/comment-reaction",
            get(list_comment_reactions).post(create_comment_reaction),
        )
        .route(
            "/comment-reaction/:id",
            get(get_comment_reaction).delete(delete_comment_reaction),
        )
}

/// GET /post-reaction?post=
async fn list_post_reactions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PostReactionQuery>,
) -> Result<Json<Value>> {
    let reactions = state
        .reaction_service
        .list_post_reactions(query.post.as_deref())
        .await?;
    let data = state.reaction_service.post_reaction_responses(reactions).await?;

    Ok(Json(json!({
        "success": true,
        "data": data
    })))
}

/// POST /post-reaction
async fn create_post_reaction(
    State(state): State<Arc<AppState>>,
    RequireAuth(actor): RequireAuth,
    Json(request): Json<CreatePostReactionRequest>,
) -> Result<Response> {
    let service = &state.reaction_service;
    let outcome = service.react_to_post(&actor, request).await?;
    let outcome = resolve_outcome(outcome, |reaction| async move {
        single(service.post_reaction_responses(vec![reaction]).await?)
    })
    .await?;

    Ok(outcome.into_response())
}

/// GET /post-reaction/:id
async fn get_post_reaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let reaction = state.reaction_service.get_post_reaction(&id).await?;
    let data = single(
        state
            .reaction_service
            .post_reaction_responses(vec![reaction])
            .await?,
    )?;

    Ok(Json(json!({
        "success": true,
        "data": data
    })))
}

/// DELETE /post-reaction/:id
async fn delete_post_reaction(
    State(state): State<Arc<AppState>>,
    RequireAuth(actor): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    state.reaction_service.delete_post_reaction(&actor, &id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Reaction removed"
    })))
}

/// GET /comment-reaction?comment=
async fn list_comment_reactions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CommentReactionQuery>,
) -> Result<Json<Value>> {
    let reactions = state
        .reaction_service
        .list_comment_reactions(query.comment.as_deref())
        .await?;
    let data = state
        .reaction_service
        .comment_reaction_responses(reactions)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": data
    })))
}

/// POST /comment-reaction
async fn create_comment_reaction(
    State(state): State<Arc<AppState>>,
    RequireAuth(actor): RequireAuth,
    Json(request): Json<CreateCommentReactionRequest>,
) -> Result<Response> {
    let service = &state.reaction_service;
    let outcome = service.react_to_comment(&actor, request).await?;
    let outcome = resolve_outcome(outcome, |reaction| async move {
        single(service.comment_reaction_responses(vec![reaction]).await?)
    })
    .await?;

    Ok(outcome.into_response())
}

/// GET /comment-reaction/:id
async fn get_comment_reaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let reaction = state.reaction_service.get_comment_reaction(&id).await?;
    let data = single(
        state
            .reaction_service
            .comment_reaction_responses(vec![reaction])
            .await?,
    )?;

    Ok(Json(json!({
        "success": true,
        "data": data
    })))
}

/// DELETE /comment-reaction/:id
async fn delete_comment_reaction(
    State(state): State<Arc<AppState>>,
    RequireAuth(actor): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    state
        .reaction_service
        .delete_comment_reaction(&actor, &id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Reaction removed"
    })))
}
