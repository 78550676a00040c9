pub mod auth;
pub mod comments;
pub mod posts;
pub mod profiles;
pub mod reactions;
pub mod root;
pub mod saved_posts;
pub mod tags;
pub mod users;

use crate::{
    error::{AppError, Result},
    models::WriteOutcome,
    state::AppState,
};
use axum::Router;
use std::future::Future;
use std::sync::Arc;

/// `/api/v1`：全部资源
pub fn v1_router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(users::router())
        .merge(profiles::router())
        .merge(posts::router())
        .merge(comments::router())
        .merge(reactions::router())
        .merge(saved_posts::router())
        .merge(tags::router())
}

/// `/api/v2`：只暴露用户资源
pub fn v2_router() -> Router<Arc<AppState>> {
    Router::new().merge(users::router())
}

/// 把受保护写入的结果转换为响应类型
pub(crate) async fn resolve_outcome<T, R, F, Fut>(
    outcome: WriteOutcome<T>,
    convert: F,
) -> Result<WriteOutcome<R>>
where
    F: FnOnce(T) -> Fut,
    Fut: Future<Output = Result<R>>,
{
    match outcome {
        WriteOutcome::Created(value) => Ok(WriteOutcome::Created(convert(value).await?)),
        WriteOutcome::Ignored(reason) => Ok(WriteOutcome::Ignored(reason)),
    }
}

pub(crate) fn single<T>(items: Vec<T>) -> Result<T> {
    items
        .into_iter()
        .next()
        .ok_or_else(|| AppError::internal("Failed to build response"))
}
