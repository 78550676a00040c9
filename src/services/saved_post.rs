use crate::{
    error::{AppError, Result},
    models::{saved_post::*, IgnoreReason, WriteOutcome},
    services::{
        auth::{ensure_owner, AuthUser},
        database::Database,
        guard::VisibilityGuard,
        post::{find_by_link, links_for},
        user::usernames_for,
    },
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

const NOT_OWNER: &str = "You do not have permission to access this saved post.";

/// 收藏服务；收藏只对本人可见
#[derive(Clone)]
pub struct SavedPostService {
    db: Arc<Database>,
    guard: VisibilityGuard,
}

impl SavedPostService {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        let guard = VisibilityGuard::new(db.clone());
        Ok(Self { db, guard })
    }

    /// 收藏文章；草稿或重复收藏被静默忽略
    pub async fn save_post(
        &self,
        actor: &AuthUser,
        request: CreateSavedPostRequest,
    ) -> Result<WriteOutcome<SavedPost>> {
        debug!("User {} saving post {}", actor.id, request.post);

        let post = find_by_link(&self.db, &request.post)
            .await?
            .ok_or_else(|| AppError::not_found("Post"))?;
        let post_id = post.key();

        if post.is_draft() {
            return Ok(WriteOutcome::Ignored(IgnoreReason::DraftPost));
        }
        if self
            .guard
            .exists(
                "saved_post",
                &[("user_id", actor.id.as_str()), ("post_id", post_id.as_str())],
            )
            .await?
        {
            debug!("User {} already saved post {}", actor.id, post_id);
            return Ok(WriteOutcome::Ignored(IgnoreReason::Duplicate));
        }

        let outcome = self
            .guard
            .create_if_published::<_, SavedPost>(
                "saved_post",
                &post_id,
                json!({
                    "user_id": actor.id,
                    "post_id": post_id,
                    "created": Utc::now(),
                }),
            )
            .await?;

        if outcome.is_created() {
            info!("User {} saved post {}", actor.id, post.link);
        }
        Ok(outcome)
    }

    /// 当前用户自己的收藏
    pub async fn list_saved(&self, actor: &AuthUser) -> Result<Vec<SavedPost>> {
        let mut response = self
            .db
            .query_with_params(
                "SELECT * FROM saved_post WHERE user_id = $user_id ORDER BY created DESC",
                json!({ "user_id": actor.id }),
            )
            .await?;
        let saved: Vec<SavedPost> = response.take(0)?;
        Ok(saved)
    }

    pub async fn get_saved(&self, actor: &AuthUser, id: &str) -> Result<SavedPost> {
        let saved = self
            .db
            .get_by_id::<SavedPost>("saved_post", id)
            .await?
            .ok_or_else(|| AppError::not_found("Saved post"))?;
        ensure_owner(actor, &saved.user_id, NOT_OWNER)?;
        Ok(saved)
    }

    pub async fn delete_saved(&self, actor: &AuthUser, id: &str) -> Result<()> {
        let saved = self.get_saved(actor, id).await?;
        self.db.delete_by_id("saved_post", &saved.key()).await?;

        info!("User {} removed saved post {}", actor.id, saved.key());
        Ok(())
    }

    pub async fn to_responses(&self, saved: Vec<SavedPost>) -> Result<Vec<SavedPostResponse>> {
        let user_ids: Vec<String> = saved.iter().map(|s| s.user_id.clone()).collect();
        let post_ids: Vec<String> = saved.iter().map(|s| s.post_id.clone()).collect();
        let names = usernames_for(&self.db, &user_ids).await?;
        let links = links_for(&self.db, &post_ids).await?;

        Ok(saved
            .into_iter()
            .map(|entry| SavedPostResponse {
                id: entry.key(),
                post: links.get(&entry.post_id).cloned().unwrap_or_default(),
                user: names.get(&entry.user_id).cloned().unwrap_or_default(),
                created: entry.created,
            })
            .collect())
    }
}
