use crate::{
    error::{AppError, Result},
    models::{comment::*, IgnoreReason, WriteOutcome},
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
use validator::Validate;

const NOT_OWNER: &str = "You do not have permission to modify this comment.";

const DELETE_COMMENT_CASCADE: &str = r#"
    BEGIN TRANSACTION;
    DELETE comment_reaction WHERE comment_id = $comment_id;
    DELETE type::thing('comment', $comment_id);
    COMMIT TRANSACTION;
"#;

#[derive(Clone)]
pub struct CommentService {
    db: Arc<Database>,
    guard: VisibilityGuard,
}

impl CommentService {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        let guard = VisibilityGuard::new(db.clone());
        Ok(Self { db, guard })
    }

    fn check_length(&self, content: &str) -> Result<()> {
        if content.chars().count() > self.db.config.max_comment_length {
            return Err(AppError::field(
                "content",
                &format!(
                    "Ensure this field has no more than {} characters.",
                    self.db.config.max_comment_length
                ),
            ));
        }
        Ok(())
    }

    /// 发表评论；草稿文章上的评论被静默忽略
    pub async fn create_comment(
        &self,
        actor: &AuthUser,
        request: CreateCommentRequest,
    ) -> Result<WriteOutcome<Comment>> {
        debug!("User {} commenting on post {}", actor.id, request.post);

        request.validate()?;
        self.check_length(&request.content)?;

        let post = find_by_link(&self.db, &request.post)
            .await?
            .ok_or_else(|| AppError::not_found("Post"))?;

        if post.is_draft() {
            debug!("Post {} is a draft, ignoring comment", post.link);
            return Ok(WriteOutcome::Ignored(IgnoreReason::DraftPost));
        }

        let now = Utc::now();
        let outcome = self
            .guard
            .create_if_published::<_, Comment>(
                "comment",
                &post.key(),
                json!({
                    "post_id": post.key(),
                    "user_id": actor.id,
                    "content": request.content,
                    "created": now,
                    "updated": now,
                }),
            )
            .await?;

        if let WriteOutcome::Created(comment) = &outcome {
            info!("Created comment {} on post {}", comment.key(), post.link);
        }
        Ok(outcome)
    }

    pub async fn get_comment(&self, id: &str) -> Result<Comment> {
        self.db
            .get_by_id::<Comment>("comment", id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment"))
    }

    /// 评论列表，可按文章链接过滤
    pub async fn list_comments(&self, post_link: Option<&str>) -> Result<Vec<Comment>> {
        let mut response = match post_link {
            Some(link) => {
                let post = find_by_link(&self.db, link)
                    .await?
                    .ok_or_else(|| AppError::not_found("Post"))?;
                self.db
                    .query_with_params(
                        "SELECT * FROM comment WHERE post_id = $post_id ORDER BY created ASC",
                        json!({ "post_id": post.key() }),
                    )
                    .await?
            }
            None => {
                self.db
                    .query("SELECT * FROM comment ORDER BY created ASC")
                    .await?
            }
        };

        let comments: Vec<Comment> = response.take(0)?;
        Ok(comments)
    }

    /// 修改评论内容；文章已回到草稿时修改被忽略
    pub async fn update_comment(
        &self,
        actor: &AuthUser,
        id: &str,
        request: UpdateCommentRequest,
    ) -> Result<WriteOutcome<Comment>> {
        let comment = self.get_comment(id).await?;
        ensure_owner(actor, &comment.user_id, NOT_OWNER)?;

        request.validate()?;
        self.check_length(&request.content)?;

        self.guard
            .update_if_published(
                "comment",
                &comment.key(),
                &comment.post_id,
                json!({
                    "content": request.content,
                    "updated": Utc::now(),
                }),
            )
            .await
    }

    /// 删除评论及其点赞
    pub async fn delete_comment(&self, actor: &AuthUser, id: &str) -> Result<()> {
        let comment = self.get_comment(id).await?;
        ensure_owner(actor, &comment.user_id, NOT_OWNER)?;

        self.db
            .execute(DELETE_COMMENT_CASCADE, json!({ "comment_id": comment.key() }))
            .await?;

        info!("Deleted comment {}", comment.key());
        Ok(())
    }

    pub async fn to_responses(&self, comments: Vec<Comment>) -> Result<Vec<CommentResponse>> {
        let user_ids: Vec<String> = comments.iter().map(|c| c.user_id.clone()).collect();
        let post_ids: Vec<String> = comments.iter().map(|c| c.post_id.clone()).collect();
        let names = usernames_for(&self.db, &user_ids).await?;
        let links = links_for(&self.db, &post_ids).await?;

        Ok(comments
            .into_iter()
            .map(|comment| CommentResponse {
                id: comment.key(),
                post: links.get(&comment.post_id).cloned().unwrap_or_default(),
                user: names.get(&comment.user_id).cloned().unwrap_or_default(),
                content: comment.content,
                created: comment.created,
                updated: comment.updated,
            })
            .collect())
    }

    pub async fn to_response(&self, comment: Comment) -> Result<CommentResponse> {
        self.to_responses(vec![comment])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::internal("Failed to build comment response"))
    }
}
