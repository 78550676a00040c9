use crate::{
    error::{AppError, Result},
    models::{reaction::*, IgnoreReason, WriteOutcome},
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

const NOT_OWNER: &str = "You do not have permission to remove this reaction.";

/// 文章和评论的点赞
#[derive(Clone)]
pub struct ReactionService {
    db: Arc<Database>,
    guard: VisibilityGuard,
}

impl ReactionService {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        let guard = VisibilityGuard::new(db.clone());
        Ok(Self { db, guard })
    }

    /// 给文章点赞；草稿或重复点赞被静默忽略
    pub async fn react_to_post(
        &self,
        actor: &AuthUser,
        request: CreatePostReactionRequest,
    ) -> Result<WriteOutcome<PostReaction>> {
        debug!("User {} reacting to post {}", actor.id, request.post);

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
                "post_reaction",
                &[("post_id", post_id.as_str()), ("user_id", actor.id.as_str())],
            )
            .await?
        {
            debug!("User {} already reacted to post {}", actor.id, post_id);
            return Ok(WriteOutcome::Ignored(IgnoreReason::Duplicate));
        }

        let outcome = self
            .guard
            .create_if_published::<_, PostReaction>(
                "post_reaction",
                &post_id,
                json!({
                    "post_id": post_id,
                    "user_id": actor.id,
                    "kind": request.kind,
                    "created": Utc::now(),
                }),
            )
            .await?;

        if outcome.is_created() {
            info!("User {} liked post {}", actor.id, post.link);
        }
        Ok(outcome)
    }

    pub async fn get_post_reaction(&self, id: &str) -> Result<PostReaction> {
        self.db
            .get_by_id::<PostReaction>("post_reaction", id)
            .await?
            .ok_or_else(|| AppError::not_found("Post reaction"))
    }

    pub async fn list_post_reactions(&self, post_link: Option<&str>) -> Result<Vec<PostReaction>> {
        let mut response = match post_link {
            Some(link) => {
                let post = find_by_link(&self.db, link)
                    .await?
                    .ok_or_else(|| AppError::not_found("Post"))?;
                self.db
                    .query_with_params(
                        "SELECT * FROM post_reaction WHERE post_id = $post_id ORDER BY created ASC",
                        json!({ "post_id": post.key() }),
                    )
                    .await?
            }
            None => {
                self.db
                    .query("SELECT * FROM post_reaction ORDER BY created ASC")
                    .await?
            }
        };
        let reactions: Vec<PostReaction> = response.take(0)?;
        Ok(reactions)
    }

    pub async fn delete_post_reaction(&self, actor: &AuthUser, id: &str) -> Result<()> {
        let reaction = self.get_post_reaction(id).await?;
        ensure_owner(actor, &reaction.user_id, NOT_OWNER)?;

        self.db.delete_by_id("post_reaction", &reaction.key()).await?;
        info!("Removed post reaction {}", reaction.key());
        Ok(())
    }

    /// 给评论点赞；评论所在文章是草稿时忽略
    pub async fn react_to_comment(
        &self,
        actor: &AuthUser,
        request: CreateCommentReactionRequest,
    ) -> Result<WriteOutcome<CommentReaction>> {
        debug!("User {} reacting to comment {}", actor.id, request.comment);

        let comment: crate::models::comment::Comment = self
            .db
            .get_by_id("comment", &request.comment)
            .await?
            .ok_or_else(|| AppError::not_found("Comment"))?;
        let comment_id = comment.key();

        if self
            .guard
            .exists(
                "comment_reaction",
                &[("comment_id", comment_id.as_str()), ("user_id", actor.id.as_str())],
            )
            .await?
        {
            debug!("User {} already reacted to comment {}", actor.id, comment_id);
            return Ok(WriteOutcome::Ignored(IgnoreReason::Duplicate));
        }

        // 通过评论解析到文章，由守卫读取文章状态
        let outcome = self
            .guard
            .create_if_published::<_, CommentReaction>(
                "comment_reaction",
                &comment.post_id,
                json!({
                    "comment_id": comment_id,
                    "user_id": actor.id,
                    "kind": request.kind,
                    "created": Utc::now(),
                }),
            )
            .await?;

        if outcome.is_created() {
            info!("User {} liked comment {}", actor.id, comment_id);
        }
        Ok(outcome)
    }

    pub async fn get_comment_reaction(&self, id: &str) -> Result<CommentReaction> {
        self.db
            .get_by_id::<CommentReaction>("comment_reaction", id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment reaction"))
    }

    pub async fn list_comment_reactions(
        &self,
        comment_id: Option<&str>,
    ) -> Result<Vec<CommentReaction>> {
        let mut response = match comment_id {
            Some(id) => {
                self.db
                    .query_with_params(
                        "SELECT * FROM comment_reaction WHERE comment_id = $comment_id ORDER BY created ASC",
                        json!({ "comment_id": id }),
                    )
                    .await?
            }
            None => {
                self.db
                    .query("SELECT * FROM comment_reaction ORDER BY created ASC")
                    .await?
            }
        };
        let reactions: Vec<CommentReaction> = response.take(0)?;
        Ok(reactions)
    }

    pub async fn delete_comment_reaction(&self, actor: &AuthUser, id: &str) -> Result<()> {
        let reaction = self.get_comment_reaction(id).await?;
        ensure_owner(actor, &reaction.user_id, NOT_OWNER)?;

        self.db
            .delete_by_id("comment_reaction", &reaction.key())
            .await?;
        info!("Removed comment reaction {}", reaction.key());
        Ok(())
    }

    pub async fn post_reaction_responses(
        &self,
        reactions: Vec<PostReaction>,
    ) -> Result<Vec<PostReactionResponse>> {
        let user_ids: Vec<String> = reactions.iter().map(|r| r.user_id.clone()).collect();
        let post_ids: Vec<String> = reactions.iter().map(|r| r.post_id.clone()).collect();
        let names = usernames_for(&self.db, &user_ids).await?;
        let links = links_for(&self.db, &post_ids).await?;

        Ok(reactions
            .into_iter()
            .map(|reaction| PostReactionResponse {
                id: reaction.key(),
                post: links.get(&reaction.post_id).cloned().unwrap_or_default(),
                user: names.get(&reaction.user_id).cloned().unwrap_or_default(),
                kind: reaction.kind,
                created: reaction.created,
            })
            .collect())
    }

    pub async fn comment_reaction_responses(
        &self,
        reactions: Vec<CommentReaction>,
    ) -> Result<Vec<CommentReactionResponse>> {
        let user_ids: Vec<String> = reactions.iter().map(|r| r.user_id.clone()).collect();
        let names = usernames_for(&self.db, &user_ids).await?;

        Ok(reactions
            .into_iter()
            .map(|reaction| CommentReactionResponse {
                id: reaction.key(),
                user: names.get(&reaction.user_id).cloned().unwrap_or_default(),
                comment: reaction.comment_id,
                kind: reaction.kind,
                created: reaction.created,
            })
            .collect())
    }
}
