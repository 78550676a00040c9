use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;

/// 点赞类型，目前只有一种
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReactionKind {
    #[default]
    #[serde(rename = "LK", alias = "like")]
    Like,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostReaction {
    pub id: Thing,
    pub post_id: String,
    pub user_id: String,
    #[serde(default)]
    pub kind: ReactionKind,
    pub created: DateTime<Utc>,
}

impl PostReaction {
    pub fn key(&self) -> String {
        self.id.id.to_raw()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentReaction {
    pub id: Thing,
    pub comment_id: String,
    pub user_id: String,
    #[serde(default)]
    pub kind: ReactionKind,
    pub created: DateTime<Utc>,
}

impl CommentReaction {
    pub fn key(&self) -> String {
        self.id.id.to_raw()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostReactionResponse {
    pub id: String,
    pub post: String,
    pub user: String,
    pub kind: ReactionKind,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentReactionResponse {
    pub id: String,
    pub comment: String,
    pub user: String,
    pub kind: ReactionKind,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostReactionRequest {
    /// 文章链接
    pub post: String,
    #[serde(default)]
    pub kind: ReactionKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommentReactionRequest {
    /// 评论 ID
    pub comment: String,
    #[serde(default)]
    pub kind: ReactionKind,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostReactionQuery {
    pub post: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentReactionQuery {
    pub comment: Option<String>,
}
