use crate::utils::validation::not_blank;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Thing,
    pub post_id: String,
    pub user_id: String,
    pub content: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Comment {
    pub fn key(&self) -> String {
        self.id.id.to_raw()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: String,
    pub post: String,
    pub user: String,
    pub content: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCommentRequest {
    /// 文章链接
    #[validate(length(min = 1))]
    pub post: String,
    #[validate(length(min = 1, max = 10000), custom = "not_blank")]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[validate(length(min = 1, max = 10000), custom = "not_blank")]
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentQuery {
    pub post: Option<String>,
}
