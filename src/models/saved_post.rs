use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;

/// 收藏的文章
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedPost {
    pub id: Thing,
    pub user_id: String,
    pub post_id: String,
    pub created: DateTime<Utc>,
}

impl SavedPost {
    pub fn key(&self) -> String {
        self.id.id.to_raw()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedPostResponse {
    pub id: String,
    pub post: String,
    pub user: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSavedPostRequest {
    /// 文章链接
    pub post: String,
}
