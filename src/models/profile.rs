use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;
use validator::Validate;

/// 用户资料，保存双向的关注关系
///
/// `follows` 与 `followers` 中存放的是用户记录键。两个集合分别存储，
/// 但只能通过 `ProfileService` 成对修改。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Thing,
    pub user_id: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub follows: Vec<String>,
    #[serde(default)]
    pub followers: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn key(&self) -> String {
        self.id.id.to_raw()
    }

    pub fn is_following(&self, user_id: &str) -> bool {
        self.follows.iter().any(|id| id == user_id)
    }

    pub fn is_followed_by(&self, user_id: &str) -> bool {
        self.followers.iter().any(|id| id == user_id)
    }
}

/// 对外暴露的资料，关注关系以用户名表示
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub bio: String,
    pub avatar: Option<String>,
    pub follows: Vec<String>,
    pub followers: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateProfileRequest {
    pub bio: Option<String>,
    #[validate(length(max = 255))]
    pub avatar: Option<String>,
}

/// 资料更新请求；`follows` 给出完整的目标关注列表（用户名）
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    pub bio: Option<String>,
    #[validate(length(max = 255))]
    pub avatar: Option<String>,
    pub follows: Option<Vec<String>>,
}
