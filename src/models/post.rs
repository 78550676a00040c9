use crate::utils::validation::not_blank;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;
use validator::Validate;

/// 文章状态；存储和传输都使用两字母代码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PostStatus {
    #[default]
    #[serde(rename = "DF", alias = "draft")]
    Draft,
    #[serde(rename = "PB", alias = "published")]
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "DF",
            PostStatus::Published => "PB",
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, PostStatus::Published)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Thing,
    pub title: String,
    pub link: String,
    pub author_id: String,
    pub content: String,
    pub status: PostStatus,
    #[serde(default)]
    pub publish: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Post {
    pub fn key(&self) -> String {
        self.id.id.to_raw()
    }

    pub fn is_draft(&self) -> bool {
        !self.status.is_published()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: String,
    pub title: String,
    pub link: String,
    pub author: String,
    pub content: String,
    pub content_html: String,
    pub excerpt: String,
    pub status: PostStatus,
    pub publish: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(min = 1), custom = "not_blank")]
    pub title: String,
    #[validate(custom = "not_blank")]
    pub content: String,
    #[serde(default)]
    pub status: PostStatus,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// 更新模式：只修改给出的字段，链接永不改变
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdatePostRequest {
    #[validate(length(min = 1), custom = "not_blank")]
    pub title: Option<String>,
    #[validate(custom = "not_blank")]
    pub content: Option<String>,
    pub status: Option<PostStatus>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostQuery {
    pub tag: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_codes() {
        assert_eq!(serde_json::to_string(&PostStatus::Draft).unwrap(), "\"DF\"");
        assert_eq!(serde_json::to_string(&PostStatus::Published).unwrap(), "\"PB\"");

        let parsed: PostStatus = serde_json::from_str("\"published\"").unwrap();
        assert_eq!(parsed, PostStatus::Published);
        let parsed: PostStatus = serde_json::from_str("\"DF\"").unwrap();
        assert_eq!(parsed, PostStatus::Draft);
    }

    #[test]
    fn test_create_request_defaults_to_draft() {
        let req: CreatePostRequest =
            serde_json::from_str(r#"{"title":"Hello","content":"Body"}"#).unwrap();
        assert_eq!(req.status, PostStatus::Draft);
        assert!(req.tags.is_empty());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_blank_title_rejected() {
        let req = CreatePostRequest {
            title: "   ".to_string(),
            content: "Body".to_string(),
            status: PostStatus::Draft,
            tags: vec![],
        };
        assert!(req.validate().is_err());
    }
}
