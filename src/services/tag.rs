use crate::{
    error::Result,
    models::{post::Post, tag::*},
    services::{database::Database, post::sort_posts},
};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// 标签规范化：按逗号拆分、去空白、转小写、去重（保留首次出现的顺序）
pub fn normalize_tags(raw: &[String]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for entry in raw {
        for part in entry.split(',') {
            let tag = part.trim().to_lowercase();
            if !tag.is_empty() && !tags.contains(&tag) {
                tags.push(tag);
            }
        }
    }
    tags
}

#[derive(Clone)]
pub struct TagService {
    db: Arc<Database>,
}

impl TagService {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self { db })
    }

    /// 已发布文章上的所有标签及文章数，按名称排序
    pub async fn list_tags(&self) -> Result<Vec<TagCount>> {
        let mut response = self
            .db
            .query("SELECT VALUE tags FROM post WHERE status = 'PB'")
            .await?;
        let tag_lists: Vec<Option<Vec<String>>> = response.take(0)?;

        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for tags in tag_lists.into_iter().flatten() {
            for tag in tags {
                *counts.entry(tag).or_default() += 1;
            }
        }

        debug!("Found {} distinct tags", counts.len());
        Ok(counts
            .into_iter()
            .map(|(name, post_count)| TagCount { name, post_count })
            .collect())
    }

    /// 带有该标签的已发布文章（不区分大小写）
    pub async fn posts_for_tag(&self, name: &str) -> Result<Vec<Post>> {
        let tag = name.trim().to_lowercase();

        let mut response = self
            .db
            .query_with_params(
                "SELECT * FROM post WHERE status = 'PB' AND $tag INSIDE tags",
                json!({ "tag": tag }),
            )
            .await?;
        let mut posts: Vec<Post> = response.take(0)?;
        sort_posts(&mut posts);
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tags() {
        let raw = vec![
            "Rust, web".to_string(),
            " RUST ".to_string(),
            "".to_string(),
            "axum,,".to_string(),
        ];
        assert_eq!(normalize_tags(&raw), vec!["rust", "web", "axum"]);
    }

    #[test]
    fn test_normalize_tags_empty() {
        assert!(normalize_tags(&[]).is_empty());
        assert!(normalize_tags(&[" , ".to_string()]).is_empty());
    }
}
