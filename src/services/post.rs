use crate::{
    error::{AppError, Result},
    models::post::*,
    services::{
        auth::{ensure_owner, AuthUser},
        database::Database,
        tag::normalize_tags,
        user::usernames_for,
    },
    utils::{markdown::MarkdownProcessor, slug},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use surrealdb::sql::Thing;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

const NOT_AUTHOR: &str = "You do not have permission to modify this post.";

/// 插入时链接冲突（并发同名文章）后重新分配的次数
const INSERT_RETRIES: usize = 3;

const EXCERPT_LENGTH: usize = 200;

/// 删除文章及其评论、评论点赞、文章点赞和收藏
const DELETE_POST_CASCADE: &str = r#"
    BEGIN TRANSACTION;
    DELETE comment_reaction WHERE comment_id INSIDE
        (SELECT VALUE meta::id(id) FROM comment WHERE post_id = $post_id);
    DELETE comment WHERE post_id = $post_id;
    DELETE post_reaction WHERE post_id = $post_id;
    DELETE saved_post WHERE post_id = $post_id;
    DELETE type::thing('post', $post_id);
    COMMIT TRANSACTION;
"#;

/// 新建文章时的发布时间：已发布则为当前时间，草稿为空
pub fn publish_on_create(status: PostStatus, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match status {
        PostStatus::Published => Some(now),
        PostStatus::Draft => None,
    }
}

/// 更新时的发布时间
///
/// 草稿 → 发布记录当前时间；保持发布则沿用原时间；回到草稿清空。
pub fn publish_on_update(
    previous: PostStatus,
    previous_publish: Option<DateTime<Utc>>,
    next: PostStatus,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match (previous, next) {
        (_, PostStatus::Draft) => None,
        (PostStatus::Published, PostStatus::Published) => previous_publish.or(Some(now)),
        (PostStatus::Draft, PostStatus::Published) => Some(now),
    }
}

/// 按链接查找文章，不做可见性判断
pub async fn find_by_link(db: &Database, link: &str) -> Result<Option<Post>> {
    db.find_one("post", "link", link).await
}

#[derive(Debug, Deserialize)]
struct LinkRow {
    key: String,
    link: String,
}

/// 批量查询文章链接：文章键 → 链接
pub async fn links_for(db: &Database, ids: &[String]) -> Result<HashMap<String, String>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let things: Vec<Thing> = ids
        .iter()
        .map(|id| Thing::from(("post", id.as_str())))
        .collect();

    let mut response = db
        .client
        .query("SELECT meta::id(id) AS key, link FROM $ids")
        .bind(("ids", things))
        .await?;
    let rows: Vec<LinkRow> = response.take(0)?;

    Ok(rows.into_iter().map(|row| (row.key, row.link)).collect())
}

#[derive(Clone)]
pub struct PostService {
    db: Arc<Database>,
    markdown_processor: MarkdownProcessor,
}

impl PostService {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self {
            db,
            markdown_processor: MarkdownProcessor::new(),
        })
    }

    /// 为标题分配一个未被占用的链接
    ///
    /// 先尝试标题本身的 slug，之后追加长度从 4 开始递增的随机后缀。
    pub async fn allocate_link(&self, title: &str) -> Result<String> {
        let base = slug::generate_slug(title);
        let max_attempts = self.db.config.slug_max_attempts.max(1);

        for attempt in 0..max_attempts {
            let candidate = slug::slug_candidate(&base, attempt);
            if !self.link_exists(&candidate).await? {
                debug!("Allocated link {} after {} attempt(s)", candidate, attempt + 1);
                return Ok(candidate);
            }
        }

        Err(AppError::Internal(format!(
            "Failed to allocate a unique link for \"{}\" after {} attempts",
            base, max_attempts
        )))
    }

    async fn link_exists(&self, link: &str) -> Result<bool> {
        Ok(find_by_link(&self.db, link).await?.is_some())
    }

    fn check_title(&self, title: &str) -> Result<()> {
        if title.chars().count() > self.db.config.max_title_length {
            return Err(AppError::field(
                "title",
                &format!(
                    "Ensure this field has no more than {} characters.",
                    self.db.config.max_title_length
                ),
            ));
        }
        Ok(())
    }

    fn prepare_tags(&self, tags: &[String]) -> Result<Vec<String>> {
        let tags = normalize_tags(tags);
        if tags.len() > self.db.config.max_tags_per_post {
            return Err(AppError::field(
                "tags",
                &format!(
                    "A post may have at most {} tags.",
                    self.db.config.max_tags_per_post
                ),
            ));
        }
        Ok(tags)
    }

    /// 创建新文章
    pub async fn create_post(&self, author: &AuthUser, request: CreatePostRequest) -> Result<Post> {
        debug!("Creating post for user: {}", author.id);

        request.validate()?;
        self.check_title(&request.title)?;
        let tags = self.prepare_tags(&request.tags)?;

        let now = Utc::now();
        let publish = publish_on_create(request.status, now);

        let mut retries = 0;
        loop {
            let link = self.allocate_link(&request.title).await?;
            let id = Uuid::new_v4().to_string();

            let result = self
                .db
                .create_with_id::<_, Post>(
                    "post",
                    &id,
                    json!({
                        "title": request.title,
                        "link": link,
                        "author_id": author.id,
                        "content": request.content,
                        "status": request.status,
                        "publish": publish,
                        "tags": tags,
                        "created": now,
                        "updated": now,
                    }),
                )
                .await;

            match result {
                Ok(post) => {
                    info!("Created post {} with link {}", post.key(), post.link);
                    return Ok(post);
                }
                Err(e) if e.is_conflict() && retries < INSERT_RETRIES => {
                    retries += 1;
                    warn!("Link {} was taken concurrently, reallocating ({})", link, retries);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// 更新文章；链接保持不变
    pub async fn update_post(
        &self,
        actor: &AuthUser,
        link: &str,
        request: UpdatePostRequest,
    ) -> Result<Post> {
        debug!("Updating post {} by user {}", link, actor.id);

        let post = find_by_link(&self.db, link)
            .await?
            .ok_or_else(|| AppError::not_found("Post"))?;
        ensure_owner(actor, &post.author_id, NOT_AUTHOR)?;

        request.validate()?;

        let now = Utc::now();
        let mut changes = Map::new();

        if let Some(title) = &request.title {
            self.check_title(title)?;
            changes.insert("title".to_string(), json!(title));
        }
        if let Some(content) = &request.content {
            changes.insert("content".to_string(), json!(content));
        }
        if let Some(tags) = &request.tags {
            changes.insert("tags".to_string(), json!(self.prepare_tags(tags)?));
        }

        let status = request.status.unwrap_or(post.status);
        let publish = publish_on_update(post.status, post.publish, status, now);
        changes.insert("status".to_string(), json!(status));
        changes.insert("publish".to_string(), json!(publish));
        changes.insert("updated".to_string(), json!(now));

        let updated: Post = self
            .db
            .merge_by_id("post", &post.key(), Value::Object(changes))
            .await?
            .ok_or_else(|| AppError::not_found("Post"))?;

        info!("Updated post {} (status {})", updated.link, updated.status.as_str());
        Ok(updated)
    }

    /// 删除文章及其所有依附内容
    pub async fn delete_post(&self, actor: &AuthUser, link: &str) -> Result<()> {
        let post = find_by_link(&self.db, link)
            .await?
            .ok_or_else(|| AppError::not_found("Post"))?;
        ensure_owner(actor, &post.author_id, NOT_AUTHOR)?;

        self.db
            .execute(DELETE_POST_CASCADE, json!({ "post_id": post.key() }))
            .await?;

        info!("Deleted post {}", post.link);
        Ok(())
    }

    /// 按链接获取文章；草稿只对作者可见
    pub async fn get_post_by_link(&self, link: &str, viewer: Option<&AuthUser>) -> Result<Post> {
        let post = find_by_link(&self.db, link)
            .await?
            .ok_or_else(|| AppError::not_found("Post"))?;

        if post.is_draft() && !viewer.map_or(false, |v| v.is(&post.author_id)) {
            debug!("Hiding draft {} from non-author", link);
            return Err(AppError::not_found("Post"));
        }

        Ok(post)
    }

    /// 已发布文章加上当前用户自己的草稿
    pub async fn list_posts(&self, viewer: Option<&AuthUser>, tag: Option<&str>) -> Result<Vec<Post>> {
        let viewer_id = viewer.map(|v| v.id.clone()).unwrap_or_default();
        let tag = tag.map(|t| t.trim().to_lowercase()).filter(|t| !t.is_empty());

        let sql = if tag.is_some() {
            "SELECT * FROM post WHERE (status = 'PB' OR author_id = $viewer) AND $tag INSIDE tags"
        } else {
            "SELECT * FROM post WHERE status = 'PB' OR author_id = $viewer"
        };

        let mut response = self
            .db
            .query_with_params(sql, json!({ "viewer": viewer_id, "tag": tag }))
            .await?;
        let mut posts: Vec<Post> = response.take(0)?;
        sort_posts(&mut posts);
        Ok(posts)
    }

    /// 转换为响应：作者用户名、渲染后的 HTML 和摘要
    pub async fn to_responses(&self, posts: Vec<Post>) -> Result<Vec<PostResponse>> {
        let mut author_ids: Vec<String> = posts.iter().map(|p| p.author_id.clone()).collect();
        author_ids.sort();
        author_ids.dedup();
        let names = usernames_for(&self.db, &author_ids).await?;

        Ok(posts
            .into_iter()
            .map(|post| PostResponse {
                id: post.key(),
                author: names.get(&post.author_id).cloned().unwrap_or_default(),
                content_html: self.markdown_processor.to_html(&post.content),
                excerpt: self
                    .markdown_processor
                    .generate_excerpt(&post.content, EXCERPT_LENGTH),
                title: post.title,
                link: post.link,
                content: post.content,
                status: post.status,
                publish: post.publish,
                tags: post.tags,
                created: post.created,
                updated: post.updated,
            })
            .collect())
    }

    pub async fn to_response(&self, post: Post) -> Result<PostResponse> {
        self.to_responses(vec![post])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::internal("Failed to build post response"))
    }
}

/// 按发布时间倒序，草稿（无发布时间）排在最后，再按创建时间倒序
pub fn sort_posts(posts: &mut [Post]) {
    posts.sort_by(|a, b| {
        b.publish
            .cmp(&a.publish)
            .then_with(|| b.created.cmp(&a.created))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_publish_on_create() {
        let now = Utc::now();
        assert_eq!(publish_on_create(PostStatus::Published, now), Some(now));
        assert_eq!(publish_on_create(PostStatus::Draft, now), None);
    }

    #[test]
    fn test_publish_on_update_transitions() {
        let earlier = Utc::now() - Duration::days(3);
        let now = Utc::now();

        // 草稿 → 发布
        assert_eq!(
            publish_on_update(PostStatus::Draft, None, PostStatus::Published, now),
            Some(now)
        );
        // 保持发布，沿用原时间
        assert_eq!(
            publish_on_update(PostStatus::Published, Some(earlier), PostStatus::Published, now),
            Some(earlier)
        );
        // 回到草稿
        assert_eq!(
            publish_on_update(PostStatus::Published, Some(earlier), PostStatus::Draft, now),
            None
        );
        assert_eq!(
            publish_on_update(PostStatus::Draft, None, PostStatus::Draft, now),
            None
        );
    }

    #[test]
    fn test_publish_matches_status_for_every_transition() {
        let now = Utc::now();
        let statuses = [PostStatus::Draft, PostStatus::Published];
        for previous in statuses {
            for next in statuses {
                let previous_publish = publish_on_create(previous, now);
                let publish = publish_on_update(previous, previous_publish, next, now);
                assert_eq!(publish.is_some(), next.is_published());
            }
        }
    }
}
