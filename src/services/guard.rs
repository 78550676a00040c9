use crate::{
    error::{AppError, Result},
    models::{IgnoreReason, WriteOutcome},
    services::database::{is_unique_violation, Database},
};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use surrealdb::sql::Thing;
use tracing::{debug, warn};
use uuid::Uuid;

/// 在同一条语句里重新读取文章状态，只有已发布时才创建
const CREATE_IF_PUBLISHED: &str = r#"
    IF $post.status = 'PB' THEN
        (CREATE type::thing($table, $id) CONTENT $content)
    END
"#;

const UPDATE_IF_PUBLISHED: &str = r#"
    IF $post.status = 'PB' THEN
        (UPDATE type::thing($table, $id) MERGE $changes RETURN AFTER)
    END
"#;

/// 依附内容（评论、点赞、收藏）的写入守卫
///
/// 目标文章是草稿时静默丢弃写入；同一 (用户, 目标) 已存在时同样丢弃。
/// 服务层先做快速预检查，这里的原子语句和唯一索引才是最终依据。
#[derive(Clone)]
pub struct VisibilityGuard {
    db: Arc<Database>,
}

impl VisibilityGuard {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// 仅当文章已发布时创建记录
    pub async fn create_if_published<C, T>(
        &self,
        table: &str,
        post_id: &str,
        content: C,
    ) -> Result<WriteOutcome<T>>
    where
        C: Serialize,
        T: DeserializeOwned,
    {
        let id = Uuid::new_v4().to_string();
        let mut response = self
            .db
            .client
            .query(CREATE_IF_PUBLISHED)
            .bind(("post", Thing::from(("post", post_id))))
            .bind(("table", table))
            .bind(("id", id.as_str()))
            .bind(("content", content))
            .await?;

        match response.take::<Option<T>>(0) {
            Ok(Some(record)) => {
                debug!("Created {}:{} under post {}", table, id, post_id);
                Ok(WriteOutcome::Created(record))
            }
            Ok(None) => {
                warn!("Discarded {} write: post {} is a draft", table, post_id);
                Ok(WriteOutcome::Ignored(IgnoreReason::DraftPost))
            }
            Err(e) if is_unique_violation(&e) => {
                warn!("Discarded duplicate {} write on post {}", table, post_id);
                Ok(WriteOutcome::Ignored(IgnoreReason::Duplicate))
            }
            Err(e) => Err(AppError::Database(e)),
        }
    }

    /// 仅当文章已发布时更新记录
    pub async fn update_if_published<C, T>(
        &self,
        table: &str,
        id: &str,
        post_id: &str,
        changes: C,
    ) -> Result<WriteOutcome<T>>
    where
        C: Serialize,
        T: DeserializeOwned,
    {
        let mut response = self
            .db
            .client
            .query(UPDATE_IF_PUBLISHED)
            .bind(("post", Thing::from(("post", post_id))))
            .bind(("table", table))
            .bind(("id", id))
            .bind(("changes", changes))
            .await?;

        match response.take::<Option<T>>(0)? {
            Some(record) => Ok(WriteOutcome::Created(record)),
            None => {
                warn!("Discarded {} update: post {} is a draft", table, post_id);
                Ok(WriteOutcome::Ignored(IgnoreReason::DraftPost))
            }
        }
    }

    /// 检查 (字段, 值) 组合是否已有记录，作为唯一索引之前的快速路径
    pub async fn exists(&self, table: &str, pairs: &[(&str, &str)]) -> Result<bool> {
        let conditions: Vec<String> = pairs
            .iter()
            .enumerate()
            .map(|(i, (field, _))| format!("{} = $v{}", field, i))
            .collect();
        let sql = format!(
            "SELECT VALUE meta::id(id) FROM type::table($table) WHERE {} LIMIT 1",
            conditions.join(" AND ")
        );

        let mut query = self.db.client.query(sql).bind(("table", table));
        for (i, (_, value)) in pairs.iter().enumerate() {
            query = query.bind((format!("v{}", i), *value));
        }

        let mut response = query.await?;
        let found: Vec<String> = response.take(0)?;
        Ok(!found.is_empty())
    }
}
