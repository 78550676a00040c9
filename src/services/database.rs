use crate::config::Config;
use crate::error::{AppError, Result};
use serde::{de::DeserializeOwned, Serialize};
use surrealdb::engine::any::{self, Any};
use surrealdb::opt::auth::Root;
use surrealdb::sql::Thing;
use surrealdb::{Response, Surreal};
use tracing::{debug, error, info};

/// 启动时定义的唯一索引，作为并发写入的最终保障
const SCHEMA: &str = r#"
    DEFINE TABLE user SCHEMALESS;
    DEFINE TABLE profile SCHEMALESS;
    DEFINE TABLE post SCHEMALESS;
    DEFINE TABLE comment SCHEMALESS;
    DEFINE TABLE post_reaction SCHEMALESS;
    DEFINE TABLE comment_reaction SCHEMALESS;
    DEFINE TABLE saved_post SCHEMALESS;
    DEFINE INDEX user_username ON TABLE user COLUMNS username UNIQUE;
    DEFINE INDEX profile_user ON TABLE profile COLUMNS user_id UNIQUE;
    DEFINE INDEX post_link ON TABLE post COLUMNS link UNIQUE;
    DEFINE INDEX post_reaction_pair ON TABLE post_reaction COLUMNS post_id, user_id UNIQUE;
    DEFINE INDEX comment_reaction_pair ON TABLE comment_reaction COLUMNS comment_id, user_id UNIQUE;
    DEFINE INDEX saved_post_pair ON TABLE saved_post COLUMNS user_id, post_id UNIQUE;
"#;

/// 数据库服务
#[derive(Clone)]
pub struct Database {
    pub client: Surreal<Any>,
    pub config: Config,
}

impl Database {
    /// 创建新的数据库实例
    pub async fn new(config: &Config) -> Result<Self> {
        info!("Initializing database connection to {}", config.database_url);

        let client = any::connect(config.database_url.as_str()).await?;

        if !config.is_in_memory() {
            client
                .signin(Root {
                    username: &config.database_username,
                    password: &config.database_password,
                })
                .await?;
        }

        client
            .use_ns(config.database_namespace.as_str())
            .use_db(config.database_name.as_str())
            .await?;

        let db = Self {
            client,
            config: config.clone(),
        };
        db.define_schema().await?;

        Ok(db)
    }

    async fn define_schema(&self) -> Result<()> {
        debug!("Defining tables and unique indexes");
        self.client.query(SCHEMA).await?.check()?;
        Ok(())
    }

    /// 验证数据库连接
    pub async fn verify_connection(&self) -> Result<()> {
        match self.client.query("INFO FOR DB").await {
            Ok(_) => {
                info!("Database connection verified successfully");
                Ok(())
            }
            Err(e) => {
                error!("Failed to verify database connection: {}", e);
                Err(AppError::from(e))
            }
        }
    }

    /// 执行原始查询
    pub async fn query(&self, sql: &str) -> Result<Response> {
        let response = self.client.query(sql).await?;
        Ok(response)
    }

    /// 执行带参数的查询
    pub async fn query_with_params<P>(&self, sql: &str, params: P) -> Result<Response>
    where
        P: Serialize,
    {
        let response = self.client.query(sql).bind(params).await?;
        Ok(response)
    }

    /// 执行带参数的写入，并检查每条语句的结果（事务失败时整体报错）
    pub async fn execute<P>(&self, sql: &str, params: P) -> Result<()>
    where
        P: Serialize,
    {
        let response = self.client.query(sql).bind(params).await?;
        response.check().map_err(map_write_error)?;
        Ok(())
    }

    /// 以指定 ID 创建记录；唯一索引冲突映射为 Conflict
    pub async fn create_with_id<C, T>(&self, table: &str, id: &str, content: C) -> Result<T>
    where
        C: Serialize,
        T: DeserializeOwned,
    {
        let mut response = self
            .client
            .query("CREATE type::thing($table, $id) CONTENT $content")
            .bind(("table", table))
            .bind(("id", id))
            .bind(("content", content))
            .await?;

        let created: Option<T> = response.take(0).map_err(map_write_error)?;
        created.ok_or_else(|| AppError::Internal(format!("Failed to create {} record", table)))
    }

    /// 合并更新记录并返回更新后的内容
    pub async fn merge_by_id<C, T>(&self, table: &str, id: &str, changes: C) -> Result<Option<T>>
    where
        C: Serialize,
        T: DeserializeOwned,
    {
        let mut response = self
            .client
            .query("UPDATE type::thing($table, $id) MERGE $changes RETURN AFTER")
            .bind(("table", table))
            .bind(("id", id))
            .bind(("changes", changes))
            .await?;

        let updated: Option<T> = response.take(0).map_err(map_write_error)?;
        Ok(updated)
    }

    /// 通过ID获取单个记录
    pub async fn get_by_id<T>(&self, table: &str, id: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let prefix = format!("{}:", table);
        let pure_id = id.strip_prefix(&prefix).unwrap_or(id);

        debug!("Fetching {}:{}", table, pure_id);

        let mut response = self
            .client
            .query("SELECT * FROM type::thing($table, $id)")
            .bind(("table", table))
            .bind(("id", pure_id))
            .await?;

        let record: Option<T> = response.take(0)?;
        Ok(record)
    }

    /// 查找单个记录（字段名由调用方以常量给出）
    pub async fn find_one<T>(&self, table: &str, field: &str, value: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let sql = format!(
            "SELECT * FROM type::table($table) WHERE {} = $value LIMIT 1",
            field
        );
        let mut response = self
            .client
            .query(sql)
            .bind(("table", table))
            .bind(("value", value))
            .await?;

        let records: Vec<T> = response.take(0)?;
        Ok(records.into_iter().next())
    }

    /// 通过ID删除记录
    pub async fn delete_by_id(&self, table: &str, id: &str) -> Result<()> {
        self.client
            .query("DELETE type::thing($table, $id)")
            .bind(("table", table))
            .bind(("id", id))
            .await?
            .check()?;
        Ok(())
    }
}

/// 记录 ID 的纯键部分（不带表前缀）
pub fn record_key(thing: &Thing) -> String {
    thing.id.to_raw()
}

/// 唯一索引冲突在内存引擎和远程协议下的报错文本一致
pub fn is_unique_violation(err: &surrealdb::Error) -> bool {
    err.to_string().contains("already contains")
}

fn map_write_error(err: surrealdb::Error) -> AppError {
    if is_unique_violation(&err) {
        AppError::Conflict(err.to_string())
    } else {
        AppError::Database(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Row {
        id: Thing,
        name: String,
    }

    #[tokio::test]
    async fn test_database_connection() {
        let config = Config::default();
        let db = Database::new(&config).await;
        assert!(db.is_ok());
        assert!(db.unwrap().verify_connection().await.is_ok());
    }

    #[tokio::test]
    async fn test_create_and_fetch_by_id() {
        let db = Database::new(&Config::default()).await.unwrap();

        let created: Row = db
            .create_with_id("post", "abc", json!({ "name": "first", "link": "first" }))
            .await
            .unwrap();
        assert_eq!(record_key(&created.id), "abc");

        let fetched: Option<Row> = db.get_by_id("post", "post:abc").await.unwrap();
        assert_eq!(fetched.unwrap().name, "first");
    }

    #[tokio::test]
    async fn test_unique_index_maps_to_conflict() {
        let db = Database::new(&Config::default()).await.unwrap();

        let _: Row = db
            .create_with_id("post", "one", json!({ "name": "a", "link": "same" }))
            .await
            .unwrap();
        let second: Result<Row> = db
            .create_with_id("post", "two", json!({ "name": "b", "link": "same" }))
            .await;

        assert!(matches!(second, Err(AppError::Conflict(_))));
    }
}
