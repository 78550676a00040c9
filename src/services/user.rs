use crate::{
    error::{AppError, Result},
    models::user::*,
    services::{
        auth::{ensure_owner, AuthService, AuthUser},
        database::Database,
    },
    utils::validation::validate_username,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use surrealdb::sql::Thing;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

const NOT_OWNER: &str = "You do not have permission to modify this user.";

/// 删除用户时的级联清理，在同一个事务中完成
const DELETE_USER_CASCADE: &str = r#"
    BEGIN TRANSACTION;
    LET $posts = (SELECT VALUE meta::id(id) FROM post WHERE author_id = $uid);
    LET $comments = (SELECT VALUE meta::id(id) FROM comment WHERE user_id = $uid OR post_id INSIDE $posts);
    DELETE comment_reaction WHERE user_id = $uid OR comment_id INSIDE $comments;
    DELETE post_reaction WHERE user_id = $uid OR post_id INSIDE $posts;
    DELETE saved_post WHERE user_id = $uid OR post_id INSIDE $posts;
    DELETE comment WHERE meta::id(id) INSIDE $comments;
    DELETE post WHERE author_id = $uid;
    DELETE profile WHERE user_id = $uid;
    UPDATE profile SET
        follows = array::complement(follows, [$uid]),
        followers = array::complement(followers, [$uid])
        WHERE $uid INSIDE follows OR $uid INSIDE followers;
    DELETE type::thing('user', $uid);
    COMMIT TRANSACTION;
"#;

#[derive(Debug, Deserialize)]
struct UsernameRow {
    key: String,
    username: String,
}

/// 批量查询用户名：用户键 → 用户名
pub async fn usernames_for(db: &Database, ids: &[String]) -> Result<HashMap<String, String>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let things: Vec<Thing> = ids
        .iter()
        .map(|id| Thing::from(("user", id.as_str())))
        .collect();

    let mut response = db
        .client
        .query("SELECT meta::id(id) AS key, username FROM $ids")
        .bind(("ids", things))
        .await?;
    let rows: Vec<UsernameRow> = response.take(0)?;

    Ok(rows.into_iter().map(|row| (row.key, row.username)).collect())
}

/// 批量查询用户键：用户名 → 用户键
pub async fn ids_for_usernames(
    db: &Database,
    usernames: &[String],
) -> Result<HashMap<String, String>> {
    if usernames.is_empty() {
        return Ok(HashMap::new());
    }

    let mut response = db
        .query_with_params(
            "SELECT meta::id(id) AS key, username FROM user WHERE username INSIDE $names",
            json!({ "names": usernames }),
        )
        .await?;
    let rows: Vec<UsernameRow> = response.take(0)?;

    Ok(rows.into_iter().map(|row| (row.username, row.key)).collect())
}

/// 用户服务，处理用户相关的业务逻辑
#[derive(Clone)]
pub struct UserService {
    db: Arc<Database>,
}

impl UserService {
    /// 创建新的用户服务实例
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self { db })
    }

    /// 注册新用户
    pub async fn create_user(&self, request: CreateUserRequest) -> Result<User> {
        debug!("Creating user: {}", request.username);

        request.validate()?;

        if self.find_by_username(&request.username).await?.is_some() {
            return Err(AppError::conflict("A user with that username already exists."));
        }

        let password_hash = AuthService::hash_password(&request.password)?;
        let id = Uuid::new_v4().to_string();

        let user: User = self
            .db
            .create_with_id(
                "user",
                &id,
                json!({
                    "username": request.username,
                    "email": request.email,
                    "first_name": request.first_name,
                    "last_name": request.last_name,
                    "password_hash": password_hash,
                    "date_joined": Utc::now(),
                }),
            )
            .await
            .map_err(|e| {
                if e.is_conflict() {
                    AppError::conflict("A user with that username already exists.")
                } else {
                    e
                }
            })?;

        info!("Created user {} ({})", user.username, user.key());
        Ok(user)
    }

    pub async fn get_user_by_id(&self, id: &str) -> Result<User> {
        self.db
            .get_by_id::<User>("user", id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        self.db.find_one("user", "username", username).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<User> {
        self.find_by_username(username)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    /// 所有用户，按注册时间排序
    pub async fn list_users(&self) -> Result<Vec<User>> {
        let mut response = self
            .db
            .query("SELECT * FROM user ORDER BY date_joined ASC")
            .await?;
        let users: Vec<User> = response.take(0)?;
        Ok(users)
    }

    /// 校验用户名和密码
    pub async fn authenticate(&self, request: LoginRequest) -> Result<User> {
        request.validate()?;

        let user = match self.find_by_username(&request.username).await? {
            Some(user) => user,
            None => {
                debug!("Login attempt for unknown user: {}", request.username);
                return Err(AppError::unauthorized("Invalid credentials"));
            }
        };

        if !AuthService::verify_password(&request.password, &user.password_hash)? {
            warn!("Failed login for user: {}", user.username);
            return Err(AppError::unauthorized("Invalid credentials"));
        }

        Ok(user)
    }

    /// 更新用户信息；只有本人可以修改
    pub async fn update_user(
        &self,
        actor: &AuthUser,
        username: &str,
        request: UpdateUserRequest,
    ) -> Result<User> {
        debug!("Updating user {} by {}", username, actor.username);

        let user = self.get_user_by_username(username).await?;
        ensure_owner(actor, &user.key(), NOT_OWNER)?;

        request.validate()?;

        let mut changes = Map::new();

        if let Some(new_username) = &request.username {
            validate_username(new_username)?;
            if new_username != &user.username {
                if self.find_by_username(new_username).await?.is_some() {
                    return Err(AppError::field(
                        "username",
                        "A user with that username already exists.",
                    ));
                }
                changes.insert("username".to_string(), json!(new_username));
            }
        }
        if let Some(email) = &request.email {
            changes.insert("email".to_string(), json!(email));
        }
        if let Some(first_name) = &request.first_name {
            changes.insert("first_name".to_string(), json!(first_name));
        }
        if let Some(last_name) = &request.last_name {
            changes.insert("last_name".to_string(), json!(last_name));
        }

        // 只有旧密码验证通过时才应用新密码
        if let Some(old_password) = &request.old_password {
            if !AuthService::verify_password(old_password, &user.password_hash)? {
                return Err(AppError::field("old_password", "Old password is incorrect."));
            }
            if let Some(password) = &request.password {
                changes.insert(
                    "password_hash".to_string(),
                    json!(AuthService::hash_password(password)?),
                );
            }
        } else if request.password.is_some() {
            return Err(AppError::field(
                "old_password",
                "Old password is required to set a new password.",
            ));
        }

        if changes.is_empty() {
            return Ok(user);
        }

        let updated: Option<User> = self
            .db
            .merge_by_id("user", &user.key(), Value::Object(changes))
            .await
            .map_err(|e| {
                if e.is_conflict() {
                    AppError::field("username", "A user with that username already exists.")
                } else {
                    e
                }
            })?;

        let updated = updated.ok_or_else(|| AppError::not_found("User"))?;
        info!("Updated user {}", updated.key());
        Ok(updated)
    }

    /// 删除用户及其所有内容，并从其他人的关注关系中移除
    pub async fn delete_user(&self, actor: &AuthUser, username: &str) -> Result<()> {
        let user = self.get_user_by_username(username).await?;
        ensure_owner(actor, &user.key(), NOT_OWNER)?;

        self.db
            .execute(DELETE_USER_CASCADE, json!({ "uid": user.key() }))
            .await?;

        info!("Deleted user {} and all dependent records", user.key());
        Ok(())
    }

    pub async fn usernames_for(&self, ids: &[String]) -> Result<HashMap<String, String>> {
        usernames_for(&self.db, ids).await
    }
}

