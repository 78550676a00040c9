use crate::{
    error::{AppError, Result},
    models::profile::*,
    services::{
        auth::{ensure_owner, AuthUser},
        database::Database,
        user::{ids_for_usernames, usernames_for},
    },
};
use chrono::Utc;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

const NOT_OWNER: &str = "You do not have permission to modify this profile.";

/// 资料写入后的不变式：用户不能出现在自己的 follows / followers 中
const SELF_REFERENCE_CLEANUP: &str = r#"
    UPDATE profile SET
        follows = array::complement(follows, [user_id]),
        followers = array::complement(followers, [user_id])
        WHERE user_id INSIDE follows OR user_id INSIDE followers;
"#;

const FOLLOW: &str = r#"
    UPDATE profile SET follows = array::union(follows, [$other]), updated_at = $now
        WHERE user_id = $me;
    UPDATE profile SET followers = array::union(followers, [$me]), updated_at = $now
        WHERE user_id = $other;
"#;

const UNFOLLOW: &str = r#"
    UPDATE profile SET follows = array::complement(follows, [$other]), updated_at = $now
        WHERE user_id = $me;
    UPDATE profile SET followers = array::complement(followers, [$me]), updated_at = $now
        WHERE user_id = $other;
"#;

const SYNC_FOLLOWS: &str = r#"
    UPDATE profile SET
        follows = array::union(array::complement(follows, $remove), $add),
        updated_at = $now
        WHERE user_id = $me;
    UPDATE profile SET followers = array::union(followers, [$me]), updated_at = $now
        WHERE user_id INSIDE $add;
    UPDATE profile SET followers = array::complement(followers, [$me]), updated_at = $now
        WHERE user_id INSIDE $remove;
"#;

/// 只清理本次事务涉及的资料（`$touched`）
const TOUCHED_SELF_REFERENCE_CLEANUP: &str = r#"
    UPDATE profile SET
        follows = array::complement(follows, [user_id]),
        followers = array::complement(followers, [user_id])
        WHERE user_id INSIDE $touched
            AND (user_id INSIDE follows OR user_id INSIDE followers);
"#;

/// 把关注图的修改和自引用清理包进同一个事务
fn graph_transaction(statements: &str) -> String {
    format!(
        "BEGIN TRANSACTION;\n{}\n{}\nCOMMIT TRANSACTION;",
        statements, TOUCHED_SELF_REFERENCE_CLEANUP
    )
}

/// 用户资料与关注关系服务
///
/// 关注关系在两侧分别存储（`follows` / `followers`），所有修改都经由此服务，
/// 并在单个事务里同时更新两侧。
#[derive(Clone)]
pub struct ProfileService {
    db: Arc<Database>,
}

impl ProfileService {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self { db })
    }

    async fn insert_profile(
        &self,
        user_id: &str,
        bio: &str,
        avatar: Option<&str>,
    ) -> Result<Profile> {
        let now = Utc::now();
        self.db
            .create_with_id(
                "profile",
                &Uuid::new_v4().to_string(),
                json!({
                    "user_id": user_id,
                    "bio": bio,
                    "avatar": avatar,
                    "follows": [],
                    "followers": [],
                    "created_at": now,
                    "updated_at": now,
                }),
            )
            .await
    }

    /// 获取用户资料，不存在时自动创建
    pub async fn get_or_create_profile(&self, user_id: &str) -> Result<Profile> {
        if let Some(profile) = self.get_profile_by_user(user_id).await? {
            return Ok(profile);
        }

        debug!("Creating profile lazily for user: {}", user_id);
        match self.insert_profile(user_id, "", None).await {
            Ok(profile) => Ok(profile),
            // 并发创建时唯一索引保证只有一份
            Err(e) if e.is_conflict() => self
                .get_profile_by_user(user_id)
                .await?
                .ok_or_else(|| AppError::not_found("Profile")),
            Err(e) => Err(e),
        }
    }

    /// 显式创建资料；每个用户只能有一份
    pub async fn create_profile(
        &self,
        actor: &AuthUser,
        request: CreateProfileRequest,
    ) -> Result<Profile> {
        request.validate()?;
        let bio = request.bio.unwrap_or_default();
        self.check_bio(&bio)?;

        if self.get_profile_by_user(&actor.id).await?.is_some() {
            return Err(AppError::conflict("Profile already exists"));
        }

        let profile = self
            .insert_profile(&actor.id, &bio, request.avatar.as_deref())
            .await
            .map_err(|e| {
                if e.is_conflict() {
                    AppError::conflict("Profile already exists")
                } else {
                    e
                }
            })?;

        info!("Created profile {} for user {}", profile.key(), actor.id);
        Ok(profile)
    }

    pub async fn get_profile(&self, id: &str) -> Result<Profile> {
        self.db
            .get_by_id::<Profile>("profile", id)
            .await?
            .ok_or_else(|| AppError::not_found("Profile"))
    }

    pub async fn get_profile_by_user(&self, user_id: &str) -> Result<Option<Profile>> {
        self.db.find_one("profile", "user_id", user_id).await
    }

    pub async fn list_profiles(&self) -> Result<Vec<Profile>> {
        let mut response = self
            .db
            .query("SELECT * FROM profile ORDER BY created_at ASC")
            .await?;
        let profiles: Vec<Profile> = response.take(0)?;
        Ok(profiles)
    }

    /// `me` 关注 `other`；关注自己不做任何事
    pub async fn follow(&self, me: &str, other: &str) -> Result<()> {
        if me == other {
            debug!("Ignoring self-follow for user {}", me);
            return Ok(());
        }

        self.get_or_create_profile(me).await?;
        self.get_or_create_profile(other).await?;

        self.db
            .execute(
                &graph_transaction(FOLLOW),
                json!({ "me": me, "other": other, "touched": [me, other], "now": Utc::now() }),
            )
            .await?;

        info!("User {} now follows {}", me, other);
        Ok(())
    }

    /// `me` 取消关注 `other`
    pub async fn unfollow(&self, me: &str, other: &str) -> Result<()> {
        if me == other {
            debug!("Ignoring self-unfollow for user {}", me);
            return Ok(());
        }

        self.db
            .execute(
                &graph_transaction(UNFOLLOW),
                json!({ "me": me, "other": other, "touched": [me, other], "now": Utc::now() }),
            )
            .await?;

        info!("User {} no longer follows {}", me, other);
        Ok(())
    }

    /// 将资料的关注列表同步为给定的用户名集合；只有资料所有者可以调用
    pub async fn sync_follows(
        &self,
        actor: &AuthUser,
        profile_id: &str,
        usernames: &[String],
    ) -> Result<Profile> {
        let profile = self.get_profile(profile_id).await?;
        if ensure_owner(actor, &profile.user_id, NOT_OWNER).is_err() {
            warn!(
                "User {} attempted to modify follows of profile {}",
                actor.id, profile_id
            );
            return Err(AppError::forbidden(NOT_OWNER));
        }

        self.apply_follows(&profile, usernames).await?;
        self.get_profile(profile_id).await
    }

    async fn apply_follows(&self, profile: &Profile, usernames: &[String]) -> Result<()> {
        let ids = ids_for_usernames(&self.db, usernames).await?;

        let mut desired: Vec<String> = Vec::with_capacity(usernames.len());
        for name in usernames {
            let id = ids.get(name).ok_or_else(|| {
                AppError::field("follows", &format!("User \"{}\" does not exist.", name))
            })?;
            if id != &profile.user_id && !desired.contains(id) {
                desired.push(id.clone());
            }
        }

        let to_add: Vec<String> = desired
            .iter()
            .filter(|id| !profile.is_following(id))
            .cloned()
            .collect();
        let to_remove: Vec<String> = profile
            .follows
            .iter()
            .filter(|id| !desired.contains(id))
            .cloned()
            .collect();

        if to_add.is_empty() && to_remove.is_empty() {
            return Ok(());
        }

        for id in &to_add {
            self.get_or_create_profile(id).await?;
        }

        let touched: Vec<&String> = std::iter::once(&profile.user_id)
            .chain(to_add.iter())
            .chain(to_remove.iter())
            .collect();

        self.db
            .execute(
                &graph_transaction(SYNC_FOLLOWS),
                json!({
                    "me": profile.user_id,
                    "touched": touched,
                    "add": to_add,
                    "remove": to_remove,
                    "now": Utc::now(),
                }),
            )
            .await?;

        info!(
            "Synced follows for user {}: +{} -{}",
            profile.user_id,
            to_add.len(),
            to_remove.len()
        );
        Ok(())
    }

    /// 更新资料；`follows` 给出时按完整集合同步，`followers` 不可写
    pub async fn update_profile(
        &self,
        actor: &AuthUser,
        profile_id: &str,
        request: UpdateProfileRequest,
    ) -> Result<Profile> {
        let profile = self.get_profile(profile_id).await?;
        ensure_owner(actor, &profile.user_id, NOT_OWNER)?;

        request.validate()?;

        let mut changes = Map::new();
        if let Some(bio) = &request.bio {
            self.check_bio(bio)?;
            changes.insert("bio".to_string(), json!(bio));
        }
        if let Some(avatar) = &request.avatar {
            changes.insert("avatar".to_string(), json!(avatar));
        }

        if let Some(follows) = &request.follows {
            self.sync_follows(actor, profile_id, follows).await?;
        }

        if !changes.is_empty() {
            changes.insert("updated_at".to_string(), json!(Utc::now()));
            self.db
                .merge_by_id::<_, Profile>("profile", &profile.key(), Value::Object(changes))
                .await?;
            self.cleanup_self_references().await?;
        }

        self.get_profile(profile_id).await
    }

    /// 清除所有资料中的自引用
    pub async fn cleanup_self_references(&self) -> Result<()> {
        self.db.execute(SELF_REFERENCE_CLEANUP, json!({})).await
    }

    fn check_bio(&self, bio: &str) -> Result<()> {
        if bio.chars().count() > self.db.config.max_bio_length {
            return Err(AppError::field(
                "bio",
                &format!(
                    "Ensure this field has no more than {} characters.",
                    self.db.config.max_bio_length
                ),
            ));
        }
        Ok(())
    }

    /// 转换为响应，关注关系以用户名表示
    pub async fn to_responses(&self, profiles: Vec<Profile>) -> Result<Vec<ProfileResponse>> {
        let mut ids: Vec<String> = Vec::new();
        for profile in &profiles {
            ids.push(profile.user_id.clone());
            ids.extend(profile.follows.iter().cloned());
            ids.extend(profile.followers.iter().cloned());
        }
        ids.sort();
        ids.dedup();

        let names = usernames_for(&self.db, &ids).await?;
        let resolve = |list: &[String]| -> Vec<String> {
            list.iter().filter_map(|id| names.get(id).cloned()).collect()
        };

        Ok(profiles
            .into_iter()
            .map(|profile| ProfileResponse {
                id: profile.key(),
                username: names.get(&profile.user_id).cloned().unwrap_or_default(),
                follows: resolve(&profile.follows),
                followers: resolve(&profile.followers),
                user_id: profile.user_id,
                bio: profile.bio,
                avatar: profile.avatar,
                created_at: profile.created_at,
                updated_at: profile.updated_at,
            })
            .collect())
    }

    pub async fn to_response(&self, profile: Profile) -> Result<ProfileResponse> {
        self.to_responses(vec![profile])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::internal("Failed to build profile response"))
    }
}
