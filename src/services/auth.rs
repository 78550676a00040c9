use crate::{
    config::Config,
    error::{AppError, Result},
    models::user::User,
};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Clone)]
pub struct AuthService {
    config: Config,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,      // 用户ID
    pub username: String, // 用户名
    pub iat: i64,         // 签发时间
    pub exp: i64,         // 过期时间
}

/// 已认证的请求方，由认证中间件放入请求扩展
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub username: String,
}

impl AuthUser {
    pub fn is(&self, user_id: &str) -> bool {
        self.id == user_id
    }
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.key(),
            username: user.username.clone(),
        }
    }
}

impl AuthService {
    pub async fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
        })
    }

    /// 使用 Argon2 生成 PHC 格式的密码哈希
    pub fn hash_password(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
        Ok(hash.to_string())
    }

    pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(hash)?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// 为用户签发 HS256 令牌
    pub fn issue_token(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.key(),
            username: user.username.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.config.jwt_expiry_hours)).timestamp(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )?;

        debug!("Issued token for user: {}", claims.sub);
        Ok(token)
    }

    pub fn verify_jwt(&self, token: &str) -> Result<Claims> {
        let decoding_key = DecodingKey::from_secret(self.config.jwt_secret.as_bytes());
        let validation = Validation::new(Algorithm::HS256);

        match decode::<Claims>(token, &decoding_key, &validation) {
            Ok(token_data) => {
                debug!("JWT token verified for user: {}", token_data.claims.sub);
                Ok(token_data.claims)
            }
            Err(e) => {
                warn!("JWT verification failed: {}", e);
                Err(AppError::Authentication("Invalid token".to_string()))
            }
        }
    }
}

/// 检查请求方是否为资源所有者
pub fn ensure_owner(actor: &AuthUser, owner_id: &str, message: &str) -> Result<()> {
    if actor.is(owner_id) {
        Ok(())
    } else {
        Err(AppError::forbidden(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: surrealdb::sql::Thing::from(("user", "u-1")),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: String::new(),
            date_joined: Utc::now(),
        }
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = AuthService::hash_password("s3cret").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(AuthService::verify_password("s3cret", &hash).unwrap());
        assert!(!AuthService::verify_password("wrong", &hash).unwrap());
    }

    #[tokio::test]
    async fn test_token_issue_and_verify() {
        let service = AuthService::new(&Config::default()).await.unwrap();
        let token = service.issue_token(&sample_user()).unwrap();

        let claims = service.verify_jwt(&token).unwrap();
        assert_eq!(claims.sub, "u-1");
        assert_eq!(claims.username, "alice");
        assert!(claims.exp > claims.iat);
    }

    #[tokio::test]
    async fn test_token_with_other_secret_rejected() {
        let service = AuthService::new(&Config::default()).await.unwrap();
        let token = service.issue_token(&sample_user()).unwrap();

        let mut other = Config::default();
        other.jwt_secret = "another-secret".to_string();
        let other_service = AuthService::new(&other).await.unwrap();

        assert!(matches!(
            other_service.verify_jwt(&token),
            Err(AppError::Authentication(_))
        ));
    }

    #[test]
    fn test_ensure_owner() {
        let actor = AuthUser {
            id: "u-1".to_string(),
            username: "alice".to_string(),
        };
        assert!(ensure_owner(&actor, "u-1", "nope").is_ok());
        assert!(matches!(
            ensure_owner(&actor, "u-2", "nope"),
            Err(AppError::Authorization(_))
        ));
    }
}
