use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub server_host: String,
    pub server_port: u16,
    pub environment: String,
    pub log_level: String,
    pub log_format: String,

    // Database configuration
    pub database_url: String,
    pub database_namespace: String,
    pub database_name: String,
    pub database_username: String,
    pub database_password: String,

    // Authentication configuration
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,

    // Content settings
    pub max_title_length: usize,
    pub max_comment_length: usize,
    pub max_bio_length: usize,
    pub max_tags_per_post: usize,
    pub slug_max_attempts: usize,

    // Rate limiting
    pub rate_limit_requests: u32,
    pub rate_limit_window: u64,

    // CORS configuration
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            log_level: env::var("LOG_LEVEL")
                .unwrap_or_else(|_| "bloga=debug,tower_http=debug".to_string()),
            log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),

            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            database_namespace: env::var("DATABASE_NAMESPACE")
                .unwrap_or_else(|_| "bloga".to_string()),
            database_name: env::var("DATABASE_NAME")
                .unwrap_or_else(|_| "blog".to_string()),
            database_username: env::var("DATABASE_USERNAME")
                .unwrap_or_else(|_| "root".to_string()),
            database_password: env::var("DATABASE_PASSWORD")
                .unwrap_or_else(|_| "root".to_string()),

            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?,
            jwt_expiry_hours: env::var("JWT_EXPIRY_HOURS")
                .unwrap_or_else(|_| "168".to_string())
                .parse()?,

            max_title_length: env::var("MAX_TITLE_LENGTH")
                .unwrap_or_else(|_| "250".to_string())
                .parse()?,
            max_comment_length: env::var("MAX_COMMENT_LENGTH")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()?,
            max_bio_length: env::var("MAX_BIO_LENGTH")
                .unwrap_or_else(|_| "500".to_string())
                .parse()?,
            max_tags_per_post: env::var("MAX_TAGS_PER_POST")
                .unwrap_or_else(|_| "20".to_string())
                .parse()?,
            slug_max_attempts: env::var("SLUG_MAX_ATTEMPTS")
                .unwrap_or_else(|_| "16".to_string())
                .parse()?,

            rate_limit_requests: env::var("RATE_LIMIT_REQUESTS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()?,
            rate_limit_window: env::var("RATE_LIMIT_WINDOW")
                .unwrap_or_else(|_| "60".to_string())
                .parse()?,

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3001".to_string()),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn uses_json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }

    /// 内存数据库是否启用（测试和本地试用）
    pub fn is_in_memory(&self) -> bool {
        self.database_url.starts_with("mem://")
    }
}

/// 默认配置：内存数据库，供测试使用
impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 3000,
            environment: "test".to_string(),
            log_level: "bloga=debug".to_string(),
            log_format: "pretty".to_string(),
            database_url: "mem://".to_string(),
            database_namespace: "bloga".to_string(),
            database_name: "test".to_string(),
            database_username: "root".to_string(),
            database_password: "root".to_string(),
            jwt_secret: "test-secret-do-not-use-in-production".to_string(),
            jwt_expiry_hours: 24,
            max_title_length: 250,
            max_comment_length: 5000,
            max_bio_length: 500,
            max_tags_per_post: 20,
            slug_max_attempts: 16,
            rate_limit_requests: 1000,
            rate_limit_window: 60,
            cors_allowed_origins: "http://localhost:3001".to_string(),
        }
    }
}
