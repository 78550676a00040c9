use crate::error::{AppError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidationError;

static USERNAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9@.+_-]+$").expect("valid username regex")
});

/// 验证用户名格式：3-150 个字符，允许字母、数字和 @/./+/-/_
pub fn validate_username(username: &str) -> Result<()> {
    if username.trim().is_empty() {
        return Err(AppError::field("username", "Username must not be empty."));
    }

    if username.chars().count() < 3 {
        return Err(AppError::field(
            "username",
            "Username must be at least 3 characters.",
        ));
    }

    if username.chars().count() > 150 {
        return Err(AppError::field(
            "username",
            "Username must be at most 150 characters.",
        ));
    }

    if !USERNAME_REGEX.is_match(username) {
        return Err(AppError::field(
            "username",
            "Username may only contain letters, digits and @/./+/-/_ characters.",
        ));
    }

    Ok(())
}

/// 供 `#[validate(custom = "...")]` 使用
pub fn username_rule(username: &str) -> std::result::Result<(), ValidationError> {
    validate_username(username).map_err(|_| ValidationError::new("username"))
}

/// 不允许只有空白的文本
pub fn not_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("user123").is_ok());
        assert!(validate_username("test_user").is_ok());
        assert!(validate_username("first.last+blog@home").is_ok());

        assert!(validate_username("").is_err());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("user name").is_err());
        assert!(validate_username("user#name").is_err());
        assert!(validate_username(&"a".repeat(151)).is_err());
    }

    #[test]
    fn test_not_blank() {
        assert!(not_blank("text").is_ok());
        assert!(not_blank("   ").is_err());
    }
}
