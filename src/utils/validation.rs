use crate::error::{AppError, Result};
use regex::Regex;
use std::sync::OnceLock;

/// 邮箱统一小写并去掉首尾空白后再存储和查询
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// 验证用户名格式
pub fn validate_username(username: &str) -> Result<()> {
    static USERNAME: OnceLock<Regex> = OnceLock::new();

    if username.trim().is_empty() {
        return Err(AppError::Validation("username must not be empty".to_string()));
    }

    if username.len() < 3 {
        return Err(AppError::Validation("username must be at least 3 characters".to_string()));
    }

    if username.len() > 30 {
        return Err(AppError::Validation("username must be at most 30 characters".to_string()));
    }

    // 用户名只能包含字母、数字、下划线和连字符
    let username_regex = USERNAME.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9_-]+$").expect("username pattern is valid")
    });
    if !username_regex.is_match(username) {
        return Err(AppError::Validation("username may only contain letters, digits, underscores and hyphens".to_string()));
    }

    Ok(())
}

/// 密码至少 8 位，且同时包含字母和数字
pub fn validate_password_strength(password: &str) -> Result<()> {
    if password.chars().count() < 8 {
        return Err(AppError::Validation("password must be at least 8 characters".to_string()));
    }

    let has_letter = password.chars().any(|c| c.is_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !has_letter || !has_digit {
        return Err(AppError::Validation("password must contain both letters and digits".to_string()));
    }

    Ok(())
}

/// 文章链接必须是 http(s) 地址
pub fn validate_article_url(url: &str) -> Result<()> {
    let url = url.trim();
    if url.is_empty() {
        return Err(AppError::Validation("url must not be empty".to_string()));
    }
    if !validator::validate_url(url) || !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(AppError::Validation("url must be an absolute http(s) address".to_string()));
    }
    Ok(())
}
