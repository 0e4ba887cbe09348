use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const OTP_LENGTH: usize = 6;

/// 一次性验证码及其过期时间，两者总是同时设置或同时清除
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneTimePasscode {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

impl OneTimePasscode {
    pub fn generate(ttl: Duration) -> Self {
        let mut rng = rand::thread_rng();
        let code: String = (0..OTP_LENGTH)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect();
        Self {
            code,
            expires_at: Utc::now() + ttl,
        }
    }

    /// 验证码一致且当前时间早于过期时间才算通过
    pub fn verify(&self, candidate: &str, now: DateTime<Utc>) -> bool {
        constant_time_eq(self.code.as_bytes(), candidate.trim().as_bytes()) && now < self.expires_at
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// `users` 表中的一行
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password: String,
    pub otp: Option<String>,
    pub otp_expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub otp: Option<OneTimePasscode>,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        let otp = match (row.otp, row.otp_expiry) {
            (Some(code), Some(expires_at)) => Some(OneTimePasscode { code, expires_at }),
            (None, None) => None,
            _ => {
                tracing::warn!("User {} has a half-set OTP pair, ignoring it", row.id);
                None
            }
        };

        Self {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password,
            otp,
            created_at: row.created_at,
        }
    }
}

impl User {
    pub fn to_profile(&self) -> ProfileResponse {
        ProfileResponse {
            email: self.email.clone(),
            username: self.username.clone(),
        }
    }
}

/// 新用户，密码已经过哈希
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub email: String,
    pub username: String,
}
