use crate::{
    error::{AppError, Result},
    models::user::{NewUser, OneTimePasscode, User, UserRow},
};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, username, email, password, otp, otp_expiry, created_at";

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn create(&self, user: NewUser) -> Result<User>;

    /// 更新密码，同时清除验证码及其过期时间
    async fn update_password(&self, email: &str, password_hash: &str) -> Result<()>;

    /// 同时写入验证码与过期时间
    async fn update_otp(&self, email: &str, otp: &OneTimePasscode) -> Result<()>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn create(&self, user: NewUser) -> Result<User> {
        debug!("Inserting user: {}", user.email);

        let sql = format!(
            "INSERT INTO users (id, username, email, password, otp, otp_expiry, created_at) \
             VALUES ($1, $2, $3, $4, NULL, NULL, NOW()) RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    AppError::conflict("Email or username already registered")
                }
                other => AppError::Database(other),
            })?;
        Ok(User::from(row))
    }

    async fn update_password(&self, email: &str, password_hash: &str) -> Result<()> {
        sqlx::query("UPDATE users SET password = $1, otp = NULL, otp_expiry = NULL WHERE email = $2")
            .bind(password_hash)
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_otp(&self, email: &str, otp: &OneTimePasscode) -> Result<()> {
        sqlx::query("UPDATE users SET otp = $1, otp_expiry = $2 WHERE email = $3")
            .bind(&otp.code)
            .bind(otp.expires_at)
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
