use crate::{error::Result, utils::cache::Cache};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// 刷新令牌在缓存中的保存时长
pub const REFRESH_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

pub fn refresh_token_key(user_id: Uuid) -> String {
    format!("refreshToken:{}", user_id)
}

/// 每个用户最多保存一个刷新令牌
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn get(&self, user_id: Uuid) -> Result<Option<String>>;

    /// `None` 表示删除该用户的令牌
    async fn set(&self, user_id: Uuid, token: Option<&str>) -> Result<()>;
}

/// 进程内缓存实现，单实例部署时使用
#[derive(Clone)]
pub struct CacheTokenStore {
    cache: Cache<String>,
}

impl CacheTokenStore {
    pub fn new() -> Self {
        Self {
            cache: Cache::new(REFRESH_TOKEN_TTL),
        }
    }

    pub fn cache(&self) -> &Cache<String> {
        &self.cache
    }
}

impl Default for CacheTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RefreshTokenStore for CacheTokenStore {
    async fn get(&self, user_id: Uuid) -> Result<Option<String>> {
        Ok(self.cache.get(&refresh_token_key(user_id)).await)
    }

    async fn set(&self, user_id: Uuid, token: Option<&str>) -> Result<()> {
        let key = refresh_token_key(user_id);
        match token {
            Some(token) => self.cache.set(key, token.to_string()).await,
            None => {
                let removed = self.cache.delete(&key).await;
                debug!("Refresh token removed for {}: {}", user_id, removed);
            }
        }
        Ok(())
    }
}

#[cfg(feature = "redis-cache")]
pub use self::redis_store::RedisTokenStore;

#[cfg(feature = "redis-cache")]
mod redis_store {
    use super::*;
    use redis::{aio::ConnectionManager, AsyncCommands};

    #[derive(Clone)]
    pub struct RedisTokenStore {
        conn: ConnectionManager,
    }

    impl RedisTokenStore {
        pub async fn connect(url: &str) -> Result<Self> {
            let client = redis::Client::open(url)?;
            let conn = ConnectionManager::new(client).await?;
            Ok(Self { conn })
        }
    }

    #[async_trait]
    impl RefreshTokenStore for RedisTokenStore {
        async fn get(&self, user_id: Uuid) -> Result<Option<String>> {
            let mut conn = self.conn.clone();
            let token: Option<String> = conn.get(refresh_token_key(user_id)).await?;
            Ok(token)
        }

        async fn set(&self, user_id: Uuid, token: Option<&str>) -> Result<()> {
            let mut conn = self.conn.clone();
            let key = refresh_token_key(user_id);
            match token {
                Some(token) => {
                    redis::cmd("SET")
                        .arg(key)
                        .arg(token)
                        .arg("EX")
                        .arg(REFRESH_TOKEN_TTL.as_secs())
                        .query_async::<_, ()>(&mut conn)
                        .await?;
                }
                None => {
                    conn.del::<_, ()>(key).await?;
                }
            }
            Ok(())
        }
    }
}
