use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// 缓存项
#[derive(Debug, Clone)]
struct CacheItem<T> {
    value: T,
    expires_at: Instant,
}

/// 简单的内存 TTL 缓存实现
#[derive(Debug, Clone)]
pub struct Cache<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<String, CacheItem<T>>>>,
    default_ttl: Duration,
}

impl<T: Clone + Send + Sync + 'static> Cache<T> {
    /// 创建新的缓存实例
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
            default_ttl,
        }
    }

    /// 启动后台清理任务，需要在 tokio 运行时内调用
    pub fn spawn_cleanup(&self, every: Duration) {
        let data_ref = self.data.clone();
        tokio::spawn(async move {
            loop {
                sleep(every).await;
                let removed = Self::cleanup_expired(&data_ref).await;
                if removed > 0 {
                    debug!("Removed {} expired cache entries", removed);
                }
            }
        });
    }

    /// 设置缓存项
    pub async fn set(&self, key: String, value: T) {
        self.set_with_ttl(key, value, self.default_ttl).await
    }

    /// 设置带有自定义TTL的缓存项
    pub async fn set_with_ttl(&self, key: String, value: T, ttl: Duration) {
        let item = CacheItem {
            value,
            expires_at: Instant::now() + ttl,
        };

        let mut data = self.data.write().await;
        data.insert(key, item);
    }

    /// 获取缓存项，过期的项视为不存在
    pub async fn get(&self, key: &str) -> Option<T> {
        let data = self.data.read().await;
        data.get(key)
            .filter(|item| item.expires_at > Instant::now())
            .map(|item| item.value.clone())
    }

    /// 删除缓存项
    pub async fn delete(&self, key: &str) -> bool {
        let mut data = self.data.write().await;
        data.remove(key).is_some()
    }

    /// 检查键是否存在且未过期
    #[cfg(test)]
    pub async fn exists(&self, key: &str) -> bool {
        self.get(key).await.is_some()
    }

    /// 清理过期项
    async fn cleanup_expired(data: &Arc<RwLock<HashMap<String, CacheItem<T>>>>) -> usize {
        let mut data = data.write().await;
        let now = Instant::now();
        let before = data.len();
        data.retain(|_, item| item.expires_at > now);
        before - data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cache_basic_operations() {
        let cache = Cache::new(Duration::from_secs(60));

        // 测试设置和获取
        cache.set("key1".to_string(), "value1".to_string()).await;
        assert_eq!(cache.get("key1").await, Some("value1".to_string()));

        // 测试不存在的键
        assert_eq!(cache.get("nonexistent").await, None);

        // 测试删除
        assert!(cache.delete("key1").await);
        assert!(!cache.delete("key1").await);
        assert_eq!(cache.get("key1").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_expiration() {
        let cache = Cache::new(Duration::from_millis(100));

        cache.set("temp_key".to_string(), "temp_value".to_string()).await;
        assert!(cache.exists("temp_key").await);

        tokio::time::advance(Duration::from_millis(150)).await;
        assert_eq!(cache.get("temp_key").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_removes_expired_entries() {
        let cache = Cache::new(Duration::from_secs(1));
        cache.set("short".to_string(), 1u8).await;
        cache.set_with_ttl("long".to_string(), 2u8, Duration::from_secs(60)).await;

        tokio::time::advance(Duration::from_secs(2)).await;
        let removed = Cache::cleanup_expired(&cache.data).await;
        assert_eq!(removed, 1);
        assert_eq!(cache.data.read().await.len(), 1);
        assert_eq!(cache.get("long").await, Some(2));
    }
}
