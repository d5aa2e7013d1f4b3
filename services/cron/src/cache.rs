use async_trait::async_trait;
use redis_cache::ResponseCache;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Key/value store for raw upstream response bodies.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;

    /// Returns whether the value was stored.
    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> bool;
}

#[async_trait]
impl CacheBackend for ResponseCache {
    async fn get(&self, key: &str) -> Option<String> {
        ResponseCache::get(self, key).await
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> bool {
        ResponseCache::set(self, key, value, ttl_seconds).await
    }
}

/// Process-local cache with passive expiry, measured on tokio's clock.
#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, (String, Option<Instant>)>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheBackend for InMemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().ok()?;
        match entries.get(key) {
            Some((_, Some(expires_at))) if *expires_at <= Instant::now() => {
                entries.remove(key);
                None
            }
            Some((value, _)) => Some(value.clone()),
            None => None,
        }
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> bool {
        let expires_at =
            (ttl_seconds > 0).then(|| Instant::now() + Duration::from_secs(ttl_seconds));
        match self.entries.lock() {
            Ok(mut entries) => {
                entries.insert(key.to_string(), (value.to_string(), expires_at));
                true
            }
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn serves_value_until_ttl_elapses() {
        let cache = InMemoryCache::new();
        assert!(cache.set("ergast:drivers", "{}", 10).await);
        assert_eq!(cache.get("ergast:drivers").await.as_deref(), Some("{}"));

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(cache.get("ergast:drivers").await.is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get("ergast:drivers").await.is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_ttl_never_expires() {
        let cache = InMemoryCache::new();
        cache.set("forever", "1", 0).await;
        tokio::time::advance(Duration::from_secs(86_400)).await;
        assert_eq!(cache.get("forever").await.as_deref(), Some("1"));
    }
}
