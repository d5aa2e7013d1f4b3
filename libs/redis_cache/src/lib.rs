use deadpool_redis::{Config, Pool, Runtime};
use redis::AsyncCommands;

pub type RedisPool = Pool;

#[derive(Debug, thiserror::Error)]
pub enum RedisError {
    #[error("Redis pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub async fn create_pool(redis_url: &str) -> Result<RedisPool, RedisError> {
    let cfg = Config::from_url(redis_url);
    let pool = cfg
        .create_pool(Some(Runtime::Tokio1))
        .map_err(|e| RedisError::Config(e.to_string()))?;
    Ok(pool)
}

/// String key/value cache for upstream API responses.
///
/// Failures never propagate: a failed read is a miss and a failed write
/// returns `false`, so callers fall back to the upstream.
#[derive(Clone)]
pub struct ResponseCache {
    pool: RedisPool,
}

impl ResponseCache {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        match self.try_get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(key, error = %e, "Error getting key from Redis");
                None
            }
        }
    }

    /// Stores `value` under `key`. A `ttl_seconds` of zero stores without expiry.
    pub async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> bool {
        match self.try_set(key, value, ttl_seconds).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(key, error = %e, "Error setting key in Redis");
                false
            }
        }
    }

    async fn try_get(&self, key: &str) -> Result<Option<String>, RedisError> {
        let mut conn = self.pool.get().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn try_set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), RedisError> {
        let mut conn = self.pool.get().await?;
        if ttl_seconds > 0 {
            let _: () = conn.set_ex(key, value, ttl_seconds).await?;
        } else {
            let _: () = conn.set(key, value).await?;
        }
        Ok(())
    }
}
