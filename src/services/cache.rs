use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Cache miss: {0}")]
    CacheMiss(String),
}

/// Multi-tier cache manager for geodata lookups
///
/// L1 is an in-process moka cache. L2 is Redis, shared across instances
/// and optional: without a Redis URL the manager runs on L1 alone.
pub struct CacheManager {
    redis: Option<Arc<tokio::sync::Mutex<ConnectionManager>>>,
    l1_cache: moka::future::Cache<String, Vec<u8>>,
    ttl_secs: u64,
}

impl CacheManager {
    /// Create a new cache manager, connecting to Redis when a URL is given
    pub async fn new(
        redis_url: Option<&str>,
        l1_size: u64,
        ttl_secs: u64,
    ) -> Result<Self, CacheError> {
        let redis = match redis_url {
            Some(url) => {
                let client = redis::Client::open(url)?;
                let manager = ConnectionManager::new(client).await?;
                Some(Arc::new(tokio::sync::Mutex::new(manager)))
            }
            None => None,
        };

        Ok(Self {
            redis,
            l1_cache: Self::build_l1(l1_size, ttl_secs),
            ttl_secs,
        })
    }

    /// L1-only cache manager
    pub fn in_memory(l1_size: u64, ttl_secs: u64) -> Self {
        Self {
            redis: None,
            l1_cache: Self::build_l1(l1_size, ttl_secs),
            ttl_secs,
        }
    }

    fn build_l1(l1_size: u64, ttl_secs: u64) -> moka::future::Cache<String, Vec<u8>> {
        moka::future::CacheBuilder::new(l1_size)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build()
    }

    pub fn has_redis(&self) -> bool {
        self.redis.is_some()
    }

    /// Get a value from cache (L1 first, then L2)
    pub async fn get<T>(&self, key: &str) -> Result<T, CacheError>
    where
        T: for<'de> Deserialize<'de>,
    {
        if let Some(bytes) = self.l1_cache.get(key).await {
            tracing::trace!("L1 cache hit: {}", key);
            return Ok(serde_json::from_slice(&bytes)?);
        }

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            let value: Option<String> = redis::cmd("GET")
                .arg(key)
                .query_async(&mut *conn)
                .await?;
            drop(conn);

            if let Some(json) = value {
                tracing::trace!("L2 cache hit: {}", key);
                self.l1_cache
                    .insert(key.to_string(), json.as_bytes().to_vec())
                    .await;
                return Ok(serde_json::from_str(&json)?);
            }
        }

        tracing::trace!("Cache miss: {}", key);
        Err(CacheError::CacheMiss(key.to_string()))
    }

    /// Set a value in cache (both tiers)
    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let json = serde_json::to_string(value)?;

        self.l1_cache
            .insert(key.to_string(), json.as_bytes().to_vec())
            .await;

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            let _: () = redis::cmd("SETEX")
                .arg(key)
                .arg(self.ttl_secs)
                .arg(json)
                .query_async(&mut *conn)
                .await?;
        }

        tracing::trace!("Cache set: {}", key);
        Ok(())
    }

    /// Delete a value from both cache tiers
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.l1_cache.invalidate(key).await;

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            let _: () = redis::cmd("DEL").arg(key).query_async(&mut *conn).await?;
        }
        Ok(())
    }

    /// Return the cached value or compute, store and return it
    ///
    /// Cache failures never fail the lookup; errors from `fetch` are
    /// returned as-is and nothing is cached.
    pub async fn get_or_fetch<T, E, F, Fut>(&self, key: &str, fetch: F) -> Result<T, E>
    where
        T: Serialize + for<'de> Deserialize<'de>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        match self.get::<T>(key).await {
            Ok(value) => return Ok(value),
            Err(CacheError::CacheMiss(_)) => {}
            Err(e) => tracing::warn!("Cache read failed for {}: {}", key, e),
        }

        let value = fetch().await?;

        if let Err(e) = self.set(key, &value).await {
            tracing::warn!("Cache write failed for {}: {}", key, e);
        }

        Ok(value)
    }
}

/// Cache key builder
///
/// Coordinates are rounded to six decimals (about 10 cm) so nearby
/// repeats of the same click share an entry.
pub struct CacheKey;

impl CacheKey {
    fn point(lon: f64, lat: f64) -> String {
        format!("{:.6}:{:.6}", lon, lat)
    }

    pub fn address(query: &str, limit: u8) -> String {
        format!("address:{}:{}", query.trim().to_lowercase(), limit)
    }

    pub fn parcel(lon: f64, lat: f64) -> String {
        format!("parcel:{}", Self::point(lon, lat))
    }

    pub fn zoning(lon: f64, lat: f64) -> String {
        format!("zoning:{}", Self::point(lon, lat))
    }

    pub fn heritage(lon: f64, lat: f64) -> String {
        format!("heritage:{}", Self::point(lon, lat))
    }

    pub fn site(lon: f64, lat: f64) -> String {
        format!("site:{}", Self::point(lon, lat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "Requires Redis"]
    async fn test_cache_set_get() {
        let cache = CacheManager::new(Some("redis://127.0.0.1:6379"), 1000, 60)
            .await
            .expect("Failed to create cache");

        let key = "test_key";
        let value = "test_value";

        cache.set(key, &value).await.unwrap();
        let result: String = cache.get(key).await.unwrap();
        assert_eq!(result, value);

        cache.delete(key).await.unwrap();
        assert!(cache.get::<String>(key).await.is_err());
    }

    #[tokio::test]
    async fn test_in_memory_set_get_delete() {
        let cache = CacheManager::in_memory(100, 60);
        assert!(!cache.has_redis());

        cache.set("k", &vec![1, 2, 3]).await.unwrap();
        let value: Vec<i32> = cache.get("k").await.unwrap();
        assert_eq!(value, vec![1, 2, 3]);

        cache.delete("k").await.unwrap();
        assert!(matches!(
            cache.get::<Vec<i32>>("k").await,
            Err(CacheError::CacheMiss(_))
        ));
    }

    #[tokio::test]
    async fn test_get_or_fetch_caches_success_only() {
        let cache = CacheManager::in_memory(100, 60);

        let first: Result<u32, String> = cache.get_or_fetch("n", || async { Ok(7) }).await;
        assert_eq!(first, Ok(7));

        // Served from cache, the fetcher is not consulted
        let second: Result<u32, String> = cache
            .get_or_fetch("n", || async { Err("unreachable".to_string()) })
            .await;
        assert_eq!(second, Ok(7));

        let failed: Result<u32, String> = cache
            .get_or_fetch("other", || async { Err("boom".to_string()) })
            .await;
        assert_eq!(failed, Err("boom".to_string()));
        assert!(cache.get::<u32>("other").await.is_err());
    }

    #[test]
    fn test_cache_key_builder() {
        assert_eq!(CacheKey::address("  8 Rue de Rivoli ", 5), "address:8 rue de rivoli:5");
        assert_eq!(CacheKey::parcel(2.3522219, 48.856614), "parcel:2.352222:48.856614");
        assert_eq!(CacheKey::zoning(2.0, 48.5), "zoning:2.000000:48.500000");
        assert_eq!(CacheKey::heritage(2.0, 48.5), "heritage:2.000000:48.500000");
        assert_eq!(CacheKey::site(-1.5, 47.2), "site:-1.500000:47.200000");
    }
}
