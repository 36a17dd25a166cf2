//! Redis counter store: the engagement fast path.
//!
//! Everything here maps 1:1 onto an atomic Redis command so concurrent
//! callers never race through application-level read-modify-write:
//!
//! - counters → `INCR` / `DECR` / `GET` / `SETEX`
//! - membership → `SADD` / `SREM` / `SISMEMBER`
//! - markers → `SETEX` / `EXISTS` / `DEL` / `EXPIRE`
//! - batch reads and warmup → pipelines
//!
//! Key layout is defined in [`crate::keys`]. An optional prefix
//! namespaces all keys when the Redis instance is shared.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{cmd, pipe, AsyncCommands, Client};

use super::traits::{CounterStore, StoreError};
use crate::resilience::retry::{retry, RetryConfig};

pub struct RedisCounterStore {
    connection: ConnectionManager,
    /// Optional key prefix for namespacing (e.g., "eng:" → "eng:video:...")
    prefix: String,
}

impl RedisCounterStore {
    /// Create a new counter store without a key prefix.
    pub async fn new(connection_string: &str) -> Result<Self, StoreError> {
        Self::with_prefix(connection_string, None).await
    }

    /// Create a new counter store with an optional key prefix.
    pub async fn with_prefix(
        connection_string: &str,
        prefix: Option<&str>,
    ) -> Result<Self, StoreError> {
        let client =
            Client::open(connection_string).map_err(|e| StoreError::Backend(e.to_string()))?;

        // Startup config: fast-fail on bad endpoints, don't hang forever
        let connection = retry("redis_connect", &RetryConfig::startup(), || async {
            ConnectionManager::new(client.clone()).await
        })
        .await
        .map_err(|e: redis::RedisError| StoreError::Unavailable(e.to_string()))?;

        Ok(Self {
            connection,
            prefix: prefix.unwrap_or("").to_string(),
        })
    }

    #[inline]
    fn prefixed(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}{}", self.prefix, key)
        }
    }

    /// Get a clone of the connection manager (for health probes).
    pub fn connection(&self) -> ConnectionManager {
        self.connection.clone()
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        let conn = self.connection.clone();
        let key = self.prefixed(key);

        retry("redis_incr", &RetryConfig::query(), || {
            let mut conn = conn.clone();
            let key = key.clone();
            async move {
                let value: i64 = conn.incr(&key, 1).await?;
                Ok(value)
            }
        })
        .await
        .map_err(|e: redis::RedisError| StoreError::Backend(e.to_string()))
    }

    async fn decr(&self, key: &str) -> Result<i64, StoreError> {
        let conn = self.connection.clone();
        let key = self.prefixed(key);

        retry("redis_decr", &RetryConfig::query(), || {
            let mut conn = conn.clone();
            let key = key.clone();
            async move {
                let value: i64 = conn.decr(&key, 1).await?;
                Ok(value)
            }
        })
        .await
        .map_err(|e: redis::RedisError| StoreError::Backend(e.to_string()))
    }

    async fn get_count(&self, key: &str) -> Result<Option<i64>, StoreError> {
        let conn = self.connection.clone();
        let key = self.prefixed(key);

        retry("redis_get", &RetryConfig::query(), || {
            let mut conn = conn.clone();
            let key = key.clone();
            async move {
                let value: Option<i64> = conn.get(&key).await?;
                Ok(value)
            }
        })
        .await
        .map_err(|e: redis::RedisError| StoreError::Backend(e.to_string()))
    }

    async fn set_count(&self, key: &str, value: i64, ttl_secs: u64) -> Result<(), StoreError> {
        let conn = self.connection.clone();
        let key = self.prefixed(key);

        retry("redis_setex", &RetryConfig::query(), || {
            let mut conn = conn.clone();
            let key = key.clone();
            async move {
                let _: () = conn.set_ex(&key, value, ttl_secs).await?;
                Ok(())
            }
        })
        .await
        .map_err(|e: redis::RedisError| StoreError::Backend(e.to_string()))
    }

    /// Cold-cache seeding via `SET NX EX`: one atomic command, so a
    /// concurrent increment can never be overwritten by the seed.
    async fn set_count_if_absent(
        &self,
        key: &str,
        value: i64,
        ttl_secs: u64,
    ) -> Result<bool, StoreError> {
        let conn = self.connection.clone();
        let key = self.prefixed(key);

        retry("redis_set_nx", &RetryConfig::query(), || {
            let mut conn = conn.clone();
            let key = key.clone();
            async move {
                let set: Option<String> = cmd("SET")
                    .arg(&key)
                    .arg(value)
                    .arg("NX")
                    .arg("EX")
                    .arg(ttl_secs)
                    .query_async(&mut conn)
                    .await?;
                Ok(set.is_some())
            }
        })
        .await
        .map_err(|e: redis::RedisError| StoreError::Backend(e.to_string()))
    }

    /// Pipelined multi-get, one round trip for the whole batch.
    async fn get_counts(&self, keys: &[String]) -> Result<Vec<Option<i64>>, StoreError> {
        if keys.is_empty() {
            return Ok(vec![]);
        }

        let conn = self.connection.clone();
        let prefixed: Vec<String> = keys.iter().map(|k| self.prefixed(k)).collect();

        retry("redis_get_counts", &RetryConfig::query(), || {
            let mut conn = conn.clone();
            let prefixed = prefixed.clone();
            async move {
                let mut pipeline = pipe();
                for key in &prefixed {
                    pipeline.get(key);
                }
                let values: Vec<Option<i64>> = pipeline.query_async(&mut conn).await?;
                Ok(values)
            }
        })
        .await
        .map_err(|e: redis::RedisError| StoreError::Backend(e.to_string()))
    }

    async fn set_marker(&self, key: &str, ttl_secs: u64) -> Result<(), StoreError> {
        let conn = self.connection.clone();
        let key = self.prefixed(key);

        retry("redis_set_marker", &RetryConfig::query(), || {
            let mut conn = conn.clone();
            let key = key.clone();
            async move {
                let _: () = conn.set_ex(&key, 1i64, ttl_secs).await?;
                Ok(())
            }
        })
        .await
        .map_err(|e: redis::RedisError| StoreError::Backend(e.to_string()))
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let conn = self.connection.clone();
        let key = self.prefixed(key);

        retry("redis_exists", &RetryConfig::query(), || {
            let mut conn = conn.clone();
            let key = key.clone();
            async move {
                let exists: bool = conn.exists(&key).await?;
                Ok(exists)
            }
        })
        .await
        .map_err(|e: redis::RedisError| StoreError::Backend(e.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let conn = self.connection.clone();
        let key = self.prefixed(key);

        retry("redis_delete", &RetryConfig::query(), || {
            let mut conn = conn.clone();
            let key = key.clone();
            async move {
                let _: () = conn.del(&key).await?;
                Ok(())
            }
        })
        .await
        .map_err(|e: redis::RedisError| StoreError::Backend(e.to_string()))
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<(), StoreError> {
        let conn = self.connection.clone();
        let key = self.prefixed(key);

        retry("redis_expire", &RetryConfig::query(), || {
            let mut conn = conn.clone();
            let key = key.clone();
            async move {
                let _: bool = conn.expire(&key, ttl_secs as i64).await?;
                Ok(())
            }
        })
        .await
        .map_err(|e: redis::RedisError| StoreError::Backend(e.to_string()))
    }

    async fn set_add(&self, set_key: &str, member: &str) -> Result<bool, StoreError> {
        let conn = self.connection.clone();
        let set_key = self.prefixed(set_key);
        let member = member.to_string();

        retry("redis_sadd", &RetryConfig::query(), || {
            let mut conn = conn.clone();
            let set_key = set_key.clone();
            let member = member.clone();
            async move {
                let added: u32 = conn.sadd(&set_key, &member).await?;
                Ok(added > 0)
            }
        })
        .await
        .map_err(|e: redis::RedisError| StoreError::Backend(e.to_string()))
    }

    async fn set_remove(&self, set_key: &str, member: &str) -> Result<bool, StoreError> {
        let conn = self.connection.clone();
        let set_key = self.prefixed(set_key);
        let member = member.to_string();

        retry("redis_srem", &RetryConfig::query(), || {
            let mut conn = conn.clone();
            let set_key = set_key.clone();
            let member = member.clone();
            async move {
                let removed: u32 = conn.srem(&set_key, &member).await?;
                Ok(removed > 0)
            }
        })
        .await
        .map_err(|e: redis::RedisError| StoreError::Backend(e.to_string()))
    }

    async fn set_is_member(&self, set_key: &str, member: &str) -> Result<bool, StoreError> {
        let conn = self.connection.clone();
        let set_key = self.prefixed(set_key);
        let member = member.to_string();

        retry("redis_sismember", &RetryConfig::query(), || {
            let mut conn = conn.clone();
            let set_key = set_key.clone();
            let member = member.clone();
            async move {
                let is_member: bool = conn.sismember(&set_key, &member).await?;
                Ok(is_member)
            }
        })
        .await
        .map_err(|e: redis::RedisError| StoreError::Backend(e.to_string()))
    }

    /// Pipelined SADD batch for like-cache warmup.
    async fn set_add_batch(&self, pairs: &[(String, String)]) -> Result<(), StoreError> {
        if pairs.is_empty() {
            return Ok(());
        }

        let conn = self.connection.clone();
        let prefixed: Vec<(String, String)> = pairs
            .iter()
            .map(|(set_key, member)| (self.prefixed(set_key), member.clone()))
            .collect();

        retry("redis_sadd_batch", &RetryConfig::query(), || {
            let mut conn = conn.clone();
            let prefixed = prefixed.clone();
            async move {
                let mut pipeline = pipe();
                for (set_key, member) in &prefixed {
                    pipeline.sadd(set_key, member).ignore();
                }
                pipeline.query_async::<()>(&mut conn).await?;
                Ok(())
            }
        })
        .await
        .map_err(|e: redis::RedisError| StoreError::Backend(e.to_string()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        let _: String = cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(())
    }
}
