//! Redis-backed counter store (feature `redis-store`).

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;

use super::{CounterStore, StoreError, StoredWindow};

/// Counter store on Redis.
///
/// Writes use `SET key value EX ttl`, reads use `GET key`. The connection
/// manager reconnects transparently; while Redis is down every call fails
/// with [`StoreError::Unavailable`] and the limiter runs memory-only.
#[derive(Clone)]
pub struct RedisCounterStore {
    connection: ConnectionManager,
}

impl RedisCounterStore {
    /// Connect to `redis_url`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the URL is invalid or the
    /// initial connection fails.
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| StoreError::Unavailable(format!("invalid Redis URL: {}", e)))?;
        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| StoreError::Unavailable(format!("failed to connect to Redis: {}", e)))?;

        log::info!("✅ Connected to Redis counter store");
        Ok(Self { connection })
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn get(&self, key: &str) -> Result<Option<StoredWindow>, StoreError> {
        let mut conn = self.connection.clone();
        let raw: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        raw.map(|s| StoredWindow::from_json(&s)).transpose()
    }

    async fn put(&self, key: &str, value: StoredWindow, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        let payload = value.to_json()?;
        redis::cmd("SET")
            .arg(key)
            .arg(payload)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
