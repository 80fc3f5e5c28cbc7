use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, RedisError, aio::ConnectionManager};

use crate::services::cache::client::{CacheClient, CacheError, CacheResult};

/// Valkey/Redis listing cache backend (GET, SET EX, INCR).
///
/// `ConnectionManager` reconnects on its own, so a Valkey restart costs a few
/// cache misses rather than a broken client.
#[derive(Clone)]
pub struct ValkeyClient {
    manager: ConnectionManager,
}

impl ValkeyClient {
    /// `url` looks like `redis://localhost:6379/0`.
    pub async fn connect(url: &str) -> CacheResult<Self> {
        let client = redis::Client::open(url).map_err(connection_error)?;
        let manager = client
            .get_connection_manager()
            .await
            .map_err(connection_error)?;
        Ok(Self { manager })
    }
}

fn connection_error(e: RedisError) -> CacheError {
    CacheError::BackendConnection(e.to_string())
}

fn command_error(e: RedisError) -> CacheError {
    CacheError::BackendCommand(e.to_string())
}

#[async_trait]
impl CacheClient for ValkeyClient {
    fn backend_name(&self) -> &'static str {
        "valkey"
    }

    async fn get_string(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.manager.clone();
        conn.get(key).await.map_err(command_error)
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let mut conn = self.manager.clone();
        // EX has one-second granularity
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, seconds)
            .await
            .map_err(command_error)
    }

    async fn incr(&self, key: &str) -> CacheResult<i64> {
        let mut conn = self.manager.clone();
        conn.incr(key, 1_i64).await.map_err(command_error)
    }
}
