//! In-process cache backend for tests (TTL is ignored).

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::services::cache::client::{CacheClient, CacheError, CacheResult};

#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl CacheClient for MemoryCache {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get_string(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set_with_ttl(&self, key: &str, value: &str, _ttl: Duration) -> CacheResult<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn incr(&self, key: &str) -> CacheResult<i64> {
        let mut entries = self.entries.lock().unwrap();
        let current = match entries.get(key) {
            Some(v) => v
                .parse::<i64>()
                .map_err(|_| CacheError::InvalidValue(v.clone()))?,
            None => 0,
        };
        entries.insert(key.to_string(), (current + 1).to_string());
        Ok(current + 1)
    }
}
