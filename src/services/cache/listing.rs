//! Server-side cache for unsearched blog listings.
//!
//! Keys embed a generation counter; every blog write bumps the counter so stale
//! pages simply stop being addressed and expire on their own TTL.
//! The cache is fail-open: backend errors are logged and treated as a miss.

use std::sync::Arc;
use std::time::Duration;

use crate::services::blog_query::BlogListQuery;
use crate::services::cache::client::{CacheClient, CacheError, CacheResult};

pub const LISTING_TTL: Duration = Duration::from_secs(60);
const GENERATION_KEY: &str = "blog:listing:generation";

#[derive(Clone, Default)]
pub struct ListingCache {
    client: Option<Arc<dyn CacheClient>>,
}

/// Key resolved by a missed read. Filling through the same slot keeps a page
/// rendered before a write from landing under the post-write generation.
#[derive(Debug)]
pub struct ListingSlot {
    key: String,
}

#[derive(Debug)]
pub enum Lookup {
    Hit(String),
    /// `None` when the query is not cacheable or the backend failed.
    Miss(Option<ListingSlot>),
}

impl ListingCache {
    pub fn new(client: Arc<dyn CacheClient>) -> Self {
        Self {
            client: Some(client),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub async fn get(&self, query: &BlogListQuery) -> Lookup {
        let Some(client) = self.client.as_ref().filter(|_| query.is_cacheable()) else {
            return Lookup::Miss(None);
        };

        let result = async {
            let key = listing_key(client.as_ref(), query).await?;
            let hit = client.get_string(&key).await?;
            Ok::<_, CacheError>((key, hit))
        }
        .await;

        match result {
            Ok((_, Some(body))) => Lookup::Hit(body),
            Ok((key, None)) => Lookup::Miss(Some(ListingSlot { key })),
            Err(err) => {
                tracing::warn!(error = %err, backend = client.backend_name(), "listing cache read failed");
                Lookup::Miss(None)
            }
        }
    }

    pub async fn put(&self, slot: ListingSlot, body: &str) {
        let Some(client) = self.client.as_ref() else {
            return;
        };

        if let Err(err) = client.set_with_ttl(&slot.key, body, LISTING_TTL).await {
            tracing::warn!(error = %err, backend = client.backend_name(), "listing cache write failed");
        }
    }

    /// Makes every previously cached page unreachable.
    pub async fn invalidate(&self) {
        let Some(client) = self.client.as_ref() else {
            return;
        };

        match client.incr(GENERATION_KEY).await {
            Ok(generation) => tracing::debug!(generation, "listing cache invalidated"),
            Err(err) => {
                tracing::warn!(error = %err, backend = client.backend_name(), "listing cache invalidation failed")
            }
        }
    }
}

async fn listing_key(client: &dyn CacheClient, query: &BlogListQuery) -> CacheResult<String> {
    let generation = match client.get_string(GENERATION_KEY).await? {
        Some(raw) => raw
            .parse::<i64>()
            .map_err(|_| CacheError::InvalidValue(format!("{GENERATION_KEY}={raw}")))?,
        None => 0,
    };

    Ok(format!(
        "blog:listing:{generation}:page:{}:starred:{}",
        query.page, query.starred_only
    ))
}
