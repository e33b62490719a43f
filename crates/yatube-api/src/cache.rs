use std::time::Duration;

use axum::body::Bytes;
use moka::future::Cache;

const MAX_ENTRIES: u64 = 1_000;

/// Rendered index pages, keyed by the resolved page number.
///
/// Entries live for a fixed TTL. Writes to posts do not touch the cache, so
/// the index may lag behind until the entry expires or [`IndexCache::clear`]
/// is called.
#[derive(Clone)]
pub struct IndexCache {
    inner: Cache<u32, Bytes>,
}

impl IndexCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(MAX_ENTRIES)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn get(&self, page: u32) -> Option<Bytes> {
        self.inner.get(&page).await
    }

    pub async fn insert(&self, page: u32, body: Bytes) {
        self.inner.insert(page, body).await;
    }

    pub fn clear(&self) {
        self.inner.invalidate_all();
    }
}
