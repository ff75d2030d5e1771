//! In-memory cache - holds flash data between a redirect and the next page.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use folio_core::ports::{Cache, CacheError};

/// Entry count above which `set` sweeps expired entries first.
const SWEEP_THRESHOLD: usize = 1024;

struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.expires_at
            .map(|exp| Instant::now() > exp)
            .unwrap_or(false)
    }
}

/// In-memory cache using a HashMap behind an async RwLock.
///
/// Data is lost on process restart, and entries are only visible to the
/// process that wrote them.
pub struct InMemoryCache {
    store: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
        }
    }

    /// Drop every expired entry. Expired keys are otherwise only removed when read.
    pub async fn purge_expired(&self) -> usize {
        let mut store = self.store.write().await;
        sweep(&mut store)
    }
}

fn sweep(store: &mut HashMap<String, CacheEntry>) -> usize {
    let before = store.len();
    store.retain(|_, entry| !entry.is_expired());
    before - store.len()
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        let store = self.store.read().await;
        let entry = store.get(key)?;

        if entry.is_expired() {
            drop(store);
            let mut store = self.store.write().await;
            store.remove(key);
            return None;
        }

        Some(entry.value.clone())
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut store = self.store.write().await;
        // Unread flash entries would otherwise stay forever.
        if store.len() >= SWEEP_THRESHOLD {
            let removed = sweep(&mut store);
            tracing::debug!(removed, "Swept expired cache entries");
        }

        let expires_at = ttl.map(|d| Instant::now() + d);

        store.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at,
            },
        );

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut store = self.store.write().await;
        store.remove(key);
        Ok(())
    }

    async fn take(&self, key: &str) -> Result<Option<String>, CacheError> {
        // Single write lock so two readers cannot both consume the entry.
        let mut store = self.store.write().await;
        Ok(store
            .remove(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value))
    }
}
