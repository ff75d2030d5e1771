use async_trait::async_trait;
use std::time::Duration;

/// Cache trait - short-lived key/value storage (flash messages between redirects).
#[async_trait]
pub trait Cache: Send + Sync {
    /// Get a value from the cache.
    async fn get(&self, key: &str) -> Option<String>;

    /// Set a value in the cache with optional TTL.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError>;

    /// Delete a key from the cache.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Get a value and remove it in the same call.
    async fn take(&self, key: &str) -> Result<Option<String>, CacheError> {
        let value = self.get(key).await;
        if value.is_some() {
            self.delete(key).await?;
        }
        Ok(value)
    }
}

/// Cache operation errors.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}
