use async_trait::async_trait;
use std::sync::Arc;

/// Time-bounded memoization of upstream responses.
///
/// An entry is served for the freshness window the backend was built with,
/// counted from the moment it was put. After that `get` reports it as absent.
#[async_trait]
pub trait Cache<K, V>: Send + Sync
where
    K: Send + Sync,
    V: Send + Sync,
{
    async fn get(&self, key: &K) -> Option<V>;

    /// Stores `value`, replacing whatever was there.
    async fn put(&self, key: K, value: V);
}

pub type SharedCache<V> = Arc<dyn Cache<String, V>>;

/// Cache key for an upstream endpoint and ticker.
pub fn cache_key(function: &str, ticker: &str) -> String {
    format!("{function}:{ticker}")
}
