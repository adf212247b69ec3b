use crate::core::cache::Cache;
use crate::core::entity::EntityStore;
use crate::core::position::{Account, Position, UserId};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

struct CacheValue<V> {
    value: V,
    fetched_at: Instant,
}

/// In-memory cache implementation using HashMap and Mutex
pub struct MemoryCache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    inner: Arc<Mutex<HashMap<K, CacheValue<V>>>>,
    freshness: Duration,
}

impl<K, V> MemoryCache<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    /// Creates a new MemoryCache whose entries stay fresh for `freshness`
    pub fn new(freshness: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            freshness,
        }
    }
}

#[async_trait]
impl<K, V> Cache<K, V> for MemoryCache<K, V>
where
    K: Eq + Hash + Send + Sync + std::fmt::Debug + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &K) -> Option<V> {
        let cache = self.inner.lock().await;
        if let Some(entry) = cache.get(key) {
            if entry.fetched_at.elapsed() >= self.freshness {
                debug!("Cache entry expired for key: {:?}", key);
                return None;
            }
            debug!("Cache HIT for key: {:?}", key);
            return Some(entry.value.clone());
        }
        debug!("Cache MISS for key: {:?}", key);
        None
    }

    async fn put(&self, key: K, value: V) {
        let cache_value = CacheValue {
            value,
            fetched_at: Instant::now(),
        };

        let mut cache = self.inner.lock().await;
        debug!("Cache PUT for key: {:?}", key);
        cache.insert(key, cache_value);
    }
}

#[derive(Default)]
struct Entities {
    positions: BTreeMap<(UserId, String), Position>,
    accounts: HashMap<UserId, Account>,
    watchlists: HashMap<UserId, Vec<String>>,
}

/// Entity store kept in process memory.
#[derive(Default)]
pub struct MemoryEntityStore {
    inner: Mutex<Entities>,
}

impl MemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntityStore for MemoryEntityStore {
    async fn get_position(&self, user: &UserId, ticker: &str) -> Result<Option<Position>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .positions
            .get(&(user.clone(), ticker.to_string()))
            .cloned())
    }

    async fn put_position(&self, position: &Position) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.positions.insert(
            (position.user.clone(), position.ticker.clone()),
            position.clone(),
        );
        Ok(())
    }

    async fn list_positions(&self, user: &UserId) -> Result<Vec<Position>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .positions
            .iter()
            .filter(|((owner, _), _)| owner == user)
            .map(|(_, position)| position.clone())
            .collect())
    }

    async fn get_account(&self, user: &UserId) -> Result<Option<Account>> {
        let inner = self.inner.lock().await;
        Ok(inner.accounts.get(user).cloned())
    }

    async fn put_account(&self, account: &Account) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.accounts.insert(account.user.clone(), account.clone());
        Ok(())
    }

    async fn get_watchlist(&self, user: &UserId) -> Result<Vec<String>> {
        let inner = self.inner.lock().await;
        Ok(inner.watchlists.get(user).cloned().unwrap_or_default())
    }

    async fn put_watchlist(&self, user: &UserId, tickers: &[String]) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.watchlists.insert(user.clone(), tickers.to_vec());
        Ok(())
    }
}
