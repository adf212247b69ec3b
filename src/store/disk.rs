use crate::core::cache::Cache;
use crate::core::entity::EntityStore;
use crate::core::position::{Account, Position, UserId};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use fjall::{Keyspace, PartitionHandle, PersistMode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::marker::PhantomData;
use std::time::Duration;
use tracing::debug;

#[derive(Serialize, Deserialize)]
struct CacheEntry<V> {
    value: V,
    fetched_at: DateTime<Utc>,
}

/// Cache persisted in a fjall partition, so fresh responses survive restarts.
pub struct DiskCache<V> {
    partition: PartitionHandle,
    freshness: TimeDelta,
    _marker: PhantomData<V>,
}

impl<V> DiskCache<V> {
    pub fn new(partition: PartitionHandle, freshness: Duration) -> Self {
        Self {
            partition,
            freshness: TimeDelta::from_std(freshness).unwrap_or(TimeDelta::MAX),
            _marker: PhantomData,
        }
    }
}

impl<V> DiskCache<V>
where
    V: Serialize + DeserializeOwned,
{
    fn read(&self, key: &str) -> Result<Option<V>> {
        let Some(raw) = self.partition.get(key)? else {
            debug!("Cache MISS for key: {:?}", key);
            return Ok(None);
        };
        let entry: CacheEntry<V> = serde_json::from_slice(&raw)?;
        if Utc::now() - entry.fetched_at >= self.freshness {
            debug!("Cache entry expired for key: {:?}", key);
            return Ok(None);
        }
        debug!("Cache HIT for key: {:?}", key);
        Ok(Some(entry.value))
    }

    fn write(&self, key: &str, value: V) -> Result<()> {
        let entry = CacheEntry {
            value,
            fetched_at: Utc::now(),
        };
        self.partition.insert(key, serde_json::to_vec(&entry)?)?;
        debug!("Cache PUT for key: {:?}", key);
        Ok(())
    }
}

#[async_trait]
impl<V> Cache<String, V> for DiskCache<V>
where
    V: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    async fn get(&self, key: &String) -> Option<V> {
        match self.read(key) {
            Ok(value) => value,
            Err(e) => {
                debug!("DiskCache get error: {}", e);
                None
            }
        }
    }

    async fn put(&self, key: String, value: V) {
        if let Err(e) = self.write(&key, value) {
            debug!("DiskCache put error: {}", e);
        }
    }
}

fn user_prefix(user: &UserId) -> String {
    format!("{}\0", user.as_str())
}

fn position_key(user: &UserId, ticker: &str) -> String {
    format!("{}{}", user_prefix(user), ticker)
}

/// Entity store backed by fjall partitions. Each write is flushed to disk
/// before returning.
pub struct DiskEntityStore {
    keyspace: Keyspace,
    positions: PartitionHandle,
    accounts: PartitionHandle,
    watchlists: PartitionHandle,
}

impl DiskEntityStore {
    pub fn new(
        keyspace: Keyspace,
        positions: PartitionHandle,
        accounts: PartitionHandle,
        watchlists: PartitionHandle,
    ) -> Self {
        Self {
            keyspace,
            positions,
            accounts,
            watchlists,
        }
    }

    fn get_json<T: DeserializeOwned>(partition: &PartitionHandle, key: &str) -> Result<Option<T>> {
        partition
            .get(key)?
            .map(|raw| serde_json::from_slice(&raw))
            .transpose()
            .with_context(|| format!("Corrupt record for key {key:?}"))
    }

    fn put_json<T: Serialize>(&self, partition: &PartitionHandle, key: &str, value: &T) -> Result<()> {
        partition.insert(key, serde_json::to_vec(value)?)?;
        self.keyspace
            .persist(PersistMode::SyncAll)
            .context("Failed to persist entity store")?;
        Ok(())
    }
}

#[async_trait]
impl EntityStore for DiskEntityStore {
    async fn get_position(&self, user: &UserId, ticker: &str) -> Result<Option<Position>> {
        Self::get_json(&self.positions, &position_key(user, ticker))
    }

    async fn put_position(&self, position: &Position) -> Result<()> {
        debug!(user = %position.user, ticker = %position.ticker, "Persisting position");
        self.put_json(
            &self.positions,
            &position_key(&position.user, &position.ticker),
            position,
        )
    }

    async fn list_positions(&self, user: &UserId) -> Result<Vec<Position>> {
        self.positions
            .prefix(user_prefix(user))
            .map(|item| -> Result<Position> {
                let (_, raw) = item?;
                Ok(serde_json::from_slice(&raw)?)
            })
            .collect()
    }

    async fn get_account(&self, user: &UserId) -> Result<Option<Account>> {
        Self::get_json(&self.accounts, user.as_str())
    }

    async fn put_account(&self, account: &Account) -> Result<()> {
        self.put_json(&self.accounts, account.user.as_str(), account)
    }

    async fn get_watchlist(&self, user: &UserId) -> Result<Vec<String>> {
        Ok(Self::get_json(&self.watchlists, user.as_str())?.unwrap_or_default())
    }

    async fn put_watchlist(&self, user: &UserId, tickers: &[String]) -> Result<()> {
        self.put_json(&self.watchlists, user.as_str(), &tickers)
    }
}
