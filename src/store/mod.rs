pub mod disk;
pub mod memory;

use anyhow::{Context, Result};
use disk::{DiskCache, DiskEntityStore};
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle};
use serde::{Serialize, de::DeserializeOwned};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// A fjall keyspace holding the persisted caches and entity partitions.
pub struct KeyValueStore {
    keyspace: Keyspace,
}

impl KeyValueStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create data directory: {}", path.display()))?;
        let keyspace = fjall::Config::new(path)
            .open()
            .with_context(|| format!("Failed to open data store at {}", path.display()))?;
        debug!("Opened data store at {}", path.display());
        Ok(Self { keyspace })
    }

    fn partition(&self, name: &str) -> Result<PartitionHandle> {
        self.keyspace
            .open_partition(name, PartitionCreateOptions::default())
            .with_context(|| format!("Failed to open partition: {name}"))
    }

    /// Opens a persistent cache collection.
    pub fn cache<V>(&self, name: &str, freshness: Duration) -> Result<DiskCache<V>>
    where
        V: Serialize + DeserializeOwned,
    {
        Ok(DiskCache::new(self.partition(name)?, freshness))
    }

    pub fn entities(&self) -> Result<DiskEntityStore> {
        Ok(DiskEntityStore::new(
            self.keyspace.clone(),
            self.partition("positions")?,
            self.partition("accounts")?,
            self.partition("watchlists")?,
        ))
    }
}
