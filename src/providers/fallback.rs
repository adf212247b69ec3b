use crate::core::position::{normalize_ticker, round_cents};
use crate::core::profile::CompanyProfile;
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

const BUILTIN_CATALOG: &str = include_str!("../../assets/fallback_catalog.yaml");

#[derive(Debug, Clone, Deserialize)]
pub struct FallbackEntry {
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub profile: Option<CompanyProfile>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    tickers: HashMap<String, FallbackEntry>,
}

/// Static last-known-good prices and profiles for a curated set of tickers.
#[derive(Debug, Clone, Default)]
pub struct FallbackCatalog {
    entries: HashMap<String, FallbackEntry>,
}

impl FallbackCatalog {
    pub fn builtin() -> Result<Self> {
        Self::from_yaml_str(BUILTIN_CATALOG).context("Built-in fallback catalog is invalid")
    }

    /// Parses a catalog. Prices that are not positive at cent precision are
    /// dropped; the entry's profile is kept.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: CatalogFile = serde_yaml::from_str(yaml)?;
        let entries = file
            .tickers
            .into_iter()
            .map(|(ticker, mut entry)| {
                let ticker = normalize_ticker(&ticker);
                if let Some(price) = entry.price.filter(|p| round_cents(*p) <= Decimal::ZERO) {
                    warn!(%ticker, %price, "Ignoring non-positive fallback price");
                    entry.price = None;
                }
                (ticker, entry)
            })
            .collect();
        Ok(Self { entries })
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fallback catalog: {}", path.display()))?;
        let catalog = Self::from_yaml_str(&yaml)
            .with_context(|| format!("Failed to parse fallback catalog: {}", path.display()))?;
        debug!(
            "Loaded {} fallback entries from {}",
            catalog.entries.len(),
            path.display()
        );
        Ok(catalog)
    }

    pub fn lookup_price(&self, ticker: &str) -> Option<Decimal> {
        self.entries
            .get(&normalize_ticker(ticker))
            .and_then(|entry| entry.price)
    }

    pub fn lookup_profile(&self, ticker: &str) -> Option<CompanyProfile> {
        self.entries
            .get(&normalize_ticker(ticker))
            .and_then(|entry| entry.profile.clone())
    }
}
