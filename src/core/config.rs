use crate::core::position::round_cents;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fmt, fs, path::PathBuf, time::Duration};
use tracing::debug;

pub const API_KEY_ENV: &str = "ALPHA_VANTAGE_API_KEY";

#[derive(Deserialize, Serialize, Clone)]
pub struct AlphaVantageConfig {
    #[serde(default = "AlphaVantageConfig::default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Minimum spacing between upstream calls. The free tier allows five
    /// calls a minute.
    #[serde(default = "AlphaVantageConfig::default_min_interval_ms")]
    pub min_interval_ms: u64,
    #[serde(default = "AlphaVantageConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl AlphaVantageConfig {
    fn default_base_url() -> String {
        "https://www.alphavantage.co".to_string()
    }

    fn default_min_interval_ms() -> u64 {
        12_000
    }

    fn default_timeout_secs() -> u64 {
        10
    }

    /// Configured key, or the one from the environment.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl fmt::Debug for AlphaVantageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlphaVantageConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("min_interval_ms", &self.min_interval_ms)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for AlphaVantageConfig {
    fn default() -> Self {
        AlphaVantageConfig {
            base_url: Self::default_base_url(),
            api_key: None,
            min_interval_ms: Self::default_min_interval_ms(),
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub alpha_vantage: AlphaVantageConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "CacheConfig::default_freshness_secs")]
    pub freshness_secs: u64,
    /// Keep cached responses on disk between runs.
    #[serde(default = "CacheConfig::default_persist")]
    pub persist: bool,
}

impl CacheConfig {
    fn default_freshness_secs() -> u64 {
        300
    }

    fn default_persist() -> bool {
        true
    }

    pub fn freshness(&self) -> Duration {
        Duration::from_secs(self.freshness_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            freshness_secs: Self::default_freshness_secs(),
            persist: Self::default_persist(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Identity used when none is given on the command line.
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    /// Replaces the built-in fallback catalog.
    #[serde(default)]
    pub fallback_path: Option<String>,
    /// Price used when no other source knows the ticker.
    #[serde(default = "AppConfig::default_price")]
    pub default_price: Decimal,
    #[serde(default)]
    pub data_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            user: None,
            providers: ProvidersConfig::default(),
            cache: CacheConfig::default(),
            fallback_path: None,
            default_price: Self::default_price(),
            data_path: None,
        }
    }
}

impl AppConfig {
    fn default_price() -> Decimal {
        Decimal::ONE_HUNDRED
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "stockfolio", "stockfolio")
            .context("Could not determine project directories")
    }

    /// Rejects settings the resolver cannot work with.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            round_cents(self.default_price) > Decimal::ZERO,
            "default_price must be positive, got {}",
            self.default_price
        );
        Ok(())
    }

    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.yaml"))
    }

    pub fn data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        Ok(Self::project_dirs()?.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
