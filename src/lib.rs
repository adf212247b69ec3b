pub mod account;
pub mod cli;
pub mod core;
pub mod ledger;
pub mod providers;
pub mod resolver;
pub mod store;
pub mod view;

use crate::account::AccountBook;
use crate::core::cache::SharedCache;
use crate::core::config::AppConfig;
use crate::core::entity::EntityStore;
use crate::core::position::UserId;
use crate::core::price::PriceSnapshot;
use crate::core::profile::CompanyProfile;
use crate::ledger::PositionLedger;
use crate::providers::alpha_vantage::AlphaVantageProvider;
use crate::providers::fallback::FallbackCatalog;
use crate::resolver::PriceResolver;
use crate::store::KeyValueStore;
use crate::store::memory::MemoryCache;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

/// User used when neither the command line nor the config names one.
pub const DEFAULT_USER: &str = "demo";

pub enum AppCommand {
    Trade {
        ticker: String,
        operator: String,
        price: Option<String>,
    },
    Quote {
        ticker: String,
    },
    Portfolio,
    Balance {
        amount: String,
        operator: String,
    },
    Watch {
        ticker: String,
    },
    Unwatch {
        ticker: String,
    },
    Watchlist,
}

/// Services wired from configuration, shared by every command.
pub struct App {
    pub user: UserId,
    pub resolver: Arc<PriceResolver>,
    pub ledger: PositionLedger,
    pub accounts: AccountBook,
}

impl App {
    pub fn from_config(config: &AppConfig, user: Option<&str>) -> Result<Self> {
        config.validate()?;
        let store = KeyValueStore::open(&config.data_path()?)?;
        let freshness = config.cache.freshness();

        let (quotes, profiles): (SharedCache<PriceSnapshot>, SharedCache<CompanyProfile>) =
            if config.cache.persist {
                (
                    Arc::new(store.cache::<PriceSnapshot>("quote_cache", freshness)?),
                    Arc::new(store.cache::<CompanyProfile>("profile_cache", freshness)?),
                )
            } else {
                (
                    Arc::new(MemoryCache::<String, PriceSnapshot>::new(freshness)),
                    Arc::new(MemoryCache::<String, CompanyProfile>::new(freshness)),
                )
            };

        let provider = Arc::new(AlphaVantageProvider::new(&config.providers.alpha_vantage)?);
        let fallback = match &config.fallback_path {
            Some(path) => FallbackCatalog::load_from_path(path)?,
            None => FallbackCatalog::builtin()?,
        };
        let resolver = Arc::new(PriceResolver::new(
            quotes,
            profiles,
            provider,
            fallback,
            config.default_price,
        ));

        let entities: Arc<dyn EntityStore> = Arc::new(store.entities()?);
        let user = user
            .map(str::to_string)
            .or_else(|| config.user.clone())
            .unwrap_or_else(|| DEFAULT_USER.to_string());

        Ok(App {
            user: UserId::new(user),
            ledger: PositionLedger::new(Arc::clone(&entities), Arc::clone(&resolver)),
            accounts: AccountBook::new(entities),
            resolver,
        })
    }
}

pub async fn run_command(
    command: AppCommand,
    user: Option<&str>,
    config_path: Option<&str>,
) -> Result<()> {
    info!("Stockfolio starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let app = App::from_config(&config, user)?;

    match command {
        AppCommand::Trade {
            ticker,
            operator,
            price,
        } => cli::trade::run(&app, &ticker, &operator, price.as_deref()).await,
        AppCommand::Quote { ticker } => cli::quote::run(&app, &ticker).await,
        AppCommand::Portfolio => cli::portfolio::run(&app).await,
        AppCommand::Balance { amount, operator } => {
            cli::account::balance(&app, &amount, &operator).await
        }
        AppCommand::Watch { ticker } => cli::account::watch(&app, &ticker).await,
        AppCommand::Unwatch { ticker } => cli::account::unwatch(&app, &ticker).await,
        AppCommand::Watchlist => cli::account::watchlist(&app).await,
    }
}
