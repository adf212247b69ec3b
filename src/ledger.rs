//! Per-user share positions and their running cost basis.

use crate::core::entity::EntityStore;
use crate::core::position::{
    Position, TradeDirection, TradeError, UserId, normalize_ticker, validate_unit_price,
};
use crate::resolver::PriceResolver;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub struct PositionLedger {
    store: Arc<dyn EntityStore>,
    resolver: Arc<PriceResolver>,
    // Serializes read-modify-write cycles so concurrent trades cannot lose
    // an update to the running average.
    write_lock: Mutex<()>,
}

impl PositionLedger {
    pub fn new(store: Arc<dyn EntityStore>, resolver: Arc<PriceResolver>) -> Self {
        Self {
            store,
            resolver,
            write_lock: Mutex::new(()),
        }
    }

    /// Buys or sells a single share. The new position is persisted before it
    /// is returned. Without an explicit price, buys use the resolved price.
    pub async fn apply_trade(
        &self,
        user: &UserId,
        ticker: &str,
        direction: TradeDirection,
        explicit_price: Option<Decimal>,
    ) -> Result<Position, TradeError> {
        let ticker = normalize_ticker(ticker);
        if let Some(price) = explicit_price {
            validate_unit_price(price)?;
        }

        // Resolved outside the lock; it may wait on the upstream throttle.
        let unit_price = match (direction, explicit_price) {
            (TradeDirection::Increase, Some(price)) => Some(price),
            (TradeDirection::Increase, None) => {
                let resolved = self.resolver.resolve_price(&ticker).await;
                debug!(%ticker, price = %resolved.price, source = %resolved.source, "Resolved trade price");
                Some(validate_unit_price(resolved.price)?)
            }
            (TradeDirection::Decrease, _) => None,
        };

        let _guard = self.write_lock.lock().await;
        let existing = self.store.get_position(user, &ticker).await?;

        let position = match (existing, unit_price) {
            (None, None) => {
                return Err(TradeError::NoPosition { ticker });
            }
            (Some(mut position), None) => {
                position.remove_share()?;
                position
            }
            (Some(mut position), Some(unit_price)) => {
                position.add_share(unit_price)?;
                position
            }
            (None, Some(unit_price)) => Position::opened(user.clone(), &ticker, unit_price),
        };

        self.store.put_position(&position).await?;
        info!(
            %user,
            %ticker,
            %direction,
            shares = position.shares,
            basis = %position.basis,
            "Trade applied"
        );
        Ok(position)
    }

    pub async fn positions(&self, user: &UserId) -> Result<Vec<Position>, TradeError> {
        Ok(self.store.list_positions(user).await?)
    }

    pub async fn position(&self, user: &UserId, ticker: &str) -> Result<Option<Position>, TradeError> {
        Ok(self
            .store
            .get_position(user, &normalize_ticker(ticker))
            .await?)
    }
}
