//! Cash balance and watchlist bookkeeping for a user.

use crate::core::entity::EntityStore;
use crate::core::position::{
    Account, BalanceOperator, TradeError, UserId, normalize_ticker, parse_amount,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

pub struct AccountBook {
    store: Arc<dyn EntityStore>,
    write_lock: Mutex<()>,
}

impl AccountBook {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn account(&self, user: &UserId) -> Result<Account, TradeError> {
        Ok(self
            .store
            .get_account(user)
            .await?
            .unwrap_or_else(|| Account {
                user: user.clone(),
                cash_balance: Decimal::ZERO,
            }))
    }

    /// Adds to or subtracts from the cash balance. Inputs arrive as raw text,
    /// as typed by the user.
    pub async fn adjust_balance(
        &self,
        user: &UserId,
        amount: &str,
        operator: &str,
    ) -> Result<Account, TradeError> {
        let amount = parse_amount(amount)?;
        let operator: BalanceOperator = operator.parse()?;

        let _guard = self.write_lock.lock().await;
        let mut account = self.account(user).await?;
        match operator {
            BalanceOperator::Add => account.cash_balance += amount,
            BalanceOperator::Subtract => account.cash_balance -= amount,
        }
        self.store.put_account(&account).await?;
        info!(%user, balance = %account.cash_balance, "Balance updated");
        Ok(account)
    }

    pub async fn watchlist(&self, user: &UserId) -> Result<Vec<String>, TradeError> {
        Ok(self.store.get_watchlist(user).await?)
    }

    /// Adds a ticker to the end of the watchlist unless it is already there.
    pub async fn watch(&self, user: &UserId, ticker: &str) -> Result<Vec<String>, TradeError> {
        let ticker = normalize_ticker(ticker);
        let _guard = self.write_lock.lock().await;
        let mut tickers = self.store.get_watchlist(user).await?;
        if !tickers.contains(&ticker) {
            tickers.push(ticker);
            self.store.put_watchlist(user, &tickers).await?;
        }
        Ok(tickers)
    }

    pub async fn unwatch(&self, user: &UserId, ticker: &str) -> Result<Vec<String>, TradeError> {
        let ticker = normalize_ticker(ticker);
        let _guard = self.write_lock.lock().await;
        let mut tickers = self.store.get_watchlist(user).await?;
        let before = tickers.len();
        tickers.retain(|t| *t != ticker);
        if tickers.len() != before {
            self.store.put_watchlist(user, &tickers).await?;
        }
        Ok(tickers)
    }
}
