use crate::core::position::{Account, Position, UserId};
use anyhow::Result;
use async_trait::async_trait;

/// Durable storage for per-user entities. Every write is atomic for the
/// single record it touches.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn get_position(&self, user: &UserId, ticker: &str) -> Result<Option<Position>>;
    async fn put_position(&self, position: &Position) -> Result<()>;
    /// Positions of `user`, ordered by ticker.
    async fn list_positions(&self, user: &UserId) -> Result<Vec<Position>>;

    async fn get_account(&self, user: &UserId) -> Result<Option<Account>>;
    async fn put_account(&self, account: &Account) -> Result<()>;

    async fn get_watchlist(&self, user: &UserId) -> Result<Vec<String>>;
    async fn put_watchlist(&self, user: &UserId, tickers: &[String]) -> Result<()>;
}
