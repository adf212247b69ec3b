//! Position, account and trade types shared by the ledger and the stores

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// Opaque identity of an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        UserId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalizes a ticker symbol for storage and lookups.
pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

/// Rounds to cents, halves away from zero.
pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// One holding of a ticker by a user. A fully sold position stays behind with
/// zero shares and its last basis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub user: UserId,
    pub ticker: String,
    pub shares: u64,
    pub basis: Decimal,
}

impl Position {
    pub fn opened(user: UserId, ticker: &str, unit_price: Decimal) -> Self {
        Position {
            user,
            ticker: normalize_ticker(ticker),
            shares: 1,
            basis: round_cents(unit_price),
        }
    }

    /// Adds one share at `unit_price`, re-averaging the basis over the new
    /// share count from the expanded total cost. Leaves the position untouched
    /// when the total cost does not fit in a `Decimal`.
    pub fn add_share(&mut self, unit_price: Decimal) -> Result<(), TradeError> {
        let shares = self.shares + 1;
        let basis = Decimal::from(self.shares)
            .checked_mul(self.basis)
            .map(round_cents)
            .and_then(|expanded| expanded.checked_add(unit_price))
            .and_then(|total| total.checked_div(Decimal::from(shares)))
            .map(round_cents)
            .ok_or_else(|| TradeError::InvalidAmount(unit_price.to_string()))?;
        self.shares = shares;
        self.basis = basis;
        Ok(())
    }

    /// Removes one share. The basis of the remaining shares is unchanged.
    pub fn remove_share(&mut self) -> Result<(), TradeError> {
        if self.shares == 0 {
            return Err(TradeError::NoSharesToSell {
                ticker: self.ticker.clone(),
            });
        }
        self.shares -= 1;
        Ok(())
    }

    pub fn market_value(&self, price: Decimal) -> Decimal {
        round_cents(Decimal::from(self.shares).saturating_mul(price))
    }

    pub fn unrealized_gain(&self, price: Decimal) -> Decimal {
        round_cents(
            price
                .saturating_sub(self.basis)
                .saturating_mul(Decimal::from(self.shares)),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub user: UserId,
    pub cash_balance: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeDirection {
    Increase,
    Decrease,
}

impl Display for TradeDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                TradeDirection::Increase => "increase",
                TradeDirection::Decrease => "decrease",
            }
        )
    }
}

impl FromStr for TradeDirection {
    type Err = TradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "increase" | "add" | "buy" => Ok(TradeDirection::Increase),
            "decrease" | "subtract" | "sell" => Ok(TradeDirection::Decrease),
            _ => Err(TradeError::InvalidOperator(s.to_string())),
        }
    }
}

/// Direction of a cash balance adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceOperator {
    Add,
    Subtract,
}

impl FromStr for BalanceOperator {
    type Err = TradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "add" => Ok(BalanceOperator::Add),
            "subtract" => Ok(BalanceOperator::Subtract),
            _ => Err(TradeError::InvalidOperator(s.to_string())),
        }
    }
}

/// Accepts a unit price only if it is still positive once rounded to cents.
pub fn validate_unit_price(price: Decimal) -> Result<Decimal, TradeError> {
    if round_cents(price) <= Decimal::ZERO {
        return Err(TradeError::InvalidAmount(price.to_string()));
    }
    Ok(price)
}

/// Parses a user-supplied money amount.
pub fn parse_amount(raw: &str) -> Result<Decimal, TradeError> {
    Decimal::from_str(raw.trim()).map_err(|_| TradeError::InvalidAmount(raw.to_string()))
}

/// Rejected ledger or account operations.
#[derive(Debug, Error)]
pub enum TradeError {
    #[error("Invalid operator: {0}")]
    InvalidOperator(String),
    #[error("Cannot sell {ticker}: not in portfolio")]
    NoPosition { ticker: String },
    #[error("Cannot sell {ticker}: no shares to sell")]
    NoSharesToSell { ticker: String },
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
