//! Pricing abstractions and core types

use crate::core::profile::CompanyProfile;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Outcome of a single upstream call. Expected failures are values, not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Ok(T),
    /// The upstream answered with a quota or informational notice instead of data.
    RateLimited,
    /// Network failure, non-success status or a payload without usable data.
    Error(String),
}

impl<T> FetchOutcome<T> {
    pub fn ok(self) -> Option<T> {
        match self {
            FetchOutcome::Ok(value) => Some(value),
            FetchOutcome::RateLimited | FetchOutcome::Error(_) => None,
        }
    }
}

/// Latest quote for a ticker as reported upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub price: Decimal,
    pub previous_close: Option<Decimal>,
}

impl Quote {
    /// Percent change against the previous close. `None` when there is no
    /// usable previous close or the ratio does not fit in a `Decimal`.
    pub fn percent_change(&self) -> Option<Decimal> {
        let previous_close = self.previous_close?;
        self.price
            .checked_sub(previous_close)?
            .checked_div(previous_close)?
            .checked_mul(Decimal::ONE_HUNDRED)
    }
}

/// Price data as kept in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub price: Decimal,
    pub percent_change: Option<Decimal>,
}

impl From<&Quote> for PriceSnapshot {
    fn from(quote: &Quote) -> Self {
        PriceSnapshot {
            price: quote.price,
            percent_change: quote.percent_change(),
        }
    }
}

/// Which rung of the resolution ladder produced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PriceSource {
    Cache,
    Live,
    Fallback,
    SyntheticDefault,
}

impl Display for PriceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                PriceSource::Cache => "cache",
                PriceSource::Live => "live",
                PriceSource::Fallback => "fallback",
                PriceSource::SyntheticDefault => "synthetic-default",
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPrice {
    pub price: Decimal,
    pub percent_change: Option<Decimal>,
    pub source: PriceSource,
}

#[async_trait]
pub trait PriceProvider: Send + Sync {
    async fn fetch_quote(&self, ticker: &str) -> FetchOutcome<Quote>;
    async fn fetch_profile(&self, ticker: &str) -> FetchOutcome<CompanyProfile>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_percent_change() {
        let quote = Quote {
            price: d("110"),
            previous_close: Some(d("100")),
        };
        assert_eq!(quote.percent_change(), Some(d("10")));
    }

    #[test]
    fn test_percent_change_skipped_without_previous_close() {
        let zero_close = Quote {
            price: d("110"),
            previous_close: Some(Decimal::ZERO),
        };
        assert_eq!(zero_close.percent_change(), None);

        let no_close = Quote {
            price: d("110"),
            previous_close: None,
        };
        assert_eq!(no_close.percent_change(), None);
    }

    #[test]
    fn test_percent_change_overflow_is_skipped() {
        let tiny_close = Quote {
            price: Decimal::MAX,
            previous_close: Some(d("0.0000000001")),
        };
        assert_eq!(tiny_close.percent_change(), None);
        assert_eq!(PriceSnapshot::from(&tiny_close).percent_change, None);

        let huge_gap = Quote {
            price: Decimal::MAX,
            previous_close: Some(Decimal::MIN),
        };
        assert_eq!(huge_gap.percent_change(), None);
    }
}
