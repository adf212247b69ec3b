//! The user-facing stock record: quote, company profile and holding merged
//! into one always-populated shape.

use crate::core::position::{UserId, normalize_ticker, round_cents};
use crate::core::price::PriceSource;
use crate::ledger::PositionLedger;
use crate::resolver::PriceResolver;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

/// Price series for charting. Empty unless a series source is wired in.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub daily_prices: Vec<f64>,
    pub daily_prices_labels: Vec<String>,
    pub weekly_prices: Vec<f64>,
    pub weekly_prices_labels: Vec<String>,
    pub one_month_prices: Vec<f64>,
    pub one_month_prices_labels: Vec<String>,
    pub yearly_prices: Vec<f64>,
    pub yearly_prices_labels: Vec<String>,
    pub all_time_prices: Vec<f64>,
    pub all_time_prices_labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockView {
    pub ticker: String,
    pub short_name: String,
    pub company_name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub current_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub percent_change: Decimal,
    pub percent_text: String,
    pub market_cap: u64,
    pub sector: String,
    pub industry: String,
    #[serde(rename = "homepage_url")]
    pub homepage_url: String,
    pub logo_url: String,
    pub price_source: PriceSource,
    pub in_portfolio: bool,
    pub shares: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub basis: Decimal,
    #[serde(flatten)]
    pub chart: ChartSeries,
}

pub fn percent_text(percent: Decimal) -> String {
    if percent.is_sign_negative() && !percent.is_zero() {
        format!("{percent:.2}%")
    } else {
        format!("+{percent:.2}%")
    }
}

/// Builds the stock record for `user`. Price and profile are resolved
/// independently, so a failure in one never blocks the other.
pub async fn resolve_stock_view(
    resolver: &PriceResolver,
    ledger: &PositionLedger,
    user: &UserId,
    ticker: &str,
) -> StockView {
    let ticker = normalize_ticker(ticker);
    let (price, profile, position) = tokio::join!(
        resolver.resolve_price(&ticker),
        resolver.resolve_profile(&ticker),
        ledger.position(user, &ticker),
    );

    let position = position.unwrap_or_else(|e| {
        warn!(%user, %ticker, error = %e, "Could not read position");
        None
    });
    let percent_change = round_cents(price.percent_change.unwrap_or_default());
    let profile = profile.profile;
    let company_name = profile.name.unwrap_or_else(|| ticker.clone());

    StockView {
        short_name: company_name.clone(),
        company_name,
        description: profile.description.unwrap_or_default(),
        current_price: round_cents(price.price),
        percent_change,
        percent_text: percent_text(percent_change),
        market_cap: profile.market_cap.unwrap_or_default(),
        sector: profile.sector.unwrap_or_default(),
        industry: profile.industry.unwrap_or_default(),
        homepage_url: profile.homepage_url.unwrap_or_default(),
        logo_url: profile.logo_url.unwrap_or_default(),
        price_source: price.source,
        in_portfolio: position.as_ref().is_some_and(|p| p.shares > 0),
        shares: position.as_ref().map_or(0, |p| p.shares),
        basis: position.as_ref().map_or(Decimal::ZERO, |p| p.basis),
        chart: ChartSeries::default(),
        ticker,
    }
}
