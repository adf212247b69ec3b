use super::throttle::Throttle;
use crate::core::config::AlphaVantageConfig;
use crate::core::price::{FetchOutcome, PriceProvider, Quote};
use crate::core::profile::CompanyProfile;
use anyhow::{Context, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::str::FromStr;
use tracing::{debug, instrument};

pub const GLOBAL_QUOTE: &str = "GLOBAL_QUOTE";
pub const OVERVIEW: &str = "OVERVIEW";

/// Fields Alpha Vantage may send instead of data.
#[derive(Deserialize, Debug)]
struct Envelope<T> {
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(flatten)]
    data: T,
}

impl<T> Envelope<T> {
    fn into_data(self) -> Result<T, Failure> {
        if let Some(notice) = self.note.or(self.information) {
            debug!(%notice, "Upstream returned a quota notice");
            return Err(Failure::RateLimited);
        }
        if let Some(message) = self.error_message {
            return Err(Failure::Error(message));
        }
        Ok(self.data)
    }
}

/// Why a call produced no data.
#[derive(Debug)]
enum Failure {
    RateLimited,
    Error(String),
}

impl<T> From<Failure> for FetchOutcome<T> {
    fn from(failure: Failure) -> Self {
        match failure {
            Failure::RateLimited => FetchOutcome::RateLimited,
            Failure::Error(message) => FetchOutcome::Error(message),
        }
    }
}

#[derive(Deserialize, Debug)]
struct QuoteBody {
    #[serde(rename = "Global Quote")]
    global_quote: Option<GlobalQuote>,
}

#[derive(Deserialize, Debug)]
struct GlobalQuote {
    #[serde(rename = "05. price")]
    price: Option<String>,
    #[serde(rename = "08. previous close")]
    previous_close: Option<String>,
}

#[derive(Deserialize, Debug)]
struct OverviewBody {
    #[serde(rename = "Symbol")]
    symbol: Option<String>,
    #[serde(rename = "Name")]
    name: Option<String>,
    #[serde(rename = "Description")]
    description: Option<String>,
    #[serde(rename = "MarketCapitalization")]
    market_cap: Option<String>,
    #[serde(rename = "Sector")]
    sector: Option<String>,
    #[serde(rename = "Industry")]
    industry: Option<String>,
    #[serde(rename = "OfficialSite")]
    official_site: Option<String>,
}

/// Alpha Vantage marks absent values with placeholders rather than omitting them.
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != "None" && v != "-")
}

fn parse_decimal(value: Option<String>) -> Option<Decimal> {
    present(value).and_then(|v| Decimal::from_str(&v).ok())
}

pub struct AlphaVantageProvider {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
    throttle: Throttle,
}

impl AlphaVantageProvider {
    pub fn new(config: &AlphaVantageConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("stockfolio/0.1")
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(AlphaVantageProvider {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.resolved_api_key(),
            client,
            throttle: Throttle::new(config.min_interval()),
        })
    }

    async fn query<T: DeserializeOwned>(&self, function: &str, ticker: &str) -> Result<T, Failure> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(Failure::Error("No API key configured".to_string()));
        };
        let url = reqwest::Url::parse_with_params(
            &format!("{}/query", self.base_url),
            &[("function", function), ("symbol", ticker), ("apikey", api_key)],
        )
        .map_err(|e| Failure::Error(format!("Invalid provider URL: {e}")))?;

        self.throttle.wait().await;
        debug!("Requesting {} for {}", function, ticker);

        let response = self.client.get(url).send().await.map_err(|e| {
            Failure::Error(format!("Request error: {e} for symbol: {ticker}"))
        })?;

        if !response.status().is_success() {
            return Err(Failure::Error(format!(
                "HTTP error: {} for symbol: {}",
                response.status(),
                ticker
            )));
        }

        let text = response.text().await.map_err(|e| {
            Failure::Error(format!("Failed to read response for {ticker}: {e}"))
        })?;

        let envelope: Envelope<T> = serde_json::from_str(&text).map_err(|e| {
            Failure::Error(format!("Failed to parse JSON response for {ticker}: {e}"))
        })?;
        envelope.into_data()
    }

    async fn try_fetch_quote(&self, ticker: &str) -> Result<Quote, Failure> {
        let body: QuoteBody = self.query(GLOBAL_QUOTE, ticker).await?;
        let quote = body
            .global_quote
            .ok_or_else(|| Failure::Error(format!("No quote data found for symbol: {ticker}")))?;
        let price = parse_decimal(quote.price)
            .filter(|p| p.is_sign_positive() && !p.is_zero())
            .ok_or_else(|| Failure::Error(format!("No price found for symbol: {ticker}")))?;

        Ok(Quote {
            price,
            previous_close: parse_decimal(quote.previous_close),
        })
    }

    async fn try_fetch_profile(&self, ticker: &str) -> Result<CompanyProfile, Failure> {
        let body: OverviewBody = self.query(OVERVIEW, ticker).await?;
        if present(body.symbol).is_none() {
            return Err(Failure::Error(format!(
                "No company overview found for symbol: {ticker}"
            )));
        }

        Ok(CompanyProfile {
            name: present(body.name),
            description: present(body.description),
            market_cap: present(body.market_cap).and_then(|v| v.parse().ok()),
            sector: present(body.sector),
            industry: present(body.industry),
            homepage_url: present(body.official_site),
            logo_url: None,
        })
    }
}

#[async_trait]
impl PriceProvider for AlphaVantageProvider {
    #[instrument(name = "AlphaVantageQuote", skip(self), fields(ticker = %ticker))]
    async fn fetch_quote(&self, ticker: &str) -> FetchOutcome<Quote> {
        match self.try_fetch_quote(ticker).await {
            Ok(quote) => FetchOutcome::Ok(quote),
            Err(failure) => failure.into(),
        }
    }

    #[instrument(name = "AlphaVantageOverview", skip(self), fields(ticker = %ticker))]
    async fn fetch_profile(&self, ticker: &str) -> FetchOutcome<CompanyProfile> {
        match self.try_fetch_profile(ticker).await {
            Ok(profile) => FetchOutcome::Ok(profile),
            Err(failure) => failure.into(),
        }
    }
}
