//! Price and profile resolution ladders: cache, live provider, fallback
//! catalog, then a synthetic default. Each ladder always produces a value.

use crate::core::cache::{SharedCache, cache_key};
use crate::core::position::normalize_ticker;
use crate::core::price::{FetchOutcome, PriceProvider, PriceSnapshot, PriceSource, ResolvedPrice};
use crate::core::profile::CompanyProfile;
use crate::providers::alpha_vantage::{GLOBAL_QUOTE, OVERVIEW};
use crate::providers::fallback::FallbackCatalog;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedProfile {
    pub profile: CompanyProfile,
    pub source: PriceSource,
}

pub struct PriceResolver {
    quotes: SharedCache<PriceSnapshot>,
    profiles: SharedCache<CompanyProfile>,
    provider: Arc<dyn PriceProvider>,
    fallback: FallbackCatalog,
    default_price: Decimal,
}

impl PriceResolver {
    pub fn new(
        quotes: SharedCache<PriceSnapshot>,
        profiles: SharedCache<CompanyProfile>,
        provider: Arc<dyn PriceProvider>,
        fallback: FallbackCatalog,
        default_price: Decimal,
    ) -> Self {
        Self {
            quotes,
            profiles,
            provider,
            fallback,
            default_price,
        }
    }

    pub async fn resolve_price(&self, ticker: &str) -> ResolvedPrice {
        let ticker = normalize_ticker(ticker);
        let key = cache_key(GLOBAL_QUOTE, &ticker);

        if let Some(snapshot) = self.quotes.get(&key).await {
            debug!(%ticker, "Price served from cache");
            return ResolvedPrice {
                price: snapshot.price,
                percent_change: snapshot.percent_change,
                source: PriceSource::Cache,
            };
        }

        match self.provider.fetch_quote(&ticker).await {
            FetchOutcome::Ok(quote) => {
                let snapshot = PriceSnapshot::from(&quote);
                self.quotes.put(key, snapshot.clone()).await;
                debug!(%ticker, price = %snapshot.price, "Price fetched live");
                return ResolvedPrice {
                    price: snapshot.price,
                    percent_change: snapshot.percent_change,
                    source: PriceSource::Live,
                };
            }
            FetchOutcome::RateLimited => warn!(%ticker, "Quote request rate-limited"),
            FetchOutcome::Error(e) => warn!(%ticker, error = %e, "Quote request failed"),
        }

        if let Some(price) = self.fallback.lookup_price(&ticker) {
            debug!(%ticker, %price, "Price served from fallback catalog");
            return ResolvedPrice {
                price,
                percent_change: None,
                source: PriceSource::Fallback,
            };
        }

        debug!(%ticker, "Using synthetic default price");
        ResolvedPrice {
            price: self.default_price,
            percent_change: None,
            source: PriceSource::SyntheticDefault,
        }
    }

    /// Resolves a fully populated profile. Fields missing from the answering
    /// rung are filled from the fallback catalog, then from placeholders.
    pub async fn resolve_profile(&self, ticker: &str) -> ResolvedProfile {
        let ticker = normalize_ticker(ticker);
        let key = cache_key(OVERVIEW, &ticker);
        let fallback = self.fallback.lookup_profile(&ticker);

        let (partial, source) = if let Some(profile) = self.profiles.get(&key).await {
            debug!(%ticker, "Profile served from cache");
            (profile, PriceSource::Cache)
        } else {
            match self.provider.fetch_profile(&ticker).await {
                FetchOutcome::Ok(profile) => {
                    self.profiles.put(key, profile.clone()).await;
                    debug!(%ticker, "Profile fetched live");
                    (profile, PriceSource::Live)
                }
                FetchOutcome::RateLimited => {
                    warn!(%ticker, "Profile request rate-limited");
                    Self::profile_from_fallback(fallback.clone())
                }
                FetchOutcome::Error(e) => {
                    warn!(%ticker, error = %e, "Profile request failed");
                    Self::profile_from_fallback(fallback.clone())
                }
            }
        };

        let profile = partial
            .or(fallback.unwrap_or_default())
            .or(CompanyProfile::placeholder(&ticker));
        ResolvedProfile { profile, source }
    }

    fn profile_from_fallback(fallback: Option<CompanyProfile>) -> (CompanyProfile, PriceSource) {
        match fallback {
            Some(profile) => (profile, PriceSource::Fallback),
            None => (CompanyProfile::default(), PriceSource::SyntheticDefault),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::price::Quote;
    use crate::store::memory::MemoryCache;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Provider answering every call with fixed outcomes and counting calls.
    pub(crate) struct MockProvider {
        pub quote: FetchOutcome<Quote>,
        pub profile: FetchOutcome<CompanyProfile>,
        pub quote_calls: AtomicUsize,
        pub profile_calls: AtomicUsize,
        pub delay: Duration,
    }

    impl MockProvider {
        pub(crate) fn new(
            quote: FetchOutcome<Quote>,
            profile: FetchOutcome<CompanyProfile>,
        ) -> Self {
            Self {
                quote,
                profile,
                quote_calls: AtomicUsize::new(0),
                profile_calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
            }
        }

        /// Makes every quote call take `delay` before answering.
        pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub(crate) fn failing() -> Self {
            Self::new(
                FetchOutcome::Error("connection refused".to_string()),
                FetchOutcome::Error("connection refused".to_string()),
            )
        }
    }

    #[async_trait]
    impl PriceProvider for MockProvider {
        async fn fetch_quote(&self, _ticker: &str) -> FetchOutcome<Quote> {
            self.quote_calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.quote.clone()
        }

        async fn fetch_profile(&self, _ticker: &str) -> FetchOutcome<CompanyProfile> {
            self.profile_calls.fetch_add(1, Ordering::SeqCst);
            self.profile.clone()
        }
    }

    pub(crate) fn resolver_with(
        provider: Arc<MockProvider>,
        freshness: Duration,
    ) -> PriceResolver {
        PriceResolver::new(
            Arc::new(MemoryCache::<String, PriceSnapshot>::new(freshness)),
            Arc::new(MemoryCache::<String, CompanyProfile>::new(freshness)),
            provider,
            FallbackCatalog::builtin().unwrap(),
            Decimal::ONE_HUNDRED,
        )
    }

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn live_quote() -> FetchOutcome<Quote> {
        FetchOutcome::Ok(Quote {
            price: d("110"),
            previous_close: Some(d("100")),
        })
    }

    #[tokio::test]
    async fn test_live_price_is_cached_within_freshness_window() {
        let provider = Arc::new(MockProvider::new(live_quote(), FetchOutcome::RateLimited));
        let resolver = resolver_with(provider.clone(), Duration::from_secs(300));

        let first = resolver.resolve_price("AAPL").await;
        assert_eq!(first.source, PriceSource::Live);
        assert_eq!(first.price, d("110"));
        assert_eq!(first.percent_change, Some(d("10")));

        let second = resolver.resolve_price("aapl").await;
        assert_eq!(second.source, PriceSource::Cache);
        assert_eq!(second.price, d("110"));
        assert_eq!(second.percent_change, Some(d("10")));
        assert_eq!(provider.quote_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stale_cache_triggers_refetch() {
        let provider = Arc::new(MockProvider::new(live_quote(), FetchOutcome::RateLimited));
        let resolver = resolver_with(provider.clone(), Duration::from_millis(10));

        resolver.resolve_price("AAPL").await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        let again = resolver.resolve_price("AAPL").await;

        assert_eq!(again.source, PriceSource::Live);
        assert_eq!(provider.quote_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rate_limited_falls_back_to_catalog() {
        let provider = Arc::new(MockProvider::new(
            FetchOutcome::RateLimited,
            FetchOutcome::RateLimited,
        ));
        let resolver = resolver_with(provider.clone(), Duration::from_secs(300));

        let resolved = resolver.resolve_price("TSLA").await;
        assert_eq!(resolved.source, PriceSource::Fallback);
        assert_eq!(resolved.price, d("240"));
        assert_eq!(resolved.percent_change, None);

        // Failures are never cached.
        resolver.resolve_price("TSLA").await;
        assert_eq!(provider.quote_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unknown_ticker_gets_synthetic_default() {
        let provider = Arc::new(MockProvider::failing());
        let resolver = resolver_with(provider, Duration::from_secs(300));

        let resolved = resolver.resolve_price("ZZZZ").await;
        assert_eq!(resolved.source, PriceSource::SyntheticDefault);
        assert_eq!(resolved.price, Decimal::ONE_HUNDRED);
        assert!(resolved.price > Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_live_profile_is_completed_from_fallback() {
        let live = CompanyProfile {
            name: Some("Apple Inc".to_string()),
            sector: Some("TECHNOLOGY".to_string()),
            ..Default::default()
        };
        let provider = Arc::new(MockProvider::new(
            FetchOutcome::RateLimited,
            FetchOutcome::Ok(live),
        ));
        let resolver = resolver_with(provider.clone(), Duration::from_secs(300));

        let resolved = resolver.resolve_profile("AAPL").await;
        assert_eq!(resolved.source, PriceSource::Live);
        assert_eq!(resolved.profile.name.as_deref(), Some("Apple Inc"));
        assert_eq!(resolved.profile.sector.as_deref(), Some("TECHNOLOGY"));
        assert_eq!(
            resolved.profile.homepage_url.as_deref(),
            Some("https://www.apple.com")
        );
        assert!(resolved.profile.is_complete());

        let cached = resolver.resolve_profile("AAPL").await;
        assert_eq!(cached.source, PriceSource::Cache);
        assert_eq!(cached.profile, resolved.profile);
        assert_eq!(provider.profile_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_profile_ladder_ends_in_placeholder() {
        let provider = Arc::new(MockProvider::failing());
        let resolver = resolver_with(provider, Duration::from_secs(300));

        let fallback = resolver.resolve_profile("MSFT").await;
        assert_eq!(fallback.source, PriceSource::Fallback);
        assert_eq!(
            fallback.profile.name.as_deref(),
            Some("Microsoft Corporation")
        );

        let synthetic = resolver.resolve_profile("zzzz").await;
        assert_eq!(synthetic.source, PriceSource::SyntheticDefault);
        assert_eq!(synthetic.profile, CompanyProfile::placeholder("ZZZZ"));
    }
}
