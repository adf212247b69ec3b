use governor::clock::DefaultClock;
use governor::state::InMemoryState;
use governor::state::direct::NotKeyed;
use governor::{Quota, RateLimiter};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Enforces a minimum spacing between upstream calls by suspending callers
/// until the next slot opens.
#[derive(Clone)]
pub struct Throttle {
    limiter: Option<Arc<DirectRateLimiter>>,
}

impl Throttle {
    /// A zero interval disables throttling.
    pub fn new(min_interval: Duration) -> Self {
        let limiter =
            Quota::with_period(min_interval).map(|quota| Arc::new(RateLimiter::direct(quota)));
        Self { limiter }
    }

    pub async fn wait(&self) {
        if let Some(limiter) = &self.limiter {
            if limiter.check().is_err() {
                debug!("Waiting for upstream rate limit slot");
                limiter.until_ready().await;
            }
        }
    }
}
