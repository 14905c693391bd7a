use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::data::rates::RateProvider;

/// How long a fetched rate stays fresh.
pub const RATE_TTL: Duration = Duration::from_secs(600);

/// Used when no source has ever produced a rate (IDR per ETH).
pub const DEFAULT_FALLBACK_RATE: f64 = 60_000_000.0;

/// Static fallback for `currency`. Only rupiah has a built-in figure; any
/// other currency falls back to 0 unless a rate is configured.
pub fn default_fallback_rate(currency: &str) -> f64 {
    if currency.eq_ignore_ascii_case("idr") {
        DEFAULT_FALLBACK_RATE
    } else {
        0.0
    }
}

#[derive(Debug, Default)]
struct RateState {
    fresh: Option<(Instant, f64)>,
    last_good: Option<f64>,
}

/// Time-bounded exchange-rate cache, owned by the caller and handed to the
/// fee pipeline by reference.
///
/// Refreshes are single-flight: the lock is held across the provider call,
/// so concurrent readers wait for the one refresh instead of starting
/// their own.
pub struct RateCache {
    ttl: Duration,
    fallback: f64,
    state: Mutex<RateState>,
}

impl RateCache {
    pub fn new(ttl: Duration, fallback: f64) -> Self {
        Self {
            ttl,
            fallback,
            state: Mutex::new(RateState::default()),
        }
    }

    /// Return the cached rate if still fresh, otherwise refetch. A failed
    /// refetch falls back to the last good value, then to the static
    /// fallback; neither is cached as fresh.
    pub async fn get_or_refresh(&self, provider: &RateProvider) -> f64 {
        let mut state = self.state.lock().await;
        if let Some((at, rate)) = state.fresh {
            if at.elapsed() < self.ttl {
                return rate;
            }
            state.fresh = None;
        }

        let rate = provider.fetch_rate().await;
        if rate > 0.0 {
            debug!(rate, "exchange rate refreshed");
            state.fresh = Some((Instant::now(), rate));
            state.last_good = Some(rate);
            return rate;
        }

        let fallback = state.last_good.unwrap_or(self.fallback);
        info!(fallback, "using fallback exchange rate");
        fallback
    }

    /// Fresh cached rate, without fetching.
    pub async fn peek(&self) -> Option<f64> {
        let state = self.state.lock().await;
        state
            .fresh
            .filter(|(at, _)| at.elapsed() < self.ttl)
            .map(|(_, rate)| rate)
    }

    /// Store a rate as fresh (e.g. one supplied by the user).
    pub async fn put(&self, rate: f64) {
        let mut state = self.state.lock().await;
        state.fresh = Some((Instant::now(), rate));
        state.last_good = Some(rate);
    }

    /// Drop the fresh entry so the next read refetches.
    pub async fn invalidate(&self) {
        self.state.lock().await.fresh = None;
    }
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new(RATE_TTL, DEFAULT_FALLBACK_RATE)
    }
}
