//! Static startup configuration for the quote service.
//!
//! Injected as a plain struct at construction time; environment plumbing
//! belongs to the application bootstrap layer, not this crate.

use std::time::Duration;

use quotes_core::{Category, Symbol};
use quotes_guard::{BackoffPolicy, BreakerPolicy, RateLimitPolicy};

/// A named group of symbols refreshed and served together.
#[derive(Debug, Clone)]
pub struct Watchlist {
    /// Market category of this list.
    pub category: Category,
    /// Symbols in refresh order.
    pub symbols: Vec<Symbol>,
}

impl Watchlist {
    /// Creates a watch-list from anything yielding symbol-like strings.
    pub fn new<I, S>(category: Category, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Symbol>,
    {
        Self {
            category,
            symbols: symbols.into_iter().map(Into::into).collect(),
        }
    }
}

/// Configuration for the background refresh scheduler.
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Watch-lists swept on every iteration, in order.
    pub watchlists: Vec<Watchlist>,
    /// Symbols per provider call during a sweep.
    pub batch_size: usize,
    /// Pause between batches within one sweep.
    pub inter_batch_delay: Duration,
    /// Cooldown between full sweeps.
    pub sweep_interval: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            watchlists: default_watchlists(),
            batch_size: 3,
            inter_batch_delay: Duration::from_secs(3),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl RefreshConfig {
    /// Symbols configured for `category`, empty if none.
    #[must_use]
    pub fn symbols_for(&self, category: Category) -> &[Symbol] {
        self.watchlists
            .iter()
            .find(|w| w.category == category)
            .map_or(&[], |w| w.symbols.as_slice())
    }
}

/// Full configuration of the quote service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// TTL for snapshots carrying live provider data.
    pub live_ttl: Duration,
    /// Shorter TTL for synthetic fallback snapshots, so callers retry the
    /// provider sooner without hammering it.
    pub fallback_ttl: Duration,
    /// Admission policy for the provider.
    pub rate_limit: RateLimitPolicy,
    /// Circuit-breaker thresholds for the provider.
    pub breaker: BreakerPolicy,
    /// Retry schedule for foreground provider calls.
    pub backoff: BackoffPolicy,
    /// Background refresh settings.
    pub refresh: RefreshConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            live_ttl: Duration::from_secs(300),
            fallback_ttl: Duration::from_secs(60),
            rate_limit: RateLimitPolicy::default(),
            breaker: BreakerPolicy::default(),
            backoff: BackoffPolicy::default(),
            refresh: RefreshConfig::default(),
        }
    }
}

/// The default watch-lists: Oslo Børs majors, global megacaps, and the
/// largest crypto pairs.
fn default_watchlists() -> Vec<Watchlist> {
    vec![
        Watchlist::new(
            Category::Domestic,
            [
                "EQNR.OL", "DNB.OL", "TEL.OL", "YAR.OL", "NHY.OL", "MOWI.OL", "AKERBP.OL",
                "ORK.OL", "SALM.OL", "SUBC.OL",
            ],
        ),
        Watchlist::new(
            Category::Global,
            [
                "AAPL", "MSFT", "AMZN", "GOOGL", "META", "TSLA", "NVDA", "NFLX", "ADBE", "CRM",
            ],
        ),
        Watchlist::new(
            Category::Crypto,
            ["BTC-USD", "ETH-USD", "ADA-USD", "DOT-USD", "SOL-USD"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_all_categories() {
        let config = RefreshConfig::default();
        for category in Category::ALL {
            assert!(
                !config.symbols_for(category).is_empty(),
                "no default watch-list for {category}"
            );
        }
    }

    #[test]
    fn symbols_for_unknown_list_is_empty() {
        let config = RefreshConfig {
            watchlists: vec![Watchlist::new(Category::Global, ["AAPL"])],
            ..Default::default()
        };
        assert!(config.symbols_for(Category::Crypto).is_empty());
        assert_eq!(config.symbols_for(Category::Global).len(), 1);
    }
}
