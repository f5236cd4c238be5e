//! The data-access facade composing cache, guards, fallback, and refresh.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use quotes_cache::TtlCache;
use quotes_core::{
    Category, QuoteError, QuoteProvider, QuoteSnapshot, RawQuote, Result, Symbol,
};
use quotes_guard::{retry_with_backoff, CircuitBreaker, RateLimiter};

use crate::config::ServiceConfig;
use crate::refresh::RefreshHandle;
use crate::summary::MarketSummary;

/// Shared state behind the facade; also driven by the background sweep.
pub(crate) struct ServiceInner {
    pub(crate) provider: Arc<dyn QuoteProvider>,
    pub(crate) cache: TtlCache<QuoteSnapshot>,
    pub(crate) limiter: RateLimiter,
    pub(crate) breaker: CircuitBreaker,
    pub(crate) config: ServiceConfig,
}

impl std::fmt::Debug for ServiceInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceInner")
            .field("provider", &self.provider.name())
            .finish_non_exhaustive()
    }
}

/// Cache key for a symbol's snapshot. Shared by foreground calls and the
/// background sweep so either side warms the other.
pub(crate) fn cache_key(symbol: &Symbol) -> String {
    format!("quote:{symbol}")
}

impl ServiceInner {
    /// Checks the circuit breaker and rate limiter, in that order.
    ///
    /// Returns the blocking condition, if any, without attempting a call or
    /// mutating limiter state.
    pub(crate) async fn gate(&self) -> Option<QuoteError> {
        let provider = self.provider.name();
        if self.breaker.is_open(provider).await {
            return Some(QuoteError::CircuitOpen {
                provider: provider.to_string(),
                retry_after: self.breaker.remaining_cooldown(provider).await,
            });
        }
        let admission = self.limiter.can_proceed(provider).await;
        if !admission.is_allowed() {
            return Some(QuoteError::RateLimited {
                provider: provider.to_string(),
                retry_after: Some(admission.retry_after()),
            });
        }
        None
    }

    /// Calls the provider, optionally under the retry policy.
    ///
    /// Every physically attempted call first waits out any pending
    /// admission denial, so retries honor the spacing and window budget the
    /// limiter enforces, and is then recorded against the window. Breaker
    /// outcome accounting is the caller's job: exactly one success or
    /// failure per `call_provider` invocation.
    pub(crate) async fn call_provider(
        &self,
        symbols: &[Symbol],
        with_retry: bool,
    ) -> Result<HashMap<Symbol, RawQuote>> {
        let provider = self.provider.name();
        let attempt = || async {
            let admission = self.limiter.can_proceed(provider).await;
            if !admission.is_allowed() {
                tokio::time::sleep(admission.retry_after()).await;
            }
            self.limiter.record_call(provider).await;
            self.provider.fetch_batch(symbols).await
        };
        if with_retry {
            retry_with_backoff(&self.config.backoff, provider, attempt).await
        } else {
            attempt().await
        }
    }

    /// Records the breaker outcome of one provider call.
    pub(crate) async fn record_outcome(&self, result: &Result<HashMap<Symbol, RawQuote>>) {
        let provider = self.provider.name();
        match result {
            Ok(_) => self.breaker.record_success(provider).await,
            Err(e) if e.is_throttle() => self.breaker.record_throttled(provider).await,
            Err(_) => self.breaker.record_failure(provider).await,
        }
    }

    /// Builds the snapshot for one symbol from an optional live record and
    /// writes it to the cache with the appropriate TTL.
    pub(crate) async fn store_snapshot(
        &self,
        symbol: &Symbol,
        raw: Option<&RawQuote>,
    ) -> QuoteSnapshot {
        let now = Utc::now();
        let base = quotes_fallback::synthesize(symbol, now);
        let snapshot = match raw {
            Some(raw) => base.merged_with(raw, now),
            None => base,
        };
        let ttl = if snapshot.is_synthetic() {
            self.config.fallback_ttl
        } else {
            self.config.live_ttl
        };
        self.cache.set(cache_key(symbol), snapshot.clone(), ttl).await;
        snapshot
    }
}

/// The single entry point to market data for the rest of the application.
///
/// `get_quote` and `get_snapshot` never fail: under any combination of
/// breaker-open, rate-limited, and provider-error conditions they return a
/// schema-complete snapshot, degraded to deterministic synthetic data when
/// live data is unavailable. A wrong number is cheaper than a broken page.
///
/// Construct one per process and share it; all collaborators are explicit
/// fields, no global state.
#[derive(Debug)]
pub struct QuoteService {
    inner: Arc<ServiceInner>,
    refresh: RefreshHandle,
}

impl QuoteService {
    /// Creates a service over `provider` with the given configuration.
    #[must_use]
    pub fn new(provider: Arc<dyn QuoteProvider>, config: ServiceConfig) -> Self {
        let inner = Arc::new(ServiceInner {
            provider,
            cache: TtlCache::new(),
            limiter: RateLimiter::new(config.rate_limit.clone()),
            breaker: CircuitBreaker::new(config.breaker.clone()),
            config,
        });
        Self {
            inner,
            refresh: RefreshHandle::new(),
        }
    }

    /// Creates a service backed by the Yahoo Finance provider.
    #[cfg(feature = "yahoo")]
    #[must_use]
    pub fn with_yahoo(config: ServiceConfig) -> Self {
        Self::new(Arc::new(quotes_yahoo::YahooQuoteProvider::new()), config)
    }

    /// Returns a snapshot for `symbol`, live if possible, synthetic
    /// otherwise. Never fails and never returns a partial structure.
    pub async fn get_quote(&self, symbol: impl Into<Symbol>) -> QuoteSnapshot {
        let symbol = symbol.into();
        if let Some(hit) = self.inner.cache.get(&cache_key(&symbol)).await {
            return hit;
        }

        if let Some(blocked) = self.inner.gate().await {
            debug!(%symbol, reason = %blocked, "Provider gated, serving fallback");
            return self.inner.store_snapshot(&symbol, None).await;
        }

        let result = self
            .inner
            .call_provider(std::slice::from_ref(&symbol), true)
            .await;
        match result {
            Ok(mut map) => match map.remove(&symbol) {
                Some(raw) => match raw.validate(&symbol) {
                    Ok(()) => {
                        self.inner.breaker.record_success(self.inner.provider.name()).await;
                        self.inner.store_snapshot(&symbol, Some(&raw)).await
                    }
                    Err(e) => {
                        // Malformed payloads count as failures and are never
                        // passed through partially.
                        warn!(%symbol, error = %e, "Discarding malformed quote");
                        self.inner.breaker.record_failure(self.inner.provider.name()).await;
                        self.inner.store_snapshot(&symbol, None).await
                    }
                },
                None => {
                    // The call itself succeeded; the provider just does not
                    // know this symbol.
                    self.inner.breaker.record_success(self.inner.provider.name()).await;
                    debug!(%symbol, "Symbol absent from provider response");
                    self.inner.store_snapshot(&symbol, None).await
                }
            },
            Err(e) => {
                warn!(%symbol, error = %e, "Provider call failed, serving fallback");
                self.inner.record_outcome(&Err(e)).await;
                self.inner.store_snapshot(&symbol, None).await
            }
        }
    }

    /// Returns snapshots for every symbol in `category`'s watch-list.
    ///
    /// Cheap by design: the background scheduler keeps these symbols warm,
    /// so this is expected to be served from cache almost always.
    pub async fn get_snapshot(&self, category: Category) -> Vec<QuoteSnapshot> {
        let symbols = self.inner.config.refresh.symbols_for(category).to_vec();
        let mut found: HashMap<Symbol, QuoteSnapshot> = HashMap::new();
        let mut misses = Vec::new();

        for symbol in &symbols {
            match self.inner.cache.get(&cache_key(symbol)).await {
                Some(snapshot) => {
                    found.insert(symbol.clone(), snapshot);
                }
                None => misses.push(symbol.clone()),
            }
        }

        let batch_size = self.inner.provider.max_batch_size().max(1);
        for chunk in misses.chunks(batch_size) {
            if let Some(blocked) = self.inner.gate().await {
                debug!(%category, reason = %blocked, "Provider gated, filling with fallback");
                for symbol in chunk {
                    found.insert(symbol.clone(), self.inner.store_snapshot(symbol, None).await);
                }
                continue;
            }

            let result = self.inner.call_provider(chunk, true).await;
            self.inner.record_outcome(&result).await;
            let mut map = result.unwrap_or_default();
            for symbol in chunk {
                let raw = map.remove(symbol).filter(|r| r.validate(symbol).is_ok());
                found.insert(
                    symbol.clone(),
                    self.inner.store_snapshot(symbol, raw.as_ref()).await,
                );
            }
        }

        symbols
            .iter()
            .filter_map(|symbol| found.remove(symbol))
            .collect()
    }

    /// Per-category aggregates over currently cached snapshots.
    pub async fn market_summary(&self) -> MarketSummary {
        let mut categories = Vec::with_capacity(Category::ALL.len());
        for category in Category::ALL {
            let mut snapshots = Vec::new();
            for symbol in self.inner.config.refresh.symbols_for(category) {
                if let Some(snapshot) = self.inner.cache.get(&cache_key(symbol)).await {
                    snapshots.push(snapshot);
                }
            }
            categories.push(crate::summary::summarize(category, &snapshots));
        }
        MarketSummary {
            categories,
            generated_at: Utc::now(),
        }
    }

    /// The `limit` most active cached snapshots, ranked by volume times
    /// absolute percentage move.
    pub async fn trending(&self, limit: usize) -> Vec<QuoteSnapshot> {
        let mut snapshots = Vec::new();
        for watchlist in &self.inner.config.refresh.watchlists {
            for symbol in &watchlist.symbols {
                if let Some(snapshot) = self.inner.cache.get(&cache_key(symbol)).await {
                    snapshots.push(snapshot);
                }
            }
        }
        snapshots.sort_by(|a, b| {
            let score = |s: &QuoteSnapshot| s.quote.volume as f64 * s.quote.change_percent.abs();
            score(b).partial_cmp(&score(a)).unwrap_or(std::cmp::Ordering::Equal)
        });
        snapshots.truncate(limit);
        snapshots
    }

    /// Drops all cached snapshots.
    pub async fn clear_cache(&self) {
        self.inner.cache.clear().await;
    }

    /// Starts the background refresh loop.
    ///
    /// Idempotent: returns false (and leaves the running loop untouched) if
    /// a loop is already running.
    pub async fn start_background_refresh(&self) -> bool {
        self.refresh.start(self.inner.clone()).await
    }

    /// Stops the background refresh loop and waits for it to exit.
    ///
    /// Observable within one batch's processing time: the loop checks the
    /// stop signal between batches, not just between sweeps. Returns false
    /// if no loop was running.
    pub async fn stop_background_refresh(&self) -> bool {
        self.refresh.stop().await
    }
}
