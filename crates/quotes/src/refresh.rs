//! Background refresh loop keeping the watch-lists warm.
//!
//! One task per service, started and stopped explicitly. The loop sweeps
//! every configured watch-list in batches, pausing between batches so a
//! sweep never bursts the provider, and re-checks the stop signal between
//! batches so shutdown is observable within one batch's processing time.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, warn};

use quotes_core::Symbol;

use crate::facade::{cache_key, ServiceInner};

/// Owns the lifecycle of at most one running sweep loop.
#[derive(Debug)]
pub(crate) struct RefreshHandle {
    task: Mutex<Option<RefreshTask>>,
}

#[derive(Debug)]
struct RefreshTask {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl RefreshHandle {
    pub(crate) fn new() -> Self {
        Self {
            task: Mutex::new(None),
        }
    }

    /// Spawns the sweep loop unless one is already running.
    pub(crate) async fn start(&self, inner: Arc<ServiceInner>) -> bool {
        let mut task = self.task.lock().await;
        if let Some(running) = task.as_ref() {
            if !running.handle.is_finished() {
                debug!("Refresh loop already running, ignoring start");
                return false;
            }
        }
        let (stop, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(run_sweep_loop(inner, stop_rx));
        *task = Some(RefreshTask { stop, handle });
        debug!("Refresh loop started");
        true
    }

    /// Signals the loop to stop and waits for it to exit.
    pub(crate) async fn stop(&self) -> bool {
        let mut task = self.task.lock().await;
        let Some(running) = task.take() else {
            debug!("No refresh loop running, ignoring stop");
            return false;
        };
        let _ = running.stop.send(true);
        if let Err(e) = running.handle.await {
            warn!(error = %e, "Refresh loop panicked");
        }
        debug!("Refresh loop stopped");
        true
    }
}

/// The loop body: one sweep per interval tick, first tick immediately.
async fn run_sweep_loop(inner: Arc<ServiceInner>, mut stop: watch::Receiver<bool>) {
    let mut ticker = interval(inner.config.refresh.sweep_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    return;
                }
                continue;
            }
        }
        sweep(&inner, &mut stop).await;
        if *stop.borrow() {
            return;
        }
        let purged = inner.cache.purge_expired().await;
        if purged > 0 {
            debug!(purged, "Dropped expired cache entries");
        }
    }
}

/// Refreshes every watch-list symbol once, in configured order.
async fn sweep(inner: &Arc<ServiceInner>, stop: &mut watch::Receiver<bool>) {
    let refresh = &inner.config.refresh;
    let symbols: Vec<Symbol> = refresh
        .watchlists
        .iter()
        .flat_map(|w| w.symbols.iter().cloned())
        .collect();
    let batch_size = refresh
        .batch_size
        .clamp(1, inner.provider.max_batch_size().max(1));

    debug!(symbols = symbols.len(), batch_size, "Starting refresh sweep");
    let mut first = true;
    for chunk in symbols.chunks(batch_size) {
        if *stop.borrow() {
            return;
        }
        if !first {
            tokio::select! {
                () = sleep(refresh.inter_batch_delay) => {}
                _ = stop.changed() => {}
            }
            if *stop.borrow() {
                return;
            }
        }
        first = false;
        refresh_batch(inner, chunk).await;
    }
}

/// Fetches one batch and updates the cache.
///
/// Live data always overwrites; synthetic data is written only for symbols
/// with no usable cache entry, so a failing sweep never downgrades a fresh
/// live snapshot.
async fn refresh_batch(inner: &ServiceInner, chunk: &[Symbol]) {
    if let Some(blocked) = inner.gate().await {
        debug!(reason = %blocked, "Provider gated, skipping batch fetch");
        for symbol in chunk {
            if inner.cache.get(&cache_key(symbol)).await.is_none() {
                inner.store_snapshot(symbol, None).await;
            }
        }
        return;
    }

    // No retry here: the next sweep is the retry.
    let result = inner.call_provider(chunk, false).await;
    inner.record_outcome(&result).await;
    match result {
        Ok(mut map) => {
            for symbol in chunk {
                let raw = map.remove(symbol).filter(|r| r.validate(symbol).is_ok());
                if raw.is_some() || inner.cache.get(&cache_key(symbol)).await.is_none() {
                    inner.store_snapshot(symbol, raw.as_ref()).await;
                }
            }
        }
        Err(e) => {
            warn!(error = %e, "Batch refresh failed");
            for symbol in chunk {
                if inner.cache.get(&cache_key(symbol)).await.is_none() {
                    inner.store_snapshot(symbol, None).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::config::{RefreshConfig, ServiceConfig, Watchlist};
    use crate::testutil::{test_config, MockBehavior, MockProvider};
    use crate::QuoteService;
    use quotes_core::Category;
    use std::sync::Arc;

    fn refresh_config(symbols: &[&str], batch_size: usize, delay: Duration) -> ServiceConfig {
        ServiceConfig {
            refresh: RefreshConfig {
                watchlists: vec![Watchlist::new(Category::Global, symbols.iter().copied())],
                batch_size,
                inter_batch_delay: delay,
                sweep_interval: Duration::from_secs(600),
            },
            ..test_config()
        }
    }

    #[tokio::test]
    async fn first_sweep_warms_cache() {
        let provider = Arc::new(MockProvider::new(MockBehavior::Healthy));
        let config = refresh_config(
            &["AAPL", "MSFT", "AMZN", "GOOGL", "TSLA"],
            3,
            Duration::from_millis(1),
        );
        let service = QuoteService::new(provider.clone(), config);

        assert!(service.start_background_refresh().await);
        tokio::time::sleep(Duration::from_millis(100)).await;

        // 5 symbols in batches of 3
        assert_eq!(provider.calls(), 2);
        let snapshot = service.get_quote("MSFT").await;
        assert!(!snapshot.is_synthetic());
        // served from cache, no extra provider call
        assert_eq!(provider.calls(), 2);
        // written by the sweep just now, not by some earlier path
        let age = chrono::Utc::now() - snapshot.quote.timestamp;
        assert!(age < chrono::TimeDelta::seconds(2));

        assert!(service.stop_background_refresh().await);
    }

    #[tokio::test]
    async fn start_is_idempotent() {
        let provider = Arc::new(MockProvider::new(MockBehavior::Healthy));
        let config = refresh_config(&["AAPL"], 1, Duration::from_millis(1));
        let service = QuoteService::new(provider, config);

        assert!(service.start_background_refresh().await);
        assert!(!service.start_background_refresh().await);
        assert!(service.stop_background_refresh().await);
        assert!(!service.stop_background_refresh().await);
    }

    #[tokio::test]
    async fn stop_cancels_between_batches() {
        let provider = Arc::new(MockProvider::new(MockBehavior::Healthy));
        let config = refresh_config(
            &["AAPL", "MSFT", "AMZN", "GOOGL", "TSLA", "NVDA"],
            1,
            Duration::from_millis(200),
        );
        let service = QuoteService::new(provider.clone(), config);

        assert!(service.start_background_refresh().await);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(service.stop_background_refresh().await);

        let calls_at_stop = provider.calls();
        assert!(calls_at_stop < 6, "sweep should not have completed");

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(provider.calls(), calls_at_stop);
    }

    #[tokio::test]
    async fn failing_sweep_fills_cache_with_fallback() {
        let provider = Arc::new(MockProvider::new(MockBehavior::Fail));
        let config = refresh_config(&["AAPL", "MSFT"], 2, Duration::from_millis(1));
        let service = QuoteService::new(provider.clone(), config);

        assert!(service.start_background_refresh().await);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(service.stop_background_refresh().await);

        let snapshot = service.get_quote("AAPL").await;
        assert!(snapshot.is_synthetic());
        assert!(snapshot.quote.price > 0.0);
    }
}
