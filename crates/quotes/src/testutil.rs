//! Mock provider and fast policies shared by the service tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use quotes_core::{QuoteError, QuoteProvider, RawQuote, Result, Symbol};
use quotes_guard::{BackoffPolicy, BreakerPolicy, RateLimitPolicy};

use crate::config::ServiceConfig;

/// How the mock answers each batch call.
#[derive(Debug, Clone, Copy)]
pub(crate) enum MockBehavior {
    /// Every requested symbol gets a valid record.
    Healthy,
    /// Every call fails with a network error.
    Fail,
    /// Every call fails with a throttling error.
    Throttle,
    /// Calls succeed but the response contains no symbols.
    Empty,
}

/// In-memory provider counting how often it is physically called.
#[derive(Debug)]
pub(crate) struct MockProvider {
    behavior: MockBehavior,
    calls: AtomicUsize,
}

impl MockProvider {
    pub(crate) fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of batch calls attempted so far.
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn max_batch_size(&self) -> usize {
        10
    }

    async fn fetch_batch(&self, symbols: &[Symbol]) -> Result<HashMap<Symbol, RawQuote>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            MockBehavior::Healthy => Ok(symbols
                .iter()
                .map(|symbol| {
                    let raw = RawQuote {
                        price: Some(123.45),
                        previous_close: Some(120.0),
                        volume: Some(1_000_000),
                        name: Some(format!("{symbol} Corp")),
                        ..Default::default()
                    };
                    (symbol.clone(), raw)
                })
                .collect()),
            MockBehavior::Fail => Err(QuoteError::Network("connection refused".into())),
            MockBehavior::Throttle => Err(QuoteError::RateLimited {
                provider: "mock".into(),
                retry_after: Some(Duration::from_secs(60)),
            }),
            MockBehavior::Empty => Ok(HashMap::new()),
        }
    }
}

/// A configuration with guard policies tightened for fast tests.
///
/// No spacing or window limits, no retries, and a breaker that opens after
/// three failures with a long cooldown so open state is stable within a
/// test.
pub(crate) fn test_config() -> ServiceConfig {
    ServiceConfig {
        rate_limit: RateLimitPolicy {
            window: Duration::from_secs(60),
            max_calls: 1_000,
            min_interval: Duration::ZERO,
        },
        breaker: BreakerPolicy {
            failure_threshold: 3,
            cooldown: Duration::from_secs(600),
        },
        backoff: BackoffPolicy {
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            max_retries: 0,
        },
        ..ServiceConfig::default()
    }
}
