//! Per-provider circuit breaker.
//!
//! Tracks consecutive failures per provider and short-circuits calls during
//! sustained failure so a degraded provider does not add latency to every
//! request.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Thresholds and cooldown for one breaker.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakerPolicy {
    /// Consecutive failure weight at which the breaker opens.
    pub failure_threshold: u32,
    /// How long the breaker stays open before allowing a trial call.
    pub cooldown: Duration,
}

impl Default for BreakerPolicy {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            cooldown: Duration::from_secs(120),
        }
    }
}

/// State of one provider's breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BreakerState {
    /// Normal operation; failures are being counted.
    Closed { failures: u32 },
    /// Tripped; calls are refused until the cooldown elapses.
    Open { opened_at: Instant },
    /// One trial call is in flight; its outcome decides the next state.
    HalfOpen { probe_started: Instant },
}

/// Circuit breaker keyed by provider name.
///
/// Transitions: CLOSED → OPEN after the failure threshold is reached;
/// OPEN → HALF_OPEN once the cooldown elapses (exactly one trial call is
/// let through); HALF_OPEN → CLOSED on success, HALF_OPEN → OPEN on
/// failure. A trial call whose outcome is never reported expires after
/// another cooldown, so the breaker cannot get permanently stuck.
///
/// Throttling signals count double via
/// [`record_throttled`](Self::record_throttled): retrying a throttled
/// provider immediately only makes the throttling worse.
#[derive(Debug)]
pub struct CircuitBreaker {
    policy: BreakerPolicy,
    providers: RwLock<HashMap<String, Arc<Mutex<BreakerState>>>>,
}

impl CircuitBreaker {
    /// Creates a breaker applying `policy` to every provider.
    #[must_use]
    pub fn new(policy: BreakerPolicy) -> Self {
        Self {
            policy,
            providers: RwLock::new(HashMap::new()),
        }
    }

    async fn state_for(&self, provider: &str) -> Arc<Mutex<BreakerState>> {
        if let Some(state) = self.providers.read().await.get(provider) {
            return state.clone();
        }
        let mut providers = self.providers.write().await;
        providers
            .entry(provider.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(BreakerState::Closed { failures: 0 })))
            .clone()
    }

    /// Returns true while calls to `provider` must be skipped.
    ///
    /// Returning false from the open state moves the breaker to half-open
    /// and admits exactly one trial call.
    pub async fn is_open(&self, provider: &str) -> bool {
        let state = self.state_for(provider).await;
        let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
        match *state {
            BreakerState::Closed { .. } => false,
            BreakerState::Open { opened_at } => {
                if opened_at.elapsed() >= self.policy.cooldown {
                    debug!(provider, "Cooldown elapsed, admitting trial call");
                    *state = BreakerState::HalfOpen {
                        probe_started: Instant::now(),
                    };
                    false
                } else {
                    true
                }
            }
            BreakerState::HalfOpen { probe_started } => {
                // An unreported probe expires after another cooldown.
                if probe_started.elapsed() >= self.policy.cooldown {
                    debug!(provider, "Trial call never reported back, retrying");
                    *state = BreakerState::HalfOpen {
                        probe_started: Instant::now(),
                    };
                    false
                } else {
                    true
                }
            }
        }
    }

    /// Remaining cooldown for `provider`, zero when not open.
    pub async fn remaining_cooldown(&self, provider: &str) -> Duration {
        let state = self.state_for(provider).await;
        let state = state.lock().unwrap_or_else(PoisonError::into_inner);
        match *state {
            BreakerState::Closed { .. } => Duration::ZERO,
            BreakerState::Open { opened_at } => {
                self.policy.cooldown.saturating_sub(opened_at.elapsed())
            }
            BreakerState::HalfOpen { probe_started } => {
                self.policy.cooldown.saturating_sub(probe_started.elapsed())
            }
        }
    }

    /// Records a successful call; closes the breaker and resets the count.
    pub async fn record_success(&self, provider: &str) {
        let state = self.state_for(provider).await;
        let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
        *state = BreakerState::Closed { failures: 0 };
    }

    /// Records one failed call.
    pub async fn record_failure(&self, provider: &str) {
        self.record_weighted(provider, 1).await;
    }

    /// Records an explicit throttling signal, weighted as two failures.
    pub async fn record_throttled(&self, provider: &str) {
        self.record_weighted(provider, 2).await;
    }

    async fn record_weighted(&self, provider: &str, weight: u32) {
        let state = self.state_for(provider).await;
        let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
        match *state {
            BreakerState::Closed { failures } => {
                let failures = failures + weight;
                if failures >= self.policy.failure_threshold {
                    warn!(provider, failures, "Circuit breaker opened");
                    *state = BreakerState::Open {
                        opened_at: Instant::now(),
                    };
                } else {
                    *state = BreakerState::Closed { failures };
                }
            }
            BreakerState::HalfOpen { .. } => {
                warn!(provider, "Trial call failed, reopening circuit");
                *state = BreakerState::Open {
                    opened_at: Instant::now(),
                };
            }
            // Already open; keep the original cooldown clock.
            BreakerState::Open { .. } => {}
        }
    }
}
