//! Per-provider admission control.
//!
//! Combines a sliding-window call budget with a minimum spacing between any
//! two calls to the same provider. The spacing rule exists because real
//! providers penalize bursts even under the nominal per-minute quota.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Admission policy for one provider.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitPolicy {
    /// Length of the sliding window.
    pub window: Duration,
    /// Maximum calls allowed within any one window.
    pub max_calls: u32,
    /// Minimum spacing between any two calls, independent of the window.
    pub min_interval: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(60),
            max_calls: 10,
            min_interval: Duration::from_secs(2),
        }
    }
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The call may proceed now.
    Allowed,
    /// The call must wait at least `retry_after`.
    Denied {
        /// How long until the next call could be admitted.
        retry_after: Duration,
    },
}

impl Admission {
    /// Returns true if the call may proceed.
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Remaining wait, zero when allowed.
    #[must_use]
    pub const fn retry_after(&self) -> Duration {
        match self {
            Self::Allowed => Duration::ZERO,
            Self::Denied { retry_after } => *retry_after,
        }
    }
}

/// Per-provider window bookkeeping: one timestamp per call still inside the
/// window, oldest first.
#[derive(Debug)]
struct WindowState {
    calls: VecDeque<Instant>,
    last_call: Option<Instant>,
}

impl WindowState {
    fn new() -> Self {
        Self {
            calls: VecDeque::new(),
            last_call: None,
        }
    }

    /// Drops timestamps that have slid out of the window.
    fn prune(&mut self, now: Instant, window: Duration) {
        while let Some(oldest) = self.calls.front() {
            if now.duration_since(*oldest) >= window {
                self.calls.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Sliding-window rate limiter keyed by provider name.
///
/// Every recorded call holds a timestamp; a call is admitted only while
/// fewer than `max_calls` timestamps remain inside the window ending now,
/// so no physical window ever carries more than the ceiling.
///
/// [`can_proceed`](Self::can_proceed) never counts a call; only
/// [`record_call`](Self::record_call) does, and it must be called exactly
/// once per actually-attempted call (never for cache hits).
///
/// State is sharded per provider so concurrent callers only contend when
/// they target the same provider.
#[derive(Debug)]
pub struct RateLimiter {
    policy: RateLimitPolicy,
    providers: RwLock<HashMap<String, Arc<Mutex<WindowState>>>>,
}

impl RateLimiter {
    /// Creates a limiter applying `policy` to every provider.
    #[must_use]
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            providers: RwLock::new(HashMap::new()),
        }
    }

    async fn state_for(&self, provider: &str) -> Arc<Mutex<WindowState>> {
        if let Some(state) = self.providers.read().await.get(provider) {
            return state.clone();
        }
        let mut providers = self.providers.write().await;
        providers
            .entry(provider.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(WindowState::new())))
            .clone()
    }

    /// Checks whether a call to `provider` may proceed right now.
    pub async fn can_proceed(&self, provider: &str) -> Admission {
        let state = self.state_for(provider).await;
        let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();

        // Spacing rule applies independently of the window budget.
        if let Some(last) = state.last_call {
            let since_last = now.duration_since(last);
            if since_last < self.policy.min_interval {
                let retry_after = self.policy.min_interval - since_last;
                debug!(provider, ?retry_after, "Denied by min-interval spacing");
                return Admission::Denied { retry_after };
            }
        }

        state.prune(now, self.policy.window);
        if state.calls.len() as u32 >= self.policy.max_calls {
            // The budget frees up when the oldest surviving call slides out.
            let retry_after = match state.calls.front() {
                Some(oldest) => self.policy.window - now.duration_since(*oldest),
                None => self.policy.window,
            };
            debug!(provider, ?retry_after, "Denied by window budget");
            return Admission::Denied { retry_after };
        }

        Admission::Allowed
    }

    /// Records one actually-attempted call to `provider`.
    pub async fn record_call(&self, provider: &str) {
        let state = self.state_for(provider).await;
        let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();

        state.prune(now, self.policy.window);
        state.calls.push_back(now);
        state.last_call = Some(now);
    }
}
