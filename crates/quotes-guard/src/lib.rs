#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/aksjeradar/quotes/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Defensive call policies for unreliable quote providers.
//!
//! - [`RateLimiter`] - rolling-window admission control with min spacing
//! - [`CircuitBreaker`] - per-provider failure-tracking state machine
//! - [`retry_with_backoff`] - bounded retries with exponential backoff

/// Per-provider circuit breaker.
pub mod circuit_breaker;
/// Per-provider admission control.
pub mod rate_limiter;
/// Bounded retry with exponential backoff and jitter.
pub mod retry;

pub use circuit_breaker::{BreakerPolicy, CircuitBreaker};
pub use rate_limiter::{Admission, RateLimitPolicy, RateLimiter};
pub use retry::{retry_with_backoff, BackoffPolicy};
