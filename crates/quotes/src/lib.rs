#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/aksjeradar/quotes/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Resilient market-data access for web-facing applications.
//!
//! This crate composes the caching, guard, provider, and fallback layers
//! into a single [`QuoteService`] facade. Callers get a schema-complete
//! [`QuoteSnapshot`] for every lookup, degraded to deterministic synthetic
//! data when the live provider is down, throttled, or circuit-broken.
//!
//! # Features
//!
//! - `yahoo` - Yahoo Finance provider (enabled by default)
//!
//! # Example
//!
//! ```rust,ignore
//! use quotes::{QuoteService, ServiceConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let service = QuoteService::with_yahoo(ServiceConfig::default());
//!     service.start_background_refresh().await;
//!
//!     let snapshot = service.get_quote("EQNR.OL").await;
//!     println!("{} {} ({})", snapshot.quote.symbol, snapshot.quote.price,
//!         if snapshot.is_synthetic() { "synthetic" } else { "live" });
//! }
//! ```

// Core types and traits
pub use quotes_core::*;

// Providers
#[cfg(feature = "yahoo")]
pub use quotes_yahoo::YahooQuoteProvider;

// Guard policies, exposed for configuration
pub use quotes_guard::{BackoffPolicy, BreakerPolicy, RateLimitPolicy};

mod config;
mod facade;
mod refresh;
mod summary;
#[cfg(test)]
mod testutil;

pub use config::{RefreshConfig, ServiceConfig, Watchlist};
pub use facade::QuoteService;
pub use summary::{CategorySummary, MarketSummary};
