//! Provider trait for fetching live quotes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;

use crate::{
    error::Result,
    types::{RawQuote, Symbol},
};

/// A source of live market quotes.
///
/// Implementations wrap one remote endpoint. The call is batched: providers
/// accept a small set of symbols per request and may fail outright, return
/// partial results, or succeed fully. Rate limiting, circuit breaking, and
/// retries are the caller's concern, not the provider's.
#[async_trait]
pub trait QuoteProvider: Send + Sync + Debug {
    /// Returns the name of this provider (e.g., "Yahoo Finance").
    ///
    /// Used as the key for rate-limiter and circuit-breaker state.
    fn name(&self) -> &str;

    /// Largest batch this provider accepts in a single call.
    fn max_batch_size(&self) -> usize {
        5
    }

    /// Fetches quotes for a batch of symbols.
    ///
    /// Symbols the provider does not know are simply absent from the result
    /// map; an empty map is a valid (if useless) response.
    async fn fetch_batch(&self, symbols: &[Symbol]) -> Result<HashMap<Symbol, RawQuote>>;
}
