#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/aksjeradar/quotes/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Yahoo Finance quote provider.
//!
//! Fetches up to [`YahooQuoteProvider::max_batch_size`] symbols per request
//! from Yahoo's batched quote API. Admission control, circuit breaking, and
//! retries all live above this crate; the provider only performs the call
//! and maps Yahoo's responses onto [`RawQuote`] records.
//!
//! # Example
//!
//! ```no_run
//! use quotes_yahoo::YahooQuoteProvider;
//! use quotes_core::{QuoteProvider, Symbol};
//!
//! # async fn example() -> quotes_core::Result<()> {
//! let provider = YahooQuoteProvider::new();
//! let symbols = [Symbol::new("EQNR.OL"), Symbol::new("AAPL")];
//! let quotes = provider.fetch_batch(&symbols).await?;
//! println!("Fetched {} quotes", quotes.len());
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use quotes_core::{QuoteError, QuoteProvider, RawQuote, Result, Symbol};
use serde::Deserialize;
use tracing::debug;

/// Yahoo Finance batched quote API base URL.
const QUOTE_API_URL: &str = "https://query1.finance.yahoo.com/v7/finance/quote";

/// Request timeout: a hanging provider must not pin foreground callers.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// User agent for HTTP requests.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// Yahoo Finance quote provider.
#[derive(Debug)]
pub struct YahooQuoteProvider {
    client: reqwest::Client,
}

impl YahooQuoteProvider {
    /// Create a provider with the default HTTP client (10 s timeout).
    #[must_use]
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }

    /// Create a provider with a custom HTTP client.
    ///
    /// The caller is responsible for configuring a request timeout.
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Build the batched quote URL for a set of symbols.
    fn build_quote_url(&self, symbols: &[Symbol]) -> String {
        let joined = symbols
            .iter()
            .map(Symbol::as_str)
            .collect::<Vec<_>>()
            .join(",");
        format!("{QUOTE_API_URL}?symbols={joined}")
    }
}

impl Default for YahooQuoteProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuoteProvider for YahooQuoteProvider {
    fn name(&self) -> &str {
        "Yahoo Finance"
    }

    fn max_batch_size(&self) -> usize {
        5
    }

    async fn fetch_batch(&self, symbols: &[Symbol]) -> Result<HashMap<Symbol, RawQuote>> {
        if symbols.is_empty() {
            return Ok(HashMap::new());
        }

        let url = self.build_quote_url(symbols);
        debug!("Fetching quotes: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| QuoteError::Network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(QuoteError::RateLimited {
                provider: self.name().to_string(),
                retry_after: Some(Duration::from_secs(60)),
            });
        }

        if !response.status().is_success() {
            return Err(QuoteError::Network(format!(
                "HTTP {} for quote batch",
                response.status()
            )));
        }

        let body: QuoteResponse = response
            .json()
            .await
            .map_err(|e| QuoteError::Parse(e.to_string()))?;

        if let Some(error) = body.quote_response.error {
            return Err(QuoteError::Other(format!(
                "{}: {}",
                error.code, error.description
            )));
        }

        let mut quotes = HashMap::with_capacity(body.quote_response.result.len());
        for item in body.quote_response.result {
            let symbol = Symbol::new(&item.symbol);
            quotes.insert(symbol, item.into_raw_quote());
        }
        Ok(quotes)
    }
}

// ============================================================================
// Yahoo Finance API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteResponse {
    quote_response: QuoteResult,
}

#[derive(Debug, Deserialize)]
struct QuoteResult {
    #[serde(default)]
    result: Vec<QuoteItem>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteItem {
    symbol: String,
    regular_market_price: Option<f64>,
    regular_market_change: Option<f64>,
    regular_market_change_percent: Option<f64>,
    regular_market_volume: Option<u64>,
    regular_market_open: Option<f64>,
    regular_market_day_high: Option<f64>,
    regular_market_day_low: Option<f64>,
    regular_market_previous_close: Option<f64>,
    long_name: Option<String>,
    short_name: Option<String>,
    market_cap: Option<f64>,
    currency: Option<String>,
    trailing_pe: Option<f64>,
    full_exchange_name: Option<String>,
    market_state: Option<String>,
}

impl QuoteItem {
    fn into_raw_quote(self) -> RawQuote {
        let mut extra = HashMap::new();
        if let Some(exchange) = self.full_exchange_name {
            extra.insert("exchange".to_string(), serde_json::Value::String(exchange));
        }
        if let Some(state) = self.market_state {
            extra.insert("market_state".to_string(), serde_json::Value::String(state));
        }
        extra.insert(
            "fetched_at".to_string(),
            serde_json::Value::String(Utc::now().to_rfc3339()),
        );

        RawQuote {
            price: self.regular_market_price,
            change: self.regular_market_change,
            change_percent: self.regular_market_change_percent,
            volume: self.regular_market_volume,
            open: self.regular_market_open,
            day_high: self.regular_market_day_high,
            day_low: self.regular_market_day_low,
            previous_close: self.regular_market_previous_close,
            name: self.long_name.or(self.short_name),
            sector: None,
            market_cap: self.market_cap,
            currency: self.currency,
            pe_ratio: self.trailing_pe,
            extra,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_batch_url() {
        let provider = YahooQuoteProvider::new();
        let symbols = [Symbol::new("EQNR.OL"), Symbol::new("aapl")];
        let url = provider.build_quote_url(&symbols);
        assert!(url.contains("symbols=EQNR.OL,AAPL"));
    }

    #[test]
    fn provider_info() {
        let provider = YahooQuoteProvider::default();
        assert_eq!(provider.name(), "Yahoo Finance");
        assert_eq!(provider.max_batch_size(), 5);
    }

    #[test]
    fn parses_quote_payload() {
        let payload = r#"{
            "quoteResponse": {
                "result": [{
                    "symbol": "EQNR.OL",
                    "regularMarketPrice": 342.55,
                    "regularMarketChange": 2.3,
                    "regularMarketChangePercent": 0.68,
                    "regularMarketVolume": 3200000,
                    "regularMarketPreviousClose": 340.25,
                    "longName": "Equinor ASA",
                    "marketCap": 1100000000000.0,
                    "currency": "NOK",
                    "fullExchangeName": "Oslo"
                }],
                "error": null
            }
        }"#;

        let parsed: QuoteResponse = serde_json::from_str(payload).unwrap();
        assert!(parsed.quote_response.error.is_none());
        let item = parsed.quote_response.result.into_iter().next().unwrap();
        let raw = item.into_raw_quote();
        assert_eq!(raw.price, Some(342.55));
        assert_eq!(raw.name.as_deref(), Some("Equinor ASA"));
        assert_eq!(raw.currency.as_deref(), Some("NOK"));
        assert_eq!(
            raw.extra.get("exchange"),
            Some(&serde_json::Value::String("Oslo".to_string()))
        );
        assert!(raw.validate(&Symbol::new("EQNR.OL")).is_ok());
    }

    #[test]
    fn parses_api_error() {
        let payload = r#"{
            "quoteResponse": {
                "result": [],
                "error": { "code": "Bad Request", "description": "Missing symbols" }
            }
        }"#;

        let parsed: QuoteResponse = serde_json::from_str(payload).unwrap();
        let error = parsed.quote_response.error.unwrap();
        assert_eq!(error.code, "Bad Request");
    }
}
