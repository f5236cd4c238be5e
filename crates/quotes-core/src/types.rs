//! Core data types for market quotes.
//!
//! This module defines the fundamental data structures:
//!
//! - [`Symbol`] - Trading symbol/ticker
//! - [`Quote`] - A single price observation
//! - [`CompanyProfile`] - Company reference information
//! - [`QuoteSnapshot`] - The schema-complete unit served to callers
//! - [`RawQuote`] - The wire record returned by providers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// A trading symbol/ticker.
///
/// Symbols are automatically uppercased on creation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    /// Creates a new symbol from a string, converting to uppercase.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().to_uppercase())
    }

    /// Returns the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for Oslo Børs listings (`.OL` suffix).
    #[must_use]
    pub fn is_oslo(&self) -> bool {
        self.0.ends_with(".OL")
    }

    /// Returns true for crypto pairs quoted in USD (`-USD` suffix).
    #[must_use]
    pub fn is_crypto(&self) -> bool {
        self.0.ends_with("-USD")
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Symbol {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// A single price observation for a symbol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Symbol this quote belongs to.
    pub symbol: Symbol,
    /// Last traded price.
    pub price: f64,
    /// Absolute change since the previous close.
    pub change: f64,
    /// Percentage change since the previous close.
    pub change_percent: f64,
    /// Trading volume.
    pub volume: u64,
    /// When the observation was made.
    pub timestamp: DateTime<Utc>,
    /// Opening price of the session.
    pub open: Option<f64>,
    /// Session high.
    pub day_high: Option<f64>,
    /// Session low.
    pub day_low: Option<f64>,
    /// Previous session close.
    pub previous_close: Option<f64>,
}

impl Quote {
    /// Creates a quote with the required fields.
    #[must_use]
    pub const fn new(
        symbol: Symbol,
        price: f64,
        change: f64,
        change_percent: f64,
        volume: u64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol,
            price,
            change,
            change_percent,
            volume,
            timestamp,
            open: None,
            day_high: None,
            day_low: None,
            previous_close: None,
        }
    }
}

/// Company reference information.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    /// Stock symbol.
    pub symbol: Symbol,
    /// Company name.
    pub name: String,
    /// Business sector.
    pub sector: String,
    /// Industry within the sector.
    pub industry: String,
    /// Market capitalization in the trading currency.
    pub market_cap: f64,
    /// Trading currency.
    pub currency: String,
    /// Trailing price-to-earnings ratio.
    pub pe_ratio: Option<f64>,
    /// Price-to-book ratio.
    pub pb_ratio: Option<f64>,
    /// Dividend yield as a fraction.
    pub dividend_yield: Option<f64>,
}

impl CompanyProfile {
    /// Creates a profile with the required fields.
    #[must_use]
    pub fn new(
        symbol: Symbol,
        name: impl Into<String>,
        sector: impl Into<String>,
        industry: impl Into<String>,
        market_cap: f64,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            symbol,
            name: name.into(),
            sector: sector.into(),
            industry: industry.into(),
            market_cap,
            currency: currency.into(),
            pe_ratio: None,
            pb_ratio: None,
            dividend_yield: None,
        }
    }

    /// Sets the valuation ratios.
    #[must_use]
    pub const fn with_ratios(
        mut self,
        pe_ratio: f64,
        pb_ratio: f64,
        dividend_yield: f64,
    ) -> Self {
        self.pe_ratio = Some(pe_ratio);
        self.pb_ratio = Some(pb_ratio);
        self.dividend_yield = Some(dividend_yield);
        self
    }
}

/// Where a snapshot's data came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Fetched from a live provider.
    Live,
    /// Deterministically synthesized fallback data.
    Synthetic,
}

/// The schema-complete quote unit served to callers.
///
/// Every field is always populated: consumers never observe a partial
/// structure just because live data was absent. Provider-specific extras
/// live in the `extra` map, never in the primary contract.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    /// The price observation.
    pub quote: Quote,
    /// Company reference data.
    pub profile: CompanyProfile,
    /// Whether this snapshot carries live or synthetic data.
    pub source: DataSource,
    /// Provider-specific extension fields.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, serde_json::Value>,
}

impl QuoteSnapshot {
    /// Returns true if this snapshot carries synthetic fallback data.
    #[must_use]
    pub fn is_synthetic(&self) -> bool {
        self.source == DataSource::Synthetic
    }

    /// Overlays a live wire record onto this snapshot.
    ///
    /// Fields present in `raw` replace the current values; everything else
    /// (typically synthetic defaults) is kept so the result stays
    /// schema-complete. The snapshot is marked [`DataSource::Live`].
    #[must_use]
    pub fn merged_with(mut self, raw: &RawQuote, as_of: DateTime<Utc>) -> Self {
        if let Some(price) = raw.price {
            self.quote.price = price;
        }
        if let Some(change) = raw.change {
            self.quote.change = change;
        }
        if let Some(change_percent) = raw.change_percent {
            self.quote.change_percent = change_percent;
        } else if let (Some(price), Some(prev)) = (raw.price, raw.previous_close) {
            if prev != 0.0 {
                self.quote.change = price - prev;
                self.quote.change_percent = (price - prev) / prev * 100.0;
            }
        }
        if let Some(volume) = raw.volume {
            self.quote.volume = volume;
        }
        self.quote.open = raw.open.or(self.quote.open);
        self.quote.day_high = raw.day_high.or(self.quote.day_high);
        self.quote.day_low = raw.day_low.or(self.quote.day_low);
        self.quote.previous_close = raw.previous_close.or(self.quote.previous_close);
        self.quote.timestamp = as_of;

        if let Some(name) = &raw.name {
            self.profile.name = name.clone();
        }
        if let Some(sector) = &raw.sector {
            self.profile.sector = sector.clone();
        }
        if let Some(market_cap) = raw.market_cap {
            self.profile.market_cap = market_cap;
        }
        if let Some(currency) = &raw.currency {
            self.profile.currency = currency.clone();
        }
        if raw.pe_ratio.is_some() {
            self.profile.pe_ratio = raw.pe_ratio;
        }

        self.extra.extend(raw.extra.clone());
        self.source = DataSource::Live;
        self
    }
}

/// The wire record returned by a provider for one symbol.
///
/// All fields are optional; [`RawQuote::validate`] decides whether the
/// record is usable. Unknown provider fields are preserved in `extra`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawQuote {
    /// Last traded price.
    pub price: Option<f64>,
    /// Absolute change since the previous close.
    pub change: Option<f64>,
    /// Percentage change since the previous close.
    pub change_percent: Option<f64>,
    /// Trading volume.
    pub volume: Option<u64>,
    /// Session open.
    pub open: Option<f64>,
    /// Session high.
    pub day_high: Option<f64>,
    /// Session low.
    pub day_low: Option<f64>,
    /// Previous session close.
    pub previous_close: Option<f64>,
    /// Company name.
    pub name: Option<String>,
    /// Business sector.
    pub sector: Option<String>,
    /// Market capitalization.
    pub market_cap: Option<f64>,
    /// Trading currency.
    pub currency: Option<String>,
    /// Trailing price-to-earnings ratio.
    pub pe_ratio: Option<f64>,
    /// Provider-specific extension fields.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl RawQuote {
    /// Checks that the record carries the fields required to be usable.
    ///
    /// A record without a positive price is malformed and is treated as a
    /// provider failure, never passed through partially.
    pub fn validate(&self, symbol: &Symbol) -> crate::error::Result<()> {
        match self.price {
            Some(p) if p.is_finite() && p > 0.0 => Ok(()),
            Some(p) => Err(crate::error::QuoteError::Incomplete {
                symbol: symbol.to_string(),
                reason: format!("non-positive price {p}"),
            }),
            None => Err(crate::error::QuoteError::Incomplete {
                symbol: symbol.to_string(),
                reason: "missing price".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_uppercases() {
        assert_eq!(Symbol::new("eqnr.ol").as_str(), "EQNR.OL");
        assert!(Symbol::new("eqnr.ol").is_oslo());
        assert!(Symbol::new("btc-usd").is_crypto());
    }

    #[test]
    fn raw_quote_requires_price() {
        let symbol = Symbol::new("AAPL");
        let raw = RawQuote::default();
        assert!(raw.validate(&symbol).is_err());

        let raw = RawQuote {
            price: Some(185.7),
            ..Default::default()
        };
        assert!(raw.validate(&symbol).is_ok());

        let raw = RawQuote {
            price: Some(-1.0),
            ..Default::default()
        };
        assert!(raw.validate(&symbol).is_err());
    }

    #[test]
    fn merge_overlays_live_fields() {
        let symbol = Symbol::new("AAPL");
        let as_of = Utc::now();
        let base = QuoteSnapshot {
            quote: Quote::new(symbol.clone(), 100.0, 1.0, 1.0, 500, as_of),
            profile: CompanyProfile::new(
                symbol.clone(),
                "Apple Inc.",
                "Technology",
                "Consumer Electronics",
                1.0e12,
                "USD",
            ),
            source: DataSource::Synthetic,
            extra: HashMap::new(),
        };

        let raw = RawQuote {
            price: Some(186.0),
            previous_close: Some(184.0),
            volume: Some(42_000_000),
            ..Default::default()
        };

        let merged = base.merged_with(&raw, as_of);
        assert_eq!(merged.source, DataSource::Live);
        assert_eq!(merged.quote.price, 186.0);
        assert_eq!(merged.quote.volume, 42_000_000);
        // change derived from previous close when the provider omits it
        assert!((merged.quote.change - 2.0).abs() < 1e-9);
        // synthetic profile kept where the provider had nothing
        assert_eq!(merged.profile.name, "Apple Inc.");
    }
}
