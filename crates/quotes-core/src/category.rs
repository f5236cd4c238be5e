//! Market categories used for watch-lists and snapshot queries.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::QuoteError;

/// Market category of a watched symbol group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Home-market equities (Oslo Børs in the default watch-lists).
    Domestic,
    /// Global equities.
    Global,
    /// Cryptocurrencies.
    Crypto,
}

impl Category {
    /// All categories, in sweep order.
    pub const ALL: [Self; 3] = [Self::Domestic, Self::Global, Self::Crypto];

    /// Returns the canonical lowercase name of this category.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Domestic => "domestic",
            Self::Global => "global",
            Self::Crypto => "crypto",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = QuoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "domestic" => Ok(Self::Domestic),
            "global" => Ok(Self::Global),
            "crypto" => Ok(Self::Crypto),
            other => Err(QuoteError::InvalidParameter(format!(
                "Unknown category: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_names() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
    }

    #[test]
    fn rejects_unknown() {
        assert!("bonds".parse::<Category>().is_err());
    }
}
