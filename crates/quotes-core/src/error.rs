//! Error types for quote operations.
//!
//! This module defines [`QuoteError`] which covers all error cases that can
//! occur when fetching, validating, or caching market quotes.

use thiserror::Error;

/// Errors that can occur during quote operations.
#[derive(Error, Debug)]
pub enum QuoteError {
    /// Network-related errors (connection failures, timeouts, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// Explicit throttling signal from a provider.
    #[error("Rate limited by {provider}: retry after {retry_after:?}")]
    RateLimited {
        /// The provider that rate limited the request.
        provider: String,
        /// Suggested time to wait before retrying.
        retry_after: Option<std::time::Duration>,
    },

    /// The circuit breaker for a provider is open; no call was attempted.
    #[error("Circuit open for {provider}: retry after {retry_after:?}")]
    CircuitOpen {
        /// The provider whose breaker is open.
        provider: String,
        /// Remaining cooldown before the breaker re-checks.
        retry_after: std::time::Duration,
    },

    /// The requested symbol was not found.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// A provider response was missing required fields.
    #[error("Incomplete quote for {symbol}: {reason}")]
    Incomplete {
        /// The symbol whose payload was incomplete.
        symbol: String,
        /// What was missing or malformed.
        reason: String,
    },

    /// Error parsing data from a provider.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The requested provider is not configured.
    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl QuoteError {
    /// Returns true if retrying the operation could plausibly succeed.
    ///
    /// Transient network failures, provider throttling, and malformed
    /// payloads are retryable; unknown symbols and misconfiguration are not.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network(_)
                | Self::RateLimited { .. }
                | Self::Incomplete { .. }
                | Self::Parse(_)
                | Self::Other(_)
        )
    }

    /// Returns true if this error is an explicit throttling signal.
    ///
    /// Throttling is counted as a stronger failure by the circuit breaker
    /// since retrying immediately only makes throttling worse.
    #[must_use]
    pub const fn is_throttle(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

/// Result type alias using [`QuoteError`].
pub type Result<T> = std::result::Result<T, QuoteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(QuoteError::Network("reset".into()).is_transient());
        assert!(
            QuoteError::RateLimited {
                provider: "yahoo".into(),
                retry_after: None,
            }
            .is_transient()
        );
        assert!(!QuoteError::SymbolNotFound("XX".into()).is_transient());
        assert!(!QuoteError::ProviderNotConfigured("yahoo".into()).is_transient());
    }

    #[test]
    fn throttle_classification() {
        assert!(
            QuoteError::RateLimited {
                provider: "yahoo".into(),
                retry_after: None,
            }
            .is_throttle()
        );
        assert!(!QuoteError::Network("reset".into()).is_throttle());
    }
}
