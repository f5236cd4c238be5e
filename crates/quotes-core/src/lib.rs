#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/aksjeradar/quotes/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for the quote access layer.
//!
//! This crate provides the foundational abstractions shared by the rest of
//! the workspace:
//!
//! - [`QuoteProvider`](provider::QuoteProvider) - Batched live-quote source
//! - [`QuoteSnapshot`](types::QuoteSnapshot) - Schema-complete quote unit
//! - [`QuoteError`](error::QuoteError) - Shared error type
//! - [`Category`](category::Category) - Watch-list market categories

/// Market categories used for watch-lists.
pub mod category;
/// Error types for quote operations.
pub mod error;
/// Provider trait for fetching live quotes.
pub mod provider;
/// Core data types (Symbol, Quote, QuoteSnapshot, etc.).
pub mod types;

// Re-export commonly used items at crate root
pub use category::Category;
pub use error::{QuoteError, Result};
pub use provider::QuoteProvider;
pub use types::{CompanyProfile, DataSource, Quote, QuoteSnapshot, RawQuote, Symbol};
