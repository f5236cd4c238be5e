#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/aksjeradar/quotes/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! In-memory TTL caching for the quote access layer.
//!
//! This crate provides [`TtlCache`], a concurrency-safe key/value store with
//! per-entry expiry and no eviction policy beyond TTL.

/// In-memory TTL cache implementation.
pub mod memory;

pub use memory::TtlCache;
