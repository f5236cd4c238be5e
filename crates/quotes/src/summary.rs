//! Aggregate views computed over cached snapshots.

use chrono::{DateTime, Utc};
use serde::Serialize;

use quotes_core::{Category, QuoteSnapshot};

/// Aggregates for one market category.
#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    /// The category summarized.
    pub category: Category,
    /// Snapshots the aggregates were computed over.
    pub count: usize,
    /// How many of them carry synthetic fallback data.
    pub synthetic_count: usize,
    /// Mean percentage change across the category.
    pub average_change_percent: f64,
    /// Symbol with the largest positive percentage move, if any.
    pub top_gainer: Option<QuoteSnapshot>,
    /// Symbol with the largest negative percentage move, if any.
    pub top_loser: Option<QuoteSnapshot>,
}

/// Cross-category market overview.
#[derive(Debug, Clone, Serialize)]
pub struct MarketSummary {
    /// One entry per known category, in declaration order.
    pub categories: Vec<CategorySummary>,
    /// When the summary was computed.
    pub generated_at: DateTime<Utc>,
}

/// Computes the aggregates for one category.
///
/// Only currently cached snapshots participate; an empty slice yields a
/// zeroed summary rather than an error.
pub(crate) fn summarize(category: Category, snapshots: &[QuoteSnapshot]) -> CategorySummary {
    let count = snapshots.len();
    let synthetic_count = snapshots.iter().filter(|s| s.is_synthetic()).count();
    let average_change_percent = if count == 0 {
        0.0
    } else {
        snapshots.iter().map(|s| s.quote.change_percent).sum::<f64>() / count as f64
    };

    let top_gainer = snapshots
        .iter()
        .filter(|s| s.quote.change_percent > 0.0)
        .max_by(|a, b| {
            a.quote
                .change_percent
                .partial_cmp(&b.quote.change_percent)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .cloned();
    let top_loser = snapshots
        .iter()
        .filter(|s| s.quote.change_percent < 0.0)
        .min_by(|a, b| {
            a.quote
                .change_percent
                .partial_cmp(&b.quote.change_percent)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .cloned();

    CategorySummary {
        category,
        count,
        synthetic_count,
        average_change_percent,
        top_gainer,
        top_loser,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use quotes_core::Symbol;

    fn snapshot(symbol: &str, change_percent: f64) -> QuoteSnapshot {
        let mut s = quotes_fallback::synthesize(&Symbol::new(symbol), Utc::now());
        s.quote.change_percent = change_percent;
        s
    }

    #[test]
    fn empty_category_is_zeroed() {
        let summary = summarize(Category::Crypto, &[]);
        assert_eq!(summary.count, 0);
        assert_eq!(summary.average_change_percent, 0.0);
        assert!(summary.top_gainer.is_none());
        assert!(summary.top_loser.is_none());
    }

    #[test]
    fn gainer_and_loser_selection() {
        let snapshots = vec![
            snapshot("EQNR.OL", 2.5),
            snapshot("DNB.OL", -1.0),
            snapshot("TEL.OL", 0.5),
            snapshot("YAR.OL", -3.2),
        ];
        let summary = summarize(Category::Domestic, &snapshots);
        assert_eq!(summary.count, 4);
        assert_eq!(
            summary.top_gainer.unwrap().quote.symbol,
            Symbol::new("EQNR.OL")
        );
        assert_eq!(
            summary.top_loser.unwrap().quote.symbol,
            Symbol::new("YAR.OL")
        );
        assert!((summary.average_change_percent - (-0.3)).abs() < 1e-9);
    }

    #[test]
    fn flat_market_has_no_movers() {
        let snapshots = vec![snapshot("AAPL", 0.0), snapshot("MSFT", 0.0)];
        let summary = summarize(Category::Global, &snapshots);
        assert!(summary.top_gainer.is_none());
        assert!(summary.top_loser.is_none());
    }
}
