//! Inbound port. Callers invoke sentiment analysis through this.

use crate::domain::{AnalysisMap, AnalysisResult, HeadlineItem, TickerHeadlines};

/// Headline sentiment analysis. Implementations never fail: every error degrades
/// to "no analysis" (a missing key in the returned map).
#[async_trait::async_trait]
pub trait SentimentPort: Send + Sync {
    /// Analyze all tickers in one pass. Output keys are always a subset of input keys.
    async fn analyze_batch(&self, items: &TickerHeadlines) -> AnalysisMap;

    /// Single-ticker form. Falls back to [`AnalysisResult::default_neutral`] when the
    /// batch produced nothing for `ticker`.
    async fn analyze(&self, ticker: &str, headlines: &[HeadlineItem]) -> AnalysisResult {
        let mut items = TickerHeadlines::new();
        items.insert(ticker.to_string(), headlines.to_vec());
        self.analyze_batch(&items)
            .await
            .remove(ticker)
            .unwrap_or_else(AnalysisResult::default_neutral)
    }
}
