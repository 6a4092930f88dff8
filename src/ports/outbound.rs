//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{CompletionRequest, DomainError, HeadlineItem, Position};

/// Language-model service. One prompt in, raw response text out.
#[async_trait::async_trait]
pub trait LlmPort: Send + Sync {
    /// Send a single completion request. Returns the model's text verbatim
    /// (JSON extraction is the caller's job).
    async fn complete(&self, request: &CompletionRequest) -> Result<String, DomainError>;
}

/// Headline source. Fetch recent news for a ticker.
#[async_trait::async_trait]
pub trait NewsPort: Send + Sync {
    /// Fetch up to `max_results` headlines for `symbol`, most recent first.
    ///
    /// - `company`: optional company name used to widen the query
    ///
    /// Never fails: transport or parse problems are logged and yield an empty list.
    async fn get_news(
        &self,
        symbol: &str,
        company: Option<&str>,
        max_results: usize,
    ) -> Vec<HeadlineItem>;
}

/// Brokerage portfolio source.
#[async_trait::async_trait]
pub trait PortfolioPort: Send + Sync {
    /// Return normalized, non-cash positions across all accounts.
    async fn get_positions(&self) -> Result<Vec<Position>, DomainError>;
}
