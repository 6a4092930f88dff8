//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("AI analysis failed: {0}")]
    Ai(String),

    #[error("News fetch failed: {0}")]
    News(String),

    #[error("Portfolio error: {0}")]
    Portfolio(String),

    #[error("Report rendering failed: {0}")]
    Report(String),

    #[error("Report delivery failed: {0}")]
    Delivery(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
