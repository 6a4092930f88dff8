//! Domain entities. Pure data structures for the core business.
//!
//! No HTTP/IO types here; adapters map provider payloads into these.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single news headline for a ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadlineItem {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl HeadlineItem {
    pub fn new(title: impl Into<String>, link: Option<String>) -> Self {
        Self {
            title: title.into(),
            link,
        }
    }
}

/// Ticker symbol -> headlines, in the order the news source returned them (most recent first).
pub type TickerHeadlines = BTreeMap<String, Vec<HeadlineItem>>;

/// Ticker symbol -> analysis. A missing key means "no analysis available".
pub type AnalysisMap = BTreeMap<String, AnalysisResult>;

/// Coarse three-way classification of news tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    /// Case-insensitive parse of a model-supplied label. Anything outside the
    /// three known labels yields `None`.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "positive" => Some(Self::Positive),
            "neutral" => Some(Self::Neutral),
            "negative" => Some(Self::Negative),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }

    /// Capitalized label for reports ("Positive").
    pub fn label(&self) -> &'static str {
        match self {
            Self::Positive => "Positive",
            Self::Neutral => "Neutral",
            Self::Negative => "Negative",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured LLM analysis for one ticker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary_bullets: Vec<String>,
    /// `None` when the model omitted the label or returned an unknown one.
    pub sentiment: Option<Sentiment>,
    pub reasons: Vec<String>,
}

impl AnalysisResult {
    /// Fallback used by the single-ticker convenience call.
    pub fn default_neutral() -> Self {
        Self {
            summary_bullets: Vec::new(),
            sentiment: Some(Sentiment::Neutral),
            reasons: Vec::new(),
        }
    }
}

/// A normalized brokerage position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub ticker: String,
    pub quantity: f64,
    pub average_cost: Option<f64>,
    pub last_price: Option<f64>,
    pub account_id: Option<String>,
    /// Company name, when the brokerage supplies one. Used to sharpen news queries.
    pub description: Option<String>,
}

/// Request envelope for the language-model service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// Rendered digest handed to reporters.
#[derive(Debug, Clone)]
pub struct Report {
    pub subject: String,
    pub html: String,
    pub plaintext: String,
    pub tickers: Vec<String>,
    pub positions: Vec<Position>,
    pub analysis: AnalysisMap,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentiment_parse_is_lenient_on_case_and_whitespace() {
        assert_eq!(Sentiment::parse("positive"), Some(Sentiment::Positive));
        assert_eq!(Sentiment::parse(" Negative "), Some(Sentiment::Negative));
        assert_eq!(Sentiment::parse("NEUTRAL"), Some(Sentiment::Neutral));
        assert_eq!(Sentiment::parse("bullish"), None);
        assert_eq!(Sentiment::parse(""), None);
    }

    #[test]
    fn test_sentiment_serde_lowercase() {
        let json = serde_json::to_string(&Sentiment::Positive).unwrap();
        assert_eq!(json, "\"positive\"");
    }

    #[test]
    fn test_default_neutral() {
        let r = AnalysisResult::default_neutral();
        assert!(r.summary_bullets.is_empty());
        assert!(r.reasons.is_empty());
        assert_eq!(r.sentiment, Some(Sentiment::Neutral));
    }
}
