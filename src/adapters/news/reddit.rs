//! Reddit search adapter. Uses the public `search.json` endpoint (no OAuth).
//!
//! Conservative on request volume: two small queries per ticker.

use crate::domain::{DomainError, HeadlineItem};
use crate::ports::NewsPort;
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

const REDDIT_SEARCH_URL: &str = "https://www.reddit.com/search.json";
pub const DEFAULT_USER_AGENT: &str = concat!("news-digest/", env!("CARGO_PKG_VERSION"));

/// Reddit search adapter. Reddit rejects requests without a User-Agent.
pub struct RedditSearch {
    client: reqwest::Client,
}

impl RedditSearch {
    pub fn new(user_agent: Option<&str>, timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent.unwrap_or(DEFAULT_USER_AGENT))
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::Config(format!("HTTP client build failed: {}", e)))?;
        Ok(Self { client })
    }

    /// The two queries issued per ticker: exact symbol and cashtag.
    pub fn queries(symbol: &str) -> [String; 2] {
        [format!("\"{}\"", symbol), format!("${}", symbol)]
    }

    /// Extract posts from a search listing.
    pub fn parse_listing(data: &Value, limit: usize) -> Vec<HeadlineItem> {
        let Some(children) = data
            .get("data")
            .and_then(|d| d.get("children"))
            .and_then(Value::as_array)
        else {
            return Vec::new();
        };

        children
            .iter()
            .filter_map(|child| child.get("data"))
            .filter_map(|post| {
                let title = post
                    .get("title")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .or_else(|| {
                        post.get("selftext")
                            .and_then(Value::as_str)
                            .map(str::trim)
                            .filter(|t| !t.is_empty())
                    })?;
                let link = post
                    .get("url")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|u| !u.is_empty())
                    .map(String::from);
                Some(HeadlineItem::new(title, link))
            })
            .take(limit)
            .collect()
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<HeadlineItem>, DomainError> {
        let limit_param = limit.to_string();
        let data: Value = self
            .client
            .get(REDDIT_SEARCH_URL)
            .query(&[("q", query), ("sort", "new"), ("limit", limit_param.as_str())])
            .send()
            .await
            .map_err(|e| DomainError::News(format!("request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| DomainError::News(format!("bad status: {}", e)))?
            .json()
            .await
            .map_err(|e| DomainError::News(format!("parse listing: {}", e)))?;
        Ok(Self::parse_listing(&data, limit))
    }
}

#[async_trait::async_trait]
impl NewsPort for RedditSearch {
    async fn get_news(
        &self,
        symbol: &str,
        _company: Option<&str>,
        max_results: usize,
    ) -> Vec<HeadlineItem> {
        let queries = Self::queries(symbol);
        let per_query = (max_results / queries.len()).max(3);
        let mut seen = HashSet::new();
        let mut out = Vec::new();

        for q in &queries {
            debug!(symbol, query = %q, "searching reddit");
            let items = match self.search(q, per_query).await {
                Ok(items) => items,
                Err(e) => {
                    warn!(symbol, query = %q, error = %e, "reddit search failed");
                    continue;
                }
            };
            for item in items {
                if out.len() >= max_results {
                    break;
                }
                if seen.insert(item.title.clone()) {
                    out.push(item);
                }
            }
        }

        info!(symbol, items = out.len(), "collected reddit posts");
        out
    }
}
