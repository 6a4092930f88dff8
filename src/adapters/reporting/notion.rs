//! Notion adapter. Implements ReporterPort by creating one page per report in a database.
//!
//! The database is expected to define `Name` (title), `Date` (date) and `Tickers` (multi-select).

use crate::domain::{AnalysisResult, DomainError, Report};
use crate::ports::ReporterPort;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

const NOTION_PAGES_URL: &str = "https://api.notion.com/v1/pages";
const NOTION_BLOCKS_URL: &str = "https://api.notion.com/v1/blocks";
const NOTION_VERSION: &str = "2022-06-28";
/// Notion accepts at most this many blocks per `children` array.
pub const MAX_BLOCKS_PER_REQUEST: usize = 100;

/// Notion API adapter for saving digests.
///
/// Requires an integration token and the target database ID. The database must
/// be shared with the integration.
pub struct NotionReporter {
    client: Client,
    api_key: String,
    database_id: String,
}

impl NotionReporter {
    /// Create a new Notion reporter.
    ///
    /// # Arguments
    /// * `api_key` - Internal integration token
    /// * `database_id` - ID of the database pages are created in
    pub fn new(api_key: String, database_id: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            database_id,
        }
    }

    /// Page title: "Trading News Report - ACME, BETA - 2024-01-31".
    pub fn page_title(report: &Report) -> String {
        let scope = if report.tickers.is_empty() {
            "Portfolio".to_string()
        } else {
            report.tickers.join(", ")
        };
        format!(
            "Trading News Report - {} - {}",
            scope,
            report.generated_at.format("%Y-%m-%d")
        )
    }

    /// Every content block of the page, in order.
    pub fn page_blocks(report: &Report) -> Vec<Value> {
        report
            .analysis
            .iter()
            .flat_map(|(symbol, result)| ticker_blocks(symbol, result))
            .collect()
    }

    /// `pages.create` request body carrying the first chunk of `blocks`.
    /// The rest must be appended with [`Self::append_payloads`].
    pub fn page_payload(database_id: &str, report: &Report, blocks: &[Value]) -> Value {
        let tickers: Vec<Value> = report
            .tickers
            .iter()
            .map(|t| json!({ "name": t }))
            .collect();
        let first = &blocks[..blocks.len().min(MAX_BLOCKS_PER_REQUEST)];

        json!({
            "parent": { "database_id": database_id },
            "properties": {
                "Name": { "title": [ { "text": { "content": Self::page_title(report) } } ] },
                "Date": { "date": { "start": report.generated_at.to_rfc3339() } },
                "Tickers": { "multi_select": tickers },
            },
            "children": first,
        })
    }

    /// Bodies for `PATCH /v1/blocks/{page_id}/children`, one per chunk after the first.
    pub fn append_payloads(blocks: &[Value]) -> Vec<Value> {
        blocks
            .chunks(MAX_BLOCKS_PER_REQUEST)
            .skip(1)
            .map(|chunk| json!({ "children": chunk }))
            .collect()
    }

    async fn append_blocks(&self, page_id: &str, body: &Value) -> Result<(), DomainError> {
        let res = self
            .client
            .patch(format!("{}/{}/children", NOTION_BLOCKS_URL, page_id))
            .bearer_auth(&self.api_key)
            .header("Notion-Version", NOTION_VERSION)
            .json(body)
            .send()
            .await
            .map_err(|e| DomainError::Delivery(format!("Request failed: {}", e)))?;
        check_status(res).await.map(|_| ())
    }
}

/// Turn a non-2xx response into `DomainError::Delivery`.
async fn check_status(res: reqwest::Response) -> Result<reqwest::Response, DomainError> {
    if res.status().is_success() {
        return Ok(res);
    }
    let status = res.status();
    let text = res.text().await.unwrap_or_else(|_| "unknown".to_string());
    warn!(status = %status, body = %text, "Notion API returned error");
    Err(DomainError::Delivery(format!(
        "Notion API error {}: {}",
        status,
        text.chars().take(200).collect::<String>()
    )))
}

fn rich_text(content: &str) -> Value {
    json!([ { "type": "text", "text": { "content": content } } ])
}

fn block(kind: &str, content: &str) -> Value {
    json!({ "object": "block", "type": kind, kind: { "rich_text": rich_text(content) } })
}

/// Heading, badge, two columns (bullets | short summary), divider.
fn ticker_blocks(symbol: &str, result: &AnalysisResult) -> Vec<Value> {
    let mut blocks = vec![block("heading_2", symbol)];

    if let Some(s) = result.sentiment {
        let badge = match s {
            crate::domain::Sentiment::Positive => "🟢",
            crate::domain::Sentiment::Neutral => "⚪",
            crate::domain::Sentiment::Negative => "🔴",
        };
        blocks.push(block("paragraph", &format!("{} {}", badge, s.label())));
    }

    let mut left = vec![block("heading_3", "News Analysis")];
    left.extend(
        result
            .summary_bullets
            .iter()
            .map(|b| block("bulleted_list_item", b)),
    );

    let short_summary = result
        .summary_bullets
        .iter()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    let mut overall = format!(
        "Overall sentiment: {}",
        result.sentiment.map(|s| s.label()).unwrap_or("N/A")
    );
    if let Some(first) = result.reasons.first() {
        overall.push_str(&format!(" (because: {})", first));
    }
    let right = vec![
        block("paragraph", "Summary:"),
        block("paragraph", &short_summary),
        block("paragraph", &overall),
    ];

    blocks.push(json!({
        "object": "block",
        "type": "column_list",
        "column_list": {
            "children": [
                { "object": "block", "type": "column", "column": { "children": left } },
                { "object": "block", "type": "column", "column": { "children": right } },
            ]
        }
    }));
    blocks.push(json!({ "object": "block", "type": "divider", "divider": {} }));
    blocks
}

#[async_trait::async_trait]
impl ReporterPort for NotionReporter {
    fn name(&self) -> &str {
        "notion"
    }

    async fn send_report(&self, report: &Report) -> Result<(), DomainError> {
        let blocks = Self::page_blocks(report);
        let body = Self::page_payload(&self.database_id, report, &blocks);
        let appends = Self::append_payloads(&blocks);

        let res = self
            .client
            .post(NOTION_PAGES_URL)
            .bearer_auth(&self.api_key)
            .header("Notion-Version", NOTION_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::Delivery(format!("Request failed: {}", e)))?;
        let res = check_status(res).await?;

        let page: Value = res.json().await.unwrap_or(Value::Null);
        let Some(page_id) = page.get("id").and_then(Value::as_str) else {
            if appends.is_empty() {
                info!("saved report to Notion (no id returned)");
                return Ok(());
            }
            return Err(DomainError::Delivery(format!(
                "Notion page created without id; {} blocks not appended",
                blocks.len() - MAX_BLOCKS_PER_REQUEST
            )));
        };

        for (i, chunk) in appends.iter().enumerate() {
            debug!(page_id, chunk = i + 1, total = appends.len(), "appending blocks");
            self.append_blocks(page_id, chunk).await?;
        }
        info!(page_id, blocks = blocks.len(), "saved report to Notion");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AnalysisMap, Sentiment};
    use chrono::{TimeZone, Utc};

    fn report(tickers: &[&str], analysis: AnalysisMap) -> Report {
        Report {
            subject: "s".to_string(),
            html: String::new(),
            plaintext: String::new(),
            tickers: tickers.iter().map(|t| t.to_string()).collect(),
            positions: vec![],
            analysis,
            generated_at: Utc.with_ymd_and_hms(2024, 1, 31, 8, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_page_title() {
        assert_eq!(
            NotionReporter::page_title(&report(&["ACME", "BETA"], AnalysisMap::new())),
            "Trading News Report - ACME, BETA - 2024-01-31"
        );
        assert_eq!(
            NotionReporter::page_title(&report(&[], AnalysisMap::new())),
            "Trading News Report - Portfolio - 2024-01-31"
        );
    }

    #[test]
    fn test_page_payload_blocks() {
        let mut analysis = AnalysisMap::new();
        analysis.insert(
            "ACME".to_string(),
            AnalysisResult {
                summary_bullets: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                sentiment: Some(Sentiment::Negative),
                reasons: vec!["lawsuit".into(), "second".into()],
            },
        );
        let report = report(&["ACME"], analysis);
        let body = NotionReporter::page_payload("db-1", &report, &NotionReporter::page_blocks(&report));

        assert_eq!(body["parent"]["database_id"], "db-1");
        assert_eq!(body["properties"]["Tickers"]["multi_select"][0]["name"], "ACME");

        let children = body["children"].as_array().unwrap();
        // heading, badge, columns, divider
        assert_eq!(children.len(), 4);
        assert_eq!(children[0]["heading_2"]["rich_text"][0]["text"]["content"], "ACME");
        assert_eq!(children[1]["paragraph"]["rich_text"][0]["text"]["content"], "🔴 Negative");

        let right = &children[2]["column_list"]["children"][1]["column"]["children"];
        assert_eq!(right[1]["paragraph"]["rich_text"][0]["text"]["content"], "a, b, c");
        assert_eq!(
            right[2]["paragraph"]["rich_text"][0]["text"]["content"],
            "Overall sentiment: Negative (because: lawsuit)"
        );
        assert_eq!(children[3]["type"], "divider");
    }

    #[test]
    fn test_page_payload_without_analysis_has_no_children() {
        let report = report(&[], AnalysisMap::new());
        let body = NotionReporter::page_payload("db-1", &report, &NotionReporter::page_blocks(&report));
        assert!(body["children"].as_array().unwrap().is_empty());
        assert!(body["properties"]["Tickers"]["multi_select"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_large_report_is_split_into_block_chunks() {
        let mut analysis = AnalysisMap::new();
        let tickers: Vec<String> = (0..30).map(|i| format!("T{:02}", i)).collect();
        for t in &tickers {
            analysis.insert(
                t.clone(),
                AnalysisResult {
                    summary_bullets: vec!["x".into()],
                    sentiment: Some(Sentiment::Positive),
                    reasons: vec![],
                },
            );
        }
        let names: Vec<&str> = tickers.iter().map(String::as_str).collect();
        let report = report(&names, analysis);

        let blocks = NotionReporter::page_blocks(&report);
        assert_eq!(blocks.len(), 120);

        let body = NotionReporter::page_payload("db-1", &report, &blocks);
        assert_eq!(body["children"].as_array().unwrap().len(), MAX_BLOCKS_PER_REQUEST);

        let appends = NotionReporter::append_payloads(&blocks);
        assert_eq!(appends.len(), 1);
        assert_eq!(appends[0]["children"].as_array().unwrap().len(), 20);
        assert_eq!(appends[0]["children"][0], blocks[100]);
    }

    #[test]
    fn test_small_report_needs_no_append() {
        let report = report(&[], AnalysisMap::new());
        assert!(NotionReporter::append_payloads(&NotionReporter::page_blocks(&report)).is_empty());
    }
}
