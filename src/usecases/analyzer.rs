//! Batch sentiment analyzer. One LLM call covers every ticker in the portfolio.
//!
//! Flow:
//! 1. Normalize headlines into per-ticker sections (drop blanks, cap titles/links)
//! 2. Build a single JSON-only prompt
//! 3. Send it through `LlmPort`
//! 4. Parse: strict, then first-`{`-to-last-`}` salvage, then give up
//!
//! Never returns an error. Every failure degrades to an empty (or partial) map.

use crate::domain::{AnalysisMap, AnalysisResult, CompletionRequest, Sentiment, TickerHeadlines};
use crate::ports::{LlmPort, SentimentPort};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MAX_TITLES_PER_TICKER: usize = 12;
pub const DEFAULT_MAX_LINKS_PER_TICKER: usize = 2;
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 800;

/// Max characters of raw model output copied into warn-level logs.
const LOG_EXCERPT_CHARS: usize = 200;

/// Tunables for the batch request.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerSettings {
    pub model: String,
    pub max_titles_per_ticker: usize,
    /// Links are supplementary context only; they do not need to line up with titles.
    pub max_links_per_ticker: usize,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_titles_per_ticker: DEFAULT_MAX_TITLES_PER_TICKER,
            max_links_per_ticker: DEFAULT_MAX_LINKS_PER_TICKER,
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

/// One ticker's normalized prompt input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub symbol: String,
    pub headlines: Vec<String>,
    pub links: Vec<String>,
}

/// LLM-backed implementation of [`SentimentPort`].
pub struct BatchAnalyzer {
    llm: Arc<dyn LlmPort>,
    settings: AnalyzerSettings,
}

impl BatchAnalyzer {
    /// Create a new analyzer.
    ///
    /// # Arguments
    /// * `llm` - LLM port implementation (OpenAI-compatible, Mock, etc.)
    /// * `settings` - Model name, truncation limits and sampling parameters
    pub fn new(llm: Arc<dyn LlmPort>, settings: AnalyzerSettings) -> Self {
        Self { llm, settings }
    }

    pub fn settings(&self) -> &AnalyzerSettings {
        &self.settings
    }

    /// Drop unusable entries and truncate the rest.
    pub fn build_sections(&self, items: &TickerHeadlines) -> Vec<Section> {
        let mut sections = Vec::new();

        for (symbol, articles) in items {
            if symbol.trim().is_empty() || articles.is_empty() {
                continue;
            }

            let mut headlines = Vec::new();
            let mut links = Vec::new();
            for article in articles {
                if headlines.len() >= self.settings.max_titles_per_ticker {
                    break;
                }
                let title = article.title.trim();
                if title.is_empty() {
                    continue;
                }
                headlines.push(title.to_string());
                if let Some(link) = article.link.as_deref().map(str::trim) {
                    if !link.is_empty() {
                        links.push(link.to_string());
                    }
                }
            }
            links.truncate(self.settings.max_links_per_ticker);

            if headlines.is_empty() {
                debug!(symbol = %symbol, "no usable headlines, skipping ticker");
                continue;
            }

            debug!(
                symbol = %symbol,
                headlines = headlines.len(),
                links = links.len(),
                "prepared section"
            );
            sections.push(Section {
                symbol: symbol.clone(),
                headlines,
                links,
            });
        }

        sections
    }

    /// Build the single instruction covering every section.
    pub fn build_prompt(sections: &[Section]) -> String {
        let body: Vec<String> = sections.iter().map(Self::render_section).collect();

        format!(
            "You are a financial news analyst. Treat each ticker independently.\n\
             For EVERY ticker below, do BOTH:\n  \
             1) Summarize the likely impact of its headlines in 3-5 concise bullets\n  \
             2) Give one overall sentiment from {{positive|neutral|negative}} with 1-2 brief reasons\n\n\
             Return ONLY valid minified JSON (no prose, no markdown, no code fences) with exactly this shape:\n\
             {{\"results\":[{{\"symbol\":\"<TICKER>\",\"summary_bullets\":[\"...\"],\
             \"sentiment\":\"positive|neutral|negative\",\"reasons\":[\"...\"]}}]}}\n\n\
             SECTIONS:\n{}",
            body.join("\n")
        )
    }

    fn render_section(section: &Section) -> String {
        let mut out = format!("### Ticker: {}\nHeadlines:\n", section.symbol);
        for h in &section.headlines {
            out.push_str(&format!("- {}\n", h));
        }
        if !section.links.is_empty() {
            out.push_str("Top sources:\n");
            for l in &section.links {
                out.push_str(&format!("- {}\n", l));
            }
        }
        out
    }

    /// Strict parse, then one salvage attempt on the outermost brace pair.
    pub fn parse_response(raw: &str) -> Option<Value> {
        if let Ok(v) = serde_json::from_str::<Value>(raw) {
            return Some(v);
        }

        let start = raw.find('{')?;
        let end = raw.rfind('}')?;
        if end <= start {
            return None;
        }
        let snippet = &raw[start..=end];
        debug!(len = snippet.len(), "attempting trimmed JSON parse");
        match serde_json::from_str::<Value>(snippet) {
            Ok(v) => Some(v),
            Err(e) => {
                debug!(error = %e, "trimmed JSON parse failed");
                None
            }
        }
    }

    /// Map parsed `results` rows onto input tickers.
    fn collect_results(data: &Value, sections: &[Section]) -> AnalysisMap {
        let mut out = AnalysisMap::new();

        let Some(rows) = data.get("results").and_then(Value::as_array) else {
            warn!("model response has no \"results\" array; treating as zero results");
            return out;
        };

        for row in rows {
            let Some(symbol) = row
                .get("symbol")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
            else {
                debug!("dropping result entry without symbol");
                continue;
            };

            let Some(ticker) = resolve_ticker(symbol, sections) else {
                warn!(symbol, "dropping result for ticker that was not requested");
                continue;
            };

            let sentiment = match row.get("sentiment").and_then(Value::as_str) {
                Some(label) => {
                    let parsed = Sentiment::parse(label);
                    if parsed.is_none() {
                        debug!(symbol, label, "unrecognized sentiment label");
                    }
                    parsed
                }
                None => None,
            };

            out.insert(
                ticker.to_string(),
                AnalysisResult {
                    summary_bullets: string_list(row.get("summary_bullets")),
                    sentiment,
                    reasons: string_list(row.get("reasons")),
                },
            );
        }

        out
    }
}

/// Exact match first, then ASCII case-insensitive. Returns the input's spelling.
fn resolve_ticker<'a>(symbol: &str, sections: &'a [Section]) -> Option<&'a str> {
    sections
        .iter()
        .find(|s| s.symbol == symbol)
        .or_else(|| {
            sections
                .iter()
                .find(|s| s.symbol.trim().eq_ignore_ascii_case(symbol))
        })
        .map(|s| s.symbol.as_str())
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn excerpt(raw: &str) -> String {
    raw.chars().take(LOG_EXCERPT_CHARS).collect()
}

#[async_trait::async_trait]
impl SentimentPort for BatchAnalyzer {
    async fn analyze_batch(&self, items: &TickerHeadlines) -> AnalysisMap {
        let sections = self.build_sections(items);
        if sections.is_empty() {
            debug!(tickers = items.len(), "no usable headlines; skipping LLM call");
            return AnalysisMap::new();
        }

        let prompt = Self::build_prompt(&sections);
        debug!(prompt_len = prompt.len(), "built batch prompt");
        trace!(prompt = %prompt, "batch prompt");

        let request = CompletionRequest {
            model: self.settings.model.clone(),
            prompt,
            temperature: self.settings.temperature,
            max_output_tokens: self.settings.max_output_tokens,
        };

        info!(
            sections = sections.len(),
            model = %request.model,
            "sending batch sentiment request"
        );

        let raw = match self.llm.complete(&request).await {
            Ok(raw) => raw,
            Err(e) => {
                error!(
                    error = %e,
                    sections = sections.len(),
                    model = %request.model,
                    "LLM request failed"
                );
                return AnalysisMap::new();
            }
        };

        debug!(raw_len = raw.len(), "received LLM response");
        trace!(raw = %raw, "raw LLM response");

        let Some(data) = Self::parse_response(&raw) else {
            warn!(
                raw_len = raw.len(),
                excerpt = %excerpt(&raw),
                "failed to parse LLM JSON response"
            );
            return AnalysisMap::new();
        };

        let out = Self::collect_results(&data, &sections);
        info!(
            requested = sections.len(),
            analyzed = out.len(),
            "batch sentiment analysis complete"
        );
        out
    }
}
