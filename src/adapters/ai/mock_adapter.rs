//! Mock LLM adapter for running without API calls.
//!
//! Echoes a neutral result for every ticker section in the prompt, or returns
//! a scripted response / failure. Records calls so tests can assert on them.

use crate::domain::{CompletionRequest, DomainError};
use crate::ports::LlmPort;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::info;

/// Prefix of a ticker section header in the batch prompt.
const SECTION_MARKER: &str = "### Ticker:";

enum Mode {
    /// Synthesize a neutral result for every section found in the prompt.
    Echo,
    /// Return this text verbatim.
    Fixed(String),
    /// Fail with `DomainError::Ai(msg)`.
    Fail(String),
}

/// Mock LLM adapter.
///
/// Returns predetermined responses without making API calls.
/// Simulates network latency with configurable delay.
pub struct MockLlmAdapter {
    mode: Mode,
    /// Simulated network delay in milliseconds.
    delay_ms: u64,
    calls: AtomicUsize,
    last_request: Mutex<Option<CompletionRequest>>,
}

impl MockLlmAdapter {
    /// Create a new echoing mock with default delay (100ms).
    pub fn new() -> Self {
        Self::build(Mode::Echo, 100)
    }

    /// Create an echoing mock with custom delay.
    pub fn with_delay(delay_ms: u64) -> Self {
        Self::build(Mode::Echo, delay_ms)
    }

    /// Always answer with `raw`.
    pub fn with_response(raw: impl Into<String>) -> Self {
        Self::build(Mode::Fixed(raw.into()), 0)
    }

    /// Always fail, as if the service rejected the request.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::build(Mode::Fail(message.into()), 0)
    }

    fn build(mode: Mode, delay_ms: u64) -> Self {
        Self {
            mode,
            delay_ms,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Number of `complete` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request.lock().ok().and_then(|g| g.clone())
    }

    fn echo(prompt: &str) -> String {
        let results: Vec<serde_json::Value> = prompt
            .lines()
            .filter_map(|line| line.strip_prefix(SECTION_MARKER))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|symbol| {
                serde_json::json!({
                    "symbol": symbol,
                    "summary_bullets": [
                        "[MOCK] No language model configured; headlines were not analyzed."
                    ],
                    "sentiment": "neutral",
                    "reasons": ["[MOCK] offline run"],
                })
            })
            .collect();
        serde_json::json!({ "results": results }).to_string()
    }
}

impl Default for MockLlmAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LlmPort for MockLlmAdapter {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }

        info!(
            model = %request.model,
            prompt_len = request.prompt.len(),
            "[MOCK] Simulating LLM completion"
        );

        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }

        match &self.mode {
            Mode::Echo => Ok(Self::echo(&request.prompt)),
            Mode::Fixed(raw) => Ok(raw.clone()),
            Mode::Fail(msg) => Err(DomainError::Ai(msg.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prompt: &str) -> CompletionRequest {
        CompletionRequest {
            model: "mock".to_string(),
            prompt: prompt.to_string(),
            temperature: 0.2,
            max_output_tokens: 800,
        }
    }

    #[tokio::test]
    async fn test_mock_echoes_every_section() {
        let adapter = MockLlmAdapter::with_delay(1);
        let prompt = "preamble\n### Ticker: ACME\nHeadlines:\n- a\n\n### Ticker: BETA\nHeadlines:\n- b\n";

        let raw = adapter.complete(&request(prompt)).await.unwrap();
        let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let rows = v["results"].as_array().unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["symbol"], "ACME");
        assert_eq!(rows[1]["symbol"], "BETA");
        assert_eq!(rows[1]["sentiment"], "neutral");
        assert_eq!(adapter.calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_failing_and_recording() {
        let adapter = MockLlmAdapter::failing("quota exceeded");
        let err = adapter.complete(&request("hi")).await.unwrap_err();

        assert!(matches!(err, DomainError::Ai(ref m) if m == "quota exceeded"));
        assert_eq!(adapter.last_request().unwrap().prompt, "hi");
    }
}
