//! Application configuration. API credentials, limits, paths.
//!
//! Sources, later wins: `NEWS_DIGEST_*` environment, then an optional file named by
//! `NEWS_DIGEST_CONFIG`. Credentials also fall back to their conventional unprefixed
//! variables (`OPENAI_API_KEY`, `EMAIL_SERVER`, `NOTION_API_KEY`, ...).

use crate::adapters::ai::openai_adapter::{DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};
use crate::adapters::news::NewsFeedSettings;
use crate::adapters::reporting::EmailSettings;
use crate::shared::logging::LogSettings;
use crate::usecases::analyzer::{
    AnalyzerSettings, DEFAULT_MAX_LINKS_PER_TICKER, DEFAULT_MAX_OUTPUT_TOKENS,
    DEFAULT_MAX_TITLES_PER_TICKER, DEFAULT_MODEL, DEFAULT_TEMPERATURE,
};
use crate::usecases::report_builder::{DEFAULT_SUBTITLE, DEFAULT_TITLE, ReportOptions};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_NEWS_MAX_RESULTS: usize = 12;

/// Which headline source to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsSource {
    Google,
    Reddit,
}

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    // ─────────────────────────────────────────────────────────────────────────
    // AI Analysis Configuration
    // ─────────────────────────────────────────────────────────────────────────
    /// AI API key. Read from NEWS_DIGEST_AI_API_KEY or OPENAI_API_KEY.
    #[serde(default)]
    pub ai_api_key: Option<String>,

    /// AI API URL. Defaults to OpenAI chat completions.
    #[serde(default)]
    pub ai_api_url: Option<String>,

    /// AI model name. Defaults to "gpt-4o-mini".
    #[serde(default)]
    pub ai_model: Option<String>,

    #[serde(default)]
    pub ai_temperature: Option<f32>,

    /// Output ceiling for the batch response (tokens).
    #[serde(default)]
    pub ai_max_output_tokens: Option<u32>,

    /// Whole-request timeout in seconds (default 60).
    #[serde(default)]
    pub ai_timeout_secs: Option<u64>,

    /// Headlines kept per ticker in the prompt (default 12).
    #[serde(default)]
    pub max_headlines_per_ticker: Option<usize>,

    /// Source links kept per ticker in the prompt (default 2).
    #[serde(default)]
    pub max_links_per_ticker: Option<usize>,

    // ─────────────────────────────────────────────────────────────────────────
    // News
    // ─────────────────────────────────────────────────────────────────────────
    #[serde(default)]
    pub news_source: Option<NewsSource>,

    /// Headlines requested per ticker (default 12).
    #[serde(default)]
    pub news_max_results: Option<usize>,

    /// Feed locale: hl / gl / ceid.
    #[serde(default)]
    pub news_language: Option<String>,
    #[serde(default)]
    pub news_region: Option<String>,
    #[serde(default)]
    pub news_edition: Option<String>,

    #[serde(default)]
    pub news_timeout_secs: Option<u64>,

    #[serde(default)]
    pub reddit_user_agent: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // Paths & logging
    // ─────────────────────────────────────────────────────────────────────────
    /// Brokerage positions export (default ./positions.json).
    #[serde(default)]
    pub portfolio_path: Option<String>,

    /// Where the file reporter writes (default ./reports). Set NEWS_DIGEST_WRITE_FILES=false to disable.
    #[serde(default)]
    pub reports_dir: Option<String>,

    #[serde(default)]
    pub write_files: Option<bool>,

    #[serde(default)]
    pub log_dir: Option<String>,

    /// Default filter when RUST_LOG is unset (default "info").
    #[serde(default)]
    pub log_level: Option<String>,

    #[serde(default)]
    pub log_to_file: Option<bool>,

    #[serde(default)]
    pub show_banner: Option<bool>,

    /// Report heading and subheading.
    #[serde(default)]
    pub report_title: Option<String>,
    #[serde(default)]
    pub report_subtitle: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // E-mail (SMTP)
    // ─────────────────────────────────────────────────────────────────────────
    #[serde(default)]
    pub email_server: Option<String>,
    #[serde(default)]
    pub email_port: Option<u16>,
    #[serde(default)]
    pub email_username: Option<String>,
    #[serde(default)]
    pub email_password: Option<String>,
    /// Comma-separated. Also read from RECIPIENT_EMAIL.
    #[serde(default)]
    pub email_recipient: Option<String>,
    #[serde(default)]
    pub email_sender: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // Notion
    // ─────────────────────────────────────────────────────────────────────────
    #[serde(default)]
    pub notion_api_key: Option<String>,
    #[serde(default)]
    pub notion_database_id: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("NEWS_DIGEST").try_parsing(true));
        if let Ok(path) = std::env::var("NEWS_DIGEST_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c.build()?.try_deserialize()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // AI Configuration Helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns the AI API key if configured. Reads from config or OPENAI_API_KEY env.
    pub fn ai_api_key(&self) -> Option<String> {
        self.ai_api_key
            .clone()
            .or_else(|| env_non_empty("OPENAI_API_KEY"))
            .filter(|k| !k.trim().is_empty())
    }

    /// Returns the AI API URL. Defaults to OpenAI chat completions endpoint.
    pub fn ai_api_url_or_default(&self) -> String {
        self.ai_api_url
            .clone()
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    /// Returns the AI model name. Defaults to "gpt-4o-mini".
    pub fn ai_model_or_default(&self) -> String {
        self.ai_model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    pub fn ai_timeout(&self) -> Duration {
        Duration::from_secs(self.ai_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Returns true if AI is configured (API key present).
    pub fn is_ai_configured(&self) -> bool {
        self.ai_api_key().is_some()
    }

    pub fn analyzer_settings(&self) -> AnalyzerSettings {
        AnalyzerSettings {
            model: self.ai_model_or_default(),
            max_titles_per_ticker: self
                .max_headlines_per_ticker
                .unwrap_or(DEFAULT_MAX_TITLES_PER_TICKER),
            max_links_per_ticker: self
                .max_links_per_ticker
                .unwrap_or(DEFAULT_MAX_LINKS_PER_TICKER),
            temperature: self.ai_temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_output_tokens: self
                .ai_max_output_tokens
                .unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // News / paths / logging
    // ─────────────────────────────────────────────────────────────────────────

    pub fn news_source_or_default(&self) -> NewsSource {
        self.news_source.unwrap_or(NewsSource::Google)
    }

    pub fn news_max_results_or_default(&self) -> usize {
        self.news_max_results.unwrap_or(DEFAULT_NEWS_MAX_RESULTS)
    }

    pub fn news_timeout(&self) -> Duration {
        Duration::from_secs(self.news_timeout_secs.unwrap_or(10))
    }

    pub fn news_feed_settings(&self) -> NewsFeedSettings {
        let defaults = NewsFeedSettings::default();
        NewsFeedSettings {
            language: self.news_language.clone().unwrap_or(defaults.language),
            region: self.news_region.clone().unwrap_or(defaults.region),
            edition: self.news_edition.clone().unwrap_or(defaults.edition),
            timeout: self.news_timeout(),
        }
    }

    pub fn portfolio_path_or_default(&self) -> String {
        self.portfolio_path
            .clone()
            .unwrap_or_else(|| "./positions.json".to_string())
    }

    pub fn reports_dir_or_default(&self) -> String {
        self.reports_dir
            .clone()
            .unwrap_or_else(|| "./reports".to_string())
    }

    /// File reporter is on unless explicitly disabled.
    pub fn write_files_or_default(&self) -> bool {
        self.write_files.unwrap_or(true)
    }

    pub fn log_settings(&self) -> LogSettings {
        let defaults = LogSettings::default();
        LogSettings {
            default_level: self.log_level.clone().unwrap_or(defaults.default_level),
            log_dir: self
                .log_dir
                .clone()
                .map(Into::into)
                .unwrap_or(defaults.log_dir),
            to_file: self.log_to_file.unwrap_or(defaults.to_file),
        }
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            title: self
                .report_title
                .clone()
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            subtitle: self
                .report_subtitle
                .clone()
                .unwrap_or_else(|| DEFAULT_SUBTITLE.to_string()),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // E-mail / Notion Helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// SMTP settings when every required value is present (server, port, username,
    /// password, recipient). Reads EMAIL_SERVER / EMAIL_PORT / EMAIL_USERNAME /
    /// EMAIL_PASSWORD / RECIPIENT_EMAIL as fallbacks.
    pub fn email_settings(&self) -> Option<EmailSettings> {
        let port = self
            .email_port
            .or_else(|| env_non_empty("EMAIL_PORT").and_then(|p| p.trim().parse().ok()))?;
        Some(EmailSettings {
            server: self
                .email_server
                .clone()
                .or_else(|| env_non_empty("EMAIL_SERVER"))?,
            port,
            username: self
                .email_username
                .clone()
                .or_else(|| env_non_empty("EMAIL_USERNAME"))?,
            password: self
                .email_password
                .clone()
                .or_else(|| env_non_empty("EMAIL_PASSWORD"))?,
            recipients: self
                .email_recipient
                .clone()
                .or_else(|| env_non_empty("RECIPIENT_EMAIL"))?,
            sender: self.email_sender.clone(),
        })
    }

    /// Returns Notion token from config or NOTION_API_KEY env.
    pub fn notion_api_key(&self) -> Option<String> {
        self.notion_api_key
            .clone()
            .or_else(|| env_non_empty("NOTION_API_KEY"))
    }

    /// Returns Notion database ID from config or NOTION_DATABASE_ID env.
    pub fn notion_database_id(&self) -> Option<String> {
        self.notion_database_id
            .clone()
            .or_else(|| env_non_empty("NOTION_DATABASE_ID"))
    }

    /// Returns true if both Notion values are present.
    pub fn is_notion_configured(&self) -> bool {
        self.notion_api_key().is_some() && self.notion_database_id().is_some()
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        let settings = cfg.analyzer_settings();

        assert_eq!(settings, AnalyzerSettings::default());
        assert_eq!(cfg.ai_api_url_or_default(), DEFAULT_API_URL);
        assert_eq!(cfg.news_source_or_default(), NewsSource::Google);
        assert_eq!(cfg.news_max_results_or_default(), 12);
        assert_eq!(cfg.ai_timeout(), Duration::from_secs(60));
        assert_eq!(cfg.news_feed_settings().edition, "US:en");
        assert!(cfg.write_files_or_default());
        assert_eq!(cfg.report_options().title, DEFAULT_TITLE);
    }

    #[test]
    fn test_overrides_flow_into_settings() {
        let cfg = AppConfig {
            ai_model: Some("llama3.2".to_string()),
            max_headlines_per_ticker: Some(5),
            ai_temperature: Some(0.0),
            news_language: Some("de-DE".to_string()),
            ..Default::default()
        };

        let settings = cfg.analyzer_settings();
        assert_eq!(settings.model, "llama3.2");
        assert_eq!(settings.max_titles_per_ticker, 5);
        assert_eq!(settings.max_links_per_ticker, 2);
        assert_eq!(settings.temperature, 0.0);
        assert_eq!(cfg.news_feed_settings().language, "de-DE");
    }

    #[test]
    fn test_email_settings_from_fields() {
        let cfg = AppConfig {
            email_server: Some("smtp.example.com".to_string()),
            email_port: Some(587),
            email_username: Some("bot@example.com".to_string()),
            email_password: Some("secret".to_string()),
            email_recipient: Some("me@example.com".to_string()),
            ..Default::default()
        };

        let email = cfg.email_settings().unwrap();
        assert_eq!(email.server, "smtp.example.com");
        assert_eq!(email.port, 587);
        assert!(email.sender.is_none());
    }

    #[test]
    fn test_news_source_deserializes_lowercase() {
        let src: NewsSource = serde_json::from_str("\"reddit\"").unwrap();
        assert_eq!(src, NewsSource::Reddit);
    }

    #[test]
    fn test_load_rejects_malformed_value() {
        // Only test in the crate that touches NEWS_DIGEST_* variables.
        unsafe {
            std::env::set_var("NEWS_DIGEST_AI_MODEL", "llama3.2");
            std::env::set_var("NEWS_DIGEST_NEWS_MAX_RESULTS", "twelve");
        }
        let err = AppConfig::load().unwrap_err();
        assert!(err.to_string().contains("news_max_results"));

        unsafe { std::env::set_var("NEWS_DIGEST_NEWS_MAX_RESULTS", "7") };
        let cfg = AppConfig::load().unwrap();
        assert_eq!(cfg.news_max_results_or_default(), 7);
        assert_eq!(cfg.ai_model_or_default(), "llama3.2");

        unsafe {
            std::env::remove_var("NEWS_DIGEST_AI_MODEL");
            std::env::remove_var("NEWS_DIGEST_NEWS_MAX_RESULTS");
        }
    }
}
