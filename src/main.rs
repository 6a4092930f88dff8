//! Wiring & DI. Entry point: bootstrap adapters, inject into the digest service, run once.
//! No business logic here.

use dotenv::dotenv;
use news_digest::adapters::ai::{MockLlmAdapter, OpenAiAdapter};
use news_digest::adapters::news::{GoogleNewsRss, RedditSearch};
use news_digest::adapters::portfolio::JsonFilePortfolio;
use news_digest::adapters::reporting::{EmailReporter, FileReporter, NotionReporter};
use news_digest::ports::{LlmPort, NewsPort, ReporterPort, SentimentPort};
use news_digest::shared::config::{AppConfig, NewsSource};
use news_digest::shared::logging::{self, LogSettings};
use news_digest::usecases::{BatchAnalyzer, DigestService};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();

    let cfg = match AppConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            logging::init(&LogSettings::default());
            error!(error = %e, "configuration invalid");
            anyhow::bail!("invalid configuration: {}", e);
        }
    };
    logging::init(&cfg.log_settings());

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    let interactive = std::io::stdout().is_terminal();
    if interactive && cfg.show_banner.unwrap_or(true) {
        news_digest::adapters::ui::init_ui();
    }

    // --- LLM (falls back to the offline mock) ---
    let llm: Arc<dyn LlmPort> = if cfg.is_ai_configured() {
        info!(
            model = %cfg.ai_model_or_default(),
            url = %cfg.ai_api_url_or_default(),
            "sentiment analysis enabled with OpenAI adapter"
        );
        Arc::new(
            OpenAiAdapter::new(
                cfg.ai_api_url_or_default(),
                cfg.ai_api_key().unwrap_or_default(),
                cfg.ai_timeout(),
            )
            .map_err(|e| anyhow::anyhow!("{}", e))?,
        )
    } else {
        warn!("OPENAI_API_KEY not set, using mock LLM adapter");
        Arc::new(MockLlmAdapter::new())
    };
    let analyzer: Arc<dyn SentimentPort> =
        Arc::new(BatchAnalyzer::new(llm, cfg.analyzer_settings()));

    // --- News ---
    let news: Arc<dyn NewsPort> = match cfg.news_source_or_default() {
        NewsSource::Google => Arc::new(
            GoogleNewsRss::new(cfg.news_feed_settings()).map_err(|e| anyhow::anyhow!("{}", e))?,
        ),
        NewsSource::Reddit => Arc::new(
            RedditSearch::new(cfg.reddit_user_agent.as_deref(), cfg.news_timeout())
                .map_err(|e| anyhow::anyhow!("{}", e))?,
        ),
    };
    info!(source = ?cfg.news_source_or_default(), "news source selected");

    // --- Portfolio ---
    let portfolio_path = cfg.portfolio_path_or_default();
    info!(path = %portfolio_path, "reading positions");
    let portfolio = Arc::new(JsonFilePortfolio::new(&portfolio_path));

    // --- Reporters ---
    let mut reporters: Vec<Arc<dyn ReporterPort>> = Vec::new();
    if cfg.write_files_or_default() {
        reporters.push(Arc::new(FileReporter::new(cfg.reports_dir_or_default())));
    }
    if let Some(settings) = cfg.email_settings() {
        info!(server = %settings.server, "e-mail reporter enabled");
        reporters.push(Arc::new(
            EmailReporter::new(&settings).map_err(|e| anyhow::anyhow!("{}", e))?,
        ));
    }
    if cfg.is_notion_configured() {
        info!("Notion reporter enabled (NOTION_API_KEY, NOTION_DATABASE_ID)");
        reporters.push(Arc::new(NotionReporter::new(
            cfg.notion_api_key().unwrap_or_default(),
            cfg.notion_database_id().unwrap_or_default(),
        )));
    }

    // --- Run ---
    let service = DigestService::new(
        portfolio,
        news,
        analyzer,
        reporters,
        cfg.news_max_results_or_default(),
    )
    .with_progress(interactive)
    .with_report_options(cfg.report_options());

    let outcome = service.run().await.map_err(|e| anyhow::anyhow!("{}", e))?;
    if outcome.delivered == 0 {
        warn!("report was not delivered anywhere");
    }

    Ok(())
}
