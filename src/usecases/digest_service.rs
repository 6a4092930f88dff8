//! Digest service. Orchestrates one end-to-end run.
//!
//! Coordinates between the portfolio source, the headline source, the sentiment
//! analyzer and the reporters.

use crate::adapters::ui::progress::ticker_progress;
use crate::domain::{AnalysisMap, DomainError, Position, TickerHeadlines};
use crate::ports::{NewsPort, PortfolioPort, ReporterPort, SentimentPort};
use crate::usecases::report_builder::{self, ReportOptions};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info, warn};

/// What a run produced. For logging and exit status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DigestOutcome {
    pub positions: usize,
    pub tickers_with_news: usize,
    pub analyzed: usize,
    pub delivered: usize,
    pub failed_deliveries: usize,
}

/// Service for the daily portfolio digest.
///
/// Orchestrates the flow:
/// 1. Load positions
/// 2. Fetch headlines per ticker (sequentially)
/// 3. One batched sentiment request
/// 4. Render and hand the report to every reporter
pub struct DigestService {
    portfolio: Arc<dyn PortfolioPort>,
    news: Arc<dyn NewsPort>,
    analyzer: Arc<dyn SentimentPort>,
    reporters: Vec<Arc<dyn ReporterPort>>,
    news_max_results: usize,
    report_options: ReportOptions,
    show_progress: bool,
}

impl DigestService {
    /// Create a new digest service.
    ///
    /// # Arguments
    /// * `portfolio` - Position source
    /// * `news` - Headline source
    /// * `analyzer` - Sentiment analyzer (batch LLM, or any `SentimentPort`)
    /// * `reporters` - Delivery targets; may be empty
    /// * `news_max_results` - Headlines requested per ticker
    pub fn new(
        portfolio: Arc<dyn PortfolioPort>,
        news: Arc<dyn NewsPort>,
        analyzer: Arc<dyn SentimentPort>,
        reporters: Vec<Arc<dyn ReporterPort>>,
        news_max_results: usize,
    ) -> Self {
        Self {
            portfolio,
            news,
            analyzer,
            reporters,
            news_max_results,
            report_options: ReportOptions::default(),
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn with_report_options(mut self, options: ReportOptions) -> Self {
        self.report_options = options;
        self
    }

    /// Run once. Only a portfolio failure is returned as an error; anything later
    /// degrades the report instead.
    pub async fn run(&self) -> Result<DigestOutcome, DomainError> {
        let positions = self.portfolio.get_positions().await?;
        let mut outcome = DigestOutcome {
            positions: positions.len(),
            ..Default::default()
        };

        if positions.is_empty() {
            warn!("no positions found; sending empty report");
            self.deliver(&positions, &AnalysisMap::new(), &mut outcome)
                .await;
            return Ok(outcome);
        }

        let headlines = self.fetch_headlines(&positions).await;
        outcome.tickers_with_news = headlines.len();

        let analysis = if headlines.is_empty() {
            info!("no headlines for any ticker; skipping analysis");
            AnalysisMap::new()
        } else {
            self.analyzer.analyze_batch(&headlines).await
        };
        outcome.analyzed = analysis.len();

        self.deliver(&positions, &analysis, &mut outcome).await;

        info!(
            positions = outcome.positions,
            tickers_with_news = outcome.tickers_with_news,
            analyzed = outcome.analyzed,
            delivered = outcome.delivered,
            failed = outcome.failed_deliveries,
            "digest run complete"
        );
        Ok(outcome)
    }

    /// Unique tickers in sorted order; the first non-empty description is used as company name.
    fn tickers(positions: &[Position]) -> BTreeMap<String, Option<String>> {
        let mut out: BTreeMap<String, Option<String>> = BTreeMap::new();
        for p in positions {
            let entry = out.entry(p.ticker.clone()).or_default();
            if entry.is_none() {
                *entry = p.description.clone();
            }
        }
        out
    }

    async fn fetch_headlines(&self, positions: &[Position]) -> TickerHeadlines {
        let tickers = Self::tickers(positions);
        let pb = ticker_progress(tickers.len() as u64, self.show_progress);
        let mut items = TickerHeadlines::new();

        for (ticker, company) in &tickers {
            pb.set_message(ticker.clone());
            let articles = self
                .news
                .get_news(ticker, company.as_deref(), self.news_max_results)
                .await;
            if articles.is_empty() {
                info!(ticker = %ticker, "no headlines");
            } else {
                items.insert(ticker.clone(), articles);
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        info!(
            tickers = tickers.len(),
            with_news = items.len(),
            "headline fetch complete"
        );
        items
    }

    async fn deliver(
        &self,
        positions: &[Position],
        analysis: &AnalysisMap,
        outcome: &mut DigestOutcome,
    ) {
        let report =
            report_builder::build_report(positions, analysis, &self.report_options, Utc::now());

        if self.reporters.is_empty() {
            warn!("no reporters configured; report not delivered");
        }
        for reporter in &self.reporters {
            match reporter.send_report(&report).await {
                Ok(()) => {
                    info!(reporter = reporter.name(), "report delivered");
                    outcome.delivered += 1;
                }
                Err(e) => {
                    error!(reporter = reporter.name(), error = %e, "report delivery failed");
                    outcome.failed_deliveries += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockLlmAdapter;
    use crate::domain::{HeadlineItem, Report, Sentiment};
    use crate::ports::LlmPort;
    use crate::usecases::analyzer::{AnalyzerSettings, BatchAnalyzer};
    use std::sync::Mutex;

    struct StaticPortfolio(Result<Vec<Position>, String>);

    #[async_trait::async_trait]
    impl PortfolioPort for StaticPortfolio {
        async fn get_positions(&self) -> Result<Vec<Position>, DomainError> {
            self.0.clone().map_err(DomainError::Portfolio)
        }
    }

    /// Returns one headline per ticker except for tickers listed in `silent`.
    struct StaticNews {
        silent: Vec<String>,
        queries: Mutex<Vec<(String, Option<String>)>>,
    }

    #[async_trait::async_trait]
    impl NewsPort for StaticNews {
        async fn get_news(
            &self,
            symbol: &str,
            company: Option<&str>,
            _max_results: usize,
        ) -> Vec<HeadlineItem> {
            self.queries
                .lock()
                .unwrap()
                .push((symbol.to_string(), company.map(String::from)));
            if self.silent.iter().any(|s| s == symbol) {
                return vec![];
            }
            vec![HeadlineItem::new(format!("{} headline", symbol), None)]
        }
    }

    #[derive(Default)]
    struct RecordingReporter {
        reports: Mutex<Vec<Report>>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl ReporterPort for RecordingReporter {
        fn name(&self) -> &str {
            "recording"
        }

        async fn send_report(&self, report: &Report) -> Result<(), DomainError> {
            if self.fail {
                return Err(DomainError::Delivery("smtp down".to_string()));
            }
            self.reports.lock().unwrap().push(report.clone());
            Ok(())
        }
    }

    fn position(ticker: &str, description: Option<&str>) -> Position {
        Position {
            ticker: ticker.to_string(),
            quantity: 1.0,
            average_cost: None,
            last_price: None,
            account_id: None,
            description: description.map(String::from),
        }
    }

    fn news(silent: &[&str]) -> Arc<StaticNews> {
        Arc::new(StaticNews {
            silent: silent.iter().map(|s| s.to_string()).collect(),
            queries: Mutex::new(vec![]),
        })
    }

    fn service(
        positions: Result<Vec<Position>, String>,
        news: Arc<StaticNews>,
        llm: Arc<MockLlmAdapter>,
        reporters: Vec<Arc<dyn ReporterPort>>,
    ) -> DigestService {
        let analyzer = BatchAnalyzer::new(llm as Arc<dyn LlmPort>, AnalyzerSettings::default());
        DigestService::new(
            Arc::new(StaticPortfolio(positions)),
            news,
            Arc::new(analyzer),
            reporters,
            12,
        )
    }

    #[tokio::test]
    async fn test_full_run_with_one_batched_call() {
        let llm = Arc::new(MockLlmAdapter::with_delay(0));
        let reporter = Arc::new(RecordingReporter::default());
        let news = news(&["BETA"]);
        let svc = service(
            Ok(vec![
                position("TSM", Some("Taiwan Semiconductor")),
                position("BETA", None),
                position("ACME", None),
                position("TSM", None),
            ]),
            Arc::clone(&news),
            Arc::clone(&llm),
            vec![reporter.clone() as Arc<dyn ReporterPort>],
        );

        let outcome = svc.run().await.unwrap();

        assert_eq!(outcome.positions, 4);
        assert_eq!(outcome.tickers_with_news, 2);
        assert_eq!(outcome.analyzed, 2);
        assert_eq!(outcome.delivered, 1);
        assert_eq!(llm.calls(), 1);

        let queries = news.queries.lock().unwrap();
        assert_eq!(queries.len(), 3);
        assert_eq!(queries[2], ("TSM".to_string(), Some("Taiwan Semiconductor".to_string())));

        let reports = reporter.reports.lock().unwrap();
        let report = &reports[0];
        assert_eq!(report.tickers, vec!["ACME", "BETA", "TSM"]);
        assert!(!report.analysis.contains_key("BETA"));
        assert_eq!(report.analysis["ACME"].sentiment, Some(Sentiment::Neutral));
        assert!(report.html.contains("No analysis"));
    }

    #[tokio::test]
    async fn test_no_positions_sends_empty_report_without_llm() {
        let llm = Arc::new(MockLlmAdapter::with_delay(0));
        let reporter = Arc::new(RecordingReporter::default());
        let svc = service(
            Ok(vec![]),
            news(&[]),
            Arc::clone(&llm),
            vec![reporter.clone() as Arc<dyn ReporterPort>],
        );

        let outcome = svc.run().await.unwrap();

        assert_eq!(outcome.delivered, 1);
        assert_eq!(llm.calls(), 0);
        let reports = reporter.reports.lock().unwrap();
        assert!(reports[0].plaintext.contains("No positions found."));
    }

    #[tokio::test]
    async fn test_no_headlines_skips_llm() {
        let llm = Arc::new(MockLlmAdapter::with_delay(0));
        let svc = service(Ok(vec![position("ACME", None)]), news(&["ACME"]), Arc::clone(&llm), vec![]);

        let outcome = svc.run().await.unwrap();

        assert_eq!(outcome.tickers_with_news, 0);
        assert_eq!(outcome.analyzed, 0);
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_failing_reporter_does_not_stop_others() {
        let llm = Arc::new(MockLlmAdapter::with_delay(0));
        let broken = Arc::new(RecordingReporter {
            fail: true,
            ..Default::default()
        });
        let ok = Arc::new(RecordingReporter::default());
        let svc = service(
            Ok(vec![position("ACME", None)]),
            news(&[]),
            llm,
            vec![
                broken as Arc<dyn ReporterPort>,
                ok.clone() as Arc<dyn ReporterPort>,
            ],
        );

        let outcome = svc.run().await.unwrap();

        assert_eq!(outcome.failed_deliveries, 1);
        assert_eq!(outcome.delivered, 1);
        assert_eq!(ok.reports.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_llm_failure_still_delivers_report() {
        let llm = Arc::new(MockLlmAdapter::failing("timeout"));
        let reporter = Arc::new(RecordingReporter::default());
        let svc = service(
            Ok(vec![position("ACME", None)]),
            news(&[]),
            llm,
            vec![reporter.clone() as Arc<dyn ReporterPort>],
        );

        let outcome = svc.run().await.unwrap();

        assert_eq!(outcome.analyzed, 0);
        assert_eq!(outcome.delivered, 1);
        assert!(reporter.reports.lock().unwrap()[0].analysis.is_empty());
    }

    #[tokio::test]
    async fn test_portfolio_error_propagates() {
        let svc = service(
            Err("file missing".to_string()),
            news(&[]),
            Arc::new(MockLlmAdapter::with_delay(0)),
            vec![],
        );
        assert!(matches!(svc.run().await, Err(DomainError::Portfolio(_))));
    }

    #[tokio::test]
    async fn test_report_options_reach_the_report() {
        let reporter = Arc::new(RecordingReporter::default());
        let svc = service(
            Ok(vec![position("ACME", None)]),
            news(&[]),
            Arc::new(MockLlmAdapter::with_delay(0)),
            vec![reporter.clone() as Arc<dyn ReporterPort>],
        )
        .with_report_options(ReportOptions {
            title: "Morning Brief".to_string(),
            subtitle: "Desk edition".to_string(),
        });

        svc.run().await.unwrap();

        let reports = reporter.reports.lock().unwrap();
        assert!(reports[0].html.contains("<title>Morning Brief</title>"));
        assert!(reports[0].html.contains("Desk edition"));
    }
}
