//! Implements ReporterPort by writing the digest into a reports directory.
//!
//! One run produces `digest_<timestamp>.html`, `.txt` and `.csv`.

use crate::adapters::reporting::csv_utils::digest_to_csv;
use crate::domain::{DomainError, Report};
use crate::ports::ReporterPort;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

/// Filesystem reporter.
pub struct FileReporter {
    reports_dir: PathBuf,
}

impl FileReporter {
    pub fn new(reports_dir: impl AsRef<Path>) -> Self {
        Self {
            reports_dir: reports_dir.as_ref().to_path_buf(),
        }
    }

    /// File stem shared by the three outputs of one report.
    pub fn stem(report: &Report) -> String {
        format!("digest_{}", report.generated_at.format("%Y%m%d_%H%M%S"))
    }

    async fn write(&self, name: String, contents: &str) -> Result<PathBuf, DomainError> {
        let path = self.reports_dir.join(name);
        fs::write(&path, contents)
            .await
            .map_err(|e| DomainError::Delivery(format!("write {}: {}", path.display(), e)))?;
        Ok(path)
    }
}

#[async_trait::async_trait]
impl ReporterPort for FileReporter {
    fn name(&self) -> &str {
        "file"
    }

    async fn send_report(&self, report: &Report) -> Result<(), DomainError> {
        fs::create_dir_all(&self.reports_dir)
            .await
            .map_err(|e| DomainError::Delivery(format!("Failed to create reports dir: {}", e)))?;

        let stem = Self::stem(report);
        let csv = digest_to_csv(&report.positions, &report.analysis)
            .map_err(|e| DomainError::Report(format!("Failed to generate CSV: {}", e)))?;

        let html_path = self.write(format!("{}.html", stem), &report.html).await?;
        self.write(format!("{}.txt", stem), &report.plaintext).await?;
        self.write(format!("{}.csv", stem), &csv).await?;

        info!(path = %html_path.display(), "report written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AnalysisMap;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_writes_three_files() {
        let dir = tempfile::tempdir().unwrap();
        let reports_dir = dir.path().join("reports");
        let reporter = FileReporter::new(&reports_dir);
        let report = Report {
            subject: "s".to_string(),
            html: "<p>hi</p>".to_string(),
            plaintext: "hi".to_string(),
            tickers: vec![],
            positions: vec![],
            analysis: AnalysisMap::new(),
            generated_at: Utc.with_ymd_and_hms(2024, 1, 31, 8, 5, 9).unwrap(),
        };

        reporter.send_report(&report).await.unwrap();

        let html = tokio::fs::read_to_string(reports_dir.join("digest_20240131_080509.html"))
            .await
            .unwrap();
        assert_eq!(html, "<p>hi</p>");
        assert!(reports_dir.join("digest_20240131_080509.txt").exists());
        let csv = tokio::fs::read_to_string(reports_dir.join("digest_20240131_080509.csv"))
            .await
            .unwrap();
        assert!(csv.starts_with("Ticker,"));
    }
}
