//! Reporter outbound port. Deliver a rendered digest (e-mail, Notion, files).

use crate::domain::{DomainError, Report};

/// Port for delivering a rendered report.
///
/// Implemented by adapters (SMTP, Notion, filesystem). The digest service calls
/// every configured reporter; one failing reporter does not stop the others.
#[async_trait::async_trait]
pub trait ReporterPort: Send + Sync {
    /// Short name used in logs (e.g. "email").
    fn name(&self) -> &str;

    /// Deliver the report.
    ///
    /// # Errors
    /// Returns `DomainError::Delivery` if the transport fails.
    async fn send_report(&self, report: &Report) -> Result<(), DomainError>;
}
