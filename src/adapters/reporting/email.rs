//! SMTP reporter. Sends the digest as multipart/alternative (plaintext + HTML).
//!
//! STARTTLS relay with username/password credentials.

use crate::domain::{DomainError, Report};
use crate::ports::ReporterPort;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

/// SMTP connection and addressing.
#[derive(Debug, Clone)]
pub struct EmailSettings {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Comma-separated list of recipients.
    pub recipients: String,
    /// Defaults to `username`.
    pub sender: Option<String>,
}

pub struct EmailReporter {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
}

impl EmailReporter {
    pub fn new(settings: &EmailSettings) -> Result<Self, DomainError> {
        let from = settings
            .sender
            .as_deref()
            .unwrap_or(&settings.username)
            .parse::<Mailbox>()
            .map_err(|e| DomainError::Config(format!("Invalid sender address: {}", e)))?;
        let to = parse_recipients(&settings.recipients)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.server)
            .map_err(|e| DomainError::Config(format!("SMTP transport error: {}", e)))?
            .port(settings.port)
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from,
            to,
        })
    }
}

/// Parse `"a@x.com, b@y.com"`. Any invalid entry is a config error; an empty list too.
pub fn parse_recipients(list: &str) -> Result<Vec<Mailbox>, DomainError> {
    let to = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|addr| {
            addr.parse::<Mailbox>()
                .map_err(|e| DomainError::Config(format!("Invalid recipient {}: {}", addr, e)))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if to.is_empty() {
        return Err(DomainError::Config("No recipient addresses".to_string()));
    }
    Ok(to)
}

/// Build the multipart message for `report`.
pub fn build_message(from: &Mailbox, to: &[Mailbox], report: &Report) -> Result<Message, DomainError> {
    let mut builder = Message::builder().from(from.clone()).subject(&report.subject);
    for recipient in to {
        builder = builder.to(recipient.clone());
    }
    builder
        .multipart(MultiPart::alternative_plain_html(
            report.plaintext.clone(),
            report.html.clone(),
        ))
        .map_err(|e| DomainError::Delivery(format!("Failed to build email: {}", e)))
}

#[async_trait::async_trait]
impl ReporterPort for EmailReporter {
    fn name(&self) -> &str {
        "email"
    }

    async fn send_report(&self, report: &Report) -> Result<(), DomainError> {
        let email = build_message(&self.from, &self.to, report)?;
        self.transport
            .send(email)
            .await
            .map_err(|e| DomainError::Delivery(format!("Failed to send email: {}", e)))?;

        info!(recipients = self.to.len(), subject = %report.subject, "report e-mailed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AnalysisMap;
    use chrono::Utc;

    #[test]
    fn test_parse_recipients() {
        let to = parse_recipients("a@example.com, b@example.com ,").unwrap();
        assert_eq!(to.len(), 2);
        assert!(parse_recipients(" , ").is_err());
        assert!(parse_recipients("not-an-address").is_err());
    }

    #[test]
    fn test_build_message_is_multipart_alternative() {
        let report = Report {
            subject: "Daily Trading Report - 2024-01-31".to_string(),
            html: "<p>html body</p>".to_string(),
            plaintext: "plain body".to_string(),
            tickers: vec![],
            positions: vec![],
            analysis: AnalysisMap::new(),
            generated_at: Utc::now(),
        };
        let from: Mailbox = "bot@example.com".parse().unwrap();
        let to = parse_recipients("me@example.com").unwrap();

        let msg = build_message(&from, &to, &report).unwrap();
        let raw = String::from_utf8(msg.formatted()).unwrap();

        assert!(raw.contains("Subject: Daily Trading Report - 2024-01-31"));
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("plain body"));
        assert!(raw.contains("<p>html body</p>"));
    }
}
