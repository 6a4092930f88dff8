//! Reporting adapters. Implement ReporterPort.
//!
//! E-mail (SMTP), Notion database pages, and local files.

pub mod csv_utils;
pub mod email;
pub mod file_reporter;
pub mod notion;

pub use csv_utils::digest_to_csv;
pub use email::{EmailReporter, EmailSettings};
pub use file_reporter::FileReporter;
pub use notion::NotionReporter;
