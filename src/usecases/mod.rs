//! Application use cases. Orchestrate domain logic via ports.

pub mod analyzer;
pub mod digest_service;
pub mod report_builder;

pub use analyzer::{AnalyzerSettings, BatchAnalyzer};
pub use digest_service::{DigestOutcome, DigestService};
