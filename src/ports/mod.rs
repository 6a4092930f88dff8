//! Port traits. API boundaries for the hexagon.
//!
//! - Inbound: Called by callers (CLI, other services) into the application
//! - Outbound: Called by application into infrastructure

pub mod inbound;
pub mod outbound;
pub mod reporter;

pub use inbound::SentimentPort;
pub use outbound::{LlmPort, NewsPort, PortfolioPort};
pub use reporter::ReporterPort;
