//! Portfolio adapters. Implement PortfolioPort.
//!
//! Positions come from a brokerage export on disk; `mapper` normalizes raw records.

pub mod file_provider;
pub mod mapper;

pub use file_provider::JsonFilePortfolio;
