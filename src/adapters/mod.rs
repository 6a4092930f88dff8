//! Infrastructure adapters. Implement outbound ports.
//!
//! LLM service, news feeds, portfolio source, reporters, console UI. Map errors to DomainError.

pub mod ai;
pub mod news;
pub mod portfolio;
pub mod reporting;
pub mod ui;
