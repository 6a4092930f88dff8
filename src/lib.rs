//! news-digest: Daily portfolio headlines with batched LLM sentiment, Hexagonal Architecture.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
