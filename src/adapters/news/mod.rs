//! News adapters. Implement NewsPort.
//!
//! Google News RSS (default) and Reddit search. Both swallow failures and return
//! an empty list so one bad ticker never aborts a run.

pub mod google_news;
pub mod reddit;

pub use google_news::{GoogleNewsRss, NewsFeedSettings};
pub use reddit::RedditSearch;
