//! Progress bar for the per-ticker news fetch.

use indicatif::{ProgressBar, ProgressStyle};

/// Bar over `len` tickers. Hidden when `visible` is false (tests, non-interactive runs).
pub fn ticker_progress(len: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}
