//! CSV export of a digest. Uses the `csv` crate for safe quoting.
//!
//! One row per position: `Ticker,Quantity,Last Price,Avg Cost,Sentiment,Summary,Reasons`.

use crate::domain::{AnalysisMap, Position};

/// Separator used when several bullets/reasons share one cell.
const CELL_JOIN: &str = " | ";

/// Convert positions and their analysis to a CSV string.
///
/// Tickers without analysis get empty sentiment/summary/reasons cells.
pub fn digest_to_csv(positions: &[Position], analysis: &AnalysisMap) -> Result<String, csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(Vec::new());

    wtr.write_record([
        "Ticker",
        "Quantity",
        "Last Price",
        "Avg Cost",
        "Sentiment",
        "Summary",
        "Reasons",
    ])?;

    for p in positions {
        let result = analysis.get(&p.ticker);
        let sentiment = result
            .and_then(|r| r.sentiment)
            .map(|s| s.as_str().to_string())
            .unwrap_or_default();
        let summary = result
            .map(|r| clean(&r.summary_bullets.join(CELL_JOIN)))
            .unwrap_or_default();
        let reasons = result
            .map(|r| clean(&r.reasons.join(CELL_JOIN)))
            .unwrap_or_default();

        wtr.write_record([
            p.ticker.clone(),
            format!("{:.6}", p.quantity),
            p.last_price.map(|v| v.to_string()).unwrap_or_default(),
            p.average_cost.map(|v| v.to_string()).unwrap_or_default(),
            sentiment,
            summary,
            reasons,
        ])?;
    }

    wtr.flush()?;
    let bytes = wtr
        .into_inner()
        .map_err(|e| csv::Error::from(std::io::Error::other(e.to_string())))?;

    String::from_utf8(bytes).map_err(|e| {
        csv::Error::from(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            e.to_string(),
        ))
    })
}

/// Model output occasionally contains newlines; keep one row per position.
fn clean(text: &str) -> String {
    text.replace('\n', " ").replace('\r', "")
}
