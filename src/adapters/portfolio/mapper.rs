//! Map raw brokerage position records to domain `Position`.
//!
//! Accepts the aggregator's nested shape (`symbol.symbol.raw_symbol`, `units`,
//! `price`, ...) and a flat hand-written shape (`ticker`, `quantity`, ...).

use crate::domain::Position;
use serde_json::Value;

/// Normalize one raw record. Returns `None` for cash equivalents and records without a ticker.
///
/// Ticker lookup order:
/// * `symbol.symbol.raw_symbol`
/// * `symbol.symbol.symbol` (or `symbol.symbol` when it is a string)
/// * `symbol` / `ticker` as plain strings
pub fn position_from_record(record: &Value) -> Option<Position> {
    if record
        .get("cash_equivalent")
        .and_then(Value::as_bool)
        .unwrap_or(false)
    {
        return None;
    }

    let symbol = record.get("symbol");
    let inner = symbol.and_then(|s| s.get("symbol"));

    let ticker = inner
        .and_then(|i| i.get("raw_symbol"))
        .and_then(non_empty_str)
        .or_else(|| inner.and_then(|i| i.get("symbol")).and_then(non_empty_str))
        .or_else(|| inner.and_then(non_empty_str))
        .or_else(|| symbol.and_then(non_empty_str))
        .or_else(|| record.get("ticker").and_then(non_empty_str))?;

    // A zero `units` falls through to `fractional_units`.
    let quantity = number(record.get("units"))
        .filter(|q| *q != 0.0)
        .or_else(|| number(record.get("fractional_units")))
        .or_else(|| number(record.get("quantity")))
        .unwrap_or(0.0);

    let description = inner
        .and_then(|i| i.get("description"))
        .and_then(non_empty_str)
        .or_else(|| record.get("description").and_then(non_empty_str))
        .map(String::from);

    Some(Position {
        ticker: ticker.to_string(),
        quantity,
        average_cost: number(record.get("average_purchase_price"))
            .or_else(|| number(record.get("average_cost"))),
        last_price: number(record.get("price")).or_else(|| number(record.get("last_price"))),
        account_id: record
            .get("account_id")
            .and_then(non_empty_str)
            .map(String::from),
        description,
    })
}

fn non_empty_str(v: &Value) -> Option<&str> {
    v.as_str().map(str::trim).filter(|s| !s.is_empty())
}

/// Numbers or numeric strings ("1.5").
fn number(v: Option<&Value>) -> Option<f64> {
    let v = v?;
    v.as_f64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
}
