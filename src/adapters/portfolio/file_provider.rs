//! Implements PortfolioPort from a JSON export of brokerage positions.
//!
//! Accepted layouts:
//! - `[ {position}, ... ]`
//! - `{"positions": [ ... ]}`
//! - `{"accounts": [ {"id": "...", "positions": [ ... ]}, ... ]}` (account id is annotated onto each position)

use crate::adapters::portfolio::mapper::position_from_record;
use crate::domain::{DomainError, Position};
use crate::ports::PortfolioPort;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// JSON file-based portfolio source.
pub struct JsonFilePortfolio {
    path: PathBuf,
}

impl JsonFilePortfolio {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Normalize a parsed export. Exposed for callers that already hold the JSON.
    pub fn positions_from_value(data: &Value) -> Result<Vec<Position>, DomainError> {
        let mut out = Vec::new();

        if let Some(records) = data.as_array() {
            out.extend(records.iter().filter_map(position_from_record));
        } else if let Some(accounts) = data.get("accounts").and_then(Value::as_array) {
            for account in accounts {
                let Some(account_id) = account.get("id").and_then(Value::as_str) else {
                    debug!("skipping account without id");
                    continue;
                };
                let Some(records) = account.get("positions").and_then(Value::as_array) else {
                    continue;
                };
                for mut position in records.iter().filter_map(position_from_record) {
                    if position.account_id.is_none() {
                        position.account_id = Some(account_id.to_string());
                    }
                    out.push(position);
                }
            }
        } else if let Some(records) = data.get("positions").and_then(Value::as_array) {
            out.extend(records.iter().filter_map(position_from_record));
        } else {
            return Err(DomainError::Portfolio(
                "unrecognized positions layout (expected array, \"positions\" or \"accounts\")"
                    .to_string(),
            ));
        }

        Ok(out)
    }
}

#[async_trait::async_trait]
impl PortfolioPort for JsonFilePortfolio {
    async fn get_positions(&self) -> Result<Vec<Position>, DomainError> {
        let text = fs::read_to_string(&self.path).await.map_err(|e| {
            DomainError::Portfolio(format!("read {}: {}", self.path.display(), e))
        })?;
        let data: Value = serde_json::from_str(&text).map_err(|e| {
            DomainError::Portfolio(format!("parse {}: {}", self.path.display(), e))
        })?;

        let positions = Self::positions_from_value(&data)?;
        info!(
            path = %self.path.display(),
            positions = positions.len(),
            "loaded portfolio positions"
        );
        Ok(positions)
    }
}
