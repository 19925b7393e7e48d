//! Market data sources.
//!
//! Defines the seams the strategy layer consumes:
//! - `PriceHistory` — ascending daily closes for one symbol
//! - `UniverseSource` — the set of (symbol, name) pairs to evaluate
//!
//! Implementations: Stooq daily-quote CSV feed, and a ledger-derived
//! universe with a fixed fallback list.

pub mod stooq;
pub mod universe;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::types::Candle;

/// One tradable instrument in the scan universe.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Target {
    pub symbol: String,
    pub name: String,
}

impl Target {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("data source request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed data source payload: {0}")]
    Malformed(String),

    #[error("no price history returned for {symbol}")]
    Empty { symbol: String },

    #[error("position store unavailable: {0}")]
    Store(#[from] crate::ledger::LedgerError),
}

/// Source of daily closing-price history for a symbol.
///
/// Implementations must return the series in ascending date order.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceHistory: Send + Sync {
    async fn daily_closes(&self, symbol: &str) -> Result<Vec<Candle>, DataSourceError>;
}

/// Source of the trading universe evaluated each session.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UniverseSource: Send + Sync {
    async fn targets(&self) -> Result<Vec<Target>, DataSourceError>;
}
