//! Position ledger — durable per-symbol holdings store.
//!
//! One record per symbol, kept as a JSON file under the positions
//! directory (`{symbol}.pos`). A symbol with no file is defined as "no
//! position". Every mutation is a read-modify-write of exactly one
//! symbol's record, written to a temporary file and renamed into place
//! so a crash never leaves a half-written record. Records for different
//! symbols are independent; no cross-symbol locking is needed.

pub mod capital;
pub mod commission;

use chrono::Utc;
use rust_decimal::Decimal;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::types::{Fill, Position, RealizedPnl, Side};

/// Extension used for position record files.
const POSITION_EXT: &str = "pos";

#[derive(Debug, Error)]
pub enum LedgerError {
    /// A sell was applied to a symbol with no position record.
    #[error("no position held for {symbol}")]
    NoPosition { symbol: String },

    /// A record file exists but could not be parsed.
    #[error("corrupt position record {path}: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("position store I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

/// File-backed position ledger.
#[derive(Debug, Clone)]
pub struct PositionLedger {
    dir: PathBuf,
}

impl PositionLedger {
    /// Create a ledger rooted at the given positions directory.
    /// The directory is created lazily on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn record_path(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.{POSITION_EXT}"))
    }

    /// Load the position record for one symbol, if it exists.
    pub fn get(&self, symbol: &str) -> Result<Option<Position>, LedgerError> {
        let path = self.record_path(symbol);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path)?;
        let position = serde_json::from_str(&json).map_err(|source| LedgerError::Corrupt {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Some(position))
    }

    /// Fold one fill into the ledger.
    ///
    /// Buys create or extend a position (weighted-average cost recompute)
    /// and never realize P&L. Sells realize `(price − average_cost) × qty`
    /// against the held quantity; selling the last share deletes the
    /// record. Selling more than is held realizes only the held portion,
    /// deletes the record, and reports the excess as a deficit — the call
    /// still succeeds so the caller can log the anomaly.
    pub fn apply_fill(&self, fill: &Fill) -> Result<Option<RealizedPnl>, LedgerError> {
        match fill.side {
            Side::Buy => self.apply_buy(fill).map(|_| None),
            Side::Sell => self.apply_sell(fill).map(Some),
        }
    }

    fn apply_buy(&self, fill: &Fill) -> Result<(), LedgerError> {
        if fill.quantity == 0 {
            return Ok(());
        }

        let next = match self.get(&fill.symbol)? {
            Some(held) => {
                let held_qty = Decimal::from(held.quantity);
                let fill_qty = Decimal::from(fill.quantity);
                let average_cost = (held_qty * held.average_cost + fill_qty * fill.price)
                    / (held_qty + fill_qty);
                let quantity = held.quantity + fill.quantity;
                info!(
                    symbol = %fill.symbol,
                    from_qty = held.quantity,
                    to_qty = quantity,
                    avg_cost = %average_cost,
                    "Position extended"
                );
                Position {
                    symbol: held.symbol,
                    quantity,
                    average_cost,
                    last_update: Utc::now(),
                }
            }
            None => {
                info!(
                    symbol = %fill.symbol,
                    qty = fill.quantity,
                    avg_cost = %fill.price,
                    "Position opened"
                );
                Position {
                    symbol: fill.symbol.clone(),
                    quantity: fill.quantity,
                    average_cost: fill.price,
                    last_update: Utc::now(),
                }
            }
        };

        self.write_record(&next)
    }

    fn apply_sell(&self, fill: &Fill) -> Result<RealizedPnl, LedgerError> {
        let held = self.get(&fill.symbol)?.ok_or_else(|| LedgerError::NoPosition {
            symbol: fill.symbol.clone(),
        })?;

        let sold = fill.quantity.min(held.quantity);
        let deficit = fill.quantity - sold;
        let amount = (fill.price - held.average_cost) * Decimal::from(sold);
        let remaining = held.quantity - sold;

        if deficit > 0 {
            warn!(
                symbol = %fill.symbol,
                held = held.quantity,
                requested = fill.quantity,
                deficit,
                "Sell quantity exceeds holding — realizing held portion only"
            );
        }

        if remaining == 0 {
            let path = self.record_path(&fill.symbol);
            if path.exists() {
                fs::remove_file(&path)?;
            }
            info!(symbol = %fill.symbol, pnl = %amount, "Position closed");
        } else {
            self.write_record(&Position {
                symbol: held.symbol,
                quantity: remaining,
                average_cost: held.average_cost,
                last_update: Utc::now(),
            })?;
            info!(
                symbol = %fill.symbol,
                remaining,
                pnl = %amount,
                "Position reduced"
            );
        }

        Ok(RealizedPnl { amount, deficit })
    }

    /// All held positions, sorted by symbol.
    ///
    /// Unparseable record files are logged and skipped so one damaged
    /// file cannot hide the rest of the book.
    pub fn list_positions(&self) -> Result<Vec<Position>, LedgerError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut positions = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(POSITION_EXT) {
                continue;
            }
            match Self::read_record(&path) {
                Ok(position) if position.quantity > 0 => positions.push(position),
                Ok(_) => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable position record");
                }
            }
        }

        positions.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(positions)
    }

    fn read_record(path: &Path) -> Result<Position, LedgerError> {
        let json = fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|source| LedgerError::Corrupt {
            path: path.display().to_string(),
            source,
        })
    }

    /// Write one record atomically: temp file in the same directory,
    /// then rename over the target.
    fn write_record(&self, position: &Position) -> Result<(), LedgerError> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(position)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        let tmp = self
            .dir
            .join(format!(".{}.{}.tmp", position.symbol, uuid::Uuid::new_v4()));
        fs::write(&tmp, &json)?;
        fs::rename(&tmp, self.record_path(&position.symbol))?;

        debug!(symbol = %position.symbol, qty = position.quantity, "Position record written");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
