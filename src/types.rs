//! Shared types for the TAQIKO agent.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that broker, strategy, ledger
//! and engine modules can depend on them without circular references.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// Order direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// The opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A cash-equity position held for one symbol.
///
/// A position record with `quantity == 0` never exists on disk — the
/// ledger deletes the record the moment the last share is sold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    /// Shares currently held. Always > 0 for a persisted record.
    pub quantity: u64,
    /// Weighted-average cost basis per share.
    pub average_cost: Decimal,
    /// Timestamp of the last mutation.
    pub last_update: DateTime<Utc>,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} shares @ {:.2}",
            self.symbol, self.quantity, self.average_cost
        )
    }
}

// ---------------------------------------------------------------------------
// Fill
// ---------------------------------------------------------------------------

/// A confirmed execution of a submitted order.
///
/// Fills are session-scoped: they are produced by the order executor,
/// folded into the position ledger and the capital account, and then
/// discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub symbol: String,
    pub side: Side,
    pub quantity: u64,
    pub price: Decimal,
}

impl Fill {
    /// Gross execution amount (price × quantity), before commission.
    pub fn execution_amount(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

impl fmt::Display for Fill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} x{} @ {:.2}",
            self.side, self.symbol, self.quantity, self.price
        )
    }
}

// ---------------------------------------------------------------------------
// Realized P&L
// ---------------------------------------------------------------------------

/// Outcome of a sell applied to the ledger.
///
/// `deficit` is non-zero when the sell quantity exceeded the held
/// quantity: the held portion was realized, the record deleted, and the
/// excess reported to the caller as an anomaly rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RealizedPnl {
    pub amount: Decimal,
    pub deficit: u64,
}

impl RealizedPnl {
    pub fn is_deficit(&self) -> bool {
        self.deficit > 0
    }
}

// ---------------------------------------------------------------------------
// Trade signal
// ---------------------------------------------------------------------------

/// A buy or sell candidate produced by the crossover scan.
///
/// Signals are derived, never persisted — they are recomputed every
/// session from fresh price history.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeSignal {
    pub symbol: String,
    pub name: String,
    pub direction: Side,
}

impl fmt::Display for TradeSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.direction, self.name, self.symbol)
    }
}

// ---------------------------------------------------------------------------
// Candle
// ---------------------------------------------------------------------------

/// One day of closing-price history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub date: NaiveDate,
    pub close: Decimal,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
