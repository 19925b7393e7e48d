//! Crossover signal scan over the trading universe.
//!
//! For each target symbol, fetches daily closes and reads the crossing
//! state of the most recent fully-computed day: a golden cross puts the
//! symbol on the buy list, a dead cross on the sell list. Per-symbol
//! fetch failures are logged and skipped — one bad symbol never aborts
//! the scan.

pub mod crossover;

use tracing::{info, warn};

use crate::data::{PriceHistory, Target};
use crate::types::{Side, TradeSignal};
use crossover::{signal_for_session, Cross};

/// Result of one universe scan.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub buy_list: Vec<TradeSignal>,
    pub sell_list: Vec<TradeSignal>,
    /// Symbols whose history could not be fetched or was too short.
    pub skipped: usize,
}

/// Scans a universe for golden/dead crosses.
pub struct SignalScanner {
    history: Box<dyn PriceHistory>,
    short_window: usize,
    long_window: usize,
}

impl SignalScanner {
    pub fn new(history: Box<dyn PriceHistory>, short_window: usize, long_window: usize) -> Self {
        Self {
            history,
            short_window,
            long_window,
        }
    }

    /// Evaluate every target sequentially and build the candidate lists.
    ///
    /// A symbol lands on at most one list per session: the strict
    /// crossing definition cannot flag both directions on the same day.
    pub async fn scan(&self, targets: &[Target]) -> ScanOutcome {
        info!(count = targets.len(), "Starting crossover scan");

        let mut outcome = ScanOutcome::default();
        for target in targets {
            let candles = match self.history.daily_closes(&target.symbol).await {
                Ok(candles) => candles,
                Err(e) => {
                    warn!(
                        symbol = %target.symbol,
                        name = %target.name,
                        error = %e,
                        "History fetch failed — skipping symbol"
                    );
                    outcome.skipped += 1;
                    continue;
                }
            };

            match signal_for_session(&candles, self.short_window, self.long_window) {
                Some(Cross::Golden) => {
                    info!(symbol = %target.symbol, name = %target.name, "Golden cross — buy candidate");
                    outcome.buy_list.push(TradeSignal {
                        symbol: target.symbol.clone(),
                        name: target.name.clone(),
                        direction: Side::Buy,
                    });
                }
                Some(Cross::Dead) => {
                    info!(symbol = %target.symbol, name = %target.name, "Dead cross — sell candidate");
                    outcome.sell_list.push(TradeSignal {
                        symbol: target.symbol.clone(),
                        name: target.name.clone(),
                        direction: Side::Sell,
                    });
                }
                None => {}
            }
        }

        info!(
            buys = outcome.buy_list.len(),
            sells = outcome.sell_list.len(),
            skipped = outcome.skipped,
            "Crossover scan complete"
        );
        outcome
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
