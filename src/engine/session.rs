//! Daily trading session orchestrator.
//!
//! Sequences one decision cycle: read capital → crossover scan →
//! buy orders (gated on a positive balance) → sell orders → capital
//! settlement. The session is fault-tolerant per symbol but not
//! transactional across symbols: a failed order is logged and skipped,
//! partial completion is an accepted terminal state, and the settled
//! balance reflects exactly the fills that succeeded. Ledger or capital
//! write failures abort the session — letting them pass would leave the
//! persisted numbers silently diverged from reality.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::executor::{OrderExecutor, PollPolicy};
use crate::data::UniverseSource;
use crate::ledger::capital::CapitalAccount;
use crate::ledger::{LedgerError, PositionLedger};
use crate::strategy::SignalScanner;
use crate::types::{Fill, TradeSignal};

/// Summary of one completed session.
#[derive(Debug, Clone, Default)]
pub struct SessionReport {
    pub targets_evaluated: usize,
    pub symbols_skipped: usize,
    pub buy_candidates: usize,
    pub sell_candidates: usize,
    pub buys_filled: usize,
    pub buys_failed: usize,
    pub sells_filled: usize,
    pub sells_failed: usize,
    pub realized_pnl: Decimal,
    pub commission_total: i64,
    pub balance_before: i64,
    pub balance_after: i64,
}

/// One-shot session controller. Owns the collaborators for the
/// session's duration; fills and signals live only inside `run`.
pub struct TradingSession {
    universe: Box<dyn UniverseSource>,
    scanner: SignalScanner,
    executor: OrderExecutor,
    ledger: PositionLedger,
    capital: CapitalAccount,
    order_qty: u64,
    poll: PollPolicy,
}

impl TradingSession {
    pub fn new(
        universe: Box<dyn UniverseSource>,
        scanner: SignalScanner,
        executor: OrderExecutor,
        ledger: PositionLedger,
        capital: CapitalAccount,
        order_qty: u64,
        poll: PollPolicy,
    ) -> Self {
        Self {
            universe,
            scanner,
            executor,
            ledger,
            capital,
            order_qty,
            poll,
        }
    }

    /// Run one full session.
    pub async fn run(&self) -> Result<SessionReport> {
        let mut report = SessionReport::default();

        // 1. Capital check
        let balance = self.capital.read().context("Failed to read capital account")?;
        report.balance_before = balance;
        report.balance_after = balance;
        info!(balance, "Session starting");

        // 2. Signal scan
        let targets = self
            .universe
            .targets()
            .await
            .context("Failed to resolve trading universe")?;
        report.targets_evaluated = targets.len();

        let outcome = self.scanner.scan(&targets).await;
        report.symbols_skipped = outcome.skipped;
        report.buy_candidates = outcome.buy_list.len();
        report.sell_candidates = outcome.sell_list.len();

        // 3. Buys — gated on a positive balance at session start.
        let mut buy_fills: Vec<Fill> = Vec::new();
        if outcome.buy_list.is_empty() {
            info!("No buy candidates");
        } else if balance <= 0 {
            warn!(balance, "Balance not positive — skipping all buys");
        } else {
            for signal in &outcome.buy_list {
                match self.place_order(signal).await {
                    Some(fill) => {
                        self.ledger
                            .apply_fill(&fill)
                            .with_context(|| format!("Failed to record buy fill for {}", fill.symbol))?;
                        report.buys_filled += 1;
                        buy_fills.push(fill);
                    }
                    None => report.buys_failed += 1,
                }
            }
        }

        // 4. Sells — attempted regardless of balance; selling raises cash.
        let mut sell_fills: Vec<Fill> = Vec::new();
        for signal in &outcome.sell_list {
            let Some(fill) = self.place_order(signal).await else {
                report.sells_failed += 1;
                continue;
            };

            match self.ledger.apply_fill(&fill) {
                Ok(Some(pnl)) => {
                    if pnl.is_deficit() {
                        warn!(
                            symbol = %fill.symbol,
                            deficit = pnl.deficit,
                            "Sell exceeded holding — excess flagged, held portion realized"
                        );
                    }
                    report.sells_filled += 1;
                    sell_fills.push(fill);
                }
                Ok(None) => {
                    // apply_fill on a sell always reports realized P&L.
                    report.sells_filled += 1;
                    sell_fills.push(fill);
                }
                Err(LedgerError::NoPosition { symbol }) => {
                    warn!(symbol = %symbol, "Sold with no position on book — anomaly, excluded from settlement");
                    report.sells_failed += 1;
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to record sell fill for {}", fill.symbol)
                    });
                }
            }
        }

        // 5. Settlement — skipped entirely when nothing filled.
        if buy_fills.is_empty() && sell_fills.is_empty() {
            info!("No fills this session — capital untouched");
        } else {
            let settlement = self
                .capital
                .settle(&buy_fills, &sell_fills)
                .context("Failed to settle capital account")?;
            report.realized_pnl = settlement.realized_pnl;
            report.commission_total = settlement.commission_total;
            report.balance_after = settlement.balance_after;
        }

        info!(
            evaluated = report.targets_evaluated,
            buys = report.buys_filled,
            buys_failed = report.buys_failed,
            sells = report.sells_filled,
            sells_failed = report.sells_failed,
            pnl = %report.realized_pnl,
            commission = report.commission_total,
            balance = report.balance_after,
            "Session complete"
        );
        Ok(report)
    }

    /// Submit one signal's order and wait for the fill. Broker failures
    /// and timeouts are logged here and reported as `None` so one
    /// symbol never blocks the rest of the session.
    async fn place_order(&self, signal: &TradeSignal) -> Option<Fill> {
        info!(
            symbol = %signal.symbol,
            name = %signal.name,
            side = %signal.direction,
            qty = self.order_qty,
            "Placing market order"
        );

        match self
            .executor
            .execute(&signal.symbol, signal.direction, self.order_qty, &self.poll)
            .await
        {
            Ok(fill) => {
                info!(%fill, "Order executed");
                Some(fill)
            }
            Err(e) => {
                warn!(
                    symbol = %signal.symbol,
                    side = %signal.direction,
                    error = %e,
                    "Order failed — continuing with next symbol"
                );
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
