//! End-to-end session tests against the in-memory mock broker.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use taqiko::data::universe::LedgerUniverse;
use taqiko::data::{DataSourceError, PriceHistory, Target, UniverseSource};
use taqiko::engine::executor::{OrderExecutor, PollPolicy};
use taqiko::engine::session::TradingSession;
use taqiko::ledger::capital::CapitalAccount;
use taqiko::ledger::PositionLedger;
use taqiko::strategy::SignalScanner;
use taqiko::types::{Candle, Side};

use crate::mock_broker::{MockBroker, Script};

// ---------------------------------------------------------------------------
// In-memory data sources
// ---------------------------------------------------------------------------

struct FakeHistory {
    series: HashMap<String, Vec<Candle>>,
}

impl FakeHistory {
    fn new() -> Self {
        Self {
            series: HashMap::new(),
        }
    }

    fn set(mut self, symbol: &str, closes: &[i64]) -> Self {
        let candles = closes
            .iter()
            .enumerate()
            .map(|(i, v)| Candle {
                date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap()
                    + chrono::Duration::days(i as i64),
                close: Decimal::from(*v),
            })
            .collect();
        self.series.insert(symbol.to_string(), candles);
        self
    }
}

#[async_trait]
impl PriceHistory for FakeHistory {
    async fn daily_closes(&self, symbol: &str) -> Result<Vec<Candle>, DataSourceError> {
        self.series
            .get(symbol)
            .cloned()
            .ok_or_else(|| DataSourceError::Empty {
                symbol: symbol.to_string(),
            })
    }
}

struct FixedUniverse(Vec<Target>);

#[async_trait]
impl UniverseSource for FixedUniverse {
    async fn targets(&self) -> Result<Vec<Target>, DataSourceError> {
        Ok(self.0.clone())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Golden cross on the second-to-last day under windows (2, 3).
const GOLDEN: &[i64] = &[100, 100, 100, 100, 130, 131];
/// Dead cross on the second-to-last day under windows (2, 3).
const DEAD: &[i64] = &[150, 150, 150, 150, 110, 109];
/// No crossing at all.
const FLAT: &[i64] = &[100, 100, 100, 100, 100, 100];

fn temp_dir(tag: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!("taqiko_it_{tag}_{}", uuid::Uuid::new_v4()));
    dir
}

fn poll_policy() -> PollPolicy {
    PollPolicy {
        max_wait: Duration::from_millis(100),
        poll_interval: Duration::from_millis(1),
    }
}

fn build_session(
    broker: Arc<MockBroker>,
    universe: Box<dyn UniverseSource>,
    history: FakeHistory,
    ledger: PositionLedger,
    capital: CapitalAccount,
) -> TradingSession {
    TradingSession::new(
        universe,
        SignalScanner::new(Box::new(history), 2, 3),
        OrderExecutor::new(broker),
        ledger,
        capital,
        100,
        poll_policy(),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn full_session_buys_sells_and_settles() {
    let ledger = PositionLedger::new(temp_dir("full"));
    let capital = CapitalAccount::new(temp_dir("full_cap").join("capital.txt"));
    capital.write(1_000_000).unwrap();

    // An existing holding for the dead-cross symbol.
    ledger
        .apply_fill(&taqiko::types::Fill {
            symbol: "7792".to_string(),
            side: Side::Buy,
            quantity: 100,
            price: dec!(800),
        })
        .unwrap();

    let broker = Arc::new(MockBroker::new(dec!(500)));
    broker.script(
        "7792",
        Script::Fill {
            price: dec!(900),
            pending_polls: 2,
        },
    );

    let history = FakeHistory::new()
        .set("6176", GOLDEN)
        .set("7792", DEAD)
        .set("4424", FLAT);
    let universe = Box::new(FixedUniverse(vec![
        Target::new("6176", "a"),
        Target::new("7792", "b"),
        Target::new("4424", "c"),
    ]));

    let session = build_session(broker.clone(), universe, history, ledger.clone(), capital.clone());
    let report = session.run().await.unwrap();

    assert_eq!(report.buy_candidates, 1);
    assert_eq!(report.sell_candidates, 1);
    assert_eq!(report.buys_filled, 1);
    assert_eq!(report.sells_filled, 1);

    // Buy opened a new position at the default fill price.
    let bought = ledger.get("6176").unwrap().unwrap();
    assert_eq!(bought.quantity, 100);
    assert_eq!(bought.average_cost, dec!(500));

    // The full holding was sold, so its record is gone.
    assert!(ledger.get("7792").unwrap().is_none());

    // balance + (90,000 − 50,000) − (55 + 99):
    // 50,000 sits in the 55 tier, 90,000 in the 99 tier.
    assert_eq!(report.realized_pnl, dec!(40000));
    assert_eq!(report.commission_total, 154);
    assert_eq!(report.balance_after, 1_000_000 + 40_000 - 154);
    assert_eq!(capital.read().unwrap(), report.balance_after);

    // Exactly two orders reached the broker, buy before sell.
    let submissions = broker.submissions();
    assert_eq!(submissions.len(), 2);
    assert_eq!(submissions[0].symbol, "6176");
    assert_eq!(submissions[0].side, Side::Buy);
    assert_eq!(submissions[1].symbol, "7792");
    assert_eq!(submissions[1].side, Side::Sell);
}

#[tokio::test]
async fn consecutive_sessions_stay_consistent() {
    let ledger = PositionLedger::new(temp_dir("multi"));
    let capital = CapitalAccount::new(temp_dir("multi_cap").join("capital.txt"));
    capital.write(200_000).unwrap();

    let broker = Arc::new(MockBroker::new(dec!(600)));

    // Session 1: fresh ledger, fallback universe, golden cross → buy.
    let fallback = vec![Target::new("5253", "Cover")];
    let universe = Box::new(LedgerUniverse::new(ledger.clone(), fallback.clone()));
    let history = FakeHistory::new().set("5253", GOLDEN);
    let session = build_session(broker.clone(), universe, history, ledger.clone(), capital.clone());
    let report1 = session.run().await.unwrap();

    assert_eq!(report1.buys_filled, 1);
    // 60,000 execution sits in the 99 tier.
    let after_first = 200_000 - 60_000 - 99;
    assert_eq!(report1.balance_after, after_first);
    assert_eq!(ledger.get("5253").unwrap().unwrap().quantity, 100);

    // Session 2: universe now derives from the held position; a dead
    // cross exits it at a profit.
    let broker2 = Arc::new(MockBroker::new(dec!(700)));
    let universe = Box::new(LedgerUniverse::new(ledger.clone(), fallback));
    let history = FakeHistory::new().set("5253", DEAD);
    let session = build_session(broker2.clone(), universe, history, ledger.clone(), capital.clone());
    let report2 = session.run().await.unwrap();

    assert_eq!(report2.targets_evaluated, 1);
    assert_eq!(report2.sells_filled, 1);
    assert!(ledger.get("5253").unwrap().is_none());
    // 70,000 proceeds in the 99 tier.
    assert_eq!(report2.balance_after, after_first + 70_000 - 99);
    assert_eq!(capital.read().unwrap(), report2.balance_after);
}

#[tokio::test]
async fn broker_failures_are_isolated_per_symbol() {
    let ledger = PositionLedger::new(temp_dir("iso"));
    let capital = CapitalAccount::new(temp_dir("iso_cap").join("capital.txt"));
    capital.write(500_000).unwrap();

    let broker = Arc::new(MockBroker::new(dec!(450)));
    broker.script("6176", Script::RefuseSubmit("symbol halted".to_string()));
    broker.script("4260", Script::NeverFill);

    let history = FakeHistory::new()
        .set("6176", GOLDEN)
        .set("4260", GOLDEN)
        .set("4424", GOLDEN);
    let universe = Box::new(FixedUniverse(vec![
        Target::new("6176", "a"),
        Target::new("4260", "d"),
        Target::new("4424", "c"),
    ]));

    let session = build_session(broker.clone(), universe, history, ledger.clone(), capital.clone());
    let report = session.run().await.unwrap();

    // Refused submission and timed-out fill both fail without blocking
    // the remaining symbol, and neither touches the ledger.
    assert_eq!(report.buys_failed, 2);
    assert_eq!(report.buys_filled, 1);
    assert!(ledger.get("6176").unwrap().is_none());
    assert!(ledger.get("4260").unwrap().is_none());
    assert_eq!(ledger.get("4424").unwrap().unwrap().quantity, 100);

    // Settlement covers only the one successful buy (45,000 → 55 tier).
    assert_eq!(capital.read().unwrap(), 500_000 - 45_000 - 55);
}

#[tokio::test]
async fn scan_failures_skip_symbols_without_orders() {
    let ledger = PositionLedger::new(temp_dir("skip"));
    let capital = CapitalAccount::new(temp_dir("skip_cap").join("capital.txt"));
    capital.write(100_000).unwrap();

    let broker = Arc::new(MockBroker::new(dec!(500)));

    // "9999" has no history at all; the scan must carry on.
    let history = FakeHistory::new().set("6176", GOLDEN);
    let universe = Box::new(FixedUniverse(vec![
        Target::new("9999", "ghost"),
        Target::new("6176", "a"),
    ]));

    let session = build_session(broker.clone(), universe, history, ledger, capital.clone());
    let report = session.run().await.unwrap();

    assert_eq!(report.symbols_skipped, 1);
    assert_eq!(report.buys_filled, 1);
    assert_eq!(broker.submissions().len(), 1);
}
