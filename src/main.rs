//! TAQIKO — Daily Crossover Trading Agent
//!
//! Entry point. Loads configuration, initialises structured logging,
//! ensures a broker credential exists, and runs exactly one trading
//! session. Scheduling (one run per trading day, never concurrent) is
//! the caller's job — cron or an equivalent single-instance scheduler.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use taqiko::broker::kabu::KabuClient;
use taqiko::broker::token::{CredentialStore, FileTokenStore};
use taqiko::config::AppConfig;
use taqiko::data::stooq::StooqClient;
use taqiko::data::universe::LedgerUniverse;
use taqiko::engine::executor::{OrderExecutor, PollPolicy};
use taqiko::engine::session::TradingSession;
use taqiko::ledger::capital::CapitalAccount;
use taqiko::ledger::PositionLedger;
use taqiko::strategy::SignalScanner;

const BANNER: &str = r#"
 _____  _    ___  ___ _  _____
|_   _|/ \  / _ \|_ _| |/ / _ \
  | | / _ \| | | || || ' / | | |
  | |/ ___ \ |_| || || . \ |_| |
  |_/_/   \_\__\_\___|_|\_\___/

  Daily Crossover Trading Agent
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = AppConfig::load("config.toml")?;
    init_logging();

    println!("{BANNER}");
    info!(
        agent_name = %cfg.agent.name,
        order_qty = cfg.agent.order_qty,
        currency = %cfg.agent.currency,
        verification = cfg.broker.use_verification,
        "TAQIKO starting up"
    );

    // -- Broker client and credential -------------------------------------

    let store = Arc::new(FileTokenStore::new(&cfg.broker.token_dir));
    let broker = KabuClient::new(
        cfg.broker.effective_base_url(),
        store.clone(),
        cfg.broker.token_retry,
    )
    .context("Failed to build broker client")?;

    if store.load()?.is_none() {
        warn!("No stored broker credential — issuing a fresh token");
        let password = cfg
            .api_password()
            .context("Cannot issue a token without the API password")?;
        broker
            .issue_token(&password)
            .await
            .context("Broker token issuance failed")?;
    }

    // -- Session wiring ----------------------------------------------------

    let ledger = PositionLedger::new(&cfg.storage.positions_dir);
    let capital = CapitalAccount::new(&cfg.storage.capital_file);

    let universe = Box::new(LedgerUniverse::new(
        ledger.clone(),
        cfg.universe.fallback.clone(),
    ));
    let scanner = SignalScanner::new(
        Box::new(StooqClient::new(cfg.data.fetch_retry).context("Failed to build quote client")?),
        cfg.strategy.short_window,
        cfg.strategy.long_window,
    );
    let executor = OrderExecutor::new(Arc::new(broker));
    let poll = PollPolicy {
        max_wait: Duration::from_secs(cfg.broker.max_wait_secs),
        poll_interval: Duration::from_secs(cfg.broker.poll_interval_secs),
    };

    let session = TradingSession::new(
        universe,
        scanner,
        executor,
        ledger,
        capital,
        cfg.agent.order_qty,
        poll,
    );

    // -- One session per run -----------------------------------------------

    let report = session.run().await?;
    info!(
        evaluated = report.targets_evaluated,
        skipped = report.symbols_skipped,
        buys = format!("{}/{}", report.buys_filled, report.buy_candidates),
        sells = format!("{}/{}", report.sells_filled, report.sell_candidates),
        pnl = %report.realized_pnl,
        commission = report.commission_total,
        balance = report.balance_after,
        "TAQIKO finished"
    );

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("taqiko=info"));

    let json_logging = std::env::var("TAQIKO_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
