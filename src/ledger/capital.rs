//! Capital account — the single persisted order-placement balance.
//!
//! One text file holding an integer number of currency units. A missing
//! file reads as zero (first run). Writes go to a temporary file that is
//! renamed over the target, so the balance on disk is always either the
//! old value or the new one, never a torn write.

use anyhow::{Context, Result};
use rust_decimal::prelude::*;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

use super::commission::commission;
use crate::types::Fill;

/// File-backed capital account.
#[derive(Debug, Clone)]
pub struct CapitalAccount {
    path: PathBuf,
}

/// Line items computed during a settlement, for reporting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settlement {
    pub balance_before: i64,
    pub balance_after: i64,
    pub buy_total: Decimal,
    pub sell_total: Decimal,
    pub realized_pnl: Decimal,
    pub commission_total: i64,
}

impl CapitalAccount {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Current balance; `0` if no record exists yet.
    pub fn read(&self) -> Result<i64> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No capital record, balance is 0");
            return Ok(0);
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read capital record {}", self.path.display()))?;
        raw.trim()
            .parse::<i64>()
            .with_context(|| format!("Capital record {} is not an integer", self.path.display()))
    }

    /// Replace the persisted balance. Durable before returning.
    pub fn write(&self, amount: i64) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let tmp = self
            .path
            .with_extension(format!("tmp.{}", uuid::Uuid::new_v4()));
        fs::write(&tmp, amount.to_string())
            .with_context(|| format!("Failed to write capital record {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace capital record {}", self.path.display()))?;

        debug!(path = %self.path.display(), amount, "Capital record written");
        Ok(())
    }

    /// Fold a session's fills into the balance:
    /// `balance + (sell total − buy total) − Σ commission(qty × price)`.
    ///
    /// The fractional part of the delta is truncated, matching the
    /// integer balance record.
    pub fn settle(&self, buy_fills: &[Fill], sell_fills: &[Fill]) -> Result<Settlement> {
        let balance_before = self.read()?;

        let commission_total: i64 = buy_fills
            .iter()
            .chain(sell_fills)
            .map(|f| commission(f.execution_amount()))
            .sum();

        let buy_total: Decimal = buy_fills.iter().map(Fill::execution_amount).sum();
        let sell_total: Decimal = sell_fills.iter().map(Fill::execution_amount).sum();
        let realized_pnl = sell_total - buy_total;

        let balance_after = (Decimal::from(balance_before) + realized_pnl
            - Decimal::from(commission_total))
        .trunc()
        .to_i64()
        .context("Settled balance exceeds the representable range")?;

        self.write(balance_after)?;

        info!(
            balance_before,
            balance_after,
            buy_total = %buy_total,
            sell_total = %sell_total,
            realized_pnl = %realized_pnl,
            commission_total,
            "Capital settled"
        );

        Ok(Settlement {
            balance_before,
            balance_after,
            buy_total,
            sell_total,
            realized_pnl,
            commission_total,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
