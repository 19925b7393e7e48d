//! Tiered brokerage commission table for cash-equity executions.
//!
//! Fee schedule (currency units per executed order):
//!
//! | execution amount ≤ | fee  |
//! |--------------------|------|
//! | 50,000             | 55   |
//! | 100,000            | 99   |
//! | 200,000            | 115  |
//! | 500,000            | 275  |
//! | 1,000,000          | 535  |
//! | above              | floor(amount × 0.099%) + 99, capped at 4,059 |

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;

/// Fee rate applied above the top fixed tier.
const OVERFLOW_RATE: Decimal = dec!(0.00099);

/// Flat component added to the overflow-rate fee.
const OVERFLOW_BASE: i64 = 99;

/// Hard ceiling on any single commission.
const COMMISSION_CAP: i64 = 4059;

/// Commission for one execution, by gross execution amount.
///
/// Monotonic non-decreasing and bounded above by [`COMMISSION_CAP`].
/// Zero or negative amounts fall into the lowest tier; the schedule has
/// no error conditions.
pub fn commission(execution_amount: Decimal) -> i64 {
    if execution_amount <= dec!(50_000) {
        55
    } else if execution_amount <= dec!(100_000) {
        99
    } else if execution_amount <= dec!(200_000) {
        115
    } else if execution_amount <= dec!(500_000) {
        275
    } else if execution_amount <= dec!(1_000_000) {
        535
    } else {
        let rated = (execution_amount * OVERFLOW_RATE)
            .floor()
            .to_i64()
            .unwrap_or(COMMISSION_CAP)
            + OVERFLOW_BASE;
        rated.min(COMMISSION_CAP)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
