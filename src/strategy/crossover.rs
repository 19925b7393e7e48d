//! Moving-average crossover detection.
//!
//! Computes short/long simple moving averages over an ascending series
//! of daily closes and flags strict golden/dead crosses. A cross on day
//! `t` requires the short average to be at-or-below (golden) or
//! at-or-above (dead) the long average on day `t−1` and strictly on the
//! other side on day `t` — a flat continuation of "short already above
//! long" is not a new signal.

use rust_decimal::Decimal;

use crate::types::Candle;

/// Default short SMA window (days).
pub const SHORT_WINDOW: usize = 5;

/// Default long SMA window (days).
pub const LONG_WINDOW: usize = 25;

/// Direction of a strict crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cross {
    /// Short average crossed above the long average.
    Golden,
    /// Short average crossed below the long average.
    Dead,
}

/// Simple moving average over the trailing `window` values.
///
/// Positions with fewer than `window` samples behind them are
/// undefined (`None`).
pub fn sma(closes: &[Decimal], window: usize) -> Vec<Option<Decimal>> {
    if window == 0 {
        return vec![None; closes.len()];
    }

    let divisor = Decimal::from(window as u64);
    let mut out = Vec::with_capacity(closes.len());
    let mut running = Decimal::ZERO;

    for (i, close) in closes.iter().enumerate() {
        running += close;
        if i >= window {
            running -= closes[i - window];
        }
        if i + 1 >= window {
            out.push(Some(running / divisor));
        } else {
            out.push(None);
        }
    }
    out
}

/// Per-day strict crossing flags for a close series.
///
/// Days where either average is undefined — or was undefined the day
/// before — carry no flag.
pub fn cross_flags(closes: &[Decimal], short: usize, long: usize) -> Vec<Option<Cross>> {
    let short_ma = sma(closes, short);
    let long_ma = sma(closes, long);

    let mut flags = vec![None; closes.len()];
    for t in 1..closes.len() {
        let (Some(s_prev), Some(l_prev)) = (short_ma[t - 1], long_ma[t - 1]) else {
            continue;
        };
        let (Some(s_now), Some(l_now)) = (short_ma[t], long_ma[t]) else {
            continue;
        };

        if s_prev <= l_prev && s_now > l_now {
            flags[t] = Some(Cross::Golden);
        } else if s_prev >= l_prev && s_now < l_now {
            flags[t] = Some(Cross::Dead);
        }
    }
    flags
}

/// Crossing state of the most recent fully-computed day — the
/// "yesterday" relative to the session's reference date (the last
/// element of the series is today's still-forming day).
pub fn signal_for_session(candles: &[Candle], short: usize, long: usize) -> Option<Cross> {
    if candles.len() < 2 {
        return None;
    }
    let closes: Vec<Decimal> = candles.iter().map(|c| c.close).collect();
    let flags = cross_flags(&closes, short, long);
    flags[flags.len() - 2]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
