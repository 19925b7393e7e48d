//! Order executor — submit a market order and wait for its fill.
//!
//! One order walks `Submitted → Polling → {Filled | TimedOut |
//! Rejected}`. Polling blocks the session's single thread of control;
//! waits are bounded by `max_wait`, and a timeout is the only way a
//! wait terminates early. Transient broker errors during a poll are
//! tolerated — the loop keeps polling until a terminal state or the
//! bound. A submitted order is never re-sent.

use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::broker::{BrokerApi, BrokerError, OrderHandle, OrderStatus};
use crate::types::{Fill, Side};

/// Polling bounds for one fill wait.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub max_wait: Duration,
    pub poll_interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_wait: Duration::from_secs(30),
            poll_interval: Duration::from_secs(1),
        }
    }
}

/// Drives one broker endpoint through submit/poll cycles.
pub struct OrderExecutor {
    broker: Arc<dyn BrokerApi>,
}

impl OrderExecutor {
    pub fn new(broker: Arc<dyn BrokerApi>) -> Self {
        Self { broker }
    }

    /// Submit a market order.
    pub async fn submit(
        &self,
        symbol: &str,
        side: Side,
        quantity: u64,
    ) -> Result<OrderHandle, BrokerError> {
        self.broker.submit_order(symbol, side, quantity).await
    }

    /// Poll a submitted order until it fills, is rejected, or the wait
    /// bound elapses. Partial execution is not terminal.
    pub async fn await_fill(
        &self,
        handle: &OrderHandle,
        policy: &PollPolicy,
    ) -> Result<Decimal, BrokerError> {
        let started = Instant::now();

        loop {
            match self.broker.order_status(handle).await {
                Ok(OrderStatus::Filled { price }) => {
                    info!(
                        order_id = %handle.id,
                        symbol = %handle.symbol,
                        price = %price,
                        "Order filled"
                    );
                    return Ok(price);
                }
                Ok(OrderStatus::Rejected { reason }) => {
                    return Err(BrokerError::Rejected {
                        order_id: handle.id.clone(),
                        reason,
                    });
                }
                Ok(OrderStatus::PartiallyFilled { filled }) => {
                    // Not terminal: keep waiting for the remainder.
                    warn!(
                        order_id = %handle.id,
                        filled,
                        quantity = handle.quantity,
                        "Partial execution, continuing to poll"
                    );
                }
                Ok(OrderStatus::Pending) => {}
                Err(BrokerError::MissingCredential) => {
                    return Err(BrokerError::MissingCredential);
                }
                Err(e) => {
                    // Transient poll failure: tolerate and retry on the
                    // next tick rather than aborting the whole wait.
                    warn!(order_id = %handle.id, error = %e, "Status poll failed");
                }
            }

            if started.elapsed() >= policy.max_wait {
                return Err(BrokerError::Timeout {
                    order_id: handle.id.clone(),
                    waited: policy.max_wait,
                });
            }
            tokio::time::sleep(policy.poll_interval).await;
        }
    }

    /// Submit and wait in one step, producing a [`Fill`] on success.
    pub async fn execute(
        &self,
        symbol: &str,
        side: Side,
        quantity: u64,
        policy: &PollPolicy,
    ) -> Result<Fill, BrokerError> {
        let handle = self.submit(symbol, side, quantity).await?;
        let price = self.await_fill(&handle, policy).await?;
        Ok(Fill {
            symbol: handle.symbol,
            side: handle.side,
            quantity: handle.quantity,
            price,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
