//! Broker integration.
//!
//! Defines the `BrokerApi` trait the order executor drives, plus the
//! single-slot credential store used for API tokens. The concrete
//! implementation (`kabu`) talks to a kabu-station-style local REST
//! endpoint.

pub mod kabu;
pub mod token;

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::time::Duration;
use thiserror::Error;

use crate::types::Side;

#[derive(Debug, Error)]
pub enum BrokerError {
    /// No API credential in the store — a token must be issued first.
    #[error("no API credential stored; issue a token before trading")]
    MissingCredential,

    #[error("broker transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP response; the broker's reason payload is
    /// surfaced verbatim, never swallowed.
    #[error("broker returned {status}: {reason}")]
    Api { status: u16, reason: String },

    /// Terminal rejection reported by the broker for a live order.
    #[error("order {order_id} rejected: {reason}")]
    Rejected { order_id: String, reason: String },

    /// No terminal state observed within the polling bound.
    #[error("order {order_id} not filled within {waited:?}")]
    Timeout { order_id: String, waited: Duration },

    #[error("credential store failure: {0}")]
    Store(#[from] std::io::Error),
}

/// Identifier for a submitted order, carried through the polling loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderHandle {
    pub id: String,
    pub symbol: String,
    pub side: Side,
    pub quantity: u64,
}

/// Broker-reported state of one order.
///
/// Partial execution is not terminal — the executor keeps polling
/// until the order is fully filled, rejected, or timed out.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderStatus {
    Pending,
    PartiallyFilled { filled: u64 },
    Filled { price: Decimal },
    Rejected { reason: String },
}

/// Order submission and status endpoint of the broker.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BrokerApi: Send + Sync {
    /// Submit a market order. Fails on any non-success response; the
    /// broker's reason payload rides along in the error.
    async fn submit_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: u64,
    ) -> Result<OrderHandle, BrokerError>;

    /// Current status of a previously submitted order.
    async fn order_status(&self, handle: &OrderHandle) -> Result<OrderStatus, BrokerError>;
}
