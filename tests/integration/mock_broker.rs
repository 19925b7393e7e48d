//! Mock broker for integration testing.
//!
//! Provides a deterministic `BrokerApi` implementation that accepts
//! orders, walks them through a scripted sequence of statuses, and
//! records every submission — all in-memory with no external
//! dependencies.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use taqiko::broker::{BrokerApi, BrokerError, OrderHandle, OrderStatus};
use taqiko::types::Side;

/// Per-symbol behavior script.
#[derive(Debug, Clone)]
pub enum Script {
    /// Fill at this price after `pending_polls` pending responses.
    Fill { price: Decimal, pending_polls: u32 },
    /// Reject the submission outright with this reason.
    RefuseSubmit(String),
    /// Accept the submission but report a terminal rejection on poll.
    RejectOnPoll(String),
    /// Accept the submission and stay pending forever.
    NeverFill,
}

#[derive(Debug, Clone)]
pub struct SubmittedOrder {
    pub symbol: String,
    pub side: Side,
    pub quantity: u64,
}

struct OrderState {
    script: Script,
    polls: u32,
}

/// A scriptable in-memory broker.
///
/// Symbols without a script fill immediately at the default price.
pub struct MockBroker {
    default_price: Decimal,
    scripts: Mutex<HashMap<String, Script>>,
    orders: Mutex<HashMap<String, OrderState>>,
    submissions: Arc<Mutex<Vec<SubmittedOrder>>>,
}

impl MockBroker {
    pub fn new(default_price: Decimal) -> Self {
        Self {
            default_price,
            scripts: Mutex::new(HashMap::new()),
            orders: Mutex::new(HashMap::new()),
            submissions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn script(&self, symbol: &str, script: Script) {
        self.scripts
            .lock()
            .unwrap()
            .insert(symbol.to_string(), script);
    }

    /// Every order this broker has accepted, in submission order.
    pub fn submissions(&self) -> Vec<SubmittedOrder> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl BrokerApi for MockBroker {
    async fn submit_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: u64,
    ) -> Result<OrderHandle, BrokerError> {
        let script = self
            .scripts
            .lock()
            .unwrap()
            .get(symbol)
            .cloned()
            .unwrap_or(Script::Fill {
                price: self.default_price,
                pending_polls: 0,
            });

        if let Script::RefuseSubmit(reason) = &script {
            return Err(BrokerError::Api {
                status: 400,
                reason: reason.clone(),
            });
        }

        self.submissions.lock().unwrap().push(SubmittedOrder {
            symbol: symbol.to_string(),
            side,
            quantity,
        });

        let id = Uuid::new_v4().to_string();
        self.orders
            .lock()
            .unwrap()
            .insert(id.clone(), OrderState { script, polls: 0 });

        Ok(OrderHandle {
            id,
            symbol: symbol.to_string(),
            side,
            quantity,
        })
    }

    async fn order_status(&self, handle: &OrderHandle) -> Result<OrderStatus, BrokerError> {
        let mut orders = self.orders.lock().unwrap();
        let state = orders.get_mut(&handle.id).ok_or_else(|| BrokerError::Api {
            status: 404,
            reason: format!("unknown order {}", handle.id),
        })?;

        state.polls += 1;
        match &state.script {
            Script::Fill {
                price,
                pending_polls,
            } => {
                if state.polls > *pending_polls {
                    Ok(OrderStatus::Filled { price: *price })
                } else {
                    Ok(OrderStatus::Pending)
                }
            }
            Script::RejectOnPoll(reason) => Ok(OrderStatus::Rejected {
                reason: reason.clone(),
            }),
            Script::NeverFill => Ok(OrderStatus::Pending),
            Script::RefuseSubmit(_) => unreachable!("refused orders are never submitted"),
        }
    }
}
