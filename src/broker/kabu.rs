//! Kabu-station-style broker REST client.
//!
//! Endpoints (all on a localhost gateway):
//! - `POST /token {password}` → API credential
//! - `POST /orders {symbol, side, qty, order_type}` → order id
//! - `GET /orders/{id}` → status and fill price
//!
//! Orders authenticate with the stored credential via `X-API-KEY`.
//! Token issuance retries bounded connectivity failures; order
//! submission never retries — once an order may have reached the
//! broker, a resend risks double execution.

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::token::CredentialStore;
use super::{BrokerApi, BrokerError, OrderHandle, OrderStatus};
use crate::config::RetryPolicy;
use crate::types::Side;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Debug, Serialize)]
struct OrderRequest<'a> {
    symbol: &'a str,
    side: &'a str,
    qty: u64,
    order_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    order_id: String,
}

/// Shape of `GET /orders/{id}`.
///
/// `state`: "pending" | "partial" | "filled" | "rejected".
#[derive(Debug, Deserialize)]
struct OrderStatusResponse {
    state: String,
    #[serde(default)]
    filled_qty: u64,
    #[serde(default)]
    price: Option<Decimal>,
    #[serde(default)]
    reason: Option<String>,
}

fn side_param(side: Side) -> &'static str {
    match side {
        Side::Buy => "buy",
        Side::Sell => "sell",
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for the broker gateway.
pub struct KabuClient {
    http: Client,
    base_url: String,
    store: Arc<dyn CredentialStore>,
    token_retry: RetryPolicy,
}

impl KabuClient {
    pub fn new(
        base_url: impl Into<String>,
        store: Arc<dyn CredentialStore>,
        token_retry: RetryPolicy,
    ) -> Result<Self, BrokerError> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .user_agent("TAQIKO/0.1.0")
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            store,
            token_retry,
        })
    }

    /// Whether a credential is already stored.
    pub fn has_credential(&self) -> Result<bool, BrokerError> {
        Ok(self.store.load()?.is_some())
    }

    /// Issue a fresh API token and store it, replacing any prior one.
    ///
    /// Connectivity failures are retried per the configured policy;
    /// a non-success response is not retried.
    pub async fn issue_token(&self, password: &SecretString) -> Result<(), BrokerError> {
        let url = format!("{}/token", self.base_url);

        let mut attempt = 0;
        let token = loop {
            attempt += 1;
            match self.request_token(&url, password).await {
                Ok(token) => break token,
                Err(BrokerError::Transport(e)) if attempt < self.token_retry.max_attempts => {
                    warn!(
                        attempt,
                        max_attempts = self.token_retry.max_attempts,
                        error = %e,
                        "Token issuance failed, retrying"
                    );
                    tokio::time::sleep(self.token_retry.backoff()).await;
                }
                Err(e) => return Err(e),
            }
        };

        self.store.save(&token)?;
        info!("Broker API token issued");
        Ok(())
    }

    async fn request_token(
        &self,
        url: &str,
        password: &SecretString,
    ) -> Result<String, BrokerError> {
        let resp = self
            .http
            .post(url)
            .json(&TokenRequest {
                password: password.expose_secret(),
            })
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let reason = resp.text().await.unwrap_or_default();
            return Err(BrokerError::Api { status, reason });
        }

        let body: TokenResponse = resp.json().await?;
        Ok(body.token)
    }

    fn api_key(&self) -> Result<String, BrokerError> {
        self.store.load()?.ok_or(BrokerError::MissingCredential)
    }
}

#[async_trait]
impl BrokerApi for KabuClient {
    async fn submit_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: u64,
    ) -> Result<OrderHandle, BrokerError> {
        let url = format!("{}/orders", self.base_url);
        let api_key = self.api_key()?;

        debug!(symbol, %side, quantity, "Submitting market order");

        let resp = self
            .http
            .post(&url)
            .header("X-API-KEY", api_key)
            .json(&OrderRequest {
                symbol,
                side: side_param(side),
                qty: quantity,
                order_type: "market",
            })
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let reason = resp.text().await.unwrap_or_default();
            return Err(BrokerError::Api { status, reason });
        }

        let body: OrderResponse = resp.json().await?;
        info!(symbol, %side, quantity, order_id = %body.order_id, "Order accepted");

        Ok(OrderHandle {
            id: body.order_id,
            symbol: symbol.to_string(),
            side,
            quantity,
        })
    }

    async fn order_status(&self, handle: &OrderHandle) -> Result<OrderStatus, BrokerError> {
        let url = format!("{}/orders/{}", self.base_url, handle.id);
        let api_key = self.api_key()?;

        let resp = self.http.get(&url).header("X-API-KEY", api_key).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let reason = resp.text().await.unwrap_or_default();
            return Err(BrokerError::Api { status, reason });
        }

        let body: OrderStatusResponse = resp.json().await?;
        let status = match body.state.as_str() {
            "filled" => {
                let price = body.price.ok_or_else(|| BrokerError::Api {
                    status: 200,
                    reason: format!("order {} filled without a price", handle.id),
                })?;
                OrderStatus::Filled { price }
            }
            "rejected" => OrderStatus::Rejected {
                reason: body.reason.unwrap_or_else(|| "unspecified".to_string()),
            },
            "partial" => OrderStatus::PartiallyFilled {
                filled: body.filled_qty,
            },
            _ => OrderStatus::Pending,
        };

        debug!(order_id = %handle.id, ?status, "Order status polled");
        Ok(status)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_param() {
        assert_eq!(side_param(Side::Buy), "buy");
        assert_eq!(side_param(Side::Sell), "sell");
    }

    #[test]
    fn test_status_response_shapes() {
        let filled: OrderStatusResponse =
            serde_json::from_str(r#"{"state":"filled","filled_qty":100,"price":512.5}"#).unwrap();
        assert_eq!(filled.state, "filled");
        assert_eq!(filled.price, Some(rust_decimal_macros::dec!(512.5)));

        let pending: OrderStatusResponse = serde_json::from_str(r#"{"state":"pending"}"#).unwrap();
        assert_eq!(pending.filled_qty, 0);
        assert!(pending.price.is_none());

        let rejected: OrderStatusResponse =
            serde_json::from_str(r#"{"state":"rejected","reason":"insufficient funds"}"#).unwrap();
        assert_eq!(rejected.reason.as_deref(), Some("insufficient funds"));
    }

    #[test]
    fn test_order_request_wire_format() {
        let body = serde_json::to_value(OrderRequest {
            symbol: "6176",
            side: "buy",
            qty: 100,
            order_type: "market",
        })
        .unwrap();
        assert_eq!(body["symbol"], "6176");
        assert_eq!(body["side"], "buy");
        assert_eq!(body["qty"], 100);
        assert_eq!(body["order_type"], "market");
    }
}
