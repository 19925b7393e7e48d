//! Stooq daily-quote feed.
//!
//! Free CSV download endpoint, no auth:
//! `https://stooq.com/q/d/l/?s={symbol}.jp&i=d`
//! Columns: Date,Open,High,Low,Close,Volume. Unknown symbols return a
//! short plain-text body instead of a CSV header.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{DataSourceError, PriceHistory};
use crate::config::RetryPolicy;
use crate::types::Candle;

const BASE_URL: &str = "https://stooq.com/q/d/l";

/// Market suffix appended to every symbol (Tokyo listings).
const MARKET_SUFFIX: &str = "jp";

#[derive(Debug, Deserialize)]
struct QuoteRow {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Close")]
    close: Decimal,
}

/// Stooq-backed price history source.
///
/// Downloads retry within the configured bound; a symbol that still
/// fails is surfaced to the caller, which skips it.
pub struct StooqClient {
    http: Client,
    retry: RetryPolicy,
}

impl StooqClient {
    pub fn new(retry: RetryPolicy) -> Result<Self, DataSourceError> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .user_agent("TAQIKO/0.1.0")
            .build()?;
        Ok(Self { http, retry })
    }

    async fn download(&self, symbol: &str) -> Result<String, DataSourceError> {
        let url = format!("{BASE_URL}/?s={symbol}.{MARKET_SUFFIX}&i=d");
        debug!(url = %url, "Fetching daily quotes");

        let mut last_err = None;
        for attempt in 1..=self.retry.max_attempts.max(1) {
            match self.try_download(&url).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    warn!(
                        symbol,
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        error = %e,
                        "Quote download failed"
                    );
                    last_err = Some(e);
                    if attempt < self.retry.max_attempts {
                        tokio::time::sleep(self.retry.backoff()).await;
                    }
                }
            }
        }
        Err(last_err.unwrap_or_else(|| DataSourceError::Malformed("no attempts made".into())))
    }

    async fn try_download(&self, url: &str) -> Result<String, DataSourceError> {
        let resp = self.http.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(DataSourceError::Malformed(format!(
                "quote endpoint returned {}",
                resp.status()
            )));
        }
        Ok(resp.text().await?)
    }
}

/// Parse a Stooq daily CSV body into an ascending candle series.
pub fn parse_daily_csv(symbol: &str, body: &str) -> Result<Vec<Candle>, DataSourceError> {
    if !body.starts_with("Date,") {
        // "No data" / error page rather than a CSV payload.
        return Err(DataSourceError::Empty {
            symbol: symbol.to_string(),
        });
    }

    let mut reader = csv::Reader::from_reader(body.as_bytes());
    let mut candles = Vec::new();
    for row in reader.deserialize::<QuoteRow>() {
        let row = row.map_err(|e| DataSourceError::Malformed(e.to_string()))?;
        candles.push(Candle {
            date: row.date,
            close: row.close,
        });
    }

    if candles.is_empty() {
        return Err(DataSourceError::Empty {
            symbol: symbol.to_string(),
        });
    }

    candles.sort_by_key(|c| c.date);
    Ok(candles)
}

#[async_trait]
impl PriceHistory for StooqClient {
    async fn daily_closes(&self, symbol: &str) -> Result<Vec<Candle>, DataSourceError> {
        let body = self.download(symbol).await?;
        let candles = parse_daily_csv(symbol, &body)?;
        debug!(symbol, days = candles.len(), "Daily closes fetched");
        Ok(candles)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
