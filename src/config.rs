//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (the broker API password) are referenced by env-var name in
//! the config and resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;

use crate::data::Target;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub agent: AgentConfig,
    pub broker: BrokerConfig,
    pub data: DataConfig,
    pub strategy: StrategyConfig,
    pub storage: StorageConfig,
    pub universe: UniverseConfig,
}

/// Bounded retry for pre-acknowledgment connectivity failures.
/// Nothing is ever retried once a real order may have reached the
/// broker.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_secs: u64,
}

impl RetryPolicy {
    pub fn backoff(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.backoff_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AgentConfig {
    pub name: String,
    /// Shares per market order.
    pub order_qty: u64,
    pub currency: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BrokerConfig {
    /// Live gateway base URL.
    pub base_url: String,
    /// Verification (paper) gateway base URL.
    pub verification_base_url: String,
    /// Route orders to the verification gateway instead of the live one.
    pub use_verification: bool,
    /// Env var holding the API password used for token issuance.
    pub api_password_env: String,
    /// Directory holding the single-slot credential file.
    pub token_dir: String,
    /// Fill-wait bound per order, seconds.
    pub max_wait_secs: u64,
    /// Status poll cadence, seconds.
    pub poll_interval_secs: u64,
    /// Retry bounds for token issuance.
    pub token_retry: RetryPolicy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    /// Retry bounds for quote downloads.
    pub fetch_retry: RetryPolicy,
}

impl BrokerConfig {
    /// Base URL the session should actually talk to.
    pub fn effective_base_url(&self) -> &str {
        if self.use_verification {
            &self.verification_base_url
        } else {
            &self.base_url
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StrategyConfig {
    /// Short SMA window, days.
    pub short_window: usize,
    /// Long SMA window, days.
    pub long_window: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory for position records.
    pub positions_dir: String,
    /// Path of the capital balance record.
    pub capital_file: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UniverseConfig {
    /// Fixed target list used when no positions are held yet.
    pub fallback: Vec<Target>,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }

    /// Resolve the broker API password into a secret.
    pub fn api_password(&self) -> Result<SecretString> {
        Ok(SecretString::new(Self::resolve_env(
            &self.broker.api_password_env,
        )?))
    }
}
