//! Common utilities shared across examples.

#![allow(dead_code)]

use anyhow::{Context, Result};
use fixlink::prelude::{CertificatePolicy, SessionConfig, Side};
use rust_decimal::Decimal;
use std::env;

/// Default FIX host.
pub const DEFAULT_HOST: &str = "demo-uk-eqx-01.p.c-trader.com";

/// Example configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ExampleConfig {
    /// FIX host name.
    pub host: String,
    /// Sender CompID.
    pub sender_comp_id: String,
    /// Logon username; derived from the sender CompID when unset.
    pub username: Option<String>,
    /// Logon password.
    pub password: String,
    /// Symbol to poll and trade.
    pub symbol_id: u64,
    /// Order volume; no order is placed when unset.
    pub volume: Option<Decimal>,
    /// Order side, `1` (buy) or `2` (sell).
    pub side: Side,
    /// Skip server certificate validation.
    pub accept_any_certificate: bool,
}

impl ExampleConfig {
    /// Loads the configuration from `FIX_*` environment variables.
    ///
    /// # Errors
    /// Returns an error if a required variable is missing or malformed.
    pub fn from_env() -> Result<Self> {
        let symbol_id = match env::var("FIX_SYMBOL_ID") {
            Ok(raw) => raw.parse().context("FIX_SYMBOL_ID must be an integer")?,
            Err(_) => 1,
        };
        let volume = env::var("FIX_VOLUME")
            .ok()
            .map(|raw| raw.parse::<Decimal>())
            .transpose()
            .context("FIX_VOLUME must be a decimal")?;
        let side = match env::var("FIX_SIDE") {
            Ok(raw) => raw
                .parse::<char>()
                .ok()
                .and_then(Side::from_char)
                .context("FIX_SIDE must be 1 or 2")?,
            Err(_) => Side::Buy,
        };

        Ok(Self {
            host: env::var("FIX_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            sender_comp_id: env::var("FIX_SENDER_COMP_ID").context("FIX_SENDER_COMP_ID is required")?,
            username: env::var("FIX_USERNAME").ok(),
            password: env::var("FIX_PASSWORD").context("FIX_PASSWORD is required")?,
            symbol_id,
            volume,
            side,
            accept_any_certificate: env::var("FIX_ACCEPT_ANY_CERT").is_ok_and(|v| v == "1"),
        })
    }

    /// Builds the session configuration shared by both channels.
    ///
    /// # Errors
    /// Returns an error if the values fail validation.
    pub fn session_config(&self) -> Result<SessionConfig> {
        let mut builder = SessionConfig::builder()
            .host(&self.host)
            .sender_comp_id(&self.sender_comp_id)
            .password(&self.password);
        if let Some(username) = &self.username {
            builder = builder.username(username);
        }
        if self.accept_any_certificate {
            builder = builder.certificate_policy(CertificatePolicy::AcceptAny);
        }
        Ok(builder.build()?)
    }
}

/// Initializes logging for examples.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}
