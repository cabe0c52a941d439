//! Top-level configuration for a ledger node.
//!
//! This module aggregates configuration for:
//!
//! - transaction limits and signature policy (`TxConfig`),
//! - Rapid Stake Consensus scoring (`RscConfig`),
//! - the transaction pool (`PoolConfig`),
//! - the metrics exporter (enable flag + listen address),
//! - the epoch interval.
//!
//! Every section has defaults, so a JSON file only needs to name the
//! values it overrides:
//!
//! ```json
//! { "rsc": { "min_response_count": 5 }, "epoch_secs": 10 }
//! ```

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::consensus::RscConfig;
use crate::pool::PoolConfig;
use crate::validation::TxConfig;

/// Environment variable holding the path of a JSON config file.
pub const CONFIG_ENV: &str = "LEDGER_CONFIG";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Configuration for the Prometheus metrics exporter.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Whether to run a `/metrics` HTTP exporter.
    pub enabled: bool,
    /// Address to bind the metrics HTTP server to.
    pub listen_addr: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 9898)),
        }
    }
}

/// Top-level configuration for a ledger node.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub tx: TxConfig,
    pub rsc: RscConfig,
    pub pool: PoolConfig,
    pub metrics: MetricsConfig,
    /// Seconds between RSC rounds.
    pub epoch_secs: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            tx: TxConfig::default(),
            rsc: RscConfig::default(),
            pool: PoolConfig::default(),
            metrics: MetricsConfig::default(),
            epoch_secs: 5,
        }
    }
}

impl LedgerConfig {
    /// Reads and validates a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        let cfg: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })?;
        cfg.check()?;
        Ok(cfg)
    }

    /// Loads the file named by `LEDGER_CONFIG`, or the defaults if unset.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.is_empty() => {
                info!(%path, "loading ledger config");
                Self::from_json_file(path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn epoch_interval(&self) -> Duration {
        Duration::from_secs(self.epoch_secs)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.epoch_secs == 0 {
            return Err(ConfigError::Invalid("epoch_secs must be positive"));
        }
        if self.tx.limits.max_inputs == 0 || self.tx.limits.max_outputs == 0 {
            return Err(ConfigError::Invalid("transaction limits must be positive"));
        }
        let weights = [self.rsc.reliability_weight, self.rsc.performance_weight];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ConfigError::Invalid("rsc weights must be finite and non-negative"));
        }
        if self.pool.capacity == 0 {
            return Err(ConfigError::Invalid("pool capacity must be positive"));
        }
        Ok(())
    }
}
