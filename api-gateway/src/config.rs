//! API gateway configuration.
//!
//! This only configures the HTTP listen address. The ledger configuration
//! comes from `ledger::LedgerConfig::load()`.

use std::net::SocketAddr;

/// Environment variable overriding [`ApiConfig::listen_addr`].
pub const LISTEN_ADDR_ENV: &str = "API_LISTEN_ADDR";

/// Configuration for the API gateway HTTP server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP server to.
    pub listen_addr: SocketAddr,
}

impl Default for ApiConfig {
    fn default() -> Self {
        // All interfaces, so a container port mapping is reachable.
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8081)),
        }
    }
}

impl ApiConfig {
    /// Defaults, with the listen address taken from `API_LISTEN_ADDR` when
    /// set.
    pub fn from_env() -> Result<Self, String> {
        let mut cfg = Self::default();
        if let Ok(raw) = std::env::var(LISTEN_ADDR_ENV) {
            cfg.listen_addr = raw
                .parse()
                .map_err(|e| format!("invalid {LISTEN_ADDR_ENV} {raw:?}: {e}"))?;
        }
        Ok(cfg)
    }
}
