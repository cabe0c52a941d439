//! Shared application state.

use std::sync::Arc;

use tokio::sync::Mutex;

use ledger::{DefaultTransactionValidator, MetricsRegistry, RscEngine, TxPool, ValidationContext};

/// Shared state held by the API and background tasks.
///
/// This is wrapped in an [`Arc`] and passed to request handlers via Axum's
/// `State` extractor. When both locks are needed, `engine` is taken before
/// `tx_pool`.
pub struct AppState {
    /// Node registry and ranking; one RSC round at a time.
    pub engine: Mutex<RscEngine>,
    /// Validated transactions and their pending tips.
    pub tx_pool: Mutex<TxPool>,
    /// Validation needs only shared access.
    pub validator: DefaultTransactionValidator,
    pub validation_ctx: ValidationContext,
    /// Metrics registry shared between the epoch loop and the API.
    pub metrics: Arc<MetricsRegistry>,
}

/// Thread-safe alias for `AppState`.
pub type SharedState = Arc<AppState>;

#[cfg(test)]
pub fn test_state() -> SharedState {
    use ledger::{KeyedDigestScheme, RscConfig, TransactionValidator, TxConfig};

    Arc::new(AppState {
        engine: Mutex::new(RscEngine::new(RscConfig::default())),
        tx_pool: Mutex::new(TxPool::default()),
        validator: TransactionValidator::new(&TxConfig::default(), KeyedDigestScheme),
        validation_ctx: ValidationContext::initialized(),
        metrics: Arc::new(MetricsRegistry::new().expect("metrics registry")),
    })
}
