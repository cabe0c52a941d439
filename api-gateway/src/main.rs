// api-gateway/src/main.rs

//! API gateway binary.
//!
//! This binary exposes a small HTTP API on top of the `ledger` crate:
//!
//! - `GET /health`
//! - `POST /transactions`
//! - `GET /rapid-table`
//! - `POST /nodes`
//! - `POST /nodes/{node_id}/metrics`
//!
//! It embeds an `RscEngine`, a validated transaction pool, a background
//! epoch loop that pays pooled tips down the rapid table, and a Prometheus
//! metrics exporter on `/metrics`.

mod config;
mod routes;
mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::signal;
use tracing_subscriber::EnvFilter;

use config::ApiConfig;
use ledger::{
    KeyedDigestScheme, LedgerConfig, MetricsRegistry, PqSignatureScheme, RscEngine,
    TransactionValidator, TxPool, ValidationContext, run_prometheus_http_server,
};
use routes::{health, nodes, rapid_table, transactions};
use state::{AppState, SharedState};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("api_gateway=info,ledger=info")),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let api_cfg = ApiConfig::from_env()?;
    let ledger_cfg = LedgerConfig::load().map_err(|e| format!("failed to load config: {e}"))?;

    // ---------------------------
    // Metrics
    // ---------------------------

    let metrics = Arc::new(
        MetricsRegistry::new()
            .map_err(|e| format!("failed to initialise metrics registry: {e}"))?,
    );

    if ledger_cfg.metrics.enabled {
        let metrics_clone = metrics.clone();
        let addr = ledger_cfg.metrics.listen_addr;
        tokio::spawn(async move {
            if let Err(e) = run_prometheus_http_server(metrics_clone, addr).await {
                tracing::warn!("metrics HTTP server error: {e}");
            }
        });
        tracing::info!("metrics exporter listening on http://{}/metrics", addr);
    }

    // ---------------------------
    // Shared state
    // ---------------------------

    let app_state: SharedState = Arc::new(AppState {
        engine: tokio::sync::Mutex::new(RscEngine::new(ledger_cfg.rsc.clone())),
        tx_pool: tokio::sync::Mutex::new(TxPool::new(ledger_cfg.pool)),
        validator: TransactionValidator::new(&ledger_cfg.tx, KeyedDigestScheme),
        validation_ctx: ValidationContext::initialized(),
        metrics: metrics.clone(),
    });

    if !app_state.validator.scheme().is_unforgeable() {
        tracing::warn!(
            "validating with KeyedDigestScheme: signatures can be forged from public keys, \
             do not expose this gateway to untrusted clients"
        );
    }

    // ---------------------------
    // Epoch loop
    // ---------------------------

    let epoch_state = app_state.clone();
    let interval = ledger_cfg.epoch_interval();
    tokio::spawn(async move {
        run_epoch_loop(epoch_state, interval).await;
    });

    // ---------------------------
    // HTTP router
    // ---------------------------

    let app = Router::new()
        .route("/health", get(health::health))
        .route("/transactions", post(transactions::submit_transaction))
        .route("/rapid-table", get(rapid_table::rapid_table))
        .route("/nodes", post(nodes::register_node))
        .route("/nodes/{node_id}/metrics", post(nodes::report_metrics))
        .with_state(app_state);

    // ---------------------------
    // axum 0.8 server (hyper 1 / tokio 1.48 style)
    // ---------------------------

    tracing::info!("API gateway listening on http://{}", api_cfg.listen_addr);

    let listener = tokio::net::TcpListener::bind(api_cfg.listen_addr)
        .await
        .map_err(|e| format!("failed to bind {}: {e}", api_cfg.listen_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("API server error: {e}"))?;

    Ok(())
}

/// Background epoch loop.
///
/// Every interval, takes the pooled tips, runs one RSC round and returns
/// whatever could not be distributed to the pool.
async fn run_epoch_loop(state: SharedState, interval: Duration) {
    tracing::info!("epoch loop running with interval {}s", interval.as_secs());

    let mut ticker = tokio::time::interval(interval);
    // The first tick fires immediately; skip it so nodes can register.
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let mut engine = state.engine.lock().await;
        if engine.nodes().is_empty() {
            tracing::debug!("no registered nodes, skipping epoch");
            continue;
        }

        let tips = state.tx_pool.lock().await.take_tips();
        match engine.run_epoch(tips) {
            Ok(summary) => {
                state.metrics.ledger.observe_epoch(&summary);
                let mut pool = state.tx_pool.lock().await;
                pool.credit_tips(summary.undistributed);
                let paid = pool.len();
                pool.drain(paid);
            }
            Err(e) => {
                state.tx_pool.lock().await.credit_tips(tips);
                tracing::warn!("rsc epoch failed: {e}");
            }
        }
    }
}

/// Waits for Ctrl-C and returns, used for graceful shutdown.
async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
