use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::state::SharedState;

/// Liveness plus a glimpse of node state.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub epoch: u64,
    pub nodes: usize,
    pub pooled_transactions: usize,
    pub pending_tips: f64,
}

/// `GET /health`
pub async fn health(State(state): State<SharedState>) -> (StatusCode, Json<HealthResponse>) {
    let (epoch, nodes) = {
        let engine = state.engine.lock().await;
        (engine.epoch(), engine.nodes().len())
    };
    let (pooled_transactions, pending_tips) = {
        let pool = state.tx_pool.lock().await;
        (pool.len(), pool.pending_tips())
    };

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            epoch,
            nodes,
            pooled_transactions,
            pending_tips,
        }),
    )
}
