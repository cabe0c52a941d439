use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use ledger::{NodeId, NodeMetrics, NodeStake, PublicKey, RscError};

use super::{ApiError, bad_request};
use crate::state::SharedState;

/// Request body for `POST /nodes`.
#[derive(Debug, Deserialize)]
pub struct RegisterNodeRequest {
    pub node_id: String,
    pub stake_amount: f64,
    /// Hex-encoded 256-byte public key.
    pub public_key_hex: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterNodeResponse {
    pub status: &'static str,
    pub node_id: String,
}

/// `POST /nodes`
///
/// Registers a staked node; it is ranked once it has served enough
/// responses.
pub async fn register_node(
    State(state): State<SharedState>,
    Json(body): Json<RegisterNodeRequest>,
) -> Result<(StatusCode, Json<RegisterNodeResponse>), ApiError> {
    let node_id = parse_node_id(&body.node_id)?;
    if !body.stake_amount.is_finite() || body.stake_amount < 0.0 {
        return Err(bad_request("stake_amount must be finite and non-negative"));
    }
    let key_bytes =
        hex::decode(body.public_key_hex.trim()).map_err(|_| bad_request("invalid hex encoding"))?;
    let public_key =
        PublicKey::from_slice(&key_bytes).ok_or_else(|| bad_request("expected 256-byte public key"))?;

    {
        let mut engine = state.engine.lock().await;
        engine
            .register_node(NodeStake::new(node_id, public_key, body.stake_amount))
            .map_err(rsc_error)?;
    }

    Ok((
        StatusCode::CREATED,
        Json(RegisterNodeResponse {
            status: "registered",
            node_id: body.node_id,
        }),
    ))
}

/// Request body for `POST /nodes/{node_id}/metrics`.
#[derive(Debug, Deserialize)]
pub struct MetricsReport {
    pub latency_ms: u64,
    pub success: bool,
    pub peer_count: Option<usize>,
}

/// `POST /nodes/{node_id}/metrics`
///
/// Folds one observed message into the node's metrics and returns the
/// updated counters.
pub async fn report_metrics(
    State(state): State<SharedState>,
    Path(node_id): Path<String>,
    Json(body): Json<MetricsReport>,
) -> Result<Json<NodeMetrics>, ApiError> {
    let node_id = parse_node_id(&node_id)?;

    let mut engine = state.engine.lock().await;
    let node = engine
        .node_mut(&node_id)
        .ok_or_else(|| rsc_error(RscError::UnknownNode(node_id.clone())))?;

    node.metrics
        .record_response(body.latency_ms, body.success, current_unix_millis());
    if let Some(peers) = body.peer_count {
        node.metrics.peer_count = peers;
    }

    Ok(Json(node.metrics.clone()))
}

fn parse_node_id(raw: &str) -> Result<NodeId, ApiError> {
    NodeId::new(raw).ok_or_else(|| bad_request("node_id must be 1 to 63 bytes"))
}

fn rsc_error(e: RscError) -> ApiError {
    let status = match e {
        RscError::DuplicateNode(_) => StatusCode::CONFLICT,
        RscError::UnknownNode(_) => StatusCode::NOT_FOUND,
        RscError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
    };
    (status, e.to_string())
}

fn current_unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_millis(0))
        .as_millis() as u64
}
