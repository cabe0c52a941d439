use axum::{Json, extract::State};
use serde::Serialize;

use crate::state::SharedState;

/// One row of the rapid table.
#[derive(Debug, Serialize)]
pub struct RapidTableRow {
    pub rank: u32,
    pub node_id: String,
    pub score: f64,
    pub stake_amount: f64,
    pub tip_share: f64,
}

#[derive(Debug, Serialize)]
pub struct RapidTableResponse {
    pub epoch: u64,
    pub total_stake: f64,
    pub rows: Vec<RapidTableRow>,
}

/// `GET /rapid-table`
///
/// Ranking and tip shares from the latest epoch, best node first.
pub async fn rapid_table(State(state): State<SharedState>) -> Json<RapidTableResponse> {
    let engine = state.engine.lock().await;
    let nodes = engine.nodes();

    let rows = engine
        .rapid_table()
        .entries()
        .iter()
        .filter_map(|entry| {
            let node = nodes.get(entry.index)?;
            Some(RapidTableRow {
                rank: entry.rank,
                node_id: entry.node_id.to_string(),
                score: entry.score,
                stake_amount: node.stake_amount,
                tip_share: node.metrics.tip_share,
            })
        })
        .collect();

    Json(RapidTableResponse {
        epoch: engine.epoch(),
        total_stake: engine.total_stake(),
        rows,
    })
}
