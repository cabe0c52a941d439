//! Node records consumed and produced by the RSC engine.
//!
//! [`NodeMetrics`] is a plain container: the metrics collector fills it in
//! between ranking rounds and the RSC engine only ever writes
//! [`NodeMetrics::tip_share`]. All scoring policy lives in
//! [`crate::consensus`].

use serde::{Deserialize, Serialize};

use super::{NodeId, PublicKey};

/// Rolling performance and reliability counters for one node.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeMetrics {
    /// Average response time in milliseconds.
    pub avg_response_time: u64,
    /// Fastest response observed, in milliseconds.
    pub min_response_time: u64,
    /// Slowest response observed, in milliseconds.
    pub max_response_time: u64,
    /// Number of responses recorded.
    pub response_count: u32,
    /// Messages handled successfully.
    pub message_success: u32,
    /// Messages handled in total.
    pub message_total: u32,
    /// Collector-assigned reliability rating in `0.0..=1.0`.
    pub reliability_score: f64,
    /// Collector-assigned combined performance metric.
    pub performance_score: f64,
    /// Network-synchronized time of the last update, in milliseconds.
    pub last_update: u64,
    /// Share of the voluntary tip pool assigned in the last distribution.
    pub tip_share: f64,
    /// Number of connected peers.
    pub peer_count: usize,
}

impl NodeMetrics {
    /// Returns metrics at the neutral baseline: zero timings, counts, scores
    /// and tip share.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets every field to the neutral baseline.
    pub fn init(&mut self) {
        *self = Self::default();
    }

    /// Folds one message outcome into the counters.
    ///
    /// Only successful messages count as responses and move the latency
    /// statistics; every message moves `message_total`. `reliability_score`
    /// is kept at the success ratio.
    pub fn record_response(&mut self, latency_ms: u64, success: bool, now_ms: u64) {
        self.message_total = self.message_total.saturating_add(1);
        if success {
            self.message_success = self.message_success.saturating_add(1);

            let n = u64::from(self.response_count);
            self.avg_response_time =
                self.avg_response_time.saturating_mul(n).saturating_add(latency_ms) / (n + 1);
            if self.response_count == 0 {
                self.min_response_time = latency_ms;
                self.max_response_time = latency_ms;
            } else {
                self.min_response_time = self.min_response_time.min(latency_ms);
                self.max_response_time = self.max_response_time.max(latency_ms);
            }
            self.response_count = self.response_count.saturating_add(1);
        }
        self.reliability_score =
            f64::from(self.message_success) / f64::from(self.message_total);
        self.last_update = now_ms;
    }
}

/// A staked node as seen by one RSC round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeStake {
    pub metrics: NodeMetrics,

    /// Stake held by the node; never negative.
    pub stake_amount: f64,

    pub node_id: NodeId,

    /// Whether the node was ranked in the last round.
    pub active: bool,

    /// Position in the last rapid table, `Some(0)` being the best node.
    ///
    /// `None` for nodes that were not eligible.
    pub rank: Option<u32>,

    pub public_key: PublicKey,
}

impl NodeStake {
    /// Creates an unranked, inactive node with baseline metrics.
    pub fn new(node_id: NodeId, public_key: PublicKey, stake_amount: f64) -> Self {
        Self {
            metrics: NodeMetrics::new(),
            stake_amount,
            node_id,
            active: false,
            rank: None,
            public_key,
        }
    }
}
