use serde::Deserialize;

/// Responses a node must have served before it can be ranked.
pub const MIN_RESPONSE_COUNT: u32 = 10;

/// Average latency, in milliseconds, at which the performance factor hits 0.
pub const MAX_LATENCY_MS: u64 = 3000;

/// Weight of the reliability factor in the composite score.
pub const RELIABILITY_WEIGHT: f64 = 0.6;

/// Weight of the latency performance factor in the composite score.
pub const PERFORMANCE_WEIGHT: f64 = 0.4;

/// Rapid Stake Consensus configuration parameters.
///
/// This covers the eligibility threshold and the scoring policy used by
/// [`update_rapid_table`](super::update_rapid_table).
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct RscConfig {
    /// Nodes with fewer recorded responses are marked inactive.
    pub min_response_count: u32,
    /// Maximum acceptable average latency in milliseconds.
    pub max_latency_ms: u64,
    /// Blend weight of the reliability factor.
    pub reliability_weight: f64,
    /// Blend weight of the performance factor.
    pub performance_weight: f64,
    /// Divide each stake by the round's total stake before scoring.
    ///
    /// This rescales every score by the same constant, so it leaves the
    /// ranking unchanged; it only makes scores comparable across rounds.
    pub normalize_stake: bool,
}

impl Default for RscConfig {
    fn default() -> Self {
        Self {
            min_response_count: MIN_RESPONSE_COUNT,
            max_latency_ms: MAX_LATENCY_MS,
            reliability_weight: RELIABILITY_WEIGHT,
            performance_weight: PERFORMANCE_WEIGHT,
            normalize_stake: false,
        }
    }
}
