//! Composite node score.
//!
//! `score = stake_weight * (w_r * reliability + w_p * performance)` where
//!
//! - `stake_weight` is the node's stake, optionally divided by the round's
//!   total stake,
//! - `reliability = response_count / (position + 1)`, `position` being the
//!   node's index in the round's input sequence,
//! - `performance = max(0, 1 - avg_response_time / max_latency_ms)`.

use crate::types::NodeStake;

use super::config::RscConfig;

/// The factors behind one node's score.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoreBreakdown {
    pub stake_weight: f64,
    pub reliability: f64,
    pub performance: f64,
    pub score: f64,
}

/// Returns `true` if the node has served enough responses to be ranked and
/// holds a usable stake.
pub fn is_eligible(node: &NodeStake, cfg: &RscConfig) -> bool {
    node.metrics.response_count >= cfg.min_response_count
        && node.stake_amount.is_finite()
        && node.stake_amount >= 0.0
}

/// Latency factor in `0.0..=1.0`; lower average latency scores higher.
pub fn performance_factor(avg_response_time: u64, max_latency_ms: u64) -> f64 {
    if max_latency_ms == 0 {
        return 0.0;
    }
    (1.0 - avg_response_time as f64 / max_latency_ms as f64).max(0.0)
}

/// Scores the node found at `position` in the round's node sequence.
pub fn composite_score(
    node: &NodeStake,
    position: usize,
    total_stake: f64,
    cfg: &RscConfig,
) -> ScoreBreakdown {
    let stake_weight = if cfg.normalize_stake && total_stake > 0.0 {
        node.stake_amount / total_stake
    } else {
        node.stake_amount
    };
    let reliability = f64::from(node.metrics.response_count) / (position as f64 + 1.0);
    let performance = performance_factor(node.metrics.avg_response_time, cfg.max_latency_ms);
    let score = stake_weight
        * (cfg.reliability_weight * reliability + cfg.performance_weight * performance);

    ScoreBreakdown {
        stake_weight,
        reliability,
        performance,
        score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NodeId, PUBLIC_KEY_LEN, PublicKey};

    fn dummy_node(stake: f64, responses: u32, avg_ms: u64) -> NodeStake {
        let mut node = NodeStake::new(
            NodeId::new("node-0").expect("node id"),
            PublicKey([0u8; PUBLIC_KEY_LEN]),
            stake,
        );
        node.metrics.response_count = responses;
        node.metrics.avg_response_time = avg_ms;
        node
    }

    #[test]
    fn performance_is_clamped_at_zero() {
        assert_eq!(performance_factor(0, 3000), 1.0);
        assert!((performance_factor(1500, 3000) - 0.5).abs() < 1e-12);
        assert_eq!(performance_factor(3000, 3000), 0.0);
        assert_eq!(performance_factor(9000, 3000), 0.0);
        assert_eq!(performance_factor(10, 0), 0.0);
    }

    #[test]
    fn composite_score_blends_reliability_and_performance() {
        let cfg = RscConfig::default();
        let node = dummy_node(100.0, 20, 150);

        // position 1 => reliability = 20 / 2 = 10, performance = 0.95
        let s = composite_score(&node, 1, 500.0, &cfg);
        assert_eq!(s.stake_weight, 100.0);
        assert!((s.reliability - 10.0).abs() < 1e-12);
        assert!((s.performance - 0.95).abs() < 1e-12);
        assert!((s.score - 100.0 * (0.6 * 10.0 + 0.4 * 0.95)).abs() < 1e-9);
    }

    #[test]
    fn normalized_stake_divides_by_total() {
        let cfg = RscConfig {
            normalize_stake: true,
            ..RscConfig::default()
        };
        let node = dummy_node(100.0, 10, 0);
        let s = composite_score(&node, 0, 400.0, &cfg);
        assert!((s.stake_weight - 0.25).abs() < 1e-12);
    }

    #[test]
    fn eligibility_needs_responses_and_sane_stake() {
        let cfg = RscConfig::default();
        assert!(is_eligible(&dummy_node(1.0, cfg.min_response_count, 0), &cfg));
        assert!(!is_eligible(&dummy_node(1.0, cfg.min_response_count - 1, 0), &cfg));
        assert!(!is_eligible(&dummy_node(f64::NAN, 100, 0), &cfg));
        assert!(!is_eligible(&dummy_node(-5.0, 100, 0), &cfg));
    }
}
