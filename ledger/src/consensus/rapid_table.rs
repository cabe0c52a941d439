//! Rapid table: the per-round ranking of eligible nodes.

use serde::Serialize;
use tracing::{debug, trace};

use crate::types::{NodeId, NodeStake};

use super::config::RscConfig;
use super::error::RscError;
use super::scoring::{composite_score, is_eligible};

/// One ranked node.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankedNode {
    /// Position of the node in the slice that was ranked.
    pub index: usize,
    pub node_id: NodeId,
    pub rank: u32,
    pub score: f64,
}

/// Eligible nodes in rank order, best first.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RapidTable {
    entries: Vec<RankedNode>,
}

impl RapidTable {
    pub fn entries(&self) -> &[RankedNode] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The rank-0 node, if any node was eligible.
    pub fn leader(&self) -> Option<&RankedNode> {
        self.entries.first()
    }
}

/// Scores and ranks `nodes` for one round.
///
/// Every node's `active` and `rank` fields are rewritten: eligible nodes get
/// `active = true` and a dense rank `0..k` by descending score, the rest get
/// `active = false` and no rank. Records are never reordered. Equal scores
/// keep their input order, so the result is a pure function of the input.
///
/// Fails with [`RscError::InvalidArgument`] on an empty slice, on a negative
/// or non-finite `total_stake`, or on a zero `total_stake` when stakes are
/// normalized.
pub fn update_rapid_table(
    nodes: &mut [NodeStake],
    total_stake: f64,
    cfg: &RscConfig,
) -> Result<RapidTable, RscError> {
    if nodes.is_empty() {
        return Err(RscError::InvalidArgument("node set is empty"));
    }
    if !total_stake.is_finite() || total_stake < 0.0 {
        return Err(RscError::InvalidArgument(
            "total stake must be finite and non-negative",
        ));
    }
    if cfg.normalize_stake && total_stake == 0.0 {
        return Err(RscError::InvalidArgument(
            "total stake must be positive when normalizing",
        ));
    }

    let mut scored: Vec<(usize, f64)> = Vec::with_capacity(nodes.len());
    for (position, node) in nodes.iter_mut().enumerate() {
        node.active = false;
        node.rank = None;

        if !is_eligible(node, cfg) {
            trace!(
                node = %node.node_id,
                responses = node.metrics.response_count,
                "node below eligibility threshold"
            );
            continue;
        }

        let breakdown = composite_score(node, position, total_stake, cfg);
        trace!(
            node = %node.node_id,
            reliability = breakdown.reliability,
            performance = breakdown.performance,
            score = breakdown.score,
            "node scored"
        );
        scored.push((position, breakdown.score));
    }

    // Stable sort: ties keep input order.
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut entries = Vec::with_capacity(scored.len());
    for (rank, (index, score)) in scored.into_iter().enumerate() {
        let rank = rank as u32;
        let node = &mut nodes[index];
        node.active = true;
        node.rank = Some(rank);
        entries.push(RankedNode {
            index,
            node_id: node.node_id.clone(),
            rank,
            score,
        });
    }

    debug!(
        nodes = nodes.len(),
        ranked = entries.len(),
        total_stake,
        "rapid table updated"
    );

    Ok(RapidTable { entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PUBLIC_KEY_LEN, PublicKey};

    fn dummy_node(name: &str, stake: f64, responses: u32, avg_ms: u64) -> NodeStake {
        let mut node = NodeStake::new(
            NodeId::new(name).expect("node id"),
            PublicKey([0u8; PUBLIC_KEY_LEN]),
            stake,
        );
        node.metrics.response_count = responses;
        node.metrics.avg_response_time = avg_ms;
        node
    }

    fn total(nodes: &[NodeStake]) -> f64 {
        nodes.iter().map(|n| n.stake_amount).sum()
    }

    #[test]
    fn ineligible_nodes_are_inactive_and_unranked() {
        let mut nodes = vec![
            dummy_node("a", 100.0, 50, 100),
            dummy_node("b", 500.0, 9, 100),
            dummy_node("c", 10.0, 10, 100),
        ];
        // Stale state from a previous round must be cleared.
        nodes[1].active = true;
        nodes[1].rank = Some(0);

        let t = total(&nodes);
        let table = update_rapid_table(&mut nodes, t, &RscConfig::default()).expect("rank");

        assert_eq!(table.len(), 2);
        assert!(!nodes[1].active);
        assert_eq!(nodes[1].rank, None);
        assert!(table.entries().iter().all(|e| e.index != 1));
    }

    #[test]
    fn ranks_are_dense_and_follow_descending_score() {
        let mut nodes = vec![
            dummy_node("low", 10.0, 20, 100),
            dummy_node("high", 1000.0, 20, 100),
            dummy_node("mid", 200.0, 20, 100),
        ];
        let t = total(&nodes);
        let table = update_rapid_table(&mut nodes, t, &RscConfig::default()).expect("rank");

        assert_eq!(nodes[1].rank, Some(0));
        assert_eq!(nodes[2].rank, Some(1));
        assert_eq!(nodes[0].rank, Some(2));
        assert_eq!(table.leader().map(|e| e.node_id.as_str()), Some("high"));

        let ranks: Vec<u32> = table.entries().iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![0, 1, 2]);
        for pair in table.entries().windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        // Records stay where they were.
        assert_eq!(nodes[0].node_id.as_str(), "low");
    }

    #[test]
    fn equal_scores_keep_input_order() {
        // Reliability depends on position, so equal scores need compensating
        // response counts: 10/1 == 20/2.
        let mut nodes = vec![
            dummy_node("first", 100.0, 10, 0),
            dummy_node("second", 100.0, 20, 0),
        ];
        let t = total(&nodes);
        update_rapid_table(&mut nodes, t, &RscConfig::default()).expect("rank");

        assert_eq!(nodes[0].rank, Some(0));
        assert_eq!(nodes[1].rank, Some(1));
    }

    #[test]
    fn ranking_is_deterministic() {
        let build = || {
            vec![
                dummy_node("a", 40.0, 30, 500),
                dummy_node("b", 40.0, 60, 250),
                dummy_node("c", 80.0, 12, 2999),
                dummy_node("d", 5.0, 3, 10),
            ]
        };
        let mut first = build();
        let mut second = build();
        let t = total(&first);
        let cfg = RscConfig::default();

        let ta = update_rapid_table(&mut first, t, &cfg).expect("rank");
        let tb = update_rapid_table(&mut second, t, &cfg).expect("rank");
        assert_eq!(ta, tb);
        assert_eq!(first, second);
    }

    #[test]
    fn all_ineligible_gives_an_empty_table() {
        let mut nodes = vec![dummy_node("a", 1.0, 0, 0), dummy_node("b", 1.0, 1, 0)];
        let table = update_rapid_table(&mut nodes, 2.0, &RscConfig::default()).expect("rank");
        assert!(table.is_empty());
        assert!(nodes.iter().all(|n| !n.active && n.rank.is_none()));
    }

    #[test]
    fn invalid_arguments_are_rejected() {
        let cfg = RscConfig::default();
        assert!(matches!(
            update_rapid_table(&mut [], 1.0, &cfg),
            Err(RscError::InvalidArgument(_))
        ));

        let mut nodes = vec![dummy_node("a", 1.0, 10, 0)];
        assert!(update_rapid_table(&mut nodes, -1.0, &cfg).is_err());
        assert!(update_rapid_table(&mut nodes, f64::NAN, &cfg).is_err());

        let normalized = RscConfig {
            normalize_stake: true,
            ..RscConfig::default()
        };
        assert!(update_rapid_table(&mut nodes, 0.0, &normalized).is_err());
        assert!(update_rapid_table(&mut nodes, 0.0, &cfg).is_ok());
    }

    #[test]
    fn normalizing_stake_does_not_change_ranks() {
        let build = || {
            vec![
                dummy_node("a", 30.0, 40, 100),
                dummy_node("b", 70.0, 15, 2000),
                dummy_node("c", 10.0, 90, 50),
            ]
        };
        let mut plain = build();
        let mut normalized = build();
        let t = total(&plain);

        update_rapid_table(&mut plain, t, &RscConfig::default()).expect("rank");
        let cfg = RscConfig {
            normalize_stake: true,
            ..RscConfig::default()
        };
        update_rapid_table(&mut normalized, t, &cfg).expect("rank");

        let ranks = |v: &[NodeStake]| v.iter().map(|n| n.rank).collect::<Vec<_>>();
        assert_eq!(ranks(&plain), ranks(&normalized));
    }
}
