//! Epoch orchestration for Rapid Stake Consensus.
//!
//! The engine owns the registered node set and runs one round at a time:
//!
//! 1. every node's `tip_share` is cleared,
//! 2. the node set is re-ranked with [`update_rapid_table`],
//! 3. the epoch's tip pool is split over the ranking with
//!    [`distribute_tips`].
//!
//! A round either completes or leaves the engine untouched: ranking and
//! distribution run on a copy of the node set that replaces the registry
//! only when both succeed. All mutation goes through `&mut self`, so a
//! metrics update can never interleave with a running round.

use serde::Serialize;
use tracing::info;

use crate::types::{NodeId, NodeStake};

use super::config::RscConfig;
use super::error::RscError;
use super::rapid_table::{RapidTable, update_rapid_table};
use super::tips::distribute_tips;

/// Result of one completed round.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EpochSummary {
    pub epoch: u64,
    pub ranked: usize,
    pub inactive: usize,
    pub total_stake: f64,
    pub distributed: f64,
    pub undistributed: f64,
}

/// Node registry plus the ranking state of the latest round.
pub struct RscEngine {
    config: RscConfig,
    nodes: Vec<NodeStake>,
    table: RapidTable,
    epoch: u64,
}

impl RscEngine {
    /// Creates an engine with no registered nodes.
    pub fn new(config: RscConfig) -> Self {
        Self {
            config,
            nodes: Vec::new(),
            table: RapidTable::default(),
            epoch: 0,
        }
    }

    pub fn config(&self) -> &RscConfig {
        &self.config
    }

    /// Registered nodes in registration order.
    pub fn nodes(&self) -> &[NodeStake] {
        &self.nodes
    }

    /// Number of completed rounds.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Adds a node; ids must be unique.
    ///
    /// Stake must be finite and non-negative, and must keep
    /// [`total_stake`](Self::total_stake) finite.
    pub fn register_node(&mut self, node: NodeStake) -> Result<(), RscError> {
        if self.nodes.iter().any(|n| n.node_id == node.node_id) {
            return Err(RscError::DuplicateNode(node.node_id));
        }
        if !node.stake_amount.is_finite() || node.stake_amount < 0.0 {
            return Err(RscError::InvalidArgument(
                "stake must be finite and non-negative",
            ));
        }
        if !(self.total_stake() + node.stake_amount).is_finite() {
            return Err(RscError::InvalidArgument("total stake would overflow"));
        }
        info!(node = %node.node_id, stake = node.stake_amount, "node registered");
        self.nodes.push(node);
        Ok(())
    }

    /// Removes a node and returns its record.
    ///
    /// The rapid table keeps referring to the old positions until the next
    /// round, so it is cleared here.
    pub fn remove_node(&mut self, node_id: &NodeId) -> Result<NodeStake, RscError> {
        let pos = self
            .nodes
            .iter()
            .position(|n| &n.node_id == node_id)
            .ok_or_else(|| RscError::UnknownNode(node_id.clone()))?;
        self.table = RapidTable::default();
        info!(node = %node_id, "node removed");
        Ok(self.nodes.remove(pos))
    }

    pub fn node(&self, node_id: &NodeId) -> Option<&NodeStake> {
        self.nodes.iter().find(|n| &n.node_id == node_id)
    }

    /// Mutable access for the metrics collaborator.
    pub fn node_mut(&mut self, node_id: &NodeId) -> Option<&mut NodeStake> {
        self.nodes.iter_mut().find(|n| &n.node_id == node_id)
    }

    /// Sum of all registered stake.
    pub fn total_stake(&self) -> f64 {
        self.nodes.iter().map(|n| n.stake_amount).sum()
    }

    /// Ranking produced by the latest round.
    pub fn rapid_table(&self) -> &RapidTable {
        &self.table
    }

    /// Runs one round: re-rank, then split `total_tip` over the ranking.
    ///
    /// On error the nodes, the table and the epoch counter are unchanged.
    pub fn run_epoch(&mut self, total_tip: f64) -> Result<EpochSummary, RscError> {
        if !total_tip.is_finite() || total_tip < 0.0 {
            return Err(RscError::InvalidArgument(
                "total tip must be finite and non-negative",
            ));
        }

        let mut nodes = self.nodes.clone();
        for node in &mut nodes {
            node.metrics.tip_share = 0.0;
        }

        let total_stake = self.total_stake();
        let table = update_rapid_table(&mut nodes, total_stake, &self.config)?;
        let tips = distribute_tips(&mut nodes, total_tip)?;

        self.nodes = nodes;
        self.epoch += 1;
        let summary = EpochSummary {
            epoch: self.epoch,
            ranked: table.len(),
            inactive: self.nodes.len() - table.len(),
            total_stake,
            distributed: tips.distributed,
            undistributed: tips.undistributed,
        };
        self.table = table;

        info!(
            epoch = summary.epoch,
            ranked = summary.ranked,
            inactive = summary.inactive,
            distributed = summary.distributed,
            undistributed = summary.undistributed,
            "rsc epoch complete"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PUBLIC_KEY_LEN, PublicKey};

    fn dummy_node(name: &str, stake: f64, responses: u32) -> NodeStake {
        let mut node = NodeStake::new(
            NodeId::new(name).expect("node id"),
            PublicKey([0u8; PUBLIC_KEY_LEN]),
            stake,
        );
        node.metrics.response_count = responses;
        node.metrics.avg_response_time = 100;
        node
    }

    fn dummy_engine() -> RscEngine {
        let mut engine = RscEngine::new(RscConfig::default());
        engine
            .register_node(dummy_node("alpha", 1000.0, 50))
            .expect("register alpha");
        engine
            .register_node(dummy_node("beta", 500.0, 40))
            .expect("register beta");
        engine
            .register_node(dummy_node("gamma", 800.0, 2))
            .expect("register gamma");
        engine
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut engine = dummy_engine();
        let err = engine
            .register_node(dummy_node("beta", 1.0, 10))
            .expect_err("duplicate");
        assert!(matches!(err, RscError::DuplicateNode(id) if id.as_str() == "beta"));
        assert_eq!(engine.nodes().len(), 3);
    }

    #[test]
    fn epoch_ranks_and_pays_eligible_nodes() {
        let mut engine = dummy_engine();
        let summary = engine.run_epoch(10.0).expect("epoch");

        assert_eq!(summary.epoch, 1);
        assert_eq!(summary.ranked, 2);
        assert_eq!(summary.inactive, 1);
        assert_eq!(summary.total_stake, 2300.0);
        assert_eq!(summary.distributed, 10.0);

        let alpha = engine.node(&NodeId::new("alpha").expect("id")).expect("alpha");
        let beta = engine.node(&NodeId::new("beta").expect("id")).expect("beta");
        let gamma = engine.node(&NodeId::new("gamma").expect("id")).expect("gamma");
        assert_eq!(alpha.rank, Some(0));
        assert_eq!(alpha.metrics.tip_share, 5.0);
        assert_eq!(beta.rank, Some(1));
        assert_eq!(beta.metrics.tip_share, 5.0);
        assert!(!gamma.active);
        assert_eq!(gamma.metrics.tip_share, 0.0);

        assert_eq!(engine.rapid_table().len(), 2);
    }

    #[test]
    fn node_dropping_below_threshold_loses_its_share() {
        let mut engine = dummy_engine();
        engine.run_epoch(4.0).expect("first epoch");

        let beta_id = NodeId::new("beta").expect("id");
        engine
            .node_mut(&beta_id)
            .expect("beta")
            .metrics
            .response_count = 0;
        let summary = engine.run_epoch(4.0).expect("second epoch");

        assert_eq!(summary.ranked, 1);
        let beta = engine.node(&beta_id).expect("beta");
        assert_eq!(beta.rank, None);
        assert_eq!(beta.metrics.tip_share, 0.0);
    }

    #[test]
    fn empty_engine_cannot_run_an_epoch() {
        let mut engine = RscEngine::new(RscConfig::default());
        assert!(matches!(
            engine.run_epoch(1.0),
            Err(RscError::InvalidArgument(_))
        ));
        assert_eq!(engine.epoch(), 0);
    }

    #[test]
    fn invalid_stakes_are_rejected_at_registration() {
        let mut engine = dummy_engine();
        for stake in [f64::NAN, f64::INFINITY, -1.0] {
            let err = engine
                .register_node(dummy_node("delta", stake, 10))
                .expect_err("bad stake");
            assert!(matches!(err, RscError::InvalidArgument(_)));
        }
        assert_eq!(engine.nodes().len(), 3);
    }

    #[test]
    fn registration_cannot_overflow_total_stake() {
        let mut engine = RscEngine::new(RscConfig::default());
        engine
            .register_node(dummy_node("whale", f64::MAX, 20))
            .expect("first whale");
        let err = engine
            .register_node(dummy_node("orca", f64::MAX, 20))
            .expect_err("overflow");
        assert!(matches!(err, RscError::InvalidArgument(_)));
        assert!(engine.total_stake().is_finite());

        let summary = engine.run_epoch(10.0).expect("epoch still runs");
        assert_eq!(summary.ranked, 1);
        assert_eq!(summary.distributed, 10.0);
    }

    #[test]
    fn failed_epoch_leaves_state_untouched() {
        let mut engine = dummy_engine();
        let before = engine.run_epoch(10.0).expect("first epoch");
        let alpha_id = NodeId::new("alpha").expect("id");
        let beta_id = NodeId::new("beta").expect("id");

        // Beta would overtake alpha if the round were applied.
        engine
            .node_mut(&beta_id)
            .expect("beta")
            .stake_amount = 1_000_000.0;

        for bad_tip in [f64::INFINITY, f64::NAN, -1.0] {
            assert!(matches!(
                engine.run_epoch(bad_tip),
                Err(RscError::InvalidArgument(_))
            ));
        }

        assert_eq!(engine.epoch(), before.epoch);
        assert_eq!(engine.rapid_table().len(), 2);
        let alpha = engine.node(&alpha_id).expect("alpha");
        assert_eq!(alpha.rank, Some(0));
        assert_eq!(alpha.metrics.tip_share, 5.0);
        let beta = engine.node(&beta_id).expect("beta");
        assert_eq!(beta.rank, Some(1));
        assert_eq!(beta.metrics.tip_share, 5.0);
    }

    #[test]
    fn removing_a_node_clears_the_table() {
        let mut engine = dummy_engine();
        engine.run_epoch(1.0).expect("epoch");
        assert!(!engine.rapid_table().is_empty());

        let removed = engine
            .remove_node(&NodeId::new("alpha").expect("id"))
            .expect("remove");
        assert_eq!(removed.node_id.as_str(), "alpha");
        assert!(engine.rapid_table().is_empty());

        let missing = NodeId::new("alpha").expect("id");
        assert!(matches!(
            engine.remove_node(&missing),
            Err(RscError::UnknownNode(_))
        ));
    }
}
