//! Geometric halving tip distribution.

use serde::Serialize;
use tracing::{debug, warn};

use crate::types::NodeStake;

use super::error::RscError;

/// Fraction of the remaining pool handed to each rank.
pub const TIP_DECAY: f64 = 0.5;

/// Outcome of one distribution round.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TipDistribution {
    /// `(index, share)` pairs in rank order.
    pub shares: Vec<(usize, f64)>,
    pub distributed: f64,
    /// Left over when no node was active.
    pub undistributed: f64,
}

/// Splits `total_tip` over the active nodes by rank.
///
/// Rank 0 gets half the pool, rank 1 half of what is left, and so on; the
/// lowest ranked active node takes the whole remainder, so the shares sum to
/// `total_tip`. Each receiving node's `metrics.tip_share` is overwritten
/// with its share; other nodes are left untouched.
///
/// With no active node nothing is written and the whole amount is reported
/// as undistributed.
pub fn distribute_tips(
    nodes: &mut [NodeStake],
    total_tip: f64,
) -> Result<TipDistribution, RscError> {
    if nodes.is_empty() {
        return Err(RscError::InvalidArgument("node set is empty"));
    }
    if !total_tip.is_finite() || total_tip < 0.0 {
        return Err(RscError::InvalidArgument(
            "total tip must be finite and non-negative",
        ));
    }

    let mut order: Vec<(usize, u32)> = nodes
        .iter()
        .enumerate()
        .filter(|(_, n)| n.active)
        .filter_map(|(i, n)| n.rank.map(|r| (i, r)))
        .collect();
    order.sort_by_key(|&(_, rank)| rank);

    let Some(last) = order.len().checked_sub(1) else {
        if total_tip > 0.0 {
            warn!(total_tip, "no active nodes, tips left undistributed");
        }
        return Ok(TipDistribution {
            shares: Vec::new(),
            distributed: 0.0,
            undistributed: total_tip,
        });
    };

    let mut remaining = total_tip;
    let mut shares = Vec::with_capacity(order.len());
    for (pos, &(index, _)) in order.iter().enumerate() {
        let share = if pos == last {
            remaining
        } else {
            remaining * TIP_DECAY
        };
        remaining -= share;
        nodes[index].metrics.tip_share = share;
        shares.push((index, share));
    }

    debug!(recipients = shares.len(), total_tip, "tips distributed");

    Ok(TipDistribution {
        shares,
        distributed: total_tip,
        undistributed: 0.0,
    })
}
