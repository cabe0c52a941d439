//! Rapid Stake Consensus (RSC).
//!
//! This module ranks validator nodes by a composite of stake, reliability
//! and latency, and pays out voluntary tips down that ranking:
//!
//! - configuration parameters ([`config::RscConfig`]),
//! - the composite score ([`scoring`]),
//! - the per-round ranking ([`rapid_table::update_rapid_table`]),
//! - geometric tip distribution ([`tips::distribute_tips`]),
//! - epoch orchestration over a node registry ([`engine::RscEngine`]).

pub mod config;
pub mod engine;
pub mod error;
pub mod rapid_table;
pub mod scoring;
pub mod tips;

pub use config::RscConfig;
pub use engine::{EpochSummary, RscEngine};
pub use error::RscError;
pub use rapid_table::{RankedNode, RapidTable, update_rapid_table};
pub use scoring::{ScoreBreakdown, composite_score, is_eligible};
pub use tips::{TIP_DECAY, TipDistribution, distribute_tips};
