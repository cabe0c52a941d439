//! Ledger library crate.
//!
//! This crate provides the core of a proof-of-stake ledger that pays
//! validator nodes out of voluntary transaction tips:
//!
//! - strongly-typed domain types (`types`),
//! - hashing and the post-quantum signature seam (`crypto`),
//! - transaction validity predicates (`validation`),
//! - Rapid Stake Consensus ranking and tip distribution (`consensus`),
//! - a pool of validated transactions and pending tips (`pool`),
//! - Prometheus-based metrics (`metrics`),
//! - and a top-level node configuration (`config`).
//!
//! Higher-level binaries compose these pieces into nodes and gateways.

pub mod config;
pub mod consensus;
pub mod crypto;
pub mod metrics;
pub mod pool;
pub mod types;
pub mod validation;

// Re-export top-level configuration types.
pub use config::{ConfigError, LedgerConfig, MetricsConfig};

// Re-export the RSC engine.
pub use consensus::{
    EpochSummary, RankedNode, RapidTable, RscConfig, RscEngine, RscError, TipDistribution,
    distribute_tips, update_rapid_table,
};

// Re-export crypto primitives.
pub use crypto::{
    CryptoError, KeyedDigestScheme, Keypair, PqSignatureScheme, double_hash, pad_signature,
};

// Re-export the validation stack.
pub use validation::{
    BaseValidity, CombinedValidator, InvalidReason, SignaturePolicy,
    SignatureValidity, TransactionValidator, TxConfig, TxError, TxLimits, TxValidator,
    ValidationContext, ValidationReport, ValidationStats,
};

pub use pool::{PoolConfig, PoolError, PooledTx, TxPool};

// Re-export metrics registry and ledger metrics.
pub use metrics::{LedgerMetrics, MetricsRegistry, run_prometheus_http_server};

// Re-export domain types at the crate root for convenience.
pub use types::*;

/// Validator stack used by a typical node: structural checks followed by
/// signature checks with the reference signature scheme.
pub type DefaultTransactionValidator = TransactionValidator<KeyedDigestScheme>;
