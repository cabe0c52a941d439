//! Pool of validated transactions and their accumulated voluntary tips.
//!
//! Admission runs the full validity predicate; tips of admitted
//! transactions accumulate until an epoch takes them for distribution.

use std::collections::{HashSet, VecDeque};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::crypto::PqSignatureScheme;
use crate::types::{Transaction, TxHash};
use crate::validation::{TransactionValidator, TxError, ValidationContext, ValidationReport};

/// Errors returned by [`TxPool`].
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("transaction {0} is already pooled")]
    Duplicate(TxHash),
    #[error("pool is full ({capacity} transactions)")]
    Full { capacity: usize },
    #[error("tip {tip} would overflow the pending tip pool")]
    TipOverflow { tip: f64 },
    #[error("transaction rejected: {0}")]
    Rejected(#[from] TxError),
}

/// Pool tuning.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum number of pooled transactions.
    pub capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { capacity: 10_000 }
    }
}

/// A transaction that passed validation.
#[derive(Clone, Debug)]
pub struct PooledTx {
    pub tx: Transaction,
    pub report: ValidationReport,
}

/// FIFO pool keyed by transaction hash.
#[derive(Debug)]
pub struct TxPool {
    config: PoolConfig,
    queue: VecDeque<PooledTx>,
    hashes: HashSet<TxHash>,
    pending_tips: f64,
}

impl TxPool {
    pub fn new(config: PoolConfig) -> Self {
        Self {
            config,
            queue: VecDeque::new(),
            hashes: HashSet::new(),
            pending_tips: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn contains(&self, hash: &TxHash) -> bool {
        self.hashes.contains(hash)
    }

    /// Validates `tx` and pools it.
    pub fn admit<S>(
        &mut self,
        tx: Transaction,
        validator: &TransactionValidator<S>,
        ctx: &ValidationContext,
    ) -> Result<TxHash, PoolError>
    where
        S: PqSignatureScheme,
    {
        let hash = tx.hash();
        if self.contains(&hash) {
            return Err(PoolError::Duplicate(hash));
        }
        let report = validator.validate(ctx, &tx)?;
        self.insert_validated(tx, report)
    }

    /// Pools a transaction whose `report` came from a successful validation.
    pub fn insert_validated(
        &mut self,
        tx: Transaction,
        report: ValidationReport,
    ) -> Result<TxHash, PoolError> {
        let hash = report.hash;
        if self.hashes.contains(&hash) {
            return Err(PoolError::Duplicate(hash));
        }
        if self.queue.len() >= self.config.capacity {
            warn!(capacity = self.config.capacity, "transaction pool full");
            return Err(PoolError::Full {
                capacity: self.config.capacity,
            });
        }

        let pending = self.pending_tips + tx.voluntary_tip();
        if !pending.is_finite() {
            warn!(tx = %hash, tip = tx.voluntary_tip(), "tip pool would overflow");
            return Err(PoolError::TipOverflow {
                tip: tx.voluntary_tip(),
            });
        }

        self.pending_tips = pending;
        self.hashes.insert(hash);
        debug!(tx = %hash, tip = tx.voluntary_tip(), pooled = self.queue.len() + 1, "transaction pooled");
        self.queue.push_back(PooledTx { tx, report });
        Ok(hash)
    }

    /// Tips accumulated since the last [`take_tips`](Self::take_tips).
    pub fn pending_tips(&self) -> f64 {
        self.pending_tips
    }

    /// Empties the tip pool and returns its content.
    pub fn take_tips(&mut self) -> f64 {
        std::mem::take(&mut self.pending_tips)
    }

    /// Returns tips that could not be distributed to the pool.
    ///
    /// The pool saturates at `f64::MAX` if tips admitted meanwhile leave no
    /// room for the full amount.
    pub fn credit_tips(&mut self, amount: f64) {
        if !amount.is_finite() || amount <= 0.0 {
            return;
        }
        let pending = self.pending_tips + amount;
        if pending.is_finite() {
            self.pending_tips = pending;
        } else {
            warn!(amount, pending = self.pending_tips, "tip pool saturated");
            self.pending_tips = f64::MAX;
        }
    }

    /// Removes up to `max` transactions, oldest first.
    pub fn drain(&mut self, max: usize) -> Vec<PooledTx> {
        let n = max.min(self.queue.len());
        let drained: Vec<PooledTx> = self.queue.drain(..n).collect();
        for entry in &drained {
            self.hashes.remove(&entry.report.hash);
        }
        drained
    }
}

impl Default for TxPool {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}
