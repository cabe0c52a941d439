//! Base validity predicate for transactions.
//!
//! This validator enforces cheap, deterministic invariants that do not
//! require the signature provider:
//!
//! - supported version,
//! - input and output counts within `1..=max`,
//! - a non-negative voluntary tip,
//! - strictly positive output amounts,
//! - a set timestamp.

use crate::types::Transaction;
use crate::types::tx::TX_VERSION;

use super::config::{TxConfig, TxLimits};
use super::error::{InvalidReason, TxError};
use super::validator::{TxValidator, ValidationReport};

/// Base validity predicate for transactions.
///
/// Configured from [`TxConfig`]; performs purely transaction-local checks.
#[derive(Clone, Debug)]
pub struct BaseValidity {
    limits: TxLimits,
}

impl BaseValidity {
    /// Constructs a new `BaseValidity` from the transaction configuration.
    pub fn new(cfg: &TxConfig) -> Self {
        Self { limits: cfg.limits }
    }

    fn check_version(&self, tx: &Transaction) -> Result<(), InvalidReason> {
        if tx.version != TX_VERSION {
            return Err(InvalidReason::UnsupportedVersion(tx.version));
        }
        Ok(())
    }

    fn check_counts(&self, tx: &Transaction) -> Result<(), InvalidReason> {
        let inputs = tx.inputs().len();
        if inputs == 0 {
            return Err(InvalidReason::NoInputs);
        }
        if inputs > self.limits.max_inputs {
            return Err(InvalidReason::TooManyInputs {
                count: inputs,
                max: self.limits.max_inputs,
            });
        }

        let outputs = tx.outputs().len();
        if outputs == 0 {
            return Err(InvalidReason::NoOutputs);
        }
        if outputs > self.limits.max_outputs {
            return Err(InvalidReason::TooManyOutputs {
                count: outputs,
                max: self.limits.max_outputs,
            });
        }
        Ok(())
    }

    fn check_tip(&self, tx: &Transaction) -> Result<(), InvalidReason> {
        let tip = tx.voluntary_tip();
        if !(tip >= 0.0 && tip.is_finite()) {
            return Err(InvalidReason::BadTip(tip));
        }
        Ok(())
    }

    fn check_output_amounts(&self, tx: &Transaction) -> Result<(), InvalidReason> {
        for (index, output) in tx.outputs().iter().enumerate() {
            if !(output.amount > 0.0 && output.amount.is_finite()) {
                return Err(InvalidReason::NonPositiveOutput {
                    index,
                    amount: output.amount,
                });
            }
        }
        Ok(())
    }

    fn check_timestamp(&self, tx: &Transaction) -> Result<(), InvalidReason> {
        if tx.timestamp == 0 {
            return Err(InvalidReason::MissingTimestamp);
        }
        Ok(())
    }
}

impl TxValidator for BaseValidity {
    fn validate(&self, tx: &Transaction, _report: &mut ValidationReport) -> Result<(), TxError> {
        self.check_version(tx)?;
        self.check_counts(tx)?;
        self.check_tip(tx)?;
        self.check_output_amounts(tx)?;
        self.check_timestamp(tx)?;
        Ok(())
    }
}
