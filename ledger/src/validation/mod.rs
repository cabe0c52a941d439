//! Transaction validity predicates for the ledger.
//!
//! This module implements the whole-transaction check that gates the tip
//! pool. It is layered like this:
//!
//! - [`base::BaseValidity`]: cheap structural checks (version, counts, tip,
//!   output amounts, timestamp).
//! - [`signature::SignatureValidity`]: per-input post-quantum signature
//!   verification with a configurable soft failure threshold.
//! - [`TransactionValidator`]: the two combined, gated on an initialized
//!   [`ValidationContext`] that also accumulates per-batch counters.

pub mod base;
pub mod config;
pub mod context;
pub mod error;
pub mod signature;
pub mod validator;

pub use base::BaseValidity;
pub use config::{SignaturePolicy, TxConfig, TxLimits};
pub use context::{ValidationContext, ValidationStats};
pub use error::{InvalidReason, TxError};
pub use signature::SignatureValidity;
pub use validator::{CombinedValidator, TxValidator, ValidationReport};

use tracing::debug;

use crate::crypto::PqSignatureScheme;
use crate::types::Transaction;

/// The full transaction validity predicate.
pub struct TransactionValidator<S> {
    inner: CombinedValidator<BaseValidity, SignatureValidity<S>>,
}

impl<S> TransactionValidator<S>
where
    S: PqSignatureScheme,
{
    pub fn new(cfg: &TxConfig, scheme: S) -> Self {
        Self {
            inner: CombinedValidator::new(
                BaseValidity::new(cfg),
                SignatureValidity::new(scheme, cfg.signatures),
            ),
        }
    }

    /// Returns the signature provider used for verification.
    pub fn scheme(&self) -> &S {
        self.inner.second.scheme()
    }

    /// Validates `tx` as a whole.
    ///
    /// Fails with [`TxError::NotInitialized`] before `ctx` is initialized and
    /// with [`TxError::Invalid`] on any violation. The outcome is recorded in
    /// the context's counters.
    pub fn validate(
        &self,
        ctx: &ValidationContext,
        tx: &Transaction,
    ) -> Result<ValidationReport, TxError> {
        if !ctx.is_initialized() {
            return Err(TxError::NotInitialized);
        }

        let mut report = ValidationReport::new(tx);
        let result = self.inner.validate(tx, &mut report);
        ctx.record(result.is_ok(), report.signature_failures);

        match result {
            Ok(()) => {
                debug!(
                    tx = %report.hash,
                    total_output = report.total_output,
                    signature_failures = report.signature_failures,
                    "transaction valid"
                );
                Ok(report)
            }
            Err(e) => {
                debug!(tx = %report.hash, error = %e, "transaction rejected");
                Err(e)
            }
        }
    }
}

impl<S> TxValidator for TransactionValidator<S>
where
    S: PqSignatureScheme,
{
    fn validate(&self, tx: &Transaction, report: &mut ValidationReport) -> Result<(), TxError> {
        self.inner.validate(tx, report)
    }
}
