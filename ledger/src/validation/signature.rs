//! Per-input signature predicate with a soft failure threshold.

use tracing::debug;

use crate::crypto::PqSignatureScheme;
use crate::types::Transaction;

use super::config::SignaturePolicy;
use super::error::{InvalidReason, TxError};
use super::validator::{TxValidator, ValidationReport};

/// Verifies every input signature against the input's own public key.
///
/// Up to [`SignaturePolicy::max_signature_failures`] failing inputs are
/// tolerated; the transaction is rejected as soon as the count goes past
/// that. Tolerated failures are recorded in the [`ValidationReport`].
pub struct SignatureValidity<S> {
    scheme: S,
    policy: SignaturePolicy,
}

impl<S> SignatureValidity<S> {
    pub fn new(scheme: S, policy: SignaturePolicy) -> Self {
        Self { scheme, policy }
    }

    pub fn scheme(&self) -> &S {
        &self.scheme
    }
}

impl<S> TxValidator for SignatureValidity<S>
where
    S: PqSignatureScheme,
{
    fn validate(&self, tx: &Transaction, report: &mut ValidationReport) -> Result<(), TxError> {
        // Signatures are outside the canonical encoding, so one digest
        // serves every input.
        let digest = report.hash;
        let tolerated = self.policy.max_signature_failures;

        for (index, input) in tx.inputs().iter().enumerate() {
            if self
                .scheme
                .verify(&input.signature, &digest, &input.public_key)
            {
                continue;
            }

            report.signature_failures += 1;
            debug!(index, tx = ?digest, "input signature failed to verify");

            if report.signature_failures > tolerated {
                return Err(InvalidReason::TooManySignatureFailures {
                    failures: report.signature_failures,
                    tolerated,
                }
                .into());
            }
        }
        Ok(())
    }
}
