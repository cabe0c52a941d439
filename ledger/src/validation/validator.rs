//! Transaction validity predicates.

use crate::types::{Transaction, TxHash};

use super::error::TxError;

/// Facts gathered while validating a transaction.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationReport {
    /// Identifier of the validated transaction.
    pub hash: TxHash,
    /// Sum of the output amounts.
    ///
    /// Not compared against the spent outputs here: conserving value is the
    /// UTXO collaborator's job before the transaction enters its pool.
    pub total_output: f64,
    /// Inputs whose signature did not verify (tolerated up to the policy).
    pub signature_failures: usize,
}

impl ValidationReport {
    pub fn new(tx: &Transaction) -> Self {
        Self {
            hash: tx.hash(),
            total_output: tx.total_output(),
            signature_failures: 0,
        }
    }
}

/// Pluggable validity predicate for transactions.
///
/// Implementations should be deterministic and side-effect free apart from
/// filling in `report`.
pub trait TxValidator {
    fn validate(&self, tx: &Transaction, report: &mut ValidationReport) -> Result<(), TxError>;
}

/// A validator that composes two other validators.
///
/// `CombinedValidator { first, second }` runs `first.validate` and then
/// `second.validate`, failing fast on the first error. Put the cheap
/// structural checks first.
pub struct CombinedValidator<A, B> {
    pub first: A,
    pub second: B,
}

impl<A, B> CombinedValidator<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A, B> TxValidator for CombinedValidator<A, B>
where
    A: TxValidator,
    B: TxValidator,
{
    fn validate(&self, tx: &Transaction, report: &mut ValidationReport) -> Result<(), TxError> {
        self.first.validate(tx, report)?;
        self.second.validate(tx, report)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::InvalidReason;

    struct RejectAll;

    impl TxValidator for RejectAll {
        fn validate(&self, _tx: &Transaction, _r: &mut ValidationReport) -> Result<(), TxError> {
            Err(InvalidReason::MissingTimestamp.into())
        }
    }

    struct CountFailures(usize);

    impl TxValidator for CountFailures {
        fn validate(&self, _tx: &Transaction, r: &mut ValidationReport) -> Result<(), TxError> {
            r.signature_failures += self.0;
            Ok(())
        }
    }

    #[test]
    fn combined_validator_runs_both_in_order() {
        let tx = Transaction::new();
        let mut report = ValidationReport::new(&tx);
        let v = CombinedValidator::new(CountFailures(1), CountFailures(2));

        v.validate(&tx, &mut report).expect("both accept");
        assert_eq!(report.signature_failures, 3);
    }

    #[test]
    fn combined_validator_fails_fast() {
        let tx = Transaction::new();
        let mut report = ValidationReport::new(&tx);
        let v = CombinedValidator::new(RejectAll, CountFailures(5));

        let err = v.validate(&tx, &mut report).unwrap_err();
        assert!(matches!(err, TxError::Invalid(InvalidReason::MissingTimestamp)));
        assert_eq!(report.signature_failures, 0);
    }
}
