use serde::Deserialize;

/// Default upper bound on the number of inputs per transaction.
pub const MAX_TX_INPUTS: usize = 256;

/// Default upper bound on the number of outputs per transaction.
pub const MAX_TX_OUTPUTS: usize = 256;

/// Default number of per-input signature failures tolerated by validation.
pub const MAX_SIGNATURE_FAILURES: usize = 10;

/// Size bounds enforced when building and when validating transactions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TxLimits {
    pub max_inputs: usize,
    pub max_outputs: usize,
}

impl Default for TxLimits {
    fn default() -> Self {
        Self {
            max_inputs: MAX_TX_INPUTS,
            max_outputs: MAX_TX_OUTPUTS,
        }
    }
}

/// Soft threshold on failed input signatures.
///
/// A transaction is rejected once more than `max_signature_failures` of its
/// inputs fail to verify. Inputs awaiting a co-signer in a multi-party flow
/// count as failures, so setting this to 0 demands every input be signed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SignaturePolicy {
    pub max_signature_failures: usize,
}

impl Default for SignaturePolicy {
    fn default() -> Self {
        Self {
            max_signature_failures: MAX_SIGNATURE_FAILURES,
        }
    }
}

impl SignaturePolicy {
    /// Policy that tolerates no signature failures at all.
    pub fn strict() -> Self {
        Self {
            max_signature_failures: 0,
        }
    }
}

/// Transaction engine configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TxConfig {
    pub limits: TxLimits,
    pub signatures: SignaturePolicy,
}
