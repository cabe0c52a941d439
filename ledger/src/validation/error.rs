use thiserror::Error;

use crate::crypto::CryptoError;

/// Errors returned by transaction construction, signing and validation.
#[derive(Debug, Error)]
pub enum TxError {
    /// A required argument is unusable (non-positive amount, negative tip,
    /// input/output bound reached, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// An input index beyond the current input count.
    #[error("input index {index} out of range for {len} inputs")]
    OutOfRange { index: usize, len: usize },

    /// The transaction failed composite validation.
    ///
    /// Callers should only rely on pass/fail; the reason is carried for
    /// logging and metrics.
    #[error("invalid transaction: {0}")]
    Invalid(InvalidReason),

    /// Input/output storage could not grow.
    #[error("unable to grow transaction storage")]
    AllocationFailure,

    /// Validation was attempted before [`ValidationContext::init`](super::ValidationContext::init).
    #[error("transaction validation is not initialized")]
    NotInitialized,

    /// The signature provider failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// A wire envelope could not be decoded.
    #[error("malformed transaction encoding: {0}")]
    Encoding(String),
}

/// Why a transaction failed composite validation.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum InvalidReason {
    #[error("unsupported version {0}")]
    UnsupportedVersion(u32),
    #[error("transaction has no inputs")]
    NoInputs,
    #[error("{count} inputs exceed the maximum of {max}")]
    TooManyInputs { count: usize, max: usize },
    #[error("transaction has no outputs")]
    NoOutputs,
    #[error("{count} outputs exceed the maximum of {max}")]
    TooManyOutputs { count: usize, max: usize },
    #[error("voluntary tip {0} is negative or not finite")]
    BadTip(f64),
    #[error("{failures} signature failures exceed the tolerated {tolerated}")]
    TooManySignatureFailures { failures: usize, tolerated: usize },
    #[error("output {index} has non-positive amount {amount}")]
    NonPositiveOutput { index: usize, amount: f64 },
    #[error("timestamp is not set")]
    MissingTimestamp,
}

impl InvalidReason {
    /// Short, stable label used for metrics and structured logs.
    pub fn label(&self) -> &'static str {
        match self {
            InvalidReason::UnsupportedVersion(_) => "version",
            InvalidReason::NoInputs | InvalidReason::TooManyInputs { .. } => "input_count",
            InvalidReason::NoOutputs | InvalidReason::TooManyOutputs { .. } => "output_count",
            InvalidReason::BadTip(_) => "tip",
            InvalidReason::TooManySignatureFailures { .. } => "signatures",
            InvalidReason::NonPositiveOutput { .. } => "output_amount",
            InvalidReason::MissingTimestamp => "timestamp",
        }
    }
}

impl From<InvalidReason> for TxError {
    fn from(reason: InvalidReason) -> Self {
        TxError::Invalid(reason)
    }
}
