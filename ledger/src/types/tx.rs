// ledger/src/types/tx.rs

//! Transaction model.
//!
//! A [`Transaction`] owns an ordered list of [`TxInput`]s (references to
//! previous outputs, each carrying the spender's public key and a signature
//! slot) and an ordered list of [`TxOutput`]s, plus a voluntary tip that is
//! pooled and redistributed to nodes by the RSC engine.
//!
//! # Canonical encoding
//!
//! [`Transaction::canonical_bytes`] is the compatibility-critical layout that
//! is hashed and signed. All integers and floats are little-endian:
//!
//! ```text
//! version u32 | input_count u32 | output_count u32 | voluntary_tip f64 | timestamp u64
//! per input:  prev_tx_hash [64] | output_index u32 | public_key [256]
//! per output: recipient_key [256] | amount f64
//! ```
//!
//! Signatures are not part of the encoding, so signing one input never
//! changes the digest another input signs.

use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{PUBLIC_KEY_LEN, PrivateKey, PublicKey, Signature, TX_HASH_LEN, TxHash};
use crate::crypto::{PqSignatureScheme, double_hash};
use crate::validation::{TxError, TxLimits};

/// The only transaction version accepted by validation.
pub const TX_VERSION: u32 = 1;

/// Value reported by [`voluntary_tip_of`] when there is no transaction.
///
/// Tips are never negative, so this cannot collide with a real tip.
pub const TIP_UNAVAILABLE: f64 = -1.0;

/// Upper bound on the size of a wire envelope accepted by
/// [`Transaction::decode_wire`].
pub const MAX_WIRE_BYTES: usize = 1 << 20;

const HEADER_LEN: usize = 4 + 4 + 4 + 8 + 8;
const INPUT_LEN: usize = TX_HASH_LEN + 4 + PUBLIC_KEY_LEN;
const OUTPUT_LEN: usize = PUBLIC_KEY_LEN + 8;

/// Reference to a previous output being spent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TxInput {
    /// Hash of the transaction that created the output.
    pub prev_tx_hash: TxHash,

    /// Index of the output within that transaction.
    pub output_index: u32,

    /// Public key of the spender; signatures are verified against it.
    pub public_key: PublicKey,

    /// Signature over [`Transaction::hash`].
    ///
    /// [`Signature::EMPTY`] until [`Transaction::sign_input`] fills it.
    pub signature: Signature,
}

/// Amount paid to a recipient key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TxOutput {
    pub recipient_key: PublicKey,
    pub amount: f64,
}

/// A value transfer with a voluntary tip.
///
/// Construction, signing and mutation take `&mut self`; a transaction is not
/// internally synchronized.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Format version, [`TX_VERSION`] for every transaction built here.
    pub version: u32,

    inputs: Vec<TxInput>,

    outputs: Vec<TxOutput>,

    /// Extra amount offered on top of the outputs, collected into the
    /// network tip pool.
    ///
    /// Prefer [`Transaction::set_voluntary_tip`], which rejects negative
    /// values. Validation rejects negative tips regardless of how they got
    /// here (e.g. from a decoded envelope).
    pub voluntary_tip: f64,

    /// Network-synchronized creation time in milliseconds; 0 means unset.
    pub timestamp: u64,

    #[serde(skip)]
    limits: TxLimits,
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl Transaction {
    /// Creates an empty version-1 transaction with the default size limits.
    pub fn new() -> Self {
        Self::with_limits(TxLimits::default())
    }

    /// Creates an empty version-1 transaction bounded by `limits`.
    pub fn with_limits(limits: TxLimits) -> Self {
        Self {
            version: TX_VERSION,
            inputs: Vec::new(),
            outputs: Vec::new(),
            voluntary_tip: 0.0,
            timestamp: 0,
            limits,
        }
    }

    pub fn inputs(&self) -> &[TxInput] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[TxOutput] {
        &self.outputs
    }

    pub fn limits(&self) -> TxLimits {
        self.limits
    }

    /// Appends an unsigned input spending `prev_tx_hash:output_index`.
    ///
    /// Fails with [`TxError::InvalidArgument`] once the input bound is
    /// reached and with [`TxError::AllocationFailure`] if storage cannot
    /// grow. On failure the transaction is left untouched.
    pub fn add_input(
        &mut self,
        prev_tx_hash: &TxHash,
        output_index: u32,
        public_key: &PublicKey,
    ) -> Result<(), TxError> {
        if self.inputs.len() >= self.limits.max_inputs {
            return Err(TxError::InvalidArgument("input limit reached"));
        }
        self.inputs
            .try_reserve(1)
            .map_err(|_| TxError::AllocationFailure)?;

        self.inputs.push(TxInput {
            prev_tx_hash: *prev_tx_hash,
            output_index,
            public_key: public_key.clone(),
            signature: Signature::EMPTY,
        });
        Ok(())
    }

    /// Appends an output paying `amount` to `recipient_key`.
    ///
    /// Fails with [`TxError::InvalidArgument`] if `amount` is not a positive
    /// finite number or the output bound is reached.
    pub fn add_output(&mut self, recipient_key: &PublicKey, amount: f64) -> Result<(), TxError> {
        if !(amount > 0.0 && amount.is_finite()) {
            return Err(TxError::InvalidArgument("output amount must be positive"));
        }
        if self.outputs.len() >= self.limits.max_outputs {
            return Err(TxError::InvalidArgument("output limit reached"));
        }
        self.outputs
            .try_reserve(1)
            .map_err(|_| TxError::AllocationFailure)?;

        self.outputs.push(TxOutput {
            recipient_key: recipient_key.clone(),
            amount,
        });
        Ok(())
    }

    /// Sets the voluntary tip.
    ///
    /// Negative and non-finite amounts are rejected and the previous tip is
    /// kept.
    pub fn set_voluntary_tip(&mut self, amount: f64) -> Result<(), TxError> {
        if !(amount >= 0.0 && amount.is_finite()) {
            return Err(TxError::InvalidArgument("voluntary tip must be non-negative"));
        }
        self.voluntary_tip = amount;
        Ok(())
    }

    pub fn voluntary_tip(&self) -> f64 {
        self.voluntary_tip
    }

    /// Sum of all output amounts.
    ///
    /// This is not checked against the value of the spent outputs here; that
    /// requires the UTXO set and is left to its owner.
    pub fn total_output(&self) -> f64 {
        self.outputs.iter().map(|o| o.amount).sum()
    }

    /// Returns the canonical byte encoding used for hashing and signing.
    ///
    /// See the module docs for the layout. Signatures are excluded.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let len = HEADER_LEN + self.inputs.len() * INPUT_LEN + self.outputs.len() * OUTPUT_LEN;
        let mut buf = BytesMut::with_capacity(len);

        buf.put_u32_le(self.version);
        buf.put_u32_le(self.inputs.len() as u32);
        buf.put_u32_le(self.outputs.len() as u32);
        buf.put_f64_le(self.voluntary_tip);
        buf.put_u64_le(self.timestamp);

        for input in &self.inputs {
            buf.put_slice(input.prev_tx_hash.as_bytes());
            buf.put_u32_le(input.output_index);
            buf.put_slice(input.public_key.as_bytes());
        }

        for output in &self.outputs {
            buf.put_slice(output.recipient_key.as_bytes());
            buf.put_f64_le(output.amount);
        }

        buf.to_vec()
    }

    /// Computes the transaction identifier: the double SHA-512 of
    /// [`Transaction::canonical_bytes`].
    pub fn hash(&self) -> TxHash {
        double_hash(&self.canonical_bytes())
    }

    /// Signs input `index` with `private_key`, storing the signature in the
    /// input's slot.
    pub fn sign_input<S>(
        &mut self,
        index: usize,
        private_key: &PrivateKey,
        scheme: &S,
    ) -> Result<(), TxError>
    where
        S: PqSignatureScheme + ?Sized,
    {
        let len = self.inputs.len();
        if index >= len {
            return Err(TxError::OutOfRange { index, len });
        }

        let digest = self.hash();
        let signature = scheme.sign(&digest, private_key)?;
        self.inputs[index].signature = signature;

        debug!(index, tx = ?digest, "signed transaction input");
        Ok(())
    }

    /// Verifies the signature stored on input `index` against the input's
    /// own public key.
    ///
    /// A bad signature is `Ok(false)`; only an out-of-range index is an
    /// error.
    pub fn verify_input<S>(&self, index: usize, scheme: &S) -> Result<bool, TxError>
    where
        S: PqSignatureScheme + ?Sized,
    {
        let input = self.inputs.get(index).ok_or(TxError::OutOfRange {
            index,
            len: self.inputs.len(),
        })?;
        let digest = self.hash();
        Ok(scheme.verify(&input.signature, &digest, &input.public_key))
    }

    /// Frees the input/output storage and zeroes every field.
    ///
    /// A released transaction has version 0 and fails validation.
    pub fn release(&mut self) {
        self.inputs = Vec::new();
        self.outputs = Vec::new();
        self.version = 0;
        self.voluntary_tip = 0.0;
        self.timestamp = 0;
    }

    /// Encodes the full transaction, signatures included, for transport to
    /// another node.
    pub fn encode_wire(&self) -> Result<Vec<u8>, TxError> {
        let cfg = bincode::config::standard();
        bincode::serde::encode_to_vec(self, cfg).map_err(|e| TxError::Encoding(e.to_string()))
    }

    /// Decodes a transaction produced by [`Transaction::encode_wire`].
    ///
    /// The decoded transaction uses the default [`TxLimits`] and is not
    /// validated; pass it through a validator before trusting it.
    pub fn decode_wire(bytes: &[u8]) -> Result<Self, TxError> {
        let cfg = bincode::config::standard().with_limit::<MAX_WIRE_BYTES>();
        let (tx, read): (Transaction, usize) = bincode::serde::decode_from_slice(bytes, cfg)
            .map_err(|e| TxError::Encoding(e.to_string()))?;
        if read != bytes.len() {
            return Err(TxError::Encoding(format!(
                "{} trailing bytes after transaction",
                bytes.len() - read
            )));
        }
        Ok(tx)
    }
}

/// Returns the tip of `tx`, or [`TIP_UNAVAILABLE`] when there is none.
pub fn voluntary_tip_of(tx: Option<&Transaction>) -> f64 {
    tx.map_or(TIP_UNAVAILABLE, Transaction::voluntary_tip)
}

/// Sets the tip on `tx`, rejecting a missing transaction.
pub fn set_voluntary_tip_on(tx: Option<&mut Transaction>, amount: f64) -> Result<(), TxError> {
    match tx {
        Some(tx) => tx.set_voluntary_tip(amount),
        None => Err(TxError::InvalidArgument("missing transaction")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyedDigestScheme;

    fn dummy_hash(byte: u8) -> TxHash {
        TxHash([byte; TX_HASH_LEN])
    }

    fn dummy_key(byte: u8) -> PublicKey {
        PublicKey([byte; PUBLIC_KEY_LEN])
    }

    fn dummy_tx() -> Transaction {
        let mut tx = Transaction::new();
        tx.add_input(&dummy_hash(1), 0, &dummy_key(2))
            .expect("add input");
        tx.add_output(&dummy_key(3), 10.0).expect("add output");
        tx.timestamp = 1_700_000_000_000;
        tx
    }

    #[test]
    fn new_transaction_is_empty_version_one() {
        let tx = Transaction::new();
        assert_eq!(tx.version, TX_VERSION);
        assert!(tx.inputs().is_empty());
        assert!(tx.outputs().is_empty());
        assert_eq!(tx.voluntary_tip(), 0.0);
        assert_eq!(tx.timestamp, 0);
    }

    #[test]
    fn add_input_starts_with_empty_signature() {
        let tx = dummy_tx();
        let input = &tx.inputs()[0];
        assert_eq!(input.prev_tx_hash, dummy_hash(1));
        assert_eq!(input.output_index, 0);
        assert_eq!(input.public_key, dummy_key(2));
        assert!(input.signature.is_empty());
    }

    #[test]
    fn add_output_rejects_non_positive_amounts() {
        let mut tx = Transaction::new();
        for amount in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = tx.add_output(&dummy_key(1), amount).unwrap_err();
            assert!(matches!(err, TxError::InvalidArgument(_)), "{amount}: {err:?}");
        }
        assert!(tx.outputs().is_empty());
    }

    #[test]
    fn appending_past_the_limits_fails_without_mutation() {
        let mut tx = Transaction::with_limits(TxLimits {
            max_inputs: 2,
            max_outputs: 1,
        });

        tx.add_input(&dummy_hash(1), 0, &dummy_key(1)).expect("first input");
        tx.add_input(&dummy_hash(1), 1, &dummy_key(1)).expect("second input");
        let err = tx.add_input(&dummy_hash(1), 2, &dummy_key(1)).unwrap_err();
        assert!(matches!(err, TxError::InvalidArgument(_)));
        assert_eq!(tx.inputs().len(), 2);

        tx.add_output(&dummy_key(2), 1.0).expect("first output");
        assert!(tx.add_output(&dummy_key(2), 1.0).is_err());
        assert_eq!(tx.outputs().len(), 1);
    }

    #[test]
    fn canonical_bytes_follow_the_fixed_layout() {
        let mut tx = dummy_tx();
        tx.set_voluntary_tip(1.5).expect("set tip");
        let bytes = tx.canonical_bytes();

        assert_eq!(bytes.len(), HEADER_LEN + INPUT_LEN + OUTPUT_LEN);
        assert_eq!(&bytes[0..4], &1u32.to_le_bytes());
        assert_eq!(&bytes[4..8], &1u32.to_le_bytes());
        assert_eq!(&bytes[8..12], &1u32.to_le_bytes());
        assert_eq!(&bytes[12..20], &1.5f64.to_le_bytes());
        assert_eq!(&bytes[20..28], &1_700_000_000_000u64.to_le_bytes());

        let input = &bytes[HEADER_LEN..HEADER_LEN + INPUT_LEN];
        assert!(input[..TX_HASH_LEN].iter().all(|b| *b == 1));
        assert_eq!(&input[TX_HASH_LEN..TX_HASH_LEN + 4], &0u32.to_le_bytes());
        assert!(input[TX_HASH_LEN + 4..].iter().all(|b| *b == 2));

        let output = &bytes[HEADER_LEN + INPUT_LEN..];
        assert!(output[..PUBLIC_KEY_LEN].iter().all(|b| *b == 3));
        assert_eq!(&output[PUBLIC_KEY_LEN..], &10.0f64.to_le_bytes());
    }

    #[test]
    fn hash_is_stable_and_ignores_signatures() {
        let scheme = KeyedDigestScheme;
        let kp = scheme.keypair_from_seed(&[5u8; 32]);
        let mut tx = Transaction::new();
        tx.add_input(&dummy_hash(1), 0, &kp.public).expect("add input");
        tx.add_output(&dummy_key(3), 10.0).expect("add output");
        tx.timestamp = 42;

        let before = tx.hash();
        assert_eq!(before, tx.hash());

        tx.sign_input(0, &kp.private, &scheme).expect("sign input");
        assert_eq!(before, tx.hash());
    }

    #[test]
    fn hash_changes_with_every_encoded_field() {
        let base = dummy_tx();
        let h = base.hash();

        let mut tipped = base.clone();
        tipped.set_voluntary_tip(0.5).expect("set tip");
        let mut tipped_more = base.clone();
        tipped_more.set_voluntary_tip(0.7).expect("set tip");
        assert_ne!(tipped.hash(), tipped_more.hash());
        assert_ne!(tipped.hash(), h);

        let mut later = base.clone();
        later.timestamp += 1;
        assert_ne!(later.hash(), h);

        let mut more_outputs = base.clone();
        more_outputs.add_output(&dummy_key(4), 1.0).expect("add output");
        assert_ne!(more_outputs.hash(), h);

        let mut more_inputs = base.clone();
        more_inputs
            .add_input(&dummy_hash(1), 1, &dummy_key(2))
            .expect("add input");
        assert_ne!(more_inputs.hash(), h);

        let mut other_version = base.clone();
        other_version.version += 1;
        assert_ne!(other_version.hash(), h);

        let mut other_prev = base.clone();
        other_prev.inputs[0].prev_tx_hash = dummy_hash(9);
        assert_ne!(other_prev.hash(), h);

        let mut other_index = base.clone();
        other_index.inputs[0].output_index = 1;
        assert_ne!(other_index.hash(), h);

        let mut other_sender = base.clone();
        other_sender.inputs[0].public_key = dummy_key(8);
        assert_ne!(other_sender.hash(), h);

        let mut other_recipient = base.clone();
        other_recipient.outputs[0].recipient_key = dummy_key(7);
        assert_ne!(other_recipient.hash(), h);

        let mut other_amount = base.clone();
        other_amount.outputs[0].amount = 10.5;
        assert_ne!(other_amount.hash(), h);
    }

    #[test]
    fn sign_and_verify_input() {
        let scheme = KeyedDigestScheme;
        let kp = scheme.keypair_from_seed(&[9u8; 32]);
        let mut tx = Transaction::new();
        tx.add_input(&dummy_hash(7), 3, &kp.public).expect("add input");
        tx.add_output(&dummy_key(3), 2.5).expect("add output");
        tx.timestamp = 1;

        assert!(!tx.verify_input(0, &scheme).expect("verify unsigned"));

        tx.sign_input(0, &kp.private, &scheme).expect("sign input");
        assert!(tx.verify_input(0, &scheme).expect("verify signed"));

        // Any change to the encoded payload invalidates the signature.
        tx.timestamp = 2;
        assert!(!tx.verify_input(0, &scheme).expect("verify tampered"));
    }

    #[test]
    fn sign_and_verify_reject_out_of_range_index() {
        let scheme = KeyedDigestScheme;
        let kp = scheme.keypair_from_seed(&[1u8; 32]);
        let mut tx = dummy_tx();

        let err = tx.sign_input(1, &kp.private, &scheme).unwrap_err();
        assert!(matches!(err, TxError::OutOfRange { index: 1, len: 1 }));

        let err = tx.verify_input(5, &scheme).unwrap_err();
        assert!(matches!(err, TxError::OutOfRange { index: 5, len: 1 }));
    }

    #[test]
    fn negative_tip_is_rejected_and_prior_value_kept() {
        let mut tx = Transaction::new();
        tx.set_voluntary_tip(1.5).expect("set tip");
        assert_eq!(tx.voluntary_tip(), 1.5);

        tx.set_voluntary_tip(0.0).expect("zero tip");
        assert_eq!(tx.voluntary_tip(), 0.0);

        tx.set_voluntary_tip(2.0).expect("set tip");
        assert!(tx.set_voluntary_tip(-1.0).is_err());
        assert!(tx.set_voluntary_tip(f64::NAN).is_err());
        assert_eq!(tx.voluntary_tip(), 2.0);
    }

    #[test]
    fn missing_transaction_uses_sentinel_and_rejects_tip() {
        assert_eq!(voluntary_tip_of(None), TIP_UNAVAILABLE);
        assert!(set_voluntary_tip_on(None, 1.0).is_err());

        let mut tx = Transaction::new();
        set_voluntary_tip_on(Some(&mut tx), 3.0).expect("set tip through option");
        assert_eq!(voluntary_tip_of(Some(&tx)), 3.0);
    }

    #[test]
    fn release_frees_storage_and_zeroes_fields() {
        let mut tx = dummy_tx();
        tx.set_voluntary_tip(1.0).expect("set tip");
        tx.release();

        assert_eq!(tx.version, 0);
        assert!(tx.inputs().is_empty());
        assert!(tx.outputs().is_empty());
        assert_eq!(tx.inputs.capacity(), 0);
        assert_eq!(tx.voluntary_tip(), 0.0);
        assert_eq!(tx.timestamp, 0);
    }

    #[test]
    fn wire_envelope_preserves_signatures_and_canonical_bytes() {
        let scheme = KeyedDigestScheme;
        let kp = scheme.keypair_from_seed(&[4u8; 32]);
        let mut tx = Transaction::new();
        tx.add_input(&dummy_hash(8), 1, &kp.public).expect("add input");
        tx.add_output(&dummy_key(3), 10.0).expect("add output");
        tx.set_voluntary_tip(0.25).expect("set tip");
        tx.timestamp = 99;
        tx.sign_input(0, &kp.private, &scheme).expect("sign input");

        let bytes = tx.encode_wire().expect("encode wire");
        let decoded = Transaction::decode_wire(&bytes).expect("decode wire");

        assert_eq!(decoded.canonical_bytes(), tx.canonical_bytes());
        assert_eq!(decoded.inputs()[0].signature, tx.inputs()[0].signature);
        assert!(decoded.verify_input(0, &scheme).expect("verify decoded"));

        let mut padded = bytes.clone();
        padded.push(0);
        assert!(matches!(
            Transaction::decode_wire(&padded),
            Err(TxError::Encoding(_))
        ));
    }
}
