//! Core domain types used by the ledger
//!
//! This module defines strongly-typed digests, key blobs, signatures and node
//! identifiers that are shared across the transaction engine and the Rapid
//! Stake Consensus (RSC) engine. The goal is to avoid "naked" byte buffers in
//! public APIs and instead use fixed-size, domain-specific newtypes.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Node records and their rolling performance metrics.
pub mod node;
/// Transactions, their canonical encoding and signing.
pub mod tx;

pub use node::{NodeMetrics, NodeStake};
pub use tx::{Transaction, TxInput, TxOutput};

/// Length in bytes of a transaction digest (double SHA-512).
pub const TX_HASH_LEN: usize = 64;

/// Length in bytes of a public key blob.
pub const PUBLIC_KEY_LEN: usize = 256;

/// Length in bytes of a private key blob.
pub const PRIVATE_KEY_LEN: usize = 128;

/// Length in bytes of the signature slot carried by every input.
pub const SIGNATURE_LEN: usize = 256;

/// Maximum length in bytes of a [`NodeId`].
pub const NODE_ID_MAX_LEN: usize = 63;

/// Implements byte-oriented serde for fixed-size array newtypes.
///
/// serde only derives array impls up to 32 elements, so the larger blobs go
/// through `serialize_bytes` and are length-checked on the way back in.
macro_rules! impl_fixed_bytes_serde {
    ($ty:ident, $len:expr) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_bytes(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let bytes: Vec<u8> = Deserialize::deserialize(deserializer)?;
                $ty::from_slice(&bytes).ok_or_else(|| {
                    serde::de::Error::custom(format!(
                        "expected {} bytes for {}, got {}",
                        $len,
                        stringify!($ty),
                        bytes.len()
                    ))
                })
            }
        }

        impl $ty {
            /// Copies `bytes` into a new value, or returns `None` when the
            /// length does not match exactly.
            pub fn from_slice(bytes: &[u8]) -> Option<Self> {
                let arr: [u8; $len] = bytes.try_into().ok()?;
                Some($ty(arr))
            }

            /// Returns the underlying bytes as a borrowed array.
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }
        }
    };
}

/// Strongly-typed 512-bit transaction digest.
///
/// This is the double SHA-512 of a transaction's canonical encoding and the
/// identifier used to reference its outputs from later inputs
/// (`prev_tx_hash` + `output_index`).
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct TxHash(pub [u8; TX_HASH_LEN]);

impl_fixed_bytes_serde!(TxHash, TX_HASH_LEN);

impl TxHash {
    /// The all-zero digest, used e.g. as the previous hash of coinbase-style
    /// inputs in tests and simulations.
    pub const ZERO: TxHash = TxHash([0u8; TX_HASH_LEN]);

    /// Lower-case hex encoding of the digest.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Post-quantum public key bytes, wrapped to avoid naked arrays.
///
/// This type is intentionally opaque: the transaction model never interprets
/// the key material, it only carries it into the canonical encoding and hands
/// it to the signature scheme.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct PublicKey(pub [u8; PUBLIC_KEY_LEN]);

impl_fixed_bytes_serde!(PublicKey, PUBLIC_KEY_LEN);

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({}..)", hex::encode(&self.0[..8]))
    }
}

/// Post-quantum private key bytes.
///
/// Never serialized and redacted in `Debug` output.
#[derive(Clone)]
pub struct PrivateKey(pub [u8; PRIVATE_KEY_LEN]);

impl PrivateKey {
    /// Copies `bytes` into a new key, or returns `None` on a length mismatch.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; PRIVATE_KEY_LEN] = bytes.try_into().ok()?;
        Some(PrivateKey(arr))
    }

    /// Returns the raw key bytes (be careful with secret material!)
    pub fn as_bytes(&self) -> &[u8; PRIVATE_KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey([REDACTED])")
    }
}

/// Signature slot of a transaction input.
///
/// Schemes that produce shorter signatures left-align them and zero-pad the
/// remainder. A freshly added input carries [`Signature::EMPTY`].
#[derive(Clone, Eq, PartialEq)]
pub struct Signature(pub [u8; SIGNATURE_LEN]);

impl_fixed_bytes_serde!(Signature, SIGNATURE_LEN);

impl Signature {
    /// The all-zero signature of an input that has not been signed yet.
    pub const EMPTY: Signature = Signature([0u8; SIGNATURE_LEN]);

    /// Returns `true` if no signature has been written into this slot.
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}..)", hex::encode(&self.0[..8]))
    }
}

/// Unique, human-readable node identifier (e.g. `"node-3"`).
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeId(String);

impl NodeId {
    /// Builds a node identifier, rejecting empty ids and ids longer than
    /// [`NODE_ID_MAX_LEN`] bytes.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.is_empty() || id.len() > NODE_ID_MAX_LEN {
            return None;
        }
        Some(NodeId(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for NodeId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let len = value.len();
        NodeId::new(value)
            .ok_or_else(|| format!("node id must be 1..={NODE_ID_MAX_LEN} bytes, got {len}"))
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
