//! Crypto facade consumed by the transaction engine.
//!
//! The ledger treats its cryptographic primitives as opaque building blocks:
//!
//! - [`double_hash`]: two chained SHA-512 applications, producing the
//!   64-byte [`TxHash`] that identifies and is signed for a transaction,
//! - [`PqSignatureScheme`]: post-quantum sign/verify over that digest with
//!   fixed-size key blobs (256-byte public keys, 128-byte private keys,
//!   signatures of up to 256 bytes).
//!
//! Production nodes plug their post-quantum provider in through the trait.
//! [`KeyedDigestScheme`] is a deterministic reference implementation with the
//! same key and signature sizes, used by simulations, the demo node and tests.

use rand::RngCore;
use sha2::{Digest, Sha512};
use thiserror::Error;

use crate::types::{
    PRIVATE_KEY_LEN, PUBLIC_KEY_LEN, PrivateKey, PublicKey, SIGNATURE_LEN, Signature, TX_HASH_LEN,
    TxHash,
};

/// Errors surfaced by a signature provider.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The provider produced a signature that does not fit the input slot.
    #[error("signature of {len} bytes exceeds the 256-byte input slot")]
    SignatureTooLong { len: usize },
    /// The provider refused or failed to sign.
    #[error("signing failed: {0}")]
    Signing(String),
}

/// Hashes `data` with SHA-512, then hashes the resulting digest again.
///
/// The second pass means the published identifier is never a raw
/// Merkle–Damgård state over attacker-chosen bytes.
pub fn double_hash(data: &[u8]) -> TxHash {
    let first = Sha512::digest(data);
    let second = Sha512::digest(first);
    let mut out = [0u8; TX_HASH_LEN];
    out.copy_from_slice(&second);
    TxHash(out)
}

/// Left-aligns a variable-length signature into a zero-padded input slot.
///
/// For providers whose native signatures are shorter than [`SIGNATURE_LEN`].
pub fn pad_signature(bytes: &[u8]) -> Result<Signature, CryptoError> {
    if bytes.len() > SIGNATURE_LEN {
        return Err(CryptoError::SignatureTooLong { len: bytes.len() });
    }
    let mut slot = [0u8; SIGNATURE_LEN];
    slot[..bytes.len()].copy_from_slice(bytes);
    Ok(Signature(slot))
}

/// Post-quantum signature provider.
///
/// Implementations must be deterministic in their verdicts and must never
/// panic on malformed input: a signature that does not verify is a normal
/// `false`, not an error.
pub trait PqSignatureScheme: Send + Sync {
    /// Signs a 64-byte transaction digest.
    fn sign(&self, message: &TxHash, private_key: &PrivateKey) -> Result<Signature, CryptoError>;

    /// Verifies `signature` over `message` against `public_key`.
    fn verify(&self, signature: &Signature, message: &TxHash, public_key: &PublicKey) -> bool;

    /// Whether signatures can only be produced with the private key.
    fn is_unforgeable(&self) -> bool {
        true
    }
}

/// A public/private key pair with the ledger's fixed blob sizes.
#[derive(Clone, Debug)]
pub struct Keypair {
    pub public: PublicKey,
    pub private: PrivateKey,
}

const PK_DOMAIN: &[u8] = b"ledger/keyed-digest/pk";
const SIG_DOMAIN: &[u8] = b"ledger/keyed-digest/sig";
const SEED_DOMAIN: &[u8] = b"ledger/keyed-digest/seed";

/// Deterministic SHA-512 based signature scheme.
///
/// The public key is a SHA-512 expansion of the private key and a signature
/// is a SHA-512 expansion of `(public_key, message)`. Signatures are bound to
/// both the key and the digest, so verification against another key or a
/// tampered message fails, but anyone holding the public key can produce
/// them: this scheme offers **no** unforgeability and exists for simulations
/// and tests only.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeyedDigestScheme;

impl KeyedDigestScheme {
    /// Derives the public key that belongs to `private_key`.
    pub fn public_key_for(&self, private_key: &PrivateKey) -> PublicKey {
        PublicKey(expand::<PUBLIC_KEY_LEN>(PK_DOMAIN, &[private_key.as_bytes().as_slice()]))
    }

    /// Builds a key pair from a 32-byte seed.
    pub fn keypair_from_seed(&self, seed: &[u8; 32]) -> Keypair {
        let private = PrivateKey(expand::<PRIVATE_KEY_LEN>(SEED_DOMAIN, &[seed.as_slice()]));
        let public = self.public_key_for(&private);
        Keypair { public, private }
    }

    /// Builds a key pair from fresh OS randomness.
    pub fn generate_keypair(&self) -> Keypair {
        let mut seed = [0u8; 32];
        rand::rng().fill_bytes(&mut seed);
        self.keypair_from_seed(&seed)
    }

    fn tag(&self, message: &TxHash, public_key: &PublicKey) -> Signature {
        Signature(expand::<SIGNATURE_LEN>(
            SIG_DOMAIN,
            &[public_key.as_bytes().as_slice(), message.as_bytes().as_slice()],
        ))
    }
}

impl PqSignatureScheme for KeyedDigestScheme {
    fn sign(&self, message: &TxHash, private_key: &PrivateKey) -> Result<Signature, CryptoError> {
        let public_key = self.public_key_for(private_key);
        Ok(self.tag(message, &public_key))
    }

    fn verify(&self, signature: &Signature, message: &TxHash, public_key: &PublicKey) -> bool {
        self.tag(message, public_key) == *signature
    }

    fn is_unforgeable(&self) -> bool {
        false
    }
}

/// Fills `N` bytes with counter-mode SHA-512 blocks over `domain || i || parts`.
fn expand<const N: usize>(domain: &[u8], parts: &[&[u8]]) -> [u8; N] {
    let mut out = [0u8; N];
    for (i, chunk) in out.chunks_mut(64).enumerate() {
        let mut hasher = Sha512::new();
        hasher.update(domain);
        hasher.update((i as u32).to_le_bytes());
        for part in parts {
            hasher.update(part);
        }
        let block = hasher.finalize();
        chunk.copy_from_slice(&block[..chunk.len()]);
    }
    out
}
