//! Ed25519 keys for the in-process signing oracle.
//!
//! Real identities keep their keys inside the remote oracle. [`KeyPair`]
//! exists so that [`crate::oracle::MemoryOracle`] can behave like one, and
//! [`verify_signature`] lets the in-process ledger check what it signed.
//!
//! Public keys travel as lowercase hex; addresses are the base58 encoding
//! of the first 20 bytes of `SHA-256(public_key)`.

use std::fmt;

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;

use super::hash::sha256;

/// Number of hash bytes kept when deriving an address.
const ADDRESS_HASH_LENGTH: usize = 20;

/// An Ed25519 signing key.
///
/// Does not implement `Serialize`: exporting a secret should be explicit.
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generates a key from the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Builds a key deterministically from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Hex-encoded public key, the form carried in signature records.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.signing_key.verifying_key().to_bytes())
    }

    /// Address derived from the public key.
    pub fn address(&self) -> String {
        address_from_public_key(&self.signing_key.verifying_key().to_bytes())
    }

    /// Signs `message`, returning the 64 signature bytes.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.signing_key.sign(message).to_bytes().to_vec()
    }

    /// Verifies a signature made by this key.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        verify_signature(&self.public_key_hex(), message, signature)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyPair(pub={})", self.public_key_hex())
    }
}

/// Derives the account address for a raw 32-byte public key.
pub fn address_from_public_key(public_key: &[u8; 32]) -> String {
    let hash = sha256(public_key);
    bs58::encode(&hash[..ADDRESS_HASH_LENGTH]).into_string()
}

/// Verifies an Ed25519 signature against a hex-encoded public key.
///
/// Returns `false` for malformed keys or signatures rather than erroring.
pub fn verify_signature(public_key_hex: &str, message: &[u8], signature: &[u8]) -> bool {
    let Ok(key_bytes) = hex::decode(public_key_hex) else {
        return false;
    };
    let Ok(key_bytes) = <[u8; 32]>::try_from(key_bytes.as_slice()) else {
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&key_bytes) else {
        return false;
    };
    let Ok(sig_bytes) = <[u8; 64]>::try_from(signature) else {
        return false;
    };
    verifying_key
        .verify(message, &Signature::from_bytes(&sig_bytes))
        .is_ok()
}
