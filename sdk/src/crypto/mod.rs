//! # Cryptographic Primitives
//!
//! The client never holds private keys for real identities: signatures come
//! from the remote signing oracle. What lives here is the hashing used for
//! transaction digests and ids, plus the Ed25519 key type backing the
//! in-process [`crate::oracle::MemoryOracle`] and the signature check the
//! in-process ledger performs on submission.

pub mod hash;
pub mod keys;

pub use hash::{double_sha256, sha256};
pub use keys::{address_from_public_key, verify_signature, KeyPair};
