//! SHA-256 helpers.
//!
//! Transaction digests and identifiers are `SHA-256(SHA-256(encoding))`,
//! the same double-hash construction the ledger applies when it checks
//! signatures and indexes transactions.

use sha2::{Digest, Sha256};

/// Computes the SHA-256 hash of `data`.
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Computes `SHA-256(SHA-256(data))`.
pub fn double_sha256(data: &[u8]) -> Vec<u8> {
    sha256(&sha256(data))
}
