//! In-process signing oracle.
//!
//! Holds Ed25519 keys in a concurrent map keyed by address. Behaves like
//! the remote service, including its error surface: an unknown address is
//! an [`Error::OracleRejected`], and taking the oracle offline makes every
//! call fail with [`Error::OracleUnavailable`].

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use super::SigningOracle;
use crate::crypto::KeyPair;
use crate::error::{Error, Result};
use crate::transaction::SignatureInfo;

/// Code used for "no key for this address".
const UNKNOWN_ADDRESS_CODE: i32 = 404;

#[derive(Debug, Default)]
pub struct MemoryOracle {
    keys: DashMap<String, Arc<KeyPair>>,
    offline: AtomicBool,
    sign_calls: AtomicUsize,
}

impl MemoryOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an existing key and returns its address.
    pub fn insert_key(&self, key: KeyPair) -> String {
        let address = key.address();
        self.keys.insert(address.clone(), Arc::new(key));
        address
    }

    /// Registers the key derived from `seed` and returns its address.
    pub fn with_seed(&self, seed: [u8; 32]) -> String {
        self.insert_key(KeyPair::from_seed(&seed))
    }

    /// Hex public key for `address`, if held.
    pub fn public_key(&self, address: &str) -> Option<String> {
        self.keys.get(address).map(|k| k.public_key_hex())
    }

    /// Simulates the oracle becoming unreachable (or reachable again).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of `sign` calls that reached the key store.
    pub fn sign_calls(&self) -> usize {
        self.sign_calls.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::OracleUnavailable(
                "in-memory oracle is offline".to_string(),
            ));
        }
        Ok(())
    }

    fn key(&self, address: &str) -> Result<Arc<KeyPair>> {
        self.keys
            .get(address)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| Error::OracleRejected {
                code: UNKNOWN_ADDRESS_CODE,
                message: format!("no key held for address {}", address),
            })
    }
}

#[async_trait]
impl SigningOracle for MemoryOracle {
    async fn ping(&self) -> Result<()> {
        self.check_online()
    }

    async fn create(&self) -> Result<String> {
        self.check_online()?;
        let address = self.insert_key(KeyPair::generate());
        debug!(%address, "created key in memory oracle");
        Ok(address)
    }

    async fn exists(&self, address: &str) -> Result<bool> {
        self.check_online()?;
        Ok(self.keys.contains_key(address))
    }

    async fn sign(&self, address: &str, message: &[u8]) -> Result<SignatureInfo> {
        self.check_online()?;
        let key = self.key(address)?;
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        Ok(SignatureInfo {
            public_key: key.public_key_hex(),
            sign: key.sign(message),
        })
    }

    async fn verify(
        &self,
        address: &str,
        message: &[u8],
        signature: &SignatureInfo,
    ) -> Result<bool> {
        self.check_online()?;
        let key = self.key(address)?;
        Ok(key.public_key_hex() == signature.public_key && key.verify(message, &signature.sign))
    }
}
