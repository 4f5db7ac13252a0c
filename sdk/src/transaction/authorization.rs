//! Collecting delegated signatures under an `auth_require` list.
//!
//! Signing a [`Transaction`] walks one state machine:
//!
//! ```text
//! Unsigned --sign--> PartiallySigned --sign--> ... --> FullySigned
//! ```
//!
//! Each accepted signature is appended to both `auth_require_signs` and
//! `initiator_signs`, and the identifier is recomputed. A rejected or failed
//! attempt leaves the transaction exactly as it was.
//!
//! The ledger pairs `auth_require_signs` with `auth_require` by position.
//! This module never reorders: parties must sign in `auth_require` order.

use futures::future::try_join_all;
use tracing::debug;

use super::lifecycle::Transaction;
use crate::config::AUTH_TOKEN_SEPARATOR;
use crate::error::{Error, Result};
use crate::identity::Identity;

/// Whether a signer presenting `token` satisfies the `required` entry.
///
/// Matches on equality, or when `token` equals the segment of `required`
/// after its last separator, so a bare address satisfies a
/// `<contract account>/<address>` requirement.
pub fn token_satisfies(required: &str, token: &str) -> bool {
    if required == token {
        return true;
    }
    let trailing = required
        .rsplit(AUTH_TOKEN_SEPARATOR)
        .next()
        .unwrap_or(required);
    trailing == token
}

/// Whether `token` satisfies any entry of `auth_require`.
pub fn is_authorized(auth_require: &[String], token: &str) -> bool {
    auth_require
        .iter()
        .any(|required| token_satisfies(required, token))
}

impl Transaction {
    fn check_signer(&self, signer: &Identity) -> Result<String> {
        let token = signer.auth_token();
        if !is_authorized(&self.body().auth_require, &token) {
            return Err(Error::SignerNotAuthorized { token });
        }
        Ok(token)
    }

    /// Adds one party's signature.
    ///
    /// Fails with [`Error::NilSigner`] for `None` and
    /// [`Error::SignerNotAuthorized`] when the signer's token matches no
    /// `auth_require` entry. The first successful call seals the digest.
    /// Signing twice with the same identity appends twice.
    pub async fn sign(&mut self, signer: Option<&Identity>) -> Result<()> {
        let signer = signer.ok_or(Error::NilSigner)?;
        let token = self.check_signer(signer)?;

        let digest = self.signing_digest()?;
        let signature = signer.oracle().sign(signer.address(), &digest).await?;
        debug!(
            signer = %token,
            public_key = %signature.public_key,
            sig_len = signature.sign.len(),
            "accepted signature"
        );

        self.accept_signature(digest, token, signature);
        self.refresh_txid()
    }

    /// Collects signatures from several parties concurrently.
    ///
    /// Every signer is checked before any oracle is contacted. The oracle
    /// calls run in parallel against the one cached digest; results are
    /// appended in `signers` order, and only if every call succeeded.
    pub async fn sign_all(&mut self, signers: &[&Identity]) -> Result<()> {
        if signers.is_empty() {
            return Ok(());
        }
        let tokens = signers
            .iter()
            .map(|signer| self.check_signer(signer))
            .collect::<Result<Vec<_>>>()?;

        let digest = self.signing_digest()?;
        let signatures = try_join_all(
            signers
                .iter()
                .map(|signer| signer.oracle().sign(signer.address(), &digest)),
        )
        .await?;
        debug!(count = signatures.len(), "accepted concurrent signatures");

        for (signature, token) in signatures.into_iter().zip(tokens) {
            self.accept_signature(digest.clone(), token, signature);
        }
        self.refresh_txid()
    }
}
