//! The transaction object carried from proposal to submission.
//!
//! A [`Transaction`] owns its body, the two signature lists, the cached
//! digest and the current identifier. Once the digest exists the body is
//! sealed: [`Transaction::body_mut`] refuses with [`Error::BodySealed`], so
//! every party necessarily signs the same bytes.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::authorization::token_satisfies;
use super::digest;
use super::types::{ContractResponse, SignatureInfo, SignedTx, TxBody};
use crate::error::{Error, Result};

/// Where a transaction is in its client-side lifecycle.
///
/// Confirmation and rejection happen on the ledger and are observed by
/// querying it, not tracked here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxState {
    /// Body assembled, no signature accepted yet.
    Unsigned,
    /// Some but not all `auth_require` tokens have a signature.
    PartiallySigned,
    /// Every `auth_require` token has at least one accepted signature.
    FullySigned,
    /// Accepted by the ledger for inclusion.
    Submitted,
}

impl fmt::Display for TxState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TxState::Unsigned => "UNSIGNED",
            TxState::PartiallySigned => "PARTIALLY_SIGNED",
            TxState::FullySigned => "FULLY_SIGNED",
            TxState::Submitted => "SUBMITTED",
        };
        f.write_str(label)
    }
}

/// A proposed transaction and its authorization progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    body: TxBody,
    digest: Option<Vec<u8>>,
    txid: Vec<u8>,
    initiator_signs: Vec<SignatureInfo>,
    auth_require_signs: Vec<SignatureInfo>,
    /// Auth tokens of accepted signers, parallel to `auth_require_signs`.
    signer_tokens: Vec<String>,

    bcname: String,
    fee: u64,
    gas_used: i64,
    contract_response: Option<ContractResponse>,
    submitted: bool,
}

impl Transaction {
    /// Wraps an assembled body for chain `bcname`.
    pub fn new(bcname: impl Into<String>, body: TxBody) -> Self {
        Self {
            body,
            digest: None,
            txid: Vec::new(),
            initiator_signs: Vec::new(),
            auth_require_signs: Vec::new(),
            signer_tokens: Vec::new(),
            bcname: bcname.into(),
            fee: 0,
            gas_used: 0,
            contract_response: None,
            submitted: false,
        }
    }

    /// Re-imports a transaction signed elsewhere.
    ///
    /// Signer identities are not recoverable from signatures, so the
    /// existing signatures are taken to satisfy `auth_require` in order,
    /// which is how the ledger pairs them. The digest is recomputed and
    /// sealed.
    pub fn from_signed(bcname: impl Into<String>, signed: SignedTx) -> Result<Self> {
        let mut tx = Self::new(bcname, signed.body);
        tx.signer_tokens = tx
            .body
            .auth_require
            .iter()
            .take(signed.auth_require_signs.len())
            .cloned()
            .collect();
        tx.initiator_signs = signed.initiator_signs;
        tx.auth_require_signs = signed.auth_require_signs;
        tx.seal_digest()?;
        tx.txid = signed.txid;
        Ok(tx)
    }

    // -- Body ---------------------------------------------------------------

    pub fn body(&self) -> &TxBody {
        &self.body
    }

    /// Mutable access to the body, only while no digest has been computed.
    pub fn body_mut(&mut self) -> Result<&mut TxBody> {
        if self.digest.is_some() {
            return Err(Error::BodySealed);
        }
        Ok(&mut self.body)
    }

    pub fn is_sealed(&self) -> bool {
        self.digest.is_some()
    }

    /// The cached digest, if any party has signed yet.
    pub fn digest(&self) -> Option<&[u8]> {
        self.digest.as_deref()
    }

    /// Computes and caches the digest on first call; returns the cached
    /// value afterwards.
    pub(crate) fn seal_digest(&mut self) -> Result<Vec<u8>> {
        if let Some(digest) = &self.digest {
            return Ok(digest.clone());
        }
        let digest = digest::digest(&self.body)?;
        self.digest = Some(digest.clone());
        Ok(digest)
    }

    /// The digest a signer should sign, without caching a fresh one.
    pub(super) fn signing_digest(&self) -> Result<Vec<u8>> {
        match &self.digest {
            Some(digest) => Ok(digest.clone()),
            None => digest::digest(&self.body),
        }
    }

    /// Appends an accepted signature and seals the digest it was made over.
    pub(super) fn accept_signature(
        &mut self,
        digest: Vec<u8>,
        token: String,
        signature: SignatureInfo,
    ) {
        if self.digest.is_none() {
            self.digest = Some(digest);
        }
        self.auth_require_signs.push(signature.clone());
        self.initiator_signs.push(signature);
        self.signer_tokens.push(token);
    }

    // -- Signatures & identifier -------------------------------------------

    /// Current identifier. Empty until the first signature is accepted.
    pub fn txid(&self) -> &[u8] {
        &self.txid
    }

    pub fn txid_hex(&self) -> String {
        hex::encode(&self.txid)
    }

    pub fn initiator_signs(&self) -> &[SignatureInfo] {
        &self.initiator_signs
    }

    pub fn auth_require_signs(&self) -> &[SignatureInfo] {
        &self.auth_require_signs
    }

    /// Tokens of the signers accepted so far, in acceptance order.
    pub fn signer_tokens(&self) -> &[String] {
        &self.signer_tokens
    }

    pub(super) fn refresh_txid(&mut self) -> Result<()> {
        self.txid = digest::transaction_id(
            &self.body,
            &self.initiator_signs,
            &self.auth_require_signs,
        )?;
        Ok(())
    }

    /// `auth_require` tokens that no accepted signer satisfies yet.
    pub fn missing_signers(&self) -> Vec<&str> {
        self.body
            .auth_require
            .iter()
            .filter(|required| {
                !self
                    .signer_tokens
                    .iter()
                    .any(|signer| token_satisfies(required, signer))
            })
            .map(String::as_str)
            .collect()
    }

    pub fn state(&self) -> TxState {
        if self.submitted {
            TxState::Submitted
        } else if self.missing_signers().is_empty() {
            TxState::FullySigned
        } else if self.auth_require_signs.is_empty() {
            TxState::Unsigned
        } else {
            TxState::PartiallySigned
        }
    }

    pub fn is_fully_signed(&self) -> bool {
        matches!(self.state(), TxState::FullySigned | TxState::Submitted)
    }

    pub(crate) fn mark_submitted(&mut self) {
        self.submitted = true;
    }

    // -- Metadata ----------------------------------------------------------

    pub fn bcname(&self) -> &str {
        &self.bcname
    }

    /// Fee paid to the fee sink by this transaction.
    pub fn fee(&self) -> u64 {
        self.fee
    }

    /// Gas reported by pre-execution.
    pub fn gas_used(&self) -> i64 {
        self.gas_used
    }

    /// The last contract response from pre-execution, if any.
    pub fn contract_response(&self) -> Option<&ContractResponse> {
        self.contract_response.as_ref()
    }

    pub(crate) fn set_execution(
        &mut self,
        fee: u64,
        gas_used: i64,
        contract_response: Option<ContractResponse>,
    ) {
        self.fee = fee;
        self.gas_used = gas_used;
        self.contract_response = contract_response;
    }

    /// The wire form posted to the ledger.
    pub fn to_signed(&self) -> SignedTx {
        SignedTx {
            txid: self.txid.clone(),
            body: self.body.clone(),
            initiator_signs: self.initiator_signs.clone(),
            auth_require_signs: self.auth_require_signs.clone(),
        }
    }
}
