//! # Transaction Module
//!
//! Body layout, canonical hashing, and the multi-party authorization state
//! machine for ledger transactions.
//!
//! ## Architecture
//!
//! ```text
//! types.rs        : Wire types: inputs/outputs, contract read/write sets, invoke requests
//! digest.rs       : Canonical encoding, digest and transaction id
//! lifecycle.rs    : Transaction: sealed body, signature lists, TxState
//! authorization.rs: sign / sign_all and auth_require token matching
//! ```
//!
//! ## Transaction Lifecycle
//!
//! 1. **Propose**: [`crate::proposal::Proposal`] assembles an unsigned body.
//! 2. **Sign**: each required party calls [`Transaction::sign`]; the first
//!    accepted signature seals the body and its digest.
//! 3. **Identify**: the id is recomputed over body plus signatures after
//!    every accepted signature.
//! 4. **Post**: [`crate::client::Client::post_tx`] submits the signed form.
//!
//! ## Design Decisions
//!
//! - Both the digest and the id are `double_sha256` over a line-oriented
//!   JSON encoding in the ledger's field order. The digest excludes the
//!   signature lists; the id includes them.
//! - Every accepted signer is recorded in both `auth_require_signs` and
//!   `initiator_signs`, since the ledger checks the two lists against
//!   `auth_require` and `initiator` by key.

pub mod authorization;
pub mod digest;
pub mod lifecycle;
pub mod types;

pub use authorization::{is_authorized, token_satisfies};
pub use digest::{digest, transaction_id};
pub use lifecycle::{Transaction, TxState};
pub use types::{
    ContractResponse, InvokeRequest, ResourceLimit, ResourceType, SignatureInfo, SignedTx,
    TxBody, TxInput, TxInputExt, TxOutput, TxOutputExt, Utxo,
};
