// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # xchain-sdk: Delegated-Signing Transaction Client
//!
//! Builds XuperChain-style UTXO transactions, collects the signatures their
//! authorization requirements demand, and submits them to a ledger node.
//! No private key ever lives in this process: every signature comes from a
//! remote signing oracle addressed by account address.
//!
//! ## Architecture
//!
//! - **identity**: an oracle-held address, optionally acting for a contract
//!   account. Derives the authorization token signers are matched by.
//! - **oracle**: the signing capability. HTTP transport plus an in-process
//!   double.
//! - **ledger**: node RPC for pre-execution, UTXO selection, submission and
//!   queries. JSON-RPC transport plus an in-process double.
//! - **funding**: turns spendable outputs into inputs and change.
//! - **request** / **proposal**: typed intents and the builder that turns
//!   one into an unsigned transaction.
//! - **transaction**: the body, its digest and id, the signing state
//!   machine.
//! - **client**: the submission pipeline and convenience calls.
//! - **config** / **error**: constants, runtime settings, error taxonomy.
//!
//! ## Flow
//!
//! ```text
//! Request ─► Proposal::build ─► Transaction (Unsigned)
//!                                   │ sign / sign_all
//!                                   ▼
//!                     PartiallySigned ─► FullySigned ─► post ─► Submitted
//! ```

pub mod acl;
pub mod client;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod error;
pub mod funding;
pub mod identity;
pub mod ledger;
pub mod oracle;
pub mod proposal;
pub mod request;
pub mod transaction;

pub use acl::Acl;
pub use client::{Client, ContractArgs};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use identity::{ContractAccount, Identity};
pub use ledger::LedgerRpc;
pub use oracle::SigningOracle;
pub use proposal::{PreExecResult, Proposal};
pub use request::{ContractModule, Request, RequestKind, RequestOptions, Runtime};
pub use transaction::{Transaction, TxState};
