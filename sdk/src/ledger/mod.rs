//! # Ledger RPC
//!
//! The node-facing half of the client: pre-execution, UTXO selection,
//! submission, and read-only queries.
//!
//! ## Architecture
//!
//! ```text
//! mod.rs    : LedgerRpc trait and its request/response payloads
//! rpc.rs    : JSON-RPC 2.0 envelope, method names and error codes
//! http.rs   : JsonRpcLedger: reqwest transport speaking rpc.rs
//! memory.rs : MemoryLedger: in-process ledger double with signature checks
//! ```
//!
//! Callers depend on `Arc<dyn LedgerRpc>`, so the proposal builder and the
//! client facade never know which transport they are talking to.

pub mod http;
pub mod memory;
pub mod rpc;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::acl::Acl;
use crate::codec::{amount_bytes, base64_bytes};
use crate::error::Result;
use crate::transaction::{
    ContractResponse, InvokeRequest, SignedTx, TxInputExt, TxOutputExt, Utxo,
};

pub use http::JsonRpcLedger;
pub use memory::MemoryLedger;

// ---------------------------------------------------------------------------
// Pre-execution
// ---------------------------------------------------------------------------

/// A dry-run of contract calls on behalf of an initiator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationRequest {
    pub bcname: String,
    pub initiator: String,
    #[serde(default)]
    pub auth_require: Vec<String>,
    #[serde(default)]
    pub requests: Vec<InvokeRequest>,
}

/// What pre-execution learned: the read/write sets to embed in the body,
/// the possibly rewritten requests, each call's response, and total gas.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InvokeResponse {
    #[serde(default)]
    pub inputs_ext: Vec<TxInputExt>,
    #[serde(default)]
    pub outputs_ext: Vec<TxOutputExt>,
    #[serde(default)]
    pub requests: Vec<InvokeRequest>,
    #[serde(default)]
    pub responses: Vec<ContractResponse>,
    #[serde(default)]
    pub gas_used: i64,
}

impl InvokeResponse {
    /// The last contract response, which is the one callers care about.
    pub fn last_response(&self) -> Option<&ContractResponse> {
        self.responses.last()
    }
}

// ---------------------------------------------------------------------------
// Funding
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoQuery {
    pub bcname: String,
    pub address: String,
    #[serde(with = "amount_bytes")]
    pub total_amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoSelection {
    #[serde(default)]
    pub utxos: Vec<Utxo>,
    #[serde(with = "amount_bytes")]
    pub total_selected: u64,
}

// ---------------------------------------------------------------------------
// Query results
// ---------------------------------------------------------------------------

/// Ledger-side status of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxStatus {
    Undefine,
    Unconfirm,
    Confirm,
    Noexist,
}

/// The envelope a transaction is posted in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxStatusEnvelope {
    pub bcname: String,
    pub status: TxStatus,
    #[serde(with = "base64_bytes")]
    pub txid: Vec<u8>,
    pub tx: SignedTx,
}

/// A transaction as found on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRecord {
    pub status: TxStatus,
    #[serde(default, with = "base64_bytes")]
    pub blockid: Vec<u8>,
    pub tx: Option<SignedTx>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    #[serde(with = "base64_bytes")]
    pub blockid: Vec<u8>,
    #[serde(default, with = "base64_bytes")]
    pub pre_hash: Vec<u8>,
    pub height: i64,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub transactions: Vec<SignedTx>,
}

/// A contract deployed under a contract account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractStatus {
    pub contract_name: String,
    /// Hex id of the deploying transaction.
    #[serde(default)]
    pub txid: String,
    /// The deploy-time descriptor (`runtime`, `contract_type`).
    #[serde(default, skip_serializing_if = "Vec::is_empty", with = "base64_bytes")]
    pub desc: Vec<u8>,
    #[serde(default)]
    pub is_banned: bool,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub runtime: String,
}

/// Contracts grouped by the contract account that owns them.
pub type AccountContracts = BTreeMap<String, Vec<ContractStatus>>;

/// One slice of an address's balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDetail {
    #[serde(with = "amount_bytes")]
    pub balance: u64,
    #[serde(default)]
    pub is_frozen: bool,
}

/// Height and tip of one chain served by a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainStatus {
    pub bcname: String,
    pub height: i64,
    #[serde(default, with = "base64_bytes")]
    pub tip_blockid: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SystemStatus {
    #[serde(default)]
    pub chains: Vec<ChainStatus>,
    #[serde(default)]
    pub peer_urls: Vec<String>,
}

// ---------------------------------------------------------------------------
// LedgerRpc
// ---------------------------------------------------------------------------

/// Everything the client needs from a ledger node.
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Dry-runs contract calls without committing anything.
    async fn pre_exec(&self, request: InvocationRequest) -> Result<InvokeResponse>;

    /// Picks unspent outputs of `query.address` covering `query.total_amount`.
    async fn select_utxo(&self, query: UtxoQuery) -> Result<UtxoSelection>;

    /// Submits a signed transaction as unconfirmed.
    async fn post_tx(&self, bcname: &str, tx: &SignedTx) -> Result<()>;

    async fn get_balance(&self, bcname: &str, address: &str) -> Result<u64>;

    async fn query_tx(&self, bcname: &str, txid: &[u8]) -> Result<TxRecord>;

    async fn get_block(&self, bcname: &str, blockid: &[u8]) -> Result<BlockInfo>;

    async fn get_block_by_height(&self, bcname: &str, height: i64) -> Result<BlockInfo>;

    /// The ACL of a contract account, if one is set.
    async fn query_account_acl(&self, bcname: &str, account: &str) -> Result<Option<Acl>>;

    /// The ACL guarding one contract method, if one is set.
    async fn query_method_acl(
        &self,
        bcname: &str,
        contract: &str,
        method: &str,
    ) -> Result<Option<Acl>>;

    /// Contract accounts whose ACL names `address`.
    async fn query_accounts_by_address(&self, bcname: &str, address: &str)
        -> Result<Vec<String>>;

    /// Contracts deployed under one contract account.
    async fn query_account_contracts(
        &self,
        bcname: &str,
        account: &str,
    ) -> Result<Vec<ContractStatus>>;

    /// Contracts of every contract account `address` belongs to.
    async fn query_address_contracts(
        &self,
        bcname: &str,
        address: &str,
    ) -> Result<AccountContracts>;

    /// Balance split into spendable and frozen parts.
    async fn get_balance_detail(&self, bcname: &str, address: &str)
        -> Result<Vec<BalanceDetail>>;

    async fn get_system_status(&self) -> Result<SystemStatus>;

    /// Names of the chains the node serves.
    async fn get_blockchains(&self) -> Result<Vec<String>>;
}
