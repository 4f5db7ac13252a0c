//! Wire-level building blocks of a transaction body.
//!
//! Field names and encodings follow the ledger's JSON form: bytes are
//! base64, amounts are base64 big-endian, and empty/zero fields are
//! omitted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::codec::{
    amount_bytes, base64_bytes, base64_map, is_false, is_zero_i32, is_zero_i64, is_zero_u64,
};

// ---------------------------------------------------------------------------
// UTXO inputs and outputs
// ---------------------------------------------------------------------------

/// A spent reference to an earlier transaction output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    #[serde(default, skip_serializing_if = "Vec::is_empty", with = "base64_bytes")]
    pub ref_txid: Vec<u8>,
    #[serde(default, skip_serializing_if = "is_zero_i32")]
    pub ref_offset: i32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub from_addr: String,
    #[serde(default, skip_serializing_if = "is_zero_u64", with = "amount_bytes")]
    pub amount: u64,
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub frozen_height: i64,
}

/// A newly created output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    #[serde(default, skip_serializing_if = "is_zero_u64", with = "amount_bytes")]
    pub amount: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub to_addr: String,
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub frozen_height: i64,
}

impl TxOutput {
    pub fn new(to_addr: impl Into<String>, amount: u64) -> Self {
        Self {
            amount,
            to_addr: to_addr.into(),
            frozen_height: 0,
        }
    }
}

/// An unspent output offered by the ledger as a funding candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    #[serde(with = "base64_bytes")]
    pub ref_txid: Vec<u8>,
    #[serde(default)]
    pub ref_offset: i32,
    pub to_addr: String,
    #[serde(with = "amount_bytes")]
    pub amount: u64,
}

impl Utxo {
    /// Converts the UTXO into a spending input.
    pub fn to_input(&self) -> TxInput {
        TxInput {
            ref_txid: self.ref_txid.clone(),
            ref_offset: self.ref_offset,
            from_addr: self.to_addr.clone(),
            amount: self.amount,
            frozen_height: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Contract read/write sets
// ---------------------------------------------------------------------------

/// A contract state read recorded during pre-execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInputExt {
    pub bucket: String,
    #[serde(default, with = "base64_bytes")]
    pub key: Vec<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", with = "base64_bytes")]
    pub ref_txid: Vec<u8>,
    #[serde(default, skip_serializing_if = "is_zero_i32")]
    pub ref_offset: i32,
}

/// A contract state write recorded during pre-execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutputExt {
    pub bucket: String,
    #[serde(default, with = "base64_bytes")]
    pub key: Vec<u8>,
    #[serde(default, with = "base64_bytes")]
    pub value: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Contract invocation
// ---------------------------------------------------------------------------

/// Resource classes metered by the contract VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceType {
    Cpu,
    Memory,
    Disk,
    XfeeCount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimit {
    #[serde(rename = "type")]
    pub kind: ResourceType,
    pub limit: i64,
}

/// The contract invocation descriptor carried in a transaction body.
///
/// Deploy, upgrade, invoke, query and ACL changes all reduce to one or
/// more of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokeRequest {
    pub module_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub contract_name: String,
    pub method_name: String,
    #[serde(default, with = "base64_map")]
    pub args: BTreeMap<String, Vec<u8>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource_limits: Vec<ResourceLimit>,
    /// Amount transferred to the contract, as a decimal string.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub amount: String,
}

impl InvokeRequest {
    pub fn new(module: &str, contract: &str, method: &str) -> Self {
        Self {
            module_name: module.to_string(),
            contract_name: contract.to_string(),
            method_name: method.to_string(),
            args: BTreeMap::new(),
            resource_limits: Vec::new(),
            amount: String::new(),
        }
    }

    pub fn arg(mut self, key: &str, value: impl Into<Vec<u8>>) -> Self {
        self.args.insert(key.to_string(), value.into());
        self
    }
}

/// A contract's reply to one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContractResponse {
    pub status: i32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default, with = "base64_bytes")]
    pub body: Vec<u8>,
}

impl ContractResponse {
    /// Contract calls report success with a status below 400.
    pub fn is_ok(&self) -> bool {
        self.status < 400
    }
}

// ---------------------------------------------------------------------------
// Signatures
// ---------------------------------------------------------------------------

/// A `(public key, signature)` pair returned by the signing oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureInfo {
    #[serde(rename = "PublicKey")]
    pub public_key: String,
    #[serde(rename = "Sign", with = "base64_bytes")]
    pub sign: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Body
// ---------------------------------------------------------------------------

/// Every field that affects a transaction's economic or authorization
/// meaning. Signature lists live on [`super::Transaction`], outside the body.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TxBody {
    #[serde(rename = "tx_inputs", default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<TxInput>,
    #[serde(rename = "tx_outputs", default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<TxOutput>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", with = "base64_bytes")]
    pub desc: Vec<u8>,
    #[serde(default)]
    pub nonce: String,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub version: i32,
    #[serde(rename = "tx_inputs_ext", default, skip_serializing_if = "Vec::is_empty")]
    pub inputs_ext: Vec<TxInputExt>,
    #[serde(rename = "tx_outputs_ext", default, skip_serializing_if = "Vec::is_empty")]
    pub outputs_ext: Vec<TxOutputExt>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contract_requests: Vec<InvokeRequest>,
    #[serde(default)]
    pub initiator: String,
    #[serde(default)]
    pub auth_require: Vec<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub coinbase: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub autogen: bool,
}

impl TxBody {
    /// Sum of all input amounts.
    pub fn total_input(&self) -> u64 {
        self.inputs.iter().map(|i| i.amount).sum()
    }

    /// Sum of all output amounts.
    pub fn total_output(&self) -> u64 {
        self.outputs.iter().map(|o| o.amount).sum()
    }
}

/// A signed transaction in the form the ledger accepts and returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTx {
    #[serde(with = "base64_bytes")]
    pub txid: Vec<u8>,
    #[serde(flatten)]
    pub body: TxBody,
    #[serde(default)]
    pub initiator_signs: Vec<SignatureInfo>,
    #[serde(default)]
    pub auth_require_signs: Vec<SignatureInfo>,
}
