//! # JSON-RPC Wire Definitions
//!
//! Request/response envelopes for talking to a ledger node over JSON-RPC
//! 2.0. Method names carry an `xchain_` prefix so a node can serve them
//! beside unrelated JSON-RPC services.
//!
//! ## Method Index
//!
//! | Method                       | Description                              |
//! |-----------------------------|------------------------------------------|
//! | `xchain_preExec`             | Dry-run contract calls                   |
//! | `xchain_selectUtxo`          | Pick unspent outputs covering an amount  |
//! | `xchain_postTx`              | Submit a signed transaction              |
//! | `xchain_getBalance`          | Balance of an address                    |
//! | `xchain_queryTx`             | Transaction by id                        |
//! | `xchain_getBlock`            | Block by id                              |
//! | `xchain_getBlockByHeight`    | Block by height                          |
//! | `xchain_queryAccountAcl`     | ACL of a contract account                |
//! | `xchain_queryMethodAcl`      | ACL of a contract method                 |
//! | `xchain_getAccountByAK`      | Contract accounts an address belongs to  |
//! | `xchain_queryAccountContracts` | Contracts deployed under an account    |
//! | `xchain_queryAddressContracts` | Contracts of every account of an address |
//! | `xchain_getBalanceDetail`    | Spendable and frozen balance             |
//! | `xchain_getSystemStatus`     | Chain heights and peers of the node      |
//! | `xchain_getBlockChains`      | Chains the node serves                   |

use serde::{Deserialize, Serialize};

use crate::error::Error;

// ---------------------------------------------------------------------------
// RPC Method Enumeration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RpcMethod {
    /// Parameters: `InvocationRequest`
    #[serde(rename = "xchain_preExec")]
    PreExec,
    /// Parameters: `UtxoQuery`
    #[serde(rename = "xchain_selectUtxo")]
    SelectUtxo,
    /// Parameters: `TxStatusEnvelope`
    #[serde(rename = "xchain_postTx")]
    PostTx,
    /// Parameters: `{bcname, address}`
    #[serde(rename = "xchain_getBalance")]
    GetBalance,
    /// Parameters: `{bcname, txid}`
    #[serde(rename = "xchain_queryTx")]
    QueryTx,
    /// Parameters: `{bcname, blockid}`
    #[serde(rename = "xchain_getBlock")]
    GetBlock,
    /// Parameters: `{bcname, height}`
    #[serde(rename = "xchain_getBlockByHeight")]
    GetBlockByHeight,
    /// Parameters: `{bcname, account}`
    #[serde(rename = "xchain_queryAccountAcl")]
    QueryAccountAcl,
    /// Parameters: `{bcname, contract_name, method_name}`
    #[serde(rename = "xchain_queryMethodAcl")]
    QueryMethodAcl,
    /// Parameters: `{bcname, address}`
    #[serde(rename = "xchain_getAccountByAK")]
    QueryAccountsByAddress,
    /// Parameters: `{bcname, account}`
    #[serde(rename = "xchain_queryAccountContracts")]
    QueryAccountContracts,
    /// Parameters: `{bcname, address}`
    #[serde(rename = "xchain_queryAddressContracts")]
    QueryAddressContracts,
    /// Parameters: `{bcname, address}`
    #[serde(rename = "xchain_getBalanceDetail")]
    GetBalanceDetail,
    /// Parameters: none
    #[serde(rename = "xchain_getSystemStatus")]
    GetSystemStatus,
    /// Parameters: none
    #[serde(rename = "xchain_getBlockChains")]
    GetBlockChains,
}

impl RpcMethod {
    /// The on-the-wire method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            RpcMethod::PreExec => "xchain_preExec",
            RpcMethod::SelectUtxo => "xchain_selectUtxo",
            RpcMethod::PostTx => "xchain_postTx",
            RpcMethod::GetBalance => "xchain_getBalance",
            RpcMethod::QueryTx => "xchain_queryTx",
            RpcMethod::GetBlock => "xchain_getBlock",
            RpcMethod::GetBlockByHeight => "xchain_getBlockByHeight",
            RpcMethod::QueryAccountAcl => "xchain_queryAccountAcl",
            RpcMethod::QueryMethodAcl => "xchain_queryMethodAcl",
            RpcMethod::QueryAccountsByAddress => "xchain_getAccountByAK",
            RpcMethod::QueryAccountContracts => "xchain_queryAccountContracts",
            RpcMethod::QueryAddressContracts => "xchain_queryAddressContracts",
            RpcMethod::GetBalanceDetail => "xchain_getBalanceDetail",
            RpcMethod::GetSystemStatus => "xchain_getSystemStatus",
            RpcMethod::GetBlockChains => "xchain_getBlockChains",
        }
    }
}

// ---------------------------------------------------------------------------
// RPC Request / Response
// ---------------------------------------------------------------------------

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Always "2.0".
    pub jsonrpc: String,
    pub id: serde_json::Value,
    pub method: RpcMethod,
    #[serde(default)]
    pub params: serde_json::Value,
}

impl RpcRequest {
    pub fn new(id: serde_json::Value, method: RpcMethod, params: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            method,
            params,
        }
    }
}

/// A JSON-RPC 2.0 response. Exactly one of `result` or `error` is set by
/// a conforming node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub id: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: serde_json::Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

// ---------------------------------------------------------------------------
// RPC Errors
// ---------------------------------------------------------------------------

pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const TX_NOT_FOUND: i64 = -32000;
pub const BLOCK_NOT_FOUND: i64 = -32001;
/// The transaction failed ledger-side verification.
pub const TX_REJECTED: i64 = -32003;
/// The address does not hold enough spendable outputs.
pub const NOT_ENOUGH_UTXO: i64 = -32004;

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcError {
    fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::new(
            METHOD_NOT_FOUND,
            format!("method not found: {}", method.into()),
        )
    }

    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, msg)
    }

    pub fn transaction_not_found(txid: &str) -> Self {
        Self::new(TX_NOT_FOUND, format!("transaction not found: {}", txid))
    }

    pub fn block_not_found(identifier: &str) -> Self {
        Self::new(BLOCK_NOT_FOUND, format!("block not found: {}", identifier))
    }

    /// `reason` is the ledger's error name, e.g. `TX_SIGN_ERROR`.
    pub fn transaction_rejected(reason: impl Into<String>) -> Self {
        Self::new(TX_REJECTED, reason)
    }

    pub fn not_enough_utxo(required: u64, available: u64) -> Self {
        Self {
            code: NOT_ENOUGH_UTXO,
            message: "NOT_ENOUGH_UTXO_ERROR".to_string(),
            data: Some(serde_json::json!({
                "required": required,
                "available": available,
            })),
        }
    }

    /// Maps a node error onto the SDK taxonomy.
    ///
    /// Anything returned for a submission is a rejection of the
    /// transaction. A short-funds error becomes
    /// [`Error::InsufficientFunds`]; the rest are plain ledger errors.
    pub fn into_error(self, method: RpcMethod) -> Error {
        if method == RpcMethod::PostTx {
            return Error::SubmitRejected {
                code: self.code,
                reason: self.message,
            };
        }
        if self.code == NOT_ENOUGH_UTXO {
            let field = |name: &str| {
                self.data
                    .as_ref()
                    .and_then(|d| d.get(name))
                    .and_then(serde_json::Value::as_u64)
                    .unwrap_or(0)
            };
            return Error::InsufficientFunds {
                required: field("required"),
                available: field("available"),
            };
        }
        Error::Ledger {
            code: self.code,
            message: self.message,
        }
    }
}
