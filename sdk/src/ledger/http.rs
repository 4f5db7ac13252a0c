//! JSON-RPC over HTTP transport for [`LedgerRpc`].

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use super::rpc::{RpcMethod, RpcRequest, RpcResponse};
use super::{
    AccountContracts, BalanceDetail, BlockInfo, ContractStatus, InvocationRequest,
    InvokeResponse, LedgerRpc, SystemStatus, TxRecord, TxStatus, TxStatusEnvelope, UtxoQuery,
    UtxoSelection,
};
use crate::acl::Acl;
use crate::codec::{amount_from_bytes, decode_base64, encode_base64};
use crate::config::LedgerConfig;
use crate::error::{Error, Result};
use crate::transaction::SignedTx;

/// A ledger node reached over JSON-RPC.
#[derive(Debug)]
pub struct JsonRpcLedger {
    endpoint: String,
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl JsonRpcLedger {
    /// Builds the HTTP client, trusting `config.ca_cert` when given.
    pub fn new(config: &LedgerConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().timeout(config.timeout());
        if let Some(path) = &config.ca_cert {
            let pem = std::fs::read(path)
                .map_err(|e| Error::Config(format!("reading {}: {}", path.display(), e)))?;
            let cert = reqwest::Certificate::from_pem(&pem)
                .map_err(|e| Error::Config(format!("parsing {}: {}", path.display(), e)))?;
            builder = builder.add_root_certificate(cert);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Config(format!("building ledger HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            client,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call<P: Serialize, R: DeserializeOwned>(
        &self,
        method: RpcMethod,
        params: P,
    ) -> Result<R> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::new(json!(id), method, serde_json::to_value(params)?);
        debug!(method = method.as_str(), id, "ledger rpc");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::TransportFailure(format!("{}: {}", method.as_str(), e)))?;
        let response: RpcResponse = response.json().await.map_err(|e| {
            Error::TransportFailure(format!("{}: bad response body: {}", method.as_str(), e))
        })?;

        if let Some(error) = response.error {
            return Err(error.into_error(method));
        }
        let result = response.result.unwrap_or(serde_json::Value::Null);
        Ok(serde_json::from_value(result)?)
    }
}

#[async_trait]
impl LedgerRpc for JsonRpcLedger {
    async fn pre_exec(&self, request: InvocationRequest) -> Result<InvokeResponse> {
        self.call(RpcMethod::PreExec, request).await
    }

    async fn select_utxo(&self, query: UtxoQuery) -> Result<UtxoSelection> {
        self.call(RpcMethod::SelectUtxo, query).await
    }

    async fn post_tx(&self, bcname: &str, tx: &SignedTx) -> Result<()> {
        let envelope = TxStatusEnvelope {
            bcname: bcname.to_string(),
            status: TxStatus::Unconfirm,
            txid: tx.txid.clone(),
            tx: tx.clone(),
        };
        let _: serde_json::Value = self.call(RpcMethod::PostTx, envelope).await?;
        info!(txid = %hex::encode(&tx.txid), bcname, "posted transaction");
        Ok(())
    }

    async fn get_balance(&self, bcname: &str, address: &str) -> Result<u64> {
        let encoded: String = self
            .call(
                RpcMethod::GetBalance,
                json!({ "bcname": bcname, "address": address }),
            )
            .await?;
        let bytes = decode_base64(&encoded).map_err(|e| Error::Serialization(e.to_string()))?;
        amount_from_bytes(&bytes)
            .ok_or_else(|| Error::Serialization("balance exceeds 64 bits".to_string()))
    }

    async fn query_tx(&self, bcname: &str, txid: &[u8]) -> Result<TxRecord> {
        self.call(
            RpcMethod::QueryTx,
            json!({ "bcname": bcname, "txid": encode_base64(txid) }),
        )
        .await
    }

    async fn get_block(&self, bcname: &str, blockid: &[u8]) -> Result<BlockInfo> {
        self.call(
            RpcMethod::GetBlock,
            json!({ "bcname": bcname, "blockid": encode_base64(blockid) }),
        )
        .await
    }

    async fn get_block_by_height(&self, bcname: &str, height: i64) -> Result<BlockInfo> {
        self.call(
            RpcMethod::GetBlockByHeight,
            json!({ "bcname": bcname, "height": height }),
        )
        .await
    }

    async fn query_account_acl(&self, bcname: &str, account: &str) -> Result<Option<Acl>> {
        self.call(
            RpcMethod::QueryAccountAcl,
            json!({ "bcname": bcname, "account": account }),
        )
        .await
    }

    async fn query_method_acl(
        &self,
        bcname: &str,
        contract: &str,
        method: &str,
    ) -> Result<Option<Acl>> {
        self.call(
            RpcMethod::QueryMethodAcl,
            json!({
                "bcname": bcname,
                "contract_name": contract,
                "method_name": method,
            }),
        )
        .await
    }

    async fn query_accounts_by_address(
        &self,
        bcname: &str,
        address: &str,
    ) -> Result<Vec<String>> {
        self.call(
            RpcMethod::QueryAccountsByAddress,
            json!({ "bcname": bcname, "address": address }),
        )
        .await
    }

    async fn query_account_contracts(
        &self,
        bcname: &str,
        account: &str,
    ) -> Result<Vec<ContractStatus>> {
        self.call(
            RpcMethod::QueryAccountContracts,
            json!({ "bcname": bcname, "account": account }),
        )
        .await
    }

    async fn query_address_contracts(
        &self,
        bcname: &str,
        address: &str,
    ) -> Result<AccountContracts> {
        self.call(
            RpcMethod::QueryAddressContracts,
            json!({ "bcname": bcname, "address": address }),
        )
        .await
    }

    async fn get_balance_detail(
        &self,
        bcname: &str,
        address: &str,
    ) -> Result<Vec<BalanceDetail>> {
        self.call(
            RpcMethod::GetBalanceDetail,
            json!({ "bcname": bcname, "address": address }),
        )
        .await
    }

    async fn get_system_status(&self) -> Result<SystemStatus> {
        self.call(RpcMethod::GetSystemStatus, json!({})).await
    }

    async fn get_blockchains(&self) -> Result<Vec<String>> {
        self.call(RpcMethod::GetBlockChains, json!({})).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_node_is_transport_failure() {
        let config = LedgerConfig {
            // Port 9 (discard) on loopback: nothing listens there in test environments.
            endpoint: "http://127.0.0.1:9".to_string(),
            timeout_ms: 500,
            ..LedgerConfig::default()
        };
        let ledger = JsonRpcLedger::new(&config).unwrap();

        let err = ledger.get_balance("xuper", "alice").await.unwrap_err();
        assert!(matches!(err, Error::TransportFailure(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn missing_ca_bundle_is_config_error() {
        let config = LedgerConfig {
            ca_cert: Some("/no/such/ca.pem".into()),
            ..LedgerConfig::default()
        };
        let err = JsonRpcLedger::new(&config).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
