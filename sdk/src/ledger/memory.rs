//! In-process ledger double.
//!
//! [`MemoryLedger`] keeps a UTXO set, contract account ACLs and a chain of
//! single-transaction blocks behind one lock. Submissions are verified the
//! way a node would before they are applied:
//!
//! 1. the id matches the body and signature lists,
//! 2. `auth_require_signs` pairs with `auth_require` by position, each
//!    signature valid over the digest and made by the required address,
//! 3. the initiator signed,
//! 4. every input is unspent, and inputs balance outputs.
//!
//! System contract calls (`NewAccount`, `SetAccountAcl`, `SetMethodAcl`,
//! `Deploy`) take effect when their transaction is applied. Outputs with a
//! `frozen_height` stay out of UTXO selection until the chain grows past
//! that height.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use super::rpc::{RpcError, RpcMethod, TX_NOT_FOUND};
use super::{
    AccountContracts, BalanceDetail, BlockInfo, ChainStatus, ContractStatus, InvocationRequest,
    InvokeResponse, LedgerRpc, SystemStatus, TxRecord, TxStatus, UtxoQuery, UtxoSelection,
};
use crate::acl::Acl;
use crate::config::{
    AUTH_TOKEN_SEPARATOR, CONTRACT_ACCOUNT_PREFIX, DEPLOY_METHOD, FEE_ADDRESS, NEW_ACCOUNT_METHOD,
    SET_ACCOUNT_ACL_METHOD, SET_METHOD_ACL_METHOD, XKERNEL_MODULE,
};
use crate::crypto::{address_from_public_key, sha256, verify_signature};
use crate::error::{Error, Result};
use crate::funding::{select_from_candidates, InputSelectionStrategy};
use crate::transaction::{digest, transaction_id, ContractResponse, SignedTx, TxBody, Utxo};

type PreExecHandler = Box<dyn Fn(&InvocationRequest) -> Result<InvokeResponse> + Send + Sync>;

#[derive(Default)]
struct LedgerState {
    utxos: Vec<Utxo>,
    account_acls: BTreeMap<String, Acl>,
    method_acls: BTreeMap<(String, String), Acl>,
    contracts: AccountContracts,
    /// Outputs locked until the chain height exceeds the paired height.
    frozen: Vec<(i64, Utxo)>,
    txs: HashMap<Vec<u8>, TxRecord>,
    blocks: Vec<BlockInfo>,
    calls: HashMap<&'static str, usize>,
    funding_nonce: u64,
}

/// An in-memory ledger for tests and offline tooling.
pub struct MemoryLedger {
    bcname: String,
    strategy: InputSelectionStrategy,
    gas_per_request: Mutex<i64>,
    pre_exec_handler: Mutex<Option<PreExecHandler>>,
    state: Mutex<LedgerState>,
}

impl MemoryLedger {
    /// An empty chain named `bcname` with a genesis block.
    pub fn new(bcname: impl Into<String>) -> Self {
        let mut state = LedgerState::default();
        state.blocks.push(BlockInfo {
            blockid: sha256(b"genesis"),
            pre_hash: Vec::new(),
            height: 0,
            timestamp: 0,
            transactions: Vec::new(),
        });
        Self {
            bcname: bcname.into(),
            strategy: InputSelectionStrategy::default(),
            gas_per_request: Mutex::new(0),
            pre_exec_handler: Mutex::new(None),
            state: Mutex::new(state),
        }
    }

    pub fn with_strategy(mut self, strategy: InputSelectionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn bcname(&self) -> &str {
        &self.bcname
    }

    // -- Seeding -------------------------------------------------------------

    /// Credits `address` with a fresh unspent output.
    pub fn fund(&self, address: &str, amount: u64) -> Utxo {
        let mut state = self.state.lock();
        state.funding_nonce += 1;
        let utxo = Utxo {
            ref_txid: sha256(format!("fund:{}:{}", address, state.funding_nonce).as_bytes()),
            ref_offset: 0,
            to_addr: address.to_string(),
            amount,
        };
        state.utxos.push(utxo.clone());
        utxo
    }

    /// Credits `address` with an output that stays frozen until the chain
    /// height exceeds `frozen_height`.
    pub fn fund_frozen(&self, address: &str, amount: u64, frozen_height: i64) -> Utxo {
        let mut state = self.state.lock();
        state.funding_nonce += 1;
        let utxo = Utxo {
            ref_txid: sha256(format!("frozen:{}:{}", address, state.funding_nonce).as_bytes()),
            ref_offset: 0,
            to_addr: address.to_string(),
            amount,
        };
        state.frozen.push((frozen_height, utxo.clone()));
        utxo
    }

    pub fn set_account_acl(&self, account: &str, acl: Acl) {
        self.state
            .lock()
            .account_acls
            .insert(account.to_string(), acl);
    }

    pub fn set_method_acl(&self, contract: &str, method: &str, acl: Acl) {
        self.state
            .lock()
            .method_acls
            .insert((contract.to_string(), method.to_string()), acl);
    }

    /// Gas the default pre-execution handler charges per contract call.
    pub fn set_gas_per_request(&self, gas: i64) {
        *self.gas_per_request.lock() = gas;
    }

    /// Replaces the default pre-execution behaviour.
    pub fn set_pre_exec_handler<F>(&self, handler: F)
    where
        F: Fn(&InvocationRequest) -> Result<InvokeResponse> + Send + Sync + 'static,
    {
        *self.pre_exec_handler.lock() = Some(Box::new(handler));
    }

    // -- Inspection ----------------------------------------------------------

    /// Sum of unspent outputs owned by `address`.
    pub fn balance(&self, address: &str) -> u64 {
        self.state
            .lock()
            .utxos
            .iter()
            .filter(|u| u.to_addr == address)
            .map(|u| u.amount)
            .sum()
    }

    /// Every accepted transaction, in order.
    pub fn posted(&self) -> Vec<SignedTx> {
        self.state
            .lock()
            .blocks
            .iter()
            .flat_map(|b| b.transactions.iter().cloned())
            .collect()
    }

    /// Current chain height; genesis is height 0.
    pub fn height(&self) -> i64 {
        self.state.lock().blocks.len() as i64 - 1
    }

    pub fn account_acl(&self, account: &str) -> Option<Acl> {
        self.state.lock().account_acls.get(account).cloned()
    }

    /// Number of calls made to a trait method, by method name.
    pub fn call_count(&self, method: &str) -> usize {
        self.state.lock().calls.get(method).copied().unwrap_or(0)
    }

    fn record_call(&self, method: &'static str) {
        *self.state.lock().calls.entry(method).or_insert(0) += 1;
    }

    fn default_pre_exec(&self, request: &InvocationRequest) -> InvokeResponse {
        let gas = *self.gas_per_request.lock();
        InvokeResponse {
            inputs_ext: Vec::new(),
            outputs_ext: Vec::new(),
            requests: request.requests.clone(),
            responses: request
                .requests
                .iter()
                .map(|r| ContractResponse {
                    status: 200,
                    message: "ok".to_string(),
                    body: r.method_name.as_bytes().to_vec(),
                })
                .collect(),
            gas_used: gas * request.requests.len() as i64,
        }
    }

    fn full_account_name(&self, numeric: &str) -> String {
        format!("{}{}@{}", CONTRACT_ACCOUNT_PREFIX, numeric, self.bcname)
    }
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

fn reject(reason: &str) -> Error {
    RpcError::transaction_rejected(reason).into_error(RpcMethod::PostTx)
}

/// The address behind a hex public key.
fn signer_address(public_key_hex: &str) -> Option<String> {
    let bytes = hex::decode(public_key_hex).ok()?;
    let key = <[u8; 32]>::try_from(bytes.as_slice()).ok()?;
    Some(address_from_public_key(&key))
}

/// The address segment of an auth token.
fn token_address(token: &str) -> &str {
    token.rsplit(AUTH_TOKEN_SEPARATOR).next().unwrap_or(token)
}

/// The contract account segment of an auth token, if any.
fn token_account(token: &str) -> Option<&str> {
    token.rsplit_once(AUTH_TOKEN_SEPARATOR).map(|(account, _)| account)
}

fn verify_signatures(tx: &SignedTx) -> Result<()> {
    let expected_id = transaction_id(&tx.body, &tx.initiator_signs, &tx.auth_require_signs)?;
    if expected_id != tx.txid {
        return Err(reject("TX_ID_MISMATCH"));
    }

    let digest = digest(&tx.body)?;
    if tx.auth_require_signs.len() < tx.body.auth_require.len() {
        return Err(reject("TX_SIGN_ERROR: missing auth_require signatures"));
    }
    for (required, signature) in tx.body.auth_require.iter().zip(&tx.auth_require_signs) {
        let signed_by = signer_address(&signature.public_key);
        if signed_by.as_deref() != Some(token_address(required)) {
            return Err(reject("TX_SIGN_ERROR: auth_require signature out of order"));
        }
        if !verify_signature(&signature.public_key, &digest, &signature.sign) {
            return Err(reject("TX_SIGN_ERROR: bad auth_require signature"));
        }
    }

    let initiator_signed = tx.initiator_signs.iter().any(|signature| {
        signer_address(&signature.public_key).as_deref() == Some(tx.body.initiator.as_str())
            && verify_signature(&signature.public_key, &digest, &signature.sign)
    });
    if !initiator_signed {
        return Err(reject("TX_SIGN_ERROR: initiator signature missing"));
    }
    Ok(())
}

/// Whether `owner`'s outputs may be spent by this body.
fn may_spend(body: &TxBody, owner: &str) -> bool {
    owner == body.initiator
        || body
            .auth_require
            .iter()
            .any(|token| token_account(token) == Some(owner) || token == owner)
}

/// The `runtime` recorded in a deploy descriptor.
fn descriptor_runtime(desc: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(desc)
        .ok()
        .and_then(|v| v.get("runtime").and_then(|r| r.as_str()).map(str::to_string))
        .unwrap_or_default()
}

impl LedgerState {
    fn apply_system_calls(&mut self, ledger: &MemoryLedger, tx: &SignedTx) -> Result<()> {
        for request in &tx.body.contract_requests {
            if request.module_name != XKERNEL_MODULE {
                continue;
            }
            let arg = |name: &str| -> Result<String> {
                request
                    .args
                    .get(name)
                    .map(|v| String::from_utf8_lossy(v).into_owned())
                    .ok_or_else(|| reject(&format!("missing system call argument {}", name)))
            };
            match request.method_name.as_str() {
                NEW_ACCOUNT_METHOD => {
                    let account = ledger.full_account_name(&arg("account_name")?);
                    if self.account_acls.contains_key(&account) {
                        return Err(reject("ACCOUNT_EXISTS"));
                    }
                    let acl: Acl = serde_json::from_str(&arg("acl")?)?;
                    self.account_acls.insert(account, acl);
                }
                SET_ACCOUNT_ACL_METHOD => {
                    let account = arg("account_name")?;
                    let acl: Acl = serde_json::from_str(&arg("acl")?)?;
                    self.account_acls.insert(account, acl);
                }
                SET_METHOD_ACL_METHOD => {
                    let key = (arg("contract_name")?, arg("method_name")?);
                    let acl: Acl = serde_json::from_str(&arg("acl")?)?;
                    self.method_acls.insert(key, acl);
                }
                DEPLOY_METHOD => {
                    let account = arg("account_name")?;
                    let name = arg("contract_name")?;
                    if !self.account_acls.contains_key(&account) {
                        return Err(reject("ACCOUNT_NOT_EXIST"));
                    }
                    if self.contracts.values().flatten().any(|c| c.contract_name == name) {
                        return Err(reject("CONTRACT_EXISTS"));
                    }
                    let desc = request.args.get("contract_desc").cloned().unwrap_or_default();
                    self.contracts.entry(account).or_default().push(ContractStatus {
                        contract_name: name,
                        txid: hex::encode(&tx.txid),
                        runtime: descriptor_runtime(&desc),
                        desc,
                        is_banned: false,
                        timestamp: tx.body.timestamp,
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn apply(&mut self, ledger: &MemoryLedger, tx: &SignedTx) -> Result<()> {
        if self.txs.contains_key(&tx.txid) {
            return Err(reject("TX_DUPLICATE"));
        }

        let mut spent = Vec::with_capacity(tx.body.inputs.len());
        for input in &tx.body.inputs {
            let position = self
                .utxos
                .iter()
                .position(|u| u.ref_txid == input.ref_txid && u.ref_offset == input.ref_offset)
                .ok_or_else(|| reject("UTXOVM_NOT_FOUND"))?;
            let utxo = &self.utxos[position];
            if utxo.amount != input.amount || utxo.to_addr != input.from_addr {
                return Err(reject("UTXOVM_INPUT_MISMATCH"));
            }
            if !may_spend(&tx.body, &utxo.to_addr) {
                return Err(reject("TX_SIGN_ERROR: input owner did not authorize"));
            }
            spent.push(position);
        }
        if tx.body.total_input() != tx.body.total_output() {
            return Err(reject("TX_BALANCE_ERROR"));
        }

        self.apply_system_calls(ledger, tx)?;

        spent.sort_unstable_by(|a, b| b.cmp(a));
        for position in spent {
            self.utxos.remove(position);
        }
        for (offset, output) in tx.body.outputs.iter().enumerate() {
            if output.to_addr == FEE_ADDRESS || output.amount == 0 {
                continue;
            }
            let utxo = Utxo {
                ref_txid: tx.txid.clone(),
                ref_offset: offset as i32,
                to_addr: output.to_addr.clone(),
                amount: output.amount,
            };
            if output.frozen_height > 0 {
                self.frozen.push((output.frozen_height, utxo));
            } else {
                self.utxos.push(utxo);
            }
        }

        let previous = self.blocks.last().map(|b| b.blockid.clone()).unwrap_or_default();
        let height = self.blocks.len() as i64;
        let mut seed = previous.clone();
        seed.extend_from_slice(&tx.txid);
        let blockid = sha256(&seed);
        self.blocks.push(BlockInfo {
            blockid: blockid.clone(),
            pre_hash: previous,
            height,
            timestamp: tx.body.timestamp,
            transactions: vec![tx.clone()],
        });
        self.thaw(height);
        self.txs.insert(
            tx.txid.clone(),
            TxRecord {
                status: TxStatus::Confirm,
                blockid,
                tx: Some(tx.clone()),
            },
        );
        Ok(())
    }

    /// Releases frozen outputs whose height the chain has passed.
    fn thaw(&mut self, height: i64) {
        let (ready, still): (Vec<_>, Vec<_>) =
            self.frozen.drain(..).partition(|(until, _)| height > *until);
        self.frozen = still;
        self.utxos.extend(ready.into_iter().map(|(_, utxo)| utxo));
    }
}

// ---------------------------------------------------------------------------
// LedgerRpc
// ---------------------------------------------------------------------------

#[async_trait]
impl LedgerRpc for MemoryLedger {
    async fn pre_exec(&self, request: InvocationRequest) -> Result<InvokeResponse> {
        self.record_call("pre_exec");
        let handler = self.pre_exec_handler.lock();
        match handler.as_ref() {
            Some(handler) => handler(&request),
            None => Ok(self.default_pre_exec(&request)),
        }
    }

    async fn select_utxo(&self, query: UtxoQuery) -> Result<UtxoSelection> {
        self.record_call("select_utxo");
        let candidates: Vec<Utxo> = self
            .state
            .lock()
            .utxos
            .iter()
            .filter(|u| u.to_addr == query.address)
            .cloned()
            .collect();
        let utxos = select_from_candidates(candidates, query.total_amount, self.strategy)?;
        let total_selected = utxos.iter().map(|u| u.amount).sum();
        Ok(UtxoSelection {
            utxos,
            total_selected,
        })
    }

    async fn post_tx(&self, bcname: &str, tx: &SignedTx) -> Result<()> {
        self.record_call("post_tx");
        if bcname != self.bcname {
            return Err(reject("BLOCKCHAIN_NOT_EXIST"));
        }
        verify_signatures(tx)?;
        self.state.lock().apply(self, tx)?;
        debug!(txid = %hex::encode(&tx.txid), "memory ledger applied transaction");
        Ok(())
    }

    async fn get_balance(&self, _bcname: &str, address: &str) -> Result<u64> {
        self.record_call("get_balance");
        Ok(self.balance(address))
    }

    async fn query_tx(&self, _bcname: &str, txid: &[u8]) -> Result<TxRecord> {
        self.record_call("query_tx");
        self.state
            .lock()
            .txs
            .get(txid)
            .cloned()
            .ok_or_else(|| Error::Ledger {
                code: TX_NOT_FOUND,
                message: format!("transaction not found: {}", hex::encode(txid)),
            })
    }

    async fn get_block(&self, _bcname: &str, blockid: &[u8]) -> Result<BlockInfo> {
        self.record_call("get_block");
        self.state
            .lock()
            .blocks
            .iter()
            .find(|b| b.blockid == blockid)
            .cloned()
            .ok_or_else(|| {
                RpcError::block_not_found(&hex::encode(blockid)).into_error(RpcMethod::GetBlock)
            })
    }

    async fn get_block_by_height(&self, _bcname: &str, height: i64) -> Result<BlockInfo> {
        self.record_call("get_block_by_height");
        let state = self.state.lock();
        usize::try_from(height)
            .ok()
            .and_then(|h| state.blocks.get(h))
            .cloned()
            .ok_or_else(|| {
                RpcError::block_not_found(&height.to_string())
                    .into_error(RpcMethod::GetBlockByHeight)
            })
    }

    async fn query_account_acl(&self, _bcname: &str, account: &str) -> Result<Option<Acl>> {
        self.record_call("query_account_acl");
        Ok(self.account_acl(account))
    }

    async fn query_method_acl(
        &self,
        _bcname: &str,
        contract: &str,
        method: &str,
    ) -> Result<Option<Acl>> {
        self.record_call("query_method_acl");
        Ok(self
            .state
            .lock()
            .method_acls
            .get(&(contract.to_string(), method.to_string()))
            .cloned())
    }

    async fn query_accounts_by_address(
        &self,
        _bcname: &str,
        address: &str,
    ) -> Result<Vec<String>> {
        self.record_call("query_accounts_by_address");
        Ok(self
            .state
            .lock()
            .account_acls
            .iter()
            .filter(|(_, acl)| acl.aks_weight.contains_key(address))
            .map(|(account, _)| account.clone())
            .collect())
    }

    async fn query_account_contracts(
        &self,
        _bcname: &str,
        account: &str,
    ) -> Result<Vec<ContractStatus>> {
        self.record_call("query_account_contracts");
        Ok(self
            .state
            .lock()
            .contracts
            .get(account)
            .cloned()
            .unwrap_or_default())
    }

    async fn query_address_contracts(
        &self,
        _bcname: &str,
        address: &str,
    ) -> Result<AccountContracts> {
        self.record_call("query_address_contracts");
        let state = self.state.lock();
        Ok(state
            .account_acls
            .iter()
            .filter(|(_, acl)| acl.aks_weight.contains_key(address))
            .filter_map(|(account, _)| {
                state
                    .contracts
                    .get(account)
                    .map(|contracts| (account.clone(), contracts.clone()))
            })
            .collect())
    }

    async fn get_balance_detail(
        &self,
        _bcname: &str,
        address: &str,
    ) -> Result<Vec<BalanceDetail>> {
        self.record_call("get_balance_detail");
        let frozen = self
            .state
            .lock()
            .frozen
            .iter()
            .filter(|(_, u)| u.to_addr == address)
            .map(|(_, u)| u.amount)
            .sum();
        Ok(vec![
            BalanceDetail {
                balance: self.balance(address),
                is_frozen: false,
            },
            BalanceDetail {
                balance: frozen,
                is_frozen: true,
            },
        ])
    }

    async fn get_system_status(&self) -> Result<SystemStatus> {
        self.record_call("get_system_status");
        let state = self.state.lock();
        Ok(SystemStatus {
            chains: vec![ChainStatus {
                bcname: self.bcname.clone(),
                height: state.blocks.len() as i64 - 1,
                tip_blockid: state
                    .blocks
                    .last()
                    .map(|b| b.blockid.clone())
                    .unwrap_or_default(),
            }],
            peer_urls: Vec::new(),
        })
    }

    async fn get_blockchains(&self) -> Result<Vec<String>> {
        self.record_call("get_blockchains");
        Ok(vec![self.bcname.clone()])
    }
}

impl std::fmt::Debug for MemoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryLedger")
            .field("bcname", &self.bcname)
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}

/// Request helper used by tests elsewhere in the crate to fake contract
/// read sets.
#[cfg(test)]
pub(crate) fn echo_with_reads(request: &InvocationRequest, gas: i64) -> InvokeResponse {
    use crate::transaction::{InvokeRequest, TxInputExt};

    InvokeResponse {
        inputs_ext: request
            .requests
            .iter()
            .map(|r: &InvokeRequest| TxInputExt {
                bucket: r.contract_name.clone(),
                key: r.method_name.as_bytes().to_vec(),
                ref_txid: Vec::new(),
                ref_offset: 0,
            })
            .collect(),
        outputs_ext: Vec::new(),
        requests: request.requests.clone(),
        responses: vec![ContractResponse {
            status: 200,
            message: "ok".to_string(),
            body: b"result".to_vec(),
        }],
        gas_used: gas,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::InvokeRequest;

    #[tokio::test]
    async fn funding_and_balance() {
        let ledger = MemoryLedger::new("xuper");
        ledger.fund("alice", 30);
        ledger.fund("alice", 70);
        assert_eq!(ledger.get_balance("xuper", "alice").await.unwrap(), 100);
        assert_eq!(ledger.call_count("get_balance"), 1);
    }

    #[tokio::test]
    async fn select_utxo_reports_shortfall() {
        let ledger = MemoryLedger::new("xuper");
        ledger.fund("alice", 30);
        let err = ledger
            .select_utxo(UtxoQuery {
                bcname: "xuper".into(),
                address: "alice".into(),
                total_amount: 31,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientFunds {
                required: 31,
                available: 30
            }
        ));
    }

    #[tokio::test]
    async fn default_pre_exec_echoes_requests() {
        let ledger = MemoryLedger::new("xuper");
        ledger.set_gas_per_request(7);
        let response = ledger
            .pre_exec(InvocationRequest {
                bcname: "xuper".into(),
                initiator: "alice".into(),
                auth_require: vec!["alice".into()],
                requests: vec![InvokeRequest::new("wasm", "counter", "increase")],
            })
            .await
            .unwrap();
        assert_eq!(response.gas_used, 7);
        assert_eq!(response.last_response().unwrap().body, b"increase");
    }

    #[tokio::test]
    async fn custom_pre_exec_handler_wins() {
        let ledger = MemoryLedger::new("xuper");
        ledger.set_pre_exec_handler(|req| Ok(echo_with_reads(req, 99)));
        let response = ledger
            .pre_exec(InvocationRequest {
                bcname: "xuper".into(),
                initiator: "alice".into(),
                auth_require: vec![],
                requests: vec![InvokeRequest::new("wasm", "counter", "get")],
            })
            .await
            .unwrap();
        assert_eq!(response.gas_used, 99);
        assert_eq!(response.inputs_ext.len(), 1);
    }

    #[tokio::test]
    async fn unsigned_transaction_is_rejected() {
        let ledger = MemoryLedger::new("xuper");
        let body = TxBody {
            initiator: "alice".into(),
            auth_require: vec!["alice".into()],
            ..TxBody::default()
        };
        let tx = SignedTx {
            txid: transaction_id(&body, &[], &[]).unwrap(),
            body,
            initiator_signs: vec![],
            auth_require_signs: vec![],
        };
        let err = ledger.post_tx("xuper", &tx).await.unwrap_err();
        assert!(matches!(err, Error::SubmitRejected { .. }));
        assert!(ledger.posted().is_empty());
    }

    #[tokio::test]
    async fn tampered_txid_is_rejected() {
        let ledger = MemoryLedger::new("xuper");
        let tx = SignedTx {
            txid: vec![0; 32],
            body: TxBody::default(),
            initiator_signs: vec![],
            auth_require_signs: vec![],
        };
        let err = ledger.post_tx("xuper", &tx).await.unwrap_err();
        match err {
            Error::SubmitRejected { reason, .. } => assert_eq!(reason, "TX_ID_MISMATCH"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn blocks_and_accounts_are_queryable() {
        let ledger = MemoryLedger::new("xuper");
        let genesis = ledger.get_block_by_height("xuper", 0).await.unwrap();
        assert_eq!(genesis.height, 0);
        assert_eq!(
            ledger.get_block("xuper", &genesis.blockid).await.unwrap(),
            genesis
        );
        assert!(matches!(
            ledger.get_block_by_height("xuper", 5).await,
            Err(Error::Ledger { .. })
        ));

        ledger.set_account_acl("XC1111111111111111@xuper", Acl::single_signer("alice"));
        assert_eq!(
            ledger
                .query_accounts_by_address("xuper", "alice")
                .await
                .unwrap(),
            vec!["XC1111111111111111@xuper".to_string()]
        );
        assert!(ledger
            .query_account_acl("xuper", "XC2222222222222222@xuper")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn frozen_outputs_are_reported_but_not_spendable() {
        let ledger = MemoryLedger::new("xuper");
        ledger.fund("alice", 40);
        ledger.fund_frozen("alice", 60, 5);

        let detail = ledger.get_balance_detail("xuper", "alice").await.unwrap();
        assert_eq!(
            detail,
            vec![
                BalanceDetail {
                    balance: 40,
                    is_frozen: false
                },
                BalanceDetail {
                    balance: 60,
                    is_frozen: true
                },
            ]
        );
        assert!(matches!(
            ledger
                .select_utxo(UtxoQuery {
                    bcname: "xuper".into(),
                    address: "alice".into(),
                    total_amount: 50,
                })
                .await,
            Err(Error::InsufficientFunds { available: 40, .. })
        ));
    }

    #[test]
    fn thaw_releases_outputs_past_their_height() {
        let mut state = LedgerState::default();
        let utxo = |amount: u64| Utxo {
            ref_txid: vec![amount as u8],
            ref_offset: 0,
            to_addr: "alice".into(),
            amount,
        };
        state.frozen = vec![(2, utxo(1)), (3, utxo(2))];
        state.thaw(3);
        assert_eq!(state.utxos, vec![utxo(1)]);
        assert_eq!(state.frozen, vec![(3, utxo(2))]);
    }

    #[tokio::test]
    async fn node_status_describes_the_single_chain() {
        let ledger = MemoryLedger::new("xuper");
        let status = ledger.get_system_status().await.unwrap();
        assert_eq!(status.chains.len(), 1);
        assert_eq!(status.chains[0].bcname, "xuper");
        assert_eq!(status.chains[0].height, 0);
        assert_eq!(status.chains[0].tip_blockid, sha256(b"genesis"));
        assert!(status.peer_urls.is_empty());
        assert_eq!(ledger.get_blockchains().await.unwrap(), vec!["xuper".to_string()]);
    }

    #[test]
    fn runtime_is_read_from_the_deploy_descriptor() {
        assert_eq!(descriptor_runtime(br#"{"runtime":"c","contract_type":"wasm"}"#), "c");
        assert_eq!(descriptor_runtime(b"not json"), "");
    }
}
