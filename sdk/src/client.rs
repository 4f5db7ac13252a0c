//! # Client Facade
//!
//! [`Client`] sequences the submission pipeline over one ledger:
//!
//! ```text
//!   execute:      build ──► (build_only? return) ──► sign_and_post
//!   generate_tx:  build
//!   pre_exec_tx:  pre-exec only, nothing funded or signed
//!   sign_and_post: sign(initiator) ──► post, the caller keeps the tx
//!   post_tx:      post an externally signed transaction
//! ```
//!
//! The convenience calls (`transfer`, `deploy_*`, `invoke_contract`, ...)
//! construct the matching [`Request`] and run it through `execute`.
//! Query passthroughs read from the client's default chain.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::acl::Acl;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::identity::{ContractAccount, Identity};
use crate::ledger::{
    AccountContracts, BalanceDetail, BlockInfo, ContractStatus, JsonRpcLedger, LedgerRpc,
    SystemStatus, TxRecord,
};
use crate::oracle::{HttpOracle, SigningOracle};
use crate::proposal::{PreExecResult, Proposal};
use crate::request::{ContractModule, Request, RequestKind, RequestOptions, Runtime};
use crate::transaction::Transaction;

/// Contract call arguments, keyed by name.
pub type ContractArgs = BTreeMap<String, String>;

/// Entry point for building, signing and submitting transactions.
#[derive(Clone)]
pub struct Client {
    config: ClientConfig,
    ledger: Arc<dyn LedgerRpc>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Client {
    pub fn new(config: ClientConfig, ledger: Arc<dyn LedgerRpc>) -> Self {
        Self { config, ledger }
    }

    /// Validates `config` and connects to its JSON-RPC ledger endpoint.
    pub fn connect(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let ledger = JsonRpcLedger::new(&config.ledger)?;
        Ok(Self::new(config, Arc::new(ledger)))
    }

    /// An HTTP signing oracle built from this client's oracle settings.
    pub fn http_oracle(&self) -> Result<Arc<dyn SigningOracle>> {
        Ok(Arc::new(HttpOracle::new(self.config.oracle.clone())?))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Arc<dyn LedgerRpc> {
        &self.ledger
    }

    pub fn bcname(&self) -> &str {
        &self.config.ledger.bcname
    }

    // -- Pipeline ----------------------------------------------------------

    /// Builds an unsigned transaction for external signing.
    pub async fn generate_tx(&self, request: Request) -> Result<Transaction> {
        Proposal::new(&self.config, self.ledger.as_ref(), request)?
            .build()
            .await
    }

    /// Dry-runs a request's contract calls.
    pub async fn pre_exec_tx(&self, request: Request) -> Result<PreExecResult> {
        Proposal::new(&self.config, self.ledger.as_ref(), request)?
            .pre_exec_only()
            .await
    }

    /// Builds, signs with the initiator and posts.
    ///
    /// With `build_only` set the unsigned transaction is returned as is.
    /// Any additional `auth_require` signers must sign before the ledger
    /// will accept it, so multi-party flows use `build_only` and
    /// [`Client::post_tx`] instead.
    ///
    /// A failed post drops the signed transaction along with the error.
    /// Callers that retry the same transaction build it with
    /// [`Client::generate_tx`] and submit it with [`Client::sign_and_post`].
    pub async fn execute(&self, request: Request) -> Result<Transaction> {
        let initiator = request.initiator().clone();
        let build_only = request.options().build_only;

        let mut tx = self.generate_tx(request).await?;
        if build_only {
            return Ok(tx);
        }

        if let Err(e) = self.sign_and_post(&mut tx, &initiator).await {
            if tx.is_fully_signed() {
                warn!(txid = %tx.txid_hex(), error = %e, "signed transaction was not posted");
            }
            return Err(e);
        }
        Ok(tx)
    }

    /// Signs with `initiator` and posts. On failure `tx` keeps every
    /// signature it collected, so it can be posted again as is.
    pub async fn sign_and_post(&self, tx: &mut Transaction, initiator: &Identity) -> Result<()> {
        tx.sign(Some(initiator)).await?;
        self.post_tx(tx).await
    }

    /// Submits a signed transaction and marks it submitted.
    ///
    /// A transaction that is not fully signed is still posted; the ledger
    /// decides.
    pub async fn post_tx(&self, tx: &mut Transaction) -> Result<()> {
        if !tx.is_fully_signed() {
            warn!(
                txid = %tx.txid_hex(),
                state = %tx.state(),
                missing = ?tx.missing_signers(),
                "posting a transaction that is not fully signed"
            );
        }
        self.ledger.post_tx(tx.bcname(), &tx.to_signed()).await?;
        tx.mark_submitted();
        info!(txid = %tx.txid_hex(), bcname = tx.bcname(), "transaction submitted");
        Ok(())
    }

    // -- Transfers & contracts ---------------------------------------------

    pub async fn transfer(
        &self,
        from: &Identity,
        to: &str,
        amount: u64,
        options: RequestOptions,
    ) -> Result<Transaction> {
        self.execute(Request::transfer(from, to, amount, options)?)
            .await
    }

    /// Deploys a wasm contract written for `runtime`.
    pub async fn deploy_wasm_contract(
        &self,
        from: &Identity,
        name: &str,
        code: Vec<u8>,
        runtime: Runtime,
        init_args: ContractArgs,
        options: RequestOptions,
    ) -> Result<Transaction> {
        self.deploy(from, ContractModule::Wasm, Some(runtime), name, code, None, init_args, options)
            .await
    }

    /// Deploys a native (Go or Java) contract.
    pub async fn deploy_native_contract(
        &self,
        from: &Identity,
        name: &str,
        code: Vec<u8>,
        runtime: Runtime,
        init_args: ContractArgs,
        options: RequestOptions,
    ) -> Result<Transaction> {
        self.deploy(from, ContractModule::Native, Some(runtime), name, code, None, init_args, options)
            .await
    }

    pub async fn deploy_evm_contract(
        &self,
        from: &Identity,
        name: &str,
        abi: Vec<u8>,
        bin: Vec<u8>,
        init_args: ContractArgs,
        options: RequestOptions,
    ) -> Result<Transaction> {
        self.deploy(from, ContractModule::Evm, None, name, bin, Some(abi), init_args, options)
            .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn deploy(
        &self,
        from: &Identity,
        module: ContractModule,
        runtime: Option<Runtime>,
        name: &str,
        code: Vec<u8>,
        abi: Option<Vec<u8>>,
        init_args: ContractArgs,
        options: RequestOptions,
    ) -> Result<Transaction> {
        let kind = RequestKind::DeployContract {
            module,
            runtime,
            name: name.to_string(),
            code,
            abi,
            init_args,
        };
        self.execute(Request::new(from, kind, options)?).await
    }

    pub async fn upgrade_contract(
        &self,
        from: &Identity,
        module: ContractModule,
        name: &str,
        code: Vec<u8>,
        options: RequestOptions,
    ) -> Result<Transaction> {
        let kind = RequestKind::UpgradeContract {
            module,
            name: name.to_string(),
            code,
        };
        self.execute(Request::new(from, kind, options)?).await
    }

    /// Invokes a contract method, paying `amount` to the contract when
    /// non-zero.
    #[allow(clippy::too_many_arguments)]
    pub async fn invoke_contract(
        &self,
        from: &Identity,
        module: ContractModule,
        name: &str,
        method: &str,
        args: ContractArgs,
        amount: u64,
        options: RequestOptions,
    ) -> Result<Transaction> {
        let kind = RequestKind::InvokeContract {
            module,
            name: name.to_string(),
            method: method.to_string(),
            args,
            amount,
        };
        self.execute(Request::new(from, kind, options)?).await
    }

    /// Reads contract state through pre-execution. Nothing is submitted.
    pub async fn query_contract(
        &self,
        from: &Identity,
        module: ContractModule,
        name: &str,
        method: &str,
        args: ContractArgs,
        options: RequestOptions,
    ) -> Result<PreExecResult> {
        self.pre_exec_tx(Request::invoke(from, module, name, method, args, options)?)
            .await
    }

    // -- Accounts & ACLs ---------------------------------------------------

    /// Creates contract account `name` (`XC` + 16 digits, optional
    /// `@chain`) owned solely by `from`.
    pub async fn create_contract_account(
        &self,
        from: &Identity,
        name: &str,
        options: RequestOptions,
    ) -> Result<Transaction> {
        let account = ContractAccount::parse(name)?;
        let kind = RequestKind::CreateContractAccount {
            account: account.numeric().to_string(),
        };
        self.execute(Request::new(from, kind, options)?).await
    }

    /// Replaces the ACL of `from`'s contract account.
    pub async fn set_account_acl(
        &self,
        from: &Identity,
        acl: Acl,
        options: RequestOptions,
    ) -> Result<Transaction> {
        self.execute(Request::new(from, RequestKind::SetAccountAcl { acl }, options)?)
            .await
    }

    pub async fn set_method_acl(
        &self,
        from: &Identity,
        contract: &str,
        method: &str,
        acl: Acl,
        options: RequestOptions,
    ) -> Result<Transaction> {
        let kind = RequestKind::SetMethodAcl {
            contract: contract.to_string(),
            method: method.to_string(),
            acl,
        };
        self.execute(Request::new(from, kind, options)?).await
    }

    // -- Queries -----------------------------------------------------------

    pub async fn query_balance(&self, address: &str) -> Result<u64> {
        self.ledger.get_balance(self.bcname(), address).await
    }

    pub async fn query_tx(&self, txid: &[u8]) -> Result<TxRecord> {
        self.ledger.query_tx(self.bcname(), txid).await
    }

    pub async fn query_block(&self, blockid: &[u8]) -> Result<BlockInfo> {
        self.ledger.get_block(self.bcname(), blockid).await
    }

    pub async fn query_block_by_height(&self, height: i64) -> Result<BlockInfo> {
        self.ledger.get_block_by_height(self.bcname(), height).await
    }

    pub async fn query_account_acl(&self, account: &str) -> Result<Option<Acl>> {
        self.ledger.query_account_acl(self.bcname(), account).await
    }

    pub async fn query_method_acl(&self, contract: &str, method: &str) -> Result<Option<Acl>> {
        self.ledger
            .query_method_acl(self.bcname(), contract, method)
            .await
    }

    /// Contract accounts whose ACL names `address`.
    pub async fn query_accounts_by_address(&self, address: &str) -> Result<Vec<String>> {
        self.ledger
            .query_accounts_by_address(self.bcname(), address)
            .await
    }

    pub async fn query_account_contracts(&self, account: &str) -> Result<Vec<ContractStatus>> {
        self.ledger
            .query_account_contracts(self.bcname(), account)
            .await
    }

    /// Contracts of every contract account `address` belongs to, keyed by
    /// account.
    pub async fn query_address_contracts(&self, address: &str) -> Result<AccountContracts> {
        self.ledger
            .query_address_contracts(self.bcname(), address)
            .await
    }

    pub async fn query_balance_detail(&self, address: &str) -> Result<Vec<BalanceDetail>> {
        self.ledger.get_balance_detail(self.bcname(), address).await
    }

    pub async fn query_system_status(&self) -> Result<SystemStatus> {
        self.ledger.get_system_status().await
    }

    pub async fn query_blockchains(&self) -> Result<Vec<String>> {
        self.ledger.get_blockchains().await
    }
}
