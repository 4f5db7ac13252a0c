//! # Transaction Proposal
//!
//! Turns a validated [`Request`] into an unsigned [`Transaction`].
//!
//! ## Assembly
//!
//! ```text
//!   Request ──► auth_require ──► pre-exec (contract calls only)
//!                                   │
//!                                   ▼
//!               fee = max(offered, gas) ──► funding ──► outputs ──► body
//! ```
//!
//! Outputs are laid out as: the payee (transfer recipient, or the contract
//! for an invocation carrying an amount), then the fee to `$`, then change
//! back to the spender. The spender is the initiator's contract account
//! when one is bound, otherwise its address; the body's `initiator` field
//! is always the address, since only addresses can sign.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Utc;
use tracing::{debug, info};

use crate::config::{ClientConfig, FEE_ADDRESS};
use crate::error::{Error, Result};
use crate::funding::FundingSelector;
use crate::ledger::{InvocationRequest, InvokeResponse, LedgerRpc};
use crate::request::{Request, RequestKind};
use crate::transaction::{is_authorized, ContractResponse, Transaction, TxBody, TxOutput};

/// Outcome of a dry run that is never turned into a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PreExecResult {
    /// Response of the last contract call, the one a query cares about.
    pub contract_response: Option<ContractResponse>,
    pub responses: Vec<ContractResponse>,
    pub gas_used: i64,
}

impl From<InvokeResponse> for PreExecResult {
    fn from(response: InvokeResponse) -> Self {
        Self {
            contract_response: response.last_response().cloned(),
            gas_used: response.gas_used,
            responses: response.responses,
        }
    }
}

/// One request on its way to becoming a transaction.
pub struct Proposal<'a> {
    config: &'a ClientConfig,
    ledger: &'a dyn LedgerRpc,
    request: Request,
}

impl<'a> Proposal<'a> {
    /// Re-validates `request` so a proposal is never built from a
    /// request mutated after construction.
    pub fn new(config: &'a ClientConfig, ledger: &'a dyn LedgerRpc, request: Request) -> Result<Self> {
        request.validate()?;
        Ok(Self {
            config,
            ledger,
            request,
        })
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Chain targeted by this proposal.
    pub fn bcname(&self) -> &str {
        self.request
            .options()
            .bcname
            .as_deref()
            .unwrap_or(&self.config.ledger.bcname)
    }

    /// Tokens that must sign, initiator first.
    ///
    /// Explicit extras follow in the order given. With ACL resolution on,
    /// the remaining signers of the initiator's contract account are
    /// appended as `account/address` tokens in sorted order. Tokens already
    /// covered by an earlier entry are skipped.
    pub async fn auth_require(&self) -> Result<Vec<String>> {
        let initiator = self.request.initiator();
        let mut tokens = vec![initiator.auth_token()];

        for token in &self.request.options().extra_auth_require {
            if !tokens.contains(token) {
                tokens.push(token.clone());
            }
        }

        if self.request.options().resolve_acl_signers {
            let account = initiator.contract_account().ok_or_else(|| {
                Error::InvalidRequest(
                    "resolving ACL signers requires a contract account".to_string(),
                )
            })?;
            let acl = self
                .ledger
                .query_account_acl(self.bcname(), account.as_str())
                .await?
                .ok_or_else(|| Error::Ledger {
                    code: 0,
                    message: format!("account {} has no ACL", account),
                })?;
            for signer in acl.signers() {
                if signer == initiator.address() || is_authorized(&tokens, signer) {
                    continue;
                }
                tokens.push(format!("{}/{}", account, signer));
            }
        }
        Ok(tokens)
    }

    async fn pre_exec(&self, auth_require: &[String]) -> Result<Option<InvokeResponse>> {
        let requests = self.request.invoke_requests()?;
        if requests.is_empty() {
            return Ok(None);
        }

        let response = self
            .ledger
            .pre_exec(InvocationRequest {
                bcname: self.bcname().to_string(),
                initiator: self.request.initiator().address().to_string(),
                auth_require: auth_require.to_vec(),
                requests,
            })
            .await?;

        if let Some(failed) = response.responses.iter().find(|r| !r.is_ok()) {
            return Err(Error::Ledger {
                code: failed.status.into(),
                message: format!("contract call failed: {}", failed.message),
            });
        }
        debug!(
            requests = response.requests.len(),
            gas_used = response.gas_used,
            "pre-executed contract calls"
        );
        Ok(Some(response))
    }

    /// Fee covering `gas`. An explicit fee below it is an error; the
    /// configured default is raised to it silently.
    fn fee(&self, gas: u64) -> Result<u64> {
        if let Some(offered) = self.request.options().fee {
            if offered < gas {
                return Err(Error::FeeTooLow {
                    offered,
                    required: gas,
                });
            }
            return Ok(offered);
        }
        Ok(self.config.tx.default_fee.unwrap_or(0).max(gas))
    }

    /// Dry-runs the contract calls without funding or building a body.
    pub async fn pre_exec_only(self) -> Result<PreExecResult> {
        let auth_require = self.auth_require().await?;
        let response = self.pre_exec(&auth_require).await?.ok_or_else(|| {
            Error::InvalidRequest("request carries no contract calls to pre-execute".to_string())
        })?;
        Ok(response.into())
    }

    /// Assembles the unsigned transaction.
    pub async fn build(self) -> Result<Transaction> {
        let initiator = self.request.initiator();
        let auth_require = self.auth_require().await?;
        let pre_exec = self.pre_exec(&auth_require).await?;

        let gas_used = pre_exec.as_ref().map_or(0, |r| r.gas_used);
        let fee = self.fee(u64::try_from(gas_used).unwrap_or(0))?;
        let amount = self.request.amount();
        let required = amount.checked_add(fee).ok_or_else(|| {
            Error::InvalidRequest("amount plus fee overflows u64".to_string())
        })?;

        let spender = initiator.spender();
        let funding = FundingSelector::new(self.ledger, self.bcname())
            .select_inputs(spender, required)
            .await?;

        let mut outputs = Vec::new();
        if let RequestKind::Transfer { to, amount } = self.request.kind() {
            outputs.push(TxOutput::new(to.as_str(), *amount));
        }
        if let Some(contract) = self.request.contract_payee() {
            outputs.push(TxOutput::new(contract, amount));
        }
        if fee > 0 {
            outputs.push(TxOutput::new(FEE_ADDRESS, fee));
        }
        outputs.extend(funding.change_output(spender));

        let (inputs_ext, outputs_ext, contract_requests, responses) = match pre_exec {
            Some(r) => (r.inputs_ext, r.outputs_ext, r.requests, r.responses),
            None => Default::default(),
        };

        let body = TxBody {
            inputs: funding.inputs,
            outputs,
            desc: self
                .request
                .options()
                .desc
                .clone()
                .unwrap_or_default()
                .into_bytes(),
            nonce: nonce(),
            timestamp: Utc::now().timestamp_nanos_opt().unwrap_or_default(),
            version: self.config.tx.version,
            inputs_ext,
            outputs_ext,
            contract_requests,
            initiator: initiator.address().to_string(),
            auth_require,
            coinbase: false,
            autogen: false,
        };

        let mut tx = Transaction::new(self.bcname(), body);
        tx.set_execution(fee, gas_used, responses.last().cloned());
        info!(
            bcname = tx.bcname(),
            initiator = initiator.address(),
            fee,
            inputs = tx.body().inputs.len(),
            outputs = tx.body().outputs.len(),
            "built transaction proposal"
        );
        Ok(tx)
    }
}

/// Seconds since the epoch followed by eight random digits.
fn nonce() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let salt = uuid::Uuid::new_v4().as_u128() % 100_000_000;
    format!("{}{:08}", secs, salt)
}
