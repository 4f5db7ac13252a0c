//! Typed transaction intents.
//!
//! A [`Request`] names an initiator, what they want done, and per-request
//! options. Constructors validate the request shape locally so malformed
//! intents never reach the ledger. Every contract-side request reduces to
//! [`InvokeRequest`]s via [`Request::invoke_requests`].

use std::collections::BTreeMap;
use std::fmt;

use crate::acl::Acl;
use crate::config::{
    CONTRACT_ACCOUNT_DIGITS, DEPLOY_METHOD, NEW_ACCOUNT_METHOD, SET_ACCOUNT_ACL_METHOD,
    SET_METHOD_ACL_METHOD, UPGRADE_METHOD, XKERNEL_MODULE,
};
use crate::error::{Error, Result};
use crate::identity::Identity;
use crate::transaction::InvokeRequest;

// ---------------------------------------------------------------------------
// Contract kinds
// ---------------------------------------------------------------------------

/// Virtual machine hosting a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractModule {
    Wasm,
    Native,
    Evm,
}

impl ContractModule {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractModule::Wasm => "wasm",
            ContractModule::Native => "native",
            ContractModule::Evm => "evm",
        }
    }
}

impl fmt::Display for ContractModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContractModule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "wasm" => Ok(ContractModule::Wasm),
            "native" => Ok(ContractModule::Native),
            "evm" => Ok(ContractModule::Evm),
            other => Err(Error::InvalidRequest(format!(
                "unknown contract module {:?}",
                other
            ))),
        }
    }
}

/// Language runtime of a wasm or native contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Runtime {
    C,
    Go,
    Java,
}

impl Runtime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Runtime::C => "c",
            Runtime::Go => "go",
            Runtime::Java => "java",
        }
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Per-request settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    /// Explicit fee; must cover pre-execution gas.
    pub fee: Option<u64>,
    /// Chain override.
    pub bcname: Option<String>,
    /// Free-form description stored in the body.
    pub desc: Option<String>,
    /// Build without signing or posting.
    pub build_only: bool,
    /// Authorization tokens required beyond the initiator.
    pub extra_auth_require: Vec<String>,
    /// Add the initiator's contract account ACL signers to `auth_require`.
    pub resolve_acl_signers: bool,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fee(mut self, fee: u64) -> Self {
        self.fee = Some(fee);
        self
    }

    pub fn bcname(mut self, bcname: impl Into<String>) -> Self {
        self.bcname = Some(bcname.into());
        self
    }

    pub fn desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = Some(desc.into());
        self
    }

    pub fn build_only(mut self) -> Self {
        self.build_only = true;
        self
    }

    pub fn require_signer(mut self, token: impl Into<String>) -> Self {
        self.extra_auth_require.push(token.into());
        self
    }

    pub fn resolve_acl_signers(mut self) -> Self {
        self.resolve_acl_signers = true;
        self
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// What the initiator wants the transaction to do.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestKind {
    Transfer {
        to: String,
        amount: u64,
    },
    DeployContract {
        module: ContractModule,
        runtime: Option<Runtime>,
        name: String,
        code: Vec<u8>,
        abi: Option<Vec<u8>>,
        init_args: BTreeMap<String, String>,
    },
    UpgradeContract {
        module: ContractModule,
        name: String,
        code: Vec<u8>,
    },
    InvokeContract {
        module: ContractModule,
        name: String,
        method: String,
        args: BTreeMap<String, String>,
        amount: u64,
    },
    /// `account` is the bare 16-digit account key.
    CreateContractAccount {
        account: String,
    },
    SetAccountAcl {
        acl: Acl,
    },
    SetMethodAcl {
        contract: String,
        method: String,
        acl: Acl,
    },
}

/// A validated intent, consumed once by [`crate::proposal::Proposal`].
#[derive(Debug, Clone)]
pub struct Request {
    initiator: Identity,
    kind: RequestKind,
    options: RequestOptions,
}

fn require_non_empty(value: &str, what: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::InvalidRequest(format!("{} must not be empty", what)));
    }
    Ok(())
}

fn require_contract_account(initiator: &Identity, action: &str) -> Result<()> {
    if initiator.contract_account().is_none() {
        return Err(Error::InvalidRequest(format!(
            "{} requires the initiator to act as a contract account",
            action
        )));
    }
    Ok(())
}

impl Request {
    /// Validates and wraps an intent.
    pub fn new(initiator: &Identity, kind: RequestKind, options: RequestOptions) -> Result<Self> {
        let request = Self {
            initiator: initiator.clone(),
            kind,
            options,
        };
        request.validate()?;
        Ok(request)
    }

    pub fn transfer(
        initiator: &Identity,
        to: &str,
        amount: u64,
        options: RequestOptions,
    ) -> Result<Self> {
        Self::new(
            initiator,
            RequestKind::Transfer {
                to: to.to_string(),
                amount,
            },
            options,
        )
    }

    pub fn invoke(
        initiator: &Identity,
        module: ContractModule,
        name: &str,
        method: &str,
        args: BTreeMap<String, String>,
        options: RequestOptions,
    ) -> Result<Self> {
        Self::new(
            initiator,
            RequestKind::InvokeContract {
                module,
                name: name.to_string(),
                method: method.to_string(),
                args,
                amount: 0,
            },
            options,
        )
    }

    pub fn initiator(&self) -> &Identity {
        &self.initiator
    }

    pub fn kind(&self) -> &RequestKind {
        &self.kind
    }

    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    /// Checks request shape. Never touches the network.
    pub fn validate(&self) -> Result<()> {
        for token in &self.options.extra_auth_require {
            require_non_empty(token, "auth_require token")?;
        }
        if let Some(bcname) = &self.options.bcname {
            require_non_empty(bcname, "bcname")?;
        }

        match &self.kind {
            RequestKind::Transfer { to, amount } => {
                require_non_empty(to, "transfer recipient")?;
                if *amount == 0 {
                    return Err(Error::InvalidRequest(
                        "transfer amount must be positive".to_string(),
                    ));
                }
            }
            RequestKind::DeployContract {
                module,
                runtime,
                name,
                code,
                abi,
                ..
            } => {
                require_contract_account(&self.initiator, "contract deployment")?;
                require_non_empty(name, "contract name")?;
                if code.is_empty() {
                    return Err(Error::InvalidRequest("contract code is empty".to_string()));
                }
                match module {
                    ContractModule::Evm if abi.is_none() => {
                        return Err(Error::InvalidRequest(
                            "evm deployment requires an ABI".to_string(),
                        ))
                    }
                    ContractModule::Wasm | ContractModule::Native if runtime.is_none() => {
                        return Err(Error::InvalidRequest(format!(
                            "{} deployment requires a runtime",
                            module
                        )))
                    }
                    _ => {}
                }
            }
            RequestKind::UpgradeContract { name, code, .. } => {
                require_contract_account(&self.initiator, "contract upgrade")?;
                require_non_empty(name, "contract name")?;
                if code.is_empty() {
                    return Err(Error::InvalidRequest("contract code is empty".to_string()));
                }
            }
            RequestKind::InvokeContract { name, method, .. } => {
                require_non_empty(name, "contract name")?;
                require_non_empty(method, "contract method")?;
            }
            RequestKind::CreateContractAccount { account } => {
                if self.initiator.contract_account().is_some() {
                    return Err(Error::InvalidRequest(
                        "contract account creation must be initiated by a plain address"
                            .to_string(),
                    ));
                }
                if account.len() != CONTRACT_ACCOUNT_DIGITS
                    || !account.bytes().all(|b| b.is_ascii_digit())
                {
                    return Err(Error::InvalidAccountFormat(account.clone()));
                }
            }
            RequestKind::SetAccountAcl { .. } => {
                require_contract_account(&self.initiator, "setting an account ACL")?;
            }
            RequestKind::SetMethodAcl {
                contract, method, ..
            } => {
                require_non_empty(contract, "contract name")?;
                require_non_empty(method, "contract method")?;
            }
        }
        Ok(())
    }

    /// Amount moved out of the spender, excluding the fee.
    pub fn amount(&self) -> u64 {
        match &self.kind {
            RequestKind::Transfer { amount, .. } => *amount,
            RequestKind::InvokeContract { amount, .. } => *amount,
            _ => 0,
        }
    }

    /// The contract calls this request makes, in execution order.
    pub fn invoke_requests(&self) -> Result<Vec<InvokeRequest>> {
        let contract_account = self
            .initiator
            .contract_account()
            .map(|a| a.as_str().to_string())
            .unwrap_or_default();

        let request = match &self.kind {
            RequestKind::Transfer { .. } => return Ok(Vec::new()),
            RequestKind::DeployContract {
                module,
                runtime,
                name,
                code,
                abi,
                init_args,
            } => {
                let desc = serde_json::json!({
                    "runtime": runtime.map(|r| r.as_str()).unwrap_or_default(),
                    "contract_type": module.as_str(),
                });
                let mut request = InvokeRequest::new(XKERNEL_MODULE, "", DEPLOY_METHOD)
                    .arg("account_name", contract_account)
                    .arg("contract_name", name.as_str())
                    .arg("contract_code", code.clone())
                    .arg("contract_desc", serde_json::to_vec(&desc)?)
                    .arg("init_args", serde_json::to_vec(init_args)?);
                if let Some(abi) = abi {
                    request = request.arg("contract_abi", abi.clone());
                }
                request
            }
            RequestKind::UpgradeContract { name, code, .. } => {
                InvokeRequest::new(XKERNEL_MODULE, "", UPGRADE_METHOD)
                    .arg("contract_name", name.as_str())
                    .arg("contract_code", code.clone())
            }
            RequestKind::InvokeContract {
                module,
                name,
                method,
                args,
                amount,
            } => {
                let mut request = InvokeRequest::new(module.as_str(), name, method);
                for (key, value) in args {
                    request = request.arg(key, value.as_str());
                }
                if *amount > 0 {
                    request.amount = amount.to_string();
                }
                request
            }
            RequestKind::CreateContractAccount { account } => {
                let acl = Acl::single_signer(self.initiator.address());
                InvokeRequest::new(XKERNEL_MODULE, "", NEW_ACCOUNT_METHOD)
                    .arg("account_name", account.as_str())
                    .arg("acl", acl.to_json()?)
            }
            RequestKind::SetAccountAcl { acl } => {
                InvokeRequest::new(XKERNEL_MODULE, "", SET_ACCOUNT_ACL_METHOD)
                    .arg("account_name", contract_account)
                    .arg("acl", acl.to_json()?)
            }
            RequestKind::SetMethodAcl {
                contract,
                method,
                acl,
            } => InvokeRequest::new(XKERNEL_MODULE, "", SET_METHOD_ACL_METHOD)
                .arg("contract_name", contract.as_str())
                .arg("method_name", method.as_str())
                .arg("acl", acl.to_json()?),
        };
        Ok(vec![request])
    }

    /// Output paid to a contract by an invocation carrying an amount.
    pub(crate) fn contract_payee(&self) -> Option<&str> {
        match &self.kind {
            RequestKind::InvokeContract { name, amount, .. } if *amount > 0 => Some(name.as_str()),
            _ => None,
        }
    }
}
