//! # Identity
//!
//! An [`Identity`] is anything that can spend or authorize: a plain address
//! whose key lives in a signing oracle, optionally acting on behalf of a
//! contract account.
//!
//! ## Architecture
//!
//! ```text
//! mod.rs             : Identity: address, optional contract binding, oracle handle
//! contract_account.rs: ContractAccount: validated `XC<16 digits>[@suffix]` names
//! ```
//!
//! ## Authorization Tokens
//!
//! The token an identity presents to a transaction's `auth_require` list is
//!
//! ```text
//! unbound:  <address>
//! bound:    <contract account>/<address>
//! ```
//!
//! The contract account is written as bound, suffix included.

pub mod contract_account;

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config::AUTH_TOKEN_SEPARATOR;
use crate::error::{Error, Result};
use crate::oracle::SigningOracle;

pub use contract_account::ContractAccount;

/// A spending and authorizing entity whose key is held by a signing oracle.
#[derive(Clone)]
pub struct Identity {
    address: String,
    contract_account: Option<ContractAccount>,
    oracle: Arc<dyn SigningOracle>,
}

impl Identity {
    /// Asks the oracle to create a fresh key and wraps the new address.
    pub async fn create(oracle: Arc<dyn SigningOracle>) -> Result<Self> {
        let address = oracle.create().await?;
        debug!(%address, "created identity");
        Ok(Self::from_address(address, oracle))
    }

    /// Re-attaches to an address the oracle already holds a key for.
    ///
    /// Fails with [`Error::OracleRejected`] if the oracle does not know it.
    pub async fn recover(oracle: Arc<dyn SigningOracle>, address: &str) -> Result<Self> {
        if !oracle.exists(address).await? {
            return Err(Error::OracleRejected {
                code: 404,
                message: format!("oracle holds no key for {}", address),
            });
        }
        debug!(%address, "recovered identity");
        Ok(Self::from_address(address.to_string(), oracle))
    }

    /// Wraps an address without contacting the oracle.
    pub fn from_address(address: impl Into<String>, oracle: Arc<dyn SigningOracle>) -> Self {
        Self {
            address: address.into(),
            contract_account: None,
            oracle,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn contract_account(&self) -> Option<&ContractAccount> {
        self.contract_account.as_ref()
    }

    pub fn oracle(&self) -> &Arc<dyn SigningOracle> {
        &self.oracle
    }

    /// Binds this identity to a contract account.
    ///
    /// On a malformed name the identity keeps whatever binding it had.
    pub fn set_contract_account(&mut self, name: &str) -> Result<()> {
        let account = ContractAccount::parse(name)?;
        self.contract_account = Some(account);
        Ok(())
    }

    /// Builder-style variant of [`Identity::set_contract_account`].
    pub fn with_contract_account(mut self, name: &str) -> Result<Self> {
        self.set_contract_account(name)?;
        Ok(self)
    }

    pub fn clear_contract_account(&mut self) {
        self.contract_account = None;
    }

    /// The token matched against a transaction's `auth_require` list.
    pub fn auth_token(&self) -> String {
        match &self.contract_account {
            Some(account) => format!("{}{}{}", account, AUTH_TOKEN_SEPARATOR, self.address),
            None => self.address.clone(),
        }
    }

    /// The account whose UTXOs fund this identity's transactions.
    pub fn spender(&self) -> &str {
        match &self.contract_account {
            Some(account) => account.as_str(),
            None => &self.address,
        }
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("address", &self.address)
            .field("contract_account", &self.contract_account)
            .finish_non_exhaustive()
    }
}
