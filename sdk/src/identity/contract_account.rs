//! Contract account names.
//!
//! A contract account is written `XC<16 digits>` optionally followed by an
//! `@`-prefixed chain suffix, e.g. `XC1234567890123456@xuper`. The 16 digit
//! segment is the canonical on-chain key; the rest is human-facing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{CONTRACT_ACCOUNT_DIGITS, CONTRACT_ACCOUNT_PREFIX};
use crate::error::{Error, Result};

/// A validated contract account name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContractAccount {
    name: String,
}

impl ContractAccount {
    /// Validates `name` and wraps it.
    ///
    /// Accepts exactly `XC`, then 16 ASCII digits, then either the end of
    /// the string or a suffix starting with `@`.
    pub fn parse(name: &str) -> Result<Self> {
        let invalid = || Error::InvalidAccountFormat(name.to_string());

        let rest = name.strip_prefix(CONTRACT_ACCOUNT_PREFIX).ok_or_else(invalid)?;
        let digits = rest.get(..CONTRACT_ACCOUNT_DIGITS).ok_or_else(invalid)?;
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let suffix = &rest[CONTRACT_ACCOUNT_DIGITS..];
        if !suffix.is_empty() && !suffix.starts_with('@') {
            return Err(invalid());
        }

        Ok(Self {
            name: name.to_string(),
        })
    }

    /// The full name as given, suffix included.
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// The bare 16-digit account key.
    pub fn numeric(&self) -> &str {
        let start = CONTRACT_ACCOUNT_PREFIX.len();
        &self.name[start..start + CONTRACT_ACCOUNT_DIGITS]
    }

    /// The `@...` suffix, if any.
    pub fn suffix(&self) -> Option<&str> {
        let end = CONTRACT_ACCOUNT_PREFIX.len() + CONTRACT_ACCOUNT_DIGITS;
        let suffix = &self.name[end..];
        (!suffix.is_empty()).then_some(suffix)
    }
}

impl fmt::Display for ContractAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl FromStr for ContractAccount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ContractAccount {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ContractAccount> for String {
    fn from(account: ContractAccount) -> Self {
        account.name
    }
}
