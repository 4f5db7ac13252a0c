//! Access-control policies for contract accounts and contract methods.
//!
//! The client treats an [`Acl`] as an opaque payload: it is serialized into
//! a system contract call when set, and returned by ledger queries when
//! read. Enforcement is the ledger's job. The one thing the client reads
//! out of an ACL is its weighted signer set, when asked to derive the
//! extra authorization tokens a contract-account transaction needs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// How the ledger evaluates the weighted signer set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum PermissionRule {
    /// No permission check.
    Null,
    /// Sum of signer weights must reach `accept_value`.
    SignThreshold,
    /// Signer sets are evaluated as AK sets.
    SignAkSet,
    /// Fraction of signers must reach `accept_value`.
    SignRate,
    /// Any listed signer suffices.
    SignSuffice,
    /// Mandatory signers plus threshold.
    SignMandatory,
}

impl From<PermissionRule> for i32 {
    fn from(rule: PermissionRule) -> Self {
        match rule {
            PermissionRule::Null => 0,
            PermissionRule::SignThreshold => 1,
            PermissionRule::SignAkSet => 2,
            PermissionRule::SignRate => 3,
            PermissionRule::SignSuffice => 4,
            PermissionRule::SignMandatory => 5,
        }
    }
}

impl TryFrom<i32> for PermissionRule {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => PermissionRule::Null,
            1 => PermissionRule::SignThreshold,
            2 => PermissionRule::SignAkSet,
            3 => PermissionRule::SignRate,
            4 => PermissionRule::SignSuffice,
            5 => PermissionRule::SignMandatory,
            other => return Err(format!("unknown permission rule {}", other)),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionModel {
    pub rule: PermissionRule,
    #[serde(rename = "acceptValue")]
    pub accept_value: f64,
}

/// A weighted signer policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Acl {
    pub pm: PermissionModel,
    #[serde(rename = "aksWeight", default)]
    pub aks_weight: BTreeMap<String, f64>,
}

impl Acl {
    /// A threshold policy where `address` alone, with weight 1, satisfies it.
    ///
    /// This is the ACL a freshly created contract account receives.
    pub fn single_signer(address: &str) -> Self {
        Self::threshold(1.0, [(address.to_string(), 1.0)])
    }

    /// A threshold policy over the given weighted signers.
    pub fn threshold(
        accept_value: f64,
        signers: impl IntoIterator<Item = (String, f64)>,
    ) -> Self {
        Self {
            pm: PermissionModel {
                rule: PermissionRule::SignThreshold,
                accept_value,
            },
            aks_weight: signers.into_iter().collect(),
        }
    }

    /// Signer addresses in a stable (sorted) order.
    pub fn signers(&self) -> impl Iterator<Item = &str> {
        self.aks_weight.keys().map(String::as_str)
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
