//! # Client Configuration & Constants
//!
//! Protocol constants shared by every component, plus the runtime
//! configuration handed to each client at construction time. Nothing in
//! this crate reads process-wide mutable defaults: two clients pointed at
//! different oracles or chains can live side by side in one process.
//!
//! Configuration is plain serde data. [`ClientConfig::load`] reads a TOML
//! file; every field has a default, so an empty file yields a client that
//! talks to a local oracle on `127.0.0.1:8080` and a local node on
//! `127.0.0.1:37101`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Ledger Constants
// ---------------------------------------------------------------------------

/// Chain name used when neither the request nor the config names one.
pub const DEFAULT_BCNAME: &str = "xuper";

/// Transaction format version stamped into every body.
pub const TX_VERSION: i32 = 1;

/// Output address that collects transaction fees.
pub const FEE_ADDRESS: &str = "$";

/// Module name of the ledger's built-in system contracts.
pub const XKERNEL_MODULE: &str = "xkernel";

/// System contract method creating a contract account.
pub const NEW_ACCOUNT_METHOD: &str = "NewAccount";

/// System contract method replacing a contract account's ACL.
pub const SET_ACCOUNT_ACL_METHOD: &str = "SetAccountAcl";

/// System contract method replacing a contract method's ACL.
pub const SET_METHOD_ACL_METHOD: &str = "SetMethodAcl";

/// System contract method deploying contract code.
pub const DEPLOY_METHOD: &str = "Deploy";

/// System contract method upgrading contract code in place.
pub const UPGRADE_METHOD: &str = "Upgrade";

/// Prefix of every contract account name.
pub const CONTRACT_ACCOUNT_PREFIX: &str = "XC";

/// Number of digits in the numeric contract account key.
pub const CONTRACT_ACCOUNT_DIGITS: usize = 16;

/// Separator between contract account and address in an auth token.
pub const AUTH_TOKEN_SEPARATOR: char = '/';

// ---------------------------------------------------------------------------
// Oracle Constants
// ---------------------------------------------------------------------------

/// Response code the signing oracle uses for success.
pub const ORACLE_SUCCESS_CODE: i32 = 200;

/// Default signing oracle base URL.
pub const DEFAULT_ORACLE_URL: &str = "http://127.0.0.1:8080";

/// Default ledger JSON-RPC endpoint.
pub const DEFAULT_LEDGER_ENDPOINT: &str = "http://127.0.0.1:37101";

/// Default per-request timeout for both oracle and ledger calls.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

// ---------------------------------------------------------------------------
// Runtime Configuration
// ---------------------------------------------------------------------------

/// A single HTTP endpoint on the signing oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Path appended to [`OracleConfig::url`].
    pub path: String,
    /// HTTP method, e.g. `"GET"` or `"POST"`.
    pub method: String,
}

impl Endpoint {
    fn new(path: &str, method: &str) -> Self {
        Self {
            path: path.to_string(),
            method: method.to_string(),
        }
    }

    /// Parses [`Endpoint::method`] into a `reqwest` method.
    pub fn http_method(&self) -> Result<reqwest::Method> {
        reqwest::Method::from_bytes(self.method.to_ascii_uppercase().as_bytes())
            .map_err(|_| Error::Config(format!("invalid HTTP method {:?}", self.method)))
    }
}

/// Where and how to reach the remote signing oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub url: String,
    pub ping: Endpoint,
    pub create: Endpoint,
    pub exist: Endpoint,
    pub sign: Endpoint,
    pub verify: Endpoint,
    pub timeout_ms: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_ORACLE_URL.to_string(),
            ping: Endpoint::new("/ping", "GET"),
            create: Endpoint::new("/create", "GET"),
            exist: Endpoint::new("/exist", "POST"),
            sign: Endpoint::new("/sign", "POST"),
            verify: Endpoint::new("/verify", "POST"),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl OracleConfig {
    /// Returns an oracle config pointing at `url` with default endpoints.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Full URL for an endpoint.
    pub fn endpoint_url(&self, endpoint: &Endpoint) -> String {
        format!("{}{}", self.url.trim_end_matches('/'), endpoint.path)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Where and how to reach the ledger node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// JSON-RPC endpoint of the node.
    pub endpoint: String,
    /// Chain the client operates on.
    pub bcname: String,
    pub timeout_ms: u64,
    /// PEM CA bundle to trust for an `https` endpoint.
    pub ca_cert: Option<PathBuf>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_LEDGER_ENDPOINT.to_string(),
            bcname: DEFAULT_BCNAME.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            ca_cert: None,
        }
    }
}

impl LedgerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Defaults applied while assembling transaction bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TxConfig {
    /// Version stamped into the body.
    pub version: i32,
    /// Fee used when a request does not set one.
    pub default_fee: Option<u64>,
}

impl Default for TxConfig {
    fn default() -> Self {
        Self {
            version: TX_VERSION,
            default_fee: None,
        }
    }
}

/// Complete client configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub ledger: LedgerConfig,
    pub oracle: OracleConfig,
    pub tx: TxConfig,
}

impl ClientConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: ClientConfig =
            toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("reading {}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// Checks cross-field consistency.
    pub fn validate(&self) -> Result<()> {
        if self.ledger.bcname.is_empty() {
            return Err(Error::Config("ledger.bcname must not be empty".into()));
        }
        if self.ledger.endpoint.is_empty() {
            return Err(Error::Config("ledger.endpoint must not be empty".into()));
        }
        if self.oracle.url.is_empty() {
            return Err(Error::Config("oracle.url must not be empty".into()));
        }
        for endpoint in [
            &self.oracle.ping,
            &self.oracle.create,
            &self.oracle.exist,
            &self.oracle.sign,
            &self.oracle.verify,
        ] {
            endpoint.http_method()?;
        }
        Ok(())
    }
}
