//! # Signing Oracle
//!
//! Private keys never exist on the client. Every signature is produced by a
//! remote signing oracle (an enclave-backed key custodian) that is asked,
//! by address, to sign a payload and answers with a public key and a
//! signature.
//!
//! ## Architecture
//!
//! ```text
//! mod.rs    : SigningOracle capability trait and the response envelope
//! http.rs   : HttpOracle: the JSON-over-HTTP transport
//! memory.rs : MemoryOracle: in-process Ed25519 custodian for tests and offline use
//! ```
//!
//! Any transport implementing [`SigningOracle`] can be injected into an
//! [`crate::identity::Identity`]. Transport failures and timeouts surface
//! as [`Error::OracleUnavailable`]; oracle-side refusals as
//! [`Error::OracleRejected`].

pub mod http;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::codec::base64_bytes;
use crate::config::ORACLE_SUCCESS_CODE;
use crate::error::{Error, Result};
use crate::transaction::SignatureInfo;

pub use http::HttpOracle;
pub use memory::MemoryOracle;

/// The capability set of a remote signing oracle.
#[async_trait]
pub trait SigningOracle: Send + Sync {
    /// Liveness probe.
    async fn ping(&self) -> Result<()>;

    /// Creates a new key inside the oracle and returns its address.
    async fn create(&self) -> Result<String>;

    /// Returns whether the oracle holds a key for `address`.
    async fn exists(&self, address: &str) -> Result<bool>;

    /// Signs `message` with the key behind `address`.
    async fn sign(&self, address: &str, message: &[u8]) -> Result<SignatureInfo>;

    /// Asks the oracle to check a signature it produced.
    async fn verify(
        &self,
        address: &str,
        message: &[u8],
        signature: &SignatureInfo,
    ) -> Result<bool>;
}

/// Response envelope returned by every oracle endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleResponse {
    pub code: i32,
    #[serde(default)]
    pub msg: String,
    #[serde(default, with = "base64_bytes")]
    pub data: Vec<u8>,
}

impl OracleResponse {
    pub fn success(data: impl Into<Vec<u8>>) -> Self {
        Self {
            code: ORACLE_SUCCESS_CODE,
            msg: "ok".to_string(),
            data: data.into(),
        }
    }

    pub fn failure(code: i32, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: msg.into(),
            data: Vec::new(),
        }
    }

    /// Returns the payload on success, or [`Error::OracleRejected`].
    pub fn into_data(self) -> Result<Vec<u8>> {
        if self.code != ORACLE_SUCCESS_CODE {
            return Err(Error::OracleRejected {
                code: self.code,
                message: self.msg,
            });
        }
        Ok(self.data)
    }
}

/// The payload of a successful `sign` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignPayload {
    pub public_key: String,
    #[serde(with = "base64_bytes")]
    pub sign: Vec<u8>,
}

impl From<SignPayload> for SignatureInfo {
    fn from(payload: SignPayload) -> Self {
        SignatureInfo {
            public_key: payload.public_key,
            sign: payload.sign,
        }
    }
}

impl From<&SignatureInfo> for SignPayload {
    fn from(info: &SignatureInfo) -> Self {
        SignPayload {
            public_key: info.public_key.clone(),
            sign: info.sign.clone(),
        }
    }
}

/// Parses the oracle's textual boolean (`"true"` / `"false"`).
pub(crate) fn parse_flag(data: &[u8]) -> Result<bool> {
    match std::str::from_utf8(data).map(str::trim) {
        Ok("true") => Ok(true),
        Ok("false") => Ok(false),
        _ => Err(Error::Serialization(format!(
            "expected boolean flag from oracle, got {:?}",
            String::from_utf8_lossy(data)
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_success_code_is_rejection() {
        let err = OracleResponse::failure(404, "address not found")
            .into_data()
            .unwrap_err();
        match err {
            Error::OracleRejected { code, message } => {
                assert_eq!(code, 404);
                assert_eq!(message, "address not found");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn envelope_data_is_base64_on_the_wire() {
        let json = serde_json::to_value(OracleResponse::success(b"true".to_vec())).unwrap();
        assert_eq!(json["code"], 200);
        assert_eq!(json["data"], "dHJ1ZQ==");
    }

    #[test]
    fn flags_parse_strictly() {
        assert!(parse_flag(b"true").unwrap());
        assert!(!parse_flag(b"false\n").unwrap());
        assert!(parse_flag(b"yes").is_err());
    }
}
