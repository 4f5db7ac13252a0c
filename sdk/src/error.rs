//! Error taxonomy for the SDK.
//!
//! Every fallible operation in the crate returns [`Error`]. Local validation
//! failures (`InvalidAccountFormat`, `InvalidRequest`, `NilSigner`,
//! `SignerNotAuthorized`, `BodySealed`, `FeeTooLow`) are raised before any
//! network round trip. Oracle and ledger failures carry the remote code and
//! message verbatim so callers can tell transport trouble from a semantic
//! rejection.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while building, authorizing or submitting transactions.
#[derive(Debug, Error)]
pub enum Error {
    /// A contract account name did not match `XC` + 16 digits + optional `@suffix`.
    #[error("invalid contract account format: {0:?}")]
    InvalidAccountFormat(String),

    /// The request is malformed (empty contract name, zero amount, ...).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The signing oracle could not be reached or timed out.
    #[error("signing oracle unavailable: {0}")]
    OracleUnavailable(String),

    /// The signing oracle answered with a non-success code.
    #[error("signing oracle rejected request (code {code}): {message}")]
    OracleRejected { code: i32, message: String },

    /// The spender's UTXOs cannot cover the required amount.
    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: u64, available: u64 },

    /// The signer's authorization token is not part of the transaction's
    /// `auth_require` list.
    #[error("signer {token} is not in the transaction's auth_require list")]
    SignerNotAuthorized { token: String },

    /// `sign` was called without an identity.
    #[error("transaction signer can not be nil")]
    NilSigner,

    /// The body was mutated after its digest had been computed.
    #[error("transaction body is sealed: digest already computed")]
    BodySealed,

    /// An explicit fee does not cover the gas reported by pre-execution.
    #[error("fee too low: offered {offered}, pre-execution requires {required}")]
    FeeTooLow { offered: u64, required: u64 },

    /// The ledger refused a fully built transaction.
    #[error("ledger rejected transaction (code {code}): {reason}")]
    SubmitRejected { code: i64, reason: String },

    /// A ledger RPC failed at the connection level.
    #[error("ledger transport failure: {0}")]
    TransportFailure(String),

    /// A ledger query returned an application error.
    #[error("ledger error (code {code}): {message}")]
    Ledger { code: i64, message: String },

    /// Encoding or decoding of a wire payload failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Configuration could not be loaded or is inconsistent.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Returns `true` for transport-class failures that a caller may retry.
    ///
    /// Semantic rejections (oracle refusal, ledger rejection, local
    /// validation) are never retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::OracleUnavailable(_) | Error::TransportFailure(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
