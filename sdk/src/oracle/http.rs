//! JSON-over-HTTP transport for the signing oracle.
//!
//! Each capability maps to one configured [`Endpoint`]. Requests are JSON
//! objects, byte arguments are base64, and every response is an
//! [`OracleResponse`] envelope.

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use super::{parse_flag, OracleResponse, SignPayload, SigningOracle};
use crate::codec::base64_bytes;
use crate::config::{Endpoint, OracleConfig};
use crate::error::{Error, Result};
use crate::transaction::SignatureInfo;

#[derive(Serialize)]
struct AddressArgs<'a> {
    address: &'a str,
}

#[derive(Serialize)]
struct SignArgs<'a> {
    address: &'a str,
    #[serde(with = "base64_bytes")]
    msg: &'a [u8],
}

#[derive(Serialize)]
struct VerifyArgs<'a> {
    address: &'a str,
    #[serde(with = "base64_bytes")]
    sign: &'a [u8],
    #[serde(with = "base64_bytes")]
    msg: &'a [u8],
}

/// Signing oracle reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpOracle {
    config: OracleConfig,
    client: reqwest::Client,
}

impl HttpOracle {
    /// Builds a client for the oracle described by `config`.
    pub fn new(config: OracleConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Config(format!("building oracle HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    async fn call<A: Serialize + ?Sized>(
        &self,
        endpoint: &Endpoint,
        args: Option<&A>,
    ) -> Result<Vec<u8>> {
        let url = self.config.endpoint_url(endpoint);
        let mut request = self.client.request(endpoint.http_method()?, &url);
        if let Some(args) = args {
            request = request.json(args);
        }

        debug!(%url, method = %endpoint.method, "calling signing oracle");
        let response = request
            .send()
            .await
            .map_err(|e| Error::OracleUnavailable(format!("{}: {}", url, e)))?;
        let envelope: OracleResponse = response
            .json()
            .await
            .map_err(|e| Error::OracleUnavailable(format!("{}: bad response body: {}", url, e)))?;

        envelope.into_data()
    }
}

#[async_trait]
impl SigningOracle for HttpOracle {
    async fn ping(&self) -> Result<()> {
        self.call::<()>(&self.config.ping, None).await.map(|_| ())
    }

    async fn create(&self) -> Result<String> {
        let data = self.call::<()>(&self.config.create, None).await?;
        let address = String::from_utf8(data)
            .map_err(|e| Error::Serialization(format!("oracle address is not UTF-8: {}", e)))?;
        if address.is_empty() {
            return Err(Error::OracleRejected {
                code: 200,
                message: "oracle returned an empty address".to_string(),
            });
        }
        Ok(address)
    }

    async fn exists(&self, address: &str) -> Result<bool> {
        let data = self
            .call(&self.config.exist, Some(&AddressArgs { address }))
            .await?;
        parse_flag(&data)
    }

    async fn sign(&self, address: &str, message: &[u8]) -> Result<SignatureInfo> {
        let data = self
            .call(
                &self.config.sign,
                Some(&SignArgs {
                    address,
                    msg: message,
                }),
            )
            .await?;
        let payload: SignPayload = serde_json::from_slice(&data)?;
        Ok(payload.into())
    }

    async fn verify(
        &self,
        address: &str,
        message: &[u8],
        signature: &SignatureInfo,
    ) -> Result<bool> {
        let encoded = serde_json::to_vec(&SignPayload::from(signature))?;
        let data = self
            .call(
                &self.config.verify,
                Some(&VerifyArgs {
                    address,
                    sign: &encoded,
                    msg: message,
                }),
            )
            .await?;
        parse_flag(&data)
    }
}
