//! Receipt verification against a remote facilitator service.
//!
//! A facilitator receipt is an opaque signed blob only the issuing service
//! can check. [`FacilitatorClient`] posts the receipt plus the expected
//! payment parameters to the facilitator's `/verify` endpoint and maps its
//! attestation to a [`Verification`].

use std::time::Duration;

use alloy_primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;
use workpay::networks::Network;
use workpay::verify::{ReceiptVerifier, Verification, VerifyFault};

use crate::error::HttpError;

const VERIFY_TIMEOUT: Duration = Duration::from_secs(15);

/// HTTP client for a facilitator's receipt verification endpoint.
#[derive(Debug, Clone)]
pub struct FacilitatorClient {
    http: reqwest::Client,
    base_url: Url,
    network: Network,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyRequest<'a> {
    receipt: &'a str,
    expected: ExpectedPayment,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExpectedPayment {
    pay_to: String,
    /// Base-unit amount as a decimal string.
    amount: String,
    asset: String,
    chain_id: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyResponse {
    verified: bool,
    #[serde(default)]
    tx_hash: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl FacilitatorClient {
    /// Creates a client for the facilitator at `base_url`, verifying
    /// receipts for payments on `network`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Client`] if the HTTP client cannot be built.
    pub fn new(base_url: Url, network: Network) -> Result<Self, HttpError> {
        let http = reqwest::Client::builder()
            .timeout(VERIFY_TIMEOUT)
            .build()
            .map_err(|e| HttpError::Client(e.to_string()))?;
        Ok(Self {
            http,
            base_url,
            network,
        })
    }
}

#[async_trait]
impl ReceiptVerifier for FacilitatorClient {
    async fn verify_receipt(
        &self,
        receipt: &str,
        expected_to: Address,
        required_units: U256,
    ) -> Result<Verification, VerifyFault> {
        let url = self
            .base_url
            .join("verify")
            .map_err(|e| VerifyFault::Facilitator(e.to_string()))?;
        let request = VerifyRequest {
            receipt,
            expected: ExpectedPayment {
                pay_to: format!("{expected_to:?}"),
                amount: required_units.to_string(),
                asset: format!("{:?}", self.network.usdc_address()),
                chain_id: self.network.chain_id(),
            },
        };

        let resp = self
            .http
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| VerifyFault::Facilitator(e.to_string()))?;

        let status = resp.status();
        if status.is_server_error() {
            return Err(VerifyFault::Facilitator(format!(
                "facilitator returned HTTP {status}"
            )));
        }
        if !status.is_success() {
            return Ok(Verification::rejected(format!(
                "Facilitator rejected receipt (HTTP {status})"
            )));
        }

        let attestation = resp
            .json::<VerifyResponse>()
            .await
            .map_err(|e| VerifyFault::Facilitator(e.to_string()))?;

        let tx_hash = attestation
            .tx_hash
            .as_deref()
            .and_then(|raw| raw.parse::<TxHash>().ok());

        if attestation.verified {
            tracing::info!(
                to = %expected_to,
                amount = %required_units,
                tx_hash = ?tx_hash,
                "facilitator attested receipt"
            );
            Ok(Verification {
                verified: true,
                tx_hash,
                from: None,
                to: Some(expected_to),
                amount: Some(required_units),
                error: None,
            })
        } else {
            let reason = attestation
                .error
                .unwrap_or_else(|| "Receipt not verified".to_owned());
            let mut rejection = Verification::rejected(reason);
            rejection.tx_hash = tx_hash;
            Ok(rejection)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAY_TO: &str = "0x2222222222222222222222222222222222222222";

    fn client(server: &MockServer) -> FacilitatorClient {
        FacilitatorClient::new(Url::parse(&server.uri()).unwrap(), Network::BaseSepolia).unwrap()
    }

    #[tokio::test]
    async fn positive_attestation_verifies() {
        let server = MockServer::start().await;
        let tx = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
        Mock::given(method("POST"))
            .and(path("/verify"))
            .and(body_partial_json(json!({
                "receipt": "blob-1",
                "expected": { "chainId": 84532, "amount": "10500000" },
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "verified": true, "txHash": tx })),
            )
            .mount(&server)
            .await;

        let verification = client(&server)
            .verify_receipt("blob-1", PAY_TO.parse().unwrap(), U256::from(10_500_000u64))
            .await
            .unwrap();
        assert!(verification.verified);
        assert_eq!(verification.tx_hash, Some(tx.parse().unwrap()));
    }

    #[tokio::test]
    async fn negative_attestation_carries_reason() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/verify"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "verified": false,
                "error": "amount below required",
            })))
            .mount(&server)
            .await;

        let verification = client(&server)
            .verify_receipt("blob-2", PAY_TO.parse().unwrap(), U256::from(1u64))
            .await
            .unwrap();
        assert!(!verification.verified);
        assert_eq!(verification.error.as_deref(), Some("amount below required"));
    }

    #[tokio::test]
    async fn server_error_is_a_retryable_fault() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/verify"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client(&server)
            .verify_receipt("blob-3", PAY_TO.parse().unwrap(), U256::from(1u64))
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyFault::Facilitator(_)));
    }
}
