//! The paying approval client.
//!
//! Drives the client half of the 402 flow for a job poster: submit the
//! review, and when the marketplace answers with a payment challenge,
//! validate it, check balances, pay through the configured wallet, and
//! resubmit with proof. Failures are classified into actionable
//! [`TransferFailure`]s before the transfer is ever attempted where
//! possible, so no gas is spent on a payment that cannot succeed.

use alloy_primitives::{TxHash, U256};
use url::Url;
use workpay::amount::UsdcAmount;
use workpay::classify::{self, FailureCode, TransferFailure, classify_transfer_error};
use workpay::networks::Network;
use workpay::proto::{ApprovalRequest, ErrorBody, PaymentRequiredBody, ReviewOutcome};
use workpay::requirement::{PaymentRequirement, RequirementError};
use workpay::wallet::{TransferRequest, WalletError, WalletProvider};

use crate::constants::{AGENT_ID_HEADER, HTTP_STATUS_PAYMENT_REQUIRED, PAYMENT_HEADER};

/// Errors from driving an approval to completion.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport failure talking to the marketplace.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The marketplace answered with a non-402 error.
    #[error("marketplace error (HTTP {status}): {message}")]
    Api {
        /// Response status code.
        status: u16,
        /// The error body's message, or the raw body when unparseable.
        message: String,
    },

    /// The 402 challenge body could not be parsed.
    #[error("unreadable payment challenge: {0}")]
    BadChallenge(#[from] serde_json::Error),

    /// The challenge parsed but fails validation.
    #[error("invalid payment requirement: {0}")]
    Requirement(#[from] RequirementError),

    /// The payment cannot be made, classified with remediation.
    #[error(transparent)]
    Transfer(Box<TransferFailure>),

    /// The wallet failed outside of the transfer itself.
    #[error("wallet: {0}")]
    Wallet(WalletError),

    /// The transfer settled on-chain but the marketplace still refused
    /// the proof. The money moved; do not pay again.
    #[error("payment sent ({tx_hash}) but the marketplace did not accept it: {reason}")]
    SentButUnverified {
        /// Hash of the settled transfer.
        tx_hash: TxHash,
        /// What the marketplace said on resubmission.
        reason: String,
    },
}

impl From<TransferFailure> for ClientError {
    fn from(failure: TransferFailure) -> Self {
        Self::Transfer(Box::new(failure))
    }
}

/// Client that reviews job completions and pays approval challenges.
pub struct ApprovalClient<W> {
    http: reqwest::Client,
    api_url: Url,
    agent_id: String,
    network: Network,
    wallet: W,
}

impl<W> std::fmt::Debug for ApprovalClient<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApprovalClient")
            .field("api_url", &self.api_url.as_str())
            .field("agent_id", &self.agent_id)
            .field("network", &self.network)
            .finish_non_exhaustive()
    }
}

impl<W: WalletProvider> ApprovalClient<W> {
    /// Creates a client acting as `agent_id` against the marketplace at
    /// `api_url`, paying on `network` through `wallet`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the HTTP client cannot be built.
    pub fn new(
        api_url: Url,
        agent_id: impl Into<String>,
        network: Network,
        wallet: W,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            api_url,
            agent_id: agent_id.into(),
            network,
            wallet,
        })
    }

    /// Approves a completed job, paying the 402 challenge if one comes back.
    ///
    /// # Errors
    ///
    /// See [`ClientError`]; in particular [`ClientError::SentButUnverified`]
    /// means money moved and the caller must not retry blindly.
    pub async fn approve(&self, job_id: &str) -> Result<ReviewOutcome, ClientError> {
        self.review(job_id, true).await
    }

    /// Rejects a completed job. No payment is involved.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] or [`ClientError::Http`] on failure.
    pub async fn reject(&self, job_id: &str) -> Result<ReviewOutcome, ClientError> {
        self.review(job_id, false).await
    }

    /// Submits a review, paying a challenge when approval requires it.
    ///
    /// # Errors
    ///
    /// See [`ClientError`].
    pub async fn review(&self, job_id: &str, approved: bool) -> Result<ReviewOutcome, ClientError> {
        let request = ApprovalRequest {
            job_id: job_id.to_owned(),
            approved,
        };

        let response = self.post_review(&request, None).await?;
        let status = response.status();

        if status.as_u16() != HTTP_STATUS_PAYMENT_REQUIRED {
            return match Self::into_outcome(response).await {
                Err(ClientError::Api { status, message }) => {
                    Err(self.classify_api_error(status, message))
                }
                other => other,
            };
        }

        let challenge = response.json::<PaymentRequiredBody>().await?;
        let tx_hash = self.pay(&challenge.payment).await?;

        let proof = format!("{tx_hash:?}");
        let retried = self.post_review(&request, Some(&proof)).await?;
        if retried.status().as_u16() == HTTP_STATUS_PAYMENT_REQUIRED {
            let reason = Self::error_message(retried).await;
            return Err(ClientError::SentButUnverified { tx_hash, reason });
        }
        match Self::into_outcome(retried).await {
            Ok(outcome) => Ok(outcome),
            Err(ClientError::Api { message, .. }) => Err(ClientError::SentButUnverified {
                tx_hash,
                reason: message,
            }),
            Err(other) => Err(other),
        }
    }

    /// Pays a validated challenge and returns the settled transaction hash.
    async fn pay(&self, requirement: &PaymentRequirement) -> Result<TxHash, ClientError> {
        requirement.validate()?;
        let required_units = requirement.required_units()?;
        let pay_to = requirement.pay_to_address()?;

        // validate() guarantees the chain id is present.
        let required_chain = requirement.chain_id.unwrap_or(requirement.chain.chain_id());
        if required_chain != self.network.chain_id() {
            return Err(
                TransferFailure::chain_mismatch(self.network.chain_id(), required_chain).into(),
            );
        }

        self.wallet.init().await.map_err(ClientError::Wallet)?;
        self.check_balances(requirement, required_units).await?;

        let tx_hash = self
            .wallet
            .send_usdc(TransferRequest {
                to: pay_to,
                amount: required_units,
                chain_id: required_chain,
            })
            .await
            .map_err(|e| self.classify_wallet_error(e))?;

        tracing::info!(
            tx_hash = %tx_hash,
            job_id = %requirement.metadata.job_id,
            amount = %requirement.display_amount(),
            "payment settled, resubmitting approval"
        );
        Ok(tx_hash)
    }

    /// Fails fast before spending gas on a transfer that cannot succeed.
    async fn check_balances(
        &self,
        requirement: &PaymentRequirement,
        required_units: U256,
    ) -> Result<(), ClientError> {
        let usdc = self
            .wallet
            .usdc_balance()
            .await
            .map_err(ClientError::Wallet)?;
        if usdc < required_units {
            let available = UsdcAmount::from_base_units(usdc).ok();
            return Err(TransferFailure::insufficient_usdc(
                Some(requirement.display_amount()),
                available,
                self.network,
            )
            .into());
        }

        let native = self
            .wallet
            .native_balance()
            .await
            .map_err(ClientError::Wallet)?;
        if native < classify::MIN_GAS_WEI {
            return Err(TransferFailure::insufficient_gas(Some(native), self.network).into());
        }
        Ok(())
    }

    /// Maps marketplace error bodies that describe a settled payment onto
    /// the classified already-paid failure; everything else stays an API
    /// error.
    fn classify_api_error(&self, status: u16, message: String) -> ClientError {
        let failure = classify_transfer_error(&message, self.network);
        if failure.code == FailureCode::AlreadyPaid {
            return failure.into();
        }
        ClientError::Api { status, message }
    }

    fn classify_wallet_error(&self, error: WalletError) -> ClientError {
        match error {
            WalletError::ChainMismatch {
                wallet_chain_id,
                required_chain_id,
            } => TransferFailure::chain_mismatch(wallet_chain_id, required_chain_id).into(),
            WalletError::Transfer(raw) => classify_transfer_error(&raw, self.network).into(),
            other => ClientError::Wallet(other),
        }
    }

    async fn post_review(
        &self,
        request: &ApprovalRequest,
        proof: Option<&str>,
    ) -> Result<reqwest::Response, ClientError> {
        let url = self
            .api_url
            .join("approve")
            .map_err(|e| ClientError::Api {
                status: 0,
                message: format!("bad api url: {e}"),
            })?;
        let mut builder = self
            .http
            .post(url)
            .header(AGENT_ID_HEADER, &self.agent_id)
            .json(request);
        if let Some(proof) = proof {
            builder = builder.header(PAYMENT_HEADER, proof);
        }
        Ok(builder.send().await?)
    }

    async fn into_outcome(response: reqwest::Response) -> Result<ReviewOutcome, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let message = Self::error_message(response).await;
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json::<ReviewOutcome>().await?)
    }

    async fn error_message(response: reqwest::Response) -> String {
        let status = response.status();
        match response.text().await {
            Ok(body) => match serde_json::from_str::<ErrorBody>(&body) {
                Ok(parsed) => parsed.error,
                Err(_) if !body.is_empty() => body,
                Err(_) => format!("HTTP {status}"),
            },
            Err(_) => format!("HTTP {status}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use alloy_primitives::{Address, address};
    use async_trait::async_trait;
    use serde_json::json;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use workpay::wallet::WalletKind;

    const PAY_TO: Address = address!("2222222222222222222222222222222222222222");
    const TX: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    struct MockWallet {
        usdc: U256,
        native: U256,
        sends: AtomicUsize,
    }

    impl MockWallet {
        fn funded() -> Self {
            Self {
                usdc: U256::from(100_000_000u64),
                native: U256::from(1_000_000_000_000_000_000u128),
                sends: AtomicUsize::new(0),
            }
        }

        fn send_count(&self) -> usize {
            self.sends.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WalletProvider for MockWallet {
        fn kind(&self) -> WalletKind {
            WalletKind::Local
        }

        fn address(&self) -> Result<Address, WalletError> {
            Ok(Address::ZERO)
        }

        async fn init(&self) -> Result<(), WalletError> {
            Ok(())
        }

        async fn send_usdc(&self, _request: TransferRequest) -> Result<TxHash, WalletError> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            Ok(TX.parse().unwrap())
        }

        async fn usdc_balance(&self) -> Result<U256, WalletError> {
            Ok(self.usdc)
        }

        async fn native_balance(&self) -> Result<U256, WalletError> {
            Ok(self.native)
        }
    }

    fn challenge_body(amount: &str) -> serde_json::Value {
        let requirement = PaymentRequirement::build(
            Network::BaseSepolia,
            PAY_TO,
            &amount.parse::<UsdcAmount>().unwrap(),
            "J1",
            "Payment for job J1",
        )
        .unwrap();
        serde_json::to_value(PaymentRequiredBody::new(requirement)).unwrap()
    }

    fn approval_body() -> serde_json::Value {
        json!({
            "approved": true,
            "job_id": "J1",
            "payment_tx_hash": TX,
            "amount_usdc": "10.5",
            "paid_to": format!("{PAY_TO:?}"),
            "message": "Completion approved, payment settled",
        })
    }

    fn client<'a>(server: &MockServer, wallet: &'a MockWallet) -> ApprovalClient<&'a MockWallet> {
        ApprovalClient::new(
            Url::parse(&server.uri()).unwrap(),
            "agent-1",
            Network::BaseSepolia,
            wallet,
        )
        .unwrap()
    }

    #[async_trait]
    impl WalletProvider for &MockWallet {
        fn kind(&self) -> WalletKind {
            (**self).kind()
        }

        fn address(&self) -> Result<Address, WalletError> {
            (**self).address()
        }

        async fn init(&self) -> Result<(), WalletError> {
            (**self).init().await
        }

        async fn send_usdc(&self, request: TransferRequest) -> Result<TxHash, WalletError> {
            (**self).send_usdc(request).await
        }

        async fn usdc_balance(&self) -> Result<U256, WalletError> {
            (**self).usdc_balance().await
        }

        async fn native_balance(&self) -> Result<U256, WalletError> {
            (**self).native_balance().await
        }
    }

    #[tokio::test]
    async fn pays_challenge_and_resubmits_with_proof() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/approve"))
            .and(header_exists("x-payment"))
            .and(header("x-payment", TX))
            .respond_with(ResponseTemplate::new(200).set_body_json(approval_body()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/approve"))
            .respond_with(
                ResponseTemplate::new(402).set_body_json(challenge_body("10.5")),
            )
            .with_priority(10)
            .mount(&server)
            .await;

        let wallet = MockWallet::funded();
        let outcome = client(&server, &wallet).approve("J1").await.unwrap();
        assert_eq!(wallet.send_count(), 1);
        match outcome {
            ReviewOutcome::Approved(receipt) => {
                assert!(receipt.approved);
                assert_eq!(receipt.payment_tx_hash, TX);
            }
            ReviewOutcome::Rejected(_) => panic!("expected approval"),
        }
    }

    #[tokio::test]
    async fn already_settled_job_classifies_as_already_paid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/approve"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "error": "This job has already been paid",
            })))
            .mount(&server)
            .await;

        let wallet = MockWallet::funded();
        let err = client(&server, &wallet).approve("J1").await.unwrap_err();
        assert_eq!(wallet.send_count(), 0);
        match err {
            ClientError::Transfer(failure) => {
                assert_eq!(failure.code, FailureCode::AlreadyPaid);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn succeeds_without_paying_when_no_challenge_comes_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/approve"))
            .respond_with(ResponseTemplate::new(200).set_body_json(approval_body()))
            .mount(&server)
            .await;

        let wallet = MockWallet::funded();
        client(&server, &wallet).approve("J1").await.unwrap();
        assert_eq!(wallet.send_count(), 0);
    }

    #[tokio::test]
    async fn insufficient_usdc_fails_before_any_transfer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/approve"))
            .respond_with(
                ResponseTemplate::new(402).set_body_json(challenge_body("10.5")),
            )
            .mount(&server)
            .await;

        let wallet = MockWallet {
            usdc: U256::from(1_000_000u64),
            ..MockWallet::funded()
        };
        let err = client(&server, &wallet).approve("J1").await.unwrap_err();
        assert_eq!(wallet.send_count(), 0);
        match err {
            ClientError::Transfer(failure) => {
                assert_eq!(failure.code, FailureCode::InsufficientUsdc);
                assert_eq!(failure.available.as_deref(), Some("1.00 USDC"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn insufficient_gas_fails_before_any_transfer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/approve"))
            .respond_with(
                ResponseTemplate::new(402).set_body_json(challenge_body("10.5")),
            )
            .mount(&server)
            .await;

        let wallet = MockWallet {
            native: U256::from(1u64),
            ..MockWallet::funded()
        };
        let err = client(&server, &wallet).approve("J1").await.unwrap_err();
        assert_eq!(wallet.send_count(), 0);
        match err {
            ClientError::Transfer(failure) => {
                assert_eq!(failure.code, FailureCode::InsufficientGas);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn chain_mismatch_fails_before_any_transfer() {
        let server = MockServer::start().await;
        let requirement = PaymentRequirement::build(
            Network::Base,
            PAY_TO,
            &"10.5".parse::<UsdcAmount>().unwrap(),
            "J1",
            "Payment for job J1",
        )
        .unwrap();
        Mock::given(method("POST"))
            .and(path("/approve"))
            .respond_with(
                ResponseTemplate::new(402)
                    .set_body_json(serde_json::to_value(PaymentRequiredBody::new(requirement)).unwrap()),
            )
            .mount(&server)
            .await;

        let wallet = MockWallet::funded();
        let err = client(&server, &wallet).approve("J1").await.unwrap_err();
        assert_eq!(wallet.send_count(), 0);
        match err {
            ClientError::Transfer(failure) => {
                assert_eq!(failure.code, FailureCode::ChainMismatch);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn repeated_402_after_payment_reports_sent_but_unverified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/approve"))
            .respond_with(
                ResponseTemplate::new(402).set_body_json(challenge_body("10.5")),
            )
            .mount(&server)
            .await;

        let wallet = MockWallet::funded();
        let err = client(&server, &wallet).approve("J1").await.unwrap_err();
        assert_eq!(wallet.send_count(), 1);
        match err {
            ClientError::SentButUnverified { tx_hash, .. } => {
                assert_eq!(tx_hash, TX.parse::<TxHash>().unwrap());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn non_402_error_is_surfaced_as_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/approve"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({ "error": "Job not found" })),
            )
            .mount(&server)
            .await;

        let wallet = MockWallet::funded();
        let err = client(&server, &wallet).approve("missing").await.unwrap_err();
        match err {
            ClientError::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Job not found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
