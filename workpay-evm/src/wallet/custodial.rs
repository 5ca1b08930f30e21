//! Remote custodial wallet backed by a managed signing service.
//!
//! The service holds the key; we hold an API key pair. Wallets are
//! provisioned (or re-attached by id) during [`WalletProvider::init`],
//! transfers are submitted over REST and polled until the service reports
//! them mined. Amounts cross the wire as strings: base units for transfer
//! requests, display units for balance responses.

use std::str::FromStr;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use alloy_primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use url::Url;
use workpay::amount::UsdcAmount;
use workpay::networks::Network;
use workpay::wallet::{TransferRequest, WalletError, WalletKind, WalletProvider};

const POLL_INTERVAL: Duration = Duration::from_secs(2);
const MAX_POLL_ATTEMPTS: u32 = 30;
const WEI_PER_ETH: u128 = 1_000_000_000_000_000_000;

/// Wallet whose key lives in a remote custodial signing service.
///
/// Holds no key material locally. The wallet id and address are resolved
/// during [`WalletProvider::init`]; a configured id re-attaches to an
/// existing wallet, otherwise the service provisions a fresh one.
#[derive(Debug)]
pub struct CustodialWallet {
    http: reqwest::Client,
    base_url: Url,
    api_key_id: String,
    api_key_secret: String,
    network: Network,
    configured_wallet_id: Option<String>,
    session: RwLock<Option<Session>>,
}

#[derive(Debug, Clone)]
struct Session {
    wallet_id: String,
    address: Address,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateWalletBody {
    chain_id: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WalletResponse {
    wallet_id: String,
    address: String,
}

#[derive(Debug, Deserialize)]
struct BalancesResponse {
    balances: Vec<AssetBalance>,
}

#[derive(Debug, Deserialize)]
struct AssetBalance {
    asset: String,
    /// Display-unit decimal string, e.g. `"12.5"` USDC or `"0.0002"` ETH.
    amount: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TransferBody {
    to: String,
    /// Base-unit amount as a decimal string.
    amount: String,
    asset: &'static str,
    chain_id: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransferResponse {
    transfer_id: String,
    status: String,
    #[serde(default)]
    tx_hash: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl CustodialWallet {
    /// Creates a client for the signing service at `service_url`.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::Config`] if the HTTP client cannot be built.
    pub fn new(
        service_url: Url,
        api_key_id: String,
        api_key_secret: String,
        wallet_id: Option<String>,
        network: Network,
    ) -> Result<Self, WalletError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| WalletError::Config(format!("http client: {e}")))?;
        Ok(Self {
            http,
            base_url: service_url,
            api_key_id,
            api_key_secret,
            network,
            configured_wallet_id: wallet_id,
            session: RwLock::new(None),
        })
    }

    /// The provisioned wallet id, once [`WalletProvider::init`] has run.
    ///
    /// Callers persist this back into their configuration so later runs
    /// re-attach to the same wallet instead of provisioning a new one.
    #[must_use]
    pub fn wallet_id(&self) -> Option<String> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|s| s.wallet_id.clone())
    }

    fn endpoint(&self, path: &str) -> Result<Url, WalletError> {
        self.base_url
            .join(path)
            .map_err(|e| WalletError::Config(format!("service url: {e}")))
    }

    fn session(&self) -> Result<Session, WalletError> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(WalletError::NotInitialized)
    }

    fn store_session(&self, response: WalletResponse) -> Result<(), WalletError> {
        let address = response
            .address
            .parse::<Address>()
            .map_err(|e| WalletError::Credentials(format!("service returned bad address: {e}")))?;
        let mut guard = self.session.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(Session {
            wallet_id: response.wallet_id,
            address,
        });
        Ok(())
    }

    async fn fetch_wallet(&self, wallet_id: &str) -> Result<WalletResponse, WalletError> {
        let url = self.endpoint(&format!("v1/wallets/{wallet_id}"))?;
        let resp = self
            .http
            .get(url)
            .basic_auth(&self.api_key_id, Some(&self.api_key_secret))
            .send()
            .await
            .map_err(|e| WalletError::Credentials(format!("wallet lookup: {e}")))?;
        Self::credentials_checked(resp, "wallet lookup")?
            .json::<WalletResponse>()
            .await
            .map_err(|e| WalletError::Credentials(format!("wallet lookup: {e}")))
    }

    async fn provision_wallet(&self) -> Result<WalletResponse, WalletError> {
        let url = self.endpoint("v1/wallets")?;
        let resp = self
            .http
            .post(url)
            .basic_auth(&self.api_key_id, Some(&self.api_key_secret))
            .json(&CreateWalletBody {
                chain_id: self.network.chain_id(),
            })
            .send()
            .await
            .map_err(|e| WalletError::Credentials(format!("wallet provisioning: {e}")))?;
        Self::credentials_checked(resp, "wallet provisioning")?
            .json::<WalletResponse>()
            .await
            .map_err(|e| WalletError::Credentials(format!("wallet provisioning: {e}")))
    }

    fn credentials_checked(
        resp: reqwest::Response,
        what: &str,
    ) -> Result<reqwest::Response, WalletError> {
        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(WalletError::Credentials(format!(
                "{what}: service rejected API key (HTTP {status})"
            )));
        }
        if !status.is_success() {
            return Err(WalletError::Credentials(format!("{what}: HTTP {status}")));
        }
        Ok(resp)
    }

    async fn asset_balance(&self, asset: &str) -> Result<Option<Decimal>, WalletError> {
        let session = self.session()?;
        let url = self.endpoint(&format!("v1/wallets/{}/balances", session.wallet_id))?;
        let resp = self
            .http
            .get(url)
            .basic_auth(&self.api_key_id, Some(&self.api_key_secret))
            .send()
            .await
            .map_err(|e| WalletError::Balance(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(WalletError::Balance(format!(
                "balance query: HTTP {}",
                resp.status()
            )));
        }
        let balances = resp
            .json::<BalancesResponse>()
            .await
            .map_err(|e| WalletError::Balance(e.to_string()))?;
        balances
            .balances
            .iter()
            .find(|b| b.asset.eq_ignore_ascii_case(asset))
            .map(|b| {
                Decimal::from_str(&b.amount)
                    .map_err(|e| WalletError::Balance(format!("bad {asset} amount: {e}")))
            })
            .transpose()
    }

    async fn poll_transfer(
        &self,
        wallet_id: &str,
        transfer_id: &str,
    ) -> Result<TxHash, WalletError> {
        let url = self.endpoint(&format!("v1/wallets/{wallet_id}/transfers/{transfer_id}"))?;
        for _ in 0..MAX_POLL_ATTEMPTS {
            let transfer = self
                .http
                .get(url.clone())
                .basic_auth(&self.api_key_id, Some(&self.api_key_secret))
                .send()
                .await
                .map_err(|e| WalletError::Transfer(e.to_string()))?
                .json::<TransferResponse>()
                .await
                .map_err(|e| WalletError::Transfer(e.to_string()))?;

            match transfer.status.as_str() {
                "complete" => {
                    let raw = transfer.tx_hash.ok_or_else(|| {
                        WalletError::Transfer(
                            "transfer completed without a transaction hash".to_owned(),
                        )
                    })?;
                    return raw
                        .parse::<TxHash>()
                        .map_err(|e| WalletError::Transfer(format!("bad tx hash: {e}")));
                }
                "failed" => {
                    return Err(WalletError::Transfer(
                        transfer.error.unwrap_or_else(|| "transfer failed".to_owned()),
                    ));
                }
                _ => tokio::time::sleep(POLL_INTERVAL).await,
            }
        }
        Err(WalletError::Transfer(format!(
            "transfer {transfer_id} did not settle within {MAX_POLL_ATTEMPTS} attempts"
        )))
    }
}

#[async_trait]
impl WalletProvider for CustodialWallet {
    fn kind(&self) -> WalletKind {
        WalletKind::Custodial
    }

    fn address(&self) -> Result<Address, WalletError> {
        Ok(self.session()?.address)
    }

    async fn init(&self) -> Result<(), WalletError> {
        if self
            .session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
        {
            return Ok(());
        }
        let wallet = match &self.configured_wallet_id {
            Some(id) => self.fetch_wallet(id).await?,
            None => {
                let wallet = self.provision_wallet().await?;
                tracing::info!(
                    wallet_id = %wallet.wallet_id,
                    address = %wallet.address,
                    "provisioned custodial wallet"
                );
                wallet
            }
        };
        self.store_session(wallet)
    }

    async fn send_usdc(&self, request: TransferRequest) -> Result<TxHash, WalletError> {
        if request.chain_id != self.network.chain_id() {
            return Err(WalletError::ChainMismatch {
                wallet_chain_id: self.network.chain_id(),
                required_chain_id: request.chain_id,
            });
        }
        let session = self.session()?;

        let url = self.endpoint(&format!("v1/wallets/{}/transfers", session.wallet_id))?;
        let resp = self
            .http
            .post(url)
            .basic_auth(&self.api_key_id, Some(&self.api_key_secret))
            .json(&TransferBody {
                to: format!("{:?}", request.to),
                amount: request.amount.to_string(),
                asset: "usdc",
                chain_id: request.chain_id,
            })
            .send()
            .await
            .map_err(|e| WalletError::Transfer(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(WalletError::Transfer(format!(
                "transfer submission: HTTP {}",
                resp.status()
            )));
        }
        let submitted = resp
            .json::<TransferResponse>()
            .await
            .map_err(|e| WalletError::Transfer(e.to_string()))?;

        let tx_hash = self
            .poll_transfer(&session.wallet_id, &submitted.transfer_id)
            .await?;
        tracing::info!(
            tx_hash = %tx_hash,
            to = %request.to,
            amount = %request.amount,
            "custodial USDC transfer settled"
        );
        Ok(tx_hash)
    }

    async fn usdc_balance(&self) -> Result<U256, WalletError> {
        match self.asset_balance("usdc").await? {
            Some(display) => {
                let amount = UsdcAmount::new(display)
                    .map_err(|e| WalletError::Balance(e.to_string()))?;
                amount
                    .to_base_units()
                    .map_err(|e| WalletError::Balance(e.to_string()))
            }
            None => Ok(U256::ZERO),
        }
    }

    async fn native_balance(&self) -> Result<U256, WalletError> {
        match self.asset_balance("eth").await? {
            Some(display) => {
                let wei = (display * Decimal::from(WEI_PER_ETH))
                    .trunc()
                    .to_u128()
                    .ok_or_else(|| {
                        WalletError::Balance("eth balance out of range".to_owned())
                    })?;
                Ok(U256::from(wei))
            }
            None => Ok(U256::ZERO),
        }
    }
}
