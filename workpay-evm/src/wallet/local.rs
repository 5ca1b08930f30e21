//! Local private-key wallet talking directly to a chain RPC endpoint.

use alloy_network::EthereumWallet;
use alloy_primitives::{Address, TxHash, U256};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use url::Url;
use workpay::networks::Network;
use workpay::wallet::{TransferRequest, WalletError, WalletKind, WalletProvider};

use crate::contract::IERC20;

/// Wallet backed by a private key held in process memory.
///
/// The key is parsed once at construction and never leaves the signer.
/// All reads and writes go through a single HTTP provider against the
/// network's RPC endpoint.
#[derive(Debug)]
pub struct LocalWallet {
    address: Address,
    network: Network,
    provider: DynProvider,
}

impl LocalWallet {
    /// Parses the private key and connects a signing provider.
    ///
    /// Uses the network's default RPC endpoint unless `rpc_url` overrides it.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::Credentials`] for an unparseable key and
    /// [`WalletError::Config`] for a malformed default RPC URL.
    pub fn connect(
        private_key: &str,
        network: Network,
        rpc_url: Option<Url>,
    ) -> Result<Self, WalletError> {
        let signer = private_key
            .trim()
            .parse::<PrivateKeySigner>()
            .map_err(|e| WalletError::Credentials(format!("invalid private key: {e}")))?;
        let address = signer.address();

        let rpc_url = match rpc_url {
            Some(url) => url,
            None => Url::parse(network.default_rpc_url())
                .map_err(|e| WalletError::Config(format!("rpc url: {e}")))?,
        };

        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(rpc_url)
            .erased();

        Ok(Self {
            address,
            network,
            provider,
        })
    }

    /// The network this wallet pays on.
    #[must_use]
    pub fn network(&self) -> Network {
        self.network
    }
}

#[async_trait]
impl WalletProvider for LocalWallet {
    fn kind(&self) -> WalletKind {
        WalletKind::Local
    }

    fn address(&self) -> Result<Address, WalletError> {
        Ok(self.address)
    }

    async fn init(&self) -> Result<(), WalletError> {
        Ok(())
    }

    async fn send_usdc(&self, request: TransferRequest) -> Result<TxHash, WalletError> {
        if request.chain_id != self.network.chain_id() {
            return Err(WalletError::ChainMismatch {
                wallet_chain_id: self.network.chain_id(),
                required_chain_id: request.chain_id,
            });
        }

        let usdc = IERC20::new(self.network.usdc_address(), &self.provider);
        let pending = usdc
            .transfer(request.to, request.amount)
            .send()
            .await
            .map_err(|e| WalletError::Transfer(e.to_string()))?;
        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| WalletError::Transfer(e.to_string()))?;

        if !receipt.status() {
            return Err(WalletError::Transfer(format!(
                "transfer reverted on-chain: {}",
                receipt.transaction_hash
            )));
        }

        tracing::info!(
            tx_hash = %receipt.transaction_hash,
            to = %request.to,
            amount = %request.amount,
            network = %self.network.as_str(),
            "USDC transfer confirmed"
        );
        Ok(receipt.transaction_hash)
    }

    async fn usdc_balance(&self) -> Result<U256, WalletError> {
        let usdc = IERC20::new(self.network.usdc_address(), &self.provider);
        usdc.balanceOf(self.address)
            .call()
            .await
            .map_err(|e| WalletError::Balance(e.to_string()))
    }

    async fn native_balance(&self) -> Result<U256, WalletError> {
        self.provider
            .get_balance(self.address)
            .await
            .map_err(|e| WalletError::Balance(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn connect_derives_address_from_key() {
        let wallet = LocalWallet::connect(TEST_KEY, Network::BaseSepolia, None).unwrap();
        assert_eq!(
            wallet.address().unwrap(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
                .parse::<Address>()
                .unwrap()
        );
        assert_eq!(wallet.kind(), WalletKind::Local);
    }

    #[test]
    fn connect_rejects_garbage_key() {
        let err = LocalWallet::connect("not-a-key", Network::BaseSepolia, None).unwrap_err();
        assert!(matches!(err, WalletError::Credentials(_)));
    }

    #[tokio::test]
    async fn send_usdc_refuses_wrong_chain() {
        let wallet = LocalWallet::connect(TEST_KEY, Network::BaseSepolia, None).unwrap();
        let err = wallet
            .send_usdc(TransferRequest {
                to: Address::ZERO,
                amount: U256::from(1u64),
                chain_id: workpay::networks::BASE_MAINNET,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WalletError::ChainMismatch {
                wallet_chain_id: 84532,
                required_chain_id: 8453,
            }
        ));
    }
}
