//! Wallet provider capability trait.
//!
//! A wallet is a signing identity that can report balances and submit a
//! USDC transfer. Two implementations live in `workpay-evm`: a local-key
//! wallet talking straight to a chain RPC endpoint, and a remote custodial
//! wallet backed by a managed signing service. Both expose identical
//! success/failure semantics so callers stay implementation-agnostic.

use alloy_primitives::{Address, TxHash, U256};
use async_trait::async_trait;

/// Which implementation backs a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletKind {
    /// Private key held in process memory, direct RPC access.
    Local,
    /// Remote custodial signing service.
    Custodial,
}

/// Errors surfaced by wallet operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum WalletError {
    /// The wallet requires [`WalletProvider::init`] before use.
    #[error("wallet not initialized; call init() first")]
    NotInitialized,

    /// The wallet cannot pay on the requested chain.
    #[error("wallet is on chain {wallet_chain_id}, payment requires chain {required_chain_id}")]
    ChainMismatch {
        /// Chain the wallet is configured for.
        wallet_chain_id: u64,
        /// Chain the payment requires.
        required_chain_id: u64,
    },

    /// The signing key or credentials were rejected.
    #[error("wallet credentials rejected: {0}")]
    Credentials(String),

    /// The wallet configuration is unusable (bad URL, missing secret).
    #[error("wallet configuration: {0}")]
    Config(String),

    /// A transfer failed to submit or reverted on-chain.
    #[error("transfer failed: {0}")]
    Transfer(String),

    /// A balance query failed.
    #[error("balance query failed: {0}")]
    Balance(String),
}

/// Parameters of a USDC transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferRequest {
    /// Recipient address.
    pub to: Address,
    /// Amount in base units.
    pub amount: U256,
    /// Chain the transfer must settle on.
    pub chain_id: u64,
}

/// A signing identity that can report balances and submit a transfer.
///
/// Construction does not guarantee the address is known: custodial wallets
/// resolve it remotely, so [`init`](WalletProvider::init) is an explicit,
/// separately awaited step. Local wallets treat it as a no-op.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Which implementation backs this wallet.
    fn kind(&self) -> WalletKind;

    /// The wallet's address.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::NotInitialized`] before [`init`](WalletProvider::init)
    /// completes on providers that resolve the address remotely.
    fn address(&self) -> Result<Address, WalletError>;

    /// Prepares the wallet for use. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::Credentials`] if the backing service rejects
    /// the configured credentials.
    async fn init(&self) -> Result<(), WalletError>;

    /// Submits a USDC transfer and waits until it is settled.
    ///
    /// Returns the transaction hash of the mined transfer. A transfer whose
    /// receipt indicates a revert is an error, not a hash.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::ChainMismatch`] without submitting anything
    /// if `request.chain_id` is not the wallet's chain, or
    /// [`WalletError::Transfer`] on submission/revert failures.
    async fn send_usdc(&self, request: TransferRequest) -> Result<TxHash, WalletError>;

    /// Current USDC balance in base units.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::Balance`] if the query fails.
    async fn usdc_balance(&self) -> Result<U256, WalletError>;

    /// Current native-token balance in wei, for gas estimation context.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::Balance`] if the query fails.
    async fn native_balance(&self) -> Result<U256, WalletError>;
}

#[async_trait]
impl<T: WalletProvider + ?Sized> WalletProvider for Box<T> {
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
