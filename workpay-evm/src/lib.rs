//! EVM wallet providers and on-chain payment verification for workpay.
//!
//! Implements the chain-facing half of the payment core on the alloy stack:
//!
//! - [`contract`] - Minimal ERC-20 interface bindings
//! - [`verifier`] - Transaction-receipt inspection of USDC transfers
//! - [`wallet`] - Local-key and remote-custodial wallet providers

pub mod contract;
pub mod verifier;
pub mod wallet;

pub use verifier::OnChainVerifier;
pub use wallet::custodial::CustodialWallet;
pub use wallet::local::LocalWallet;
pub use wallet::wallet_from_config;
