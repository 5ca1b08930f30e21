//! Transfer failure classification.
//!
//! Raw transfer and chain errors arrive as free-text messages from RPC
//! nodes, token contracts, and signing services. This module maps them into
//! a closed taxonomy with enough structured context (amounts, network,
//! faucet and explorer links) for an operator to act without reading logs.
//!
//! Classification is by known substring patterns; anything unrecognized
//! lands in the generic [`FailureCode::Unknown`] bucket. A failure is never
//! silently reclassified as success.

use std::fmt;

use alloy_primitives::{TxHash, U256};

use crate::amount::UsdcAmount;
use crate::networks::Network;

/// Minimum native balance assumed necessary for gas, in wei (0.0001 ETH).
pub const MIN_GAS_WEI: U256 = U256::from_limbs([100_000_000_000_000u64, 0, 0, 0]);

/// The closed set of transfer failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCode {
    /// Not enough native token to cover gas.
    InsufficientGas,
    /// Not enough USDC to cover the payment.
    InsufficientUsdc,
    /// Wallet chain differs from the requirement's chain.
    ChainMismatch,
    /// The transaction reverted on-chain.
    Reverted,
    /// RPC or network fault, including timeouts.
    Rpc,
    /// The job was already settled by an earlier transfer.
    AlreadyPaid,
    /// No known pattern matched.
    Unknown,
}

/// A classified transfer failure with remediation context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferFailure {
    /// The failure class.
    pub code: FailureCode,
    /// Human-readable description.
    pub message: String,
    /// Network the failure occurred on.
    pub network: Option<Network>,
    /// Required amount, formatted for display.
    pub required: Option<String>,
    /// Available amount, formatted for display.
    pub available: Option<String>,
    /// Transaction hash, when one exists.
    pub tx_hash: Option<TxHash>,
    /// Suggested next step.
    pub remediation: Option<String>,
}

impl TransferFailure {
    fn new(code: FailureCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            network: None,
            required: None,
            available: None,
            tx_hash: None,
            remediation: None,
        }
    }

    /// Not enough native token for gas.
    #[must_use]
    pub fn insufficient_gas(available_wei: Option<U256>, network: Network) -> Self {
        let available = available_wei.map(format_eth).unwrap_or_else(|| "0".to_owned());
        let remediation = match network.eth_faucet() {
            Some(faucet) => format!("Get testnet ETH from: {faucet}"),
            None => "Add ETH to your wallet for gas fees".to_owned(),
        };
        Self {
            required: Some("~0.0001 ETH (for gas)".to_owned()),
            available: Some(format!("{available} ETH")),
            remediation: Some(remediation),
            network: Some(network),
            ..Self::new(
                FailureCode::InsufficientGas,
                format!("Insufficient ETH for gas fees. Available: {available} ETH"),
            )
        }
    }

    /// Not enough USDC for the payment.
    #[must_use]
    pub fn insufficient_usdc(
        required: Option<UsdcAmount>,
        available: Option<UsdcAmount>,
        network: Network,
    ) -> Self {
        let message = match (required, available) {
            (Some(need), Some(have)) => {
                format!("Insufficient USDC balance. Need {need} USDC, have {have} USDC")
            }
            _ => "Insufficient USDC balance for this payment".to_owned(),
        };
        let remediation = match network.usdc_faucet() {
            Some(faucet) => format!("Get testnet USDC from: {faucet}"),
            None => "Add USDC to your wallet".to_owned(),
        };
        Self {
            required: required.map(|a| format!("{a} USDC")),
            available: available.map(|a| format!("{a} USDC")),
            remediation: Some(remediation),
            network: Some(network),
            ..Self::new(FailureCode::InsufficientUsdc, message)
        }
    }

    /// Wallet configured for a different chain than the requirement.
    #[must_use]
    pub fn chain_mismatch(wallet_chain_id: u64, required_chain_id: u64) -> Self {
        let wallet_name = Network::name_for_chain_id(wallet_chain_id);
        let required_name = Network::name_for_chain_id(required_chain_id);
        Self {
            network: Network::from_chain_id(required_chain_id),
            remediation: Some(format!("Reconfigure the wallet for {required_name}")),
            ..Self::new(
                FailureCode::ChainMismatch,
                format!(
                    "Chain mismatch: wallet is on {wallet_name}, but payment requires {required_name}"
                ),
            )
        }
    }

    /// The job was already settled.
    #[must_use]
    pub fn already_paid(tx_hash: Option<TxHash>, network: Option<Network>) -> Self {
        let remediation = match (tx_hash, network) {
            (Some(hash), Some(net)) => Some(format!(
                "View transaction: {}",
                net.explorer_tx_url(format!("{hash:?}"))
            )),
            (Some(hash), None) => Some(format!("Transaction hash: {hash:?}")),
            _ => None,
        };
        Self {
            tx_hash,
            network,
            remediation,
            ..Self::new(FailureCode::AlreadyPaid, "This job has already been paid")
        }
    }

    /// Attaches the transaction hash.
    #[must_use]
    pub fn with_tx_hash(mut self, tx_hash: TxHash) -> Self {
        self.tx_hash = Some(tx_hash);
        self
    }
}

impl fmt::Display for TransferFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(step) = &self.remediation {
            write!(f, " ({step})")?;
        }
        Ok(())
    }
}

impl std::error::Error for TransferFailure {}

/// Classifies a raw transfer/chain error message.
///
/// Matches against known substrings; unmatched messages fall into the
/// generic payment-failed bucket with the raw text preserved.
#[must_use]
pub fn classify_transfer_error(raw: &str, network: Network) -> TransferFailure {
    let lower = raw.to_lowercase();

    if lower.contains("insufficient funds")
        || lower.contains("gas required exceeds")
        || lower.contains("insufficient balance for gas")
    {
        return TransferFailure::insufficient_gas(None, network);
    }

    if lower.contains("transfer amount exceeds balance") {
        return TransferFailure::insufficient_usdc(None, None, network);
    }

    if lower.contains("already paid") || lower.contains("already been paid") {
        return TransferFailure::already_paid(None, Some(network));
    }

    if lower.contains("reverted") || lower.contains("transaction failed") {
        return TransferFailure {
            network: Some(network),
            remediation: Some("Check the transaction details and try again".to_owned()),
            ..TransferFailure::new(FailureCode::Reverted, format!("Transaction reverted: {raw}"))
        };
    }

    if lower.contains("network")
        || lower.contains("timeout")
        || lower.contains("timed out")
        || lower.contains("connection")
        || lower.contains("connect")
        || lower.contains("dns")
    {
        return TransferFailure {
            network: Some(network),
            remediation: Some("Check your network connection and try again".to_owned()),
            ..TransferFailure::new(FailureCode::Rpc, format!("Network error: {raw}"))
        };
    }

    TransferFailure {
        network: Some(network),
        ..TransferFailure::new(FailureCode::Unknown, format!("Payment failed: {raw}"))
    }
}

/// Formats wei as a six-decimal ETH string.
fn format_eth(wei: U256) -> String {
    // Display context only; truncation past 6 decimals is fine.
    let quotient = wei / U256::from(1_000_000_000_000u64);
    let micro = u128::try_from(quotient).unwrap_or(u128::MAX);
    format!("{}.{:06}", micro / 1_000_000, micro % 1_000_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_gas_shortfall() {
        let failure = classify_transfer_error(
            "err: insufficient funds for gas * price + value",
            Network::BaseSepolia,
        );
        assert_eq!(failure.code, FailureCode::InsufficientGas);
        assert!(failure.remediation.unwrap().contains("alchemy.com/faucets"));
    }

    #[test]
    fn classifies_usdc_shortfall() {
        let failure = classify_transfer_error(
            "execution error: ERC20: transfer amount exceeds balance",
            Network::BaseSepolia,
        );
        assert_eq!(failure.code, FailureCode::InsufficientUsdc);
        assert!(failure.remediation.unwrap().contains("faucet.circle.com"));
    }

    #[test]
    fn classifies_revert_and_network() {
        assert_eq!(
            classify_transfer_error("execution reverted", Network::Base).code,
            FailureCode::Reverted
        );
        assert_eq!(
            classify_transfer_error("request timed out", Network::Base).code,
            FailureCode::Rpc
        );
    }

    #[test]
    fn classifies_already_paid() {
        let failure = classify_transfer_error("This job has already been paid", Network::Base);
        assert_eq!(failure.code, FailureCode::AlreadyPaid);
        assert!(failure.message.contains("already been paid"));
    }

    #[test]
    fn unknown_patterns_stay_failures() {
        let failure = classify_transfer_error("something odd happened", Network::Base);
        assert_eq!(failure.code, FailureCode::Unknown);
        assert!(failure.message.contains("something odd happened"));
    }

    #[test]
    fn insufficient_usdc_carries_amounts() {
        let failure = TransferFailure::insufficient_usdc(
            Some("10".parse().unwrap()),
            Some("5".parse().unwrap()),
            Network::BaseSepolia,
        );
        assert_eq!(failure.required.as_deref(), Some("10.00 USDC"));
        assert_eq!(failure.available.as_deref(), Some("5.00 USDC"));
        assert!(failure.message.contains("Need 10.00 USDC, have 5.00 USDC"));
    }

    #[test]
    fn chain_mismatch_names_networks() {
        let failure = TransferFailure::chain_mismatch(8453, 84532);
        assert_eq!(failure.code, FailureCode::ChainMismatch);
        assert!(failure.message.contains("Base"));
        assert!(failure.message.contains("Base Sepolia"));
    }

    #[test]
    fn formats_wei() {
        assert_eq!(format_eth(U256::from(1_500_000_000_000_000_000u128)), "1.500000");
        assert_eq!(format_eth(MIN_GAS_WEI), "0.000100");
    }
}
