//! On-chain verification of USDC transfers.
//!
//! Given a transaction hash, fetches its receipt and checks that it
//! contains a qualifying `Transfer` event emitted by the network's USDC
//! contract. Sender, recipient, and amount are checked strictly in that
//! order, each with a distinct error; the amount check accepts overpayment
//! (`observed >= required`).

use alloy_primitives::{Address, TxHash, U256};
use alloy_provider::Provider;
use alloy_sol_types::SolEvent;
use async_trait::async_trait;
use workpay::amount::UsdcAmount;
use workpay::networks::Network;
use workpay::verify::{ChainVerifier, Verification, VerifyFault};

use crate::contract::IERC20;

/// Verifies transfers by inspecting transaction receipts over a chain RPC
/// provider.
#[derive(Debug, Clone)]
pub struct OnChainVerifier<P> {
    provider: P,
    network: Network,
}

impl<P> OnChainVerifier<P> {
    /// Creates a verifier reading receipts through `provider`, checking
    /// transfers against `network`'s USDC deployment.
    pub fn new(provider: P, network: Network) -> Self {
        Self { provider, network }
    }

    /// The network this verifier checks against.
    #[must_use]
    pub fn network(&self) -> Network {
        self.network
    }
}

#[async_trait]
impl<P: Provider> ChainVerifier for OnChainVerifier<P> {
    async fn verify_transfer(
        &self,
        tx_hash: TxHash,
        expected_from: Address,
        expected_to: Address,
        required_units: U256,
    ) -> Result<Verification, VerifyFault> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| VerifyFault::Rpc(e.to_string()))?;

        let Some(receipt) = receipt else {
            return Ok(Verification::rejected("Transaction not found").with_tx_hash(tx_hash));
        };

        if !receipt.status() {
            return Ok(Verification::rejected("Transaction failed").with_tx_hash(tx_hash));
        }

        let usdc = self.network.usdc_address();
        let transfer_log = receipt.inner.logs().iter().find(|log| {
            log.address() == usdc && log.topic0() == Some(&IERC20::Transfer::SIGNATURE_HASH)
        });

        let Some(transfer_log) = transfer_log else {
            return Ok(
                Verification::rejected("No USDC transfer found in transaction")
                    .with_tx_hash(tx_hash),
            );
        };

        let transfer = match transfer_log.log_decode::<IERC20::Transfer>() {
            Ok(decoded) => decoded.inner.data,
            Err(e) => {
                return Ok(Verification::rejected(format!("Malformed transfer event: {e}"))
                    .with_tx_hash(tx_hash));
            }
        };

        let verification = evaluate_transfer(
            tx_hash,
            transfer.from,
            transfer.to,
            transfer.value,
            expected_from,
            expected_to,
            required_units,
        );
        if verification.verified {
            tracing::info!(
                tx = %format!("{tx_hash:?}"),
                network = %self.network,
                "on-chain transfer verified"
            );
        }
        Ok(verification)
    }
}

/// Applies the sender / recipient / amount checks to a decoded transfer.
///
/// Addresses are compared as parsed 20-byte values, which makes the
/// comparison hex-case-insensitive. The first failing check short-circuits.
fn evaluate_transfer(
    tx_hash: TxHash,
    from: Address,
    to: Address,
    value: U256,
    expected_from: Address,
    expected_to: Address,
    required_units: U256,
) -> Verification {
    if from != expected_from {
        return Verification::rejected(format!(
            "Sender mismatch: expected {expected_from:?}, got {from:?}"
        ))
        .with_tx_hash(tx_hash)
        .with_observed(from, to, value);
    }

    if to != expected_to {
        return Verification::rejected(format!(
            "Recipient mismatch: expected {expected_to:?}, got {to:?}"
        ))
        .with_tx_hash(tx_hash)
        .with_observed(from, to, value);
    }

    if value < required_units {
        return Verification::rejected(format!(
            "Amount insufficient: expected {} USDC, got {} USDC",
            display_units(required_units),
            display_units(value)
        ))
        .with_tx_hash(tx_hash)
        .with_observed(from, to, value);
    }

    Verification::verified(tx_hash, from, to, value)
}

/// Base units formatted for error messages.
fn display_units(units: U256) -> String {
    UsdcAmount::from_base_units(units)
        .map(|amount| amount.to_string())
        .unwrap_or_else(|_| units.to_string())
}
