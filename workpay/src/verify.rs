//! Verification results and verifier capability traits.
//!
//! Two independent paths can attest that a qualifying transfer happened:
//! direct on-chain inspection of a transaction receipt ([`ChainVerifier`])
//! or a third-party facilitator attesting to an opaque signed receipt
//! ([`ReceiptVerifier`]). Both produce a [`Verification`].
//!
//! Definitive rejections (wrong sender, insufficient amount, reverted
//! transaction) come back as an unverified [`Verification`]; transport
//! failures come back as a [`VerifyFault`] so callers can distinguish
//! "payment is bad" from "could not check" and retry only the latter.

use alloy_primitives::{Address, TxHash, U256};
use async_trait::async_trait;

use crate::amount::UsdcAmount;

/// Infrastructure fault while verifying: the check itself could not run.
///
/// Safely retryable; never interpreted as verified or unverified.
#[derive(Debug, Clone, thiserror::Error)]
pub enum VerifyFault {
    /// Chain RPC call failed.
    #[error("rpc fault: {0}")]
    Rpc(String),

    /// Facilitator endpoint unreachable or misbehaving at transport level.
    #[error("facilitator fault: {0}")]
    Facilitator(String),
}

/// Outcome of checking a payment proof.
///
/// `verified` is only `true` when sender, recipient, and amount all check
/// out; observed fields are populated where the proof allowed decoding them
/// even when verification failed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Verification {
    /// Whether the proof establishes a qualifying transfer.
    pub verified: bool,
    /// The resolved transaction hash, when one is known.
    pub tx_hash: Option<TxHash>,
    /// Observed sender of the transfer.
    pub from: Option<Address>,
    /// Observed recipient of the transfer.
    pub to: Option<Address>,
    /// Observed amount in base units.
    pub amount: Option<U256>,
    /// Reason the proof was not accepted.
    pub error: Option<String>,
}

impl Verification {
    /// A successful verification of a decoded transfer.
    #[must_use]
    pub fn verified(tx_hash: TxHash, from: Address, to: Address, amount: U256) -> Self {
        Self {
            verified: true,
            tx_hash: Some(tx_hash),
            from: Some(from),
            to: Some(to),
            amount: Some(amount),
            error: None,
        }
    }

    /// A definitive rejection.
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            verified: false,
            error: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Attaches the transaction hash the proof referenced.
    #[must_use]
    pub fn with_tx_hash(mut self, tx_hash: TxHash) -> Self {
        self.tx_hash = Some(tx_hash);
        self
    }

    /// Attaches the observed transfer parties and amount.
    #[must_use]
    pub fn with_observed(mut self, from: Address, to: Address, amount: U256) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self.amount = Some(amount);
        self
    }

    /// Observed amount in display units, when decoded.
    #[must_use]
    pub fn observed_amount(&self) -> Option<UsdcAmount> {
        self.amount
            .and_then(|units| UsdcAmount::from_base_units(units).ok())
    }
}

/// Verifies a transfer by inspecting its on-chain transaction receipt.
#[async_trait]
pub trait ChainVerifier: Send + Sync {
    /// Checks that `tx_hash` is a mined, successful transaction containing a
    /// USDC transfer from `expected_from` to `expected_to` of at least
    /// `required_units`.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyFault`] only for transport-level failures; a missing
    /// or disqualifying transaction is an unverified [`Verification`].
    async fn verify_transfer(
        &self,
        tx_hash: TxHash,
        expected_from: Address,
        expected_to: Address,
        required_units: U256,
    ) -> Result<Verification, VerifyFault>;
}

/// Verifies a transfer by asking a facilitator to attest to a signed receipt.
///
/// Receipts are signed by the facilitator, which establishes sender
/// authenticity out of band; only the payee and amount are checked here.
#[async_trait]
pub trait ReceiptVerifier: Send + Sync {
    /// Asks the facilitator whether `receipt` attests a transfer of at
    /// least `required_units` to `expected_to`.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyFault`] for transport-level failures; a negative
    /// attestation is an unverified [`Verification`].
    async fn verify_receipt(
        &self,
        receipt: &str,
        expected_to: Address,
        required_units: U256,
    ) -> Result<Verification, VerifyFault>;
}

#[async_trait]
impl<T: ChainVerifier + ?Sized> ChainVerifier for Box<T> {
    async fn verify_transfer(
        &self,
        tx_hash: TxHash,
        expected_from: Address,
        expected_to: Address,
        required_units: U256,
    ) -> Result<Verification, VerifyFault> {
        (**self)
            .verify_transfer(tx_hash, expected_from, expected_to, required_units)
            .await
    }
}

#[async_trait]
impl<T: ReceiptVerifier + ?Sized> ReceiptVerifier for Box<T> {
    async fn verify_receipt(
        &self,
        receipt: &str,
        expected_to: Address,
        required_units: U256,
    ) -> Result<Verification, VerifyFault> {
        (**self)
            .verify_receipt(receipt, expected_to, required_units)
            .await
    }
}
