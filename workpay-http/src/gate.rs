//! Proof dispatch between the on-chain and facilitator verifiers.

use alloy_primitives::{Address, U256};
use workpay::proof::PaymentProof;
use workpay::verify::{ChainVerifier, ReceiptVerifier, Verification, VerifyFault};

/// Routes a payment proof to whichever verifier can check it.
///
/// Transaction hashes go to the chain verifier; opaque receipts go to the
/// facilitator. An absent proof is a definitive rejection, never a fault,
/// so callers can answer it with a 402 challenge.
#[derive(Debug)]
pub struct PaymentGate<C, R> {
    chain: C,
    receipt: R,
}

impl<C: ChainVerifier, R: ReceiptVerifier> PaymentGate<C, R> {
    /// Creates a gate over the two verifier backends.
    #[must_use]
    pub fn new(chain: C, receipt: R) -> Self {
        Self { chain, receipt }
    }

    /// Checks a payment proof against the expected transfer parameters.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyFault`] only when the backing verifier could not
    /// run its check; disqualifying proofs come back as an unverified
    /// [`Verification`].
    pub async fn authorize(
        &self,
        proof: Option<&PaymentProof>,
        expected_from: Address,
        expected_to: Address,
        required_units: U256,
    ) -> Result<Verification, VerifyFault> {
        match proof {
            None => Ok(Verification::rejected("No payment provided")),
            Some(PaymentProof::TxHash(tx_hash)) => {
                self.chain
                    .verify_transfer(*tx_hash, expected_from, expected_to, required_units)
                    .await
            }
            Some(PaymentProof::Receipt(receipt)) => {
                self.receipt
                    .verify_receipt(receipt, expected_to, required_units)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::TxHash;
    use async_trait::async_trait;

    struct StubChain(Verification);
    struct StubReceipt(Verification);

    #[async_trait]
    impl ChainVerifier for StubChain {
        async fn verify_transfer(
            &self,
            _tx_hash: TxHash,
            _expected_from: Address,
            _expected_to: Address,
            _required_units: U256,
        ) -> Result<Verification, VerifyFault> {
            Ok(self.0.clone())
        }
    }

    #[async_trait]
    impl ReceiptVerifier for StubReceipt {
        async fn verify_receipt(
            &self,
            _receipt: &str,
            _expected_to: Address,
            _required_units: U256,
        ) -> Result<Verification, VerifyFault> {
            Ok(self.0.clone())
        }
    }

    fn gate(chain: Verification, receipt: Verification) -> PaymentGate<StubChain, StubReceipt> {
        PaymentGate::new(StubChain(chain), StubReceipt(receipt))
    }

    #[tokio::test]
    async fn missing_proof_is_rejected_not_faulted() {
        let gate = gate(Verification::default(), Verification::default());
        let verification = gate
            .authorize(None, Address::ZERO, Address::ZERO, U256::from(1u64))
            .await
            .unwrap();
        assert!(!verification.verified);
        assert_eq!(verification.error.as_deref(), Some("No payment provided"));
    }

    #[tokio::test]
    async fn tx_hash_proof_goes_to_chain_verifier() {
        let tx: TxHash =
            "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
                .parse()
                .unwrap();
        let chain_result =
            Verification::verified(tx, Address::ZERO, Address::ZERO, U256::from(5u64));
        let gate = gate(chain_result.clone(), Verification::rejected("wrong path"));
        let proof = PaymentProof::TxHash(tx);
        let verification = gate
            .authorize(Some(&proof), Address::ZERO, Address::ZERO, U256::from(5u64))
            .await
            .unwrap();
        assert_eq!(verification, chain_result);
    }

    #[tokio::test]
    async fn receipt_proof_goes_to_facilitator_verifier() {
        let receipt_result = Verification::rejected("receipt path");
        let gate = gate(Verification::rejected("wrong path"), receipt_result.clone());
        let proof = PaymentProof::Receipt("opaque-blob".to_owned());
        let verification = gate
            .authorize(Some(&proof), Address::ZERO, Address::ZERO, U256::from(5u64))
            .await
            .unwrap();
        assert_eq!(verification, receipt_result);
    }
}
