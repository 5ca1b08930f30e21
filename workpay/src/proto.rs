//! Wire types for the approval endpoint.
//!
//! The approval endpoint is the one route gated by the x402 cycle: the
//! request/response bodies here are shared between the server handler and
//! the client orchestrator.

use serde::{Deserialize, Serialize};

use crate::amount::UsdcAmount;
use crate::requirement::PaymentRequirement;

/// Body of a `POST /approve` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    /// The job whose completion is being reviewed.
    pub job_id: String,
    /// `true` to approve and pay, `false` to reject.
    pub approved: bool,
}

/// Body of a 402 Payment Required response.
///
/// The same requirement is mirrored in the `x-payment-required` header so
/// non-body-aware clients can still act on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequiredBody {
    /// Fixed error marker, `"Payment required"`.
    pub error: String,
    /// Human-readable summary of what must be paid.
    pub message: String,
    /// The machine-readable requirement.
    pub payment: PaymentRequirement,
}

impl PaymentRequiredBody {
    /// Wraps a requirement in the standard 402 body.
    #[must_use]
    pub fn new(payment: PaymentRequirement) -> Self {
        let message = format!(
            "Payment of {} USDC required to {}",
            payment.display_amount(),
            payment.pay_to
        );
        Self {
            error: "Payment required".to_owned(),
            message,
            payment,
        }
    }
}

/// Success body after an approval settles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalReceipt {
    /// Always `true`.
    pub approved: bool,
    /// The settled job.
    pub job_id: String,
    /// Hash of the settling USDC transfer.
    pub payment_tx_hash: String,
    /// Amount paid, in display units.
    pub amount_usdc: UsdcAmount,
    /// Wallet the payment went to.
    pub paid_to: String,
    /// Human-readable confirmation.
    pub message: String,
}

/// Success body after a rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionReceipt {
    /// Always `false`.
    pub approved: bool,
    /// The rejected job.
    pub job_id: String,
    /// Human-readable confirmation.
    pub message: String,
}

/// Outcome of a review, either branch of the approval endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReviewOutcome {
    /// The completion was approved and the payment settled.
    Approved(ApprovalReceipt),
    /// The completion was rejected; no payment moved.
    Rejected(RejectionReceipt),
}

/// Generic error body used by non-402 failure responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable error description.
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::networks::Network;
    use alloy_primitives::address;

    #[test]
    fn payment_required_body_names_amount_and_payee() {
        let requirement = PaymentRequirement::build(
            Network::BaseSepolia,
            address!("2222222222222222222222222222222222222222"),
            &"25.5".parse().unwrap(),
            "J1",
            "Payment for job: J1",
        )
        .unwrap();
        let body = PaymentRequiredBody::new(requirement.clone());
        assert_eq!(body.error, "Payment required");
        assert!(body.message.contains("25.50 USDC"));
        assert!(body.message.contains(&requirement.pay_to));
    }

    #[test]
    fn approval_bodies_use_snake_case_keys() {
        let request = ApprovalRequest {
            job_id: "J1".to_owned(),
            approved: true,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("job_id").is_some());
        assert!(value.get("jobId").is_none());

        let receipt = ApprovalReceipt {
            approved: true,
            job_id: "J1".to_owned(),
            payment_tx_hash: "0xabc".to_owned(),
            amount_usdc: "10.5".parse().unwrap(),
            paid_to: "0x2222222222222222222222222222222222222222".to_owned(),
            message: "done".to_owned(),
        };
        let value = serde_json::to_value(&receipt).unwrap();
        assert!(value.get("payment_tx_hash").is_some());
        assert!(value.get("paymentTxHash").is_none());
        assert!(value.get("paid_to").is_some());
        assert_eq!(value["amount_usdc"], "10.5");
    }

    #[test]
    fn review_outcome_distinguishes_branches() {
        let approved = serde_json::json!({
            "approved": true,
            "job_id": "J1",
            "payment_tx_hash": "0xabc",
            "amount_usdc": "10.5",
            "paid_to": "0x2222222222222222222222222222222222222222",
            "message": "done",
        });
        assert!(matches!(
            serde_json::from_value::<ReviewOutcome>(approved).unwrap(),
            ReviewOutcome::Approved(_)
        ));

        let rejected = serde_json::json!({
            "approved": false,
            "job_id": "J1",
            "message": "rejected",
        });
        assert!(matches!(
            serde_json::from_value::<ReviewOutcome>(rejected).unwrap(),
            ReviewOutcome::Rejected(_)
        ));
    }
}
