//! The review/payment state machine.
//!
//! A poster's review verdict drives everything here. Rejection records
//! the verdict and debits the worker's reputation. Approval is gated on
//! payment: without an acceptable proof the engine answers with a
//! [`PaymentRequirement`] challenge, and only a verified transfer settles
//! the job. Settlement is compare-and-swap on the job's payment status,
//! so a re-sent approval with the same proof returns the recorded result
//! instead of double-paying.

use alloy_primitives::Address;
use workpay::networks::Network;
use workpay::proof::PaymentProof;
use workpay::proto::{ApprovalReceipt, ApprovalRequest, RejectionReceipt, ReviewOutcome};
use workpay::requirement::PaymentRequirement;
use workpay::timestamp::UnixTimestamp;
use workpay::verify::{ChainVerifier, ReceiptVerifier};
use workpay_http::PaymentGate;

use crate::store::{
    AgentProfile, Job, JobStatus, LedgerEntry, LedgerEntryType, MarketStore, PaymentStatus,
    StoreError,
};

/// Why a review could not be carried out.
#[derive(Debug, thiserror::Error)]
pub enum ApprovalError {
    /// No job with the requested id.
    #[error("Job not found")]
    JobNotFound,

    /// The job is not in a reviewable state.
    #[error("Job is not reviewable in status {status:?}")]
    InvalidStatus {
        /// The job's actual status.
        status: JobStatus,
    },

    /// Only the posting agent may review a completion.
    #[error("Only the job poster can review this completion")]
    NotPoster,

    /// Nothing has been submitted for review.
    #[error("No completion has been submitted for this job")]
    MissingCompletion,

    /// The completion was already reviewed.
    #[error("This completion has already been reviewed")]
    AlreadyReviewed,

    /// The worker has no registered payout wallet.
    #[error("The hired worker has no registered wallet address")]
    WorkerWalletMissing,

    /// The poster has no registered wallet to pay from.
    #[error("The poster has no registered wallet address")]
    PosterWalletMissing,

    /// Approval requires payment; the challenge carries the terms.
    #[error("Payment required")]
    PaymentRequired(Box<PaymentRequirement>),

    /// A verifier could not run its check. Retryable.
    #[error("Payment verification unavailable: {0}")]
    Infrastructure(String),

    /// The backing store failed.
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
}

/// Runs reviews against a store, gating approvals on verified payment.
#[derive(Debug)]
pub struct ApprovalEngine<S, C, R> {
    store: S,
    gate: PaymentGate<C, R>,
    network: Network,
}

impl<S, C, R> ApprovalEngine<S, C, R>
where
    S: MarketStore,
    C: ChainVerifier,
    R: ReceiptVerifier,
{
    /// Creates an engine over a store and payment gate, challenging on
    /// `network`.
    #[must_use]
    pub fn new(store: S, gate: PaymentGate<C, R>, network: Network) -> Self {
        Self {
            store,
            gate,
            network,
        }
    }

    /// Reviews a job's completion on behalf of `caller_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::PaymentRequired`] when approval needs a
    /// payment that has not been proven yet; see the other variants for
    /// precondition failures.
    pub async fn review(
        &self,
        caller_id: &str,
        request: &ApprovalRequest,
        proof: Option<&PaymentProof>,
    ) -> Result<ReviewOutcome, ApprovalError> {
        let job = self
            .store
            .job(&request.job_id)
            .await?
            .ok_or(ApprovalError::JobNotFound)?;

        // A re-sent approval for a settled job returns the recorded
        // result; the money already moved exactly once.
        if request.approved && job.payment_status == PaymentStatus::Paid {
            if job.poster_id != caller_id {
                return Err(ApprovalError::NotPoster);
            }
            return Ok(ReviewOutcome::Approved(self.recorded_receipt(&job).await?));
        }

        if job.status != JobStatus::InProgress {
            return Err(ApprovalError::InvalidStatus { status: job.status });
        }
        if job.poster_id != caller_id {
            return Err(ApprovalError::NotPoster);
        }
        let completion = self
            .store
            .completion_for_job(&job.id)
            .await?
            .ok_or(ApprovalError::MissingCompletion)?;
        if completion.approved.is_some() {
            return Err(ApprovalError::AlreadyReviewed);
        }

        if request.approved {
            self.approve(&job, proof).await
        } else {
            self.reject(&job).await
        }
    }

    async fn approve(
        &self,
        job: &Job,
        proof: Option<&PaymentProof>,
    ) -> Result<ReviewOutcome, ApprovalError> {
        let (worker, worker_wallet) = self.worker_wallet(job).await?;
        let poster_wallet = self
            .store
            .agent(&job.poster_id)
            .await?
            .and_then(|p| p.wallet_address)
            .ok_or(ApprovalError::PosterWalletMissing)?;

        let required_units = job
            .reward
            .to_base_units()
            .map_err(|e| ApprovalError::Infrastructure(e.to_string()))?;
        let verification = self
            .gate
            .authorize(proof, poster_wallet, worker_wallet, required_units)
            .await
            .map_err(|fault| ApprovalError::Infrastructure(fault.to_string()))?;

        if !verification.verified {
            tracing::info!(
                job_id = %job.id,
                reason = verification.error.as_deref().unwrap_or("no proof"),
                "approval challenged, payment required"
            );
            if let Err(e) = self.store.mark_awaiting_payment(&job.id).await {
                tracing::warn!(job_id = %job.id, error = %e, "failed to mark awaiting payment");
            }
            let requirement = PaymentRequirement::build(
                self.network,
                worker_wallet,
                &job.reward,
                &job.id,
                &format!("Approval of job {}: {}", job.id, job.title),
            )
            .map_err(|e| ApprovalError::Infrastructure(e.to_string()))?;
            return Err(ApprovalError::PaymentRequired(Box::new(requirement)));
        }

        let settled_now = self
            .store
            .settle_job(&job.id, verification.tx_hash, UnixTimestamp::now())
            .await?;
        if !settled_now {
            // Lost the race to a concurrent approval; its result stands.
            let settled = self
                .store
                .job(&job.id)
                .await?
                .ok_or(ApprovalError::JobNotFound)?;
            return Ok(ReviewOutcome::Approved(
                self.recorded_receipt(&settled).await?,
            ));
        }

        // Payment state is authoritative from here on; bookkeeping
        // failures are logged, never surfaced as review failures.
        if let Err(e) = self.store.record_review(&job.id, true).await {
            tracing::error!(job_id = %job.id, error = %e, "failed to record review verdict");
        }
        if let Err(e) = self.store.update_agent_stats(&worker.id, 1, 0).await {
            tracing::error!(job_id = %job.id, error = %e, "failed to update worker stats");
        }
        let entry = LedgerEntry {
            entry_type: LedgerEntryType::Payment,
            job_id: job.id.clone(),
            from: poster_wallet,
            to: worker_wallet,
            amount: job.reward,
            tx_hash: verification.tx_hash,
            recorded_at: UnixTimestamp::now(),
        };
        if let Err(e) = self.store.append_ledger(entry).await {
            tracing::error!(job_id = %job.id, error = %e, "failed to append ledger entry");
        }

        tracing::info!(
            job_id = %job.id,
            tx_hash = ?verification.tx_hash,
            amount = %job.reward,
            worker = %worker.id,
            "completion approved and payment settled"
        );
        Ok(ReviewOutcome::Approved(ApprovalReceipt {
            approved: true,
            job_id: job.id.clone(),
            payment_tx_hash: verification
                .tx_hash
                .map(|h| format!("{h:?}"))
                .unwrap_or_default(),
            amount_usdc: job.reward,
            paid_to: format!("{worker_wallet:?}"),
            message: format!(
                "Completion approved, {} USDC paid on {}",
                job.reward,
                self.network.display_name()
            ),
        }))
    }

    async fn reject(&self, job: &Job) -> Result<ReviewOutcome, ApprovalError> {
        self.store.record_review(&job.id, false).await?;
        self.store.mark_job_rejected(&job.id).await?;
        if let Some(worker_id) = &job.hired_id {
            if let Err(e) = self.store.update_agent_stats(worker_id, 0, 1).await {
                tracing::error!(job_id = %job.id, error = %e, "failed to update worker stats");
            }
        }

        tracing::info!(job_id = %job.id, "completion rejected, no payment due");
        Ok(ReviewOutcome::Rejected(RejectionReceipt {
            approved: false,
            job_id: job.id.clone(),
            message: "Completion rejected, no payment due".to_owned(),
        }))
    }

    /// Rebuilds the success payload for a job that already settled.
    async fn recorded_receipt(&self, job: &Job) -> Result<ApprovalReceipt, ApprovalError> {
        let (_, worker_wallet) = self.worker_wallet(job).await?;
        Ok(ApprovalReceipt {
            approved: true,
            job_id: job.id.clone(),
            payment_tx_hash: job
                .payment_tx_hash
                .map(|h| format!("{h:?}"))
                .unwrap_or_default(),
            amount_usdc: job.reward,
            paid_to: format!("{worker_wallet:?}"),
            message: "Completion already approved and paid".to_owned(),
        })
    }

    async fn worker_wallet(&self, job: &Job) -> Result<(AgentProfile, Address), ApprovalError> {
        let worker_id = job
            .hired_id
            .as_deref()
            .ok_or(ApprovalError::WorkerWalletMissing)?;
        let worker = self
            .store
            .agent(worker_id)
            .await?
            .ok_or(ApprovalError::WorkerWalletMissing)?;
        let wallet = worker
            .wallet_address
            .ok_or(ApprovalError::WorkerWalletMissing)?;
        Ok((worker, wallet))
    }
}
