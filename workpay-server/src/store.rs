//! Marketplace records and the storage trait the approval engine runs on.

use alloy_primitives::{Address, TxHash};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use workpay::amount::UsdcAmount;
use workpay::timestamp::UnixTimestamp;

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Posted, nobody hired yet.
    Open,
    /// A worker is hired and working.
    InProgress,
    /// Approved and settled.
    Completed,
    /// Completion rejected by the poster.
    Rejected,
    /// Withdrawn before completion.
    Cancelled,
}

/// Payment state of a job, tracked independently of [`JobStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// No payment activity yet.
    Pending,
    /// A challenge was issued; the poster owes the reward.
    AwaitingPayment,
    /// A qualifying transfer was verified and recorded.
    Paid,
    /// The payment path failed definitively.
    Failed,
}

/// A posted job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Job identifier.
    pub id: String,
    /// Short human-readable title.
    pub title: String,
    /// Agent who posted the job and pays the reward.
    pub poster_id: String,
    /// Agent hired to do the work, once hired.
    pub hired_id: Option<String>,
    /// Reward in USDC display units.
    pub reward: UsdcAmount,
    /// Lifecycle state.
    pub status: JobStatus,
    /// Payment state.
    pub payment_status: PaymentStatus,
    /// Hash of the settling transfer, once paid on-chain.
    pub payment_tx_hash: Option<TxHash>,
    /// When the payment was verified.
    pub payment_verified_at: Option<UnixTimestamp>,
}

/// A worker's submitted completion for a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    /// Completion identifier.
    pub id: String,
    /// The job this completes.
    pub job_id: String,
    /// Worker-supplied proof of work (free text or a link).
    pub proof: String,
    /// Review outcome; `None` until the poster reviews.
    pub approved: Option<bool>,
    /// When the worker submitted.
    pub submitted_at: UnixTimestamp,
    /// When the poster reviewed.
    pub reviewed_at: Option<UnixTimestamp>,
}

/// An agent registered on the marketplace, either side of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Agent identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Payout wallet address, once registered.
    pub wallet_address: Option<Address>,
    /// Number of jobs completed and paid.
    pub jobs_completed: u32,
    /// Number of jobs that ended in rejection.
    pub jobs_failed: u32,
    /// Current reputation score, 0 to 5.
    pub reputation: f64,
}

/// What a ledger entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryType {
    /// Reward payment from poster to worker.
    Payment,
    /// Refund back to the poster.
    Refund,
}

/// An append-only record of value movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// What moved.
    pub entry_type: LedgerEntryType,
    /// The job the movement settles.
    pub job_id: String,
    /// Paying address.
    pub from: Address,
    /// Receiving address.
    pub to: Address,
    /// Amount in USDC display units.
    pub amount: UsdcAmount,
    /// Hash of the settling transfer, when known.
    pub tx_hash: Option<TxHash>,
    /// When the entry was recorded.
    pub recorded_at: UnixTimestamp,
}

/// Storage failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A referenced record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The backing store failed.
    #[error("store backend: {0}")]
    Backend(String),
}

/// Storage operations the approval engine needs.
///
/// Implementations must make [`settle_job`](MarketStore::settle_job)
/// atomic per job: of two concurrent settles for the same job, exactly
/// one observes `true`.
#[async_trait]
pub trait MarketStore: Send + Sync {
    /// Fetches a job by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on storage failure.
    async fn job(&self, job_id: &str) -> Result<Option<Job>, StoreError>;

    /// Fetches the completion submitted for a job, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on storage failure.
    async fn completion_for_job(&self, job_id: &str) -> Result<Option<Completion>, StoreError>;

    /// Fetches an agent profile by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on storage failure.
    async fn agent(&self, agent_id: &str) -> Result<Option<AgentProfile>, StoreError>;

    /// Records the poster's review verdict on the job's completion.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the job has no completion.
    async fn record_review(&self, job_id: &str, approved: bool) -> Result<(), StoreError>;

    /// Marks a job paid, compare-and-swap on its payment status.
    ///
    /// Returns `true` if this call performed the transition to
    /// [`PaymentStatus::Paid`], `false` if the job was already paid.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the job does not exist.
    async fn settle_job(
        &self,
        job_id: &str,
        tx_hash: Option<TxHash>,
        verified_at: UnixTimestamp,
    ) -> Result<bool, StoreError>;

    /// Marks a job's payment as awaited, recording that a challenge went out.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the job does not exist.
    async fn mark_awaiting_payment(&self, job_id: &str) -> Result<(), StoreError>;

    /// Moves a job to [`JobStatus::Rejected`] and its payment to
    /// [`PaymentStatus::Failed`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the job does not exist.
    async fn mark_job_rejected(&self, job_id: &str) -> Result<(), StoreError>;

    /// Bumps an agent's completed/failed counters and recomputes reputation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the agent does not exist.
    async fn update_agent_stats(
        &self,
        agent_id: &str,
        completed_delta: u32,
        failed_delta: u32,
    ) -> Result<(), StoreError>;

    /// Appends a ledger entry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on storage failure.
    async fn append_ledger(&self, entry: LedgerEntry) -> Result<(), StoreError>;
}
