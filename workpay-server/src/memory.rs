//! In-memory store for tests and local development.

use std::sync::{Mutex, PoisonError};

use alloy_primitives::TxHash;
use async_trait::async_trait;
use dashmap::DashMap;
use workpay::timestamp::UnixTimestamp;

use crate::reputation::reputation_score;
use crate::store::{
    AgentProfile, Completion, Job, JobStatus, LedgerEntry, MarketStore, PaymentStatus, StoreError,
};

/// [`MarketStore`] backed by concurrent in-process maps.
///
/// Completions are keyed by job id; a job holds at most one.
#[derive(Debug, Default)]
pub struct MemoryStore {
    jobs: DashMap<String, Job>,
    completions: DashMap<String, Completion>,
    agents: DashMap<String, AgentProfile>,
    ledger: Mutex<Vec<LedgerEntry>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a job.
    pub fn put_job(&self, job: Job) {
        self.jobs.insert(job.id.clone(), job);
    }

    /// Inserts or replaces the completion for its job.
    pub fn put_completion(&self, completion: Completion) {
        self.completions
            .insert(completion.job_id.clone(), completion);
    }

    /// Inserts or replaces an agent profile.
    pub fn put_agent(&self, agent: AgentProfile) {
        self.agents.insert(agent.id.clone(), agent);
    }

    /// Snapshot of the ledger, oldest first.
    #[must_use]
    pub fn ledger(&self) -> Vec<LedgerEntry> {
        self.ledger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl MarketStore for MemoryStore {
    async fn job(&self, job_id: &str) -> Result<Option<Job>, StoreError> {
        Ok(self.jobs.get(job_id).map(|j| j.clone()))
    }

    async fn completion_for_job(&self, job_id: &str) -> Result<Option<Completion>, StoreError> {
        Ok(self.completions.get(job_id).map(|c| c.clone()))
    }

    async fn agent(&self, agent_id: &str) -> Result<Option<AgentProfile>, StoreError> {
        Ok(self.agents.get(agent_id).map(|a| a.clone()))
    }

    async fn record_review(&self, job_id: &str, approved: bool) -> Result<(), StoreError> {
        let mut completion = self
            .completions
            .get_mut(job_id)
            .ok_or_else(|| StoreError::NotFound(format!("completion for job {job_id}")))?;
        completion.approved = Some(approved);
        completion.reviewed_at = Some(UnixTimestamp::now());
        Ok(())
    }

    async fn settle_job(
        &self,
        job_id: &str,
        tx_hash: Option<TxHash>,
        verified_at: UnixTimestamp,
    ) -> Result<bool, StoreError> {
        // The entry lock makes the check-and-set atomic per job.
        let mut job = self
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| StoreError::NotFound(format!("job {job_id}")))?;
        if job.payment_status == PaymentStatus::Paid {
            return Ok(false);
        }
        job.payment_status = PaymentStatus::Paid;
        job.status = JobStatus::Completed;
        job.payment_tx_hash = tx_hash;
        job.payment_verified_at = Some(verified_at);
        Ok(true)
    }

    async fn mark_awaiting_payment(&self, job_id: &str) -> Result<(), StoreError> {
        let mut job = self
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| StoreError::NotFound(format!("job {job_id}")))?;
        if job.payment_status == PaymentStatus::Pending {
            job.payment_status = PaymentStatus::AwaitingPayment;
        }
        Ok(())
    }

    async fn mark_job_rejected(&self, job_id: &str) -> Result<(), StoreError> {
        let mut job = self
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| StoreError::NotFound(format!("job {job_id}")))?;
        job.status = JobStatus::Rejected;
        job.payment_status = PaymentStatus::Failed;
        Ok(())
    }

    async fn update_agent_stats(
        &self,
        agent_id: &str,
        completed_delta: u32,
        failed_delta: u32,
    ) -> Result<(), StoreError> {
        let mut agent = self
            .agents
            .get_mut(agent_id)
            .ok_or_else(|| StoreError::NotFound(format!("agent {agent_id}")))?;
        agent.jobs_completed += completed_delta;
        agent.jobs_failed += failed_delta;
        agent.reputation = reputation_score(agent.jobs_completed, agent.jobs_failed);
        Ok(())
    }

    async fn append_ledger(&self, entry: LedgerEntry) -> Result<(), StoreError> {
        self.ledger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
        Ok(())
    }
}
