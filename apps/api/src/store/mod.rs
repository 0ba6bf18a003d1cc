//! Record Store — the managed Postgres tables this service reads candidates
//! and assessment results from, and writes shortlist outcomes to.
//!
//! All access goes through the `RecordStore` trait so handlers and the
//! shortlisting pipeline receive the store as an injected `Arc<dyn RecordStore>`.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::candidate::{CandidateRow, InterviewRow, JobRow, McqResultRow, TechnicalResultRow};
use crate::models::shortlist::{ShortlistOutcome, ShortlistOutcomeRow};

pub mod postgres;

pub use postgres::PgRecordStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Record store rejected the request: {0}")]
    Rejected(String),
}

/// Narrowing filters for a tenant's candidate listing. Both are optional;
/// an empty filter selects every candidate the tenant owns.
#[derive(Debug, Clone, Default)]
pub struct CandidateFilter {
    pub job_id: Option<Uuid>,
    pub candidate_ids: Option<Vec<Uuid>>,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Candidates owned by `tenant_id`, oldest first.
    async fn list_candidates(
        &self,
        tenant_id: Uuid,
        filter: &CandidateFilter,
    ) -> Result<Vec<CandidateRow>, StoreError>;

    async fn get_job(&self, job_id: Uuid) -> Result<Option<JobRow>, StoreError>;

    /// Most recent completed MCQ attempt for (candidate, job).
    async fn latest_completed_mcq(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
    ) -> Result<Option<McqResultRow>, StoreError>;

    /// Most recent completed technical practical for (candidate, job).
    async fn latest_completed_technical(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
    ) -> Result<Option<TechnicalResultRow>, StoreError>;

    /// Most recent interview for (candidate email, job).
    async fn latest_interview(
        &self,
        email: &str,
        job_id: Uuid,
    ) -> Result<Option<InterviewRow>, StoreError>;

    /// Inserts or overwrites the outcome keyed by candidate id.
    async fn upsert_shortlist(
        &self,
        outcome: &ShortlistOutcome,
    ) -> Result<ShortlistOutcomeRow, StoreError>;

    async fn list_shortlist(
        &self,
        tenant_id: Uuid,
        job_id: Option<Uuid>,
    ) -> Result<Vec<ShortlistOutcomeRow>, StoreError>;

    async fn get_shortlist(
        &self,
        tenant_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Option<ShortlistOutcomeRow>, StoreError>;
}
