// Candidate shortlisting: aggregates every assessment stage for a candidate,
// asks the completion service for a holistic verdict, and upserts the result.
//
// Flow per candidate: aggregator → evaluation (prompt) → invoker → writer,
// driven by pipeline::ShortlistPipeline. One candidate's failure never aborts the batch.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::errors::AppError;
use crate::store::StoreError;

pub mod aggregator;
pub mod evaluation;
pub mod handlers;
pub mod invoker;
pub mod locks;
pub mod pipeline;
pub mod prompts;
pub mod writer;

#[derive(Debug, Error)]
pub enum ShortlistError {
    /// A required credential is missing; the batch cannot start.
    #[error("{0}")]
    Configuration(String),

    #[error("Evaluation failed: {0}")]
    Evaluation(String),

    #[error("Failed to save shortlist result: {0}")]
    Persistence(String),

    #[error("Record store error: {0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Unexpected(String),
}

impl From<ShortlistError> for AppError {
    fn from(err: ShortlistError) -> Self {
        match err {
            ShortlistError::Configuration(msg) => AppError::Configuration(msg),
            ShortlistError::Store(e) => AppError::Store(e),
            other => AppError::Internal(anyhow::anyhow!(other)),
        }
    }
}

/// Lifecycle of one candidate inside a batch.
/// `Persisted`, `Skipped` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateStage {
    Pending,
    Aggregated,
    PromptBuilt,
    Evaluated,
    Persisted,
    Skipped,
    Failed,
}

impl CandidateStage {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CandidateStage::Persisted | CandidateStage::Skipped | CandidateStage::Failed
        )
    }
}

impl fmt::Display for CandidateStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CandidateStage::Pending => "pending",
            CandidateStage::Aggregated => "aggregated",
            CandidateStage::PromptBuilt => "prompt_built",
            CandidateStage::Evaluated => "evaluated",
            CandidateStage::Persisted => "persisted",
            CandidateStage::Skipped => "skipped",
            CandidateStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A per-candidate failure reported back in the batch response.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CandidateError {
    pub candidate_id: Uuid,
    pub error: String,
}

impl CandidateError {
    pub fn new(candidate_id: Uuid, error: impl Into<String>) -> Self {
        Self {
            candidate_id,
            error: error.into(),
        }
    }
}
