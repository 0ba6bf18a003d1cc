//! Candidate Aggregator — gathers the four assessment stages for each of a
//! tenant's candidates and separates eligible candidates from skipped ones.
//!
//! Eligibility: ATS score > 0, a completed MCQ attempt, a completed technical
//! practical, and an interview with a non-empty transcript, all for the
//! candidate's job. Ineligible candidates are skipped, never reported as errors.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::candidate::{CandidateRow, InterviewRow, JobRow, McqResultRow, TechnicalResultRow};
use crate::shortlist::{CandidateError, CandidateStage, ShortlistError};
use crate::store::{CandidateFilter, RecordStore, StoreError};

/// A candidate with every assessment stage attached.
#[derive(Debug, Clone)]
pub struct EligibleCandidate {
    pub candidate: CandidateRow,
    pub job_id: Uuid,
    /// Job posting, when the row still exists.
    pub job: Option<JobRow>,
    pub mcq: McqResultRow,
    pub technical: TechnicalResultRow,
    pub interview: InterviewRow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoJob,
    MissingAtsScore,
    McqIncomplete,
    TechnicalIncomplete,
    InterviewIncomplete,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SkippedCandidate {
    pub candidate_id: Uuid,
    pub reason: SkipReason,
}

#[derive(Debug, Default)]
pub struct Aggregation {
    pub eligible: Vec<EligibleCandidate>,
    pub skipped: Vec<SkippedCandidate>,
    /// Candidates whose records could not be read.
    pub failed: Vec<CandidateError>,
    pub total_candidates: usize,
}

/// Loads the tenant's candidates (narrowed by `filter`) and classifies each one.
///
/// Only the initial candidate listing can fail the whole call; a read error
/// while gathering one candidate is recorded against that candidate.
pub async fn aggregate_candidates(
    store: &dyn RecordStore,
    tenant_id: Uuid,
    filter: &CandidateFilter,
) -> Result<Aggregation, StoreError> {
    let candidates = store.list_candidates(tenant_id, filter).await?;
    let mut aggregation = Aggregation {
        total_candidates: candidates.len(),
        ..Default::default()
    };
    let mut jobs: HashMap<Uuid, Option<JobRow>> = HashMap::new();

    for candidate in candidates {
        let candidate_id = candidate.id;
        match gather(store, candidate, &mut jobs).await {
            Ok(Ok(eligible)) => {
                debug!("Candidate {candidate_id} aggregated");
                aggregation.eligible.push(eligible);
            }
            Ok(Err(reason)) => {
                info!("Candidate {candidate_id}: {} ({reason:?})", CandidateStage::Skipped);
                aggregation.skipped.push(SkippedCandidate {
                    candidate_id,
                    reason,
                });
            }
            Err(e) => {
                warn!("Failed to load records for candidate {candidate_id}: {e}");
                let err = ShortlistError::Unexpected(format!("Failed to load candidate records: {e}"));
                aggregation
                    .failed
                    .push(CandidateError::new(candidate_id, err.to_string()));
            }
        }
    }

    Ok(aggregation)
}

/// Checks are ordered cheapest first so ineligible candidates cost as few reads as possible.
async fn gather(
    store: &dyn RecordStore,
    candidate: CandidateRow,
    jobs: &mut HashMap<Uuid, Option<JobRow>>,
) -> Result<Result<EligibleCandidate, SkipReason>, StoreError> {
    let Some(job_id) = candidate.job_id else {
        return Ok(Err(SkipReason::NoJob));
    };
    if candidate.ats() <= 0.0 {
        return Ok(Err(SkipReason::MissingAtsScore));
    }

    let mcq = match store.latest_completed_mcq(candidate.id, job_id).await? {
        Some(row) if row.is_completed() => row,
        _ => return Ok(Err(SkipReason::McqIncomplete)),
    };
    let technical = match store.latest_completed_technical(candidate.id, job_id).await? {
        Some(row) if row.is_completed() => row,
        _ => return Ok(Err(SkipReason::TechnicalIncomplete)),
    };
    let interview = match store.latest_interview(&candidate.email, job_id).await? {
        Some(row) if row.has_transcript() => row,
        _ => return Ok(Err(SkipReason::InterviewIncomplete)),
    };

    let job = match jobs.get(&job_id) {
        Some(cached) => cached.clone(),
        None => {
            let job = store.get_job(job_id).await?;
            jobs.insert(job_id, job.clone());
            job
        }
    };

    Ok(Ok(EligibleCandidate {
        candidate,
        job_id,
        job,
        mcq,
        technical,
        interview,
    }))
}
