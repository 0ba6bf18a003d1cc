//! Axum route handlers for candidate shortlisting.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::Tenant;
use crate::errors::AppError;
use crate::models::shortlist::ShortlistOutcomeRow;
use crate::shortlist::pipeline::{AnalyzedCandidate, BatchSummary, ShortlistPipeline};
use crate::shortlist::CandidateError;
use crate::state::AppState;
use crate::store::CandidateFilter;

const MAX_CANDIDATE_IDS: usize = 500;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeRequest {
    pub job_id: Option<Uuid>,
    pub candidate_ids: Option<Vec<Uuid>>,
}

impl AnalyzeRequest {
    /// An empty body selects every candidate the tenant owns.
    fn from_body(body: &[u8]) -> Result<Self, AppError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        let request: Self = serde_json::from_slice(body)
            .map_err(|e| AppError::Validation(format!("Invalid request body: {e}")))?;
        if request
            .candidate_ids
            .as_ref()
            .is_some_and(|ids| ids.len() > MAX_CANDIDATE_IDS)
        {
            return Err(AppError::Validation(format!(
                "candidate_ids accepts at most {MAX_CANDIDATE_IDS} ids"
            )));
        }
        Ok(request)
    }

    fn into_filter(self) -> CandidateFilter {
        CandidateFilter {
            job_id: self.job_id,
            // An empty list narrows nothing.
            candidate_ids: self.candidate_ids.filter(|ids| !ids.is_empty()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub message: String,
    pub analyzed: usize,
    pub skipped: usize,
    pub candidates: Vec<AnalyzedCandidate>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<CandidateError>,
}

impl From<BatchSummary> for AnalyzeResponse {
    fn from(summary: BatchSummary) -> Self {
        let message = if summary.total_candidates == 0 {
            "No candidates found".to_string()
        } else {
            format!(
                "Analyzed {} of {} candidates ({} skipped, {} failed)",
                summary.analyzed.len(),
                summary.total_candidates,
                summary.skipped.len(),
                summary.errors.len()
            )
        };
        Self {
            message,
            analyzed: summary.analyzed.len(),
            skipped: summary.skipped.len(),
            candidates: summary.analyzed,
            errors: summary.errors,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ShortlistQuery {
    pub job_id: Option<Uuid>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /candidates/analyze-and-shortlist
///
/// Evaluates every eligible candidate in scope and upserts a verdict for each.
/// Per-candidate failures are reported in `errors`; only a missing completion
/// credential fails the whole request.
pub async fn handle_analyze_and_shortlist(
    State(state): State<AppState>,
    tenant: Tenant,
    body: Bytes,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let pipeline = ShortlistPipeline::new(state.store.clone(), state.llm.clone(), &state.shortlist)?;
    let filter = AnalyzeRequest::from_body(&body)?.into_filter();

    let _guard = state.tenant_locks.acquire(tenant.id).await;
    info!(
        "Shortlisting for tenant {} (job {:?}, {} explicit ids)",
        tenant.id,
        filter.job_id,
        filter.candidate_ids.as_ref().map_or(0, Vec::len)
    );

    let summary = pipeline.run(tenant.id, &filter).await?;
    Ok(Json(summary.into()))
}

/// GET /candidates/shortlist?job_id=
///
/// Stored verdicts for the tenant, best overall score first.
pub async fn handle_list_shortlist(
    State(state): State<AppState>,
    tenant: Tenant,
    Query(query): Query<ShortlistQuery>,
) -> Result<Json<Vec<ShortlistOutcomeRow>>, AppError> {
    let rows = state.store.list_shortlist(tenant.id, query.job_id).await?;
    Ok(Json(rows))
}

/// GET /candidates/:id/shortlist
pub async fn handle_get_shortlist(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(candidate_id): Path<Uuid>,
) -> Result<Json<ShortlistOutcomeRow>, AppError> {
    state
        .store
        .get_shortlist(tenant.id, candidate_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No shortlist result for candidate {candidate_id}")))
}
