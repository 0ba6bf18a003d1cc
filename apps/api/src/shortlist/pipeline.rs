//! Batch Orchestrator — runs aggregation, then evaluates each eligible
//! candidate through prompt → completion → upsert.
//!
//! With `max_concurrency == 1` candidates are processed strictly one after
//! another. Larger values evaluate up to that many candidates at once on a
//! `JoinSet`; results are re-ordered so the summary matches the sequential order.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::llm_client::CompletionService;
use crate::models::shortlist::ShortlistStatus;
use crate::shortlist::aggregator::{aggregate_candidates, EligibleCandidate, SkippedCandidate};
use crate::shortlist::evaluation::build_evaluation_prompt;
use crate::shortlist::invoker::{CompletionInvoker, DEFAULT_TEMPERATURE};
use crate::shortlist::writer::{build_outcome, write_outcome, Recommendation, ShortlistVerdict};
use crate::shortlist::{CandidateError, CandidateStage, ShortlistError};
use crate::store::{CandidateFilter, RecordStore};

pub const MISSING_API_KEY: &str = "OpenAI API key not configured";

#[derive(Debug, Clone)]
pub struct ShortlistSettings {
    pub models: Vec<String>,
    pub temperature: f32,
    pub max_concurrency: usize,
}

impl ShortlistSettings {
    pub fn new(models: Vec<String>, max_concurrency: usize) -> Self {
        Self {
            models,
            temperature: DEFAULT_TEMPERATURE,
            max_concurrency: max_concurrency.max(1),
        }
    }
}

/// One successfully evaluated and persisted candidate.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnalyzedCandidate {
    pub candidate_id: Uuid,
    pub name: String,
    pub status: ShortlistStatus,
    pub total_score: i32,
    pub recommendation: Recommendation,
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub analyzed: Vec<AnalyzedCandidate>,
    pub skipped: Vec<SkippedCandidate>,
    pub errors: Vec<CandidateError>,
    pub total_candidates: usize,
}

pub struct ShortlistPipeline {
    store: Arc<dyn RecordStore>,
    invoker: CompletionInvoker,
    max_concurrency: usize,
}

impl ShortlistPipeline {
    /// Fails with `Configuration` when no completion service is available,
    /// before any record is read.
    pub fn new(
        store: Arc<dyn RecordStore>,
        llm: Option<Arc<dyn CompletionService>>,
        settings: &ShortlistSettings,
    ) -> Result<Self, ShortlistError> {
        let llm = llm.ok_or_else(|| ShortlistError::Configuration(MISSING_API_KEY.to_string()))?;
        Ok(Self {
            store,
            invoker: CompletionInvoker::new(llm, &settings.models, settings.temperature)?,
            max_concurrency: settings.max_concurrency.max(1),
        })
    }

    pub async fn run(
        &self,
        tenant_id: Uuid,
        filter: &CandidateFilter,
    ) -> Result<BatchSummary, ShortlistError> {
        let aggregation = aggregate_candidates(self.store.as_ref(), tenant_id, filter).await?;
        info!(
            "Tenant {tenant_id}: {} candidates, {} eligible, {} skipped, {} unreadable",
            aggregation.total_candidates,
            aggregation.eligible.len(),
            aggregation.skipped.len(),
            aggregation.failed.len()
        );

        let results = if self.max_concurrency == 1 {
            self.evaluate_sequential(tenant_id, aggregation.eligible).await
        } else {
            self.evaluate_bounded(tenant_id, aggregation.eligible).await
        };

        let mut summary = BatchSummary {
            skipped: aggregation.skipped,
            errors: aggregation.failed,
            total_candidates: aggregation.total_candidates,
            ..Default::default()
        };
        for result in results {
            match result {
                Ok(analyzed) => summary.analyzed.push(analyzed),
                Err(e) => summary.errors.push(e),
            }
        }

        info!(
            "Tenant {tenant_id}: batch finished, {} analyzed, {} failed",
            summary.analyzed.len(),
            summary.errors.len()
        );
        Ok(summary)
    }

    async fn evaluate_sequential(
        &self,
        tenant_id: Uuid,
        eligible: Vec<EligibleCandidate>,
    ) -> Vec<Result<AnalyzedCandidate, CandidateError>> {
        let mut results = Vec::with_capacity(eligible.len());
        for candidate in eligible {
            results.push(
                evaluate_candidate(self.store.clone(), self.invoker.clone(), tenant_id, candidate).await,
            );
        }
        results
    }

    async fn evaluate_bounded(
        &self,
        tenant_id: Uuid,
        eligible: Vec<EligibleCandidate>,
    ) -> Vec<Result<AnalyzedCandidate, CandidateError>> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut set = JoinSet::new();

        for (index, candidate) in eligible.into_iter().enumerate() {
            let semaphore = semaphore.clone();
            let store = self.store.clone();
            let invoker = self.invoker.clone();
            let candidate_id = candidate.candidate.id;

            set.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                // Inner task so a panic is caught and attributed to this candidate.
                let task = tokio::spawn(evaluate_candidate(store, invoker, tenant_id, candidate));
                let result = match task.await {
                    Ok(result) => result,
                    Err(e) => {
                        error!("Evaluation task for candidate {candidate_id} aborted: {e}");
                        let err = ShortlistError::Unexpected(format!("Evaluation task aborted: {e}"));
                        Err(CandidateError::new(candidate_id, err.to_string()))
                    }
                };
                (index, result)
            });
        }

        let mut indexed = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(entry) => indexed.push(entry),
                Err(e) => error!("Shortlist worker failed to join: {e}"),
            }
        }
        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, result)| result).collect()
    }
}

/// Tracks one candidate's progress through the lifecycle for logging.
struct StageTracker {
    candidate_id: Uuid,
    stage: CandidateStage,
}

impl StageTracker {
    fn new(candidate_id: Uuid) -> Self {
        Self {
            candidate_id,
            stage: CandidateStage::Pending,
        }
    }

    fn advance(&mut self, next: CandidateStage) {
        debug!("Candidate {}: {} -> {}", self.candidate_id, self.stage, next);
        self.stage = next;
    }

    fn fail(&mut self, err: ShortlistError) -> CandidateError {
        warn!("Candidate {} failed at {}: {err}", self.candidate_id, self.stage);
        self.advance(CandidateStage::Failed);
        CandidateError::new(self.candidate_id, err.to_string())
    }
}

async fn evaluate_candidate(
    store: Arc<dyn RecordStore>,
    invoker: CompletionInvoker,
    tenant_id: Uuid,
    candidate: EligibleCandidate,
) -> Result<AnalyzedCandidate, CandidateError> {
    let mut tracker = StageTracker::new(candidate.candidate.id);
    tracker.advance(CandidateStage::Aggregated);

    let prompt = build_evaluation_prompt(&candidate);
    tracker.advance(CandidateStage::PromptBuilt);

    let verdict = invoker
        .invoke_json(prompt.system, &prompt.user)
        .await
        .and_then(ShortlistVerdict::from_value)
        .map_err(|e| tracker.fail(e))?;
    tracker.advance(CandidateStage::Evaluated);

    let outcome = build_outcome(tenant_id, &candidate, &prompt, &verdict);
    write_outcome(store.as_ref(), &outcome)
        .await
        .map_err(|e| tracker.fail(e))?;
    tracker.advance(CandidateStage::Persisted);
    debug_assert!(tracker.stage.is_terminal());

    Ok(AnalyzedCandidate {
        candidate_id: candidate.candidate.id,
        name: candidate.candidate.name,
        status: outcome.status,
        total_score: outcome.overall_score,
        recommendation: verdict.recommendation,
    })
}
