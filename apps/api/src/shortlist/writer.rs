//! Shortlist Writer — interprets the model's verdict and upserts it keyed by candidate id.

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::shortlist::{ShortlistOutcome, ShortlistOutcomeRow, ShortlistStatus};
use crate::shortlist::aggregator::EligibleCandidate;
use crate::shortlist::evaluation::EvaluationPrompt;
use crate::shortlist::ShortlistError;
use crate::store::RecordStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    Shortlist,
    Reject,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Shortlist => "shortlist",
            Recommendation::Reject => "reject",
        }
    }

    pub fn status(&self) -> ShortlistStatus {
        match self {
            Recommendation::Shortlist => ShortlistStatus::Shortlisted,
            Recommendation::Reject => ShortlistStatus::Rejected,
        }
    }
}

/// The fields of the model's verdict this service acts on. The full object
/// is kept in `raw` and persisted as-is.
#[derive(Debug, Clone)]
pub struct ShortlistVerdict {
    pub recommendation: Recommendation,
    pub confidence: Option<f64>,
    pub hire_readiness: Option<String>,
    pub priority: Option<String>,
    pub raw: Value,
}

impl ShortlistVerdict {
    /// A missing `recommendation` is an evaluation failure; an unrecognised
    /// one is treated as a rejection.
    pub fn from_value(raw: Value) -> Result<Self, ShortlistError> {
        let recommendation = raw
            .get("recommendation")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ShortlistError::Evaluation("Verdict is missing 'recommendation'".to_string())
            })?;

        let recommendation = match recommendation.trim().to_ascii_lowercase().as_str() {
            "shortlist" | "shortlisted" => Recommendation::Shortlist,
            "reject" | "rejected" => Recommendation::Reject,
            other => {
                warn!("Unrecognised recommendation '{other}', treating as reject");
                Recommendation::Reject
            }
        };

        Ok(Self {
            recommendation,
            confidence: number_field(&raw, "confidence").map(|c| c.clamp(0.0, 100.0)),
            hire_readiness: string_field(&raw, "hire_readiness"),
            priority: string_field(&raw, "priority"),
            raw,
        })
    }
}

/// Accepts numbers and numeric strings; models emit both.
fn number_field(raw: &Value, key: &str) -> Option<f64> {
    match raw.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').parse().ok(),
        _ => None,
    }
}

fn string_field(raw: &Value, key: &str) -> Option<String> {
    raw.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

pub fn build_outcome(
    tenant_id: Uuid,
    candidate: &EligibleCandidate,
    prompt: &EvaluationPrompt,
    verdict: &ShortlistVerdict,
) -> ShortlistOutcome {
    ShortlistOutcome {
        id: candidate.candidate.id,
        user_id: tenant_id,
        job_id: candidate.job_id,
        name: candidate.candidate.name.clone(),
        email: candidate.candidate.email.clone(),
        ats_score: prompt.scores.ats,
        mcq_score: prompt.scores.mcq,
        technical_score: prompt.scores.technical,
        interview_score: prompt.scores.interview,
        overall_score: prompt.overall_score,
        status: verdict.recommendation.status(),
        recommendation: verdict.recommendation.as_str().to_string(),
        confidence: verdict.confidence,
        hire_readiness: verdict.hire_readiness.clone(),
        priority: verdict.priority.clone(),
        analysis: verdict.raw.clone(),
    }
}

pub async fn write_outcome(
    store: &dyn RecordStore,
    outcome: &ShortlistOutcome,
) -> Result<ShortlistOutcomeRow, ShortlistError> {
    let row = store
        .upsert_shortlist(outcome)
        .await
        .map_err(|e| ShortlistError::Persistence(e.to_string()))?;

    info!(
        "Stored verdict '{}' for candidate {} (overall {})",
        row.status, row.id, row.overall_score
    );
    Ok(row)
}
