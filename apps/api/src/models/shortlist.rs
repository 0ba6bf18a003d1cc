use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Final pipeline status persisted for a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShortlistStatus {
    Shortlisted,
    Rejected,
}

impl ShortlistStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShortlistStatus::Shortlisted => "shortlisted",
            ShortlistStatus::Rejected => "rejected",
        }
    }
}

/// Write model for the `shortlisted_candidates` upsert. `id` is the candidate id
/// and doubles as the conflict target, so each candidate has at most one row.
#[derive(Debug, Clone, Serialize)]
pub struct ShortlistOutcome {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_id: Uuid,
    pub name: String,
    pub email: String,
    pub ats_score: f64,
    pub mcq_score: f64,
    pub technical_score: f64,
    pub interview_score: f64,
    pub overall_score: i32,
    pub status: ShortlistStatus,
    pub recommendation: String,
    pub confidence: Option<f64>,
    pub hire_readiness: Option<String>,
    pub priority: Option<String>,
    /// Full structured verdict as returned by the model, stored as JSONB.
    pub analysis: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ShortlistOutcomeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_id: Uuid,
    pub name: String,
    pub email: String,
    pub ats_score: f64,
    pub mcq_score: f64,
    pub technical_score: f64,
    pub interview_score: f64,
    pub overall_score: i32,
    pub status: String,
    pub recommendation: String,
    pub confidence: Option<f64>,
    pub hire_readiness: Option<String>,
    pub priority: Option<String>,
    pub analysis: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
