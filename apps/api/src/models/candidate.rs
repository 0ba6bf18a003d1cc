use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Status value written by the candidate-facing test runners once an attempt is graded.
pub const STATUS_COMPLETED: &str = "completed";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub experience_years: Option<f64>,
    pub skills: Option<Vec<String>>,
    pub resume_summary: Option<String>,
    /// Resume-to-job match, 0–100. Zero means the resume was never scored.
    pub ats_score: Option<f64>,
    pub ats_breakdown: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl CandidateRow {
    pub fn ats(&self) -> f64 {
        self.ats_score.unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub department: Option<String>,
    pub experience_level: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub skills: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct McqResultRow {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub job_id: Uuid,
    /// scheduled | in_progress | completed
    pub status: String,
    pub score: Option<f64>,
    pub percentage: Option<f64>,
    pub passed: Option<bool>,
    pub total_questions: Option<i32>,
    pub correct_answers: Option<i32>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl McqResultRow {
    pub fn is_completed(&self) -> bool {
        self.status == STATUS_COMPLETED
    }

    /// Percentage when graded, otherwise the raw score.
    pub fn effective_score(&self) -> f64 {
        self.percentage.or(self.score).unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TechnicalResultRow {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub job_id: Uuid,
    pub status: String,
    pub overall_score: Option<f64>,
    pub code_quality_score: Option<f64>,
    pub correctness_score: Option<f64>,
    pub approach_score: Option<f64>,
    pub communication_score: Option<f64>,
    pub feedback: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TechnicalResultRow {
    pub fn is_completed(&self) -> bool {
        self.status == STATUS_COMPLETED
    }

    pub fn effective_score(&self) -> f64 {
        self.overall_score.unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterviewRow {
    pub id: Uuid,
    pub candidate_email: String,
    pub job_id: Uuid,
    pub transcript: Option<String>,
    pub ai_score: Option<f64>,
    pub recording_url: Option<String>,
    pub interview_status: String,
    pub created_at: DateTime<Utc>,
}

impl InterviewRow {
    pub fn has_transcript(&self) -> bool {
        self.transcript
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty())
    }

    pub fn effective_score(&self) -> f64 {
        self.ai_score.unwrap_or(0.0)
    }
}
