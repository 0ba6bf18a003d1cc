use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::models::candidate::{CandidateRow, InterviewRow, JobRow, McqResultRow, TechnicalResultRow};
use crate::models::shortlist::{ShortlistOutcome, ShortlistOutcomeRow};
use crate::store::{CandidateFilter, RecordStore, StoreError};

/// `RecordStore` backed by the managed Postgres database.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn list_candidates(
        &self,
        tenant_id: Uuid,
        filter: &CandidateFilter,
    ) -> Result<Vec<CandidateRow>, StoreError> {
        let rows = sqlx::query_as::<_, CandidateRow>(
            r#"
            SELECT id, user_id, job_id, name, email, phone, location, experience_years,
                   skills, resume_summary, ats_score, ats_breakdown, created_at
            FROM candidates
            WHERE user_id = $1
              AND ($2::uuid IS NULL OR job_id = $2)
              AND ($3::uuid[] IS NULL OR id = ANY($3))
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(tenant_id)
        .bind(filter.job_id)
        .bind(filter.candidate_ids.as_deref())
        .fetch_all(&self.pool)
        .await?;

        debug!("Loaded {} candidates for tenant {tenant_id}", rows.len());
        Ok(rows)
    }

    async fn get_job(&self, job_id: Uuid) -> Result<Option<JobRow>, StoreError> {
        Ok(sqlx::query_as::<_, JobRow>(
            r#"
            SELECT id, user_id, title, department, experience_level, description,
                   requirements, skills, created_at
            FROM jobs
            WHERE id = $1
            "#,
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn latest_completed_mcq(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
    ) -> Result<Option<McqResultRow>, StoreError> {
        Ok(sqlx::query_as::<_, McqResultRow>(
            r#"
            SELECT id, candidate_id, job_id, status, score, percentage, passed,
                   total_questions, correct_answers, completed_at, created_at
            FROM mcq_test_results
            WHERE candidate_id = $1 AND job_id = $2 AND status = 'completed'
            ORDER BY completed_at DESC NULLS LAST, created_at DESC
            LIMIT 1
            "#,
        )
        .bind(candidate_id)
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn latest_completed_technical(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
    ) -> Result<Option<TechnicalResultRow>, StoreError> {
        Ok(sqlx::query_as::<_, TechnicalResultRow>(
            r#"
            SELECT id, candidate_id, job_id, status, overall_score, code_quality_score,
                   correctness_score, approach_score, communication_score, feedback,
                   completed_at, created_at
            FROM technical_test_results
            WHERE candidate_id = $1 AND job_id = $2 AND status = 'completed'
            ORDER BY completed_at DESC NULLS LAST, created_at DESC
            LIMIT 1
            "#,
        )
        .bind(candidate_id)
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn latest_interview(
        &self,
        email: &str,
        job_id: Uuid,
    ) -> Result<Option<InterviewRow>, StoreError> {
        Ok(sqlx::query_as::<_, InterviewRow>(
            r#"
            SELECT id, candidate_email, job_id, transcript, ai_score, recording_url,
                   interview_status, created_at
            FROM interviews
            WHERE candidate_email = $1 AND job_id = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(email)
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn upsert_shortlist(
        &self,
        outcome: &ShortlistOutcome,
    ) -> Result<ShortlistOutcomeRow, StoreError> {
        // updated_at must move forward even when two writes land in the same microsecond.
        let row = sqlx::query_as::<_, ShortlistOutcomeRow>(
            r#"
            INSERT INTO shortlisted_candidates
                (id, user_id, job_id, name, email, ats_score, mcq_score, technical_score,
                 interview_score, overall_score, status, recommendation, confidence,
                 hire_readiness, priority, analysis)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            ON CONFLICT (id) DO UPDATE SET
                user_id = EXCLUDED.user_id,
                job_id = EXCLUDED.job_id,
                name = EXCLUDED.name,
                email = EXCLUDED.email,
                ats_score = EXCLUDED.ats_score,
                mcq_score = EXCLUDED.mcq_score,
                technical_score = EXCLUDED.technical_score,
                interview_score = EXCLUDED.interview_score,
                overall_score = EXCLUDED.overall_score,
                status = EXCLUDED.status,
                recommendation = EXCLUDED.recommendation,
                confidence = EXCLUDED.confidence,
                hire_readiness = EXCLUDED.hire_readiness,
                priority = EXCLUDED.priority,
                analysis = EXCLUDED.analysis,
                updated_at = GREATEST(NOW(), shortlisted_candidates.updated_at + INTERVAL '1 microsecond')
            RETURNING *
            "#,
        )
        .bind(outcome.id)
        .bind(outcome.user_id)
        .bind(outcome.job_id)
        .bind(&outcome.name)
        .bind(&outcome.email)
        .bind(outcome.ats_score)
        .bind(outcome.mcq_score)
        .bind(outcome.technical_score)
        .bind(outcome.interview_score)
        .bind(outcome.overall_score)
        .bind(outcome.status.as_str())
        .bind(&outcome.recommendation)
        .bind(outcome.confidence)
        .bind(&outcome.hire_readiness)
        .bind(&outcome.priority)
        .bind(&outcome.analysis)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list_shortlist(
        &self,
        tenant_id: Uuid,
        job_id: Option<Uuid>,
    ) -> Result<Vec<ShortlistOutcomeRow>, StoreError> {
        Ok(sqlx::query_as::<_, ShortlistOutcomeRow>(
            r#"
            SELECT * FROM shortlisted_candidates
            WHERE user_id = $1 AND ($2::uuid IS NULL OR job_id = $2)
            ORDER BY overall_score DESC, updated_at DESC
            "#,
        )
        .bind(tenant_id)
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_shortlist(
        &self,
        tenant_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Option<ShortlistOutcomeRow>, StoreError> {
        Ok(sqlx::query_as::<_, ShortlistOutcomeRow>(
            "SELECT * FROM shortlisted_candidates WHERE id = $1 AND user_id = $2",
        )
        .bind(candidate_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?)
    }
}
