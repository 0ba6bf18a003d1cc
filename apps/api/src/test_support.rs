//! In-memory doubles for the external collaborators, shared by unit and router tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::auth::{AuthError, Tenant, TokenVerifier};
use crate::llm_client::{CompletionRequest, CompletionService, LlmError};
use crate::models::candidate::{CandidateRow, InterviewRow, JobRow, McqResultRow, TechnicalResultRow};
use crate::models::shortlist::{ShortlistOutcome, ShortlistOutcomeRow};
use crate::store::{CandidateFilter, RecordStore, StoreError};

// ────────────────────────────────────────────────────────────────────────────
// Record store
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Tables {
    candidates: Vec<CandidateRow>,
    jobs: HashMap<Uuid, JobRow>,
    mcq: Vec<McqResultRow>,
    technical: Vec<TechnicalResultRow>,
    interviews: Vec<InterviewRow>,
    shortlist: HashMap<Uuid, ShortlistOutcomeRow>,
    failing_reads: HashSet<Uuid>,
    failing_upserts: HashSet<Uuid>,
}

/// `RecordStore` over plain vectors with the same ordering and upsert rules as Postgres.
#[derive(Default)]
pub struct MemoryRecordStore {
    tables: Mutex<Tables>,
    reads: AtomicUsize,
}

impl MemoryRecordStore {
    pub fn add_candidate(&self, row: CandidateRow) {
        self.tables.lock().unwrap().candidates.push(row);
    }

    pub fn add_job(&self, row: JobRow) {
        self.tables.lock().unwrap().jobs.insert(row.id, row);
    }

    pub fn add_mcq(&self, row: McqResultRow) {
        self.tables.lock().unwrap().mcq.push(row);
    }

    pub fn add_technical(&self, row: TechnicalResultRow) {
        self.tables.lock().unwrap().technical.push(row);
    }

    pub fn add_interview(&self, row: InterviewRow) {
        self.tables.lock().unwrap().interviews.push(row);
    }

    /// Stage lookups for this candidate fail from now on.
    pub fn fail_reads_for(&self, candidate_id: Uuid) {
        self.tables.lock().unwrap().failing_reads.insert(candidate_id);
    }

    pub fn fail_upserts_for(&self, candidate_id: Uuid) {
        self.tables.lock().unwrap().failing_upserts.insert(candidate_id);
    }

    pub fn shortlist_rows(&self) -> Vec<ShortlistOutcomeRow> {
        self.tables.lock().unwrap().shortlist.values().cloned().collect()
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn tables(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.tables.lock().unwrap()
    }
}

fn rejected(candidate_id: Uuid) -> StoreError {
    StoreError::Rejected(format!("simulated failure for {candidate_id}"))
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn list_candidates(
        &self,
        tenant_id: Uuid,
        filter: &CandidateFilter,
    ) -> Result<Vec<CandidateRow>, StoreError> {
        let tables = self.tables();
        let mut rows: Vec<CandidateRow> = tables
            .candidates
            .iter()
            .filter(|c| c.user_id == tenant_id)
            .filter(|c| filter.job_id.map_or(true, |job| c.job_id == Some(job)))
            .filter(|c| {
                filter
                    .candidate_ids
                    .as_ref()
                    .map_or(true, |ids| ids.contains(&c.id))
            })
            .cloned()
            .collect();
        rows.sort_by_key(|c| c.created_at);
        Ok(rows)
    }

    async fn get_job(&self, job_id: Uuid) -> Result<Option<JobRow>, StoreError> {
        Ok(self.tables().jobs.get(&job_id).cloned())
    }

    async fn latest_completed_mcq(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
    ) -> Result<Option<McqResultRow>, StoreError> {
        let tables = self.tables();
        if tables.failing_reads.contains(&candidate_id) {
            return Err(rejected(candidate_id));
        }
        Ok(tables
            .mcq
            .iter()
            .filter(|r| r.candidate_id == candidate_id && r.job_id == job_id && r.is_completed())
            .max_by_key(|r| (r.completed_at, r.created_at))
            .cloned())
    }

    async fn latest_completed_technical(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
    ) -> Result<Option<TechnicalResultRow>, StoreError> {
        let tables = self.tables();
        if tables.failing_reads.contains(&candidate_id) {
            return Err(rejected(candidate_id));
        }
        Ok(tables
            .technical
            .iter()
            .filter(|r| r.candidate_id == candidate_id && r.job_id == job_id && r.is_completed())
            .max_by_key(|r| (r.completed_at, r.created_at))
            .cloned())
    }

    async fn latest_interview(
        &self,
        email: &str,
        job_id: Uuid,
    ) -> Result<Option<InterviewRow>, StoreError> {
        Ok(self
            .tables()
            .interviews
            .iter()
            .filter(|r| r.candidate_email == email && r.job_id == job_id)
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn upsert_shortlist(
        &self,
        outcome: &ShortlistOutcome,
    ) -> Result<ShortlistOutcomeRow, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.failing_upserts.contains(&outcome.id) {
            return Err(rejected(outcome.id));
        }

        let now = Utc::now();
        let (created_at, updated_at) = match tables.shortlist.get(&outcome.id) {
            Some(prev) => (
                prev.created_at,
                now.max(prev.updated_at + Duration::microseconds(1)),
            ),
            None => (now, now),
        };

        let row = ShortlistOutcomeRow {
            id: outcome.id,
            user_id: outcome.user_id,
            job_id: outcome.job_id,
            name: outcome.name.clone(),
            email: outcome.email.clone(),
            ats_score: outcome.ats_score,
            mcq_score: outcome.mcq_score,
            technical_score: outcome.technical_score,
            interview_score: outcome.interview_score,
            overall_score: outcome.overall_score,
            status: outcome.status.as_str().to_string(),
            recommendation: outcome.recommendation.clone(),
            confidence: outcome.confidence,
            hire_readiness: outcome.hire_readiness.clone(),
            priority: outcome.priority.clone(),
            analysis: outcome.analysis.clone(),
            created_at,
            updated_at,
        };
        tables.shortlist.insert(row.id, row.clone());
        Ok(row)
    }

    async fn list_shortlist(
        &self,
        tenant_id: Uuid,
        job_id: Option<Uuid>,
    ) -> Result<Vec<ShortlistOutcomeRow>, StoreError> {
        let mut rows: Vec<_> = self
            .tables()
            .shortlist
            .values()
            .filter(|r| r.user_id == tenant_id && job_id.map_or(true, |j| r.job_id == j))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.overall_score
                .cmp(&a.overall_score)
                .then(b.updated_at.cmp(&a.updated_at))
        });
        Ok(rows)
    }

    async fn get_shortlist(
        &self,
        tenant_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Option<ShortlistOutcomeRow>, StoreError> {
        Ok(self
            .tables()
            .shortlist
            .get(&candidate_id)
            .filter(|r| r.user_id == tenant_id)
            .cloned())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Completion service
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail(String),
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: String,
    pub user: String,
    pub json_mode: bool,
}

/// Replays scripted replies, either in call order or keyed by a substring of the user prompt.
pub struct ScriptedCompletion {
    queue: Mutex<VecDeque<Reply>>,
    keyed: Vec<(String, Reply)>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedCompletion {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            queue: Mutex::new(replies.into()),
            keyed: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call whose prompt contains `needle` gets the paired reply.
    pub fn keyed(rules: Vec<(&str, Reply)>) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            keyed: rules.into_iter().map(|(k, r)| (k.to_string(), r)).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(RecordedCall {
            model: request.model.to_string(),
            user: request.user.to_string(),
            json_mode: request.json_mode,
        });

        let reply = if self.keyed.is_empty() {
            self.queue.lock().unwrap().pop_front()
        } else {
            self.keyed
                .iter()
                .find(|(needle, _)| request.user.contains(needle.as_str()))
                .map(|(_, reply)| reply.clone())
        };

        match reply {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Fail(message)) => Err(LlmError::Api {
                status: 500,
                message,
            }),
            None => Err(LlmError::EmptyContent),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Auth
// ────────────────────────────────────────────────────────────────────────────

/// Accepts exactly the tokens it was built with.
#[derive(Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, Tenant>,
}

impl StaticTokenVerifier {
    pub fn with_token(mut self, token: &str, tenant_id: Uuid) -> Self {
        self.tokens.insert(
            token.to_string(),
            Tenant {
                id: tenant_id,
                email: Some("recruiter@example.com".to_string()),
            },
        );
        self
    }
}

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<Tenant, AuthError> {
        self.tokens.get(token).cloned().ok_or(AuthError::InvalidToken)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Fixtures
// ────────────────────────────────────────────────────────────────────────────

pub mod fixtures {
    use super::*;
    use crate::shortlist::aggregator::EligibleCandidate;

    pub fn job(tenant_id: Uuid, title: &str) -> JobRow {
        JobRow {
            id: Uuid::new_v4(),
            user_id: tenant_id,
            title: title.to_string(),
            department: Some("Engineering".to_string()),
            experience_level: Some("mid".to_string()),
            description: Some(format!("We are hiring a {title}.")),
            requirements: Some("3+ years of production experience".to_string()),
            skills: Some(vec!["Rust".to_string(), "SQL".to_string()]),
            created_at: Utc::now(),
        }
    }

    pub fn candidate(tenant_id: Uuid, job_id: Uuid, name: &str, ats: f64) -> CandidateRow {
        CandidateRow {
            id: Uuid::new_v4(),
            user_id: tenant_id,
            job_id: Some(job_id),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: None,
            location: Some("Remote".to_string()),
            experience_years: Some(4.0),
            skills: Some(vec!["Rust".to_string()]),
            resume_summary: Some("Backend engineer focused on APIs.".to_string()),
            ats_score: Some(ats),
            ats_breakdown: None,
            created_at: Utc::now(),
        }
    }

    fn job_of(c: &CandidateRow) -> Uuid {
        c.job_id.unwrap_or_else(Uuid::nil)
    }

    pub fn mcq(c: &CandidateRow, status: &str, percentage: f64) -> McqResultRow {
        McqResultRow {
            id: Uuid::new_v4(),
            candidate_id: c.id,
            job_id: job_of(c),
            status: status.to_string(),
            score: Some(percentage / 10.0),
            percentage: Some(percentage),
            passed: Some(percentage >= 60.0),
            total_questions: Some(10),
            correct_answers: Some((percentage / 10.0).round() as i32),
            completed_at: (status == "completed").then(Utc::now),
            created_at: Utc::now(),
        }
    }

    pub fn technical(c: &CandidateRow, status: &str, overall: f64) -> TechnicalResultRow {
        TechnicalResultRow {
            id: Uuid::new_v4(),
            candidate_id: c.id,
            job_id: job_of(c),
            status: status.to_string(),
            overall_score: Some(overall),
            code_quality_score: Some(overall),
            correctness_score: Some(overall),
            approach_score: Some(overall),
            communication_score: Some(overall),
            feedback: Some("Solid solution.".to_string()),
            completed_at: (status == "completed").then(Utc::now),
            created_at: Utc::now(),
        }
    }

    pub fn interview(c: &CandidateRow, transcript: Option<&str>, score: f64) -> InterviewRow {
        InterviewRow {
            id: Uuid::new_v4(),
            candidate_email: c.email.clone(),
            job_id: job_of(c),
            transcript: transcript.map(String::from),
            ai_score: Some(score),
            recording_url: None,
            interview_status: "completed".to_string(),
            created_at: Utc::now(),
        }
    }

    /// Adds a completed MCQ, technical practical and transcribed interview.
    pub fn complete_all_stages(
        store: &MemoryRecordStore,
        c: &CandidateRow,
        mcq_pct: f64,
        technical_score: f64,
        interview_score: f64,
    ) {
        store.add_mcq(mcq(c, "completed", mcq_pct));
        store.add_technical(technical(c, "completed", technical_score));
        store.add_interview(interview(
            c,
            Some("Interviewer: Tell me about yourself. Candidate: I build backend services."),
            interview_score,
        ));
    }

    pub fn eligible(
        tenant_id: Uuid,
        name: &str,
        ats: f64,
        mcq_pct: f64,
        technical_score: f64,
        interview_score: f64,
    ) -> EligibleCandidate {
        let job = job(tenant_id, "Backend Engineer");
        let c = candidate(tenant_id, job.id, name, ats);
        EligibleCandidate {
            mcq: mcq(&c, "completed", mcq_pct),
            technical: technical(&c, "completed", technical_score),
            interview: interview(&c, Some("We discussed system design."), interview_score),
            job_id: job.id,
            job: Some(job),
            candidate: c,
        }
    }
}
