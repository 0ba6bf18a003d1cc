//! Evaluation Prompt Builder — pure rendering of an aggregated candidate into
//! the evaluation prompt, plus the derived overall score.

use serde::Serialize;

use crate::shortlist::aggregator::EligibleCandidate;
use crate::shortlist::prompts::{EVALUATION_PROMPT_TEMPLATE, EVALUATION_SYSTEM};

/// Interview transcripts beyond this many characters are cut before prompting.
const MAX_TRANSCRIPT_CHARS: usize = 6000;
const NOT_PROVIDED: &str = "not provided";

/// The four stage scores on a 0–100 scale. Zero means "not scored".
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StageScores {
    pub ats: f64,
    pub mcq: f64,
    pub technical: f64,
    pub interview: f64,
}

impl StageScores {
    pub fn from_candidate(c: &EligibleCandidate) -> Self {
        Self {
            ats: c.candidate.ats(),
            mcq: c.mcq.effective_score(),
            technical: c.technical.effective_score(),
            interview: c.interview.effective_score(),
        }
    }

    /// Rounded mean of the non-zero scores; 0 when nothing was scored.
    pub fn overall(&self) -> i32 {
        let scored: Vec<f64> = [self.ats, self.mcq, self.technical, self.interview]
            .into_iter()
            .filter(|s| *s != 0.0)
            .collect();
        if scored.is_empty() {
            return 0;
        }
        let mean = scored.iter().sum::<f64>() / scored.len() as f64;
        mean.round() as i32
    }
}

/// A rendered evaluation request for one candidate.
#[derive(Debug, Clone)]
pub struct EvaluationPrompt {
    pub system: &'static str,
    pub user: String,
    pub scores: StageScores,
    pub overall_score: i32,
}

/// Renders the evaluation prompt. Deterministic for identical input.
pub fn build_evaluation_prompt(c: &EligibleCandidate) -> EvaluationPrompt {
    let scores = StageScores::from_candidate(c);
    let overall_score = scores.overall();
    let job = c.job.as_ref();
    let candidate = &c.candidate;

    let values: Vec<(&str, String)> = vec![
        ("job_title", job.map(|j| j.title.clone()).unwrap_or_else(|| NOT_PROVIDED.to_string())),
        ("job_department", text_or_missing(job.and_then(|j| j.department.as_deref()))),
        ("job_experience_level", text_or_missing(job.and_then(|j| j.experience_level.as_deref()))),
        ("job_skills", list_or_missing(job.and_then(|j| j.skills.as_deref()))),
        ("job_description", text_or_missing(job.and_then(|j| j.description.as_deref()))),
        ("job_requirements", text_or_missing(job.and_then(|j| j.requirements.as_deref()))),
        ("candidate_name", candidate.name.clone()),
        ("candidate_email", candidate.email.clone()),
        ("candidate_location", text_or_missing(candidate.location.as_deref())),
        ("candidate_experience", number_or_missing(candidate.experience_years)),
        ("candidate_skills", list_or_missing(candidate.skills.as_deref())),
        ("candidate_summary", text_or_missing(candidate.resume_summary.as_deref())),
        ("ats_score", format_score(scores.ats)),
        (
            "ats_breakdown",
            candidate
                .ats_breakdown
                .as_ref()
                .map(|b| b.to_string())
                .unwrap_or_else(|| NOT_PROVIDED.to_string()),
        ),
        ("mcq_score", format_score(scores.mcq)),
        ("mcq_correct", int_or_missing(c.mcq.correct_answers)),
        ("mcq_total", int_or_missing(c.mcq.total_questions)),
        (
            "mcq_passed",
            match c.mcq.passed {
                Some(true) => "yes".to_string(),
                Some(false) => "no".to_string(),
                None => NOT_PROVIDED.to_string(),
            },
        ),
        ("technical_score", format_score(scores.technical)),
        ("technical_code_quality", number_or_missing(c.technical.code_quality_score)),
        ("technical_correctness", number_or_missing(c.technical.correctness_score)),
        ("technical_approach", number_or_missing(c.technical.approach_score)),
        ("technical_communication", number_or_missing(c.technical.communication_score)),
        ("technical_feedback", text_or_missing(c.technical.feedback.as_deref())),
        ("interview_score", format_score(scores.interview)),
        (
            "interview_transcript",
            truncate_chars(c.interview.transcript.as_deref().unwrap_or_default(), MAX_TRANSCRIPT_CHARS),
        ),
        ("overall_score", overall_score.to_string()),
    ];

    EvaluationPrompt {
        system: EVALUATION_SYSTEM,
        user: render_template(EVALUATION_PROMPT_TEMPLATE, &values),
        scores,
        overall_score,
    }
}

/// Substitutes `{key}` placeholders in a single pass, so placeholder-like text
/// inside substituted values (resumes, transcripts) is never expanded again.
/// Unknown `{...}` spans are copied through unchanged.
fn render_template(template: &str, values: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len() + 1024);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replaced = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (v, close))
        });
        match replaced {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn format_score(score: f64) -> String {
    if score == 0.0 {
        "not scored".to_string()
    } else {
        format!("{score:.0}")
    }
}

fn text_or_missing(text: Option<&str>) -> String {
    match text.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => NOT_PROVIDED.to_string(),
    }
}

fn list_or_missing(items: Option<&[String]>) -> String {
    match items {
        Some(items) if !items.is_empty() => items.join(", "),
        _ => NOT_PROVIDED.to_string(),
    }
}

fn number_or_missing(n: Option<f64>) -> String {
    n.map(|n| format!("{n:.0}"))
        .unwrap_or_else(|| NOT_PROVIDED.to_string())
}

fn int_or_missing(n: Option<i32>) -> String {
    n.map(|n| n.to_string())
        .unwrap_or_else(|| NOT_PROVIDED.to_string())
}

fn truncate_chars(text: &str, max: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{} [transcript truncated]", &text[..cut]),
        None => text.to_string(),
    }
}
