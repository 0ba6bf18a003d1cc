// Prompt constants for the holistic candidate evaluation.
// Cross-cutting fragments live in llm_client::prompts.

/// System prompt for candidate evaluation.
pub const EVALUATION_SYSTEM: &str = "You are a senior technical recruiter and hiring manager. \
    You evaluate candidates holistically from their resume match, aptitude test, \
    technical practical and AI video interview, and make a clear shortlist or reject decision. \
    Be fair, specific and evidence-based. Base every statement on the data provided.";

/// Evaluation prompt template. Every `{placeholder}` is replaced before sending.
pub const EVALUATION_PROMPT_TEMPLATE: &str = r#"Evaluate the following candidate for the position below and decide whether to shortlist them.

## Position
Title: {job_title}
Department: {job_department}
Experience level: {job_experience_level}
Required skills: {job_skills}
Description: {job_description}
Requirements: {job_requirements}

## Candidate
Name: {candidate_name}
Email: {candidate_email}
Location: {candidate_location}
Years of experience: {candidate_experience}
Skills: {candidate_skills}
Resume summary: {candidate_summary}

## Assessment results
1. Resume / ATS match: {ats_score}/100
   Breakdown: {ats_breakdown}
2. MCQ aptitude test: {mcq_score}%
   Correct answers: {mcq_correct} of {mcq_total}, passed: {mcq_passed}
3. Technical practical: {technical_score}/100
   Code quality: {technical_code_quality}, correctness: {technical_correctness}, approach: {technical_approach}, communication: {technical_communication}
   Reviewer feedback: {technical_feedback}
4. AI video interview: {interview_score}/100
   Transcript:
"""
{interview_transcript}
"""

Overall score (mean of scored stages): {overall_score}/100

Return a JSON object with this EXACT schema:
{
  "recommendation": "shortlist" | "reject",
  "confidence": <integer 0-100>,
  "total_score": <integer 0-100>,
  "strengths": ["<strength>", "..."],
  "weaknesses": ["<weakness>", "..."],
  "resume_analysis": "<one paragraph on resume fit>",
  "mcq_analysis": "<one paragraph on the aptitude test>",
  "technical_analysis": "<one paragraph on the technical practical>",
  "interview_analysis": "<one paragraph on the interview>",
  "overall_assessment": "<two or three sentences>",
  "hire_readiness": "ready" | "needs_development" | "not_ready",
  "priority": "high" | "medium" | "low"
}

Rules:
- Shortlist only candidates who would plausibly succeed in this role.
- A single weak stage does not disqualify a candidate whose other stages are strong; explain the trade-off.
- Strengths and weaknesses must cite concrete evidence from the results above."#;
