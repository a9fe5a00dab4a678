#![allow(dead_code)]

// Prompt constants for resume analysis. Rendering is a pure function of the
// two input texts: no timestamps, no randomness.

/// Task framing for the ATS-style comparison.
pub const ATS_FRAMING: &str = "Act as an expert ATS (Applicant Tracking System). \
    Compare the following Resume and Job Description.";

/// Declared output schema. Field names must match `Verdict` exactly.
pub const VERDICT_SCHEMA: &str = r#"{
    "candidate_name": "Extract candidate full name",
    "email": "Extract email address",
    "phone": "Extract mobile number",
    "experience": "Extract total years of experience (e.g., 5 years)",
    "match_score": (integer between 0 and 100),
    "matched_skills": ["skill1", "skill2"],
    "missing_skills": ["skill1", "skill2"],
    "suggestions": ["suggestion1", "suggestion2"]
}"#;

/// Type rules that accompany the schema.
pub const SCHEMA_RULES: &str = "Field types: candidate_name, email, phone and experience are strings; \
    use \"unknown\" when the resume does not contain the value. \
    match_score is an integer between 0 and 100. \
    matched_skills, missing_skills and suggestions are arrays of strings. \
    Do NOT include any text outside the JSON object.";

/// An immutable analysis request: the two input texts, the rendered prompt
/// and the schema the response must follow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    resume_text: String,
    job_text: String,
    prompt: String,
    schema: &'static str,
}

impl AnalysisRequest {
    pub fn resume_text(&self) -> &str {
        &self.resume_text
    }

    pub fn job_text(&self) -> &str {
        &self.job_text
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn schema(&self) -> &'static str {
        self.schema
    }
}

/// Renders the analysis prompt. Both texts are inlined verbatim.
pub fn build_request(resume_text: &str, job_text: &str) -> AnalysisRequest {
    let prompt = format!(
        "{ATS_FRAMING}\n\n\
         RESUME:\n{resume_text}\n\n\
         JOB DESCRIPTION:\n{job_text}\n\n\
         Return ONLY a JSON object with this EXACT structure:\n{VERDICT_SCHEMA}\n\n\
         {SCHEMA_RULES}"
    );

    AnalysisRequest {
        resume_text: resume_text.to_string(),
        job_text: job_text.to_string(),
        prompt,
        schema: VERDICT_SCHEMA,
    }
}
