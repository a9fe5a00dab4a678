//! Single Analyzer: Extractor -> Prompt Builder -> Analysis Client for one
//! resume/job pair. Persists nothing.

use tokio::task::JoinError;
use tracing::{error, info};

use crate::analysis::client::AnalysisClient;
use crate::analysis::prompts::{build_request, AnalysisRequest};
use crate::analysis::verdict::{ErrorVerdict, Verdict};
use crate::extraction::{extract, ExtractedText, RawDocument};

#[derive(Clone)]
pub struct SingleAnalyzer {
    client: AnalysisClient,
}

impl SingleAnalyzer {
    pub fn new(client: AnalysisClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &AnalysisClient {
        &self.client
    }

    pub async fn analyze(&self, document: RawDocument, job_text: &str) -> Result<Verdict, ErrorVerdict> {
        let filename = document.filename.clone();
        let request = self.prepare(document, job_text).await?;
        let verdict = self.client.invoke(&request).await?;

        info!(
            filename = %filename,
            match_score = verdict.match_score,
            status = verdict.status.as_str(),
            "Resume analyzed"
        );
        Ok(verdict)
    }

    /// Extracts the resume text and renders the request. Consumes the
    /// document: raw bytes do not outlive extraction.
    pub async fn prepare(
        &self,
        document: RawDocument,
        job_text: &str,
    ) -> Result<AnalysisRequest, ErrorVerdict> {
        let filename = document.filename.clone();

        // Parsing is CPU-bound; keep it off the async workers.
        let joined = tokio::task::spawn_blocking(move || extract(&document)).await;
        let text = joined_text(joined, &filename)?;

        if text.is_empty() {
            return Err(ErrorVerdict::unreadable(format!(
                "Could not extract text from the resume '{filename}'"
            )));
        }

        Ok(build_request(text.as_str(), job_text))
    }
}

/// A failed join means the extraction task panicked or was cancelled.
fn joined_text(
    joined: Result<ExtractedText, JoinError>,
    filename: &str,
) -> Result<ExtractedText, ErrorVerdict> {
    joined.map_err(|e| {
        error!(filename = %filename, "Extraction task failed: {e}");
        ErrorVerdict::internal(format!("Extraction of '{filename}' did not complete: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::analysis::verdict::{ErrorKind, Status};
    use crate::extraction::DocumentFormat;
    use crate::llm_client::mock::MockReasoningService;

    const JOB: &str = "Looking for a Python Developer who knows FastAPI and SQL.";

    fn analyzer(service: Arc<MockReasoningService>) -> SingleAnalyzer {
        SingleAnalyzer::new(AnalysisClient::new(service, Duration::from_secs(30), 70))
    }

    fn txt(name: &str, text: &str) -> RawDocument {
        RawDocument::new(name, DocumentFormat::PlainText, text.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn test_matching_resume_is_accepted() {
        let service = Arc::new(MockReasoningService::fixed(
            r#"{"match_score": 82, "matched_skills":["Python","FastAPI"], "missing_skills":["SQL"], "suggestions":["Mention SQL experience"]}"#,
        ));
        let resume = txt(
            "resume.txt",
            "Skilled in Python, FastAPI, and PostgreSQL. 3 years experience.",
        );

        let verdict = analyzer(service).analyze(resume, JOB).await.unwrap();
        assert_eq!(verdict.match_score, 82);
        assert_eq!(verdict.status, Status::Accepted);
        assert_eq!(verdict.matched_skills, vec!["Python", "FastAPI"]);
        assert_eq!(verdict.suggestions, vec!["Mention SQL experience"]);
    }

    #[tokio::test]
    async fn test_unrelated_resume_is_rejected() {
        let service = Arc::new(MockReasoningService::fixed(
            r#"{"match_score": 40, "matched_skills":[], "missing_skills":["Python","FastAPI","SQL"], "suggestions":[]}"#,
        ));
        let resume = txt("resume.txt", "Pastry chef. Laminated doughs and sugar work.");

        let verdict = analyzer(service).analyze(resume, JOB).await.unwrap();
        assert_eq!(verdict.status, Status::Rejected);
    }

    #[tokio::test]
    async fn test_unreadable_document_fails_fast() {
        let service = Arc::new(MockReasoningService::fixed(r#"{"match_score": 90}"#));
        let empty_pdf = RawDocument::new("resume.pdf", DocumentFormat::Pdf, Vec::new());

        let err = analyzer(service.clone())
            .analyze(empty_pdf, JOB)
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::UnreadableDocument);
        assert!(err.detail.contains("resume.pdf"));
        assert_eq!(service.calls(), 0, "service must not be called");
    }

    #[tokio::test]
    async fn test_rerun_on_identical_input_is_idempotent() {
        let service = Arc::new(MockReasoningService::fixed(
            r#"{"candidate_name":"Jane","match_score": 77.9, "matched_skills":["Python"]}"#,
        ));
        let analyzer = analyzer(service);

        let first = analyzer
            .analyze(txt("a.txt", "Python and FastAPI"), JOB)
            .await
            .unwrap();
        let second = analyzer
            .analyze(txt("a.txt", "Python and FastAPI"), JOB)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first.match_score, 77);
    }

    #[tokio::test]
    async fn test_prepare_uses_trimmed_text() {
        let service = Arc::new(MockReasoningService::fixed("{}"));
        let request = analyzer(service)
            .prepare(txt("a.txt", "\n  Rust engineer  \n"), JOB)
            .await
            .unwrap();

        assert_eq!(request.resume_text(), "Rust engineer");
        assert_eq!(request.job_text(), JOB);
    }

    #[tokio::test]
    async fn test_failed_extraction_task_is_internal() {
        let joined = tokio::task::spawn_blocking(|| -> ExtractedText { panic!("parser crashed") }).await;

        let err = joined_text(joined, "cv.pdf").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InternalError);
        assert!(err.detail.contains("cv.pdf"));
    }
}
