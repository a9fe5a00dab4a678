pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::report::handlers::handle_download_docx;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::health_handler))
        .route("/models", get(health::models_handler))
        .route("/analyze", post(handlers::handle_analyze))
        .route("/analyze-batch", post(handlers::handle_analyze_batch))
        .route("/download-docx", post(handle_download_docx))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::extraction::DOCX_MIME;
    use crate::llm_client::mock::MockReasoningService;

    const BOUNDARY: &str = "matcher-test-boundary";
    const JOB: &str = "Looking for a Python Developer who knows FastAPI and SQL.";
    const STUB_BODY: &str = r#"{"candidate_name":"Jane Doe","email":"jane@example.com","match_score": 82, "matched_skills":["Python","FastAPI"], "missing_skills":["SQL"], "suggestions":["Mention SQL experience"]}"#;

    fn test_config() -> Config {
        Config {
            gemini_api_key: "test-key".to_string(),
            gemini_model: "gemini-test".to_string(),
            gemini_api_base: "http://localhost:9".to_string(),
            llm_timeout: Duration::from_secs(5),
            accept_threshold: 70,
            batch_concurrency: 2,
            batch_max_retries: 0,
            max_upload_bytes: 1024 * 1024,
            port: 0,
            rust_log: "info".to_string(),
        }
    }

    fn app(service: MockReasoningService) -> Router {
        build_router(AppState::new(test_config(), Arc::new(service)))
    }

    enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a str, &'a str, &'a [u8]),
    }

    fn multipart_request(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                            .as_bytes(),
                    );
                }
                Part::File(name, filename, content_type, bytes) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                             Content-Type: {content_type}\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(bytes);
                    body.extend_from_slice(b"\r\n");
                }
            }
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_root_reports_running() {
        let response = app(MockReasoningService::fixed(STUB_BODY))
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "AI Resume Matcher API is running");
    }

    #[tokio::test]
    async fn test_analyze_returns_verdict() {
        let request = multipart_request(
            "/analyze",
            &[
                Part::Text("job_text", JOB),
                Part::File(
                    "resume_file",
                    "resume.txt",
                    "text/plain",
                    b"Skilled in Python, FastAPI, and PostgreSQL. 3 years experience.",
                ),
            ],
        );

        let response = app(MockReasoningService::fixed(STUB_BODY))
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["match_score"], 82);
        assert_eq!(body["status"], "Accepted");
        assert_eq!(body["candidate_name"], "Jane Doe");
        assert_eq!(body["phone"], Value::Null);
    }

    #[tokio::test]
    async fn test_analyze_unreadable_resume_is_bad_request() {
        let request = multipart_request(
            "/analyze",
            &[
                Part::Text("job_text", JOB),
                Part::File("resume_file", "resume.pdf", "application/pdf", b""),
            ],
        );

        let response = app(MockReasoningService::fixed(STUB_BODY))
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "UNREADABLE_DOCUMENT");
    }

    #[tokio::test]
    async fn test_analyze_requires_job_text() {
        let request = multipart_request(
            "/analyze",
            &[Part::File("resume_file", "resume.txt", "text/plain", b"Python")],
        );

        let response = app(MockReasoningService::fixed(STUB_BODY))
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_analyze_service_failure_is_bad_gateway() {
        let request = multipart_request(
            "/analyze",
            &[
                Part::Text("job_text", JOB),
                Part::File("resume_file", "resume.txt", "text/plain", b"Python"),
            ],
        );

        let response = app(MockReasoningService::failing(500))
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "SERVICE_ERROR");
    }

    #[tokio::test]
    async fn test_analyze_batch_records_every_position() {
        let request = multipart_request(
            "/analyze-batch",
            &[
                Part::File("resume_files", "alice.txt", "text/plain", b"Python FastAPI"),
                Part::File("resume_files", "bob.pdf", "application/pdf", b""),
                Part::File("resume_files", "carol.txt", "text/plain", b"Python SQL"),
                Part::Text("job_text", JOB),
            ],
        );

        let response = app(MockReasoningService::fixed(STUB_BODY))
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let items = body["items"].as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(body["analyzed"], 2);
        assert_eq!(body["skipped"], 1);

        assert_eq!(items[0]["filename"], "alice.txt");
        assert_eq!(items[0]["outcome"], "analyzed");
        assert_eq!(items[1]["filename"], "bob.pdf");
        assert_eq!(items[1]["outcome"], "failed");
        assert_eq!(items[1]["kind"], "UnreadableDocument");
        assert_eq!(items[2]["filename"], "carol.txt");
        assert_eq!(items[2]["status"], "Accepted");
    }

    #[tokio::test]
    async fn test_download_docx_returns_attachment() {
        let payload = serde_json::json!({
            "mode": "batch",
            "candidates": [
                {"name": "Jane Doe", "email": "jane@example.com", "score": 82, "status": "Accepted"},
                {"name": "John Roe", "score": 40, "status": "Rejected"}
            ]
        });
        let request = Request::post("/download-docx")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();

        let response = app(MockReasoningService::fixed(STUB_BODY))
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], DOCX_MIME);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=Analysis_Report.docx"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[tokio::test]
    async fn test_download_docx_rejects_unscored_verdict() {
        let payload = serde_json::json!({
            "mode": "single",
            "verdict": {"candidate_name": "Jane Doe", "status": "Accepted"}
        });
        let request = Request::post("/download-docx")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();

        let response = app(MockReasoningService::fixed(STUB_BODY))
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_models_without_discovery_is_empty() {
        let response = app(MockReasoningService::fixed(STUB_BODY))
            .oneshot(Request::get("/models").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, serde_json::json!([]));
    }
}
