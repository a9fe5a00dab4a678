//! Axum route handlers for single and batch analysis.

use axum::extract::{Multipart, State};
use axum::Json;
use tracing::info;

use crate::analysis::batch::BatchResult;
use crate::analysis::verdict::Verdict;
use crate::errors::AppError;
use crate::staging::{StagedFile, UploadStaging};
use crate::state::AppState;

/// Parsed multipart form: staged files plus the job description.
struct UploadForm {
    staging: UploadStaging,
    files: Vec<StagedFile>,
    job_text: String,
}

/// Reads the multipart body, staging every field named `file_field` and
/// collecting `job_text`.
async fn read_upload_form(mut multipart: Multipart, file_field: &str) -> Result<UploadForm, AppError> {
    let mut staging = UploadStaging::new()?;
    let mut files = Vec::new();
    let mut job_text = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read multipart: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("job_text") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read job_text: {e}")))?;
                job_text = Some(text);
            }
            Some(name) if name == file_field => files.push(staging.stage_field(field).await?),
            _ => {}
        }
    }

    let job_text = job_text
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| AppError::Validation("job_text cannot be empty".to_string()))?;

    if files.is_empty() {
        return Err(AppError::Validation(format!("{file_field} is required")));
    }

    Ok(UploadForm {
        staging,
        files,
        job_text,
    })
}

/// POST /analyze
///
/// Multipart `resume_file` + `job_text`. Returns the Verdict, or a typed
/// error when the resume is unreadable or the AI service fails.
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Verdict>, AppError> {
    let UploadForm {
        staging,
        files,
        job_text,
    } = read_upload_form(multipart, "resume_file").await?;

    if files.len() > 1 {
        return Err(AppError::Validation(
            "Exactly one resume_file is expected; use /analyze-batch for several".to_string(),
        ));
    }

    let file = &files[0];
    info!(filename = %file.filename, bytes = file.size, "Analyzing resume");

    let document = staging.load(file).await?;
    staging.close();

    let verdict = state.analyzer.analyze(document, &job_text).await?;
    Ok(Json(verdict))
}

/// POST /analyze-batch
///
/// Multipart `resume_files` (repeated) + `job_text`. Every submitted file
/// keeps its position in the result; failures are tagged, never dropped.
pub async fn handle_analyze_batch(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<BatchResult>, AppError> {
    let UploadForm {
        staging,
        files,
        job_text,
    } = read_upload_form(multipart, "resume_files").await?;

    let documents = staging.load_batch(&files).await;
    staging.close();

    info!(count = documents.len(), "Analyzing resume batch");

    let cancel = state.shutdown.child_token();
    let result = state
        .batch
        .analyze_batch(documents, &job_text, &cancel)
        .await?;

    Ok(Json(result))
}
