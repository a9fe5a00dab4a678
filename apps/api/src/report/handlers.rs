use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;

use crate::errors::AppError;
use crate::extraction::DOCX_MIME;
use crate::report::{render, ReportPayload, REPORT_FILENAME};
use crate::state::AppState;

/// POST /download-docx
///
/// Renders a single or batch report as a Word document attachment. Posted
/// verdicts are re-validated; scores are clamped and statuses re-derived.
pub async fn handle_download_docx(
    State(state): State<AppState>,
    Json(payload): Json<ReportPayload>,
) -> Result<impl IntoResponse, AppError> {
    let report = payload
        .normalize(state.config.accept_threshold)
        .map_err(|e| AppError::Validation(format!("Invalid verdict: {}", e.detail)))?;

    let bytes = render(&report).map_err(|e| AppError::Internal(e.into()))?;

    tracing::info!(bytes = bytes.len(), "Report rendered");

    Ok((
        [
            (header::CONTENT_TYPE, DOCX_MIME.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={REPORT_FILENAME}"),
            ),
        ],
        bytes,
    ))
}
