use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::llm_client::ModelInfo;
use crate::state::AppState;

/// GET /
pub async fn root_handler() -> Json<Value> {
    Json(json!({ "status": "AI Resume Matcher API is running" }))
}

/// GET /health
/// Returns a simple status object with service version.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "matcher-api",
        "model": state.config.gemini_model,
    }))
}

/// GET /models
/// Lists models available to the configured API key.
pub async fn models_handler(State(state): State<AppState>) -> Result<Json<Vec<ModelInfo>>, AppError> {
    let models = state
        .reasoning
        .list_models()
        .await
        .map_err(|e| AppError::Service(e.to_string()))?;
    Ok(Json(models))
}
