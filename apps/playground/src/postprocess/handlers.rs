//! Axum route handler for re-processing a response with new pipeline flags.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;
use crate::postprocess::{process_response, ParseOutcome, PipelineConfig};
use crate::session;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    pub text: String,
    /// Falls back to the saved pipeline flags.
    pub pipeline: Option<PipelineConfig>,
    pub section: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub processed_text: String,
    pub parse: ParseOutcome,
    pub section: Option<Value>,
    pub pipeline: PipelineConfig,
}

/// POST /api/v1/responses/process
///
/// Re-renders a response already received, so toggling a flag never costs a
/// new model call.
pub async fn handle_process(
    State(state): State<AppState>,
    Json(request): Json<ProcessRequest>,
) -> Result<Json<ProcessResponse>, AppError> {
    if request.text.is_empty() {
        return Err(AppError::Validation("text cannot be empty".to_string()));
    }

    let pipeline = match request.pipeline {
        Some(pipeline) => pipeline,
        None => session::load_settings(state.store.as_ref())?.pipeline,
    };

    let processed = process_response(&request.text, &pipeline);
    let section = request
        .section
        .as_deref()
        .and_then(|key| processed.parse.section(key))
        .cloned();

    Ok(Json(ProcessResponse {
        processed_text: processed.processed_text,
        parse: processed.parse,
        section,
        pipeline,
    }))
}
