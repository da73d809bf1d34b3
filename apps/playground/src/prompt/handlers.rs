//! Axum route handlers for templating, prompt assembly and generation.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::{GenerationConfig, LlmError, ModelInfo, Provider, Usage};
use crate::postprocess::{process_response, ParseOutcome, PipelineConfig};
use crate::prompt::{assemble, PromptParts};
use crate::session::{self, SessionSettings};
use crate::state::AppState;
use crate::template::{
    path_resolver, scanner, substitute_with_data, substitute_with_variables, Grammar,
    TemplateError, Variable, VariableStore,
};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub text: String,
    #[serde(default)]
    pub grammar: Grammar,
    /// Path grammar only: resolve each name against this data tree.
    pub data: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResolvedPath {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<ResolvedPath>>,
}

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    pub template: String,
    #[serde(default)]
    pub grammar: Grammar,
    /// Flat grammar: overrides the saved variable store for this call.
    pub variables: Option<Vec<Variable>>,
    /// Path grammar: the data tree as JSON text.
    pub data: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RenderResponse {
    pub text: String,
}

/// Raw prompt inputs as typed by the user.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PromptRequest {
    pub system: String,
    pub user: String,
    /// Falls back to the saved structured-output setting when absent.
    pub json_mode: Option<bool>,
    pub directive: Option<String>,
    /// Overrides the saved variable store for this call.
    pub variables: Option<Vec<Variable>>,
    /// Conversion template rendered against `data` with the path grammar.
    pub conversion_template: Option<String>,
    pub data: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub prompt: String,
    pub char_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(flatten)]
    pub prompt: PromptRequest,
    /// Falls back to the saved session settings.
    pub generation: Option<GenerationConfig>,
    pub pipeline: Option<PipelineConfig>,
    pub api_key: Option<String>,
    /// Top-level field of a JSON response to surface separately.
    pub section: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub request_id: Uuid,
    pub prompt: String,
    pub model: String,
    pub usage: Option<Usage>,
    pub raw_text: String,
    pub processed_text: String,
    pub parse: ParseOutcome,
    pub section: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct ProviderModels {
    pub provider: Provider,
    pub default_model: &'static str,
    pub models: &'static [ModelInfo],
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub providers: Vec<ProviderModels>,
}

// ────────────────────────────────────────────────────────────────────────────
// Orchestration helpers
// ────────────────────────────────────────────────────────────────────────────

/// Request-supplied variables, else the saved store.
fn resolve_variables(
    state: &AppState,
    supplied: Option<Vec<Variable>>,
) -> Result<VariableStore, AppError> {
    match supplied {
        Some(variables) => Ok(VariableStore::from_variables(variables)?),
        None => Ok(session::load_variables(state.store.as_ref())?),
    }
}

/// Saved settings, seeded with the configured provider until the user saves any.
fn current_settings(state: &AppState) -> Result<SessionSettings, AppError> {
    let mut settings = session::load_settings(state.store.as_ref())?;
    if settings.saved_at.is_none() {
        let provider = state.config.default_provider;
        settings.generation.provider = provider;
        settings.generation.model = provider.default_model().to_string();
    }
    Ok(settings)
}

/// Substitutes and assembles the final prompt.
///
/// System and user are trimmed first. Only the system fragment carries `${}`
/// placeholders. A malformed data tree fails the whole build.
pub fn build_prompt(
    request: &PromptRequest,
    variables: &VariableStore,
    json_directive: bool,
) -> Result<String, AppError> {
    let system = request.system.trim();
    let user = request.user.trim();

    let converted = match &request.conversion_template {
        Some(template) if !template.trim().is_empty() => {
            let data = request.data.as_deref().ok_or_else(|| {
                AppError::Validation("data is required with a conversion_template".to_string())
            })?;
            Some(substitute_with_data(template, data)?)
        }
        _ => None,
    };

    if system.is_empty() && user.is_empty() && converted.is_none() {
        return Err(AppError::Validation(
            "system or user prompt is required".to_string(),
        ));
    }

    let system = substitute_with_variables(system, variables);

    Ok(assemble(&PromptParts {
        system: &system,
        data: converted.as_deref(),
        user,
        json_directive,
        directive_override: request.directive.as_deref(),
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/models
pub async fn handle_list_models() -> Json<ModelsResponse> {
    let providers = [Provider::OpenAi, Provider::Gemini]
        .into_iter()
        .map(|provider| ProviderModels {
            provider,
            default_model: provider.default_model(),
            models: provider.models(),
        })
        .collect();
    Json(ModelsResponse { providers })
}

/// POST /api/v1/templates/scan
///
/// Distinct placeholder names in first-occurrence order. With the path
/// grammar and a data tree, also the text each name resolves to.
pub async fn handle_scan(
    Json(request): Json<ScanRequest>,
) -> Result<Json<ScanResponse>, AppError> {
    let names = scanner::scan(&request.text, request.grammar);
    let values = match (request.grammar, request.data.as_deref()) {
        (Grammar::Path, Some(data)) => {
            let tree: Value = serde_json::from_str(data).map_err(TemplateError::from)?;
            Some(
                names
                    .iter()
                    .map(|name| ResolvedPath {
                        name: name.clone(),
                        value: path_resolver::resolve(&tree, name),
                    })
                    .collect(),
            )
        }
        _ => None,
    };
    Ok(Json(ScanResponse { names, values }))
}

/// POST /api/v1/templates/render
pub async fn handle_render(
    State(state): State<AppState>,
    Json(request): Json<RenderRequest>,
) -> Result<Json<RenderResponse>, AppError> {
    let text = match request.grammar {
        Grammar::Flat => {
            let variables = resolve_variables(&state, request.variables)?;
            substitute_with_variables(&request.template, &variables)
        }
        Grammar::Path => {
            let data = request.data.as_deref().ok_or_else(|| {
                AppError::Validation("data is required for the path grammar".to_string())
            })?;
            substitute_with_data(&request.template, data)?
        }
    };
    Ok(Json(RenderResponse { text }))
}

/// POST /api/v1/prompts/preview
///
/// The exact prompt a generate call would send, without sending it.
pub async fn handle_preview(
    State(state): State<AppState>,
    Json(request): Json<PromptRequest>,
) -> Result<Json<PreviewResponse>, AppError> {
    let settings = current_settings(&state)?;
    let json_mode = request.json_mode.unwrap_or(settings.generation.json_mode);
    let variables = resolve_variables(&state, request.variables.clone())?;
    let prompt = build_prompt(&request, &variables, json_mode)?;
    debug!("Preview prompt:\n{prompt}");
    Ok(Json(PreviewResponse {
        char_count: prompt.chars().count(),
        prompt,
    }))
}

/// POST /api/v1/prompts/generate
///
/// Full flow: substitute → assemble → LLM → JSON extraction + post-processing.
/// Only one generation may be in flight; a concurrent call gets 409.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    let _slot = state.generation_slot.try_lock().map_err(|_| {
        AppError::Conflict("a generation request is already in progress".to_string())
    })?;

    let settings = current_settings(&state)?;
    let mut generation = request
        .generation
        .unwrap_or(settings.generation)
        .normalized();
    if let Some(json_mode) = request.prompt.json_mode {
        generation.json_mode = json_mode;
    }
    let pipeline = request.pipeline.unwrap_or(settings.pipeline);

    let api_key = request
        .api_key
        .filter(|k| !k.trim().is_empty())
        .or_else(|| state.config.api_key_for(generation.provider).map(str::to_string))
        .ok_or(LlmError::MissingCredential(generation.provider))?;

    let variables = resolve_variables(&state, request.prompt.variables.clone())?;
    let prompt = build_prompt(&request.prompt, &variables, generation.json_mode)?;

    let request_id = Uuid::new_v4();
    info!(
        %request_id,
        provider = %generation.provider,
        model = %generation.model,
        temperature = generation.temperature,
        max_output_tokens = generation.max_output_tokens,
        json_mode = generation.json_mode,
        "Sending prompt ({} chars)",
        prompt.chars().count()
    );

    let completion = state.llm.complete(&prompt, &generation, &api_key).await?;
    if completion.text.trim().is_empty() {
        return Err(LlmError::EmptyContent.into());
    }
    debug!(%request_id, "Raw response:\n{}", completion.text);

    let processed = process_response(&completion.text, &pipeline);
    info!(
        %request_id,
        parsed_json = processed.parse.is_parsed(),
        "Response received ({} chars)",
        completion.text.chars().count()
    );
    let section = request
        .section
        .as_deref()
        .and_then(|key| processed.parse.section(key))
        .cloned();

    Ok(Json(GenerateResponse {
        request_id,
        prompt,
        model: completion.model,
        usage: completion.usage,
        raw_text: completion.text,
        processed_text: processed.processed_text,
        parse: processed.parse,
        section,
    }))
}
