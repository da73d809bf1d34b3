/// LLM client: the single point of entry for outbound model calls.
///
/// ARCHITECTURAL RULE: handlers never talk to a provider directly. They go
/// through the `LlmBackend` trait held in `AppState`, which the real
/// `LlmClient` implements and tests replace with a mock.
///
/// One completed response per call: no streaming, no partial results.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;
mod wire;

use wire::{
    ApiErrorEnvelope, GeminiContent, GeminiGenerationConfig, GeminiPart, GeminiRequest,
    GeminiResponse, OpenAiMessage, OpenAiRequest, OpenAiResponse, ResponseFormat,
};

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("No API key configured for {0}")]
    MissingCredential(Provider),
}

impl LlmError {
    /// Upstream HTTP status, when the provider answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            LlmError::Api { status, .. } => Some(*status),
            LlmError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Supported model providers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[serde(rename = "openai")]
    OpenAi,
    #[default]
    Gemini,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::OpenAi => write!(f, "openai"),
            Provider::Gemini => write!(f, "gemini"),
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "gemini" => Ok(Provider::Gemini),
            other => Err(format!("unknown provider '{other}' (expected openai or gemini)")),
        }
    }
}

/// A selectable model.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub id: &'static str,
    pub name: &'static str,
}

const OPENAI_MODELS: &[ModelInfo] = &[
    ModelInfo { id: "gpt-4o", name: "GPT-4o" },
    ModelInfo { id: "gpt-4o-mini", name: "GPT-4o Mini" },
    ModelInfo { id: "gpt-4-turbo", name: "GPT-4 Turbo" },
    ModelInfo { id: "gpt-3.5-turbo", name: "GPT-3.5 Turbo" },
];

const GEMINI_MODELS: &[ModelInfo] = &[
    ModelInfo { id: "gemini-2.0-flash", name: "Gemini 2.0 Flash" },
    ModelInfo { id: "gemini-1.5-flash", name: "Gemini 1.5 Flash" },
    ModelInfo { id: "gemini-1.5-flash-8b", name: "Gemini 1.5 Flash-8B" },
    ModelInfo { id: "gemini-1.5-pro", name: "Gemini 1.5 Pro" },
];

impl Provider {
    pub fn models(&self) -> &'static [ModelInfo] {
        match self {
            Provider::OpenAi => OPENAI_MODELS,
            Provider::Gemini => GEMINI_MODELS,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-4o-mini",
            Provider::Gemini => "gemini-2.0-flash",
        }
    }
}

/// Per-call generation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub provider: Provider,
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    /// Ask the provider for structured (JSON) output.
    pub json_mode: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model: Provider::default().default_model().to_string(),
            temperature: 0.7,
            max_output_tokens: 2048,
            json_mode: false,
        }
    }
}

impl GenerationConfig {
    /// Clamps numeric parameters into ranges every provider accepts.
    pub fn normalized(mut self) -> Self {
        self.temperature = if self.temperature.is_finite() {
            self.temperature.clamp(0.0, 2.0)
        } else {
            GenerationConfig::default().temperature
        };
        self.max_output_tokens = self.max_output_tokens.max(1);
        if self.model.trim().is_empty() {
            self.model = self.provider.default_model().to_string();
        }
        self
    }
}

/// Token counters as reported by the provider, passed through untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// One completed model response.
#[derive(Debug, Clone, Serialize)]
pub struct Completion {
    pub text: String,
    pub model: String,
    pub usage: Option<Usage>,
}

/// The outbound model call. Carried in `AppState` as `Arc<dyn LlmBackend>`.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        config: &GenerationConfig,
        api_key: &str,
    ) -> Result<Completion, LlmError>;
}

/// HTTP client for the OpenAI and Gemini APIs with retry on 429/5xx.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    openai_url: String,
    gemini_url: String,
}

impl LlmClient {
    pub fn new() -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            openai_url: OPENAI_API_URL.to_string(),
            gemini_url: GEMINI_API_URL.to_string(),
        })
    }

    fn build_request(
        &self,
        prompt: &str,
        config: &GenerationConfig,
        api_key: &str,
    ) -> reqwest::RequestBuilder {
        match config.provider {
            Provider::OpenAi => {
                let body = OpenAiRequest {
                    model: &config.model,
                    messages: vec![OpenAiMessage {
                        role: "user",
                        content: prompt,
                    }],
                    temperature: config.temperature,
                    max_tokens: config.max_output_tokens,
                    response_format: config.json_mode.then_some(ResponseFormat {
                        format_type: "json_object",
                    }),
                };
                self.client
                    .post(&self.openai_url)
                    .bearer_auth(api_key)
                    .json(&body)
            }
            Provider::Gemini => {
                let body = GeminiRequest {
                    contents: vec![GeminiContent {
                        parts: vec![GeminiPart { text: prompt }],
                    }],
                    generation_config: GeminiGenerationConfig {
                        temperature: config.temperature,
                        max_output_tokens: config.max_output_tokens,
                        response_mime_type: config.json_mode.then_some("application/json"),
                    },
                };
                self.client
                    .post(format!("{}/{}:generateContent", self.gemini_url, config.model))
                    .query(&[("key", api_key)])
                    .json(&body)
            }
        }
    }
}

/// Decodes a successful provider body into a `Completion`.
fn parse_completion(provider: Provider, model: &str, body: &str) -> Result<Completion, LlmError> {
    let (text, usage) = match provider {
        Provider::OpenAi => {
            let response: OpenAiResponse = serde_json::from_str(body)?;
            let usage = response.usage.as_ref().map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            });
            (response.into_text(), usage)
        }
        Provider::Gemini => {
            let response: GeminiResponse = serde_json::from_str(body)?;
            let usage = response.usage_metadata.as_ref().map(|u| Usage {
                input_tokens: u.prompt_token_count,
                output_tokens: u.candidates_token_count,
            });
            (response.into_text(), usage)
        }
    };

    let text = text.ok_or(LlmError::EmptyContent)?;
    if text.is_empty() {
        return Err(LlmError::EmptyContent);
    }

    Ok(Completion {
        text,
        model: model.to_string(),
        usage,
    })
}

/// Pulls `error.message` out of a provider error body, falling back to the body.
fn error_message(body: String) -> String {
    serde_json::from_str::<ApiErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}

#[async_trait]
impl LlmBackend for LlmClient {
    /// Retries on 429 (rate limit) and 5xx with exponential backoff.
    async fn complete(
        &self,
        prompt: &str,
        config: &GenerationConfig,
        api_key: &str,
    ) -> Result<Completion, LlmError> {
        if api_key.trim().is_empty() {
            return Err(LlmError::MissingCredential(config.provider));
        }

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self.build_request(prompt, config, api_key).send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("{} API returned {}: {}", config.provider, status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: error_message(body),
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message: error_message(body),
                });
            }

            let body = response.text().await?;
            let completion = parse_completion(config.provider, &config.model, &body)?;

            match completion.usage {
                Some(usage) => debug!(
                    "LLM call succeeded: provider={}, model={}, input_tokens={}, output_tokens={}",
                    config.provider, config.model, usage.input_tokens, usage.output_tokens
                ),
                None => debug!(
                    "LLM call succeeded: provider={}, model={} (no usage reported)",
                    config.provider, config.model
                ),
            }

            return Ok(completion);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}
