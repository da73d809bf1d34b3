use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::llm_client::Provider;

/// Application configuration loaded from environment variables.
/// API keys are optional: a request may carry its own credential instead.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// `None` keeps the session in memory only (`STORE_DIR` set to empty).
    pub store_dir: Option<PathBuf>,
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub default_provider: Provider,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            store_dir: match std::env::var("STORE_DIR") {
                Ok(dir) if dir.trim().is_empty() => None,
                Ok(dir) => Some(PathBuf::from(dir)),
                Err(_) => Some(PathBuf::from(".playground")),
            },
            openai_api_key: optional_env("OPENAI_API_KEY"),
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            default_provider: match optional_env("DEFAULT_PROVIDER") {
                Some(raw) => raw
                    .parse::<Provider>()
                    .map_err(anyhow::Error::msg)
                    .context("DEFAULT_PROVIDER is invalid")?,
                None => Provider::default(),
            },
        })
    }

    /// The configured key for `provider`, if any.
    pub fn api_key_for(&self, provider: Provider) -> Option<&str> {
        match provider {
            Provider::OpenAi => self.openai_api_key.as_deref(),
            Provider::Gemini => self.gemini_api_key.as_deref(),
        }
    }
}

/// Reads an env var, treating unset and blank the same.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
