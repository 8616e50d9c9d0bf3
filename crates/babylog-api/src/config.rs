// Server configuration
//
// Loaded from environment variables (after dotenvy has read .env). Empty
// values count as unset.

use anyhow::{anyhow, Context, Result};
use babylog_core::{InterpreterConfig, ProviderConfig, ProviderType};
use chrono::FixedOffset;
use std::time::Duration;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:9000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the API server
#[derive(Clone)]
pub struct AppConfig {
    /// Listen address
    pub bind_addr: String,
    /// Prefix for /v1 routes, e.g. "/api"
    pub api_prefix: String,
    /// Origins allowed by CORS; empty means same-origin only
    pub cors_allowed_origins: Vec<String>,
    /// Postgres URL; the in-memory store is used when unset
    pub database_url: Option<String>,
    pub provider: ProviderType,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: String,
    pub temperature: Option<f32>,
    pub timeout: Duration,
    /// Store raw text as a note when the interpreter is unreachable
    pub note_fallback: bool,
    /// Local offset of the person logging; the host zone when unset
    pub utc_offset: Option<FixedOffset>,
}

impl AppConfig {
    /// Create configuration from environment variables
    ///
    /// Environment variables:
    /// - `BIND_ADDR`: listen address (default: 0.0.0.0:9000)
    /// - `API_PREFIX`: route prefix (default: none)
    /// - `CORS_ALLOWED_ORIGINS`: comma-separated origins
    /// - `DATABASE_URL`: Postgres URL (default: in-memory store)
    /// - `LLM_PROVIDER`: `gemini` or `openai` (default: gemini)
    /// - `LLM_API_KEY`: provider key, falling back to `GEMINI_API_KEY` / `OPENAI_API_KEY`
    /// - `LLM_BASE_URL`: provider endpoint override
    /// - `LLM_MODEL`: model name (default depends on provider)
    /// - `LLM_TEMPERATURE`: sampling temperature
    /// - `LLM_TIMEOUT_SECS`: transport timeout (default: 30)
    /// - `NOTE_FALLBACK`: `true` to record raw text when the interpreter is down
    /// - `UTC_OFFSET`: local offset such as `+01:00` (default: host time zone)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let provider = match var("LLM_PROVIDER") {
            Some(name) => name.parse::<ProviderType>().map_err(|e| anyhow!(e))?,
            None => ProviderType::Gemini,
        };

        let provider_key_var = match provider {
            ProviderType::Gemini => "GEMINI_API_KEY",
            ProviderType::OpenAI => "OPENAI_API_KEY",
        };
        let api_key = var("LLM_API_KEY").or_else(|| var(provider_key_var));

        let temperature = var("LLM_TEMPERATURE")
            .map(|v| v.parse::<f32>())
            .transpose()
            .context("LLM_TEMPERATURE must be a number")?;

        let timeout_secs = var("LLM_TIMEOUT_SECS")
            .map(|v| v.parse::<u64>())
            .transpose()
            .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let cors_allowed_origins = var("CORS_ALLOWED_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let note_fallback = var("NOTE_FALLBACK")
            .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);

        let utc_offset = var("UTC_OFFSET")
            .map(|v| v.parse::<FixedOffset>())
            .transpose()
            .map_err(|e| anyhow!("UTC_OFFSET must look like +01:00: {}", e))?;

        Ok(Self {
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            api_prefix: var("API_PREFIX").unwrap_or_default(),
            cors_allowed_origins,
            database_url: var("DATABASE_URL"),
            provider,
            api_key,
            base_url: var("LLM_BASE_URL"),
            model: var("LLM_MODEL").unwrap_or_else(|| provider.default_model().to_string()),
            temperature,
            timeout: Duration::from_secs(timeout_secs),
            note_fallback,
            utc_offset,
        })
    }

    /// Driver configuration for the selected provider
    pub fn provider_config(&self) -> ProviderConfig {
        let mut config = ProviderConfig::new(self.provider).with_timeout(self.timeout);
        if let Some(key) = &self.api_key {
            config = config.with_api_key(key.clone());
        }
        if let Some(url) = &self.base_url {
            config = config.with_base_url(url.clone());
        }
        config
    }

    /// Interpreter configuration for the selected model
    pub fn interpreter_config(&self) -> InterpreterConfig {
        let config = InterpreterConfig::new(self.model.clone());
        match self.temperature {
            Some(t) => config.with_temperature(t),
            None => config,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("api_prefix", &self.api_prefix)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .field("note_fallback", &self.note_fallback)
            .field("utc_offset", &self.utc_offset)
            .finish()
    }
}
