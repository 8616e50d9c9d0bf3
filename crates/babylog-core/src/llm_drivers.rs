// LLM Driver Abstractions
//
// This module encapsulates everything the pipeline needs from a text model:
// - LlmDriver trait: one prompt in, one block of response text out
// - ResponseFormat: the JSON Schema the response is requested to follow
// - LlmCallConfig: per-call model parameters
// - DriverRegistry: provider type -> driver factory, filled by provider crates
//
// Drivers only move text. They do not parse or validate the structured
// content; that is the pipeline's job.

use crate::error::LlmError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Result type alias for driver calls
pub type LlmResult<T> = std::result::Result<T, LlmError>;

// ============================================================================
// LlmDriver Trait
// ============================================================================

/// Trait for LLM drivers
///
/// Implementations handle provider-specific API calls and return the raw
/// response text. A successful call may still return empty text.
#[async_trait]
pub trait LlmDriver: Send + Sync {
    /// Send one prompt and wait for the complete response
    async fn generate(&self, request: LlmRequest, config: &LlmCallConfig)
        -> LlmResult<LlmResponse>;
}

/// Implement LlmDriver for Box<dyn LlmDriver> to allow dynamic dispatch
#[async_trait]
impl LlmDriver for Box<dyn LlmDriver> {
    async fn generate(
        &self,
        request: LlmRequest,
        config: &LlmCallConfig,
    ) -> LlmResult<LlmResponse> {
        (**self).generate(request, config).await
    }
}

#[async_trait]
impl LlmDriver for Arc<dyn LlmDriver> {
    async fn generate(
        &self,
        request: LlmRequest,
        config: &LlmCallConfig,
    ) -> LlmResult<LlmResponse> {
        (**self).generate(request, config).await
    }
}

// ============================================================================
// Request / Response Types
// ============================================================================

/// Requested shape of the response
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseFormat {
    /// Short identifier of the schema (some providers require one)
    pub name: String,
    /// JSON Schema the response should conform to
    pub schema: Value,
}

impl ResponseFormat {
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }
}

/// A single prompt for the model
#[derive(Debug, Clone, PartialEq)]
pub struct LlmRequest {
    /// Full natural-language prompt
    pub prompt: String,
    /// Requested output shape
    pub response_format: ResponseFormat,
}

impl LlmRequest {
    pub fn new(prompt: impl Into<String>, response_format: ResponseFormat) -> Self {
        Self {
            prompt: prompt.into(),
            response_format,
        }
    }
}

/// Metadata about LLM completion
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LlmCompletionMetadata {
    /// Total tokens used
    pub total_tokens: Option<u32>,
    /// Prompt tokens
    pub prompt_tokens: Option<u32>,
    /// Completion tokens
    pub completion_tokens: Option<u32>,
    /// Model used
    pub model: Option<String>,
    /// Finish reason
    pub finish_reason: Option<String>,
}

/// Response from an LLM call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LlmResponse {
    /// Raw response text; untrusted and possibly empty
    pub text: String,
    pub metadata: LlmCompletionMetadata,
}

impl LlmResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: LlmCompletionMetadata::default(),
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for an LLM call
#[derive(Debug, Clone, PartialEq)]
pub struct LlmCallConfig {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl LlmCallConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

// ============================================================================
// Driver Factory
// ============================================================================

/// Provider type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderType {
    Gemini,
    OpenAI,
}

impl ProviderType {
    /// Model used when none is configured
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderType::Gemini => "gemini-3-flash-preview",
            ProviderType::OpenAI => "gpt-4o-mini",
        }
    }
}

impl std::str::FromStr for ProviderType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(ProviderType::Gemini),
            "openai" => Ok(ProviderType::OpenAI),
            _ => Err(format!("Unknown provider type: {}", s)),
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderType::Gemini => write!(f, "gemini"),
            ProviderType::OpenAI => write!(f, "openai"),
        }
    }
}

/// Configuration for creating an LLM driver
#[derive(Clone)]
pub struct ProviderConfig {
    /// Type of provider
    pub provider_type: ProviderType,
    /// API key for authentication
    pub api_key: Option<String>,
    /// Base URL override (optional)
    pub base_url: Option<String>,
    /// Transport timeout for a single call
    pub timeout: Duration,
}

impl ProviderConfig {
    /// Create a new provider config
    pub fn new(provider_type: ProviderType) -> Self {
        Self {
            provider_type,
            api_key: None,
            base_url: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the transport timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider_type", &self.provider_type)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Boxed LLM driver for dynamic dispatch
pub type BoxedLlmDriver = Box<dyn LlmDriver>;

type DriverFactory = Box<dyn Fn(&ProviderConfig) -> LlmResult<BoxedLlmDriver> + Send + Sync>;

/// Registry of driver factories keyed by provider type
///
/// Provider crates expose a `register_driver` function that adds their
/// factory here; the binary decides which crates to link.
#[derive(Default)]
pub struct DriverRegistry {
    factories: HashMap<ProviderType, DriverFactory>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the factory for a provider type
    pub fn register<F>(&mut self, provider_type: ProviderType, factory: F)
    where
        F: Fn(&ProviderConfig) -> LlmResult<BoxedLlmDriver> + Send + Sync + 'static,
    {
        self.factories.insert(provider_type, Box::new(factory));
    }

    pub fn supports(&self, provider_type: ProviderType) -> bool {
        self.factories.contains_key(&provider_type)
    }

    /// Create a driver for the configured provider
    ///
    /// The API key is required; this function does not read the environment.
    pub fn create(&self, config: &ProviderConfig) -> LlmResult<BoxedLlmDriver> {
        if config.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(LlmError::config(format!(
                "API key is required for provider '{}'",
                config.provider_type
            )));
        }

        let factory = self.factories.get(&config.provider_type).ok_or_else(|| {
            LlmError::config(format!(
                "No driver registered for provider '{}'",
                config.provider_type
            ))
        })?;

        factory(config)
    }
}

impl std::fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("providers", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
