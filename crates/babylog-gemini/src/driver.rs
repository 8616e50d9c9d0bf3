// Gemini LLM Driver
//
// Calls {base_url}/v1beta/models/{model}:generateContent with the API key in
// the x-goog-api-key header.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use babylog_core::error::LlmError;
use babylog_core::llm_drivers::{
    BoxedLlmDriver, DriverRegistry, LlmCallConfig, LlmCompletionMetadata, LlmDriver, LlmRequest,
    LlmResponse, LlmResult, ProviderConfig, ProviderType,
};

use crate::types::{Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig};

/// Default API host
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini LLM Driver
#[derive(Clone)]
pub struct GeminiLlmDriver {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiLlmDriver {
    /// Create a new driver with the given API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a new driver against a different host
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    /// Create a driver from provider configuration, applying its timeout
    pub fn from_config(config: &ProviderConfig) -> LlmResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| LlmError::config("Gemini API key is not set"))?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Endpoint for a model
    pub fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model
        )
    }

    fn build_request(request: LlmRequest, config: &LlmCallConfig) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content::user_text(request.prompt)],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_json_schema: request.response_format.schema,
                temperature: config.temperature,
                max_output_tokens: config.max_tokens,
            },
        }
    }
}

#[async_trait]
impl LlmDriver for GeminiLlmDriver {
    async fn generate(
        &self,
        request: LlmRequest,
        config: &LlmCallConfig,
    ) -> LlmResult<LlmResponse> {
        let url = self.endpoint(&config.model);
        let body = Self::build_request(request, config);
        debug!(model = %config.model, url = %url, "sending Gemini request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Http(format!("Gemini request timed out: {}", e))
                } else {
                    LlmError::Http(format!("Failed to send Gemini request: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::Response(format!(
                "Gemini API request failed with status {}: {}",
                status, error_text
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Serialization(format!("Failed to parse Gemini response: {}", e)))?;

        if let Some(reason) = parsed
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return Err(LlmError::Response(format!(
                "Gemini blocked the prompt: {}",
                reason
            )));
        }

        let usage = parsed.usage_metadata.as_ref();
        let metadata = LlmCompletionMetadata {
            total_tokens: usage.and_then(|u| u.total_token_count),
            prompt_tokens: usage.and_then(|u| u.prompt_token_count),
            completion_tokens: usage.and_then(|u| u.candidates_token_count),
            model: parsed
                .model_version
                .clone()
                .or_else(|| Some(config.model.clone())),
            finish_reason: parsed
                .candidates
                .first()
                .and_then(|c| c.finish_reason.clone()),
        };

        Ok(LlmResponse {
            text: parsed.text(),
            metadata,
        })
    }
}

impl std::fmt::Debug for GeminiLlmDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiLlmDriver")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Driver Registration
// ============================================================================

/// Register the Gemini driver with the driver registry
pub fn register_driver(registry: &mut DriverRegistry) {
    registry.register(ProviderType::Gemini, |config| {
        let driver = GeminiLlmDriver::from_config(config)?;
        Ok(Box::new(driver) as BoxedLlmDriver)
    });
}
