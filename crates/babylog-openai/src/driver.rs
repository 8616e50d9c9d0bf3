// OpenAI LLM Driver
//
// Non-streaming chat completion against an OpenAI-compatible endpoint. The
// prompt is sent as a single user message and the schema as response_format.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use babylog_core::error::LlmError;
use babylog_core::llm_drivers::{
    BoxedLlmDriver, DriverRegistry, LlmCallConfig, LlmCompletionMetadata, LlmDriver, LlmRequest,
    LlmResponse, LlmResult, ProviderConfig, ProviderType,
};

use crate::types::{ChatCompletion, ChatMessage, ChatRequest, ChatResponseFormat};

/// Default chat completions endpoint
pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// OpenAI LLM Driver
///
/// # Example
///
/// ```ignore
/// use babylog_openai::OpenAILlmDriver;
///
/// let driver = OpenAILlmDriver::new("your-api-key");
/// // or with custom endpoint
/// let driver = OpenAILlmDriver::with_base_url("your-api-key", "https://api.example.com/v1/chat/completions");
/// ```
#[derive(Clone)]
pub struct OpenAILlmDriver {
    client: Client,
    api_key: String,
    api_url: String,
}

impl OpenAILlmDriver {
    /// Create a new driver with the given API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_API_URL)
    }

    /// Create a new driver with a custom API URL (for OpenAI-compatible APIs)
    pub fn with_base_url(api_key: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_url: api_url.into(),
        }
    }

    /// Create a driver from provider configuration, applying its timeout
    pub fn from_config(config: &ProviderConfig) -> LlmResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| LlmError::config("OpenAI API key is not set"))?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            api_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        })
    }

    /// Get the API URL
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn build_request(request: LlmRequest, config: &LlmCallConfig) -> ChatRequest {
        ChatRequest {
            model: config.model.clone(),
            messages: vec![ChatMessage::user(request.prompt)],
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            response_format: Some(ChatResponseFormat::json_schema(
                request.response_format.name,
                request.response_format.schema,
            )),
            stream: false,
        }
    }
}

#[async_trait]
impl LlmDriver for OpenAILlmDriver {
    async fn generate(
        &self,
        request: LlmRequest,
        config: &LlmCallConfig,
    ) -> LlmResult<LlmResponse> {
        let body = Self::build_request(request, config);
        debug!(model = %body.model, api_url = %self.api_url, "sending OpenAI request");

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Http(format!("OpenAI request timed out: {}", e))
                } else {
                    LlmError::Http(format!("Failed to send OpenAI request: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::Response(format!(
                "OpenAI API request failed with status {}: {}",
                status, error_text
            )));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| LlmError::Serialization(format!("Failed to parse OpenAI response: {}", e)))?;

        let choice = completion.choices.first();
        if let Some(refusal) = choice.and_then(|c| c.message.refusal.as_deref()) {
            return Err(LlmError::Response(format!("OpenAI refused the request: {}", refusal)));
        }

        let text = choice
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        let metadata = LlmCompletionMetadata {
            total_tokens: completion.usage.as_ref().map(|u| u.total_tokens),
            prompt_tokens: completion.usage.as_ref().map(|u| u.prompt_tokens),
            completion_tokens: completion.usage.as_ref().map(|u| u.completion_tokens),
            model: completion.model.clone(),
            finish_reason: choice.and_then(|c| c.finish_reason.clone()),
        };

        Ok(LlmResponse { text, metadata })
    }
}

impl std::fmt::Debug for OpenAILlmDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAILlmDriver")
            .field("api_url", &self.api_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Driver Registration
// ============================================================================

/// Register the OpenAI driver with the driver registry
///
/// Should be called at application startup to enable OpenAI model support.
///
/// # Example
///
/// ```ignore
/// use babylog_core::DriverRegistry;
/// use babylog_openai::register_driver;
///
/// let mut registry = DriverRegistry::new();
/// register_driver(&mut registry);
/// ```
pub fn register_driver(registry: &mut DriverRegistry) {
    registry.register(ProviderType::OpenAI, |config| {
        let driver = OpenAILlmDriver::from_config(config)?;
        Ok(Box::new(driver) as BoxedLlmDriver)
    });
}
