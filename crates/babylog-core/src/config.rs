// Interpreter configuration
//
// InterpreterConfig is plain data: the binary builds it from the environment,
// tests build it directly.

use crate::llm_drivers::{LlmCallConfig, ProviderType};
use serde::{Deserialize, Serialize};

/// Configuration for the activity interpreter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpreterConfig {
    /// Model identifier (e.g., "gemini-3-flash-preview", "gpt-4o-mini")
    pub model: String,

    /// Temperature for LLM sampling (0.0 - 2.0)
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Maximum tokens to generate per response
    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// Maximum characters of prompt/response text written to debug logs
    #[serde(default = "default_log_preview_chars")]
    pub log_preview_chars: usize,
}

fn default_log_preview_chars() -> usize {
    2_000
}

impl InterpreterConfig {
    /// Create a configuration for the given model
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: None,
            max_tokens: None,
            log_preview_chars: default_log_preview_chars(),
        }
    }

    /// Configuration using a provider's default model
    pub fn for_provider(provider: ProviderType) -> Self {
        Self::new(provider.default_model())
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

    /// Set the debug-log preview length
    pub fn with_log_preview_chars(mut self, chars: usize) -> Self {
        self.log_preview_chars = chars;
        self
    }

    /// Per-call parameters handed to the driver
    pub fn call_config(&self) -> LlmCallConfig {
        LlmCallConfig {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self::for_provider(ProviderType::Gemini)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_uses_gemini_model() {
        let config = InterpreterConfig::default();
        assert_eq!(config.model, "gemini-3-flash-preview");
        assert_eq!(config.temperature, None);
    }

    #[test]
    fn test_call_config() {
        let call = InterpreterConfig::new("gpt-4o-mini")
            .with_temperature(0.2)
            .with_max_tokens(512)
            .call_config();
        assert_eq!(call.model, "gpt-4o-mini");
        assert_eq!(call.temperature, Some(0.2));
        assert_eq!(call.max_tokens, Some(512));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: InterpreterConfig = serde_json::from_str(r#"{"model":"m"}"#).unwrap();
        assert_eq!(config.log_preview_chars, 2_000);
        assert_eq!(config.max_tokens, None);
    }
}
