// OpenAI Driver Implementation
//
// This crate provides an OpenAI-compatible LLM driver implementation.
// It implements the LlmDriver trait from babylog-core by calling the chat
// completions endpoint with a JSON Schema response format.
//
// Any endpoint speaking the same protocol can be used by overriding the API
// URL.

mod driver;
mod types;

#[cfg(test)]
mod tests;

pub use driver::{register_driver, OpenAILlmDriver, DEFAULT_API_URL};
pub use types::{ChatCompletion, ChatMessage, ChatRequest, ChatResponseFormat, JsonSchemaSpec};

// Re-export core types for convenience
pub use babylog_core::llm_drivers::LlmDriver;
