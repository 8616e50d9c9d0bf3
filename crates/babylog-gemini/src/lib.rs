// Gemini Driver Implementation
//
// This crate provides a Google Gemini LLM driver implementation.
// It implements the LlmDriver trait from babylog-core using the
// generateContent endpoint with a JSON response schema.

mod driver;
mod types;


pub use driver::{register_driver, GeminiLlmDriver, DEFAULT_BASE_URL};
pub use types::{GenerateContentRequest, GenerateContentResponse};

// Re-export core types for convenience
pub use babylog_core::llm_drivers::LlmDriver;
