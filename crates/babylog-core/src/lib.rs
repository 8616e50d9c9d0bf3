// Activity Interpretation Core
//
// This crate turns free-text baby-activity entries ("20:00 190ml", "poo",
// "change to 16:30") into validated `{timestamp, event_type, value}` records
// with the help of an external text model.
//
// Key design decisions:
// - The model is reached through the LlmDriver trait; provider crates register
//   their drivers in a DriverRegistry
// - Model output is untrusted: JSON is extracted leniently and validated
//   strictly, nothing is coerced
// - The current time comes from an injected Clock, never from a global
// - Persistence is behind the ActivityStore trait; the pipeline never calls it
// - Every failure surfaces as a typed InterpretError

pub mod activity;
pub mod clock;
pub mod config;
pub mod error;
pub mod extract;
pub mod interpreter;
pub mod known_types;
pub mod llm_drivers;
pub mod prompts;
pub mod response;
pub mod summary;
pub mod traits;

// In-memory implementations for local runs and testing
pub mod memory;

// Re-exports for convenience
pub use activity::{ActivityCandidate, ActivityRecord, NOTE_EVENT_TYPE};
pub use clock::{Clock, FixedClock, OffsetClock, SystemClock};
pub use config::InterpreterConfig;
pub use error::{InterpretError, LlmError, Result, StoreError};
pub use extract::extract_json;
pub use interpreter::ActivityInterpreter;
pub use known_types::KnownTypes;
pub use summary::{daily_summary, DailySummary};
pub use traits::{ActivityFilter, ActivityPage, ActivityStore, StoreResult, DEFAULT_PAGE_DAYS};

// LLM driver types re-exports
pub use llm_drivers::{
    BoxedLlmDriver, DriverRegistry, LlmCallConfig, LlmCompletionMetadata, LlmDriver, LlmRequest,
    LlmResponse, LlmResult, ProviderConfig, ProviderType, ResponseFormat,
};
