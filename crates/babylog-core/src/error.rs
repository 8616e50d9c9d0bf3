// Error types for activity interpretation
//
// Every failure of the interpretation pipeline is recovered into an
// InterpretError. Each kind carries a user-facing message (user_message)
// and a detail string for logs (Display).

use thiserror::Error;

/// Result type alias for interpretation operations
pub type Result<T> = std::result::Result<T, InterpretError>;

/// Fallback message when the model recognises no activity in the add flow
pub const DEFAULT_NO_ACTIVITIES_MESSAGE: &str = "Unable to parse activity input.";

/// Fallback message when the model cannot apply an update instruction
pub const DEFAULT_AMBIGUOUS_MESSAGE: &str = "Unable to parse update instruction.";

/// Errors that can occur while interpreting free text into activity records
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterpretError {
    /// Blank text or instruction
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// The existing record handed to the update flow is not usable
    #[error("Invalid existing record: {0}")]
    InvalidRecord(String),

    /// The interpreter call itself failed
    #[error("Interpreter transport failure: {0}")]
    TransportFailure(String),

    /// The call succeeded but returned no text
    #[error("Empty response from interpreter")]
    EmptyModelResponse,

    /// No JSON object could be extracted, or it failed to parse
    #[error("Unparsable interpreter response: {0}")]
    UnparsableResponse(String),

    /// Parsed JSON is missing required fields or has wrong types
    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    /// Add flow produced valid JSON with zero usable activities
    #[error("No activities recognized: {0}")]
    NoActivitiesRecognized(String),

    /// Update flow produced no replacement record
    #[error("Ambiguous instruction: {0}")]
    AmbiguousInstruction(String),
}

impl InterpretError {
    /// Create an empty input error
    pub fn empty_input(msg: impl Into<String>) -> Self {
        InterpretError::EmptyInput(msg.into())
    }

    /// Create a transport failure error
    pub fn transport(msg: impl Into<String>) -> Self {
        InterpretError::TransportFailure(msg.into())
    }

    /// Create an unparsable response error
    pub fn unparsable(msg: impl Into<String>) -> Self {
        InterpretError::UnparsableResponse(msg.into())
    }

    /// Create a schema violation error
    pub fn schema(msg: impl Into<String>) -> Self {
        InterpretError::SchemaViolation(msg.into())
    }

    /// Stable machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            InterpretError::EmptyInput(_) => "empty_input",
            InterpretError::InvalidRecord(_) => "invalid_record",
            InterpretError::TransportFailure(_) => "transport_failure",
            InterpretError::EmptyModelResponse => "empty_model_response",
            InterpretError::UnparsableResponse(_) => "unparsable_response",
            InterpretError::SchemaViolation(_) => "schema_violation",
            InterpretError::NoActivitiesRecognized(_) => "no_activities_recognized",
            InterpretError::AmbiguousInstruction(_) => "ambiguous_instruction",
        }
    }

    /// Message suitable for showing to the person who typed the input
    ///
    /// Internal details (parser messages, HTTP bodies) are left out; they are
    /// available through `Display` for logging.
    pub fn user_message(&self) -> String {
        match self {
            InterpretError::EmptyInput(msg) | InterpretError::InvalidRecord(msg) => msg.clone(),
            InterpretError::TransportFailure(_) => {
                "The activity interpreter is unavailable. Please try again.".to_string()
            }
            InterpretError::EmptyModelResponse => "Empty response from interpreter.".to_string(),
            InterpretError::UnparsableResponse(_) => {
                "Failed to parse JSON from interpreter.".to_string()
            }
            InterpretError::SchemaViolation(_) => {
                "Interpreter returned an invalid activity.".to_string()
            }
            InterpretError::NoActivitiesRecognized(msg)
            | InterpretError::AmbiguousInstruction(msg) => msg.clone(),
        }
    }

    /// Whether the caller could succeed by editing the input text
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            InterpretError::EmptyInput(_)
                | InterpretError::NoActivitiesRecognized(_)
                | InterpretError::AmbiguousInstruction(_)
        )
    }
}

/// Errors returned by LLM drivers
#[derive(Debug, Error)]
pub enum LlmError {
    /// Request could not be sent or the connection failed
    #[error("http error: {0}")]
    Http(String),

    /// Provider answered with a non-success status or an unusable body
    #[error("response error: {0}")]
    Response(String),

    /// Request or response body could not be (de)serialized
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Driver is misconfigured (missing key, unknown provider)
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl LlmError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        LlmError::Configuration(msg.into())
    }
}

impl From<LlmError> for InterpretError {
    fn from(err: LlmError) -> Self {
        InterpretError::TransportFailure(err.to_string())
    }
}

/// Errors returned by activity stores
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend (database, network) failure
    #[error("Store backend error: {0}")]
    Backend(String),

    /// Record rejected by the store's own validation
    #[error("Invalid activity: {0}")]
    Invalid(String),
}

impl StoreError {
    /// Create a backend error
    pub fn backend(msg: impl Into<String>) -> Self {
        StoreError::Backend(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_hides_details() {
        let err = InterpretError::unparsable("expected value at line 1 column 1");
        assert_eq!(err.user_message(), "Failed to parse JSON from interpreter.");
        assert!(err.to_string().contains("line 1 column 1"));
    }

    #[test]
    fn test_user_message_passes_model_message() {
        let err = InterpretError::NoActivitiesRecognized("Input is not an activity".into());
        assert_eq!(err.user_message(), "Input is not an activity");
        assert!(err.is_user_correctable());
    }

    #[test]
    fn test_llm_error_becomes_transport_failure() {
        let err: InterpretError = LlmError::Http("connection refused".into()).into();
        assert_eq!(err.kind(), "transport_failure");
        assert!(!err.is_user_correctable());
    }
}
