// Activity interpreter
//
// The normalization pipeline: build the prompt, make one interpreter call,
// extract and validate the response. Exactly one call per operation, no
// retries. Persistence is the caller's concern.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::activity::{ActivityCandidate, ActivityRecord};
use crate::clock::{Clock, SystemClock};
use crate::config::InterpreterConfig;
use crate::error::{InterpretError, Result};
use crate::extract::truncate_for_log;
use crate::known_types::KnownTypes;
use crate::llm_drivers::{LlmDriver, LlmRequest, ResponseFormat};
use crate::prompts;
use crate::response::{parse_add_response, parse_update_response, ValidationContext};

/// Turns free text into validated activity records through an LlmDriver
pub struct ActivityInterpreter {
    driver: Arc<dyn LlmDriver>,
    clock: Arc<dyn Clock>,
    config: InterpreterConfig,
}

impl ActivityInterpreter {
    /// Create an interpreter that reads the host clock
    pub fn new(driver: Arc<dyn LlmDriver>, config: InterpreterConfig) -> Self {
        Self {
            driver,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Replace the clock (tests, fixed-offset deployments)
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Add flow: interpret raw text as one or more new activities
    ///
    /// Records are returned in input order, each carrying the trimmed text as
    /// `original_input` and no identifier.
    pub async fn interpret(
        &self,
        raw_text: &str,
        known_types: &KnownTypes,
    ) -> Result<Vec<ActivityRecord>> {
        let text = raw_text.trim();
        if text.is_empty() {
            return Err(InterpretError::empty_input(
                "Activity text must be a non-empty string",
            ));
        }

        let now = self.clock.now();
        let prompt = prompts::add_prompt(text, known_types, now);
        info!(
            flow = "add",
            model = %self.config.model,
            input_len = text.len(),
            known_type_count = known_types.len(),
            "interpreter request prepared"
        );

        let output = self
            .call("add", prompt, prompts::add_response_format())
            .await?;

        let ctx = ValidationContext {
            known_types,
            local_offset: *now.offset(),
        };
        match parse_add_response(&output, ctx, text) {
            Ok(records) => {
                info!(flow = "add", count = records.len(), "interpreter parsed activities");
                Ok(records)
            }
            Err(e) => {
                warn!(flow = "add", kind = e.kind(), error = %e, "interpreter response rejected");
                Err(e)
            }
        }
    }

    /// Update flow: apply an instruction to an existing record
    ///
    /// Returns a full replacement that keeps the `id` and `original_input` of
    /// `existing`.
    pub async fn interpret_update(
        &self,
        instruction: &str,
        existing: &ActivityRecord,
        known_types: &KnownTypes,
    ) -> Result<ActivityRecord> {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Err(InterpretError::empty_input(
                "Update instruction must be a non-empty string",
            ));
        }
        existing.validate().map_err(InterpretError::InvalidRecord)?;

        let now = self.clock.now();
        // Stores may hand back UTC; the model must see the local wall time and date
        let mut candidate = ActivityCandidate::from(existing);
        candidate.timestamp = existing.timestamp.with_timezone(now.offset()).to_rfc3339();
        let prompt = prompts::update_prompt(instruction, &candidate, known_types, now);
        info!(
            flow = "update",
            model = %self.config.model,
            activity_id = ?existing.id,
            instruction_len = instruction.len(),
            known_type_count = known_types.len(),
            "interpreter request prepared"
        );

        let output = self
            .call("update", prompt, prompts::update_response_format())
            .await?;

        let ctx = ValidationContext {
            known_types,
            local_offset: *now.offset(),
        };
        match parse_update_response(&output, ctx, existing) {
            Ok(record) => {
                info!(flow = "update", activity_id = ?record.id, "interpreter parsed update");
                Ok(record)
            }
            Err(e) => {
                warn!(flow = "update", kind = e.kind(), error = %e, "interpreter response rejected");
                Err(e)
            }
        }
    }

    /// Single driver round trip; returns non-empty response text
    async fn call(
        &self,
        flow: &'static str,
        prompt: String,
        response_format: ResponseFormat,
    ) -> Result<String> {
        let preview_chars = self.config.log_preview_chars;
        if tracing::enabled!(tracing::Level::DEBUG) {
            debug!(
                flow,
                prompt = %truncate_for_log(&prompt, preview_chars),
                "interpreter prompt"
            );
        }

        let request = LlmRequest::new(prompt, response_format);
        let response = self
            .driver
            .generate(request, &self.config.call_config())
            .await
            .map_err(|e| {
                warn!(flow, error = %e, "interpreter call failed");
                InterpretError::from(e)
            })?;

        if tracing::enabled!(tracing::Level::DEBUG) {
            debug!(
                flow,
                output = %truncate_for_log(&response.text, preview_chars),
                total_tokens = ?response.metadata.total_tokens,
                finish_reason = ?response.metadata.finish_reason,
                "interpreter raw output"
            );
        }

        if response.text.trim().is_empty() {
            warn!(flow, "interpreter returned empty text");
            return Err(InterpretError::EmptyModelResponse);
        }
        Ok(response.text)
    }
}

impl std::fmt::Debug for ActivityInterpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityInterpreter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
