// In-memory implementations for local runs and testing
//
// - InMemoryActivityStore: ActivityStore backed by a HashMap
// - MockLlmDriver: LlmDriver that replays queued responses and records calls

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::activity::ActivityRecord;
use crate::error::LlmError;
use crate::llm_drivers::{LlmCallConfig, LlmDriver, LlmRequest, LlmResponse, LlmResult};
use crate::traits::{validate_for_store, ActivityFilter, ActivityPage, ActivityStore, StoreResult};

// ============================================================================
// InMemoryActivityStore
// ============================================================================

/// In-memory activity store
///
/// Records are keyed by a UUID v7 assigned on append.
#[derive(Debug, Default, Clone)]
pub struct InMemoryActivityStore {
    records: Arc<RwLock<HashMap<Uuid, ActivityRecord>>>,
}

impl InMemoryActivityStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Pre-populate with records (useful for testing); returns the assigned ids
    pub async fn seed(&self, records: Vec<ActivityRecord>) -> Vec<Uuid> {
        let mut guard = self.records.write().await;
        records
            .into_iter()
            .map(|record| {
                let id = Uuid::now_v7();
                guard.insert(id, record.with_id(id));
                id
            })
            .collect()
    }

    /// Remove every record
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }
}

#[async_trait]
impl ActivityStore for InMemoryActivityStore {
    async fn append(&self, record: ActivityRecord) -> StoreResult<Uuid> {
        validate_for_store(&record)?;
        let id = Uuid::now_v7();
        self.records.write().await.insert(id, record.with_id(id));
        Ok(id)
    }

    async fn update(&self, id: Uuid, record: ActivityRecord) -> StoreResult<bool> {
        validate_for_store(&record)?;
        let mut records = self.records.write().await;
        match records.get_mut(&id) {
            Some(stored) => {
                *stored = record.with_id(id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.records.write().await.remove(&id).is_some())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<ActivityRecord>> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn fetch(&self, filter: &ActivityFilter) -> StoreResult<ActivityPage> {
        let records = self.records.read().await;
        let bounds = filter.bounds(Utc::now().fixed_offset())?;

        let mut logs: Vec<ActivityRecord> = records
            .values()
            .filter(|r| match bounds {
                Some((start, end)) => r.timestamp >= start && r.timestamp < end,
                None => true,
            })
            .cloned()
            .collect();
        logs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id)));

        let (has_more, next_cursor) = match bounds {
            Some((start, _)) => (records.values().any(|r| r.timestamp < start), Some(start)),
            None => (false, None),
        };

        Ok(ActivityPage {
            logs,
            has_more,
            next_cursor,
        })
    }
}

// ============================================================================
// MockLlmDriver - Returns predefined responses
// ============================================================================

/// A scripted driver outcome
#[derive(Debug, Clone, PartialEq)]
pub enum MockLlmResponse {
    /// Successful call returning this text
    Text(String),
    /// Transport failure with this message
    Failure(String),
}

impl MockLlmResponse {
    /// Create a text response
    pub fn text(text: impl Into<String>) -> Self {
        MockLlmResponse::Text(text.into())
    }

    /// Create a transport failure
    pub fn failure(message: impl Into<String>) -> Self {
        MockLlmResponse::Failure(message.into())
    }
}

/// Mock LLM driver for testing
///
/// Returns queued responses in sequence; once the queue is exhausted it
/// repeats the default response, or fails if none is set.
#[derive(Debug, Default)]
pub struct MockLlmDriver {
    responses: Arc<RwLock<Vec<MockLlmResponse>>>,
    call_index: Arc<RwLock<usize>>,
    call_log: Arc<RwLock<Vec<LlmRequest>>>,
    default_response: Option<MockLlmResponse>,
}

impl MockLlmDriver {
    /// Create a new mock driver with an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock driver with queued responses
    pub fn with_responses(responses: Vec<MockLlmResponse>) -> Self {
        Self {
            responses: Arc::new(RwLock::new(responses)),
            ..Self::default()
        }
    }

    /// Driver that always answers with the same text
    pub fn always(text: impl Into<String>) -> Self {
        Self::new().with_default_response(MockLlmResponse::text(text))
    }

    /// Response used after the queue runs out
    pub fn with_default_response(mut self, response: MockLlmResponse) -> Self {
        self.default_response = Some(response);
        self
    }

    /// Add a response to the queue
    pub async fn add_response(&self, response: MockLlmResponse) {
        self.responses.write().await.push(response);
    }

    /// Requests received so far
    pub async fn calls(&self) -> Vec<LlmRequest> {
        self.call_log.read().await.clone()
    }

    /// Number of requests received so far
    pub async fn call_count(&self) -> usize {
        self.call_log.read().await.len()
    }

    /// Reset the queue and the call log
    pub async fn reset(&self) {
        self.responses.write().await.clear();
        *self.call_index.write().await = 0;
        self.call_log.write().await.clear();
    }
}

#[async_trait]
impl LlmDriver for MockLlmDriver {
    async fn generate(
        &self,
        request: LlmRequest,
        config: &LlmCallConfig,
    ) -> LlmResult<LlmResponse> {
        self.call_log.write().await.push(request);

        let mut index = self.call_index.write().await;
        let responses = self.responses.read().await;
        let response = responses
            .get(*index)
            .cloned()
            .or_else(|| self.default_response.clone());
        *index += 1;
        drop(index);
        drop(responses);

        match response {
            Some(MockLlmResponse::Text(text)) => {
                let mut response = LlmResponse::text(text);
                response.metadata.model = Some(config.model.clone());
                Ok(response)
            }
            Some(MockLlmResponse::Failure(message)) => Err(LlmError::Http(message)),
            None => Err(LlmError::Response(
                "mock driver has no more responses configured".to_string(),
            )),
        }
    }
}
