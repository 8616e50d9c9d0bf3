// Activity service for business logic
//
// Known types come from the request when given, otherwise from the store.
// The interpreter never touches the store; persisting is done here.

use babylog_core::summary::day_bounds;
use babylog_core::{
    daily_summary, ActivityFilter, ActivityInterpreter, ActivityPage, ActivityRecord,
    ActivityStore, DailySummary, InterpretError, KnownTypes, StoreError,
};
use chrono::NaiveDate;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Errors from the activity service
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Interpret(#[from] InterpretError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Activity not found: {0}")]
    NotFound(Uuid),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Result of the log operation
#[derive(Debug, Clone)]
pub struct LogOutcome {
    /// Persisted records, with ids
    pub activities: Vec<ActivityRecord>,
    /// Whether the raw text was stored as a note instead of interpreted
    pub fallback: bool,
}

pub struct ActivityService {
    store: Arc<dyn ActivityStore>,
    interpreter: Arc<ActivityInterpreter>,
    note_fallback: bool,
}

impl ActivityService {
    pub fn new(store: Arc<dyn ActivityStore>, interpreter: Arc<ActivityInterpreter>) -> Self {
        Self {
            store,
            interpreter,
            note_fallback: false,
        }
    }

    /// Store raw text as a note when the interpreter is unreachable
    pub fn with_note_fallback(mut self, enabled: bool) -> Self {
        self.note_fallback = enabled;
        self
    }

    async fn known_types(&self, given: Option<Vec<String>>) -> ServiceResult<KnownTypes> {
        match given {
            Some(types) => Ok(KnownTypes::from(types)),
            None => Ok(self.store.known_event_types().await?),
        }
    }

    /// Add flow without persisting
    pub async fn parse(
        &self,
        text: &str,
        known_types: Option<Vec<String>>,
    ) -> ServiceResult<Vec<ActivityRecord>> {
        let known = self.known_types(known_types).await?;
        Ok(self.interpreter.interpret(text, &known).await?)
    }

    /// Update flow without persisting
    pub async fn parse_update(
        &self,
        instruction: &str,
        existing: &ActivityRecord,
        known_types: Option<Vec<String>>,
    ) -> ServiceResult<ActivityRecord> {
        let known = self.known_types(known_types).await?;
        Ok(self
            .interpreter
            .interpret_update(instruction, existing, &known)
            .await?)
    }

    /// Interpret free text and append every resulting record
    pub async fn log(&self, text: &str) -> ServiceResult<LogOutcome> {
        let known = self.store.known_event_types().await?;

        let (records, fallback) = match self.interpreter.interpret(text, &known).await {
            Ok(records) => (records, false),
            Err(InterpretError::TransportFailure(reason)) if self.note_fallback => {
                tracing::warn!(
                    reason = %reason,
                    "Interpreter unavailable, storing raw text as a note"
                );
                let now = self.interpreter.clock().now();
                (vec![ActivityRecord::note(now, text.trim())], true)
            }
            Err(e) => return Err(e.into()),
        };

        let mut activities = Vec::with_capacity(records.len());
        for record in records {
            let id = self.store.append(record.clone()).await?;
            activities.push(record.with_id(id));
        }
        tracing::info!(count = activities.len(), fallback, "Logged activities");

        Ok(LogOutcome {
            activities,
            fallback,
        })
    }

    /// Apply an instruction to a stored record and persist the replacement
    pub async fn amend(&self, id: Uuid, instruction: &str) -> ServiceResult<ActivityRecord> {
        let existing = self.get(id).await?;
        let known = self.store.known_event_types().await?;
        let updated = self
            .interpreter
            .interpret_update(instruction, &existing, &known)
            .await?
            .with_id(id);

        if !self.store.update(id, updated.clone()).await? {
            return Err(ServiceError::NotFound(id));
        }
        tracing::info!(activity_id = %id, "Amended activity");
        Ok(updated)
    }

    /// Append a structured record; any id on the input is ignored
    pub async fn create(&self, mut record: ActivityRecord) -> ServiceResult<Uuid> {
        record.id = None;
        Ok(self.store.append(record).await?)
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<ActivityRecord> {
        self.store
            .get(id)
            .await?
            .ok_or(ServiceError::NotFound(id))
    }

    /// Full replacement of a stored record
    pub async fn replace(&self, id: Uuid, record: ActivityRecord) -> ServiceResult<ActivityRecord> {
        let record = record.with_id(id);
        if !self.store.update(id, record.clone()).await? {
            return Err(ServiceError::NotFound(id));
        }
        Ok(record)
    }

    pub async fn delete(&self, id: Uuid) -> ServiceResult<()> {
        if !self.store.delete(id).await? {
            return Err(ServiceError::NotFound(id));
        }
        Ok(())
    }

    /// Fetch a page; a window without `before` ends at the current instant
    pub async fn fetch(&self, mut filter: ActivityFilter) -> ServiceResult<ActivityPage> {
        if filter.is_windowed() && filter.before.is_none() {
            filter.before = Some(self.interpreter.clock().now());
        }
        Ok(self.store.fetch(&filter).await?)
    }

    /// Summary of one local day, today when `date` is not given
    pub async fn summary(&self, date: Option<NaiveDate>) -> ServiceResult<DailySummary> {
        let clock = self.interpreter.clock();
        let offset = clock.offset();
        let date = date.unwrap_or_else(|| clock.now().date_naive());

        let Some((_, day_end)) = day_bounds(date, offset) else {
            return Err(StoreError::Invalid(format!("Date {} is out of range", date)).into());
        };
        let page = self.store.fetch(&ActivityFilter::window(day_end, 1)).await?;
        Ok(daily_summary(&page.logs, date, offset))
    }

    /// Store connectivity check
    pub async fn check(&self) -> ServiceResult<()> {
        Ok(self.store.check().await?)
    }
}
