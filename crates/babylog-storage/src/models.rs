// Database models (internal, may differ from public DTOs)

use babylog_core::ActivityRecord;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct ActivityRow {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub value: String,
    pub original_input: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ActivityRow> for ActivityRecord {
    fn from(row: ActivityRow) -> Self {
        ActivityRecord {
            id: Some(row.id),
            timestamp: row.timestamp.fixed_offset(),
            event_type: row.event_type,
            value: row.value,
            original_input: row.original_input,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateActivityRow {
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub value: String,
    pub original_input: Option<String>,
}

impl From<&ActivityRecord> for CreateActivityRow {
    fn from(record: &ActivityRecord) -> Self {
        Self {
            timestamp: record.timestamp.with_timezone(&Utc),
            event_type: record.event_type.clone(),
            value: record.value.clone(),
            original_input: record.original_input.clone(),
        }
    }
}
