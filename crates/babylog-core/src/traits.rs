// Store trait for pluggable persistence
//
// The pipeline itself never touches storage. Callers use an ActivityStore to
// supply known types before interpreting and to persist the records after.
// - In-memory implementation for tests and local runs (memory.rs)
// - Postgres implementation in babylog-storage

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::activity::ActivityRecord;
use crate::error::StoreError;
use crate::known_types::KnownTypes;

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Window length used when only `before` is given
pub const DEFAULT_PAGE_DAYS: u32 = 14;

// ============================================================================
// Fetch filter and page
// ============================================================================

/// Which records to fetch
///
/// With neither field set, every record is returned. Setting either selects
/// the window `[before - days, before)`; a missing `before` means now and a
/// missing `days` means [`DEFAULT_PAGE_DAYS`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityFilter {
    pub before: Option<DateTime<FixedOffset>>,
    pub days: Option<u32>,
}

impl ActivityFilter {
    /// Every record, newest first
    pub fn all() -> Self {
        Self::default()
    }

    /// A window of `days` ending just before `before`
    pub fn window(before: DateTime<FixedOffset>, days: u32) -> Self {
        Self {
            before: Some(before),
            days: Some(days),
        }
    }

    pub fn is_windowed(&self) -> bool {
        self.before.is_some() || self.days.is_some()
    }

    /// Resolve the window as `(start, end)`, end exclusive
    ///
    /// `Ok(None)` means unfiltered. A window reaching past the representable
    /// range is rejected.
    pub fn bounds(
        &self,
        now: DateTime<FixedOffset>,
    ) -> StoreResult<Option<(DateTime<FixedOffset>, DateTime<FixedOffset>)>> {
        if !self.is_windowed() {
            return Ok(None);
        }
        let end = self.before.unwrap_or(now);
        let days = self.days.unwrap_or(DEFAULT_PAGE_DAYS);
        let start = Duration::try_days(i64::from(days))
            .and_then(|window| end.checked_sub_signed(window))
            .ok_or_else(|| {
                StoreError::Invalid(format!("A window of {} days is out of range", days))
            })?;
        Ok(Some((start, end)))
    }
}

/// One page of records, newest first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ActivityPage {
    pub logs: Vec<ActivityRecord>,
    /// Whether records exist before the window start
    pub has_more: bool,
    /// `before` value for the next (older) page
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = DateTime))]
    pub next_cursor: Option<DateTime<FixedOffset>>,
}

// ============================================================================
// ActivityStore
// ============================================================================

/// Trait for persisting activity records
#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Persist a new record and return its identifier
    ///
    /// Any `id` already on the record is ignored.
    async fn append(&self, record: ActivityRecord) -> StoreResult<Uuid>;

    /// Replace the stored record; returns false when `id` is unknown
    async fn update(&self, id: Uuid, record: ActivityRecord) -> StoreResult<bool>;

    /// Delete a record; returns false when `id` is unknown
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;

    /// Load one record
    async fn get(&self, id: Uuid) -> StoreResult<Option<ActivityRecord>>;

    /// Load records matching the filter, newest first
    async fn fetch(&self, filter: &ActivityFilter) -> StoreResult<ActivityPage>;

    /// Distinct event types across all records
    async fn known_event_types(&self) -> StoreResult<KnownTypes> {
        let page = self.fetch(&ActivityFilter::all()).await?;
        Ok(KnownTypes::from_records(&page.logs))
    }

    /// Verify the backend is reachable
    async fn check(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Reject records the store must never hold
pub fn validate_for_store(record: &ActivityRecord) -> StoreResult<()> {
    record.validate().map_err(StoreError::Invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn test_unfiltered_has_no_bounds() {
        assert!(ActivityFilter::all()
            .bounds(at("2026-10-17T12:00:00Z"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_bounds_default_days() {
        let filter = ActivityFilter {
            before: Some(at("2026-10-17T00:00:00Z")),
            days: None,
        };
        let (start, end) = filter.bounds(at("2026-10-20T00:00:00Z")).unwrap().unwrap();
        assert_eq!(start, at("2026-10-03T00:00:00Z"));
        assert_eq!(end, at("2026-10-17T00:00:00Z"));
    }

    #[test]
    fn test_bounds_default_before_is_now() {
        let filter = ActivityFilter {
            before: None,
            days: Some(2),
        };
        let (start, end) = filter.bounds(at("2026-10-17T12:00:00Z")).unwrap().unwrap();
        assert_eq!(start, at("2026-10-15T12:00:00Z"));
        assert_eq!(end, at("2026-10-17T12:00:00Z"));
    }

    #[test]
    fn test_oversized_window_is_invalid() {
        let filter = ActivityFilter {
            before: None,
            days: Some(u32::MAX),
        };
        let err = filter.bounds(at("2026-10-17T12:00:00Z")).unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));
    }
}
