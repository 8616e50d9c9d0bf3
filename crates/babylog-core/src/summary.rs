// Daily summary
//
// Per-day counts by event type plus the daily milk total. Feed, bottle, milk
// and formula types contribute when their value reads as an ml amount.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::activity::{feed_amount_ml, is_milk_feed, ActivityRecord};

/// Totals for one local calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DailySummary {
    pub date: NaiveDate,
    /// Number of records per event type
    pub counts: BTreeMap<String, usize>,
    /// Number of milk feeds with a readable amount
    pub feed_count: usize,
    /// Sum of milk feed amounts in millilitres
    pub feed_total_ml: f64,
}

/// Start (inclusive) and end (exclusive) of a local day
pub fn day_bounds(
    date: NaiveDate,
    offset: FixedOffset,
) -> Option<(DateTime<FixedOffset>, DateTime<FixedOffset>)> {
    let start = offset
        .from_local_datetime(&date.and_hms_opt(0, 0, 0)?)
        .single()?;
    let end = start.checked_add_signed(Duration::days(1))?;
    Some((start, end))
}

/// Summarize the records that fall on `date` in `offset`
pub fn daily_summary<'a>(
    records: impl IntoIterator<Item = &'a ActivityRecord>,
    date: NaiveDate,
    offset: FixedOffset,
) -> DailySummary {
    let mut summary = DailySummary {
        date,
        counts: BTreeMap::new(),
        feed_count: 0,
        feed_total_ml: 0.0,
    };

    for record in records {
        if record.timestamp.with_timezone(&offset).date_naive() != date {
            continue;
        }
        *summary.counts.entry(record.event_type.clone()).or_default() += 1;

        if is_milk_feed(&record.event_type) {
            if let Some(amount) = feed_amount_ml(&record.value) {
                summary.feed_count += 1;
                summary.feed_total_ml += amount;
            }
        }
    }

    summary
}
