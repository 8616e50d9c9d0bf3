// Clock abstraction
//
// The pipeline never reads the wall clock directly; the current instant is
// injected so that prompts and fallbacks are reproducible in tests.

use chrono::{DateTime, FixedOffset, Local, Utc};

/// Source of the current instant, including the local UTC offset
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;

    /// Offset used to resolve timestamps that carry no zone information
    fn offset(&self) -> FixedOffset {
        *self.now().offset()
    }
}

/// Wall clock in the host's local time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Wall clock pinned to a fixed UTC offset
#[derive(Debug, Clone, Copy)]
pub struct OffsetClock {
    offset: FixedOffset,
}

impl OffsetClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }
}

impl Clock for OffsetClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }

    fn offset(&self) -> FixedOffset {
        self.offset
    }
}

/// Clock frozen at a single instant (tests, replays)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    instant: DateTime<FixedOffset>,
}

impl FixedClock {
    pub fn new(instant: DateTime<FixedOffset>) -> Self {
        Self { instant }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.instant
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_is_frozen() {
        let instant = DateTime::parse_from_rfc3339("2026-10-17T09:15:00+01:00").unwrap();
        let clock = FixedClock::new(instant);
        assert_eq!(clock.now(), instant);
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.offset(), FixedOffset::east_opt(3600).unwrap());
    }

    #[test]
    fn test_offset_clock_reports_configured_offset() {
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let clock = OffsetClock::new(offset);
        assert_eq!(*clock.now().offset(), offset);
    }
}
