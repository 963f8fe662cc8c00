//! Working-calendar collaborator for the auto-scheduler.
//!
//! The CPM passes are calendar-agnostic; only the auto-scheduler consults a
//! calendar, and only through this narrow interface. Implementations must
//! guarantee `next_working_instant` returns a working instant at or after
//! its argument, and eventually makes progress (a calendar with no future
//! working time would stall the fix-up loop).

use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Weekday};

/// Availability oracle over calendar instants.
pub trait WorkingCalendar {
    /// Whether work can happen at this instant.
    fn is_working_instant(&self, instant: NaiveDateTime) -> bool;

    /// The earliest working instant at or after `instant`.
    fn next_working_instant(&self, instant: NaiveDateTime) -> NaiveDateTime;
}

/// Monday through Friday are working; weekend instants roll forward to
/// Monday 00:00.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeekdayCalendar;

impl WorkingCalendar for WeekdayCalendar {
    fn is_working_instant(&self, instant: NaiveDateTime) -> bool {
        !matches!(instant.weekday(), Weekday::Sat | Weekday::Sun)
    }

    fn next_working_instant(&self, instant: NaiveDateTime) -> NaiveDateTime {
        let mut date = instant.date();
        if self.is_working_instant(instant) {
            return instant;
        }
        loop {
            date = date.succ_opt().expect("date overflow");
            if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                return date.and_time(NaiveTime::MIN);
            }
        }
    }
}

/// Always working except during explicit half-open `[start, end)` periods.
///
/// An instant inside a period rolls to the period's end, then re-checks:
/// back-to-back periods are crossed one at a time.
#[derive(Debug, Clone, Default)]
pub struct BlockedPeriods {
    periods: Vec<(NaiveDateTime, NaiveDateTime)>,
}

impl BlockedPeriods {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a blocked period; zero- and negative-length periods are inert.
    pub fn with_period(mut self, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        self.periods.push((start, end));
        self
    }
}

impl WorkingCalendar for BlockedPeriods {
    fn is_working_instant(&self, instant: NaiveDateTime) -> bool {
        !self
            .periods
            .iter()
            .any(|&(start, end)| instant >= start && instant < end)
    }

    fn next_working_instant(&self, instant: NaiveDateTime) -> NaiveDateTime {
        let mut cursor = instant;
        // Each hop exits one period; periods are finite, so this terminates.
        loop {
            match self
                .periods
                .iter()
                .find(|&&(start, end)| cursor >= start && cursor < end)
            {
                Some(&(_, end)) => cursor = end,
                None => return cursor,
            }
        }
    }
}

/// Duration helper: one scheduling tick is one minute of calendar time.
pub(crate) fn ticks_to_duration(ticks: i64) -> Duration {
    Duration::minutes(ticks)
}
