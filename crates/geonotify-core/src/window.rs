//! By-date eligibility window.
//!
//! A by-date notification carries `since`, `until`, `time` and a lead time
//! of `pre_time_range` days. It fires only while `now` (minute precision) is
//! before the `since` instant, the shifted `since + pre_time_range days` lies
//! after `since`, and `now` is before the end of the `until` day.
//!
//! Any field that fails to parse leaves the window unresolved and the
//! notification does not fire.

use chrono::{Days, NaiveDateTime, Timelike};

use crate::error::WindowError;
use crate::notification::NotificationPayload;

const INSTANT_FORMAT: &str = "%Y-%m-%d %H:%M";
const END_OF_DAY: &str = "23:59";

/// Resolved instants of a by-date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub since: NaiveDateTime,
    pub until: NaiveDateTime,
    /// `since` shifted by the lead time in calendar days.
    pub future: NaiveDateTime,
}

impl DateWindow {
    /// Resolve the window of a payload. Does not look at `by_date`.
    pub fn resolve(payload: &NotificationPayload) -> Result<Self, WindowError> {
        if payload.since.is_empty() || payload.until.is_empty() || payload.time.is_empty() {
            return Err(WindowError::Incomplete);
        }

        let since = parse_instant(&payload.since, &payload.time).ok_or_else(|| {
            WindowError::InvalidDate(format!("{} {}", payload.since, payload.time))
        })?;
        let until = parse_instant(&payload.until, END_OF_DAY).ok_or_else(|| {
            WindowError::InvalidDate(format!("{} {}", payload.until, END_OF_DAY))
        })?;
        let future = add_calendar_days(since, payload.pre_time_range)
            .ok_or(WindowError::Overflow(payload.pre_time_range))?;

        Ok(Self {
            since,
            until,
            future,
        })
    }

    /// Whether `now` falls in the lead time before `since`.
    pub fn admits(&self, now: NaiveDateTime) -> bool {
        let Some(today) = truncate_to_minute(now) else {
            return false;
        };
        today < self.since && self.since < self.future && today < self.until
    }
}

/// Decide whether a payload should be dispatched at `now`.
pub fn is_eligible(payload: &NotificationPayload, now: NaiveDateTime) -> bool {
    if !payload.by_date {
        return true;
    }
    match DateWindow::resolve(payload) {
        Ok(window) => window.admits(now),
        Err(_) => false,
    }
}

/// Parse "YYYY-MM-DD" and "HH:MM" into a minute-precision instant.
pub fn parse_instant(date: &str, time: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&format!("{} {}", date.trim(), time.trim()), INSTANT_FORMAT).ok()
}

/// Calendar day arithmetic; negative counts go backwards.
pub fn add_calendar_days(instant: NaiveDateTime, days: i64) -> Option<NaiveDateTime> {
    let magnitude = Days::new(days.unsigned_abs());
    if days >= 0 {
        instant.checked_add_days(magnitude)
    } else {
        instant.checked_sub_days(magnitude)
    }
}

pub fn truncate_to_minute(instant: NaiveDateTime) -> Option<NaiveDateTime> {
    instant.with_second(0)?.with_nanosecond(0)
}
