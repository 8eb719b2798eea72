//! Fast duration arithmetic for the manual entry form.
//!
//! The form picks a start date + hour and an end date + hour. When both dates
//! are the same and the end hour is earlier than the start hour, the fast is
//! assumed to run overnight and the end date rolls forward one day.
//!
//! Nothing here errors. An invalid window yields [`FastDuration::INVALID`] and
//! callers check [`FastDuration::is_valid`] before allowing submission.

use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

mod entry;

pub use entry::ManualEntry;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FastDuration {
    pub hours: u32,
    pub minutes: u32,
    pub total_hours: f64,
}

impl FastDuration {
    /// Sentinel for end <= start.
    pub const INVALID: FastDuration = FastDuration {
        hours: 0,
        minutes: 0,
        total_hours: 0.0,
    };

    pub fn from_seconds(seconds: i64) -> Self {
        if seconds <= 0 {
            return Self::INVALID;
        }
        let total_minutes = seconds / 60;
        Self {
            hours: (total_minutes / 60) as u32,
            minutes: (total_minutes % 60) as u32,
            total_hours: seconds as f64 / 3600.0,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.total_hours > 0.0
    }
}

impl fmt::Display for FastDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h {}m", self.hours, self.minutes)
    }
}

fn at_hour(date: NaiveDate, hour: u32) -> Option<NaiveDateTime> {
    NaiveTime::from_hms_opt(hour, 0, 0).map(|time| date.and_time(time))
}

/// Applies overnight rollover and returns the resolved `(start, end)`.
///
/// Returns `None` only for hours outside 0-23. The window may still be empty
/// or inverted; see [`calculate`].
pub fn resolve_window(
    start_date: NaiveDate,
    start_hour: u32,
    end_date: NaiveDate,
    end_hour: u32,
) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let start = at_hour(start_date, start_hour)?;
    let mut end = at_hour(end_date, end_hour)?;

    if start_date == end_date && end_hour < start_hour {
        end += Duration::days(1);
    }

    Some((start, end))
}

pub fn calculate(
    start_date: NaiveDate,
    start_hour: u32,
    end_date: NaiveDate,
    end_hour: u32,
) -> FastDuration {
    match resolve_window(start_date, start_hour, end_date, end_hour) {
        Some((start, end)) => FastDuration::from_seconds((end - start).num_seconds()),
        None => FastDuration::INVALID,
    }
}

/// `HH:MM:SS` for the live display. Hours are not wrapped at 24.
pub fn format_elapsed(seconds: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn overnight_rollover_example() {
        let duration = calculate(day(1), 20, day(1), 12);
        assert_eq!(duration.hours, 16);
        assert_eq!(duration.minutes, 0);
        assert!((duration.total_hours - 16.0).abs() < f64::EPSILON);
        assert_eq!(duration.to_string(), "16h 0m");
    }

    #[test]
    fn same_day_end_before_start_always_rolls_forward() {
        for start_hour in 1..24 {
            for end_hour in 0..start_hour {
                let (start, end) = resolve_window(day(10), start_hour, day(10), end_hour).unwrap();
                assert_eq!(start.date(), day(10));
                assert_eq!(end.date(), day(11));
                assert!(calculate(day(10), start_hour, day(10), end_hour).is_valid());
            }
        }
    }

    #[test]
    fn rollover_crosses_month_boundary() {
        let (_, end) = resolve_window(day(31), 22, day(31), 6).unwrap();
        assert_eq!(end.date(), NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
    }

    #[test]
    fn equal_times_are_invalid() {
        let duration = calculate(day(1), 8, day(1), 8);
        assert_eq!(duration, FastDuration::INVALID);
        assert!(!duration.is_valid());
    }

    #[test]
    fn end_date_before_start_date_is_invalid() {
        assert!(!calculate(day(5), 8, day(4), 20).is_valid());
        assert!(!calculate(day(5), 20, day(4), 8).is_valid());
    }

    #[test]
    fn multi_day_fast() {
        let duration = calculate(day(1), 18, day(3), 6);
        assert_eq!(duration.hours, 36);
        assert_eq!(duration.minutes, 0);
    }

    #[test]
    fn out_of_range_hour_is_invalid() {
        assert!(resolve_window(day(1), 24, day(2), 1).is_none());
        assert!(!calculate(day(1), 8, day(2), 25).is_valid());
    }

    #[test]
    fn from_seconds_splits_minutes() {
        let duration = FastDuration::from_seconds(16 * 3600 + 45 * 60 + 59);
        assert_eq!((duration.hours, duration.minutes), (16, 45));
        assert!(!FastDuration::from_seconds(-5).is_valid());
    }

    #[test]
    fn elapsed_formatting() {
        assert_eq!(format_elapsed(0), "00:00:00");
        assert_eq!(format_elapsed(3661), "01:01:01");
        assert_eq!(format_elapsed(40 * 3600 + 5), "40:00:05");
    }
}
