use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::{calculate, resolve_window, FastDuration};
use crate::db::models::NewFast;

/// State of the manual "log a past fast" form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManualEntry {
    pub start_date: NaiveDate,
    pub start_hour: u32,
    pub end_date: NaiveDate,
    pub end_hour: u32,
    #[serde(default)]
    pub notes: String,
}

impl ManualEntry {
    pub fn duration(&self) -> FastDuration {
        calculate(self.start_date, self.start_hour, self.end_date, self.end_hour)
    }

    /// Submission is allowed only when this is true.
    pub fn can_submit(&self) -> bool {
        self.duration().is_valid()
    }

    /// Resolves the entry in `tz` into a storable fast. `None` blocks
    /// submission: either the window is empty or inverted, or a wall-clock
    /// hour does not exist in `tz` (DST gap).
    pub fn to_new_fast<Tz: TimeZone>(&self, tz: &Tz) -> Option<NewFast> {
        if !self.can_submit() {
            return None;
        }
        let (start, end) =
            resolve_window(self.start_date, self.start_hour, self.end_date, self.end_hour)?;

        let fast = NewFast {
            start_time: localize(tz, start)?,
            end_time: localize(tz, end)?,
            notes: self.notes.trim().to_string(),
        };
        // A DST fold can still collapse a one-hour window.
        fast.is_valid().then_some(fast)
    }
}

fn localize<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<chrono::DateTime<Utc>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;

    use super::*;

    fn entry(start: (u32, u32), end: (u32, u32)) -> ManualEntry {
        ManualEntry {
            start_date: NaiveDate::from_ymd_opt(2024, 3, start.0).unwrap(),
            start_hour: start.1,
            end_date: NaiveDate::from_ymd_opt(2024, 3, end.0).unwrap(),
            end_hour: end.1,
            notes: "  water only ".into(),
        }
    }

    #[test]
    fn overnight_entry_becomes_fast() {
        let fast = entry((1, 20), (1, 12)).to_new_fast(&Utc).unwrap();
        assert_eq!(
            fast.start_time,
            Utc.with_ymd_and_hms(2024, 3, 1, 20, 0, 0).unwrap()
        );
        assert_eq!(
            fast.end_time,
            Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap()
        );
        assert_eq!(fast.duration_seconds(), 16 * 3600);
        assert_eq!(fast.notes, "water only");
    }

    #[test]
    fn invalid_entry_blocks_submission() {
        let bad = entry((2, 8), (1, 20));
        assert!(!bad.can_submit());
        assert!(bad.to_new_fast(&Utc).is_none());
    }

    #[test]
    fn converts_local_hours_to_utc() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let fast = entry((1, 20), (2, 10)).to_new_fast(&tz).unwrap();
        assert_eq!(
            fast.start_time,
            Utc.with_ymd_and_hms(2024, 3, 1, 18, 0, 0).unwrap()
        );
        assert_eq!(fast.duration_seconds(), 14 * 3600);
    }
}
