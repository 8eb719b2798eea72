//! Completed fasts and the history summaries derived from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Fast {
    pub id: String,
    pub owner_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// A fast that has not been stored yet. This is what the live timer hands to
/// the history callback and what manual entry produces.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewFast {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub notes: String,
}

impl NewFast {
    pub fn duration_seconds(&self) -> i64 {
        (self.end_time - self.start_time).num_seconds()
    }

    pub fn is_valid(&self) -> bool {
        self.end_time > self.start_time
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FastInfo {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub notes: String,
    pub duration_seconds: i64,
    pub duration_hours: f64,
}

impl From<Fast> for FastInfo {
    fn from(fast: Fast) -> Self {
        let duration_seconds = (fast.end_time - fast.start_time).num_seconds();
        Self {
            id: fast.id,
            start_time: fast.start_time,
            end_time: fast.end_time,
            notes: fast.notes,
            duration_seconds,
            duration_hours: duration_seconds as f64 / 3600.0,
        }
    }
}

/// Aggregates over a user's fast history.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FastStats {
    pub count: u64,
    pub total_hours: f64,
    pub average_hours: f64,
    pub longest_hours: f64,
    /// Consecutive calendar days (UTC), counting back from the most recent
    /// fast's end day, on which at least one fast ended.
    pub current_streak_days: u32,
}

impl FastStats {
    pub fn from_fasts(fasts: &[Fast]) -> Self {
        if fasts.is_empty() {
            return Self::default();
        }

        let hours: Vec<f64> = fasts
            .iter()
            .map(|fast| (fast.end_time - fast.start_time).num_seconds() as f64 / 3600.0)
            .collect();
        let total_hours: f64 = hours.iter().sum();
        let longest_hours = hours.iter().cloned().fold(0.0_f64, f64::max);

        let mut days: Vec<_> = fasts.iter().map(|fast| fast.end_time.date_naive()).collect();
        days.sort_unstable();
        days.dedup();

        let mut current_streak_days = 0u32;
        let mut expected = days.last().copied();
        for day in days.iter().rev() {
            match expected {
                Some(want) if *day == want => {
                    current_streak_days += 1;
                    expected = day.pred_opt();
                }
                _ => break,
            }
        }

        Self {
            count: fasts.len() as u64,
            total_hours,
            average_hours: total_hours / fasts.len() as f64,
            longest_hours,
            current_streak_days,
        }
    }
}
