use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::models::{NewFast, Timer};
use crate::duration::format_elapsed;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TimerStatus {
    #[default]
    Idle,
    Running,
    Paused,
}

/// Local view of the user's timer. The backend record is the source of
/// truth; this is rebuilt from it on mount and after every acknowledged
/// mutation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub status: TimerStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub paused_at: Option<DateTime<Utc>>,
    pub notes: String,
    /// Last value shown on the display; refreshed by the ticker.
    pub elapsed_secs: u64,
}

impl TimerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_timer(timer: &Timer, now: DateTime<Utc>) -> Self {
        let mut state = Self {
            status: if timer.is_paused {
                TimerStatus::Paused
            } else {
                TimerStatus::Running
            },
            start_time: Some(timer.start_time),
            paused_at: if timer.is_paused {
                // a paused record without a timestamp freezes at `updated_at`
                Some(timer.paused_at.unwrap_or(timer.updated_at))
            } else {
                None
            },
            notes: timer.notes.clone(),
            elapsed_secs: 0,
        };
        state.sync_elapsed(now);
        state
    }

    pub fn is_active(&self) -> bool {
        self.status != TimerStatus::Idle
    }

    /// `now - start` while running, `paused_at - start` while paused.
    /// Never negative, so a start time slightly in the future (clock skew
    /// between devices) reads as zero.
    pub fn elapsed_at(&self, now: DateTime<Utc>) -> u64 {
        let Some(start) = self.start_time else {
            return 0;
        };
        let until = match self.status {
            TimerStatus::Idle => return 0,
            TimerStatus::Running => now,
            TimerStatus::Paused => self.paused_at.unwrap_or(now),
        };
        (until - start).num_seconds().max(0) as u64
    }

    pub fn sync_elapsed(&mut self, now: DateTime<Utc>) {
        self.elapsed_secs = self.elapsed_at(now);
    }

    /// Start time that keeps elapsed time continuous when resuming at `now`.
    pub fn resumed_start(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match (self.status, self.start_time, self.paused_at) {
            (TimerStatus::Paused, Some(start), Some(paused_at)) => {
                let paused_for = now - paused_at;
                Some(start + paused_for.max(chrono::Duration::zero()))
            }
            _ => None,
        }
    }

    /// Converts the active timer into a fast ending at `now`, or at
    /// `paused_at` while paused. Returns `None` when idle or when the fast
    /// would have no positive duration.
    pub fn finish(&self, now: DateTime<Utc>) -> Option<NewFast> {
        let start_time = self.start_time?;
        let end_time = match self.status {
            TimerStatus::Idle => return None,
            TimerStatus::Running => now,
            TimerStatus::Paused => self.paused_at.unwrap_or(now),
        };
        let fast = NewFast {
            start_time,
            end_time,
            notes: self.notes.clone(),
        };
        fast.is_valid().then_some(fast)
    }

    pub fn display(&self) -> String {
        format_elapsed(self.elapsed_secs)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
