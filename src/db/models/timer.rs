//! Live timer records.
//!
//! A user owns at most one `Timer`. It is created on start, patched on
//! pause/resume/note edits and deleted on stop, at which point the client turns
//! it into a `Fast`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Timer {
    pub owner_id: String,
    pub start_time: DateTime<Utc>,
    pub is_paused: bool,
    pub paused_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of a start request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartTimer {
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub notes: String,
}

/// Partial update. Absent fields are left untouched.
///
/// `is_paused = Some(false)` also clears `paused_at`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimerPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_paused: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
}

impl TimerPatch {
    pub fn is_empty(&self) -> bool {
        self.is_paused.is_none()
            && self.paused_at.is_none()
            && self.notes.is_none()
            && self.start_time.is_none()
    }

    /// Applies the patch to `timer` in place, bumping `updated_at`.
    pub fn apply(&self, timer: &mut Timer, updated_at: DateTime<Utc>) {
        if let Some(start_time) = self.start_time {
            timer.start_time = start_time;
        }
        if let Some(notes) = &self.notes {
            timer.notes = notes.clone();
        }
        if let Some(paused_at) = self.paused_at {
            timer.paused_at = Some(paused_at);
        }
        match self.is_paused {
            Some(true) => {
                timer.is_paused = true;
                if timer.paused_at.is_none() {
                    timer.paused_at = Some(updated_at);
                }
            }
            Some(false) => {
                timer.is_paused = false;
                timer.paused_at = None;
            }
            None => {}
        }
        timer.updated_at = updated_at;
    }
}
