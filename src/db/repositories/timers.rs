use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use crate::db::{
    helpers::{format_datetime, parse_datetime, parse_optional_datetime},
    models::{Timer, TimerPatch},
    Database,
};

const TIMER_COLUMNS: &str =
    "owner_id, start_time, is_paused, paused_at, notes, created_at, updated_at";

fn row_to_timer(row: &Row) -> Result<Timer> {
    let start_time: String = row.get("start_time")?;
    let paused_at: Option<String> = row.get("paused_at")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(Timer {
        owner_id: row.get("owner_id")?,
        start_time: parse_datetime(&start_time, "start_time")?,
        is_paused: row.get::<_, i64>("is_paused")? != 0,
        paused_at: parse_optional_datetime(paused_at, "paused_at")?,
        notes: row.get("notes")?,
        created_at: parse_datetime(&created_at, "created_at")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}

fn select_timer(conn: &Connection, owner_id: &str) -> Result<Option<Timer>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TIMER_COLUMNS} FROM timers WHERE owner_id = ?1"
    ))?;
    let mut rows = stmt.query(params![owner_id])?;
    match rows.next()? {
        Some(row) => Ok(Some(row_to_timer(row)?)),
        None => Ok(None),
    }
}

impl Database {
    pub async fn get_timer(&self, owner_id: &str) -> Result<Option<Timer>> {
        let owner_id = owner_id.to_string();
        self.execute(move |conn| select_timer(conn, &owner_id)).await
    }

    /// Inserts a new timer. Returns `false` without writing if the owner
    /// already has one.
    pub async fn insert_timer(&self, timer: &Timer) -> Result<bool> {
        let record = timer.clone();
        self.execute(move |conn| {
            let inserted = conn.execute(
                &format!(
                    "INSERT OR IGNORE INTO timers ({TIMER_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
                ),
                params![
                    record.owner_id,
                    format_datetime(&record.start_time),
                    record.is_paused as i64,
                    record.paused_at.as_ref().map(format_datetime),
                    record.notes,
                    format_datetime(&record.created_at),
                    format_datetime(&record.updated_at),
                ],
            )?;
            Ok(inserted == 1)
        })
        .await
    }

    /// Applies `patch` in a single DB task. Returns `None` if the owner has
    /// no timer.
    pub async fn update_timer(
        &self,
        owner_id: &str,
        patch: TimerPatch,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Timer>> {
        let owner_id = owner_id.to_string();
        self.execute(move |conn| {
            let Some(mut timer) = select_timer(conn, &owner_id)? else {
                return Ok(None);
            };
            patch.apply(&mut timer, updated_at);

            conn.execute(
                "UPDATE timers
                 SET start_time = ?1,
                     is_paused = ?2,
                     paused_at = ?3,
                     notes = ?4,
                     updated_at = ?5
                 WHERE owner_id = ?6",
                params![
                    format_datetime(&timer.start_time),
                    timer.is_paused as i64,
                    timer.paused_at.as_ref().map(format_datetime),
                    timer.notes,
                    format_datetime(&timer.updated_at),
                    owner_id,
                ],
            )?;
            Ok(Some(timer))
        })
        .await
    }

    /// Returns `false` if there was nothing to delete.
    pub async fn delete_timer(&self, owner_id: &str) -> Result<bool> {
        let owner_id = owner_id.to_string();
        self.execute(move |conn| {
            let deleted = conn.execute(
                "DELETE FROM timers WHERE owner_id = ?1",
                params![owner_id],
            )?;
            Ok(deleted > 0)
        })
        .await
    }
}
