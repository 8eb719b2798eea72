use anyhow::{bail, Result};
use rusqlite::{params, Row};

use crate::db::{
    helpers::{format_datetime, parse_datetime},
    models::Fast,
    Database,
};

fn row_to_fast(row: &Row) -> Result<Fast> {
    let start_time: String = row.get("start_time")?;
    let end_time: String = row.get("end_time")?;
    let created_at: String = row.get("created_at")?;

    Ok(Fast {
        id: row.get("id")?,
        owner_id: row.get("owner_id")?,
        start_time: parse_datetime(&start_time, "start_time")?,
        end_time: parse_datetime(&end_time, "end_time")?,
        notes: row.get("notes")?,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

impl Database {
    pub async fn insert_fast(&self, fast: &Fast) -> Result<()> {
        if fast.end_time <= fast.start_time {
            bail!("fast {} ends before it starts", fast.id);
        }

        let record = fast.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO fasts (id, owner_id, start_time, end_time, notes, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.id,
                    record.owner_id,
                    format_datetime(&record.start_time),
                    format_datetime(&record.end_time),
                    record.notes,
                    format_datetime(&record.created_at),
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// Newest first.
    pub async fn list_fasts(&self, owner_id: &str) -> Result<Vec<Fast>> {
        let owner_id = owner_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, owner_id, start_time, end_time, notes, created_at
                 FROM fasts
                 WHERE owner_id = ?1
                 ORDER BY start_time DESC",
            )?;

            let mut rows = stmt.query(params![owner_id])?;
            let mut fasts = Vec::new();
            while let Some(row) = rows.next()? {
                fasts.push(row_to_fast(row)?);
            }

            Ok(fasts)
        })
        .await
    }

    /// Scoped to the owner so one user cannot delete another's history.
    /// Returns `false` if nothing matched.
    pub async fn delete_fast(&self, owner_id: &str, fast_id: &str) -> Result<bool> {
        let owner_id = owner_id.to_string();
        let fast_id = fast_id.to_string();
        self.execute(move |conn| {
            let deleted = conn.execute(
                "DELETE FROM fasts WHERE id = ?1 AND owner_id = ?2",
                params![fast_id, owner_id],
            )?;
            Ok(deleted > 0)
        })
        .await
    }
}
