use anyhow::Result;
use rusqlite::{params, Connection, Row};

use crate::{
    completion::CompletionSink,
    db::{
        helpers::{parse_datetime, parse_status, to_i64, to_u32, to_u64},
        Database,
    },
    models::{SessionRecord, SessionStats},
};

const ENABLE_LOGS: bool = true;
use crate::{log_debug, log_warn};

fn row_to_record(row: &Row) -> Result<SessionRecord> {
    let started_at: String = row.get("started_at")?;
    let stopped_at: String = row.get("stopped_at")?;
    let status: String = row.get("status")?;
    let elapsed_ticks: i64 = row.get("elapsed_ticks")?;
    let exercises_completed: i64 = row.get("exercises_completed")?;
    let blocks_completed: i64 = row.get("blocks_completed")?;
    let skips: i64 = row.get("skips")?;

    Ok(SessionRecord {
        id: row.get("id")?,
        routine_id: row.get("routine_id")?,
        routine_name: row.get("routine_name")?,
        user_id: row.get("user_id")?,
        started_at: parse_datetime(&started_at, "started_at")?,
        stopped_at: parse_datetime(&stopped_at, "stopped_at")?,
        status: parse_status(&status)?,
        stats: SessionStats {
            elapsed_ticks: to_u64(elapsed_ticks, "elapsed_ticks")?,
            exercises_completed: to_u32(exercises_completed, "exercises_completed")?,
            blocks_completed: to_u32(blocks_completed, "blocks_completed")?,
            skips: to_u32(skips, "skips")?,
        },
    })
}

fn insert_record(conn: &mut Connection, record: &SessionRecord) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO sessions (id, routine_id, routine_name, user_id, started_at, stopped_at, status, elapsed_ticks, exercises_completed, blocks_completed, skips)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            record.id,
            record.routine_id,
            record.routine_name,
            record.user_id,
            record.started_at.to_rfc3339(),
            record.stopped_at.to_rfc3339(),
            record.status.as_str(),
            to_i64(record.stats.elapsed_ticks)?,
            record.stats.exercises_completed,
            record.stats.blocks_completed,
            record.stats.skips,
        ],
    )?;
    Ok(())
}

impl Database {
    pub async fn insert_session_record(&self, record: &SessionRecord) -> Result<()> {
        let record = record.clone();
        self.execute(move |conn| insert_record(conn, &record)).await
    }

    /// Most recent sessions first, optionally narrowed to one routine.
    pub async fn list_session_records(
        &self,
        routine_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SessionRecord>> {
        let routine_id = routine_id.map(str::to_string);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, routine_id, routine_name, user_id, started_at, stopped_at, status, elapsed_ticks, exercises_completed, blocks_completed, skips
                 FROM sessions
                 WHERE ?1 IS NULL OR routine_id = ?1
                 ORDER BY started_at DESC
                 LIMIT ?2",
            )?;
            let mut rows = stmt.query(params![routine_id, limit])?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                records.push(row_to_record(row)?);
            }
            Ok(records)
        })
        .await
    }
}

impl CompletionSink for Database {
    fn record(&self, record: &SessionRecord) {
        let record = record.clone();
        let session_id = record.id.clone();
        match self.submit("session record", move |conn| insert_record(conn, &record)) {
            Ok(()) => log_debug!("Queued session {session_id} for persistence"),
            Err(err) => log_warn!("Session {session_id} not persisted: {err:?}"),
        }
    }
}
