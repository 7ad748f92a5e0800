use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Row};
use uuid::Uuid;

use crate::{db::Database, models::RoutineDocument, routines::UserRoutineStore};

const ENABLE_LOGS: bool = true;
use crate::log_debug;

fn row_to_document(row: &Row) -> Result<RoutineDocument> {
    let id: String = row.get("id")?;
    let user_id: String = row.get("user_id")?;
    let document: String = row.get("document")?;

    let mut parsed: RoutineDocument = serde_json::from_str(&document)
        .with_context(|| format!("stored routine {id} is not valid JSON"))?;
    parsed.id = Some(id);
    parsed.user_id = Some(user_id);
    Ok(parsed)
}

impl Database {
    /// Saves a routine for `user_id`, replacing that user's routine with the
    /// same id. Other users' routines are never touched. Returns the id the
    /// routine was stored under.
    pub async fn save_user_routine(
        &self,
        user_id: &str,
        document: &RoutineDocument,
    ) -> Result<String> {
        let user_id = user_id.to_string();
        let mut document = document.clone();
        let id = document
            .id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        document.id = Some(id.clone());
        document.user_id = Some(user_id.clone());

        let body = serde_json::to_string(&document).context("failed to encode routine")?;
        let now = Utc::now().to_rfc3339();
        let stored_id = id.clone();

        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO routines (id, user_id, name, document, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                 ON CONFLICT(user_id, id) DO UPDATE SET
                     name = excluded.name,
                     document = excluded.document,
                     updated_at = excluded.updated_at",
                params![stored_id, user_id, document.name, body, now],
            )?;
            Ok(())
        })
        .await?;

        log_debug!("Stored user routine {id}");
        Ok(id)
    }

    /// The user's routines, newest first.
    pub async fn list_user_routines(&self, user_id: &str) -> Result<Vec<RoutineDocument>> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, document
                 FROM routines
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, id ASC",
            )?;
            let mut rows = stmt.query(params![user_id])?;
            let mut documents = Vec::new();
            while let Some(row) = rows.next()? {
                documents.push(row_to_document(row)?);
            }
            Ok(documents)
        })
        .await
    }

    /// Deletes one of the user's routines. Returns false if it did not exist.
    pub async fn delete_user_routine(&self, user_id: &str, routine_id: &str) -> Result<bool> {
        let user_id = user_id.to_string();
        let routine_id = routine_id.to_string();
        self.execute(move |conn| {
            let removed = conn.execute(
                "DELETE FROM routines WHERE id = ?1 AND user_id = ?2",
                params![routine_id, user_id],
            )?;
            Ok(removed > 0)
        })
        .await
    }
}

impl UserRoutineStore for Database {
    async fn fetch_user_routines(&self, user_id: &str) -> Result<Vec<RoutineDocument>> {
        self.list_user_routines(user_id).await
    }
}
