use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    Completed,
    /// Playback stopped because the routine cursor could not be resolved.
    Faulted,
    /// The session was left before the routine finished.
    Abandoned,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Completed => "Completed",
            SessionStatus::Faulted => "Faulted",
            SessionStatus::Abandoned => "Abandoned",
        }
    }
}

/// Counters accumulated by the player over one playback session.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    /// Ticks processed while not paused.
    pub elapsed_ticks: u64,
    pub exercises_completed: u32,
    pub blocks_completed: u32,
    pub skips: u32,
}

/// A finished (or abandoned) playback session, as handed to the completion sink.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    pub routine_id: String,
    pub routine_name: String,
    pub user_id: Option<String>,
    pub started_at: DateTime<Utc>,
    pub stopped_at: DateTime<Utc>,
    pub status: SessionStatus,
    pub stats: SessionStats,
}

/// What the navigator receives when a session ends.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub routine_id: String,
    pub status: SessionStatus,
    pub stats: SessionStats,
}

impl From<&SessionRecord> for SessionSummary {
    fn from(record: &SessionRecord) -> Self {
        Self {
            session_id: record.id.clone(),
            routine_id: record.routine_id.clone(),
            status: record.status,
            stats: record.stats,
        }
    }
}
