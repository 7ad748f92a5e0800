use serde::{Deserialize, Serialize};

use crate::models::SessionStats;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Active,
    RestBetweenReps,
    RestBetweenExercises,
    RestBetweenBlocks,
    Paused,
    Finished,
}

impl Phase {
    pub fn is_rest(&self) -> bool {
        matches!(
            self,
            Phase::RestBetweenReps | Phase::RestBetweenExercises | Phase::RestBetweenBlocks
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Active => "Active",
            Phase::RestBetweenReps => "RestBetweenReps",
            Phase::RestBetweenExercises => "RestBetweenExercises",
            Phase::RestBetweenBlocks => "RestBetweenBlocks",
            Phase::Paused => "Paused",
            Phase::Finished => "Finished",
        }
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FinishReason {
    Completed,
    /// The cursor pointed past the routine; playback stopped rather than guess.
    Fault,
}

/// Mutable playback state. Lives exactly as long as one playback session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    pub block_index: usize,
    pub exercise_index: usize,
    pub block_repeat: u32,
    pub exercise_repeat: u32,
    pub countdown: u32,
    pub phase: Phase,
    /// Phase to restore on resume; only set while `phase == Paused`.
    pub suspended: Option<Phase>,
    pub running: bool,
    pub stats: SessionStats,
}

impl PlaybackState {
    pub fn new(countdown: u32) -> Self {
        Self {
            block_index: 0,
            exercise_index: 0,
            block_repeat: 1,
            exercise_repeat: 1,
            countdown,
            phase: Phase::Active,
            suspended: None,
            running: true,
            stats: SessionStats::default(),
        }
    }

    /// True while the 1 Hz ticker should be armed.
    pub fn is_ticking(&self) -> bool {
        self.running && self.phase != Phase::Paused && self.phase != Phase::Finished
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    /// Phase ignoring a pause: what the session is doing underneath.
    pub fn effective_phase(&self) -> Phase {
        match (self.phase, self.suspended) {
            (Phase::Paused, Some(phase)) => phase,
            (phase, _) => phase,
        }
    }
}

/// Read-only view handed to callers of the controller.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub routine_id: String,
    pub routine_name: String,
    pub block_title: Option<String>,
    pub exercise_name: Option<String>,
    pub equipment: Option<String>,
    /// Rep target of the current exercise, if rep-based.
    pub target_reps: Option<u32>,
    pub block_repeat_count: u32,
    pub state: PlaybackState,
}
