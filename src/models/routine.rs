//! Routine data models.
//!
//! `RoutineDocument` and friends mirror the stored JSON/SQLite shape, where an
//! exercise carries an optional `duration` and an optional `reps`. The validated
//! `Routine` tree is what the player consumes: every exercise has exactly one
//! `ExerciseMode` and every container is known to be non-empty.

use serde::{Deserialize, Serialize};

/// Rest applied between exercises when a routine does not specify one.
pub const DEFAULT_REST_BETWEEN_EXERCISES_SECS: u32 = 5;
/// Rest applied between blocks when a routine does not specify one.
pub const DEFAULT_REST_BETWEEN_BLOCKS_SECS: u32 = 5;
/// Duration used for an exercise that declares neither a duration nor reps.
pub const FALLBACK_DURATION_SECS: u32 = 30;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ExerciseMode {
    /// Timed work, in seconds.
    Duration(u32),
    /// Rep-paced work; each attempt gets the player's rep pace on the clock.
    Reps(u32),
}

impl ExerciseMode {
    /// Number of attempts the player runs before the exercise is exhausted.
    pub fn attempts(&self) -> u32 {
        match self {
            ExerciseMode::Duration(_) => 1,
            ExerciseMode::Reps(count) => *count,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub name: String,
    pub mode: ExerciseMode,
    pub equipment: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub title: String,
    pub repeat_count: u32,
    pub is_preparation: bool,
    pub exercises: Vec<Exercise>,
}

/// A validated, immutable routine. Built through `routines::validate`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Routine {
    pub id: String,
    pub name: String,
    pub style: Option<String>,
    pub level: Option<Level>,
    pub estimated_minutes: Option<u32>,
    pub rest_between_exercises: u32,
    pub rest_between_blocks: u32,
    pub blocks: Vec<Block>,
}

impl Routine {
    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn exercise(&self, block_index: usize, exercise_index: usize) -> Option<&Exercise> {
        self.blocks
            .get(block_index)
            .and_then(|block| block.exercises.get(exercise_index))
    }

    pub fn exercise_count(&self) -> usize {
        self.blocks.iter().map(|block| block.exercises.len()).sum()
    }
}

// Stored shape. Field names follow the routine tables/JSON documents.

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExerciseDocument {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BlockDocument {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
    #[serde(default)]
    pub is_preparation: bool,
    #[serde(default)]
    pub exercises: Vec<ExerciseDocument>,
}

fn default_repeat() -> u32 {
    1
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RoutineDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
    /// Estimated length in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_between_exercises: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_between_blocks: Option<u32>,
    #[serde(default)]
    pub blocks: Vec<BlockDocument>,
}
