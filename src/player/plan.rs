//! Up-front schedule of a routine played without manual intervention.
//!
//! The walk follows the same rules as `RoutinePlayer`, so the tick count of a
//! plan is exactly the number of ticks the player needs to reach `Finished`.

use std::time::Duration;

use serde::Serialize;

use crate::{
    models::{ExerciseMode, Routine},
    settings::Pacing,
};

use super::state::Phase;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub phase: Phase,
    pub block_index: usize,
    pub exercise_index: usize,
    pub block_repeat: u32,
    pub exercise_repeat: u32,
    pub seconds: u32,
}

pub fn segments(routine: &Routine, pacing: &Pacing) -> Vec<Segment> {
    let mut plan = Vec::new();
    let block_count = routine.blocks.len();

    for (block_index, block) in routine.blocks.iter().enumerate() {
        let last_block = block_index + 1 == block_count;

        for block_repeat in 1..=block.repeat_count {
            let last_pass = block_repeat == block.repeat_count;

            for (exercise_index, exercise) in block.exercises.iter().enumerate() {
                let last_exercise = exercise_index + 1 == block.exercises.len();
                let attempts = if block.is_preparation {
                    1
                } else {
                    exercise.mode.attempts()
                };
                let work = match exercise.mode {
                    ExerciseMode::Duration(secs) => secs,
                    ExerciseMode::Reps(_) => pacing.rep_work_secs,
                }
                .max(1);

                for exercise_repeat in 1..=attempts {
                    let mut push = |phase: Phase, seconds: u32| {
                        if seconds > 0 {
                            plan.push(Segment {
                                phase,
                                block_index,
                                exercise_index,
                                block_repeat,
                                exercise_repeat,
                                seconds,
                            });
                        }
                    };

                    push(Phase::Active, work);
                    if block.is_preparation {
                        continue;
                    }
                    if exercise_repeat < attempts {
                        push(Phase::RestBetweenReps, routine.rest_between_exercises);
                    } else if !(last_exercise && last_pass && last_block) {
                        push(Phase::RestBetweenExercises, routine.rest_between_exercises);
                    }
                }
            }
        }

        if let Some(next) = routine.blocks.get(block_index + 1) {
            if !block.is_preparation && !next.is_preparation && routine.rest_between_blocks > 0 {
                plan.push(Segment {
                    phase: Phase::RestBetweenBlocks,
                    block_index,
                    exercise_index: block.exercises.len().saturating_sub(1),
                    block_repeat: block.repeat_count,
                    exercise_repeat: 1,
                    seconds: routine.rest_between_blocks,
                });
            }
        }
    }

    plan
}

/// Ticks needed to play the routine from start to `Finished`.
pub fn expected_ticks(routine: &Routine, pacing: &Pacing) -> u64 {
    segments(routine, pacing)
        .iter()
        .map(|segment| u64::from(segment.seconds))
        .sum()
}

pub fn estimated_duration(routine: &Routine, pacing: &Pacing) -> Duration {
    Duration::from_secs(expected_ticks(routine, pacing))
}
