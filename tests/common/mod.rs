#![allow(dead_code)]

use routine_player_lib::{
    models::{Block, Exercise, ExerciseMode, Routine},
    player::{Effect, Phase, RoutinePlayer},
    routines::RoutineRegistry,
    settings::RestDefaults,
};

pub fn timed(name: &str, secs: u32) -> Exercise {
    Exercise {
        name: name.into(),
        mode: ExerciseMode::Duration(secs),
        equipment: None,
    }
}

pub fn reps(name: &str, count: u32) -> Exercise {
    Exercise {
        name: name.into(),
        mode: ExerciseMode::Reps(count),
        equipment: None,
    }
}

pub fn block(title: &str, repeat_count: u32, exercises: Vec<Exercise>) -> Block {
    Block {
        title: title.into(),
        repeat_count,
        is_preparation: false,
        exercises,
    }
}

pub fn preparation(exercise: Exercise) -> Block {
    Block {
        title: "Preparation".into(),
        repeat_count: 1,
        is_preparation: true,
        exercises: vec![exercise],
    }
}

pub fn routine(
    blocks: Vec<Block>,
    rest_between_exercises: u32,
    rest_between_blocks: u32,
) -> Routine {
    Routine {
        id: "fixture".into(),
        name: "Fixture".into(),
        style: None,
        level: None,
        estimated_minutes: None,
        rest_between_exercises,
        rest_between_blocks,
        blocks,
    }
}

pub fn built_in_routines() -> Vec<Routine> {
    let registry = RoutineRegistry::built_in().unwrap();
    registry
        .ids()
        .map(|id| {
            let document = registry.get(id).unwrap().clone();
            routine_player_lib::routines::validate(document, id, &RestDefaults::default()).unwrap()
        })
        .collect()
}

/// Position of the player while a stretch of ticks is spent there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub phase: Phase,
    pub block_index: usize,
    pub exercise_index: usize,
    pub block_repeat: u32,
    pub exercise_repeat: u32,
    pub ticks: u32,
}

pub fn run(
    phase: Phase,
    block_index: usize,
    exercise_index: usize,
    block_repeat: u32,
    exercise_repeat: u32,
    ticks: u32,
) -> Run {
    Run {
        phase,
        block_index,
        exercise_index,
        block_repeat,
        exercise_repeat,
        ticks,
    }
}

/// Ticks the player to the end, grouping ticks by the position they were
/// spent in. Returns the runs and every effect emitted along the way.
pub fn play_out(player: &mut RoutinePlayer, limit: u64) -> (Vec<Run>, Vec<Effect>) {
    let mut runs: Vec<Run> = Vec::new();
    let mut effects = player.take_effects();
    let mut ticks = 0;

    while !player.is_finished() {
        assert!(ticks < limit, "player did not finish within {limit} ticks");
        let state = player.state();
        let current = run(
            state.phase,
            state.block_index,
            state.exercise_index,
            state.block_repeat,
            state.exercise_repeat,
            1,
        );
        match runs.last_mut() {
            Some(last) if Run { ticks: 1, ..*last } == current => last.ticks += 1,
            _ => runs.push(current),
        }
        effects.extend(player.tick());
        ticks += 1;
    }

    (runs, effects)
}
