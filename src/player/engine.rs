//! The routine playback state machine.
//!
//! `RoutinePlayer` is synchronous and owns no timers. Callers feed it ticks and
//! manual commands; every call returns the side effects the transition asked
//! for (sound cues, the finish signal) in the order they were requested.

use std::sync::Arc;

use serde::Serialize;

use crate::{
    models::{ExerciseMode, Routine},
    settings::Pacing,
};

use super::state::{FinishReason, Phase, PlaybackState, PlayerSnapshot};

const ENABLE_LOGS: bool = true;
use crate::{log_debug, log_info};

/// Side effects requested by a transition.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Effect {
    PlayStart,
    PlayBeep,
    StopSound,
    Finished(FinishReason),
}

/// Whether block advancement may insert the inter-block rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RestPolicy {
    Honor,
    Bypass,
}

pub struct RoutinePlayer {
    routine: Arc<Routine>,
    pacing: Pacing,
    state: PlaybackState,
    pending: Vec<Effect>,
}

impl RoutinePlayer {
    /// Positions the player on the first exercise, active and running. The
    /// start cue is queued and comes out of the first call that returns effects.
    pub fn new(routine: impl Into<Arc<Routine>>, pacing: Pacing) -> Self {
        let routine = routine.into();
        let mut player = Self {
            routine,
            pacing,
            state: PlaybackState::new(0),
            pending: Vec::new(),
        };
        log_info!("Starting routine {}", player.routine.name);
        player.enter_block(0);
        player
    }

    pub fn routine(&self) -> &Routine {
        &self.routine
    }

    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        let block = self.routine.block(self.state.block_index);
        let exercise = self
            .routine
            .exercise(self.state.block_index, self.state.exercise_index);

        PlayerSnapshot {
            routine_id: self.routine.id.clone(),
            routine_name: self.routine.name.clone(),
            block_title: block.map(|b| b.title.clone()),
            exercise_name: exercise.map(|e| e.name.clone()),
            equipment: exercise.and_then(|e| e.equipment.clone()),
            target_reps: exercise.and_then(|e| match e.mode {
                ExerciseMode::Reps(count) => Some(count),
                ExerciseMode::Duration(_) => None,
            }),
            block_repeat_count: block.map(|b| b.repeat_count).unwrap_or(0),
            state: self.state.clone(),
        }
    }

    /// Effects queued but not yet handed out.
    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.pending)
    }

    /// One second of playback.
    pub fn tick(&mut self) -> Vec<Effect> {
        if !self.state.is_ticking() {
            return self.take_effects();
        }

        self.state.countdown = self.state.countdown.saturating_sub(1);
        self.state.stats.elapsed_ticks += 1;

        if self.state.countdown == 0 {
            self.complete_phase();
        } else if self.state.phase == Phase::Active
            && self.state.countdown <= self.pacing.warning_window_secs
        {
            self.emit(Effect::PlayBeep);
        }

        self.take_effects()
    }

    pub fn pause(&mut self) -> Vec<Effect> {
        if matches!(self.state.phase, Phase::Paused | Phase::Finished) {
            return self.take_effects();
        }

        self.emit(Effect::StopSound);
        self.state.suspended = Some(self.state.phase);
        self.state.phase = Phase::Paused;
        log_info!("Paused at {}s", self.state.countdown);
        self.take_effects()
    }

    pub fn resume(&mut self) -> Vec<Effect> {
        if self.state.phase == Phase::Paused {
            self.state.phase = self.state.suspended.take().unwrap_or(Phase::Active);
            log_info!(
                "Resumed {} at {}s",
                self.state.phase.as_str(),
                self.state.countdown
            );
        }
        self.take_effects()
    }

    pub fn toggle_pause(&mut self) -> Vec<Effect> {
        if self.state.phase == Phase::Paused {
            self.resume()
        } else {
            self.pause()
        }
    }

    /// Jumps to the next exercise slot, ignoring remaining attempts and rests.
    pub fn skip_exercise(&mut self) -> Vec<Effect> {
        if self.interrupt() {
            self.state.stats.skips += 1;
            log_info!("Skipping exercise");
            self.skip_to_next_slot(Self::advance_exercise);
        }
        self.take_effects()
    }

    /// Leaves the current block pass, ignoring remaining exercises and rests.
    pub fn skip_block(&mut self) -> Vec<Effect> {
        if self.interrupt() {
            self.state.stats.skips += 1;
            log_info!("Skipping block");
            self.skip_to_next_slot(Self::advance_block);
        }
        self.take_effects()
    }

    pub fn reset_exercise(&mut self) -> Vec<Effect> {
        if self.interrupt() {
            self.state.exercise_repeat = 1;
            self.enter_active();
        }
        self.take_effects()
    }

    pub fn reset_block(&mut self) -> Vec<Effect> {
        if self.interrupt() {
            self.state.block_repeat = 1;
            self.state.exercise_index = 0;
            self.state.exercise_repeat = 1;
            self.enter_active();
        }
        self.take_effects()
    }

    pub fn reset_routine(&mut self) -> Vec<Effect> {
        if self.interrupt() {
            self.enter_block(0);
        }
        self.take_effects()
    }

    fn emit(&mut self, effect: Effect) {
        self.pending.push(effect);
    }

    /// Common prologue for manual commands: stop sound and drop any pause.
    /// Returns false once the routine is finished.
    fn interrupt(&mut self) -> bool {
        if self.state.is_finished() {
            return false;
        }
        self.emit(Effect::StopSound);
        if self.state.phase == Phase::Paused {
            self.state.phase = self.state.suspended.take().unwrap_or(Phase::Active);
        }
        true
    }

    /// During an inter-block rest the current block is already spent, so a
    /// skip lands on the next block instead of re-running block advancement.
    fn skip_to_next_slot(&mut self, advance: fn(&mut Self, RestPolicy)) {
        if self.state.phase == Phase::RestBetweenBlocks {
            self.enter_block(self.state.block_index + 1);
        } else {
            advance(self, RestPolicy::Bypass);
        }
    }

    fn work_seconds(&self, mode: ExerciseMode) -> u32 {
        match mode {
            ExerciseMode::Duration(secs) => secs,
            ExerciseMode::Reps(_) => self.pacing.rep_work_secs,
        }
        .max(1)
    }

    fn complete_phase(&mut self) {
        match self.state.phase {
            Phase::Active => self.complete_exercise(),
            Phase::RestBetweenReps => {
                self.state.exercise_repeat += 1;
                self.enter_active();
            }
            Phase::RestBetweenExercises => {
                self.state.exercise_repeat = 1;
                self.advance_exercise(RestPolicy::Honor);
            }
            Phase::RestBetweenBlocks => self.enter_block(self.state.block_index + 1),
            Phase::Paused | Phase::Finished => {}
        }
    }

    fn complete_exercise(&mut self) {
        let routine = Arc::clone(&self.routine);
        let Some(block) = routine.block(self.state.block_index) else {
            return self.fault();
        };
        let Some(exercise) = block.exercises.get(self.state.exercise_index) else {
            return self.fault();
        };

        if block.is_preparation {
            self.state.stats.exercises_completed += 1;
            return self.advance_block(RestPolicy::Honor);
        }

        if let ExerciseMode::Reps(count) = exercise.mode {
            if self.state.exercise_repeat < count {
                return self.enter_rest(Phase::RestBetweenReps, routine.rest_between_exercises);
            }
        }

        self.state.stats.exercises_completed += 1;

        let last_exercise = self.state.exercise_index + 1 >= block.exercises.len();
        let last_pass = self.state.block_repeat >= block.repeat_count;
        let last_block = self.state.block_index + 1 >= routine.blocks.len();
        if last_exercise && last_pass && last_block {
            self.state.stats.blocks_completed += 1;
            return self.finish(FinishReason::Completed);
        }

        self.enter_rest(Phase::RestBetweenExercises, routine.rest_between_exercises);
    }

    fn advance_exercise(&mut self, rest: RestPolicy) {
        let routine = Arc::clone(&self.routine);
        let Some(block) = routine.block(self.state.block_index) else {
            return self.fault();
        };

        if self.state.exercise_index + 1 < block.exercises.len() {
            self.state.exercise_index += 1;
            self.state.exercise_repeat = 1;
            self.enter_active();
        } else {
            self.advance_block(rest);
        }
    }

    fn advance_block(&mut self, rest: RestPolicy) {
        let routine = Arc::clone(&self.routine);
        let Some(block) = routine.block(self.state.block_index) else {
            return self.fault();
        };

        if self.state.block_repeat < block.repeat_count {
            self.state.block_repeat += 1;
            self.state.exercise_index = 0;
            self.state.exercise_repeat = 1;
            log_info!(
                "Repeating block {} (pass {}/{})",
                block.title,
                self.state.block_repeat,
                block.repeat_count
            );
            return self.enter_active();
        }

        self.state.stats.blocks_completed += 1;

        let next_index = self.state.block_index + 1;
        let Some(next) = routine.block(next_index) else {
            return self.finish(FinishReason::Completed);
        };

        if rest == RestPolicy::Bypass || block.is_preparation || next.is_preparation {
            self.enter_block(next_index);
        } else {
            self.enter_rest(Phase::RestBetweenBlocks, routine.rest_between_blocks);
        }
    }

    fn enter_block(&mut self, index: usize) {
        self.state.block_index = index;
        self.state.block_repeat = 1;
        self.state.exercise_index = 0;
        self.state.exercise_repeat = 1;
        if let Some(block) = self.routine.block(index) {
            log_info!("Entering block {}", block.title);
        }
        self.enter_active();
    }

    fn enter_active(&mut self) {
        let Some(mode) = self
            .routine
            .exercise(self.state.block_index, self.state.exercise_index)
            .map(|exercise| exercise.mode)
        else {
            return self.fault();
        };

        self.state.phase = Phase::Active;
        self.state.suspended = None;
        self.state.countdown = self.work_seconds(mode);
        self.emit(Effect::PlayStart);
        log_debug!(
            "Active: block {} pass {}, exercise {} attempt {}, {}s",
            self.state.block_index,
            self.state.block_repeat,
            self.state.exercise_index,
            self.state.exercise_repeat,
            self.state.countdown
        );
    }

    /// A zero-length rest is passed over without spending a tick on it.
    fn enter_rest(&mut self, phase: Phase, seconds: u32) {
        self.state.phase = phase;
        self.state.suspended = None;
        if seconds == 0 {
            return self.complete_phase();
        }
        self.state.countdown = seconds;
        self.emit(Effect::StopSound);
        log_debug!("{}: {}s", phase.as_str(), seconds);
    }

    fn fault(&mut self) {
        log::error!(
            "Routine {} has no exercise at block {} / exercise {}; stopping playback",
            self.routine.id,
            self.state.block_index,
            self.state.exercise_index
        );
        self.finish(FinishReason::Fault);
    }

    fn finish(&mut self, reason: FinishReason) {
        if self.state.is_finished() {
            return;
        }
        self.state.phase = Phase::Finished;
        self.state.suspended = None;
        self.state.running = false;
        self.state.countdown = 0;
        self.emit(Effect::StopSound);
        self.emit(Effect::Finished(reason));
        log_info!("Routine {} finished ({:?})", self.routine.name, reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Block, Exercise};

    fn timed(name: &str, secs: u32) -> Exercise {
        Exercise {
            name: name.into(),
            mode: ExerciseMode::Duration(secs),
            equipment: None,
        }
    }

    fn reps(name: &str, count: u32) -> Exercise {
        Exercise {
            name: name.into(),
            mode: ExerciseMode::Reps(count),
            equipment: Some("Kettlebell".into()),
        }
    }

    fn block(title: &str, repeat_count: u32, exercises: Vec<Exercise>) -> Block {
        Block {
            title: title.into(),
            repeat_count,
            is_preparation: false,
            exercises,
        }
    }

    fn routine(blocks: Vec<Block>, rest_ex: u32, rest_blocks: u32) -> Routine {
        Routine {
            id: "test".into(),
            name: "Test".into(),
            style: None,
            level: None,
            estimated_minutes: None,
            rest_between_exercises: rest_ex,
            rest_between_blocks: rest_blocks,
            blocks,
        }
    }

    fn tick_n(player: &mut RoutinePlayer, n: u32) -> Vec<Effect> {
        (0..n).flat_map(|_| player.tick()).collect()
    }

    #[test]
    fn starts_on_first_exercise_with_start_cue() {
        let mut player = RoutinePlayer::new(
            routine(vec![block("Main", 1, vec![timed("A", 12)])], 5, 5),
            Pacing::default(),
        );

        assert_eq!(player.take_effects(), vec![Effect::PlayStart]);
        let state = player.state();
        assert_eq!(state.phase, Phase::Active);
        assert_eq!(state.countdown, 12);
        assert!(state.running);
    }

    #[test]
    fn rep_exercise_uses_rep_pace() {
        let pacing = Pacing {
            rep_work_secs: 20,
            warning_window_secs: 5,
        };
        let player = RoutinePlayer::new(
            routine(vec![block("Main", 1, vec![reps("Swing", 3)])], 5, 5),
            pacing,
        );
        assert_eq!(player.state().countdown, 20);
    }

    #[test]
    fn beeps_only_in_warning_window_of_active_work() {
        let mut player = RoutinePlayer::new(
            routine(
                vec![block("Main", 1, vec![timed("A", 8), timed("B", 8)])],
                7,
                5,
            ),
            Pacing::default(),
        );
        player.take_effects();

        let first_two = tick_n(&mut player, 2);
        assert!(first_two.is_empty());

        let warning = tick_n(&mut player, 5);
        assert_eq!(warning, vec![Effect::PlayBeep; 5]);

        // countdown hits zero: into a 7s rest, no beep
        assert_eq!(player.tick(), vec![Effect::StopSound]);
        assert_eq!(player.phase(), Phase::RestBetweenExercises);
        assert!(tick_n(&mut player, 6).is_empty());
        assert_eq!(player.tick(), vec![Effect::PlayStart]);
        assert_eq!(player.state().exercise_index, 1);
    }

    #[test]
    fn pause_is_idempotent_and_resume_keeps_countdown() {
        let mut player = RoutinePlayer::new(
            routine(vec![block("Main", 1, vec![timed("A", 30)])], 5, 5),
            Pacing::default(),
        );
        tick_n(&mut player, 3);

        assert_eq!(player.pause(), vec![Effect::StopSound]);
        let paused = player.state().clone();
        assert!(player.pause().is_empty());
        assert_eq!(player.state(), &paused);

        assert!(player.tick().is_empty());
        assert_eq!(player.state().countdown, 27);

        player.resume();
        assert_eq!(player.phase(), Phase::Active);
        assert_eq!(player.state().countdown, 27);
    }

    #[test]
    fn resume_without_pause_is_noop() {
        let mut player = RoutinePlayer::new(
            routine(vec![block("Main", 1, vec![timed("A", 30)])], 5, 5),
            Pacing::default(),
        );
        let before = player.state().clone();
        player.resume();
        assert_eq!(player.state(), &before);
    }

    #[test]
    fn skip_exercise_jumps_past_remaining_attempts() {
        let mut player = RoutinePlayer::new(
            routine(
                vec![block("Main", 1, vec![reps("Swing", 3), timed("Plank", 20)])],
                2,
                5,
            ),
            Pacing::default(),
        );
        tick_n(&mut player, 30);
        assert_eq!(player.phase(), Phase::RestBetweenReps);

        player.take_effects();
        let effects = player.skip_exercise();

        assert_eq!(effects, vec![Effect::StopSound, Effect::PlayStart]);
        assert_eq!(player.state().exercise_index, 1);
        assert_eq!(player.state().exercise_repeat, 1);
        assert_eq!(player.state().countdown, 20);
        assert_eq!(player.state().stats.skips, 1);
    }

    #[test]
    fn skip_exercise_while_paused_unpauses() {
        let mut player = RoutinePlayer::new(
            routine(
                vec![block("Main", 1, vec![timed("A", 10), timed("B", 10)])],
                2,
                5,
            ),
            Pacing::default(),
        );
        player.pause();
        player.skip_exercise();

        assert_eq!(player.phase(), Phase::Active);
        assert_eq!(player.state().suspended, None);
        assert_eq!(player.state().exercise_index, 1);
    }

    #[test]
    fn skip_block_repeats_before_moving_on() {
        let mut player = RoutinePlayer::new(
            routine(
                vec![
                    block("First", 2, vec![timed("A", 10), timed("B", 10)]),
                    block("Second", 1, vec![timed("C", 10)]),
                ],
                2,
                30,
            ),
            Pacing::default(),
        );

        player.skip_block();
        assert_eq!(player.state().block_index, 0);
        assert_eq!(player.state().block_repeat, 2);

        player.skip_block();
        assert_eq!(player.state().block_index, 1);
        assert_eq!(player.phase(), Phase::Active);
    }

    #[test]
    fn skip_during_block_rest_enters_next_block() {
        let mut player = RoutinePlayer::new(
            routine(
                vec![
                    block("First", 1, vec![timed("A", 2)]),
                    block("Second", 1, vec![timed("C", 10)]),
                ],
                1,
                30,
            ),
            Pacing::default(),
        );
        tick_n(&mut player, 3);
        assert_eq!(player.phase(), Phase::RestBetweenBlocks);

        player.skip_exercise();
        assert_eq!(player.phase(), Phase::Active);
        assert_eq!(player.state().block_index, 1);
    }

    #[test]
    fn resets_rewind_counters() {
        let mut player = RoutinePlayer::new(
            routine(
                vec![
                    block("First", 1, vec![timed("A", 2)]),
                    block("Second", 3, vec![reps("B", 4), timed("C", 5)]),
                ],
                1,
                0,
            ),
            Pacing::default(),
        );
        player.skip_block();
        player.skip_block();
        tick_n(&mut player, 31);
        assert_eq!(player.state().exercise_repeat, 2);
        assert_eq!(player.state().block_repeat, 2);

        player.reset_exercise();
        assert_eq!(player.state().exercise_repeat, 1);
        assert_eq!(player.state().block_repeat, 2);
        assert_eq!(player.state().countdown, 30);

        player.skip_exercise();
        player.reset_block();
        assert_eq!(
            (player.state().exercise_index, player.state().block_repeat),
            (0, 1)
        );
        assert_eq!(player.state().block_index, 1);

        let effects = player.reset_routine();
        assert_eq!(effects, vec![Effect::StopSound, Effect::PlayStart]);
        assert_eq!(player.state().block_index, 0);
        assert_eq!(player.state().countdown, 2);
    }

    #[test]
    fn zero_rest_is_passed_over() {
        let mut player = RoutinePlayer::new(
            routine(
                vec![block("Main", 1, vec![timed("A", 1), timed("B", 1)])],
                0,
                0,
            ),
            Pacing::default(),
        );
        player.take_effects();

        assert_eq!(player.tick(), vec![Effect::PlayStart]);
        assert_eq!(player.state().exercise_index, 1);
        assert_eq!(player.phase(), Phase::Active);
    }

    #[test]
    fn commands_after_finish_are_ignored() {
        let mut player = RoutinePlayer::new(
            routine(vec![block("Main", 1, vec![timed("A", 1)])], 5, 5),
            Pacing::default(),
        );
        let effects = player.tick();
        assert_eq!(
            effects,
            vec![
                Effect::PlayStart,
                Effect::StopSound,
                Effect::Finished(FinishReason::Completed)
            ]
        );
        let finished = player.state().clone();

        assert!(player.pause().is_empty());
        assert!(player.skip_exercise().is_empty());
        assert!(player.skip_block().is_empty());
        assert!(player.reset_exercise().is_empty());
        assert!(player.reset_block().is_empty());
        assert!(player.reset_routine().is_empty());
        assert!(player.tick().is_empty());
        assert_eq!(player.state(), &finished);
    }

    #[test]
    fn snapshot_describes_current_slot() {
        let player = RoutinePlayer::new(
            routine(vec![block("Main", 3, vec![reps("Swing", 12)])], 5, 5),
            Pacing::default(),
        );
        let snapshot = player.snapshot();

        assert_eq!(snapshot.block_title.as_deref(), Some("Main"));
        assert_eq!(snapshot.exercise_name.as_deref(), Some("Swing"));
        assert_eq!(snapshot.equipment.as_deref(), Some("Kettlebell"));
        assert_eq!(snapshot.target_reps, Some(12));
        assert_eq!(snapshot.block_repeat_count, 3);
    }

    #[test]
    fn empty_routine_faults_instead_of_playing() {
        let mut player = RoutinePlayer::new(routine(vec![], 5, 5), Pacing::default());

        assert_eq!(
            player.take_effects(),
            vec![Effect::StopSound, Effect::Finished(FinishReason::Fault)]
        );
        assert!(player.is_finished());
    }
}
