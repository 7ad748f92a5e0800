use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::{
    error::PlayerError,
    player::{Phase, PlayerController, PlayerSnapshot},
};

const ENABLE_LOGS: bool = true;
use crate::log_info;

/// A line typed at the player prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    TogglePause,
    SkipExercise,
    SkipBlock,
    ResetExercise,
    ResetBlock,
    ResetRoutine,
    Quit,
}

pub const HELP: &str =
    "commands: p pause/resume, s skip exercise, b skip block, r reset exercise, rb reset block, rr restart routine, q quit";

pub fn parse_command(line: &str) -> Option<ConsoleCommand> {
    let command = match line.trim().to_ascii_lowercase().as_str() {
        "p" | "pause" | "resume" => ConsoleCommand::TogglePause,
        "s" | "skip" => ConsoleCommand::SkipExercise,
        "b" | "skip-block" => ConsoleCommand::SkipBlock,
        "r" | "reset" => ConsoleCommand::ResetExercise,
        "rb" | "reset-block" => ConsoleCommand::ResetBlock,
        "rr" | "restart" => ConsoleCommand::ResetRoutine,
        "q" | "quit" | "exit" => ConsoleCommand::Quit,
        _ => return None,
    };
    Some(command)
}

/// Applies a command to the controller. `Quit` leaves the session.
pub async fn apply(
    controller: &PlayerController,
    command: ConsoleCommand,
) -> Result<Option<PlayerSnapshot>, PlayerError> {
    let snapshot = match command {
        ConsoleCommand::TogglePause => controller.toggle_pause().await?,
        ConsoleCommand::SkipExercise => controller.skip_exercise().await?,
        ConsoleCommand::SkipBlock => controller.skip_block().await?,
        ConsoleCommand::ResetExercise => controller.reset_exercise().await?,
        ConsoleCommand::ResetBlock => controller.reset_block().await?,
        ConsoleCommand::ResetRoutine => controller.reset_routine().await?,
        ConsoleCommand::Quit => {
            controller.leave().await;
            return Ok(None);
        }
    };
    Ok(Some(snapshot))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Position {
    phase: Phase,
    block_index: usize,
    exercise_index: usize,
    block_repeat: u32,
    exercise_repeat: u32,
}

impl From<&PlayerSnapshot> for Position {
    fn from(snapshot: &PlayerSnapshot) -> Self {
        let state = &snapshot.state;
        Self {
            phase: state.phase,
            block_index: state.block_index,
            exercise_index: state.exercise_index,
            block_repeat: state.block_repeat,
            exercise_repeat: state.exercise_repeat,
        }
    }
}

pub fn describe(snapshot: &PlayerSnapshot) -> String {
    let state = &snapshot.state;
    let block = snapshot.block_title.as_deref().unwrap_or("-");
    let exercise = snapshot.exercise_name.as_deref().unwrap_or("-");

    let phase = match state.phase {
        Phase::Paused => format!("Paused in {}", state.effective_phase().as_str()),
        phase => phase.as_str().to_string(),
    };

    let mut line = format!(
        "[{} round {}/{}] {} ({}",
        block,
        state.block_repeat,
        snapshot.block_repeat_count.max(1),
        exercise,
        phase,
    );
    if state.phase != Phase::Finished {
        line.push_str(&format!(", {}s", state.countdown));
    }
    if let Some(reps) = snapshot.target_reps {
        line.push_str(&format!(", rep {}/{}", state.exercise_repeat, reps));
    }
    if let Some(equipment) = snapshot.equipment.as_deref() {
        line.push_str(&format!(", {equipment}"));
    }
    line.push(')');
    line
}

/// Prints a line whenever the player moves to a new phase or position.
pub async fn watch_loop(controller: PlayerController, cancel_token: CancellationToken) {
    let period = (controller.tick_interval() / 4).max(Duration::from_millis(10));
    let mut poll = tokio::time::interval(period);
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut last: Option<Position> = None;

    loop {
        tokio::select! {
            _ = poll.tick() => {
                let Some(snapshot) = controller.snapshot().await else {
                    continue;
                };
                let position = Position::from(&snapshot);
                if last != Some(position) {
                    println!("{}", describe(&snapshot));
                    last = Some(position);
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("console watcher shutting down");
                break;
            }
        }
    }
}
