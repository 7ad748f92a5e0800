pub mod routine;
pub mod session;

pub use routine::{
    Block, BlockDocument, Exercise, ExerciseDocument, ExerciseMode, Level, Routine,
    RoutineDocument, DEFAULT_REST_BETWEEN_BLOCKS_SECS, DEFAULT_REST_BETWEEN_EXERCISES_SECS,
    FALLBACK_DURATION_SECS,
};
pub use session::{SessionRecord, SessionStats, SessionStatus, SessionSummary};
