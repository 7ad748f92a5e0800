pub mod controller;
pub mod engine;
pub mod plan;
pub mod state;

pub use controller::{PlayerController, SessionServices};
pub use engine::{Effect, RoutinePlayer};
pub use plan::{estimated_duration, expected_ticks, Segment};
pub use state::{FinishReason, Phase, PlaybackState, PlayerSnapshot};
