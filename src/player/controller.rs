use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use uuid::Uuid;

use crate::{
    audio::CueDispatcher,
    completion::CompletionSink,
    error::PlayerError,
    models::{Routine, SessionRecord, SessionStatus, SessionSummary},
    navigation::Navigator,
    routines::{RoutineSource, UserContext},
    settings::Pacing,
};

use super::{Effect, FinishReason, PlayerSnapshot, RoutinePlayer};

const ENABLE_LOGS: bool = true;
use crate::{log_info, log_warn};

/// Collaborators that receive a session's side effects.
#[derive(Clone)]
pub struct SessionServices {
    pub cues: CueDispatcher,
    pub navigator: Arc<dyn Navigator>,
    pub sink: Option<Arc<dyn CompletionSink>>,
}

struct ActiveSession {
    id: String,
    user_id: Option<String>,
    started_at: DateTime<Utc>,
    player: RoutinePlayer,
}

impl ActiveSession {
    fn record(&self, status: SessionStatus) -> SessionRecord {
        let routine = self.player.routine();
        SessionRecord {
            id: self.id.clone(),
            routine_id: routine.id.clone(),
            routine_name: routine.name.clone(),
            user_id: self.user_id.clone(),
            started_at: self.started_at,
            stopped_at: Utc::now(),
            status,
            stats: self.player.state().stats,
        }
    }
}

/// Drives one `RoutinePlayer` at a time from a 1 Hz ticker and forwards its
/// effects. Commands and ticks are serialised through the session lock.
#[derive(Clone)]
pub struct PlayerController {
    session: Arc<Mutex<Option<ActiveSession>>>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    services: Arc<SessionServices>,
    pacing: Pacing,
    tick_interval: Duration,
}

impl PlayerController {
    pub fn new(services: SessionServices, pacing: Pacing) -> Self {
        let debug_mode = std::env::var("ROUTINE_PLAYER_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            session: Arc::new(Mutex::new(None)),
            ticker: Arc::new(Mutex::new(None)),
            services: Arc::new(services),
            pacing,
            tick_interval: if debug_mode {
                Duration::from_millis(100)
            } else {
                Duration::from_secs(1)
            },
        }
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Loads a routine and starts playing it. Nothing is started if the load fails.
    pub async fn open<S: RoutineSource>(
        &self,
        source: &S,
        routine_id: &str,
        user: &UserContext,
    ) -> Result<PlayerSnapshot, PlayerError> {
        let routine = source.load(routine_id, user).await?;
        self.start(routine, user.user_id.clone()).await
    }

    pub async fn start(
        &self,
        routine: Routine,
        user_id: Option<String>,
    ) -> Result<PlayerSnapshot, PlayerError> {
        let mut guard = self.session.lock().await;
        if guard.as_ref().is_some_and(|active| !active.player.is_finished()) {
            return Err(PlayerError::AlreadyActive);
        }

        let mut player = RoutinePlayer::new(routine, self.pacing);
        let effects = player.take_effects();
        let session = ActiveSession {
            id: Uuid::new_v4().to_string(),
            user_id,
            started_at: Utc::now(),
            player,
        };
        log_info!(
            "Session {} playing {}",
            session.id,
            session.player.routine().id
        );
        *guard = Some(session);

        self.settle(&guard, effects)
            .await
            .ok_or(PlayerError::NoSession)
    }

    pub async fn snapshot(&self) -> Option<PlayerSnapshot> {
        self.session
            .lock()
            .await
            .as_ref()
            .map(|active| active.player.snapshot())
    }

    /// True while a session is playing or paused.
    pub async fn is_active(&self) -> bool {
        self.session
            .lock()
            .await
            .as_ref()
            .is_some_and(|active| !active.player.is_finished())
    }

    pub async fn pause(&self) -> Result<PlayerSnapshot, PlayerError> {
        self.command(RoutinePlayer::pause).await
    }

    pub async fn resume(&self) -> Result<PlayerSnapshot, PlayerError> {
        self.command(RoutinePlayer::resume).await
    }

    pub async fn toggle_pause(&self) -> Result<PlayerSnapshot, PlayerError> {
        self.command(RoutinePlayer::toggle_pause).await
    }

    pub async fn skip_exercise(&self) -> Result<PlayerSnapshot, PlayerError> {
        self.command(RoutinePlayer::skip_exercise).await
    }

    pub async fn skip_block(&self) -> Result<PlayerSnapshot, PlayerError> {
        self.command(RoutinePlayer::skip_block).await
    }

    pub async fn reset_exercise(&self) -> Result<PlayerSnapshot, PlayerError> {
        self.command(RoutinePlayer::reset_exercise).await
    }

    pub async fn reset_block(&self) -> Result<PlayerSnapshot, PlayerError> {
        self.command(RoutinePlayer::reset_block).await
    }

    pub async fn reset_routine(&self) -> Result<PlayerSnapshot, PlayerError> {
        self.command(RoutinePlayer::reset_routine).await
    }

    /// Leaves the player: stops the ticker and any sound, and discards the
    /// session. An unfinished session is reported as abandoned.
    pub async fn leave(&self) {
        let mut guard = self.session.lock().await;
        self.cancel_ticker().await;
        self.services.cues.stop();

        if let Some(active) = guard.take().filter(|active| !active.player.is_finished()) {
            let record = active.record(SessionStatus::Abandoned);
            log_info!("Session {} abandoned", record.id);
            if let Some(sink) = &self.services.sink {
                sink.record(&record);
            }
            self.services
                .navigator
                .routine_abandoned(&SessionSummary::from(&record));
        }
    }

    async fn command(
        &self,
        apply: fn(&mut RoutinePlayer) -> Vec<Effect>,
    ) -> Result<PlayerSnapshot, PlayerError> {
        let mut guard = self.session.lock().await;
        let active = guard.as_mut().ok_or(PlayerError::NoSession)?;
        let was_ticking = active.player.state().is_ticking();
        let effects = apply(&mut active.player);
        let restart = !effects.is_empty() || !was_ticking;

        if restart {
            self.settle(&guard, effects)
                .await
                .ok_or(PlayerError::NoSession)
        } else {
            // No-op command: leave the running ticker's cadence alone.
            guard
                .as_ref()
                .map(|active| active.player.snapshot())
                .ok_or(PlayerError::NoSession)
        }
    }

    /// Dispatches effects and (re)arms or stops the ticker to match the player.
    async fn settle(
        &self,
        guard: &Option<ActiveSession>,
        effects: Vec<Effect>,
    ) -> Option<PlayerSnapshot> {
        let ticking = dispatch(&self.services, guard, effects);
        if ticking {
            self.spawn_ticker().await;
        } else {
            self.cancel_ticker().await;
        }
        guard.as_ref().map(|active| active.player.snapshot())
    }

    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let session = self.session.clone();
        let ticker = self.ticker.clone();
        let services = self.services.clone();
        let tick_interval = self.tick_interval;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + tick_interval, tick_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;

                let mut guard = session.lock().await;
                let Some(active) = guard.as_mut() else {
                    break;
                };
                let effects = active.player.tick();
                if !dispatch(&services, &guard, effects) {
                    // Our own handle; dropping it detaches rather than aborts.
                    ticker.lock().await.take();
                    break;
                }
            }
        });

        *ticker_guard = Some(handle);
    }

    async fn cancel_ticker(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }
}

/// Forwards effects to the collaborators. On `Finished` the session is
/// recorded and the navigator is told; the finished player stays in the slot,
/// inert, until the session is left or replaced. Returns whether the ticker
/// should keep running.
fn dispatch(
    services: &SessionServices,
    slot: &Option<ActiveSession>,
    effects: Vec<Effect>,
) -> bool {
    let mut finished = None;
    for effect in &effects {
        match effect {
            Effect::Finished(reason) => finished = Some(*reason),
            sound => services.cues.dispatch(sound),
        }
    }

    if let Some(reason) = finished {
        if let Some(active) = slot.as_ref() {
            let status = match reason {
                FinishReason::Completed => SessionStatus::Completed,
                FinishReason::Fault => SessionStatus::Faulted,
            };
            let record = active.record(status);
            if status == SessionStatus::Faulted {
                log_warn!("Session {} stopped on a routine fault", record.id);
            } else {
                log_info!(
                    "Session {} completed in {} ticks",
                    record.id,
                    record.stats.elapsed_ticks
                );
            }
            if let Some(sink) = &services.sink {
                sink.record(&record);
            }
            services
                .navigator
                .routine_finished(&SessionSummary::from(&record));
        }
        return false;
    }

    slot.as_ref()
        .map(|active| active.player.state().is_ticking())
        .unwrap_or(false)
}
