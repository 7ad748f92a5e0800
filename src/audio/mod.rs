//! Start/beep sound cues.
//!
//! Sound is cosmetic: the player never waits on it and a failing output device
//! must not change what the state machine does. `CueDispatcher` is the only
//! thing the controller talks to; it swallows and logs every failure.

#[cfg(feature = "audio")]
pub mod engine;
pub mod tone;

#[cfg(feature = "audio")]
pub use engine::ToneCuePlayer;
pub use tone::Tone;

use std::sync::Arc;

use anyhow::Result;

use crate::player::Effect;

const ENABLE_LOGS: bool = true;
use crate::log_warn;

/// Fire-and-forget audio trigger.
pub trait SoundCue: Send + Sync {
    /// Stops any beep in progress and plays the start cue from the beginning.
    fn play_start(&self) -> Result<()>;
    /// Restarts the beep cue from the beginning.
    fn play_beep(&self) -> Result<()>;
    fn stop(&self) -> Result<()>;
}

/// Cue backend for headless runs and builds without the `audio` feature.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentCues;

impl SoundCue for SilentCues {
    fn play_start(&self) -> Result<()> {
        log::debug!("cue: start");
        Ok(())
    }

    fn play_beep(&self) -> Result<()> {
        log::debug!("cue: beep");
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Clone)]
pub struct CueDispatcher {
    cues: Arc<dyn SoundCue>,
    enabled: bool,
}

impl CueDispatcher {
    pub fn new(cues: Arc<dyn SoundCue>, enabled: bool) -> Self {
        Self { cues, enabled }
    }

    pub fn silent() -> Self {
        Self::new(Arc::new(SilentCues), false)
    }

    /// Plays the sound part of an effect. Non-sound effects are ignored.
    pub fn dispatch(&self, effect: &Effect) {
        let result = match effect {
            Effect::PlayStart if self.enabled => self.cues.play_start(),
            Effect::PlayBeep if self.enabled => self.cues.play_beep(),
            Effect::StopSound => self.cues.stop(),
            _ => return,
        };

        if let Err(err) = result {
            log_warn!("Sound cue {:?} failed: {:#}", effect, err);
        }
    }

    pub fn stop(&self) {
        self.dispatch(&Effect::StopSound);
    }
}
