use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::RwLock,
};

use crate::models::{DEFAULT_REST_BETWEEN_BLOCKS_SECS, DEFAULT_REST_BETWEEN_EXERCISES_SECS};

/// How the player paces the on-screen clock.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Pacing {
    /// Seconds on the clock for one attempt of a rep-based exercise.
    pub rep_work_secs: u32,
    /// Final seconds of active work during which every tick beeps.
    pub warning_window_secs: u32,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            rep_work_secs: 30,
            warning_window_secs: 5,
        }
    }
}

/// Rests used for routines that leave them unspecified.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RestDefaults {
    pub between_exercises_secs: u32,
    pub between_blocks_secs: u32,
}

impl Default for RestDefaults {
    fn default() -> Self {
        Self {
            between_exercises_secs: DEFAULT_REST_BETWEEN_EXERCISES_SECS,
            between_blocks_secs: DEFAULT_REST_BETWEEN_BLOCKS_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SoundSettings {
    pub enabled: bool,
    pub volume: f32,
}

impl Default for SoundSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: 0.8,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerSettings {
    pub pacing: Pacing,
    pub rest_defaults: RestDefaults,
    pub sound: SoundSettings,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<PlayerSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            match serde_json::from_str(&contents) {
                Ok(settings) => settings,
                Err(err) => {
                    log::warn!(
                        "Ignoring unreadable settings at {}: {}",
                        path.display(),
                        err
                    );
                    PlayerSettings::default()
                }
            }
        } else {
            PlayerSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> PlayerSettings {
        match self.data.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn pacing(&self) -> Pacing {
        self.snapshot().pacing
    }

    pub fn rest_defaults(&self) -> RestDefaults {
        self.snapshot().rest_defaults
    }

    pub fn sound(&self) -> SoundSettings {
        self.snapshot().sound
    }

    pub fn update(&self, settings: PlayerSettings) -> Result<()> {
        let mut guard = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        self.persist(&settings)?;
        *guard = settings;
        Ok(())
    }

    pub fn update_sound(&self, sound: SoundSettings) -> Result<()> {
        let mut next = self.snapshot();
        next.sound = sound;
        self.update(next)
    }

    fn persist(&self, data: &PlayerSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create settings directory {}", parent.display())
            })?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
