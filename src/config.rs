//! Tunable settings.
//!
//! Every field has a default matching the shipped game, so an absent or partial
//! `settings.json` still yields a playable configuration. Settings are read
//! once at startup and never written back.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_ENV: &str = "HEARTMATCH_CONFIG";
pub const SETTINGS_FILE_NAME: &str = "settings.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid setting: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MilestoneSpec {
    pub score: u64,
    pub text: String,
    pub image: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    pub peek_revert_ms: u64,
    pub mismatch_reveal_ms: u64,
    pub tick_ms: u64,
    pub win_message_delay_ms: u64,
    pub act_transition_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            peek_revert_ms: 1500,
            mismatch_reveal_ms: 500,
            tick_ms: 1000,
            win_message_delay_ms: 1000,
            act_transition_ms: 1000,
        }
    }
}

impl Timings {
    pub fn peek_revert(&self) -> Duration {
        Duration::from_millis(self.peek_revert_ms)
    }

    pub fn mismatch_reveal(&self) -> Duration {
        Duration::from_millis(self.mismatch_reveal_ms)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArcadeTuning {
    pub base_seconds_per_pair: f64,
    /// Seconds per pair lost with every level.
    pub decay_per_level: f64,
    pub min_seconds_per_pair: f64,
    pub score_base: u64,
    pub score_per_level: u64,
}

impl Default for ArcadeTuning {
    fn default() -> Self {
        Self {
            base_seconds_per_pair: 5.1,
            decay_per_level: 0.18,
            min_seconds_per_pair: 2.0,
            score_base: 200,
            score_per_level: 20,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundSettings {
    pub enabled: bool,
    pub sfx_volume: f64,
    pub ambient_volume: f64,
    pub ducked_volume: f64,
}

impl Default for SoundSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            sfx_volume: 0.3,
            ambient_volume: 0.04,
            ducked_volume: 0.01,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub timings: Timings,
    pub story_seconds_per_pair: u32,
    pub arcade: ArcadeTuning,
    pub milestones: Vec<MilestoneSpec>,
    pub sound: SoundSettings,
    pub assets_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timings: Timings::default(),
            story_seconds_per_pair: 5,
            arcade: ArcadeTuning::default(),
            milestones: default_milestones(),
            sound: SoundSettings::default(),
            assets_dir: PathBuf::from("assets"),
        }
    }
}

fn default_milestones() -> Vec<MilestoneSpec> {
    [
        (20_000, "Amazing! 20,000 points! 🌟", "20.png"),
        (25_000, "Incredible! 25,000 points! 💖", "25.png"),
        (30_000, "Legendary! 30,000 points! 🏆", "30.png"),
    ]
    .into_iter()
    .map(|(score, text, image)| MilestoneSpec {
        score,
        text: format!("{text}\nTake a screenshot to prove your milestone!"),
        image: image.to_string(),
    })
    .collect()
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timings.tick_ms == 0 {
            return Err(ConfigError::Invalid("timings.tick_ms must be positive".into()));
        }
        if self.story_seconds_per_pair == 0 {
            return Err(ConfigError::Invalid(
                "story_seconds_per_pair must be positive".into(),
            ));
        }
        let floor = self.arcade.min_seconds_per_pair;
        if floor.is_nan() || floor <= 0.0 {
            return Err(ConfigError::Invalid(
                "arcade.min_seconds_per_pair must be positive".into(),
            ));
        }
        if self
            .milestones
            .windows(2)
            .any(|pair| pair[0].score >= pair[1].score)
        {
            return Err(ConfigError::Invalid(
                "milestones must be strictly ascending by score".into(),
            ));
        }
        Ok(())
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        settings.validate()?;
        Ok(settings)
    }

    /// `$HEARTMATCH_CONFIG` if set, otherwise `settings.json` under `config_dir`.
    pub fn resolve_path(config_dir: Option<&Path>) -> Option<PathBuf> {
        if let Some(explicit) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(explicit));
        }
        config_dir.map(|dir| dir.join("heartmatch").join(SETTINGS_FILE_NAME))
    }

    /// Loads the resolved settings file, falling back to defaults when it is
    /// missing or broken.
    pub fn load_or_default(config_dir: Option<&Path>) -> Self {
        let Some(path) = Self::resolve_path(config_dir) else {
            return Self::default();
        };
        if !path.exists() {
            tracing::debug!("No settings at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(settings) => {
                tracing::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(err) => {
                tracing::warn!("{err}; using default settings");
                Self::default()
            }
        }
    }

    pub fn asset_path(&self, name: &str) -> PathBuf {
        self.assets_dir.join(name)
    }
}
