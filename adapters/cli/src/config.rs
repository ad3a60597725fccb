use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use drone_siege_core::{PlayArea, Stage, StageOutOfRange, StageTarget};
use drone_siege_system_difficulty::{DifficultyTuning, StageTable, StageTableError};
use serde::Deserialize;
use thiserror::Error;

/// Settings of a headless simulation run, loaded from TOML.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SimulationConfig {
    /// Seed shared by the world's generators.
    pub(crate) seed: u64,
    /// Number of ticks to simulate at most.
    pub(crate) ticks: u64,
    /// Simulated milliseconds per tick.
    pub(crate) tick_ms: u64,
    /// Stage number the run opens with.
    pub(crate) start_stage: u8,
    /// Seconds a survival stage lasts.
    pub(crate) stage_duration_secs: u64,
    /// Ticks between descriptor log lines.
    pub(crate) report_every: u64,
    /// Keeps live enemies across stage changes instead of clearing the field.
    pub(crate) carry_over_enemies: bool,
    /// Difficulty bands for stages 1 to 4; built-in bands apply when omitted.
    pub(crate) stage_targets: Option<[StageTarget; 4]>,
    /// Play area dimensions.
    pub(crate) area: AreaConfig,
    /// Scripted player profile.
    pub(crate) player: PlayerProfile,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0x0d0e_5eed,
            ticks: 60 * 60 * 12,
            tick_ms: 16,
            start_stage: 1,
            stage_duration_secs: 180,
            report_every: 600,
            carry_over_enemies: false,
            stage_targets: None,
            area: AreaConfig::default(),
            player: PlayerProfile::default(),
        }
    }
}

/// Play area dimensions in world units.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct AreaConfig {
    pub(crate) width: f32,
    pub(crate) height: f32,
}

impl Default for AreaConfig {
    fn default() -> Self {
        Self {
            width: 1_280.0,
            height: 720.0,
        }
    }
}

/// Behaviour of the stationary scripted player.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct PlayerProfile {
    /// Shots fired per simulated second while an enemy is on the field.
    pub(crate) shots_per_second: f32,
    /// Fraction of shots that connect.
    pub(crate) accuracy: f32,
    /// Damage dealt by a connecting shot.
    pub(crate) shot_damage: f32,
    /// Damage taken per second from each enemy in contact range.
    pub(crate) contact_damage_per_second: f32,
    /// Distance at which an enemy touches the player.
    pub(crate) contact_range: f32,
    /// Movement factor reported to the difficulty controller.
    pub(crate) movement_factor: f32,
}

impl Default for PlayerProfile {
    fn default() -> Self {
        Self {
            shots_per_second: 4.0,
            accuracy: 0.6,
            shot_damage: 1.0,
            contact_damage_per_second: 10.0,
            contact_range: 30.0,
            movement_factor: 1.3,
        }
    }
}

/// Rejected configuration values.
#[derive(Debug, Error, PartialEq)]
pub(crate) enum ConfigError {
    #[error(transparent)]
    Stage(#[from] StageOutOfRange),
    #[error("invalid stage targets: {0}")]
    StageTable(#[from] StageTableError),
    #[error("tick length must be at least one millisecond")]
    ZeroTick,
    #[error("play area must be positive, got {width}x{height}")]
    EmptyArea { width: f32, height: f32 },
    #[error("stage duration must be at least one second")]
    ZeroStageDuration,
    #[error("accuracy must lie in [0, 1], got {0}")]
    Accuracy(f32),
}

impl SimulationConfig {
    /// Reads and parses a TOML file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read simulation config at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid simulation config at {}", path.display()))
    }

    /// Parses TOML contents; missing keys fall back to defaults.
    pub(crate) fn parse(contents: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(contents).context("failed to parse simulation config toml contents")?;
        let _ = config.validate()?;
        Ok(config)
    }

    /// Checks value ranges and returns the opening stage.
    pub(crate) fn validate(&self) -> Result<Stage, ConfigError> {
        let stage = Stage::try_from(self.start_stage)?;
        if self.tick_ms == 0 {
            return Err(ConfigError::ZeroTick);
        }
        if !(self.area.width > 0.0 && self.area.height > 0.0) {
            return Err(ConfigError::EmptyArea {
                width: self.area.width,
                height: self.area.height,
            });
        }
        if self.stage_duration_secs == 0 {
            return Err(ConfigError::ZeroStageDuration);
        }
        if !(0.0..=1.0).contains(&self.player.accuracy) {
            return Err(ConfigError::Accuracy(self.player.accuracy));
        }
        let _ = self.stage_table()?;
        Ok(stage)
    }

    fn stage_table(&self) -> Result<StageTable, ConfigError> {
        match self.stage_targets {
            Some(targets) => Ok(StageTable::try_from(targets)?),
            None => Ok(StageTable::default()),
        }
    }

    pub(crate) fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub(crate) fn play_area(&self) -> PlayArea {
        PlayArea::new(self.area.width, self.area.height)
    }

    pub(crate) fn tuning(&self) -> Result<DifficultyTuning, ConfigError> {
        Ok(DifficultyTuning {
            stage_duration: Duration::from_secs(self.stage_duration_secs),
            stage_table: self.stage_table()?,
            ..DifficultyTuning::default()
        })
    }
}
