#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Drone Siege simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values describing what
//! happened. Systems consume immutable snapshots such as
//! [`GameStateSnapshot`] and [`DifficultyDescriptor`] and never reach into
//! each other's state.

use std::{fmt, time::Duration};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Drone Siege.";

/// Lowest value any performance metric may take after clamping.
pub const PERFORMANCE_FLOOR: f32 = 0.3;

/// Highest value any performance metric may take after clamping.
pub const PERFORMANCE_CEILING: f32 = 2.0;

/// Highest AI level a descriptor can report.
pub const MAX_AI_LEVEL: u8 = 5;

/// One of the four sequential game phases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Stage {
    /// Slow, forgiving opening stage.
    Training,
    /// First stage where tanks and dodging appear.
    Combat,
    /// Stage that unlocks special enemy maneuvers.
    Advanced,
    /// Final boss encounter with fixed difficulty.
    Boss,
}

impl Stage {
    /// Every stage in play order.
    pub const ALL: [Stage; 4] = [Self::Training, Self::Combat, Self::Advanced, Self::Boss];

    /// One-based stage number used in formulas and presentation.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Training => 1,
            Self::Combat => 2,
            Self::Advanced => 3,
            Self::Boss => 4,
        }
    }

    /// Stage number as a float for use in scaling formulas.
    #[must_use]
    pub fn factor(self) -> f32 {
        self.number() as f32
    }

    /// Zero-based position of the stage inside [`Stage::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self.number() as usize - 1
    }

    /// Resolves a one-based stage number.
    #[must_use]
    pub const fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::Training),
            2 => Some(Self::Combat),
            3 => Some(Self::Advanced),
            4 => Some(Self::Boss),
            _ => None,
        }
    }

    /// Stage that follows this one, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    /// Human readable stage title.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Training => "Training Ground",
            Self::Combat => "Combat Zone",
            Self::Advanced => "Advanced Warfare",
            Self::Boss => "Final Boss",
        }
    }

    /// Reports whether the stage is the boss encounter.
    #[must_use]
    pub const fn is_boss(self) -> bool {
        matches!(self, Self::Boss)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stage {} ({})", self.number(), self.name())
    }
}

/// Raised when a stage number lies outside `1..=4`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("stage number {0} is outside 1..=4")]
pub struct StageOutOfRange(pub u8);

impl TryFrom<u8> for Stage {
    type Error = StageOutOfRange;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_number(value).ok_or(StageOutOfRange(value))
    }
}

impl From<Stage> for u8 {
    fn from(stage: Stage) -> Self {
        stage.number()
    }
}

/// Closed set of enemy archetypes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Fast, fragile chaser.
    Drone,
    /// Slow, durable flanker.
    Tank,
    /// Unique final encounter.
    Boss,
}

impl EnemyKind {
    /// Base attributes before any stage scaling.
    #[must_use]
    pub const fn stats(self) -> EnemyStats {
        match self {
            Self::Drone => EnemyStats {
                size: 15.0,
                speed: 2.0,
                health: 30.0,
                color: EnemyColor::from_rgb(0xff, 0x00, 0xff),
                score: 10,
            },
            Self::Tank => EnemyStats {
                size: 25.0,
                speed: 1.0,
                health: 100.0,
                color: EnemyColor::from_rgb(0xff, 0x33, 0x00),
                score: 30,
            },
            Self::Boss => EnemyStats {
                size: 50.0,
                speed: 0.5,
                health: 5_000.0,
                color: EnemyColor::from_rgb(0xff, 0x00, 0x00),
                score: 1_000,
            },
        }
    }

    /// Reports whether the archetype is the boss.
    #[must_use]
    pub const fn is_boss(self) -> bool {
        matches!(self, Self::Boss)
    }
}

/// Unscaled attributes of an [`EnemyKind`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyStats {
    /// Diameter in world units.
    pub size: f32,
    /// Movement speed in world units per millisecond before multipliers.
    pub speed: f32,
    /// Health before stage multipliers.
    pub health: f32,
    /// Base colour used to select the stage tier palette.
    pub color: EnemyColor,
    /// Points awarded for destroying the enemy.
    pub score: u32,
}

/// Visual appearance applied to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnemyColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl EnemyColor {
    /// Creates a new enemy color from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the color.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the color.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the color.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

impl fmt::Display for EnemyColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Cumulative player statistics collected by the game loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    /// Current score.
    pub score: u32,
    /// Shots fired since the game started.
    pub shots_fired: u32,
    /// Shots that connected with an enemy.
    pub hits: u32,
    /// Enemies destroyed.
    pub kills: u32,
    /// Total damage absorbed by the player.
    pub damage_taken: f32,
    /// Caller-estimated movement intensity; `None` means neutral.
    pub movement_factor: Option<f32>,
}

/// Game-state snapshot handed to the difficulty controller once per tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GameStateSnapshot {
    /// Time spent in the current stage.
    pub time_elapsed: Duration,
    /// Player statistics at the time of the snapshot.
    pub stats: PlayerStats,
}

impl GameStateSnapshot {
    /// Builds a snapshot from the stage clock and the current statistics.
    #[must_use]
    pub const fn new(time_elapsed: Duration, stats: PlayerStats) -> Self {
        Self {
            time_elapsed,
            stats,
        }
    }

    /// Elapsed stage time expressed in minutes.
    #[must_use]
    pub fn minutes_elapsed(&self) -> f32 {
        self.time_elapsed.as_secs_f32() / 60.0
    }
}

/// One rescaled, clamped observation of player performance.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSample {
    /// Shooting accuracy metric.
    pub accuracy: f32,
    /// Kills-per-minute metric.
    pub kill_rate: f32,
    /// Damage avoidance metric; higher means less damage taken.
    pub damage_taken: f32,
    /// Movement intensity metric.
    pub movement: f32,
}

impl PerformanceSample {
    /// Creates a sample, clamping every metric to
    /// [`PERFORMANCE_FLOOR`]..=[`PERFORMANCE_CEILING`].
    #[must_use]
    pub fn clamped(accuracy: f32, kill_rate: f32, damage_taken: f32, movement: f32) -> Self {
        Self {
            accuracy: clamp_metric(accuracy),
            kill_rate: clamp_metric(kill_rate),
            damage_taken: clamp_metric(damage_taken),
            movement: clamp_metric(movement),
        }
    }

    /// Unweighted mean of the four metrics.
    #[must_use]
    pub fn mean(&self) -> f32 {
        (self.accuracy + self.kill_rate + self.damage_taken + self.movement) / 4.0
    }
}

fn clamp_metric(value: f32) -> f32 {
    if value.is_nan() {
        return PERFORMANCE_FLOOR;
    }
    value.max(PERFORMANCE_FLOOR).min(PERFORMANCE_CEILING)
}

/// Designed difficulty band of a single stage.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageTarget {
    /// Starting difficulty before time, score and performance terms.
    pub base: f32,
    /// Lowest difficulty the stage may produce.
    pub min: f32,
    /// Highest difficulty the stage may produce.
    pub max: f32,
}

impl StageTarget {
    /// Creates a target band.
    #[must_use]
    pub const fn new(base: f32, min: f32, max: f32) -> Self {
        Self { base, min, max }
    }

    /// Clamps a difficulty into the band.
    #[must_use]
    pub fn clamp(&self, difficulty: f32) -> f32 {
        difficulty.min(self.max).max(self.min)
    }

    /// Reports whether the band is a single fixed value.
    #[must_use]
    pub fn is_fixed(&self) -> bool {
        self.min == self.base && self.base == self.max
    }
}

/// Enemy AI knobs derived from the current difficulty.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AiParams {
    /// Aggressiveness level in `0..=5`.
    pub level: u8,
    /// Probability of a flanking offset per movement computation.
    pub flank_chance: f32,
    /// Probability of bullet dodging per movement computation.
    pub dodge_chance: f32,
    /// Stage the parameters were computed for.
    pub stage: Stage,
}

/// Difficulty-affecting multipliers and probabilities for one tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DifficultyDescriptor {
    /// Dynamic difficulty after clamping to the stage band.
    pub base_difficulty: f32,
    /// Relative enemy spawn frequency.
    pub spawn_rate: f32,
    /// Multiplier applied to enemy displacement.
    pub enemy_speed_factor: f32,
    /// Multiplier applied to newly spawned enemy health.
    pub enemy_health_factor: f32,
    /// Steering parameters for enemy agents.
    pub ai: AiParams,
}

/// Weapons that can be unlocked by completing stages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weapon {
    /// Default sidearm.
    PulsePistol,
    /// Wide spread, short range.
    Shotgun,
    /// Long range precision rifle.
    Sniper,
}

impl Weapon {
    /// Display name of the weapon.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PulsePistol => "Pulse Pistol",
            Self::Shotgun => "Shotgun",
            Self::Sniper => "Sniper",
        }
    }
}

/// Reward granted when a stage is completed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StageReward {
    /// Weapons available after the stage.
    pub weapons: Vec<Weapon>,
    /// Notification text shown to the player.
    pub message: &'static str,
}

/// Projectile position consumed by dodge steering.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bullet {
    /// Current position in world units.
    pub position: Vec2,
}

impl Bullet {
    /// Creates a bullet at the provided coordinates.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
        }
    }
}

/// Rectangular play area anchored at the origin.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayArea {
    /// Horizontal extent in world units.
    pub width: f32,
    /// Vertical extent in world units.
    pub height: f32,
}

impl PlayArea {
    /// Creates a play area with the provided extents.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Centre point of the area.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Clamps a position so that a body with the provided margin stays inside.
    ///
    /// When the margin exceeds half of an extent the lower bound wins, so the
    /// result is always defined.
    #[must_use]
    pub fn clamp(&self, position: Vec2, margin: f32) -> Vec2 {
        Vec2::new(
            position.x.min(self.width - margin).max(margin),
            position.y.min(self.height - margin).max(margin),
        )
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Switches the simulation to a stage and restarts the stage clock.
    SetStage {
        /// Stage to activate.
        stage: Stage,
    },
    /// Advances the simulation by one frame.
    Tick {
        /// Simulated time covered by the frame.
        dt: Duration,
        /// Player position for steering.
        player: Vec2,
        /// Bullets currently in flight.
        bullets: Vec<Bullet>,
        /// Cumulative player statistics.
        stats: PlayerStats,
    },
    /// Spawns an enemy at an explicit position.
    SpawnEnemy {
        /// Archetype to spawn.
        kind: EnemyKind,
        /// Spawn position.
        position: Vec2,
    },
    /// Applies damage reported by the collision layer.
    DamageEnemy {
        /// Enemy that was hit.
        enemy: EnemyId,
        /// Damage dealt.
        amount: f32,
    },
    /// Removes an enemy without destroying it.
    RemoveEnemy {
        /// Enemy to remove.
        enemy: EnemyId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Simulated time advanced by a tick.
    TimeAdvanced {
        /// Duration covered by the tick.
        dt: Duration,
    },
    /// A stage became active.
    StageStarted {
        /// Stage that started.
        stage: Stage,
    },
    /// The difficulty controller produced a descriptor for the tick.
    DifficultyEvaluated {
        /// Descriptor consumed by spawning and enemies.
        descriptor: DifficultyDescriptor,
    },
    /// An enemy entered the world.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Archetype of the enemy.
        kind: EnemyKind,
        /// Spawn position.
        position: Vec2,
    },
    /// An enemy took damage and survived.
    EnemyDamaged {
        /// Enemy that was hit.
        enemy: EnemyId,
        /// Remaining health.
        health: f32,
    },
    /// An enemy's health reached zero.
    EnemyDestroyed {
        /// Enemy that was destroyed.
        enemy: EnemyId,
        /// Archetype of the destroyed enemy.
        kind: EnemyKind,
    },
    /// An enemy was removed by the owning collection.
    EnemyRemoved {
        /// Enemy that was removed.
        enemy: EnemyId,
    },
    /// The active stage met its completion condition.
    StageCompleted {
        /// Stage that was completed.
        stage: Stage,
        /// Reward unlocked by the completion.
        reward: StageReward,
    },
}
