#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Adaptive difficulty controller.
//!
//! The controller ingests one [`GameStateSnapshot`] per tick, turns it into a
//! clamped [`PerformanceSample`], keeps a bounded recency-weighted history of
//! those samples and derives a [`DifficultyDescriptor`] whose base difficulty
//! never leaves the band designed for the active stage.

mod tuning;

use std::{collections::VecDeque, time::Duration};

use drone_siege_core::{
    AiParams, DifficultyDescriptor, GameStateSnapshot, PerformanceSample, Stage, StageReward,
    Weapon, MAX_AI_LEVEL,
};
use tracing::{debug, trace};

pub use tuning::{DifficultyTuning, StageTable, StageTableError};

const NEUTRAL_ACCURACY: f32 = 0.7;
const NEUTRAL_METRIC: f32 = 1.0;
const RATE_WINDOW: Duration = Duration::from_secs(60);
const MAX_PREALLOCATED_SAMPLES: usize = 64;

/// Owns rolling performance telemetry and converts snapshots into descriptors.
#[derive(Debug)]
pub struct DifficultyController {
    tuning: DifficultyTuning,
    history: VecDeque<PerformanceSample>,
    stage: Stage,
    stage_elapsed: Duration,
    base_difficulty: f32,
}

impl Default for DifficultyController {
    fn default() -> Self {
        Self::new(DifficultyTuning::default())
    }
}

impl DifficultyController {
    /// Creates a controller positioned at the start of the training stage.
    #[must_use]
    pub fn new(tuning: DifficultyTuning) -> Self {
        let capacity = tuning.history_capacity;
        let base_difficulty = tuning.stage_table.target(Stage::Training).base;
        Self {
            tuning,
            history: VecDeque::with_capacity(
                capacity.saturating_add(1).min(MAX_PREALLOCATED_SAMPLES),
            ),
            stage: Stage::Training,
            stage_elapsed: Duration::ZERO,
            base_difficulty,
        }
    }

    /// Tuning surface the controller was built with.
    #[must_use]
    pub fn tuning(&self) -> &DifficultyTuning {
        &self.tuning
    }

    /// Stage the controller is currently tuning for.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Activates a stage and restarts the stage clock.
    pub fn set_stage(&mut self, stage: Stage) {
        debug!(%stage, "difficulty stage changed");
        self.stage = stage;
        self.stage_elapsed = Duration::ZERO;
    }

    /// Advances the stage clock by simulated time.
    pub fn advance_clock(&mut self, dt: Duration) {
        self.stage_elapsed = self.stage_elapsed.saturating_add(dt);
    }

    /// Simulated time spent in the current stage.
    #[must_use]
    pub fn stage_elapsed(&self) -> Duration {
        self.stage_elapsed
    }

    /// Fraction of the survival timer consumed, capped at one.
    #[must_use]
    pub fn stage_progress(&self) -> f32 {
        let duration = self.tuning.stage_duration;
        if duration.is_zero() {
            return 1.0;
        }
        (self.stage_elapsed.as_secs_f32() / duration.as_secs_f32()).min(1.0)
    }

    /// Reports whether the survival timer ran out.
    ///
    /// The boss stage never completes on time; it ends with the boss kill.
    #[must_use]
    pub fn is_stage_complete(&self) -> bool {
        if self.stage.is_boss() {
            return false;
        }
        self.stage_elapsed >= self.tuning.stage_duration
    }

    /// Most recent stage base difficulty, before performance adjustment.
    #[must_use]
    pub fn base_difficulty(&self) -> f32 {
        self.base_difficulty
    }

    /// Retained performance samples, oldest first.
    pub fn history(&self) -> impl ExactSizeIterator<Item = &PerformanceSample> {
        self.history.iter()
    }

    /// Appends a sample, evicting the oldest ones beyond capacity.
    pub fn record_sample(&mut self, sample: PerformanceSample) {
        self.history.push_back(sample);
        while self.history.len() > self.tuning.history_capacity {
            let _ = self.history.pop_front();
        }
    }

    /// Converts a game-state snapshot into a descriptor for this tick.
    ///
    /// Records one performance sample as a side effect.
    pub fn evaluate(&mut self, state: &GameStateSnapshot) -> DifficultyDescriptor {
        self.record_sample(performance_sample(state));

        let stage = self.stage;
        let target = self.tuning.stage_table.target(stage);
        self.base_difficulty = match stage {
            Stage::Training | Stage::Boss => target.base,
            Stage::Combat | Stage::Advanced => {
                let time_factor = (state.minutes_elapsed() + 1.0).log10();
                let score_factor = state.stats.score as f32 / 5_000.0;
                target.base + time_factor * 0.03 + score_factor * 0.005
            }
        };

        let adjustment = self.performance_adjustment();
        let difficulty = target.clamp(self.base_difficulty * adjustment);
        trace!(%stage, difficulty, adjustment, "difficulty evaluated");

        DifficultyDescriptor {
            base_difficulty: difficulty,
            spawn_rate: spawn_rate(stage, difficulty),
            enemy_speed_factor: enemy_speed_factor(stage, difficulty),
            enemy_health_factor: enemy_health_factor(stage, difficulty),
            ai: AiParams {
                level: ai_level(stage, difficulty),
                flank_chance: flank_chance(stage, difficulty),
                dodge_chance: dodge_chance(stage, difficulty),
                stage,
            },
        }
    }

    /// Recency-weighted mean of the history, `None` while it is empty.
    ///
    /// The i-th oldest of N samples carries weight `(i + 1) / N`.
    #[must_use]
    pub fn performance_score(&self) -> Option<f32> {
        if self.history.is_empty() {
            return None;
        }

        let count = self.history.len() as f32;
        let mut total_weight = 0.0;
        let mut weighted = 0.0;
        for (index, sample) in self.history.iter().enumerate() {
            let weight = (index + 1) as f32 / count;
            total_weight += weight;
            weighted += sample.mean() * weight;
        }
        Some(weighted / total_weight)
    }

    /// Multiplier applied to the stage base difficulty.
    #[must_use]
    pub fn performance_adjustment(&self) -> f32 {
        if self.stage.is_boss() || self.history.len() < self.tuning.warmup_samples {
            return 1.0;
        }
        let Some(score) = self.performance_score() else {
            return 1.0;
        };

        match self.stage {
            Stage::Training | Stage::Combat => (0.9 + (score - 0.7) * 1.5).min(1.1).max(0.9),
            Stage::Advanced => score.min(1.2).max(0.8),
            Stage::Boss => 1.0,
        }
    }

    /// Difficulty shown to the player, in percent.
    #[must_use]
    pub fn difficulty_percentage(&self) -> u32 {
        if self.stage.is_boss() {
            return 100;
        }
        let target = self.tuning.stage_table.target(self.stage);
        let clamped = target.clamp(self.base_difficulty * self.performance_adjustment());
        (clamped * 100.0).round() as u32
    }
}

/// Weapons and message unlocked by completing a stage.
#[must_use]
pub fn stage_reward(stage: Stage) -> StageReward {
    match stage {
        Stage::Training => StageReward {
            weapons: vec![Weapon::PulsePistol],
            message: "Training Ground: Basic pistol unlocked",
        },
        Stage::Combat => StageReward {
            weapons: vec![Weapon::PulsePistol, Weapon::Shotgun],
            message: "Stage 2 Complete: Shotgun unlocked!",
        },
        Stage::Advanced => StageReward {
            weapons: vec![Weapon::PulsePistol, Weapon::Shotgun, Weapon::Sniper],
            message: "Stage 3 Complete: Sniper unlocked!",
        },
        Stage::Boss => StageReward {
            weapons: vec![Weapon::PulsePistol, Weapon::Shotgun, Weapon::Sniper],
            message: "FINAL BOSS DEFEATED!",
        },
    }
}

/// Derives the rescaled, clamped performance sample of a snapshot.
#[must_use]
pub fn performance_sample(state: &GameStateSnapshot) -> PerformanceSample {
    let stats = &state.stats;
    let accuracy = if stats.shots_fired > 0 {
        (stats.hits as f32 / stats.shots_fired as f32).min(1.0)
    } else {
        NEUTRAL_ACCURACY
    };

    let (kill_rate, damage_taken) = if state.time_elapsed > RATE_WINDOW {
        let minutes = state.minutes_elapsed();
        let kill_rate = (stats.kills as f32 / minutes).min(2.0);
        let damage_taken = (2.0 - stats.damage_taken / minutes * 0.5).min(2.0);
        (kill_rate, damage_taken)
    } else {
        (NEUTRAL_METRIC, NEUTRAL_METRIC)
    };

    let movement = stats.movement_factor.unwrap_or(NEUTRAL_METRIC);
    PerformanceSample::clamped(accuracy * 3.0, kill_rate * 0.8, damage_taken, movement)
}

fn spawn_rate(stage: Stage, difficulty: f32) -> f32 {
    match stage {
        Stage::Training => (2.0 - difficulty * 4.0).max(1.6),
        Stage::Combat | Stage::Advanced => (1.2 - difficulty * 1.5).max(0.3),
        Stage::Boss => 3.0,
    }
}

fn enemy_speed_factor(stage: Stage, difficulty: f32) -> f32 {
    match stage {
        Stage::Training => (0.3 + difficulty * 5.0).min(0.8),
        Stage::Combat | Stage::Advanced | Stage::Boss => (0.8 + difficulty * 1.5).min(2.0),
    }
}

fn enemy_health_factor(stage: Stage, difficulty: f32) -> f32 {
    match stage {
        Stage::Training => (0.8 + difficulty * 1.5).min(1.2),
        Stage::Combat | Stage::Advanced => (1.0 + difficulty).min(2.0),
        Stage::Boss => 1.0,
    }
}

fn ai_level(stage: Stage, difficulty: f32) -> u8 {
    let scaled = match stage {
        Stage::Training => difficulty * 2.0,
        Stage::Combat | Stage::Advanced => difficulty,
        Stage::Boss => return MAX_AI_LEVEL,
    };
    (scaled.floor().max(0.0) as u8).min(MAX_AI_LEVEL)
}

fn flank_chance(stage: Stage, difficulty: f32) -> f32 {
    match stage {
        Stage::Training => (difficulty * 0.3).min(0.1),
        _ => (difficulty * 0.1 * stage.factor()).min(0.5),
    }
}

fn dodge_chance(stage: Stage, difficulty: f32) -> f32 {
    match stage {
        Stage::Training => 0.0,
        _ => (difficulty * 0.15 * stage.factor()).min(0.6),
    }
}
