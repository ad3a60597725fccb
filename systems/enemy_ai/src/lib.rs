#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-enemy steering and stage scaling.
//!
//! Each [`EnemyAgent`] owns its position, heading and cooldowns. Once per tick
//! the agent reads the shared [`DifficultyDescriptor`] through a
//! [`TickContext`], computes a unit steering vector, blends it into its
//! current heading and moves. Randomness is always supplied by the caller so
//! that a seeded generator replays the same behaviour.

mod steering;

use std::time::Duration;

use drone_siege_core::{
    AiParams, Bullet, DifficultyDescriptor, EnemyColor, EnemyKind, PlayArea, Stage,
};
use glam::Vec2;
use rand::Rng;
use tracing::debug;

pub use steering::{dodge_push, smoothing_factor};

// Flat reductions applied to every stage.
const STAGE_HEALTH_MULTIPLIER: f32 = 0.1;
const STAGE_SPEED_MULTIPLIER: f32 = 0.1;

const DASH_CHANCE_PER_STAGE: f32 = 0.001;
const DASH_MIN_DISTANCE: f32 = 100.0;
const DASH_BURST: f32 = 3.0;
const DASH_COOLDOWN_MS: f32 = 2_000.0;
const EVADE_CHANCE: f32 = 0.005;

const DRONE_TIERS: [EnemyColor; 4] = [
    EnemyColor::from_rgb(0xcc, 0x00, 0xcc),
    EnemyColor::from_rgb(0xff, 0x00, 0xff),
    EnemyColor::from_rgb(0xff, 0x33, 0xcc),
    EnemyColor::from_rgb(0xff, 0x66, 0xcc),
];
const TANK_TIERS: [EnemyColor; 4] = [
    EnemyColor::from_rgb(0xcc, 0x22, 0x00),
    EnemyColor::from_rgb(0xff, 0x33, 0x00),
    EnemyColor::from_rgb(0xff, 0x66, 0x33),
    EnemyColor::from_rgb(0xff, 0x99, 0x66),
];
const BOSS_TIERS: [EnemyColor; 1] = [EnemyColor::from_rgb(0xff, 0x00, 0x00)];

/// Read-only inputs shared by every agent during one tick.
#[derive(Clone, Copy, Debug)]
pub struct TickContext<'a> {
    /// Simulated time covered by the tick.
    pub dt: Duration,
    /// Player position.
    pub player: Vec2,
    /// Bullets in flight.
    pub bullets: &'a [Bullet],
    /// Descriptor produced by the difficulty controller for this tick.
    pub descriptor: &'a DifficultyDescriptor,
    /// Bounds the agent must stay within.
    pub area: PlayArea,
}

/// Lifecycle phase of an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnemyPhase {
    /// Created but not yet updated.
    Spawned,
    /// Moving and taking hits.
    Active,
    /// Health reached zero.
    Destroyed,
}

/// Behavioural unit driving a single enemy.
#[derive(Clone, Debug, PartialEq)]
pub struct EnemyAgent {
    kind: EnemyKind,
    stage: Stage,
    position: Vec2,
    health: f32,
    max_health: f32,
    speed: f32,
    color: EnemyColor,
    current_move: Vec2,
    attack_cooldown: f32,
    direction_change_cooldown: f32,
    has_special_ability: bool,
    phase: EnemyPhase,
}

impl EnemyAgent {
    /// Creates an agent with stats scaled for the provided stage.
    ///
    /// The boss always uses its fixed base health.
    #[must_use]
    pub fn spawn(kind: EnemyKind, stage: Stage, position: Vec2) -> Self {
        let stats = kind.stats();
        let max_health = if kind.is_boss() {
            stats.health
        } else {
            stats.health * health_multiplier(stage)
        };

        Self {
            kind,
            stage,
            position,
            health: max_health,
            max_health,
            speed: stats.speed * speed_multiplier(stage),
            color: stage_color(kind, stage),
            current_move: Vec2::ZERO,
            attack_cooldown: 0.0,
            direction_change_cooldown: direction_change_cooldown(stage),
            has_special_ability: stage >= Stage::Advanced,
            phase: EnemyPhase::Spawned,
        }
    }

    /// Archetype of the agent.
    #[must_use]
    pub fn kind(&self) -> EnemyKind {
        self.kind
    }

    /// Stage snapshot the agent's attributes are scaled for.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Current position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Remaining health.
    #[must_use]
    pub fn health(&self) -> f32 {
        self.health
    }

    /// Health at full strength.
    #[must_use]
    pub fn max_health(&self) -> f32 {
        self.max_health
    }

    /// Remaining health as a fraction of the maximum.
    #[must_use]
    pub fn health_ratio(&self) -> f32 {
        if self.max_health > 0.0 {
            self.health / self.max_health
        } else {
            0.0
        }
    }

    /// Movement speed in world units per millisecond.
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Stage tier colour.
    #[must_use]
    pub fn color(&self) -> EnemyColor {
        self.color
    }

    /// Smoothed heading.
    #[must_use]
    pub fn current_move(&self) -> Vec2 {
        self.current_move
    }

    /// Milliseconds until the next dash is allowed.
    #[must_use]
    pub fn attack_cooldown(&self) -> f32 {
        self.attack_cooldown
    }

    /// Milliseconds between heading re-evaluations for this stage.
    #[must_use]
    pub fn direction_change_cooldown(&self) -> f32 {
        self.direction_change_cooldown
    }

    /// Reports whether stage-gated maneuvers are unlocked.
    #[must_use]
    pub fn has_special_ability(&self) -> bool {
        self.has_special_ability
    }

    /// Lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> EnemyPhase {
        self.phase
    }

    /// Reports whether health reached zero.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.phase == EnemyPhase::Destroyed
    }

    /// Subtracts damage and reports whether the agent was destroyed.
    pub fn apply_damage(&mut self, amount: f32) -> bool {
        if self.is_destroyed() {
            return true;
        }
        self.health -= amount;
        if self.health <= 0.0 {
            self.phase = EnemyPhase::Destroyed;
        }
        self.is_destroyed()
    }

    /// Unit (or zero) steering vector toward the player.
    ///
    /// Tanks, the boss, and any agent at AI level 3 or above may add a
    /// sideways flanking offset; from AI level 2 agents may also push away
    /// from nearby bullets. Neither happens in the training stage.
    pub fn compute_movement<R>(
        &self,
        player: Vec2,
        bullets: &[Bullet],
        ai: &AiParams,
        rng: &mut R,
    ) -> Vec2
    where
        R: Rng + ?Sized,
    {
        let heading = (player - self.position).normalize_or_zero();
        let mut desired = heading;
        let past_training = ai.stage > Stage::Training;

        let flanker = matches!(self.kind, EnemyKind::Tank | EnemyKind::Boss) || ai.level >= 3;
        if flanker && past_training && rng.gen::<f32>() < ai.flank_chance {
            desired += steering::flank_offset(heading, rng);
        }

        if past_training
            && ai.level >= 2
            && !bullets.is_empty()
            && rng.gen::<f32>() < ai.dodge_chance
        {
            desired += dodge_push(self.position, bullets, ai.stage);
        }

        desired.normalize_or_zero()
    }

    /// Advances the agent by one tick.
    ///
    /// Blends the fresh steering vector into the heading, moves, runs the
    /// special maneuvers, decays the dash cooldown and clamps the position to
    /// the play area.
    pub fn update<R>(&mut self, ctx: &TickContext<'_>, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        if self.is_destroyed() {
            return;
        }
        self.phase = EnemyPhase::Active;

        let steering = self.compute_movement(ctx.player, ctx.bullets, &ctx.descriptor.ai, rng);
        let smoothing = smoothing_factor(self.stage);
        self.current_move =
            (self.current_move * (1.0 - smoothing) + steering * smoothing).normalize_or_zero();

        let dt = ctx.dt.as_secs_f32() * 1_000.0;
        self.position +=
            self.current_move * self.speed * dt * ctx.descriptor.enemy_speed_factor;

        if self.has_special_ability && self.stage > Stage::Training {
            self.perform_maneuvers(ctx.player, rng);
        }

        if self.attack_cooldown > 0.0 {
            self.attack_cooldown -= dt;
        }

        self.position = ctx.area.clamp(self.position, self.kind.stats().size / 2.0);
    }

    fn perform_maneuvers<R>(&mut self, player: Vec2, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        if self.stage >= Stage::Advanced
            && self.attack_cooldown <= 0.0
            && rng.gen::<f32>() < DASH_CHANCE_PER_STAGE * self.stage.factor()
        {
            let offset = player - self.position;
            let distance = offset.length();
            if distance > DASH_MIN_DISTANCE {
                self.current_move = offset / distance * DASH_BURST;
                self.attack_cooldown = DASH_COOLDOWN_MS;
            }
        }

        if self.stage >= Stage::Boss && rng.gen::<f32>() < EVADE_CHANCE {
            self.current_move = Vec2::new(rng.gen_range(-1.0..=1.0), rng.gen_range(-1.0..=1.0));
        }
    }

    /// Rescales the agent for a new stage without changing its health ratio.
    ///
    /// The boss keeps its fixed stats.
    pub fn upgrade_to_stage(&mut self, stage: Stage) {
        if self.kind.is_boss() {
            return;
        }

        let ratio = self.health_ratio();
        let stats = self.kind.stats();
        debug!(kind = ?self.kind, from = %self.stage, to = %stage, "enemy upgraded");

        self.stage = stage;
        self.max_health = stats.health * health_multiplier(stage);
        self.health = self.max_health * ratio;
        self.speed = stats.speed * speed_multiplier(stage);
        self.color = stage_color(self.kind, stage);
        self.direction_change_cooldown = direction_change_cooldown(stage);
        self.has_special_ability = stage >= Stage::Advanced;
    }
}

/// Stage health multiplier applied to non-boss base health.
#[must_use]
pub fn health_multiplier(_stage: Stage) -> f32 {
    STAGE_HEALTH_MULTIPLIER
}

/// Stage speed multiplier applied to base speed.
#[must_use]
pub fn speed_multiplier(_stage: Stage) -> f32 {
    STAGE_SPEED_MULTIPLIER
}

/// Tier colour of an archetype at a stage.
#[must_use]
pub fn stage_color(kind: EnemyKind, stage: Stage) -> EnemyColor {
    let tiers: &[EnemyColor] = match kind {
        EnemyKind::Drone => &DRONE_TIERS,
        EnemyKind::Tank => &TANK_TIERS,
        EnemyKind::Boss => &BOSS_TIERS,
    };
    tiers[stage.index().min(tiers.len() - 1)]
}

fn direction_change_cooldown(stage: Stage) -> f32 {
    1_000.0 - stage.factor() * 150.0
}
