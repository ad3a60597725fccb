#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system responsible for emitting enemy spawn commands.
//!
//! The system counts frames through [`Event::DifficultyEvaluated`], measures
//! simulated time through [`Event::TimeAdvanced`] and reacts to stage entry
//! through [`Event::StageStarted`]. It never touches the world directly: every
//! decision leaves as a [`Command::SpawnEnemy`].

use std::time::Duration;

use drone_siege_core::{Command, EnemyKind, Event, PlayArea, Stage};
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Frames per second the spawn cadence is expressed against.
pub const WAVE_SPAWN_RATE: f32 = 60.0;

const BOSS_SPAWN_HEIGHT: f32 = 100.0;
const BOSS_SUPPORT_CADENCE: u64 = 3;
const BOSS_DRONE_CHANCE: f32 = 0.8;
const TANK_THRESHOLD: f32 = 0.7;
const REROLL_THRESHOLD: f32 = 0.9;
const INTERVAL_TOLERANCE: f32 = 1e-3;

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
    max_enemies: usize,
    edge_margin: f32,
    boss_support_delay: Duration,
    wave_interval_frames: u64,
    wave_size: u32,
    wave_stagger: Duration,
}

impl Config {
    /// Creates a configuration with the standard cadence and the provided seed.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self {
            rng_seed,
            max_enemies: 20,
            edge_margin: 50.0,
            boss_support_delay: Duration::from_secs(10),
            wave_interval_frames: 3_000,
            wave_size: 5,
            wave_stagger: Duration::from_millis(500),
        }
    }

    /// Overrides the number of live enemies above which routine spawns stop.
    #[must_use]
    pub const fn with_max_enemies(mut self, max_enemies: usize) -> Self {
        self.max_enemies = max_enemies;
        self
    }

    /// Overrides the delay between the boss entering and its support drone.
    #[must_use]
    pub const fn with_boss_support_delay(mut self, delay: Duration) -> Self {
        self.boss_support_delay = delay;
        self
    }
}

/// Read-only view of the world needed to place spawns.
#[derive(Clone, Copy, Debug)]
pub struct SpawnView {
    /// Stage currently active.
    pub stage: Stage,
    /// Bounds that spawns are placed just outside of.
    pub area: PlayArea,
    /// Enemies alive before this batch, the boss included.
    pub enemy_count: usize,
    /// Whether a boss is already on the field.
    pub boss_alive: bool,
}

#[derive(Clone, Copy, Debug, Default)]
struct Burst {
    remaining: u32,
    accumulator: Duration,
}

/// Pure system that deterministically emits spawn commands.
#[derive(Debug)]
pub struct Spawning {
    config: Config,
    rng: ChaCha8Rng,
    frame_count: u64,
    wave: u32,
    boss_spawned: bool,
    support_countdown: Option<Duration>,
    burst: Burst,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            config,
            frame_count: 0,
            wave: 1,
            boss_spawned: false,
            support_countdown: None,
            burst: Burst::default(),
        }
    }

    /// Frames observed since the system was created.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Current wave number of the survival stages.
    #[must_use]
    pub fn wave(&self) -> u32 {
        self.wave
    }

    /// Reports whether the boss was emitted for the current stage.
    #[must_use]
    pub fn boss_spawned(&self) -> bool {
        self.boss_spawned
    }

    /// Spawns still queued from the current wave burst.
    #[must_use]
    pub fn pending_burst(&self) -> u32 {
        self.burst.remaining
    }

    /// Consumes events and the world view to emit spawn commands.
    pub fn handle(&mut self, events: &[Event], view: SpawnView, out: &mut Vec<Command>) {
        let mut live = view.enemy_count;

        for event in events {
            match event {
                Event::StageStarted { stage } => {
                    self.enter_stage(*stage, view, &mut live, out);
                }
                Event::TimeAdvanced { dt } => self.advance_timers(*dt, view, &mut live, out),
                Event::DifficultyEvaluated { descriptor } => {
                    self.advance_frame(descriptor.spawn_rate, view, &mut live, out);
                }
                _ => {}
            }
        }
    }

    fn enter_stage(
        &mut self,
        stage: Stage,
        view: SpawnView,
        live: &mut usize,
        out: &mut Vec<Command>,
    ) {
        self.wave = 1;
        self.burst = Burst::default();

        if stage.is_boss() && view.boss_alive {
            debug!("boss already on the field");
            self.boss_spawned = true;
            return;
        }
        self.boss_spawned = false;
        self.support_countdown = None;

        let view = SpawnView { stage, ..view };
        if stage.is_boss() {
            let position = Vec2::new(view.area.width / 2.0, BOSS_SPAWN_HEIGHT);
            debug!(x = position.x, y = position.y, "boss entering");
            out.push(Command::SpawnEnemy {
                kind: EnemyKind::Boss,
                position,
            });
            *live += 1;
            self.boss_spawned = true;
            self.support_countdown = Some(self.config.boss_support_delay);
        } else {
            self.queue_wave(view, live, out);
        }
    }

    fn advance_timers(
        &mut self,
        dt: Duration,
        view: SpawnView,
        live: &mut usize,
        out: &mut Vec<Command>,
    ) {
        if let Some(countdown) = self.support_countdown {
            let remaining = countdown.saturating_sub(dt);
            if remaining.is_zero() {
                self.support_countdown = None;
                self.spawn(Some(EnemyKind::Drone), view, live, out);
            } else {
                self.support_countdown = Some(remaining);
            }
        }

        if self.burst.remaining == 0 || self.config.wave_stagger.is_zero() {
            return;
        }
        self.burst.accumulator = self.burst.accumulator.saturating_add(dt);
        while self.burst.remaining > 0 && self.burst.accumulator >= self.config.wave_stagger {
            self.burst.accumulator -= self.config.wave_stagger;
            self.burst.remaining -= 1;
            self.spawn(None, view, live, out);
        }
    }

    fn advance_frame(
        &mut self,
        spawn_rate: f32,
        view: SpawnView,
        live: &mut usize,
        out: &mut Vec<Command>,
    ) {
        self.frame_count = self.frame_count.saturating_add(1);
        let interval = spawn_interval_frames(spawn_rate);

        if !view.stage.is_boss() {
            if self.frame_count % interval == 0 {
                self.spawn(None, view, live, out);
            }
            if self.frame_count % self.config.wave_interval_frames == 0 {
                self.wave = self.wave.saturating_add(1);
                debug!(wave = self.wave, "wave advanced");
                self.queue_wave(view, live, out);
            }
        } else if self.boss_spawned
            && self.frame_count % interval.saturating_mul(BOSS_SUPPORT_CADENCE) == 0
        {
            self.spawn(Some(EnemyKind::Drone), view, live, out);
        }
    }

    fn queue_wave(&mut self, view: SpawnView, live: &mut usize, out: &mut Vec<Command>) {
        if *live >= self.config.max_enemies {
            return;
        }
        let size = self.config.wave_size.saturating_mul(self.wave);
        if size == 0 {
            return;
        }

        // The head of the burst leaves immediately; the rest trickle out.
        self.burst.remaining = self.burst.remaining.saturating_add(size - 1);
        self.spawn(None, view, live, out);
    }

    fn spawn(
        &mut self,
        kind: Option<EnemyKind>,
        view: SpawnView,
        live: &mut usize,
        out: &mut Vec<Command>,
    ) {
        if *live >= self.config.max_enemies {
            return;
        }
        let kind = match kind {
            Some(kind) => kind,
            None => self.select_kind(view.stage),
        };
        let position = self.edge_position(view.area);
        out.push(Command::SpawnEnemy { kind, position });
        *live += 1;
    }

    fn select_kind(&mut self, stage: Stage) -> EnemyKind {
        let mut kind = EnemyKind::Drone;
        if stage.is_boss() {
            if self.rng.gen::<f32>() >= BOSS_DRONE_CHANCE {
                kind = EnemyKind::Tank;
            }
        } else if stage >= Stage::Combat && self.rng.gen::<f32>() > TANK_THRESHOLD {
            kind = EnemyKind::Tank;
        }

        if stage >= Stage::Advanced && self.rng.gen::<f32>() > REROLL_THRESHOLD {
            kind = if self.rng.gen::<bool>() {
                EnemyKind::Tank
            } else {
                EnemyKind::Drone
            };
        }
        kind
    }

    fn edge_position(&mut self, area: PlayArea) -> Vec2 {
        let margin = self.config.edge_margin;
        if self.rng.gen::<bool>() {
            let x = if self.rng.gen::<bool>() {
                -margin
            } else {
                area.width + margin
            };
            Vec2::new(x, self.rng.gen::<f32>() * area.height)
        } else {
            let y = if self.rng.gen::<bool>() {
                -margin
            } else {
                area.height + margin
            };
            Vec2::new(self.rng.gen::<f32>() * area.width, y)
        }
    }
}

/// Frames between routine spawns for a spawn rate, never less than one.
///
/// Quotients a hair below a whole frame count, such as `60 / 0.3` in single
/// precision, round up to it before flooring.
#[must_use]
pub fn spawn_interval_frames(spawn_rate: f32) -> u64 {
    let frames = (WAVE_SPAWN_RATE / spawn_rate + INTERVAL_TOLERANCE).floor();
    (frames as u64).max(1)
}
