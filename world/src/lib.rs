#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Drone Siege.
//!
//! The world owns the difficulty controller, the spawner and every live enemy
//! agent. Adapters drive it exclusively through [`apply`] and read it back
//! through the [`query`] module.

use std::collections::BTreeMap;

use drone_siege_core::{
    Command, DifficultyDescriptor, EnemyId, EnemyKind, Event, GameStateSnapshot, PlayArea, Stage,
    WELCOME_BANNER,
};
use drone_siege_system_difficulty::{stage_reward, DifficultyController, DifficultyTuning};
use drone_siege_system_enemy_ai::{EnemyAgent, TickContext};
use drone_siege_system_spawning::{self as spawning, SpawnView, Spawning};
use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

const DEFAULT_SEED: u64 = 0x42f0_e1eb_d4a5_3c21;
const SPAWNER_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;
const DEFAULT_AREA: PlayArea = PlayArea::new(1_280.0, 720.0);

/// Parameters required to construct a world.
#[derive(Clone, Debug)]
pub struct Config {
    seed: u64,
    area: PlayArea,
    tuning: DifficultyTuning,
    carry_over_enemies: bool,
}

impl Config {
    /// Creates a configuration with the provided seed and play area.
    ///
    /// Stage changes clear the field unless carry-over is enabled.
    #[must_use]
    pub fn new(seed: u64, area: PlayArea) -> Self {
        Self {
            seed,
            area,
            tuning: DifficultyTuning::default(),
            carry_over_enemies: false,
        }
    }

    /// Replaces the difficulty tuning.
    #[must_use]
    pub fn with_tuning(mut self, tuning: DifficultyTuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// Keeps live enemies across stage changes, upgrading them to the new
    /// stage instead of removing them.
    #[must_use]
    pub fn with_carry_over_enemies(mut self, carry_over: bool) -> Self {
        self.carry_over_enemies = carry_over;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_SEED, DEFAULT_AREA)
    }
}

/// Represents the authoritative Drone Siege world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    area: PlayArea,
    carry_over_enemies: bool,
    difficulty: DifficultyController,
    spawning: Spawning,
    enemies: BTreeMap<EnemyId, EnemyAgent>,
    next_enemy_id: u32,
    rng: ChaCha8Rng,
    descriptor: Option<DifficultyDescriptor>,
    tick_index: u64,
    stage_completed: bool,
}

impl World {
    /// Creates a world in the training stage with no enemies.
    ///
    /// Submit [`Command::SetStage`] to start the opening stage; until then
    /// the spawner has not been told a stage began.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let spawner_seed = config.seed ^ SPAWNER_SEED_SALT;
        Self {
            banner: WELCOME_BANNER,
            area: config.area,
            carry_over_enemies: config.carry_over_enemies,
            difficulty: DifficultyController::new(config.tuning),
            spawning: Spawning::new(spawning::Config::new(spawner_seed)),
            enemies: BTreeMap::new(),
            next_enemy_id: 0,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            descriptor: None,
            tick_index: 0,
            stage_completed: false,
        }
    }

    fn spawn_enemy(&mut self, kind: EnemyKind, position: Vec2, out_events: &mut Vec<Event>) {
        let enemy = EnemyId::new(self.next_enemy_id);
        self.next_enemy_id = self.next_enemy_id.wrapping_add(1);

        let agent = EnemyAgent::spawn(kind, self.difficulty.stage(), position);
        let _ = self.enemies.insert(enemy, agent);
        out_events.push(Event::EnemySpawned {
            enemy,
            kind,
            position,
        });
    }

    fn run_spawning(&mut self, events: &[Event], out_events: &mut Vec<Event>) {
        let view = SpawnView {
            stage: self.difficulty.stage(),
            area: self.area,
            enemy_count: self.enemies.len(),
            boss_alive: self.boss_alive(),
        };
        let mut commands = Vec::new();
        self.spawning.handle(events, view, &mut commands);

        for command in commands {
            if let Command::SpawnEnemy { kind, position } = command {
                self.spawn_enemy(kind, position, out_events);
            }
        }
    }

    fn prepare_field(&mut self, stage: Stage, out_events: &mut Vec<Event>) {
        if self.carry_over_enemies {
            for agent in self.enemies.values_mut() {
                agent.upgrade_to_stage(stage);
            }
            return;
        }

        let cleared = std::mem::take(&mut self.enemies);
        if !cleared.is_empty() {
            debug!(%stage, count = cleared.len(), "field cleared for stage");
        }
        out_events.extend(cleared.into_keys().map(|enemy| Event::EnemyRemoved { enemy }));
    }

    fn boss_alive(&self) -> bool {
        self.enemies.values().any(|agent| agent.kind().is_boss())
    }

    fn check_stage_completion(&mut self, out_events: &mut Vec<Event>) {
        if self.stage_completed {
            return;
        }

        let stage = self.difficulty.stage();
        let completed = if stage.is_boss() {
            self.spawning.boss_spawned() && !self.boss_alive()
        } else {
            self.difficulty.is_stage_complete()
        };

        if completed {
            self.stage_completed = true;
            info!(%stage, "stage completed");
            out_events.push(Event::StageCompleted {
                stage,
                reward: stage_reward(stage),
            });
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::SetStage { stage } => {
            world.difficulty.set_stage(stage);
            world.stage_completed = false;
            world.prepare_field(stage, out_events);

            let started = Event::StageStarted { stage };
            out_events.push(started.clone());
            world.run_spawning(&[started], out_events);
        }
        Command::Tick {
            dt,
            player,
            bullets,
            stats,
        } => {
            world.tick_index = world.tick_index.saturating_add(1);
            world.difficulty.advance_clock(dt);

            let snapshot = GameStateSnapshot::new(world.difficulty.stage_elapsed(), stats);
            let descriptor = world.difficulty.evaluate(&snapshot);
            world.descriptor = Some(descriptor);

            let tick_events = [
                Event::TimeAdvanced { dt },
                Event::DifficultyEvaluated { descriptor },
            ];
            out_events.extend(tick_events.iter().cloned());
            world.run_spawning(&tick_events, out_events);

            let ctx = TickContext {
                dt,
                player,
                bullets: &bullets,
                descriptor: &descriptor,
                area: world.area,
            };
            for agent in world.enemies.values_mut() {
                agent.update(&ctx, &mut world.rng);
            }

            world.check_stage_completion(out_events);
        }
        Command::SpawnEnemy { kind, position } => {
            world.spawn_enemy(kind, position, out_events);
        }
        Command::DamageEnemy { enemy, amount } => {
            let Some(agent) = world.enemies.get_mut(&enemy) else {
                return;
            };
            if agent.apply_damage(amount) {
                let kind = agent.kind();
                let _ = world.enemies.remove(&enemy);
                debug!(enemy = enemy.get(), ?kind, "enemy destroyed");
                out_events.push(Event::EnemyDestroyed { enemy, kind });
            } else {
                out_events.push(Event::EnemyDamaged {
                    enemy,
                    health: agent.health(),
                });
            }
        }
        Command::RemoveEnemy { enemy } => {
            if world.enemies.remove(&enemy).is_some() {
                out_events.push(Event::EnemyRemoved { enemy });
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::World;
    use drone_siege_core::{DifficultyDescriptor, EnemyColor, EnemyId, EnemyKind, PlayArea, Stage};
    use drone_siege_system_enemy_ai::EnemyPhase;
    use glam::Vec2;

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Stage currently active.
    #[must_use]
    pub fn stage(world: &World) -> Stage {
        world.difficulty.stage()
    }

    /// Bounds enemies are confined to.
    #[must_use]
    pub fn play_area(world: &World) -> PlayArea {
        world.area
    }

    /// Descriptor produced by the most recent tick, if any tick ran.
    #[must_use]
    pub fn descriptor(world: &World) -> Option<DifficultyDescriptor> {
        world.descriptor
    }

    /// Difficulty as a whole percentage for display.
    #[must_use]
    pub fn difficulty_percentage(world: &World) -> u32 {
        world.difficulty.difficulty_percentage()
    }

    /// Simulated time spent in the current stage.
    #[must_use]
    pub fn stage_elapsed(world: &World) -> Duration {
        world.difficulty.stage_elapsed()
    }

    /// Fraction of the stage clock consumed, capped at one.
    #[must_use]
    pub fn stage_progress(world: &World) -> f32 {
        world.difficulty.stage_progress()
    }

    /// Reports whether the current stage already emitted its completion.
    #[must_use]
    pub fn stage_completed(world: &World) -> bool {
        world.stage_completed
    }

    /// Current survival wave.
    #[must_use]
    pub fn wave(world: &World) -> u32 {
        world.spawning.wave()
    }

    /// Number of ticks processed.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Number of live enemies, the boss included.
    #[must_use]
    pub fn enemy_count(world: &World) -> usize {
        world.enemies.len()
    }

    /// Reports whether the boss is on the field.
    #[must_use]
    pub fn boss_alive(world: &World) -> bool {
        world.boss_alive()
    }

    /// Captures a read-only view of the live enemies.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        let snapshots = world
            .enemies
            .iter()
            .map(|(id, agent)| EnemySnapshot {
                id: *id,
                kind: agent.kind(),
                stage: agent.stage(),
                position: agent.position(),
                heading: agent.current_move(),
                health: agent.health(),
                max_health: agent.max_health(),
                color: agent.color(),
                phase: agent.phase(),
            })
            .collect();
        EnemyView { snapshots }
    }

    /// Read-only snapshot describing all live enemies.
    #[derive(Clone, Debug)]
    pub struct EnemyView {
        snapshots: Vec<EnemySnapshot>,
    }

    impl EnemyView {
        /// Iterator over the captured snapshots in identifier order.
        pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
            self.snapshots.iter()
        }

        /// Consumes the view, yielding the underlying snapshots.
        pub fn into_vec(self) -> Vec<EnemySnapshot> {
            self.snapshots
        }
    }

    /// Immutable representation of a single enemy used for queries.
    #[derive(Clone, Debug, PartialEq)]
    pub struct EnemySnapshot {
        /// Identifier assigned on spawn.
        pub id: EnemyId,
        /// Archetype.
        pub kind: EnemyKind,
        /// Stage the enemy's attributes are scaled for.
        pub stage: Stage,
        /// Current position.
        pub position: Vec2,
        /// Smoothed heading.
        pub heading: Vec2,
        /// Remaining health.
        pub health: f32,
        /// Health at full strength.
        pub max_health: f32,
        /// Stage tier colour.
        pub color: EnemyColor,
        /// Lifecycle phase.
        pub phase: EnemyPhase,
    }
}
