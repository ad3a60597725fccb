use std::{fmt, time::Duration};

use drone_siege_core::{Bullet, Command, Event, PlayerStats, Stage};
use drone_siege_system_difficulty::DifficultyTuning;
use drone_siege_world::{self as world, query, World};
use glam::Vec2;
use tracing::info;

use crate::config::{PlayerProfile, SimulationConfig};

const BULLET_LEAD: f32 = 60.0;

/// Stationary player that fires at the nearest enemy on a fixed cadence.
#[derive(Debug)]
pub(crate) struct ScriptedPlayer {
    profile: PlayerProfile,
    position: Vec2,
    stats: PlayerStats,
    shot_budget: f32,
    hit_budget: f32,
}

impl ScriptedPlayer {
    pub(crate) fn new(profile: PlayerProfile, position: Vec2) -> Self {
        Self {
            profile,
            position,
            stats: PlayerStats {
                movement_factor: Some(profile.movement_factor),
                ..PlayerStats::default()
            },
            shot_budget: 0.0,
            hit_budget: 0.0,
        }
    }

    pub(crate) fn position(&self) -> Vec2 {
        self.position
    }

    pub(crate) fn stats(&self) -> PlayerStats {
        self.stats
    }

    fn nearest_enemy(&self, world: &World) -> Option<query::EnemySnapshot> {
        query::enemy_view(world).into_vec().into_iter().min_by(|a, b| {
            let da = a.position.distance_squared(self.position);
            let db = b.position.distance_squared(self.position);
            da.total_cmp(&db)
        })
    }

    /// Bullet in flight toward the nearest enemy, if any.
    pub(crate) fn bullets(&self, world: &World) -> Vec<Bullet> {
        self.nearest_enemy(world)
            .map(|enemy| {
                let offset = enemy.position - self.position;
                let lead = offset.normalize_or_zero() * (offset.length() / 2.0).min(BULLET_LEAD);
                let tip = self.position + lead;
                Bullet::new(tip.x, tip.y)
            })
            .into_iter()
            .collect()
    }

    /// Accumulates contact damage from enemies touching the player.
    pub(crate) fn take_contact_damage(&mut self, world: &World, dt: Duration) {
        let touching = query::enemy_view(world)
            .iter()
            .filter(|enemy| {
                let reach = self.profile.contact_range + enemy.kind.stats().size / 2.0;
                enemy.position.distance(self.position) <= reach
            })
            .count();
        self.stats.damage_taken +=
            touching as f32 * self.profile.contact_damage_per_second * dt.as_secs_f32();
    }

    /// Fires the shots due this tick and returns the hits as damage commands.
    pub(crate) fn fire(&mut self, world: &World, dt: Duration) -> Vec<Command> {
        let Some(target) = self.nearest_enemy(world) else {
            return Vec::new();
        };

        let mut commands = Vec::new();
        self.shot_budget += self.profile.shots_per_second * dt.as_secs_f32();
        while self.shot_budget >= 1.0 {
            self.shot_budget -= 1.0;
            self.stats.shots_fired += 1;
            self.hit_budget += self.profile.accuracy;
            if self.hit_budget >= 1.0 {
                self.hit_budget -= 1.0;
                self.stats.hits += 1;
                commands.push(Command::DamageEnemy {
                    enemy: target.id,
                    amount: self.profile.shot_damage,
                });
            }
        }
        commands
    }

    /// Credits kills and score from world events.
    pub(crate) fn observe(&mut self, events: &[Event]) {
        for event in events {
            if let Event::EnemyDestroyed { kind, .. } = event {
                self.stats.kills += 1;
                self.stats.score += kind.stats().score;
            }
        }
    }
}

/// Outcome of a headless run.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Summary {
    pub(crate) ticks: u64,
    pub(crate) stage: Stage,
    pub(crate) cleared: Vec<Stage>,
    pub(crate) victory: bool,
    pub(crate) enemies_alive: usize,
    pub(crate) difficulty_percentage: u32,
    pub(crate) stats: PlayerStats,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let accuracy = if self.stats.shots_fired > 0 {
            self.stats.hits as f32 / self.stats.shots_fired as f32 * 100.0
        } else {
            0.0
        };
        writeln!(f, "Drone Siege simulation report")?;
        writeln!(f, "  ticks simulated: {}", self.ticks)?;
        writeln!(f, "  stage reached:   {}", self.stage)?;
        writeln!(f, "  stages cleared:  {}", self.cleared.len())?;
        writeln!(
            f,
            "  outcome:         {}",
            if self.victory { "victory" } else { "in progress" }
        )?;
        writeln!(f, "  enemies alive:   {}", self.enemies_alive)?;
        writeln!(f, "  difficulty:      {}%", self.difficulty_percentage)?;
        writeln!(
            f,
            "  score {} | kills {} | accuracy {accuracy:.0}% | damage taken {:.1}",
            self.stats.score, self.stats.kills, self.stats.damage_taken
        )
    }
}

/// Runs the scripted player against a fresh world until victory or the tick limit.
pub(crate) fn run(config: &SimulationConfig, start: Stage, tuning: DifficultyTuning) -> Summary {
    let area = config.play_area();
    let dt = config.tick();
    let world_config = world::Config::new(config.seed, area)
        .with_tuning(tuning)
        .with_carry_over_enemies(config.carry_over_enemies);
    let mut world = World::new(world_config);
    let mut player = ScriptedPlayer::new(config.player, area.center());
    let mut events = Vec::new();
    let mut cleared = Vec::new();
    let mut victory = false;
    let mut ticks = 0;

    info!(%start, seed = config.seed, "simulation started");
    world::apply(&mut world, Command::SetStage { stage: start }, &mut events);

    while ticks < config.ticks && !victory {
        player.observe(&events);
        events.clear();
        ticks += 1;

        let tick = Command::Tick {
            dt,
            player: player.position(),
            bullets: player.bullets(&world),
            stats: player.stats(),
        };
        world::apply(&mut world, tick, &mut events);
        player.take_contact_damage(&world, dt);
        for command in player.fire(&world, dt) {
            world::apply(&mut world, command, &mut events);
        }

        if config.report_every > 0 && ticks % config.report_every == 0 {
            log_progress(&world, ticks);
        }

        let completed = events.iter().find_map(|event| match event {
            Event::StageCompleted { stage, reward } => Some((*stage, reward.message)),
            _ => None,
        });
        if let Some((stage, message)) = completed {
            info!(%stage, reward = message, tick = ticks, "stage cleared");
            cleared.push(stage);
            match stage.next() {
                Some(next) => {
                    world::apply(&mut world, Command::SetStage { stage: next }, &mut events);
                }
                None => victory = true,
            }
        }
    }
    player.observe(&events);

    Summary {
        ticks,
        stage: query::stage(&world),
        cleared,
        victory,
        enemies_alive: query::enemy_count(&world),
        difficulty_percentage: query::difficulty_percentage(&world),
        stats: player.stats(),
    }
}

fn log_progress(world: &World, tick: u64) {
    let Some(descriptor) = query::descriptor(world) else {
        return;
    };
    info!(
        tick,
        stage = %query::stage(world),
        wave = query::wave(world),
        progress = query::stage_progress(world),
        base = descriptor.base_difficulty,
        spawn_rate = descriptor.spawn_rate,
        speed = descriptor.enemy_speed_factor,
        health = descriptor.enemy_health_factor,
        ai_level = descriptor.ai.level,
        percent = query::difficulty_percentage(world),
        enemies = query::enemy_count(world),
        "difficulty",
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_validated(config: &SimulationConfig, start: Stage) -> Summary {
        run(config, start, config.tuning().expect("valid tuning"))
    }

    fn quick_config() -> SimulationConfig {
        SimulationConfig {
            ticks: 200,
            stage_duration_secs: 1,
            report_every: 0,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn replays_are_deterministic() {
        let config = quick_config();
        assert_eq!(
            run_validated(&config, Stage::Training),
            run_validated(&config, Stage::Training)
        );
    }

    #[test]
    fn short_stages_advance_to_the_boss() {
        let summary = run_validated(&quick_config(), Stage::Training);
        assert_eq!(summary.ticks, 200);
        assert_eq!(summary.cleared, vec![Stage::Training, Stage::Combat, Stage::Advanced]);
        assert_eq!(summary.stage, Stage::Boss);
        assert!(!summary.victory);
        assert!(summary.stats.shots_fired > 0);
    }

    #[test]
    fn heavy_hitter_defeats_the_boss() {
        let mut config = quick_config();
        config.ticks = 2_000;
        config.player.shots_per_second = 10.0;
        config.player.accuracy = 1.0;
        config.player.shot_damage = 1_000.0;

        let summary = run_validated(&config, Stage::Boss);

        assert!(summary.victory);
        assert_eq!(summary.cleared, vec![Stage::Boss]);
        assert!(summary.ticks < 2_000);
        assert!(summary.stats.score >= 1_000);
        assert!(summary.to_string().contains("victory"));
    }

    #[test]
    fn player_without_targets_holds_fire() {
        let config = quick_config();
        let world = World::new(world::Config::new(1, config.play_area()));
        let mut player = ScriptedPlayer::new(config.player, config.play_area().center());

        assert!(player.bullets(&world).is_empty());
        assert!(player.fire(&world, Duration::from_secs(5)).is_empty());
        assert_eq!(player.stats().shots_fired, 0);
    }
}
