use std::time::Duration;

use drone_siege_core::{AiParams, Command, DifficultyDescriptor, EnemyKind, Event, PlayArea, Stage};
use drone_siege_system_spawning::{Config, SpawnView, Spawning};
use glam::Vec2;
use proptest::prelude::*;

const AREA: PlayArea = PlayArea::new(800.0, 600.0);

fn view(stage: Stage, enemy_count: usize) -> SpawnView {
    SpawnView {
        stage,
        area: AREA,
        enemy_count,
        boss_alive: false,
    }
}

fn boss_view(enemy_count: usize) -> SpawnView {
    SpawnView {
        boss_alive: true,
        ..view(Stage::Boss, enemy_count)
    }
}

fn evaluated(stage: Stage, spawn_rate: f32) -> Event {
    Event::DifficultyEvaluated {
        descriptor: DifficultyDescriptor {
            base_difficulty: 0.1,
            spawn_rate,
            enemy_speed_factor: 1.0,
            enemy_health_factor: 1.0,
            ai: AiParams {
                level: 0,
                flank_chance: 0.0,
                dodge_chance: 0.0,
                stage,
            },
        },
    }
}

fn frames(stage: Stage, spawn_rate: f32, count: usize) -> Vec<Event> {
    (0..count).map(|_| evaluated(stage, spawn_rate)).collect()
}

fn spawned_kinds(commands: &[Command]) -> Vec<EnemyKind> {
    commands
        .iter()
        .map(|command| match command {
            Command::SpawnEnemy { kind, .. } => *kind,
            other => panic!("unexpected command emitted: {other:?}"),
        })
        .collect()
}

#[test]
fn training_spawns_on_every_frame_interval() {
    let mut spawning = Spawning::new(Config::new(0x1234_5678));
    let mut commands = Vec::new();

    spawning.handle(&frames(Stage::Training, 1.72, 33), view(Stage::Training, 0), &mut commands);
    assert!(commands.is_empty(), "no spawn before a full interval");

    spawning.handle(&frames(Stage::Training, 1.72, 35), view(Stage::Training, 0), &mut commands);
    assert_eq!(spawned_kinds(&commands), vec![EnemyKind::Drone; 2]);
    assert_eq!(spawning.frame_count(), 68);
}

#[test]
fn routine_spawns_respect_the_enemy_cap() {
    let mut spawning = Spawning::new(Config::new(3));
    let mut commands = Vec::new();

    spawning.handle(&frames(Stage::Combat, 60.0, 10), view(Stage::Combat, 19), &mut commands);
    assert_eq!(commands.len(), 1);

    commands.clear();
    spawning.handle(&frames(Stage::Combat, 60.0, 10), view(Stage::Combat, 20), &mut commands);
    assert!(commands.is_empty());
}

#[test]
fn custom_cap_is_honoured() {
    let mut spawning = Spawning::new(Config::new(3).with_max_enemies(4));
    let mut commands = Vec::new();
    spawning.handle(&frames(Stage::Combat, 60.0, 10), view(Stage::Combat, 0), &mut commands);
    assert_eq!(commands.len(), 4);
}

#[test]
fn boss_enters_at_top_centre_even_when_full() {
    let mut spawning = Spawning::new(Config::new(99));
    let mut commands = Vec::new();

    spawning.handle(
        &[Event::StageStarted { stage: Stage::Boss }],
        view(Stage::Boss, 20),
        &mut commands,
    );

    assert_eq!(
        commands,
        vec![Command::SpawnEnemy {
            kind: EnemyKind::Boss,
            position: Vec2::new(400.0, 100.0),
        }]
    );
    assert!(spawning.boss_spawned());
    assert_eq!(spawning.pending_burst(), 0);
}

#[test]
fn boss_support_drone_arrives_after_ten_simulated_seconds() {
    let mut spawning = Spawning::new(Config::new(5));
    let mut commands = Vec::new();
    spawning.handle(
        &[Event::StageStarted { stage: Stage::Boss }],
        view(Stage::Boss, 0),
        &mut commands,
    );
    commands.clear();

    spawning.handle(
        &[Event::TimeAdvanced {
            dt: Duration::from_secs(9),
        }],
        view(Stage::Boss, 1),
        &mut commands,
    );
    assert!(commands.is_empty());

    spawning.handle(
        &[Event::TimeAdvanced {
            dt: Duration::from_secs(1),
        }],
        view(Stage::Boss, 1),
        &mut commands,
    );
    assert_eq!(spawned_kinds(&commands), vec![EnemyKind::Drone]);

    commands.clear();
    spawning.handle(
        &[Event::TimeAdvanced {
            dt: Duration::from_secs(30),
        }],
        view(Stage::Boss, 2),
        &mut commands,
    );
    assert!(commands.is_empty(), "support drone is scheduled once");
}

#[test]
fn support_delay_is_configurable() {
    let config = Config::new(5).with_boss_support_delay(Duration::from_secs(2));
    let mut spawning = Spawning::new(config);
    let mut commands = Vec::new();
    spawning.handle(
        &[Event::StageStarted { stage: Stage::Boss }],
        view(Stage::Boss, 0),
        &mut commands,
    );
    commands.clear();

    spawning.handle(
        &[Event::TimeAdvanced {
            dt: Duration::from_millis(1_999),
        }],
        boss_view(1),
        &mut commands,
    );
    assert!(commands.is_empty());

    spawning.handle(
        &[Event::TimeAdvanced {
            dt: Duration::from_millis(1),
        }],
        boss_view(1),
        &mut commands,
    );
    assert_eq!(spawned_kinds(&commands), vec![EnemyKind::Drone]);
}

#[test]
fn reentering_the_boss_stage_keeps_the_living_boss() {
    let mut spawning = Spawning::new(Config::new(13));
    let mut commands = Vec::new();
    spawning.handle(
        &[Event::StageStarted { stage: Stage::Boss }],
        view(Stage::Boss, 0),
        &mut commands,
    );
    assert_eq!(spawned_kinds(&commands), vec![EnemyKind::Boss]);

    commands.clear();
    spawning.handle(
        &[Event::StageStarted { stage: Stage::Boss }],
        boss_view(1),
        &mut commands,
    );
    assert!(commands.is_empty(), "no second boss while the first lives");
    assert!(spawning.boss_spawned());

    spawning.handle(
        &[Event::TimeAdvanced {
            dt: Duration::from_secs(10),
        }],
        boss_view(1),
        &mut commands,
    );
    assert_eq!(
        spawned_kinds(&commands),
        vec![EnemyKind::Drone],
        "pending support drone survives the re-entry"
    );
}

#[test]
fn boss_stage_trickles_support_drones_at_a_third_of_the_cadence() {
    let mut spawning = Spawning::new(Config::new(17));
    let mut commands = Vec::new();
    spawning.handle(
        &[Event::StageStarted { stage: Stage::Boss }],
        view(Stage::Boss, 0),
        &mut commands,
    );
    commands.clear();

    spawning.handle(&frames(Stage::Boss, 3.0, 59), view(Stage::Boss, 1), &mut commands);
    assert!(commands.is_empty());

    spawning.handle(&frames(Stage::Boss, 3.0, 1), view(Stage::Boss, 1), &mut commands);
    assert_eq!(spawned_kinds(&commands), vec![EnemyKind::Drone]);
}

#[test]
fn boss_stage_without_boss_spawns_nothing() {
    let mut spawning = Spawning::new(Config::new(17));
    let mut commands = Vec::new();
    spawning.handle(&frames(Stage::Boss, 3.0, 600), view(Stage::Boss, 0), &mut commands);
    assert!(commands.is_empty());
}

#[test]
fn survival_stage_entry_releases_a_staggered_wave() {
    let mut spawning = Spawning::new(Config::new(21));
    let mut commands = Vec::new();

    spawning.handle(
        &[Event::StageStarted {
            stage: Stage::Combat,
        }],
        view(Stage::Combat, 0),
        &mut commands,
    );
    assert_eq!(commands.len(), 1, "head of the wave spawns at once");
    assert_eq!(spawning.pending_burst(), 4);

    spawning.handle(
        &[Event::TimeAdvanced {
            dt: Duration::from_millis(1_200),
        }],
        view(Stage::Combat, 1),
        &mut commands,
    );
    assert_eq!(commands.len(), 3);

    spawning.handle(
        &[Event::TimeAdvanced {
            dt: Duration::from_secs(10),
        }],
        view(Stage::Combat, 3),
        &mut commands,
    );
    assert_eq!(commands.len(), 5);
    assert_eq!(spawning.pending_burst(), 0);
}

#[test]
fn waves_grow_every_three_thousand_frames() {
    let mut spawning = Spawning::new(Config::new(8));
    let mut commands = Vec::new();

    spawning.handle(&frames(Stage::Combat, 0.001, 2_999), view(Stage::Combat, 0), &mut commands);
    assert!(commands.is_empty());
    assert_eq!(spawning.wave(), 1);

    spawning.handle(&frames(Stage::Combat, 0.001, 1), view(Stage::Combat, 0), &mut commands);
    assert_eq!(spawning.wave(), 2);
    assert_eq!(commands.len(), 1);
    assert_eq!(spawning.pending_burst(), 9);
}

#[test]
fn stage_entry_resets_the_wave() {
    let mut spawning = Spawning::new(Config::new(8));
    let mut commands = Vec::new();
    spawning.handle(&frames(Stage::Combat, 0.001, 3_000), view(Stage::Combat, 0), &mut commands);
    assert_eq!(spawning.wave(), 2);

    spawning.handle(
        &[Event::StageStarted {
            stage: Stage::Advanced,
        }],
        view(Stage::Advanced, 0),
        &mut commands,
    );
    assert_eq!(spawning.wave(), 1);
    assert_eq!(spawning.pending_burst(), 4);
}

#[test]
fn combat_stage_mixes_tanks_into_the_stream() {
    let mut spawning = Spawning::new(Config::new(0xfeed));
    let mut kinds = Vec::new();
    for _ in 0..300 {
        let mut commands = Vec::new();
        spawning.handle(&frames(Stage::Combat, 60.0, 1), view(Stage::Combat, 0), &mut commands);
        kinds.extend(spawned_kinds(&commands));
    }

    assert_eq!(kinds.len(), 300);
    let tanks = kinds.iter().filter(|kind| **kind == EnemyKind::Tank).count();
    assert!(tanks > 30 && tanks < 150, "tanks {tanks}");
    assert!(!kinds.contains(&EnemyKind::Boss));
}

#[test]
fn identical_seeds_replay_identically() {
    let run = |seed| {
        let mut spawning = Spawning::new(Config::new(seed));
        let mut commands = Vec::new();
        let mut events = vec![Event::StageStarted {
            stage: Stage::Advanced,
        }];
        events.extend(frames(Stage::Advanced, 2.5, 500));
        events.push(Event::TimeAdvanced {
            dt: Duration::from_secs(3),
        });
        spawning.handle(&events, view(Stage::Advanced, 0), &mut commands);
        commands
    };

    assert_eq!(run(42), run(42));
    assert_ne!(run(42), run(43));
}

proptest! {
    #[test]
    fn spawns_never_exceed_the_cap(
        stage in prop::sample::select(Stage::ALL.to_vec()),
        enemy_count in 0usize..30,
        spawn_rate in 0.3f32..60.0,
        count in 0usize..400,
        seed in any::<u64>(),
    ) {
        let mut spawning = Spawning::new(Config::new(seed));
        let mut commands = Vec::new();
        spawning.handle(&frames(stage, spawn_rate, count), view(stage, enemy_count), &mut commands);
        prop_assert!(enemy_count + commands.len() <= 20.max(enemy_count));
    }

    #[test]
    fn spawns_land_just_outside_the_area(seed in any::<u64>()) {
        let mut spawning = Spawning::new(Config::new(seed));
        let mut commands = Vec::new();
        spawning.handle(&frames(Stage::Advanced, 60.0, 20), view(Stage::Advanced, 0), &mut commands);
        for command in &commands {
            let Command::SpawnEnemy { position, .. } = command else {
                panic!("unexpected command emitted: {command:?}");
            };
            let outside_x = position.x == -50.0 || position.x == 850.0;
            let outside_y = position.y == -50.0 || position.y == 650.0;
            prop_assert!(outside_x || outside_y);
            prop_assert!((-50.0..=850.0).contains(&position.x));
            prop_assert!((-50.0..=650.0).contains(&position.y));
        }
    }
}
