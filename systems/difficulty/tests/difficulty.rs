use std::time::Duration;

use drone_siege_core::{
    DifficultyDescriptor, GameStateSnapshot, PerformanceSample, PlayerStats, Stage, StageTarget,
};
use drone_siege_system_difficulty::{DifficultyController, DifficultyTuning, StageTable};
use proptest::prelude::*;

fn stage_strategy() -> impl Strategy<Value = Stage> {
    prop::sample::select(Stage::ALL.to_vec())
}

fn stats_strategy() -> impl Strategy<Value = PlayerStats> {
    (
        0u32..200_000,
        0u32..5_000,
        0u32..5_000,
        0u32..500,
        0.0f32..5_000.0,
        prop::option::of(0.0f32..4.0),
    )
        .prop_map(
            |(score, shots_fired, hits, kills, damage_taken, movement_factor)| PlayerStats {
                score,
                shots_fired,
                hits,
                kills,
                damage_taken,
                movement_factor,
            },
        )
}

fn controller_at(stage: Stage) -> DifficultyController {
    let mut controller = DifficultyController::default();
    controller.set_stage(stage);
    controller
}

proptest! {
    #[test]
    fn difficulty_never_leaves_stage_band(
        stage in stage_strategy(),
        ticks in prop::collection::vec((0u64..3_600_000, stats_strategy()), 1..25),
    ) {
        let mut controller = controller_at(stage);
        let target = StageTable::default().target(stage);

        for (elapsed_ms, stats) in ticks {
            let state = GameStateSnapshot::new(Duration::from_millis(elapsed_ms), stats);
            let descriptor = controller.evaluate(&state);
            prop_assert!(descriptor.base_difficulty >= target.min);
            prop_assert!(descriptor.base_difficulty <= target.max);
            prop_assert!((0.0..=1.0).contains(&descriptor.ai.flank_chance));
            prop_assert!((0.0..=1.0).contains(&descriptor.ai.dodge_chance));
            prop_assert!(descriptor.ai.level <= 5);
            prop_assert!(descriptor.spawn_rate > 0.0);
            prop_assert!(descriptor.enemy_speed_factor > 0.0);
            prop_assert_eq!(descriptor.ai.stage, stage);
        }
    }

    #[test]
    fn boss_stage_is_fixed_regardless_of_performance(
        ticks in prop::collection::vec((0u64..3_600_000, stats_strategy()), 1..25),
    ) {
        let mut controller = controller_at(Stage::Boss);
        for (elapsed_ms, stats) in ticks {
            let state = GameStateSnapshot::new(Duration::from_millis(elapsed_ms), stats);
            let descriptor = controller.evaluate(&state);
            prop_assert_eq!(descriptor.ai.level, 5);
            prop_assert_eq!(descriptor.enemy_health_factor, 1.0);
            prop_assert_eq!(descriptor.spawn_rate, 3.0);
            prop_assert_eq!(descriptor.base_difficulty, 1.5);
            prop_assert_eq!(controller.difficulty_percentage(), 100);
        }
    }

    #[test]
    fn early_stage_adjustment_stays_within_ten_percent(
        stage in prop::sample::select(vec![Stage::Training, Stage::Combat]),
        samples in prop::collection::vec(
            (0.0f32..3.0, 0.0f32..3.0, 0.0f32..3.0, 0.0f32..3.0),
            0..20,
        ),
    ) {
        let mut controller = controller_at(stage);
        for (accuracy, kill_rate, damage_taken, movement) in samples {
            controller.record_sample(PerformanceSample::clamped(
                accuracy,
                kill_rate,
                damage_taken,
                movement,
            ));
            let adjustment = controller.performance_adjustment();
            prop_assert!((0.9..=1.1).contains(&adjustment));
        }
    }
}

#[test]
fn history_keeps_only_the_ten_most_recent_samples() {
    let mut controller = DifficultyController::default();
    let samples: Vec<_> = (0..15)
        .map(|index| {
            let value = 0.3 + index as f32 * 0.1;
            PerformanceSample::clamped(value, 1.0, 1.0, 1.0)
        })
        .collect();

    for sample in &samples {
        controller.record_sample(*sample);
    }

    let retained: Vec<_> = controller.history().copied().collect();
    assert_eq!(retained.len(), 10);
    assert_eq!(retained.as_slice(), &samples[5..]);
}

#[test]
fn evaluate_appends_one_sample_per_call() {
    let mut controller = DifficultyController::default();
    for tick in 0..12 {
        let _ = controller.evaluate(&GameStateSnapshot::default());
        assert_eq!(controller.history().len(), (tick + 1).min(10));
    }
}

#[test]
fn training_with_no_shots_stays_in_gentle_band() {
    let mut controller = DifficultyController::default();
    let state = GameStateSnapshot::new(Duration::from_secs(10), PlayerStats::default());

    for _ in 0..10 {
        let descriptor = controller.evaluate(&state);
        assert!(descriptor.base_difficulty >= 0.05 && descriptor.base_difficulty <= 0.10);
    }

    let sample = controller.history().last().copied().expect("sample recorded");
    assert_eq!(sample.accuracy, 2.0);
    let adjustment = controller.performance_adjustment();
    assert!((0.9..=1.1).contains(&adjustment), "adjustment {adjustment}");
}

#[test]
fn training_descriptor_is_slow_and_forgiving() {
    let mut controller = DifficultyController::default();
    let descriptor = controller.evaluate(&GameStateSnapshot::default());

    assert!((descriptor.base_difficulty - 0.07).abs() < 1e-6);
    assert!((descriptor.spawn_rate - 1.72).abs() < 1e-5);
    assert!((descriptor.enemy_speed_factor - 0.65).abs() < 1e-5);
    assert!((descriptor.enemy_health_factor - 0.905).abs() < 1e-5);
    assert_eq!(descriptor.ai.level, 0);
    assert!((descriptor.ai.flank_chance - 0.021).abs() < 1e-6);
    assert_eq!(descriptor.ai.dodge_chance, 0.0);
    assert_eq!(controller.difficulty_percentage(), 7);
}

#[test]
fn combat_difficulty_grows_with_time_and_score() {
    let mut early = controller_at(Stage::Combat);
    let mut late = controller_at(Stage::Combat);

    let fresh = early.evaluate(&GameStateSnapshot::default());
    let seasoned = late.evaluate(&GameStateSnapshot::new(
        Duration::from_secs(9 * 60),
        PlayerStats {
            score: 50_000,
            ..PlayerStats::default()
        },
    ));

    assert!((fresh.base_difficulty - 0.25).abs() < 1e-6);
    let expected = 0.25 + 1.0 * 0.03 + 10.0 * 0.005;
    assert!((late.base_difficulty() - expected).abs() < 1e-5);
    assert_eq!(seasoned.base_difficulty, 0.30, "clamped to the stage maximum");
    assert_eq!(early.difficulty_percentage(), 25);
    assert_eq!(late.difficulty_percentage(), 30);
}

#[test]
fn set_stage_restarts_the_clock() {
    let mut controller = DifficultyController::default();
    controller.advance_clock(Duration::from_secs(30));
    controller.set_stage(Stage::Combat);
    assert_eq!(controller.stage(), Stage::Combat);
    assert_eq!(controller.stage_elapsed(), Duration::ZERO);
}

#[test]
fn custom_tuning_shortens_stages() {
    let tuning = DifficultyTuning {
        stage_duration: Duration::from_secs(6),
        ..DifficultyTuning::default()
    };
    let mut controller = DifficultyController::new(tuning);
    controller.advance_clock(Duration::from_secs(6));
    assert!(controller.is_stage_complete());
}

fn assert_close(actual: f32, expected: f32, what: &str) {
    assert!(
        (actual - expected).abs() < 1e-5,
        "{what}: expected {expected}, got {actual}"
    );
}

fn assert_descriptor(
    descriptor: &DifficultyDescriptor,
    difficulty: f32,
    spawn_rate: f32,
    speed: f32,
    health: f32,
    flank: f32,
    dodge: f32,
) {
    assert_close(descriptor.base_difficulty, difficulty, "difficulty");
    assert_close(descriptor.spawn_rate, spawn_rate, "spawn rate");
    assert_close(descriptor.enemy_speed_factor, speed, "speed factor");
    assert_close(descriptor.enemy_health_factor, health, "health factor");
    assert_close(descriptor.ai.flank_chance, flank, "flank chance");
    assert_close(descriptor.ai.dodge_chance, dodge, "dodge chance");
}

#[test]
fn combat_descriptor_follows_the_mid_stage_formulas() {
    let mut controller = controller_at(Stage::Combat);
    let descriptor = controller.evaluate(&GameStateSnapshot::default());

    // d = 0.25: 1.2 - 1.5d, 0.8 + 1.5d, 1 + d, 0.1 * d * 2, 0.15 * d * 2.
    assert_descriptor(&descriptor, 0.25, 0.825, 1.175, 1.25, 0.05, 0.075);
    assert_eq!(descriptor.ai.level, 0);
}

#[test]
fn advanced_descriptor_scales_chances_with_the_stage_number() {
    let mut controller = controller_at(Stage::Advanced);
    let descriptor = controller.evaluate(&GameStateSnapshot::default());

    assert_descriptor(&descriptor, 0.30, 0.75, 1.25, 1.30, 0.09, 0.135);
    assert_eq!(descriptor.ai.level, 0);
}

#[test]
fn advanced_descriptor_saturates_at_high_difficulty() {
    let table = StageTable::new([
        StageTarget::new(0.07, 0.05, 0.10),
        StageTarget::new(0.25, 0.20, 0.30),
        StageTarget::new(1.5, 1.5, 1.5),
        StageTarget::new(1.5, 1.5, 1.5),
    ])
    .expect("fixed advanced band is valid");
    let tuning = DifficultyTuning {
        stage_table: table,
        ..DifficultyTuning::default()
    };
    let mut controller = DifficultyController::new(tuning);
    controller.set_stage(Stage::Advanced);
    let descriptor = controller.evaluate(&GameStateSnapshot::default());

    // Spawn rate floors at 0.3; speed, health and dodge reach their caps.
    assert_descriptor(&descriptor, 1.5, 0.3, 2.0, 2.0, 0.45, 0.6);
    assert_eq!(descriptor.ai.level, 1);
}

#[test]
fn boss_descriptor_is_fully_saturated() {
    let mut controller = controller_at(Stage::Boss);
    let descriptor = controller.evaluate(&GameStateSnapshot::default());

    assert_descriptor(&descriptor, 1.5, 3.0, 2.0, 1.0, 0.5, 0.6);
    assert_eq!(descriptor.ai.level, 5);
}

#[test]
fn unbounded_history_capacity_is_accepted() {
    let tuning = DifficultyTuning {
        history_capacity: usize::MAX,
        ..DifficultyTuning::default()
    };
    let mut controller = DifficultyController::new(tuning);
    for _ in 0..100 {
        let _ = controller.evaluate(&GameStateSnapshot::default());
    }
    assert_eq!(controller.history().len(), 100);
}
