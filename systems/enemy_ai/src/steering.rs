use std::f32::consts::FRAC_PI_2;

use drone_siege_core::{Bullet, Stage};
use glam::Vec2;
use rand::Rng;

const FLANK_WEIGHT: f32 = 0.7;
const DODGE_RADIUS: f32 = 100.0;
const DODGE_STRENGTH: f32 = 1.5;
const DODGE_STAGE_SCALE: f32 = 0.2;

/// Sideways offset at ±90° from `heading`, with the side picked at random.
///
/// A zero heading is treated as pointing along +x.
pub(crate) fn flank_offset<R>(heading: Vec2, rng: &mut R) -> Vec2
where
    R: Rng + ?Sized,
{
    let side = if rng.gen::<bool>() {
        FRAC_PI_2
    } else {
        -FRAC_PI_2
    };
    Vec2::from_angle(heading.y.atan2(heading.x) + side) * FLANK_WEIGHT
}

/// Summed repulsion away from every bullet within dodge range.
///
/// Each bullet at distance `d < 100` pushes with
/// `1.5 * (1 - d / 100) * (stage * 0.2)`. A bullet sitting exactly on the
/// enemy has no direction and contributes nothing.
#[must_use]
pub fn dodge_push(position: Vec2, bullets: &[Bullet], stage: Stage) -> Vec2 {
    let stage_scale = stage.factor() * DODGE_STAGE_SCALE;
    bullets
        .iter()
        .filter_map(|bullet| {
            let offset = bullet.position - position;
            let distance = offset.length();
            if distance <= 0.0 || distance >= DODGE_RADIUS {
                return None;
            }
            let force = DODGE_STRENGTH * (1.0 - distance / DODGE_RADIUS) * stage_scale;
            Some(-offset / distance * force)
        })
        .sum()
}

/// Exponential smoothing factor; later stages react faster.
#[must_use]
pub fn smoothing_factor(stage: Stage) -> f32 {
    match stage {
        Stage::Training => 0.05,
        _ => 0.1 + stage.factor() * 0.02,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    #[test]
    fn flank_offset_is_perpendicular() {
        let mut rng = StepRng::new(0, 0);
        let offset = flank_offset(Vec2::X, &mut rng);
        assert!(offset.dot(Vec2::X).abs() < 1e-6);
        assert!((offset.length() - FLANK_WEIGHT).abs() < 1e-6);
    }

    #[test]
    fn flank_offset_of_zero_heading_is_vertical() {
        let mut rng = StepRng::new(0, 0);
        let offset = flank_offset(Vec2::ZERO, &mut rng);
        assert!(offset.x.abs() < 1e-6);
        assert!((offset.y.abs() - FLANK_WEIGHT).abs() < 1e-6);
    }

    #[test]
    fn smoothing_speeds_up_with_stage() {
        assert_eq!(smoothing_factor(Stage::Training), 0.05);
        assert!((smoothing_factor(Stage::Combat) - 0.14).abs() < 1e-6);
        assert!((smoothing_factor(Stage::Boss) - 0.18).abs() < 1e-6);
    }
}
