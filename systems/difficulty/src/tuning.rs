use std::time::Duration;

use drone_siege_core::{Stage, StageTarget};
use thiserror::Error;

const DEFAULT_TARGETS: [StageTarget; 4] = [
    StageTarget::new(0.07, 0.05, 0.10),
    StageTarget::new(0.25, 0.20, 0.30),
    StageTarget::new(0.30, 0.25, 0.45),
    StageTarget::new(1.5, 1.5, 1.5),
];

/// Immutable per-stage difficulty bands, validated on construction.
#[derive(Clone, Debug, PartialEq)]
pub struct StageTable {
    targets: [StageTarget; 4],
}

impl StageTable {
    /// Validates and wraps one target per stage, ordered by stage number.
    ///
    /// Every band must satisfy `min <= base <= max`; the boss band must be a
    /// single fixed value.
    pub fn new(targets: [StageTarget; 4]) -> Result<Self, StageTableError> {
        for stage in Stage::ALL {
            let target = targets[stage.index()];
            let StageTarget { base, min, max } = target;

            if !(base.is_finite() && min.is_finite() && max.is_finite()) {
                return Err(StageTableError::NonFinite { stage });
            }
            if min > base || base > max {
                return Err(StageTableError::Unordered {
                    stage,
                    min,
                    base,
                    max,
                });
            }
            if stage.is_boss() && !target.is_fixed() {
                return Err(StageTableError::BossNotFixed {
                    stage,
                    min,
                    base,
                    max,
                });
            }
        }

        Ok(Self { targets })
    }

    /// Difficulty band of the provided stage.
    #[must_use]
    pub fn target(&self, stage: Stage) -> StageTarget {
        self.targets[stage.index()]
    }
}

impl Default for StageTable {
    fn default() -> Self {
        Self {
            targets: DEFAULT_TARGETS,
        }
    }
}

impl TryFrom<[StageTarget; 4]> for StageTable {
    type Error = StageTableError;

    fn try_from(targets: [StageTarget; 4]) -> Result<Self, Self::Error> {
        Self::new(targets)
    }
}

/// Reasons a stage table is rejected.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum StageTableError {
    /// A band value was NaN or infinite.
    #[error("{stage}: difficulty band contains a non-finite value")]
    NonFinite {
        /// Stage carrying the invalid band.
        stage: Stage,
    },
    /// The band violates `min <= base <= max`.
    #[error("{stage}: expected min <= base <= max, found min {min}, base {base}, max {max}")]
    Unordered {
        /// Stage carrying the invalid band.
        stage: Stage,
        /// Configured minimum.
        min: f32,
        /// Configured base.
        base: f32,
        /// Configured maximum.
        max: f32,
    },
    /// The boss band is not a single value.
    #[error("{stage}: boss difficulty must be fixed, found min {min}, base {base}, max {max}")]
    BossNotFixed {
        /// Stage carrying the invalid band.
        stage: Stage,
        /// Configured minimum.
        min: f32,
        /// Configured base.
        base: f32,
        /// Configured maximum.
        max: f32,
    },
}

/// Tuning knobs of the difficulty controller.
#[derive(Clone, Debug)]
pub struct DifficultyTuning {
    /// Number of performance samples retained; older samples are evicted first.
    pub history_capacity: usize,
    /// Samples required before performance starts to move difficulty.
    pub warmup_samples: usize,
    /// Simulated time a survival stage lasts.
    pub stage_duration: Duration,
    /// Difficulty band per stage.
    pub stage_table: StageTable,
}

impl Default for DifficultyTuning {
    fn default() -> Self {
        Self {
            history_capacity: 10,
            warmup_samples: 3,
            stage_duration: Duration::from_secs(180),
            stage_table: StageTable::default(),
        }
    }
}
