//! FSRS (Free Spaced Repetition Scheduler) Module
//!
//! Two model generations behind one scheduler:
//!
//! - FSRS-4.5: 17 weights, linear initial difficulty, fixed decay of 0.5
//! - FSRS-6: 21 weights, exponential initial difficulty, linear damping,
//!   same-day term with S^(-w19) and a trainable decay (w20)
//!
//! ## Core Formulas:
//! - Retrievability: R = (1 + FACTOR * t / S)^(-decay) where FACTOR = 0.9^(-1/decay) - 1
//! - Interval: t = S/FACTOR * (R^(-1/decay) - 1)

mod algorithm;
mod scheduler;

pub use algorithm::{
    DEFAULT_DECAY, DEFAULT_RETENTION, DecaySource, FSRS45_LAYOUT, FSRS45_WEIGHTS, FSRS6_LAYOUT,
    FSRS6_WEIGHTS, FsrsVariant, InitialDifficulty, MAX_DIFFICULTY, MAX_STABILITY, MIN_DIFFICULTY,
    MIN_STABILITY, SameDayWeights, WeightLayout, forget_stability, initial_difficulty,
    initial_stability, next_difficulty, next_interval, next_interval_raw, recall_stability,
    retrievability, same_day_stability,
};

pub use scheduler::{
    DEFAULT_MAXIMUM_INTERVAL, FSRSParameters, FSRSScheduler, FSRSState, LearningState,
    PreviewResults, ReviewResult,
};

pub(crate) use algorithm::clamp_interval;
