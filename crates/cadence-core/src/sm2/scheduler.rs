//! Easiness-factor scheduler
//!
//! Review intervals grow multiplicatively by the item's easiness factor; a
//! lapse lowers easiness and sends the item back through relearning steps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::card::Rating;
use crate::fsrs::{DEFAULT_MAXIMUM_INTERVAL, clamp_interval};
use crate::settings::ConfigError;
use crate::steps::{
    DEFAULT_LEARNING_STEP_MINUTES, DEFAULT_RELEARNING_STEP_MINUTES, StepList, StepOutcome,
    after_days, after_minutes, step_outcome,
};

/// Easiness lost on a lapse
pub const LAPSE_EASINESS_PENALTY: f64 = 0.2;

/// Easiness gained on an Easy review
pub const EASY_EASINESS_BONUS: f64 = 0.15;

// ============================================================================
// TYPES
// ============================================================================

/// SM-2 lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sm2Phase {
    #[default]
    New,
    Learning,
    Review,
    Relearning,
}

/// Scheduling state stored in the SM-2 slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Sm2State {
    pub due: Option<DateTime<Utc>>,
    pub easiness_factor: f64,
    pub interval_days: u32,
    pub repetitions: u32,
    pub lapses: u32,
    pub state: Sm2Phase,
    pub learning_step_index: u32,
    pub last_review: Option<DateTime<Utc>>,
}

impl Default for Sm2State {
    fn default() -> Self {
        Self {
            due: None,
            easiness_factor: 2.5,
            interval_days: 0,
            repetitions: 0,
            lapses: 0,
            state: Sm2Phase::New,
            learning_step_index: 0,
            last_review: None,
        }
    }
}

/// SM-2 parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Sm2Parameters {
    pub starting_easiness: f64,
    pub minimum_easiness: f64,
    pub easy_bonus: f64,
    pub hard_multiplier: f64,
    /// Days after graduating with Good
    pub graduating_interval: u32,
    /// Days after graduating with Easy
    pub easy_interval: u32,
    pub minimum_interval: u32,
    pub maximum_interval: u32,
    /// Fraction of the old interval kept after a lapse
    pub lapse_interval_multiplier: f64,
}

impl Default for Sm2Parameters {
    fn default() -> Self {
        Self {
            starting_easiness: 2.5,
            minimum_easiness: 1.3,
            easy_bonus: 1.3,
            hard_multiplier: 1.2,
            graduating_interval: 1,
            easy_interval: 4,
            minimum_interval: 1,
            maximum_interval: DEFAULT_MAXIMUM_INTERVAL,
            lapse_interval_multiplier: 0.0,
        }
    }
}

impl Sm2Parameters {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let floor = self.minimum_easiness;
        if !(floor.is_finite() && floor > 0.0) {
            return Err(ConfigError::InvalidEasiness {
                field: "minimumEasiness",
                value: floor,
            });
        }
        if !(self.starting_easiness.is_finite() && self.starting_easiness > 0.0) {
            return Err(ConfigError::InvalidEasiness {
                field: "startingEasiness",
                value: self.starting_easiness,
            });
        }
        for (field, value) in [
            ("easyBonus", self.easy_bonus),
            ("hardMultiplier", self.hard_multiplier),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidEasiness { field, value });
            }
        }
        if !(self.lapse_interval_multiplier.is_finite() && self.lapse_interval_multiplier >= 0.0) {
            return Err(ConfigError::InvalidEasiness {
                field: "lapseIntervalMultiplier",
                value: self.lapse_interval_multiplier,
            });
        }
        if !(1..=DEFAULT_MAXIMUM_INTERVAL).contains(&self.maximum_interval) {
            return Err(ConfigError::InvalidMaximumInterval(self.maximum_interval));
        }
        if self.minimum_interval < 1 || self.minimum_interval > self.maximum_interval {
            return Err(ConfigError::IntervalBounds {
                minimum: self.minimum_interval,
                maximum: self.maximum_interval,
            });
        }
        Ok(())
    }
}

/// Outcome of one rating
#[derive(Debug, Clone, PartialEq)]
pub struct Sm2Result {
    pub state: Sm2State,
    /// Interval in days (0 while on a learning step)
    pub interval: i64,
    pub due: DateTime<Utc>,
    pub elapsed_days: i64,
}

/// Outcomes for all four ratings
#[derive(Debug, Clone, PartialEq)]
pub struct Sm2Preview {
    pub again: Sm2Result,
    pub hard: Sm2Result,
    pub good: Sm2Result,
    pub easy: Sm2Result,
}

impl Sm2Preview {
    pub fn get(&self, rating: Rating) -> &Sm2Result {
        match rating {
            Rating::Again => &self.again,
            Rating::Hard => &self.hard,
            Rating::Good => &self.good,
            Rating::Easy => &self.easy,
        }
    }

    pub fn into_result(self, rating: Rating) -> Sm2Result {
        match rating {
            Rating::Again => self.again,
            Rating::Hard => self.hard,
            Rating::Good => self.good,
            Rating::Easy => self.easy,
        }
    }
}

// ============================================================================
// SCHEDULER
// ============================================================================

#[derive(Debug, Clone)]
pub struct Sm2Scheduler {
    params: Sm2Parameters,
    learning_steps: Vec<u32>,
    relearning_steps: Vec<u32>,
}

impl Default for Sm2Scheduler {
    fn default() -> Self {
        Self {
            params: Sm2Parameters::default(),
            learning_steps: vec![1, 10],
            relearning_steps: vec![DEFAULT_RELEARNING_STEP_MINUTES],
        }
    }
}

impl Sm2Scheduler {
    pub fn new(
        params: &Sm2Parameters,
        learning_steps: &StepList,
        relearning_steps: &StepList,
    ) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self {
            params: params.clone(),
            learning_steps: learning_steps.or_default(DEFAULT_LEARNING_STEP_MINUTES),
            relearning_steps: relearning_steps.or_default(DEFAULT_RELEARNING_STEP_MINUTES),
        })
    }

    pub fn parameters(&self) -> &Sm2Parameters {
        &self.params
    }

    /// Step list in effect for a phase
    pub fn steps_for(&self, phase: Sm2Phase) -> &[u32] {
        match phase {
            Sm2Phase::Relearning => &self.relearning_steps,
            _ => &self.learning_steps,
        }
    }

    fn clamp(&self, days: f64) -> i64 {
        clamp_interval(days, self.params.maximum_interval).max(self.params.minimum_interval as i64)
    }

    fn floor_easiness(&self, easiness: f64) -> f64 {
        if easiness.is_finite() {
            easiness.max(self.params.minimum_easiness)
        } else {
            self.params.starting_easiness.max(self.params.minimum_easiness)
        }
    }

    /// Apply a single rating
    pub fn review(&self, state: &Sm2State, rating: Rating, now: DateTime<Utc>) -> Sm2Result {
        self.preview(state, now).into_result(rating)
    }

    /// Compute the outcome of every rating in one call
    pub fn preview(&self, state: &Sm2State, now: DateTime<Utc>) -> Sm2Preview {
        let elapsed_days = state
            .last_review
            .map(|last| (now - last).num_days().max(0))
            .unwrap_or(0);

        let [again, hard, good, easy] =
            Rating::ALL.map(|rating| self.transition(state, rating, elapsed_days, now));

        Sm2Preview {
            again,
            hard,
            good,
            easy,
        }
    }

    fn transition(
        &self,
        state: &Sm2State,
        rating: Rating,
        elapsed_days: i64,
        now: DateTime<Utc>,
    ) -> Sm2Result {
        let mut next = state.clone();
        next.last_review = Some(now);
        next.easiness_factor = self.floor_easiness(state.easiness_factor);

        match state.state {
            Sm2Phase::New => {
                next.repetitions = 0;
                next.lapses = 0;
                next.interval_days = 0;
                next.state = Sm2Phase::Learning;
                next.learning_step_index = 0;
                next.easiness_factor = self.floor_easiness(self.params.starting_easiness);
                self.apply_steps(next, rating, elapsed_days, now)
            }
            Sm2Phase::Learning | Sm2Phase::Relearning => {
                self.apply_steps(next, rating, elapsed_days, now)
            }
            Sm2Phase::Review => {
                let base = state.interval_days.max(1) as f64;
                let ease = next.easiness_factor;
                next.repetitions = state.repetitions + 1;

                let days = match rating {
                    Rating::Again => {
                        next.easiness_factor = self.floor_easiness(ease - LAPSE_EASINESS_PENALTY);
                        next.lapses = state.lapses + 1;
                        next.interval_days =
                            self.clamp((base * self.params.lapse_interval_multiplier).round()) as u32;
                        next.state = Sm2Phase::Relearning;
                        next.learning_step_index = 0;
                        let first = self.relearning_steps[0];
                        return self.on_step(next, first, elapsed_days, now);
                    }
                    Rating::Hard => base * self.params.hard_multiplier,
                    Rating::Good => base * ease,
                    Rating::Easy => {
                        next.easiness_factor = self.floor_easiness(ease + EASY_EASINESS_BONUS);
                        base * ease * self.params.easy_bonus
                    }
                };
                let interval = self.clamp(days.round());
                self.on_review(next, interval, elapsed_days, now)
            }
        }
    }

    fn apply_steps(
        &self,
        mut next: Sm2State,
        rating: Rating,
        elapsed_days: i64,
        now: DateTime<Utc>,
    ) -> Sm2Result {
        let steps = self.steps_for(next.state);
        match step_outcome(steps, next.learning_step_index, rating) {
            StepOutcome::Stay {
                index,
                delay_minutes,
            } => {
                next.learning_step_index = index;
                self.on_step(next, delay_minutes, elapsed_days, now)
            }
            StepOutcome::Graduate => {
                let days = match (next.state, rating) {
                    (Sm2Phase::Relearning, _) => next.interval_days,
                    (_, Rating::Easy) => self.params.easy_interval,
                    _ => self.params.graduating_interval,
                };
                next.repetitions += 1;
                next.learning_step_index = 0;
                let interval = self.clamp(days as f64);
                self.on_review(next, interval, elapsed_days, now)
            }
        }
    }

    fn on_step(
        &self,
        mut next: Sm2State,
        delay_minutes: u32,
        elapsed_days: i64,
        now: DateTime<Utc>,
    ) -> Sm2Result {
        let due = after_minutes(now, delay_minutes as i64);
        next.due = Some(due);
        Sm2Result {
            state: next,
            interval: 0,
            due,
            elapsed_days,
        }
    }

    fn on_review(
        &self,
        mut next: Sm2State,
        interval: i64,
        elapsed_days: i64,
        now: DateTime<Utc>,
    ) -> Sm2Result {
        let due = after_days(now, interval);
        next.state = Sm2Phase::Review;
        next.interval_days = interval as u32;
        next.due = Some(due);
        Sm2Result {
            state: next,
            interval,
            due,
            elapsed_days,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
