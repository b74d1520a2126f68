//! FSRS Scheduler
//!
//! Card lifecycle (New → Learning → Review ⇄ Relearning) layered over the
//! numeric model in [`super::algorithm`]. Learning phases step through minute
//! offsets; the Review phase moves the due date in whole days.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::algorithm::{
    self, DEFAULT_RETENTION, FsrsVariant, WeightLayout, clamp_interval, forget_stability,
    initial_difficulty, initial_stability, next_difficulty, recall_stability, retrievability,
    same_day_stability,
};
use crate::card::Rating;
use crate::settings::ConfigError;
use crate::steps::{
    DEFAULT_LEARNING_STEP_MINUTES, DEFAULT_RELEARNING_STEP_MINUTES, StepList, StepOutcome,
    after_days, after_minutes, step_outcome,
};

/// Default upper bound on review intervals, in days
pub const DEFAULT_MAXIMUM_INTERVAL: u32 = 36500;

// ============================================================================
// TYPES
// ============================================================================

/// FSRS lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LearningState {
    #[default]
    New,
    Learning,
    Review,
    Relearning,
}

/// Scheduling state stored in an FSRS slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FSRSState {
    pub stability: f64,
    pub difficulty: f64,
    pub state: LearningState,
    pub due: Option<DateTime<Utc>>,
    pub last_review: Option<DateTime<Utc>>,
    pub elapsed_days: i64,
    pub scheduled_days: i64,
    pub reps: u32,
    pub lapses: u32,
    pub learning_step_index: u32,
}

impl Default for FSRSState {
    fn default() -> Self {
        Self {
            stability: 0.0,
            difficulty: 0.0,
            state: LearningState::New,
            due: None,
            last_review: None,
            elapsed_days: 0,
            scheduled_days: 0,
            reps: 0,
            lapses: 0,
            learning_step_index: 0,
        }
    }
}

/// Per-algorithm FSRS parameters
///
/// An empty `weights` vector selects the generation's default weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FSRSParameters {
    pub request_retention: f64,
    pub maximum_interval: u32,
    pub weights: Vec<f64>,
}

impl Default for FSRSParameters {
    fn default() -> Self {
        Self {
            request_retention: DEFAULT_RETENTION,
            maximum_interval: DEFAULT_MAXIMUM_INTERVAL,
            weights: Vec::new(),
        }
    }
}

impl FSRSParameters {
    /// Check retention, interval bound and weight vector for one generation
    pub fn validate(&self, variant: FsrsVariant) -> Result<(), ConfigError> {
        let retention = self.request_retention;
        if !(retention > 0.0 && retention < 1.0) {
            return Err(ConfigError::InvalidRetention(retention));
        }
        if !(1..=DEFAULT_MAXIMUM_INTERVAL).contains(&self.maximum_interval) {
            return Err(ConfigError::InvalidMaximumInterval(self.maximum_interval));
        }
        if self.weights.is_empty() {
            return Ok(());
        }

        let expected = variant.layout().weight_count;
        if self.weights.len() != expected {
            return Err(ConfigError::WeightCount {
                algorithm: variant.name(),
                expected,
                found: self.weights.len(),
            });
        }
        if let Some(index) = self.weights.iter().position(|w| !w.is_finite()) {
            return Err(ConfigError::NonFiniteWeight {
                algorithm: variant.name(),
                index,
            });
        }
        Ok(())
    }

    /// Configured weights, or the generation's defaults when none are set
    pub fn weights_for(&self, variant: FsrsVariant) -> Vec<f64> {
        if self.weights.is_empty() {
            variant.default_weights()
        } else {
            self.weights.clone()
        }
    }
}

/// Outcome of one rating
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewResult {
    pub state: FSRSState,
    /// Retrievability at the moment of review
    pub retrievability: f64,
    /// Interval in days (0 while on a learning step)
    pub interval: i64,
    pub due: DateTime<Utc>,
    pub elapsed_days: i64,
}

/// Outcomes for all four ratings
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewResults {
    pub again: ReviewResult,
    pub hard: ReviewResult,
    pub good: ReviewResult,
    pub easy: ReviewResult,
}

impl PreviewResults {
    pub fn get(&self, rating: Rating) -> &ReviewResult {
        match rating {
            Rating::Again => &self.again,
            Rating::Hard => &self.hard,
            Rating::Good => &self.good,
            Rating::Easy => &self.easy,
        }
    }

    pub fn into_result(self, rating: Rating) -> ReviewResult {
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

/// FSRS scheduler for one model generation
#[derive(Debug, Clone)]
pub struct FSRSScheduler {
    variant: FsrsVariant,
    weights: Vec<f64>,
    request_retention: f64,
    maximum_interval: u32,
    learning_steps: Vec<u32>,
    relearning_steps: Vec<u32>,
}

impl Default for FSRSScheduler {
    fn default() -> Self {
        Self {
            variant: FsrsVariant::Fsrs6,
            weights: FsrsVariant::Fsrs6.default_weights(),
            request_retention: DEFAULT_RETENTION,
            maximum_interval: DEFAULT_MAXIMUM_INTERVAL,
            learning_steps: vec![1, 10],
            relearning_steps: vec![DEFAULT_RELEARNING_STEP_MINUTES],
        }
    }
}

impl FSRSScheduler {
    /// Build a scheduler, rejecting invalid parameters
    pub fn new(
        variant: FsrsVariant,
        params: &FSRSParameters,
        learning_steps: &StepList,
        relearning_steps: &StepList,
    ) -> Result<Self, ConfigError> {
        params.validate(variant)?;
        Ok(Self {
            variant,
            weights: params.weights_for(variant),
            request_retention: params.request_retention,
            maximum_interval: params.maximum_interval,
            learning_steps: learning_steps.or_default(DEFAULT_LEARNING_STEP_MINUTES),
            relearning_steps: relearning_steps.or_default(DEFAULT_RELEARNING_STEP_MINUTES),
        })
    }

    pub fn variant(&self) -> FsrsVariant {
        self.variant
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    fn layout(&self) -> &'static WeightLayout {
        self.variant.layout()
    }

    /// Whole days between the last review and `now` (0 if never reviewed)
    pub fn days_since_review(&self, last_review: &Option<DateTime<Utc>>, now: DateTime<Utc>) -> i64 {
        last_review
            .map(|last| (now - last).num_days().max(0))
            .unwrap_or(0)
    }

    /// Current probability of recall, for display
    pub fn current_retrievability(&self, state: &FSRSState, now: DateTime<Utc>) -> f64 {
        if state.state == LearningState::New {
            return 0.0;
        }
        let elapsed = match state.last_review {
            Some(last) => ((now - last).num_seconds().max(0) as f64) / 86_400.0,
            None => 0.0,
        };
        retrievability(&self.weights, self.layout(), elapsed, state.stability)
    }

    /// Apply a single rating
    pub fn review(&self, state: &FSRSState, rating: Rating, now: DateTime<Utc>) -> ReviewResult {
        self.preview(state, now).into_result(rating)
    }

    /// Compute the outcome of every rating in one call
    pub fn preview(&self, state: &FSRSState, now: DateTime<Utc>) -> PreviewResults {
        let elapsed_days = self.days_since_review(&state.last_review, now);
        let r = match state.state {
            LearningState::New => 0.0,
            _ => retrievability(
                &self.weights,
                self.layout(),
                elapsed_days as f64,
                state.stability,
            ),
        };

        let [again, hard, mut good, mut easy] =
            Rating::ALL.map(|rating| self.transition(state, rating, elapsed_days, r, now));

        // Longer intervals for better ratings, where each lands in Review
        self.ensure_longer(&mut good, &hard, now);
        self.ensure_longer(&mut easy, &good, now);

        PreviewResults {
            again,
            hard,
            good,
            easy,
        }
    }

    fn ensure_longer(&self, result: &mut ReviewResult, shorter: &ReviewResult, now: DateTime<Utc>) {
        let both_review = result.state.state == LearningState::Review
            && shorter.state.state == LearningState::Review;
        if !both_review || result.interval > shorter.interval {
            return;
        }
        let interval = clamp_interval((shorter.interval + 1) as f64, self.maximum_interval);
        let due = after_days(now, interval);
        result.interval = interval;
        result.state.scheduled_days = interval;
        result.state.due = Some(due);
        result.due = due;
    }

    fn transition(
        &self,
        state: &FSRSState,
        rating: Rating,
        elapsed_days: i64,
        r: f64,
        now: DateTime<Utc>,
    ) -> ReviewResult {
        let w = &self.weights;
        let layout = self.layout();

        let mut next = state.clone();
        next.last_review = Some(now);
        next.elapsed_days = elapsed_days;

        match state.state {
            LearningState::New => {
                // Provisional seed; graduation from Learning reseeds
                next.reps = 0;
                next.lapses = 0;
                next.state = LearningState::Learning;
                next.learning_step_index = 0;
                next.stability = initial_stability(w, layout, rating);
                next.difficulty = initial_difficulty(w, layout, rating);
                self.apply_steps(next, rating, r, now)
            }
            LearningState::Learning | LearningState::Relearning => {
                self.apply_steps(next, rating, r, now)
            }
            LearningState::Review => {
                let d = state.difficulty.clamp(algorithm::MIN_DIFFICULTY, algorithm::MAX_DIFFICULTY);
                next.reps = state.reps + 1;
                next.difficulty = next_difficulty(w, layout, d, rating);

                if rating == Rating::Again {
                    next.lapses = state.lapses + 1;
                    next.stability = forget_stability(w, layout, d, state.stability, r);
                    next.state = LearningState::Relearning;
                    let first = self.relearning_steps[0];
                    next.learning_step_index = 0;
                    return self.on_step(next, first, r, now);
                }

                next.stability = if elapsed_days == 0 {
                    same_day_stability(w, layout, state.stability.max(algorithm::MIN_STABILITY), rating)
                } else {
                    recall_stability(w, layout, d, state.stability, r, rating)
                };
                self.on_review(next, r, now)
            }
        }
    }

    fn apply_steps(&self, mut next: FSRSState, rating: Rating, r: f64, now: DateTime<Utc>) -> ReviewResult {
        let steps = match next.state {
            LearningState::Relearning => &self.relearning_steps,
            _ => &self.learning_steps,
        };

        match step_outcome(steps, next.learning_step_index, rating) {
            StepOutcome::Stay {
                index,
                delay_minutes,
            } => {
                next.learning_step_index = index;
                self.on_step(next, delay_minutes, r, now)
            }
            StepOutcome::Graduate => {
                if next.state == LearningState::Learning {
                    let w = &self.weights;
                    next.difficulty = initial_difficulty(w, self.layout(), rating);
                    next.stability = initial_stability(w, self.layout(), rating);
                    next.reps = 1;
                }
                next.learning_step_index = 0;
                self.on_review(next, r, now)
            }
        }
    }

    fn on_step(&self, mut next: FSRSState, delay_minutes: u32, r: f64, now: DateTime<Utc>) -> ReviewResult {
        let due = after_minutes(now, delay_minutes as i64);
        next.scheduled_days = 0;
        next.due = Some(due);
        ReviewResult {
            elapsed_days: next.elapsed_days,
            state: next,
            retrievability: r,
            interval: 0,
            due,
        }
    }

    fn on_review(&self, mut next: FSRSState, r: f64, now: DateTime<Utc>) -> ReviewResult {
        let interval = algorithm::next_interval(
            &self.weights,
            self.layout(),
            next.stability,
            self.request_retention,
            self.maximum_interval,
        );
        let due = after_days(now, interval);
        next.state = LearningState::Review;
        next.scheduled_days = interval;
        next.due = Some(due);
        ReviewResult {
            elapsed_days: next.elapsed_days,
            state: next,
            retrievability: r,
            interval,
            due,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
