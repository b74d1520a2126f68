//! Review Facade
//!
//! Picks the memory model named by the effective settings and applies ratings
//! to the matching scheduling slot. Other slots are never read or written.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::card::{CardPhase, Item, Rating, ReviewLog, SchedulingRecord, SlotSnapshot};
use crate::fsrs::{FSRSScheduler, FSRSState};
use crate::settings::{Algorithm, ConfigError, LeechAction, Settings};
use crate::sm2::{Sm2Scheduler, Sm2State};

#[derive(Debug, Clone)]
enum Model {
    Fsrs(FSRSScheduler),
    Sm2(Sm2Scheduler),
}

/// Scheduler for one settings record
#[derive(Debug, Clone)]
pub struct CardScheduler {
    algorithm: Algorithm,
    model: Model,
    leech_threshold: u32,
    leech_action: LeechAction,
}

/// Predicted result of one rating
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingOutcome {
    pub rating: Rating,
    pub phase: CardPhase,
    pub due: DateTime<Utc>,
    /// Whole days until due (0 while on a learning step)
    pub interval_days: i64,
    /// Recall probability at review time (FSRS only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retrievability: Option<f64>,
}

/// Outcomes for Again, Hard, Good and Easy, in that order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingOutcomes(pub [RatingOutcome; 4]);

impl RatingOutcomes {
    pub fn get(&self, rating: Rating) -> &RatingOutcome {
        &self.0[(rating.as_i32() - 1) as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = &RatingOutcome> {
        self.0.iter()
    }
}

/// Lapse count reached the configured threshold on this review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeechNotice {
    pub lapses: u32,
    pub action: LeechAction,
}

/// Result of applying a rating
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewOutcome {
    /// The item's record with only the active slot replaced
    pub record: SchedulingRecord,
    pub log: ReviewLog,
    pub leech: Option<LeechNotice>,
}

impl CardScheduler {
    /// Build the scheduler for the settings' algorithm
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let model = match settings.algorithm.fsrs_variant() {
            Some(variant) => Model::Fsrs(FSRSScheduler::new(
                variant,
                settings.fsrs_parameters(variant),
                &settings.learning_steps,
                &settings.relearning_steps,
            )?),
            None => Model::Sm2(Sm2Scheduler::new(
                &settings.sm2,
                &settings.learning_steps,
                &settings.relearning_steps,
            )?),
        };
        Ok(Self {
            algorithm: settings.algorithm,
            model,
            leech_threshold: settings.leech_threshold,
            leech_action: settings.leech_action,
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    fn fsrs_state(&self, item: &Item) -> FSRSState {
        item.scheduling
            .fsrs_slot(self.algorithm)
            .cloned()
            .unwrap_or_default()
    }

    fn sm2_state(&self, item: &Item) -> Sm2State {
        item.scheduling.sm2.clone().unwrap_or_default()
    }

    /// Outcome of every rating, without changing the item
    pub fn preview(&self, item: &Item, now: DateTime<Utc>) -> RatingOutcomes {
        let outcomes = match &self.model {
            Model::Fsrs(scheduler) => {
                let preview = scheduler.preview(&self.fsrs_state(item), now);
                Rating::ALL.map(|rating| {
                    let result = preview.get(rating);
                    RatingOutcome {
                        rating,
                        phase: result.state.state.into(),
                        due: result.due,
                        interval_days: result.interval,
                        retrievability: Some(result.retrievability),
                    }
                })
            }
            Model::Sm2(scheduler) => {
                let preview = scheduler.preview(&self.sm2_state(item), now);
                Rating::ALL.map(|rating| {
                    let result = preview.get(rating);
                    RatingOutcome {
                        rating,
                        phase: result.state.state.into(),
                        due: result.due,
                        interval_days: result.interval,
                        retrievability: None,
                    }
                })
            }
        };
        RatingOutcomes(outcomes)
    }

    /// Current recall probability (FSRS only)
    pub fn current_retrievability(&self, item: &Item, now: DateTime<Utc>) -> Option<f64> {
        match &self.model {
            Model::Fsrs(scheduler) => {
                Some(scheduler.current_retrievability(&self.fsrs_state(item), now))
            }
            Model::Sm2(_) => None,
        }
    }

    /// Apply a rating and produce the updated record, its log entry, and any
    /// leech notice
    pub fn review(
        &self,
        item: &Item,
        rating: Rating,
        now: DateTime<Utc>,
        duration_ms: Option<u64>,
    ) -> ReviewOutcome {
        let mut record = item.scheduling.clone();

        let (prior, prior_lapses, lapses, elapsed_days, scheduled_days) = match &self.model {
            Model::Fsrs(scheduler) => {
                let state = self.fsrs_state(item);
                let result = scheduler.review(&state, rating, now);
                let lapses = result.state.lapses;
                let scheduled = result.state.scheduled_days;
                let elapsed = result.elapsed_days;
                let prior_lapses = state.lapses;
                record.set_fsrs_slot(self.algorithm, result.state);
                (SlotSnapshot::Fsrs(state), prior_lapses, lapses, elapsed, scheduled)
            }
            Model::Sm2(scheduler) => {
                let state = self.sm2_state(item);
                let result = scheduler.review(&state, rating, now);
                let lapses = result.state.lapses;
                let scheduled = result.interval;
                let elapsed = result.elapsed_days;
                let prior_lapses = state.lapses;
                record.sm2 = Some(result.state);
                (SlotSnapshot::Sm2(state), prior_lapses, lapses, elapsed, scheduled)
            }
        };

        let leech = self.leech_notice(prior_lapses, lapses);
        if let Some(notice) = &leech {
            tracing::info!(item = %item.id, lapses = notice.lapses, "Item reached leech threshold");
        }

        ReviewOutcome {
            record,
            log: ReviewLog {
                item_id: item.id.clone(),
                rating,
                prior,
                elapsed_days,
                scheduled_days,
                reviewed_at: now,
                duration_ms,
            },
            leech,
        }
    }

    fn leech_notice(&self, before: u32, after: u32) -> Option<LeechNotice> {
        let threshold = self.leech_threshold;
        (threshold > 0 && before < threshold && after >= threshold).then_some(LeechNotice {
            lapses: after,
            action: self.leech_action,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
