//! Settings Module
//!
//! One monolithic [`Settings`] record serves as both the global default and
//! every deck override. Overrides replace inherited settings wholesale; see
//! [`resolve`] for the ancestor walk.

mod load;
mod resolver;

pub use load::{ConfigError, load_settings};
pub use resolver::{ResolvedSettings, SettingsSource, resolve};

use serde::{Deserialize, Serialize};

use crate::fsrs::{FSRSParameters, FsrsVariant};
use crate::sm2::Sm2Parameters;
use crate::steps::{MINUTES_PER_DAY, StepList};

// ============================================================================
// ENUMS
// ============================================================================

/// Memory model used to schedule items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Algorithm {
    #[serde(rename = "fsrs-4.5")]
    Fsrs45,
    #[default]
    #[serde(rename = "fsrs-6")]
    Fsrs6,
    #[serde(rename = "sm2")]
    Sm2,
}

impl Algorithm {
    /// FSRS generation, or `None` for SM-2
    pub fn fsrs_variant(&self) -> Option<FsrsVariant> {
        match self {
            Algorithm::Fsrs45 => Some(FsrsVariant::Fsrs45),
            Algorithm::Fsrs6 => Some(FsrsVariant::Fsrs6),
            Algorithm::Sm2 => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Fsrs45 => "fsrs-4.5",
            Algorithm::Fsrs6 => "fsrs-6",
            Algorithm::Sm2 => "sm2",
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the caller should do once an item reaches the leech threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum LeechAction {
    #[default]
    Tag,
    Suspend,
}

/// Order in which new items are pulled from decks before truncation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum NewGatherOrder {
    /// Deck item order
    #[default]
    DeckOrder,
    /// Lowest `new_card_order` first
    AscendingPosition,
    /// Highest `new_card_order` first
    DescendingPosition,
    Random,
}

/// Secondary pass over gathered new items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum NewSortOrder {
    #[default]
    Gathered,
    TypeThenGathered,
    TypeThenRandom,
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ReviewSortOrder {
    /// Due date, ties shuffled
    #[default]
    DueThenRandom,
    /// Due date, ties by deck then item position
    DueThenDeck,
    /// Most overdue relative to its interval first
    OverdueFirst,
}

/// How new and review items are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum NewReviewMix {
    #[default]
    InterleavedRandom,
    ReviewsFirst,
    NewFirst,
}

// ============================================================================
// SETTINGS
// ============================================================================

/// Scheduling and queue settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub algorithm: Algorithm,
    pub fsrs45: FSRSParameters,
    pub fsrs6: FSRSParameters,
    pub sm2: Sm2Parameters,

    pub learning_steps: StepList,
    pub relearning_steps: StepList,

    pub new_per_day: u32,
    pub max_reviews_per_day: u32,

    pub leech_threshold: u32,
    pub leech_action: LeechAction,

    pub new_gather_order: NewGatherOrder,
    pub new_sort_order: NewSortOrder,
    pub review_sort_order: ReviewSortOrder,
    pub new_review_mix: NewReviewMix,

    pub bury_new: bool,
    pub bury_reviews: bool,
    pub bury_interday_learning: bool,

    /// Keep gathering new items after the review budget runs out
    pub new_cards_ignore_review_limit: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            fsrs45: FSRSParameters::default(),
            fsrs6: FSRSParameters::default(),
            sm2: Sm2Parameters::default(),
            learning_steps: StepList::from_minutes(vec![1, 10]),
            relearning_steps: StepList::from_minutes(vec![10]),
            new_per_day: 20,
            max_reviews_per_day: 200,
            leech_threshold: 8,
            leech_action: LeechAction::Tag,
            new_gather_order: NewGatherOrder::default(),
            new_sort_order: NewSortOrder::default(),
            review_sort_order: ReviewSortOrder::default(),
            new_review_mix: NewReviewMix::default(),
            bury_new: false,
            bury_reviews: false,
            bury_interday_learning: false,
            new_cards_ignore_review_limit: false,
        }
    }
}

impl Settings {
    /// Validate every parameter set, not only the active one, so switching
    /// algorithms can never surface a latent error
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.fsrs45.validate(FsrsVariant::Fsrs45)?;
        self.fsrs6.validate(FsrsVariant::Fsrs6)?;
        self.sm2.validate()?;
        Ok(())
    }

    /// FSRS parameters for a generation
    pub fn fsrs_parameters(&self, variant: FsrsVariant) -> &FSRSParameters {
        match variant {
            FsrsVariant::Fsrs45 => &self.fsrs45,
            FsrsVariant::Fsrs6 => &self.fsrs6,
        }
    }

    /// Whether a learning step index refers to a step of a day or longer
    pub fn is_interday_step(&self, relearning: bool, step_index: u32) -> bool {
        let steps = if relearning {
            &self.relearning_steps
        } else {
            &self.learning_steps
        };
        steps
            .minutes()
            .get(step_index as usize)
            .is_some_and(|m| *m >= MINUTES_PER_DAY)
    }
}
