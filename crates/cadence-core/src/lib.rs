//! # Cadence Core
//!
//! Spaced-repetition scheduling engine and study-session queue builder.
//!
//! - **FSRS-4.5 / FSRS-6**: one difficulty/stability/retrievability model,
//!   parameterised by a named weight layout (17 or 21 weights)
//! - **SM-2**: classical easiness-factor scheduling
//! - **Learning steps**: minute-precision Learning and Relearning phases
//! - **Settings inheritance**: the nearest deck override wins, else the global default
//! - **Due counts**: New / Learning / Review badges per deck subtree
//! - **Session queues**: budgeted recursive gathering with sorting, sibling
//!   burying and new/review mixing, all driven by a seeded RNG
//!
//! Every function takes `now` explicitly; the engine never reads the clock and
//! never mutates the deck tree.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cadence_core::prelude::*;
//!
//! let decks: Vec<Deck> = load_from_somewhere();
//! let tree = DeckTree::new(&decks);
//! let global = Settings::default();
//!
//! // Build today's session
//! let request = SessionRequest::new(vec!["spanish".into()], now, 42);
//! let session = build(&request, &tree, &global);
//!
//! // Rate the first item under its deck's effective settings
//! let (item, deck) = tree.find_item(&session.items[0].item_id).unwrap();
//! let settings = resolve(&deck.id, &tree, &global).settings;
//! let outcome = CardScheduler::from_settings(settings)?.review(item, Rating::Good, now, None);
//! ```

#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod card;
pub mod counts;
pub mod custom_study;
pub mod fsrs;
pub mod queue;
pub mod review;
pub mod settings;
pub mod sm2;
pub mod steps;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use card::{
    CardPhase, CardView, Deck, DeckTree, Item, ItemKind, Rating, ReviewLog, SchedulingRecord,
    SlotSnapshot,
};

pub use counts::{DeckCountNode, DueClass, DueCounts, classify, count, count_tree};

pub use custom_study::{CustomStudyFilter, PhaseFilter};

pub use fsrs::{
    FSRSParameters, FSRSScheduler, FSRSState, FsrsVariant, LearningState, PreviewResults,
    ReviewResult, WeightLayout,
};

pub use queue::{
    Budget, IntroducedToday, QueueKind, QueuedItem, Session, SessionRequest, build,
};

pub use review::{CardScheduler, LeechNotice, RatingOutcome, RatingOutcomes, ReviewOutcome};

pub use settings::{
    Algorithm, ConfigError, LeechAction, NewGatherOrder, NewReviewMix, NewSortOrder,
    ResolvedSettings, ReviewSortOrder, Settings, SettingsSource, load_settings, resolve,
};

pub use sm2::{Sm2Parameters, Sm2Phase, Sm2Scheduler, Sm2State};

pub use steps::StepList;

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        Algorithm, CardScheduler, ConfigError, Deck, DeckTree, DueCounts, IntroducedToday, Item,
        Rating, Session, SessionRequest, Settings, build, count, resolve,
    };
}
