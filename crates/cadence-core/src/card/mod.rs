//! Card module - Items, ratings and scheduling records
//!
//! An [`Item`] is a flashcard or question with opaque content. Its
//! [`SchedulingRecord`] carries one optional state slot per algorithm; the
//! engine only ever reads and writes the slot of the configured algorithm, so
//! switching algorithms leaves stale slots behind untouched.

mod deck;

pub use deck::{Deck, DeckTree};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fsrs::{FSRSState, LearningState};
use crate::settings::Algorithm;
use crate::sm2::{Sm2Phase, Sm2State};

// ============================================================================
// RATING
// ============================================================================

/// Learner's answer to a review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    /// Forgot the item
    Again = 1,
    /// Recalled with serious difficulty
    Hard = 2,
    /// Recalled after some hesitation
    Good = 3,
    /// Recalled effortlessly
    Easy = 4,
}

impl Rating {
    pub const ALL: [Rating; 4] = [Rating::Again, Rating::Hard, Rating::Good, Rating::Easy];

    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(Rating::Again),
            2 => Some(Rating::Hard),
            3 => Some(Rating::Good),
            4 => Some(Rating::Easy),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> i32 {
        *self as i32
    }

    pub fn as_f64(&self) -> f64 {
        self.as_i32() as f64
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Again => "again",
            Rating::Hard => "hard",
            Rating::Good => "good",
            Rating::Easy => "easy",
        }
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Rating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "again" | "1" => Ok(Rating::Again),
            "hard" | "2" => Ok(Rating::Hard),
            "good" | "3" => Ok(Rating::Good),
            "easy" | "4" => Ok(Rating::Easy),
            _ => Err(format!("Unknown rating: {}", s)),
        }
    }
}

// ============================================================================
// PHASES
// ============================================================================

/// Algorithm-independent lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CardPhase {
    #[default]
    New,
    Learning,
    Review,
    Relearning,
}

impl CardPhase {
    /// Learning or Relearning
    pub fn is_learning(&self) -> bool {
        matches!(self, CardPhase::Learning | CardPhase::Relearning)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CardPhase::New => "new",
            CardPhase::Learning => "learning",
            CardPhase::Review => "review",
            CardPhase::Relearning => "relearning",
        }
    }
}

impl std::fmt::Display for CardPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<LearningState> for CardPhase {
    fn from(state: LearningState) -> Self {
        match state {
            LearningState::New => CardPhase::New,
            LearningState::Learning => CardPhase::Learning,
            LearningState::Review => CardPhase::Review,
            LearningState::Relearning => CardPhase::Relearning,
        }
    }
}

impl From<Sm2Phase> for CardPhase {
    fn from(phase: Sm2Phase) -> Self {
        match phase {
            Sm2Phase::New => CardPhase::New,
            Sm2Phase::Learning => CardPhase::Learning,
            Sm2Phase::Review => CardPhase::Review,
            Sm2Phase::Relearning => CardPhase::Relearning,
        }
    }
}

// ============================================================================
// SCHEDULING RECORD
// ============================================================================

/// Per-algorithm scheduling state slots
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fsrs45: Option<FSRSState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fsrs6: Option<FSRSState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sm2: Option<Sm2State>,
}

impl SchedulingRecord {
    /// FSRS slot for an FSRS algorithm; `None` for SM-2 or an empty slot
    pub fn fsrs_slot(&self, algorithm: Algorithm) -> Option<&FSRSState> {
        match algorithm {
            Algorithm::Fsrs45 => self.fsrs45.as_ref(),
            Algorithm::Fsrs6 => self.fsrs6.as_ref(),
            Algorithm::Sm2 => None,
        }
    }

    /// Replace the FSRS slot belonging to `algorithm`
    pub fn set_fsrs_slot(&mut self, algorithm: Algorithm, state: FSRSState) {
        match algorithm {
            Algorithm::Fsrs45 => self.fsrs45 = Some(state),
            Algorithm::Fsrs6 => self.fsrs6 = Some(state),
            Algorithm::Sm2 => {}
        }
    }

    /// Algorithm-independent view of the active slot.
    ///
    /// A missing slot reads as a New card.
    pub fn view(&self, algorithm: Algorithm) -> CardView {
        match algorithm {
            Algorithm::Fsrs45 | Algorithm::Fsrs6 => self
                .fsrs_slot(algorithm)
                .map(CardView::from)
                .unwrap_or_default(),
            Algorithm::Sm2 => self.sm2.as_ref().map(CardView::from).unwrap_or_default(),
        }
    }
}

/// Snapshot of the fields the queue builder and counters care about
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CardView {
    pub phase: CardPhase,
    pub due: Option<DateTime<Utc>>,
    pub last_review: Option<DateTime<Utc>>,
    /// Current review interval in days (0 while unscheduled)
    pub interval_days: f64,
    pub step_index: u32,
    pub lapses: u32,
}

impl CardView {
    /// No prior review under the active algorithm
    pub fn is_new(&self) -> bool {
        self.phase == CardPhase::New
    }

    /// Due at or before `now`; an unscheduled card counts as due
    pub fn is_due_by(&self, now: DateTime<Utc>) -> bool {
        self.due.map(|d| d <= now).unwrap_or(true)
    }
}

impl From<&FSRSState> for CardView {
    fn from(state: &FSRSState) -> Self {
        Self {
            phase: state.state.into(),
            due: state.due,
            last_review: state.last_review,
            interval_days: state.scheduled_days as f64,
            step_index: state.learning_step_index,
            lapses: state.lapses,
        }
    }
}

impl From<&Sm2State> for CardView {
    fn from(state: &Sm2State) -> Self {
        Self {
            phase: state.state.into(),
            due: state.due,
            last_review: state.last_review,
            interval_days: state.interval_days as f64,
            step_index: state.learning_step_index,
            lapses: state.lapses,
        }
    }
}

// ============================================================================
// ITEM
// ============================================================================

/// Kind of study item; used by the "grouped by type" new-card sort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ItemKind {
    #[default]
    Flashcard,
    MultipleChoice,
}

/// A flashcard or question owned by exactly one deck
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    #[serde(default)]
    pub kind: ItemKind,
    /// Opaque to the engine
    #[serde(default)]
    pub content: serde_json::Value,
    /// Note family for sibling burying; `None` means the item stands alone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub suspended: bool,
    /// Insertion-order tie-break key
    #[serde(default)]
    pub new_card_order: u64,
    #[serde(default)]
    pub scheduling: SchedulingRecord,
}

impl Item {
    /// Create a new item with a fresh UUID and no scheduling history
    pub fn new(content: impl Into<serde_json::Value>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            content: content.into(),
            ..Default::default()
        }
    }

    /// Create an item with a caller-chosen id
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Burying key: the family id, or the item's own id
    pub fn family_key(&self) -> &str {
        self.family_id.as_deref().unwrap_or(&self.id)
    }

    /// Case-insensitive tag match
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

// ============================================================================
// REVIEW LOG
// ============================================================================

/// State of the active slot before a rating was applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "lowercase")]
pub enum SlotSnapshot {
    Fsrs(FSRSState),
    Sm2(Sm2State),
}

/// One immutable entry per rating event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLog {
    pub item_id: String,
    pub rating: Rating,
    pub prior: SlotSnapshot,
    pub elapsed_days: i64,
    pub scheduled_days: i64,
    pub reviewed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

// ============================================================================
// TESTS
// ============================================================================
