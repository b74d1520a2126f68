//! Session Queue Builder
//!
//! Turns a deck forest into the ordered list of items for one study sitting.
//!
//! 1. Daily budgets start from the global limits, minus new items already
//!    introduced today.
//! 2. Each requested deck is gathered recursively: learning items first
//!    (never budgeted), then due reviews, then new items, then children with
//!    whatever budget is left.
//! 3. New items, reviews and the two combined are ordered by the settings of
//!    the first requested deck; learning items lead the session.
//!
//! All randomness comes from a [`ChaCha8Rng`] seeded from the request, so the
//! same inputs always yield the same session.

mod gather;
mod order;

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::card::{DeckTree, ItemKind};
use crate::settings::{Settings, resolve};

pub use gather::Budget;

// ============================================================================
// TYPES
// ============================================================================

/// New items already shown on a calendar day (UTC)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntroducedToday {
    pub day: Option<NaiveDate>,
    #[serde(default)]
    pub item_ids: BTreeSet<String>,
}

impl IntroducedToday {
    pub fn new(day: NaiveDate) -> Self {
        Self {
            day: Some(day),
            item_ids: BTreeSet::new(),
        }
    }

    /// The set as seen at `now`: empty once the day has changed
    pub fn rolled_over(&self, now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        if self.day == Some(today) {
            self.clone()
        } else {
            Self::new(today)
        }
    }

    /// A copy with additional item ids
    pub fn with_items<'a>(&self, ids: impl IntoIterator<Item = &'a str>) -> Self {
        let mut next = self.clone();
        next.item_ids.extend(ids.into_iter().map(str::to_string));
        next
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.item_ids.contains(item_id)
    }

    pub fn len(&self) -> usize {
        self.item_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.item_ids.is_empty()
    }
}

/// Queue category of a session entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueueKind {
    Learning,
    Review,
    /// SM-2 learning item on an interday step; budgeted as a review
    InterdayLearning,
    New,
}

/// One entry of a built session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedItem {
    pub item_id: String,
    pub deck_id: String,
    pub kind: QueueKind,
    pub item_kind: ItemKind,
    pub due: Option<DateTime<Utc>>,
    pub interval_days: f64,
    pub new_card_order: u64,
    /// Position in gathering order; deck traversal then item order
    pub gather_index: usize,
}

/// Inputs for one session build
#[derive(Debug, Clone)]
pub struct SessionRequest {
    pub deck_ids: Vec<String>,
    pub now: DateTime<Utc>,
    pub seed: u64,
    pub introduced_today: IntroducedToday,
}

impl SessionRequest {
    pub fn new(deck_ids: Vec<String>, now: DateTime<Utc>, seed: u64) -> Self {
        Self {
            deck_ids,
            now,
            seed,
            introduced_today: IntroducedToday::new(now.date_naive()),
        }
    }

    pub fn with_introduced(mut self, introduced_today: IntroducedToday) -> Self {
        self.introduced_today = introduced_today;
        self
    }
}

/// An ordered session plus the updated introduced-today set
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub items: Vec<QueuedItem>,
    pub introduced_today: IntroducedToday,
}

impl Session {
    pub fn count(&self, kind: QueueKind) -> usize {
        self.items.iter().filter(|i| i.kind == kind).count()
    }

    pub fn item_ids(&self) -> Vec<&str> {
        self.items.iter().map(|i| i.item_id.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

// ============================================================================
// BUILD
// ============================================================================

/// Build a study session
pub fn build(request: &SessionRequest, tree: &DeckTree<'_>, global: &Settings) -> Session {
    let introduced = request.introduced_today.rolled_over(request.now);
    let mut rng = ChaCha8Rng::seed_from_u64(request.seed);

    let mut budget = Budget {
        new: (global.new_per_day as usize).saturating_sub(introduced.len()),
        review: global.max_reviews_per_day as usize,
    };
    tracing::debug!(
        new = budget.new,
        review = budget.review,
        introduced = introduced.len(),
        "Starting session build"
    );

    let mut gatherer = gather::Gatherer::new(tree, global, request.now, &introduced, &mut rng);
    for deck_id in &request.deck_ids {
        let Some(deck) = tree.get(deck_id) else {
            tracing::warn!(deck = %deck_id, "Requested deck not found; skipping");
            continue;
        };
        let used = gatherer.gather(deck, budget);
        budget = budget.minus(used);
    }
    let gathered = gatherer.finish();

    // Ordering follows the first requested deck that exists
    let order_settings = request
        .deck_ids
        .iter()
        .find(|id| tree.get(id).is_some())
        .map(|id| resolve(id, tree, global).settings)
        .unwrap_or(global);

    let items = order::arrange(gathered, order_settings, request.now, &mut rng);

    let introduced_today = introduced.with_items(
        items
            .iter()
            .filter(|i| i.kind == QueueKind::New)
            .map(|i| i.item_id.as_str()),
    );

    Session {
        items,
        introduced_today,
    }
}

// ============================================================================
// TESTS
// ============================================================================
