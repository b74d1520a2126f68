//! Due Counter
//!
//! New / Learning / Review tallies for a deck subtree. Each deck is counted
//! under its own resolved settings, so a subtree that switches algorithm is
//! read from the right scheduling slot.

use std::ops::{Add, AddAssign};

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::Serialize;

use crate::card::{CardPhase, Deck, DeckTree, Item};
use crate::settings::{Algorithm, Settings, resolve};

/// Start of the next UTC day; learning items due before it count as today's
pub fn end_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    (now.date_naive().and_time(NaiveTime::MIN) + Duration::days(1)).and_utc()
}

/// Due category of a single item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DueClass {
    New,
    /// Intraday Learning or Relearning, due today
    Learning,
    /// SM-2 learning item on a step of a day or more, due now
    InterdayLearning,
    Review,
}

/// Classify an item under the given settings.
///
/// Returns `None` for suspended items and for items not yet due.
pub fn classify(item: &Item, settings: &Settings, now: DateTime<Utc>) -> Option<DueClass> {
    if item.suspended {
        return None;
    }
    let view = item.scheduling.view(settings.algorithm);
    match view.phase {
        CardPhase::New => Some(DueClass::New),
        CardPhase::Learning | CardPhase::Relearning => {
            let relearning = view.phase == CardPhase::Relearning;
            if settings.algorithm == Algorithm::Sm2
                && settings.is_interday_step(relearning, view.step_index)
            {
                view.is_due_by(now).then_some(DueClass::InterdayLearning)
            } else {
                let due_today = view.due.map(|d| d < end_of_day(now)).unwrap_or(true);
                due_today.then_some(DueClass::Learning)
            }
        }
        CardPhase::Review => view.is_due_by(now).then_some(DueClass::Review),
    }
}

/// Badge counts for a deck
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DueCounts {
    pub new: usize,
    pub learning: usize,
    /// Due reviews, plus interday learning items
    pub review: usize,
}

impl DueCounts {
    fn record(&mut self, class: DueClass) {
        match class {
            DueClass::New => self.new += 1,
            DueClass::Learning => self.learning += 1,
            DueClass::InterdayLearning | DueClass::Review => self.review += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.new + self.learning + self.review
    }
}

impl Add for DueCounts {
    type Output = DueCounts;

    fn add(self, rhs: Self) -> Self::Output {
        DueCounts {
            new: self.new + rhs.new,
            learning: self.learning + rhs.learning,
            review: self.review + rhs.review,
        }
    }
}

impl AddAssign for DueCounts {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Counts for the deck's own items only
pub fn count_own(deck: &Deck, tree: &DeckTree<'_>, global: &Settings, now: DateTime<Utc>) -> DueCounts {
    let resolved = resolve(&deck.id, tree, global);
    let mut counts = DueCounts::default();
    for item in &deck.items {
        if let Some(class) = classify(item, resolved.settings, now) {
            counts.record(class);
        }
    }
    counts
}

/// Counts for a deck and all its descendants
pub fn count(deck: &Deck, tree: &DeckTree<'_>, global: &Settings, now: DateTime<Utc>) -> DueCounts {
    deck.children
        .iter()
        .fold(count_own(deck, tree, global, now), |acc, child| {
            acc + count(child, tree, global, now)
        })
}

/// Per-deck counts for a whole forest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckCountNode {
    pub deck_id: String,
    pub name: String,
    /// The deck's own items
    pub own: DueCounts,
    /// Own items plus every descendant
    pub total: DueCounts,
    pub children: Vec<DeckCountNode>,
}

/// Count every deck of the forest in one pass
pub fn count_tree(tree: &DeckTree<'_>, global: &Settings, now: DateTime<Utc>) -> Vec<DeckCountNode> {
    tree.roots()
        .iter()
        .map(|root| count_node(root, tree, global, now))
        .collect()
}

fn count_node(deck: &Deck, tree: &DeckTree<'_>, global: &Settings, now: DateTime<Utc>) -> DeckCountNode {
    let own = count_own(deck, tree, global, now);
    let children: Vec<DeckCountNode> = deck
        .children
        .iter()
        .map(|child| count_node(child, tree, global, now))
        .collect();
    let total = children.iter().fold(own, |acc, c| acc + c.total);
    DeckCountNode {
        deck_id: deck.id.clone(),
        name: deck.name.clone(),
        own,
        total,
        children,
    }
}

// ============================================================================
// TESTS
// ============================================================================
