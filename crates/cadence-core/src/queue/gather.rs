//! Recursive budgeted gathering across a deck subtree

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use super::{IntroducedToday, QueueKind, QueuedItem};
use crate::card::{Deck, DeckTree, Item};
use crate::counts::{DueClass, classify};
use crate::settings::{NewGatherOrder, Settings, resolve};

/// Remaining (or consumed) new and review slots
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Budget {
    pub new: usize,
    pub review: usize,
}

impl Budget {
    pub fn minus(self, used: Budget) -> Budget {
        Budget {
            new: self.new.saturating_sub(used.new),
            review: self.review.saturating_sub(used.review),
        }
    }
}

/// Items collected by one build, per category, in gathering order
#[derive(Debug, Default)]
pub(crate) struct Gathered {
    pub learning: Vec<QueuedItem>,
    /// Reviews and interday learning items
    pub review: Vec<QueuedItem>,
    pub new: Vec<QueuedItem>,
}

pub(crate) struct Gatherer<'t, 'a, 'r> {
    tree: &'t DeckTree<'a>,
    global: &'t Settings,
    now: DateTime<Utc>,
    introduced: &'t IntroducedToday,
    rng: &'r mut ChaCha8Rng,
    seen_items: HashSet<String>,
    seen_families: HashSet<String>,
    next_index: usize,
    out: Gathered,
}

impl<'t, 'a, 'r> Gatherer<'t, 'a, 'r> {
    pub fn new(
        tree: &'t DeckTree<'a>,
        global: &'t Settings,
        now: DateTime<Utc>,
        introduced: &'t IntroducedToday,
        rng: &'r mut ChaCha8Rng,
    ) -> Self {
        Self {
            tree,
            global,
            now,
            introduced,
            rng,
            seen_items: HashSet::new(),
            seen_families: HashSet::new(),
            next_index: 0,
            out: Gathered::default(),
        }
    }

    pub fn finish(self) -> Gathered {
        self.out
    }

    /// Gather a deck and its descendants within `parent`; returns what was used
    pub fn gather(&mut self, deck: &Deck, parent: Budget) -> Budget {
        let tree = self.tree;
        let global = self.global;
        let settings = resolve(&deck.id, tree, global).settings;
        let introduced = self.introduced.len();

        let start = Budget {
            new: parent
                .new
                .min((settings.new_per_day as usize).saturating_sub(introduced)),
            review: parent.review.min(settings.max_reviews_per_day as usize),
        };
        let mut left = start;

        self.collect_learning(deck, settings);

        // Reviews and interday learning, earliest due first
        let mut due: Vec<(&Item, DueClass)> = deck
            .items
            .iter()
            .filter_map(|item| match classify(item, settings, self.now) {
                Some(class @ (DueClass::Review | DueClass::InterdayLearning)) => Some((item, class)),
                _ => None,
            })
            .collect();
        due.sort_by_key(|(item, _)| item.scheduling.view(settings.algorithm).due);

        for (item, class) in due {
            if left.review == 0 {
                break;
            }
            let (kind, bury) = match class {
                DueClass::InterdayLearning => {
                    (QueueKind::InterdayLearning, settings.bury_interday_learning)
                }
                _ => (QueueKind::Review, settings.bury_reviews),
            };
            if self.admit(item, deck, kind, bury, settings) {
                left.review -= 1;
            }
        }

        if left.review > 0 || global.new_cards_ignore_review_limit {
            let mut fresh: Vec<&Item> = deck
                .items
                .iter()
                .filter(|item| classify(item, settings, self.now) == Some(DueClass::New))
                .filter(|item| !self.introduced.contains(&item.id))
                .collect();
            self.pre_order_new(&mut fresh, settings.new_gather_order);

            for item in fresh {
                if left.new == 0 {
                    break;
                }
                if self.admit(item, deck, QueueKind::New, settings.bury_new, settings) {
                    left.new -= 1;
                }
            }
        }

        tracing::debug!(
            deck = %deck.id,
            new_left = left.new,
            review_left = left.review,
            "Gathered deck"
        );

        for child in &deck.children {
            let alive = left.review > 0 || (global.new_cards_ignore_review_limit && left.new > 0);
            if alive {
                let used = self.gather(child, left);
                left = left.minus(used);
            } else {
                self.gather_learning_only(child);
            }
        }

        Budget {
            new: start.new - left.new,
            review: start.review - left.review,
        }
    }

    /// Descend without budgets, picking up learning items only
    fn gather_learning_only(&mut self, deck: &Deck) {
        let settings = resolve(&deck.id, self.tree, self.global).settings;
        self.collect_learning(deck, settings);
        for child in &deck.children {
            self.gather_learning_only(child);
        }
    }

    fn collect_learning(&mut self, deck: &Deck, settings: &Settings) {
        for item in &deck.items {
            if classify(item, settings, self.now) == Some(DueClass::Learning) {
                self.admit(item, deck, QueueKind::Learning, false, settings);
            }
        }
    }

    fn pre_order_new(&mut self, items: &mut [&Item], order: NewGatherOrder) {
        match order {
            NewGatherOrder::DeckOrder => {}
            NewGatherOrder::AscendingPosition => items.sort_by_key(|i| i.new_card_order),
            NewGatherOrder::DescendingPosition => {
                items.sort_by_key(|i| std::cmp::Reverse(i.new_card_order))
            }
            NewGatherOrder::Random => items.shuffle(&mut *self.rng),
        }
    }

    /// Record an item unless it was already gathered or its family is buried.
    ///
    /// Returns whether the item was kept.
    fn admit(
        &mut self,
        item: &Item,
        deck: &Deck,
        kind: QueueKind,
        bury: bool,
        settings: &Settings,
    ) -> bool {
        if self.seen_items.contains(&item.id) {
            return false;
        }
        let family = item.family_key();
        if bury && self.seen_families.contains(family) {
            tracing::debug!(item = %item.id, family, "Burying sibling");
            return false;
        }

        let view = item.scheduling.view(settings.algorithm);
        self.seen_items.insert(item.id.clone());
        self.seen_families.insert(family.to_string());
        let target = match kind {
            QueueKind::Learning => &mut self.out.learning,
            QueueKind::Review | QueueKind::InterdayLearning => &mut self.out.review,
            QueueKind::New => &mut self.out.new,
        };
        target.push(QueuedItem {
            item_id: item.id.clone(),
            deck_id: deck.id.clone(),
            kind,
            item_kind: item.kind,
            due: view.due,
            interval_days: view.interval_days,
            new_card_order: item.new_card_order,
            gather_index: self.next_index,
        });
        self.next_index += 1;
        true
    }
}
