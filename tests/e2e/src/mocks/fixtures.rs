//! Test Data Factory
//!
//! Provides utilities for generating realistic study collections:
//! - Items in every scheduling phase
//! - Note families for sibling burying
//! - Deck trees with overrides
//! - Seeded random forests for property tests

use cadence_core::fsrs::{FSRSState, LearningState};
use cadence_core::{Algorithm, Deck, Item, ItemKind, Rating, Settings};
use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Factory for creating test data
///
/// # Example
///
/// ```rust,ignore
/// let now = TestDataFactory::epoch();
/// let deck = TestDataFactory::deck("spanish", vec![
///     TestDataFactory::new_item("a", 0),
///     TestDataFactory::review_item("b", now - Duration::days(1)),
/// ]);
/// ```
pub struct TestDataFactory;

/// Configuration for random forest generation
#[derive(Debug, Clone)]
pub struct ForestConfig {
    /// Top-level decks
    pub roots: usize,
    /// Children under each root
    pub children_per_root: usize,
    /// Items in every deck
    pub items_per_deck: usize,
    /// Items sharing one family id
    pub family_size: usize,
    /// Chance that a child deck carries its own settings
    pub override_chance: f64,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            roots: 3,
            children_per_root: 3,
            items_per_deck: 20,
            family_size: 2,
            override_chance: 0.3,
            seed: 1,
        }
    }
}

impl TestDataFactory {
    /// Fixed reference time for every scenario
    pub fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 9, 14, 9, 0, 0).unwrap()
    }

    // ========================================================================
    // ITEMS
    // ========================================================================

    /// Never-reviewed item
    pub fn new_item(id: &str, order: u64) -> Item {
        let mut item = Item::with_id(id);
        item.new_card_order = order;
        item.content = serde_json::json!({ "front": id, "back": format!("{id} answer") });
        item
    }

    /// FSRS-6 review item due at `due`
    pub fn review_item(id: &str, due: DateTime<Utc>) -> Item {
        Self::review_item_for(id, Algorithm::Fsrs6, due, 10.0)
    }

    /// Review item in the slot of an FSRS algorithm
    pub fn review_item_for(id: &str, algorithm: Algorithm, due: DateTime<Utc>, stability: f64) -> Item {
        let mut item = Item::with_id(id);
        let days = stability.round().max(1.0) as i64;
        let state = FSRSState {
            state: LearningState::Review,
            stability,
            difficulty: 5.0,
            due: Some(due),
            last_review: Some(due - Duration::days(days)),
            scheduled_days: days,
            reps: 3,
            ..Default::default()
        };
        item.scheduling.set_fsrs_slot(algorithm, state);
        item
    }

    /// FSRS-6 learning item due at `due`
    pub fn learning_item(id: &str, due: DateTime<Utc>) -> Item {
        let mut item = Item::with_id(id);
        item.scheduling.fsrs6 = Some(FSRSState {
            state: LearningState::Learning,
            stability: 2.3,
            difficulty: 5.0,
            due: Some(due),
            last_review: Some(due - Duration::minutes(1)),
            learning_step_index: 0,
            ..Default::default()
        });
        item
    }

    /// `count` new items sharing one family
    pub fn family(prefix: &str, family_id: &str, count: usize) -> Vec<Item> {
        (0..count)
            .map(|i| {
                let mut item = Self::new_item(&format!("{prefix}-{i}"), i as u64);
                item.family_id = Some(family_id.to_string());
                item
            })
            .collect()
    }

    // ========================================================================
    // DECKS
    // ========================================================================

    pub fn deck(id: &str, items: Vec<Item>) -> Deck {
        let mut deck = Deck::new(id, Self::deck_name(id));
        deck.items = items;
        deck
    }

    /// Deck carrying an active override
    pub fn deck_with_settings(id: &str, items: Vec<Item>, settings: Settings) -> Deck {
        let mut deck = Self::deck(id, items);
        deck.has_custom_settings = true;
        deck.custom_settings = Some(settings);
        deck
    }

    /// Last `::` segment, capitalised
    fn deck_name(id: &str) -> String {
        let last = id.rsplit("::").next().unwrap_or(id);
        let mut chars = last.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    // ========================================================================
    // RANDOM DATA
    // ========================================================================

    /// Seeded forest with items in every phase, families and overrides
    pub fn random_forest(config: &ForestConfig, now: DateTime<Utc>) -> Vec<Deck> {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut order = 0u64;

        let mut make_items = |rng: &mut ChaCha8Rng, deck_id: &str| -> Vec<Item> {
            (0..config.items_per_deck)
                .map(|i| {
                    let id = format!("{deck_id}/{i}");
                    let mut item = match rng.gen_range(0..10) {
                        0..=3 => Self::new_item(&id, order),
                        4..=7 => {
                            let overdue = rng.gen_range(-3..10);
                            let stability = rng.gen_range(1.0..60.0);
                            let due = now - Duration::days(overdue);
                            Self::review_item_for(&id, Algorithm::Fsrs6, due, stability)
                        }
                        _ => Self::learning_item(&id, now + Duration::minutes(rng.gen_range(-30..600))),
                    };
                    item.new_card_order = order;
                    order += 1;
                    if config.family_size > 1 {
                        item.family_id = Some(format!("{deck_id}/fam{}", i / config.family_size));
                    }
                    if rng.gen_bool(0.1) {
                        item.kind = ItemKind::MultipleChoice;
                    }
                    if rng.gen_bool(0.05) {
                        item.suspended = true;
                    }
                    item
                })
                .collect()
        };

        (0..config.roots)
            .map(|r| {
                let root_id = format!("root{r}");
                let mut root = Self::deck(&root_id, make_items(&mut rng, &root_id));
                root.children = (0..config.children_per_root)
                    .map(|c| {
                        let child_id = format!("{root_id}::child{c}");
                        let items = make_items(&mut rng, &child_id);
                        if rng.gen_bool(config.override_chance) {
                            let settings = Settings {
                                new_per_day: rng.gen_range(0..15),
                                max_reviews_per_day: rng.gen_range(0..30),
                                bury_new: rng.gen_bool(0.5),
                                bury_reviews: rng.gen_bool(0.5),
                                ..Default::default()
                            };
                            Self::deck_with_settings(&child_id, items, settings)
                        } else {
                            Self::deck(&child_id, items)
                        }
                    })
                    .collect();
                root
            })
            .collect()
    }

    /// Seeded rating sequence
    pub fn rating_sequence(seed: u64, len: usize) -> Vec<Rating> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..len)
            .map(|_| Rating::ALL[rng.gen_range(0..Rating::ALL.len())])
            .collect()
    }
}
