//! Study Simulator
//!
//! Drives a deck forest through reviews and sessions on a simulated clock:
//! - Ratings applied under each item's effective settings
//! - Records written back into the owning deck
//! - Introduced-today carried between session builds

use cadence_core::{
    Algorithm, CardScheduler, CardView, Deck, DeckTree, DueCounts, IntroducedToday, Item, Rating,
    ReviewLog, ReviewOutcome, Session, SessionRequest, Settings, build, count, resolve,
};
use chrono::{DateTime, Duration, Utc};

/// Simulated study collection
pub struct StudySimulator {
    pub decks: Vec<Deck>,
    pub global: Settings,
    pub now: DateTime<Utc>,
    pub introduced: IntroducedToday,
    pub log: Vec<ReviewLog>,
}

impl StudySimulator {
    pub fn new(decks: Vec<Deck>, global: Settings, now: DateTime<Utc>) -> Self {
        Self {
            decks,
            global,
            now,
            introduced: IntroducedToday::default(),
            log: Vec::new(),
        }
    }

    /// Move the clock forward
    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }

    /// Jump the clock to the item's current due time
    pub fn advance_to_due(&mut self, item_id: &str) {
        if let Some(due) = self.view(item_id).due {
            if due > self.now {
                self.now = due;
            }
        }
    }

    pub fn item(&self, item_id: &str) -> &Item {
        DeckTree::new(&self.decks)
            .find_item(item_id)
            .map(|(item, _)| item)
            .unwrap_or_else(|| panic!("item {item_id} not in forest"))
    }

    /// Algorithm in effect for the item's deck
    pub fn algorithm_for(&self, item_id: &str) -> Algorithm {
        self.settings_for(item_id).algorithm
    }

    /// Effective settings for the item's deck
    pub fn settings_for(&self, item_id: &str) -> Settings {
        let tree = DeckTree::new(&self.decks);
        let (_, deck) = tree
            .find_item(item_id)
            .unwrap_or_else(|| panic!("item {item_id} not in forest"));
        resolve(&deck.id, &tree, &self.global).settings.clone()
    }

    /// Scheduling view under the effective algorithm
    pub fn view(&self, item_id: &str) -> CardView {
        let algorithm = self.algorithm_for(item_id);
        self.item(item_id).scheduling.view(algorithm)
    }

    /// Rate an item now and write the new record back
    pub fn rate(&mut self, item_id: &str, rating: Rating) -> ReviewOutcome {
        let settings = self.settings_for(item_id);
        let scheduler = CardScheduler::from_settings(&settings).expect("valid settings");
        let outcome = scheduler.review(self.item(item_id), rating, self.now, None);

        let item = self
            .decks
            .iter_mut()
            .find_map(|deck| deck.find_item_mut(item_id))
            .expect("item exists");
        item.scheduling = outcome.record.clone();
        self.log.push(outcome.log.clone());
        outcome
    }

    /// Build a session and remember which new items it introduced
    pub fn session(&mut self, deck_ids: &[&str], seed: u64) -> Session {
        let request = SessionRequest::new(
            deck_ids.iter().map(|id| id.to_string()).collect(),
            self.now,
            seed,
        )
        .with_introduced(self.introduced.clone());
        let session = build(&request, &DeckTree::new(&self.decks), &self.global);
        self.introduced = session.introduced_today.clone();
        session
    }

    /// Subtree due counts for a deck
    pub fn counts(&self, deck_id: &str) -> DueCounts {
        let tree = DeckTree::new(&self.decks);
        let deck = tree
            .get(deck_id)
            .unwrap_or_else(|| panic!("deck {deck_id} not in forest"));
        count(deck, &tree, &self.global, self.now)
    }
}
