//! Custom Study
//!
//! Filtered one-off item lists that ignore daily quotas. Ratings given during
//! custom study still go through the regular [`crate::review::CardScheduler`].

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::card::{CardPhase, CardView, Deck, DeckTree};
use crate::settings::{Settings, resolve};

/// Phase filter for custom study
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum PhaseFilter {
    #[default]
    Any,
    New,
    /// Learning or Relearning, due or not
    Learning,
    /// Review items due at or before now
    ReviewDue,
}

impl PhaseFilter {
    fn matches(&self, view: &CardView, now: DateTime<Utc>) -> bool {
        match self {
            PhaseFilter::Any => true,
            PhaseFilter::New => view.is_new(),
            PhaseFilter::Learning => view.phase.is_learning(),
            PhaseFilter::ReviewDue => view.phase == CardPhase::Review && view.is_due_by(now),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomStudyFilter {
    /// Decks to draw from (with their subtrees); empty means every root
    pub deck_ids: Vec<String>,
    pub tag: Option<String>,
    pub phase: PhaseFilter,
    /// Items that lapsed and were last reviewed within this many days
    pub failed_within_days: Option<u32>,
    pub limit: Option<usize>,
    pub shuffle: bool,
}

/// Item ids matching `filter`, in deck order unless shuffled
pub fn select(
    tree: &DeckTree<'_>,
    filter: &CustomStudyFilter,
    now: DateTime<Utc>,
    global: &Settings,
    rng_seed: u64,
) -> Vec<String> {
    let roots: Vec<&Deck> = if filter.deck_ids.is_empty() {
        tree.roots().iter().collect()
    } else {
        filter
            .deck_ids
            .iter()
            .filter_map(|id| {
                let deck = tree.get(id);
                if deck.is_none() {
                    tracing::warn!(deck = %id, "Custom study deck not found; skipping");
                }
                deck
            })
            .collect()
    };

    let mut seen = HashSet::new();
    let mut picked = Vec::new();
    for deck in roots {
        collect(deck, tree, filter, now, global, &mut seen, &mut picked);
    }

    if filter.shuffle {
        picked.shuffle(&mut ChaCha8Rng::seed_from_u64(rng_seed));
    }
    if let Some(limit) = filter.limit {
        picked.truncate(limit);
    }
    picked
}

fn collect(
    deck: &Deck,
    tree: &DeckTree<'_>,
    filter: &CustomStudyFilter,
    now: DateTime<Utc>,
    global: &Settings,
    seen: &mut HashSet<String>,
    out: &mut Vec<String>,
) {
    let settings = resolve(&deck.id, tree, global).settings;
    for item in &deck.items {
        if item.suspended || seen.contains(&item.id) {
            continue;
        }
        if let Some(tag) = &filter.tag {
            if !item.has_tag(tag) {
                continue;
            }
        }
        let view = item.scheduling.view(settings.algorithm);
        if !filter.phase.matches(&view, now) {
            continue;
        }
        if let Some(days) = filter.failed_within_days {
            if !recently_failed(&view, days, now) {
                continue;
            }
        }
        seen.insert(item.id.clone());
        out.push(item.id.clone());
    }
    for child in &deck.children {
        collect(child, tree, filter, now, global, seen, out);
    }
}

/// Relearning, or back in Learning after a lapse, with a review in the window
fn recently_failed(view: &CardView, days: u32, now: DateTime<Utc>) -> bool {
    let lapsed = view.phase == CardPhase::Relearning
        || (view.phase == CardPhase::Learning && view.lapses > 0);
    let recent = view
        .last_review
        .is_some_and(|last| now - last <= Duration::days(days as i64));
    lapsed && recent
}
