//! # Settings Inheritance Tests
//!
//! Nearest-ancestor override resolution and its effect on sessions and
//! scheduling.

use cadence_core::{
    Algorithm, DeckTree, QueueKind, Rating, SessionRequest, Settings, SettingsSource, build,
    resolve,
};
use cadence_e2e_tests::{StudySimulator, TestDataFactory};

fn parent_override() -> Settings {
    Settings {
        new_per_day: 5,
        ..Default::default()
    }
}

/// P (override) -> D (no override) -> items
fn forest(items: usize) -> Vec<cadence_core::Deck> {
    let new_items = (0..items)
        .map(|i| TestDataFactory::new_item(&format!("d{i}"), i as u64))
        .collect();
    let child = TestDataFactory::deck("p::d", new_items);
    let mut parent = TestDataFactory::deck_with_settings("p", Vec::new(), parent_override());
    parent.children.push(child);
    vec![parent]
}

// ============================================================================
// RESOLUTION
// ============================================================================

#[test]
fn test_child_inherits_parent_override() {
    let decks = forest(0);
    let tree = DeckTree::new(&decks);
    let global = Settings::default();

    let resolved = resolve("p::d", &tree, &global);

    assert_eq!(resolved.settings.new_per_day, 5);
    assert_eq!(resolved.settings, &parent_override());
    assert_eq!(resolved.source.label(), "P");
}

#[test]
fn test_resolution_is_idempotent() {
    let decks = forest(3);
    let tree = DeckTree::new(&decks);
    let global = Settings::default();

    let first = resolve("p::d", &tree, &global);
    let second = resolve("p::d", &tree, &global);

    assert_eq!(first.settings, second.settings);
    assert_eq!(first.source, second.source);
}

#[test]
fn test_nearest_override_replaces_entirely() {
    let mut decks = forest(0);
    let child_settings = Settings {
        algorithm: Algorithm::Sm2,
        ..Default::default()
    };
    let child = &mut decks[0].children[0];
    child.has_custom_settings = true;
    child.custom_settings = Some(child_settings);

    let tree = DeckTree::new(&decks);
    let global = Settings::default();
    let resolved = resolve("p::d", &tree, &global);

    // No field merging with the parent's new_per_day
    assert_eq!(resolved.settings.new_per_day, 20);
    assert_eq!(resolved.settings.algorithm, Algorithm::Sm2);
    assert_eq!(resolved.source.label(), "D");
}

#[test]
fn test_disabled_override_falls_through() {
    let mut decks = forest(0);
    decks[0].has_custom_settings = false;
    let tree = DeckTree::new(&decks);

    let global = Settings::default();
    let resolved = resolve("p::d", &tree, &global);
    assert_eq!(resolved.source, SettingsSource::Global);
    assert_eq!(resolved.settings.new_per_day, 20);
}

#[test]
fn test_unknown_deck_resolves_to_global() {
    let decks = forest(0);
    let tree = DeckTree::new(&decks);
    let global = Settings::default();
    let resolved = resolve("nowhere", &tree, &global);
    assert_eq!(resolved.source, SettingsSource::Global);
}

// ============================================================================
// EFFECT ON SESSIONS
// ============================================================================

#[test]
fn test_inherited_cap_limits_new_items() {
    let decks = forest(12);
    let tree = DeckTree::new(&decks);
    let request = SessionRequest::new(vec!["p::d".into()], TestDataFactory::epoch(), 1);

    let session = build(&request, &tree, &Settings::default());

    assert_eq!(session.count(QueueKind::New), 5);
    assert_eq!(session.introduced_today.len(), 5);
}

#[test]
fn test_introduced_today_shrinks_later_sessions() {
    let mut sim = StudySimulator::new(forest(12), Settings::default(), TestDataFactory::epoch());

    let first = sim.session(&["p"], 1);
    assert_eq!(first.count(QueueKind::New), 5);

    // Same day: the override's cap is already spent
    let second = sim.session(&["p"], 2);
    assert_eq!(second.count(QueueKind::New), 0);
}

#[test]
fn test_reviews_use_resolved_algorithm() {
    let mut decks = forest(1);
    decks[0].custom_settings = Some(Settings {
        algorithm: Algorithm::Sm2,
        ..parent_override()
    });
    let mut sim = StudySimulator::new(decks, Settings::default(), TestDataFactory::epoch());

    sim.rate("d0", Rating::Good);

    let record = &sim.item("d0").scheduling;
    assert!(record.sm2.is_some());
    assert!(record.fsrs6.is_none());
}
