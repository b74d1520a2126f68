//! # Sibling Burying Tests
//!
//! Items sharing a note family are held back once one of them is queued.

use cadence_core::{DeckTree, QueueKind, Rating, Session, SessionRequest, Settings, build};
use cadence_e2e_tests::{StudySimulator, TestDataFactory};
use chrono::Duration;

fn bury_new() -> Settings {
    Settings {
        bury_new: true,
        ..Default::default()
    }
}

fn family_ids(session: &Session, prefix: &str) -> Vec<String> {
    session
        .items
        .iter()
        .filter(|queued| queued.item_id.starts_with(prefix))
        .map(|queued| queued.item_id.clone())
        .collect()
}

// ============================================================================
// NEW SIBLINGS
// ============================================================================

#[test]
fn test_three_new_siblings_yield_one() {
    let decks = vec![TestDataFactory::deck(
        "words",
        TestDataFactory::family("note", "n1", 3),
    )];
    let tree = DeckTree::new(&decks);
    let request = SessionRequest::new(vec!["words".into()], TestDataFactory::epoch(), 11);

    let session = build(&request, &tree, &bury_new());

    assert_eq!(session.len(), 1);
    assert_eq!(session.count(QueueKind::New), 1);
    assert_eq!(family_ids(&session, "note").len(), 1);
}

#[test]
fn test_burying_off_keeps_all_siblings() {
    let decks = vec![TestDataFactory::deck(
        "words",
        TestDataFactory::family("note", "n1", 3),
    )];
    let tree = DeckTree::new(&decks);
    let request = SessionRequest::new(vec!["words".into()], TestDataFactory::epoch(), 11);

    let session = build(&request, &tree, &Settings::default());
    assert_eq!(session.len(), 3);
}

#[test]
fn test_separate_families_are_independent() {
    let mut items = TestDataFactory::family("a", "fa", 2);
    items.extend(TestDataFactory::family("b", "fb", 2));
    let decks = vec![TestDataFactory::deck("words", items)];
    let tree = DeckTree::new(&decks);
    let request = SessionRequest::new(vec!["words".into()], TestDataFactory::epoch(), 3);

    let session = build(&request, &tree, &bury_new());

    assert_eq!(family_ids(&session, "a-").len(), 1);
    assert_eq!(family_ids(&session, "b-").len(), 1);
}

// ============================================================================
// ACROSS CATEGORIES
// ============================================================================

#[test]
fn test_queued_review_buries_new_sibling() {
    let now = TestDataFactory::epoch();
    let mut review = TestDataFactory::review_item("note-review", now - Duration::days(1));
    review.family_id = Some("n1".into());
    let mut items = vec![review];
    items.extend(TestDataFactory::family("note", "n1", 2));

    let decks = vec![TestDataFactory::deck("words", items)];
    let tree = DeckTree::new(&decks);
    let request = SessionRequest::new(vec!["words".into()], now, 5);

    let session = build(&request, &tree, &bury_new());

    assert_eq!(session.item_ids(), vec!["note-review"]);
}

#[test]
fn test_learning_sibling_is_never_buried() {
    let now = TestDataFactory::epoch();
    let mut items = TestDataFactory::family("note", "n1", 2);
    let mut learning = TestDataFactory::learning_item("note-learning", now - Duration::minutes(1));
    learning.family_id = Some("n1".into());
    items.push(learning);

    let decks = vec![TestDataFactory::deck("words", items)];
    let mut sim = StudySimulator::new(decks, bury_new(), now);
    let session = sim.session(&["words"], 9);

    assert_eq!(session.count(QueueKind::Learning), 1);
    assert_eq!(session.count(QueueKind::New), 0);
    assert_eq!(session.items[0].item_id, "note-learning");

    // Once graduated, the family is free again the next day
    sim.rate("note-learning", Rating::Easy);
    sim.advance(Duration::days(1));
    let next = sim.session(&["words"], 9);
    assert_eq!(next.count(QueueKind::New), 1);
}
