//! # Leech Journey Tests
//!
//! Repeated lapses counted up to the leech threshold. The engine reports the
//! crossing; tagging or suspending is left to the caller.

use cadence_core::{Algorithm, CardPhase, LeechAction, Rating, Settings};
use cadence_e2e_tests::{StudySimulator, TestDataFactory};
use chrono::Duration;

fn graduated(algorithm: Algorithm, leech_action: LeechAction) -> StudySimulator {
    let deck = TestDataFactory::deck("hard", vec![TestDataFactory::new_item("card", 0)]);
    let global = Settings {
        algorithm,
        leech_threshold: 8,
        leech_action,
        ..Default::default()
    };
    let mut sim = StudySimulator::new(vec![deck], global, TestDataFactory::epoch());
    sim.rate("card", Rating::Easy);
    assert_eq!(sim.view("card").phase, CardPhase::Review);
    sim
}

/// Lapse once and relearn; returns whether the lapse crossed the threshold
fn lapse_and_recover(sim: &mut StudySimulator) -> Option<u32> {
    sim.advance_to_due("card");
    let outcome = sim.rate("card", Rating::Again);
    assert_eq!(sim.view("card").phase, CardPhase::Relearning);

    sim.advance(Duration::minutes(11));
    sim.rate("card", Rating::Good);
    assert_eq!(sim.view("card").phase, CardPhase::Review);

    outcome.leech.map(|notice| notice.lapses)
}

// ============================================================================
// THRESHOLD
// ============================================================================

#[test]
fn test_eight_lapses_reach_threshold() {
    for algorithm in [Algorithm::Fsrs45, Algorithm::Fsrs6, Algorithm::Sm2] {
        let mut sim = graduated(algorithm, LeechAction::Tag);

        let notices: Vec<Option<u32>> = (0..8).map(|_| lapse_and_recover(&mut sim)).collect();

        assert_eq!(sim.view("card").lapses, 8, "{algorithm:?}");
        assert!(notices[..7].iter().all(Option::is_none), "{algorithm:?}");
        assert_eq!(notices[7], Some(8), "{algorithm:?}");
    }
}

#[test]
fn test_notice_fires_once() {
    let mut sim = graduated(Algorithm::Fsrs6, LeechAction::Suspend);
    for _ in 0..8 {
        lapse_and_recover(&mut sim);
    }
    assert_eq!(lapse_and_recover(&mut sim), None);
    assert_eq!(sim.view("card").lapses, 9);
}

#[test]
fn test_engine_never_mutates_tags_or_suspension() {
    let mut sim = graduated(Algorithm::Sm2, LeechAction::Suspend);
    for _ in 0..8 {
        lapse_and_recover(&mut sim);
    }
    let item = sim.item("card");
    assert!(!item.suspended);
    assert!(item.tags.is_empty());
}

#[test]
fn test_zero_threshold_disables_detection() {
    let mut sim = graduated(Algorithm::Fsrs6, LeechAction::Tag);
    sim.global.leech_threshold = 0;
    let notices: Vec<Option<u32>> = (0..10).map(|_| lapse_and_recover(&mut sim)).collect();
    assert!(notices.iter().all(Option::is_none));
}

// ============================================================================
// LOG
// ============================================================================

#[test]
fn test_every_rating_is_logged() {
    let mut sim = graduated(Algorithm::Fsrs6, LeechAction::Tag);
    for _ in 0..3 {
        lapse_and_recover(&mut sim);
    }
    // One graduation plus two ratings per cycle
    assert_eq!(sim.log.len(), 7);
    let lapses = sim.log.iter().filter(|log| log.rating == Rating::Again).count();
    assert_eq!(lapses, 3);
}
