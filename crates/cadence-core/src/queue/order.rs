//! Session ordering: new sort, review sort, mixing and final assembly

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use super::QueuedItem;
use super::gather::Gathered;
use crate::settings::{NewGatherOrder, NewReviewMix, NewSortOrder, ReviewSortOrder, Settings};

/// Order the gathered categories into the final session
pub(crate) fn arrange(
    gathered: Gathered,
    settings: &Settings,
    now: DateTime<Utc>,
    rng: &mut ChaCha8Rng,
) -> Vec<QueuedItem> {
    let Gathered {
        mut learning,
        mut review,
        mut new,
    } = gathered;

    order_new(&mut new, settings.new_gather_order, settings.new_sort_order, rng);
    order_reviews(&mut review, settings.review_sort_order, now, rng);
    let mixed = mix(review, new, settings.new_review_mix, rng);

    learning.sort_by_key(|q| (q.due, q.gather_index));

    let mut seen = HashSet::new();
    learning
        .into_iter()
        .chain(mixed)
        .filter(|q| seen.insert(q.item_id.clone()))
        .collect()
}

/// Gather order across decks, then the secondary sort
pub(crate) fn order_new(
    items: &mut [QueuedItem],
    gather: NewGatherOrder,
    sort: NewSortOrder,
    rng: &mut ChaCha8Rng,
) {
    match gather {
        NewGatherOrder::DeckOrder | NewGatherOrder::Random => {
            items.sort_by_key(|q| q.gather_index)
        }
        NewGatherOrder::AscendingPosition => {
            items.sort_by_key(|q| (q.new_card_order, q.gather_index))
        }
        NewGatherOrder::DescendingPosition => {
            items.sort_by_key(|q| (std::cmp::Reverse(q.new_card_order), q.gather_index))
        }
    }

    match sort {
        NewSortOrder::Gathered => {}
        NewSortOrder::TypeThenGathered => items.sort_by_key(|q| q.item_kind),
        NewSortOrder::TypeThenRandom => {
            items.shuffle(rng);
            items.sort_by_key(|q| q.item_kind);
        }
        NewSortOrder::Random => items.shuffle(rng),
    }
}

pub(crate) fn order_reviews(
    items: &mut [QueuedItem],
    order: ReviewSortOrder,
    now: DateTime<Utc>,
    rng: &mut ChaCha8Rng,
) {
    let due_day = |q: &QueuedItem| q.due.map(|d| d.date_naive());
    match order {
        ReviewSortOrder::DueThenRandom => {
            items.shuffle(rng);
            items.sort_by_key(due_day);
        }
        ReviewSortOrder::DueThenDeck => items.sort_by_key(|q| (due_day(q), q.gather_index)),
        ReviewSortOrder::OverdueFirst => {
            items.sort_by(|a, b| {
                overdue_ratio(b, now)
                    .total_cmp(&overdue_ratio(a, now))
                    .then(a.due.cmp(&b.due))
                    .then(a.gather_index.cmp(&b.gather_index))
            });
        }
    }
}

/// Days overdue relative to the scheduled interval
fn overdue_ratio(item: &QueuedItem, now: DateTime<Utc>) -> f64 {
    let overdue = item
        .due
        .map(|d| (now - d).num_seconds() as f64 / 86_400.0)
        .unwrap_or(0.0);
    overdue / item.interval_days.max(1.0)
}

/// Combine reviews and new items; each list keeps its own order
pub(crate) fn mix(
    review: Vec<QueuedItem>,
    new: Vec<QueuedItem>,
    order: NewReviewMix,
    rng: &mut ChaCha8Rng,
) -> Vec<QueuedItem> {
    match order {
        NewReviewMix::ReviewsFirst => review.into_iter().chain(new).collect(),
        NewReviewMix::NewFirst => new.into_iter().chain(review).collect(),
        NewReviewMix::InterleavedRandom => {
            let mut out = Vec::with_capacity(review.len() + new.len());
            let mut review = review.into_iter();
            let mut new = new.into_iter();
            let (mut reviews_left, mut new_left) = (review.len(), new.len());
            while reviews_left + new_left > 0 {
                let take_review = rng.gen_range(0..reviews_left + new_left) < reviews_left;
                let next = if take_review {
                    reviews_left -= 1;
                    review.next()
                } else {
                    new_left -= 1;
                    new.next()
                };
                out.extend(next);
            }
            out
        }
    }
}
