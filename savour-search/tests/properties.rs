//! Property tests for search determinism and bounds.

use std::sync::Arc;

use proptest::prelude::*;
use savour_core::test_support::{fixed_now, rated_restaurant, review_days_ago};
use savour_core::{
    FixedClock, HashingEmbedder, SEARCH_LIMIT, SearchFilters, SearchQuery, Snapshot,
};
use savour_search::SearchEngine;

const WORDS: [&str; 6] = ["tacos", "ramen", "pizza", "vegan", "cheap", "spicy"];

fn arbitrary_snapshot() -> impl Strategy<Value = Snapshot> {
    proptest::collection::vec(
        (
            0.0_f32..=5.0,
            0_u32..2000,
            proptest::sample::select(WORDS.to_vec()),
            -0.5_f64..0.5,
            0_i64..400,
        ),
        1..30,
    )
    .prop_map(|specs| {
        let mut restaurants = Vec::new();
        let mut reviews = Vec::new();
        for (index, (rating, count, word, offset, days_ago)) in specs.into_iter().enumerate() {
            let id = format!("r{index}");
            let restaurant = rated_restaurant(&id, &format!("{word} place {index}"), rating, count)
                .with_tags(word)
                .with_location(30.0 + offset, -97.0 + offset)
                .unwrap_or_else(|err| panic!("fixture location: {err}"));
            restaurants.push(restaurant);
            reviews.push(review_days_ago(&id, rating, days_ago, fixed_now()).with_text(word));
        }
        Snapshot::new(restaurants, reviews).unwrap_or_else(|err| panic!("fixture snapshot: {err}"))
    })
}

fn engine(snapshot: Snapshot) -> SearchEngine {
    SearchEngine::new(Arc::new(snapshot), Arc::new(HashingEmbedder::new(64)))
        .with_clock(Arc::new(FixedClock::new(fixed_now())))
}

proptest! {
    #[test]
    fn search_is_bounded_and_deterministic(
        snapshot in arbitrary_snapshot(),
        word in proptest::sample::select(WORDS.to_vec()),
        radius in 0.0_f64..150.0,
    ) {
        let filters = SearchFilters::default()
            .with_origin(30.0, -97.0)
            .and_then(|filters| filters.with_radius(radius))
            .unwrap_or_else(|err| panic!("valid filters: {err}"));
        let query = SearchQuery::new(word)
            .unwrap_or_else(|err| panic!("valid query: {err}"))
            .with_filters(filters);
        let engine = engine(snapshot);
        let first = engine.search(&query).unwrap_or_else(|err| panic!("search: {err}"));
        let second = engine.search(&query).unwrap_or_else(|err| panic!("search: {err}"));

        prop_assert!(first.len() <= SEARCH_LIMIT);
        prop_assert_eq!(&first, &second);
        for candidate in &first {
            prop_assert!((0.0..=100.0).contains(&candidate.smart_score));
            prop_assert!((0.0..=1.0).contains(&candidate.relevance));
        }
        for (earlier, later) in first.iter().zip(first.iter().skip(1)) {
            prop_assert!(earlier.relevance >= later.relevance);
        }
    }
}
