//! Request orchestration over an immutable snapshot.

use std::borrow::Cow;
use std::sync::Arc;

use log::{debug, warn};
use savour_core::{
    BROWSE_LIMIT, Clock, Embedder, Embedding, EmbeddingStore, GeoFilter, PriceFilter, RankMode,
    Restaurant, SEARCH_LIMIT, ScoredCandidate, SearchFilters, SearchQuery, SignalContext,
    Snapshot, SystemClock, composite_text, rank, review_excerpt, score_relevance,
};
use savour_scorer::SmartScoreCombiner;

use crate::SearchError;

/// Where candidate vectors come from.
#[derive(Debug, Clone, Default)]
pub enum EmbeddingSource {
    /// Embed each candidate's composite text at request time.
    #[default]
    OnDemand,
    /// Use the restaurant's own vector, else the store entry. Candidates
    /// with neither are dropped.
    Precomputed(Arc<EmbeddingStore>),
}

/// A restaurant that passed the filters.
struct Survivor<'a> {
    restaurant: &'a Restaurant,
    distance: Option<f64>,
}

/// Ranks a fixed snapshot against search and browse requests.
///
/// The engine is immutable and shared between concurrent requests. Every
/// request reads the clock once so all candidates share one reference
/// instant.
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use savour_core::{HashingEmbedder, Restaurant, SearchQuery, Snapshot};
/// use savour_search::SearchEngine;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let snapshot = Snapshot::new(
///     vec![Restaurant::new("p1", "Taco Shack")?.with_tags("mexican tacos")],
///     Vec::new(),
/// )?;
/// let engine = SearchEngine::new(Arc::new(snapshot), Arc::new(HashingEmbedder::default()));
/// let results = engine.search(&SearchQuery::new("tacos")?)?;
/// assert_eq!(results.len(), 1);
/// # Ok(())
/// # }
/// ```
pub struct SearchEngine {
    snapshot: Arc<Snapshot>,
    embedder: Arc<dyn Embedder>,
    source: EmbeddingSource,
    combiner: SmartScoreCombiner,
    clock: Arc<dyn Clock>,
}

impl SearchEngine {
    /// Build an engine that embeds candidates on demand with default
    /// weights and the system clock.
    #[must_use]
    pub fn new(snapshot: Arc<Snapshot>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            snapshot,
            embedder,
            source: EmbeddingSource::OnDemand,
            combiner: SmartScoreCombiner::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the candidate vector source.
    #[must_use]
    pub fn with_source(mut self, source: EmbeddingSource) -> Self {
        self.source = source;
        self
    }

    /// Replace the smart-score combiner.
    #[must_use]
    pub fn with_combiner(mut self, combiner: SmartScoreCombiner) -> Self {
        self.combiner = combiner;
        self
    }

    /// Replace the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The snapshot being searched.
    #[must_use]
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Rank restaurants against a query, returning at most
    /// [`SEARCH_LIMIT`] candidates.
    ///
    /// Candidates that cannot be embedded are dropped.
    ///
    /// # Errors
    /// Returns [`SearchError::QueryEmbedding`] when the query text cannot be
    /// embedded.
    pub fn search(&self, query: &SearchQuery) -> Result<Vec<ScoredCandidate>, SearchError> {
        let geo = GeoFilter::from_filters(query.filters());
        let survivors = self.filter(query.filters(), &geo);
        if survivors.is_empty() {
            debug!("no restaurants pass the filters for {:?}", query.text());
            return Ok(Vec::new());
        }

        let query_vector = self
            .embedder
            .embed(query.text())
            .map_err(SearchError::QueryEmbedding)?;

        let mut scoreable = Vec::with_capacity(survivors.len());
        let mut vectors = Vec::with_capacity(survivors.len());
        for survivor in survivors {
            if let Some(vector) = self.candidate_vector(survivor.restaurant) {
                scoreable.push(survivor);
                vectors.push(vector);
            }
        }

        let restaurants: Vec<&Restaurant> = scoreable.iter().map(|s| s.restaurant).collect();
        let borrowed: Vec<Option<&Embedding>> =
            vectors.iter().map(|vector| Some(vector.as_ref())).collect();
        let relevance = score_relevance(query.text(), &query_vector, &restaurants, &borrowed);
        debug!(
            "scored {} candidates for {:?} with {:?} relevance",
            scoreable.len(),
            query.text(),
            relevance.stage
        );

        let candidates = self.score(&scoreable, &relevance.scores);
        Ok(rank(
            candidates,
            query.rank_mode(),
            geo.measures_distance(),
            SEARCH_LIMIT,
        ))
    }

    /// List the best restaurants by smart score without a query, returning
    /// at most [`BROWSE_LIMIT`] candidates.
    ///
    /// Relevance is fixed at zero and the remaining weights are not
    /// renormalised.
    #[must_use]
    pub fn browse(&self, filters: &SearchFilters) -> Vec<ScoredCandidate> {
        let geo = GeoFilter::from_filters(filters);
        let survivors = self.filter(filters, &geo);
        let zeros = vec![0.0; survivors.len()];
        let candidates = self.score(&survivors, &zeros);
        debug!("browsing {} candidates", candidates.len());
        rank(
            candidates,
            RankMode::SmartScore,
            geo.measures_distance(),
            BROWSE_LIMIT,
        )
    }

    fn filter(&self, filters: &SearchFilters, geo: &GeoFilter) -> Vec<Survivor<'_>> {
        let price = PriceFilter::from_filters(filters);
        self.snapshot
            .restaurants()
            .iter()
            .filter(|restaurant| price.admits(restaurant))
            .filter_map(|restaurant| {
                let distance = geo.distance_to(restaurant);
                geo.admits(distance).then_some(Survivor {
                    restaurant,
                    distance,
                })
            })
            .collect()
    }

    fn candidate_vector<'a>(&'a self, restaurant: &'a Restaurant) -> Option<Cow<'a, Embedding>> {
        match &self.source {
            EmbeddingSource::OnDemand => {
                let reviews = self.snapshot.reviews_for(&restaurant.id);
                match self.embedder.embed(&composite_text(restaurant, reviews)) {
                    Ok(vector) => Some(Cow::Owned(vector)),
                    Err(err) => {
                        warn!("dropping {}: {err}", restaurant.id);
                        None
                    }
                }
            }
            EmbeddingSource::Precomputed(store) => {
                let vector = restaurant
                    .embedding
                    .as_ref()
                    .or_else(|| store.get(&restaurant.id))
                    .map(Cow::Borrowed);
                if vector.is_none() {
                    debug!("dropping {}: no precomputed embedding", restaurant.id);
                }
                vector
            }
        }
    }

    fn score(&self, survivors: &[Survivor<'_>], relevance: &[f32]) -> Vec<ScoredCandidate> {
        let now = self.clock.now();
        survivors
            .iter()
            .zip(relevance)
            .map(|(survivor, relevance_score)| {
                let reviews = self.snapshot.reviews_for(&survivor.restaurant.id);
                let context = SignalContext::new(survivor.restaurant, reviews, now);
                let (smart_score, breakdown) = self.combiner.score(&context, *relevance_score);
                ScoredCandidate::from_restaurant(
                    survivor.restaurant,
                    survivor.distance,
                    smart_score,
                    breakdown,
                    review_excerpt(reviews),
                )
            })
            .collect()
    }
}

impl std::fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchEngine")
            .field("restaurants", &self.snapshot.restaurant_count())
            .field("source", &self.source)
            .field("combiner", &self.combiner)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use savour_core::test_support::{
        FailingEmbedder, KeywordEmbedder, fixed_now, rated_restaurant, review_days_ago,
    };
    use savour_core::{FixedClock, PriceLevel, RestaurantId};

    fn keywords() -> KeywordEmbedder {
        KeywordEmbedder::new(["taco", "ramen", "pizza"])
    }

    fn engine_with(snapshot: Snapshot, embedder: impl Embedder + 'static) -> SearchEngine {
        SearchEngine::new(Arc::new(snapshot), Arc::new(embedder))
            .with_clock(Arc::new(FixedClock::new(fixed_now())))
    }

    #[fixture]
    fn snapshot() -> Snapshot {
        let taco = rated_restaurant("taco", "Taco Shack", 4.5, 120).with_tags("mexican");
        let ramen = rated_restaurant("ramen", "Ramen House", 4.7, 300).with_tags("japanese");
        let pizza = rated_restaurant("pizza", "Pizza Place", 3.9, 40).with_tags("italian");
        Snapshot::new(
            vec![taco, ramen, pizza],
            vec![
                review_days_ago("taco", 5.0, 3, fixed_now()).with_text("Best taco in town"),
                review_days_ago("ramen", 4.0, 10, fixed_now()).with_text("Rich broth"),
            ],
        )
        .expect("valid snapshot")
    }

    fn ids(results: &[ScoredCandidate]) -> Vec<&str> {
        results.iter().map(|c| c.id.as_str()).collect()
    }

    #[rstest]
    fn semantic_match_ranks_first(snapshot: Snapshot) {
        let engine = engine_with(snapshot, keywords());
        let results = engine
            .search(&SearchQuery::new("taco").expect("valid query"))
            .expect("search succeeds");
        assert_eq!(ids(&results).first(), Some(&"taco"));
        assert!(results.iter().all(|c| (0.0..=1.0).contains(&c.relevance)));
        assert_eq!(
            results.first().and_then(|c| c.excerpt.as_deref()),
            Some("Best taco in town")
        );
    }

    #[rstest]
    fn smart_score_mode_orders_by_score(snapshot: Snapshot) {
        let engine = engine_with(snapshot, keywords());
        let query = SearchQuery::new("taco")
            .expect("valid query")
            .with_rank_mode(RankMode::SmartScore);
        let results = engine.search(&query).expect("search succeeds");
        let scores: Vec<f32> = results.iter().map(|c| c.smart_score).collect();
        assert!(scores.windows(2).all(|pair| match pair {
            [first, second] => first >= second,
            _ => true,
        }));
    }

    #[rstest]
    fn candidate_embed_failures_are_dropped(snapshot: Snapshot) {
        let engine = engine_with(snapshot, FailingEmbedder::on(keywords(), "Ramen House"));
        let results = engine
            .search(&SearchQuery::new("taco").expect("valid query"))
            .expect("search succeeds");
        assert_eq!(results.len(), 2);
        assert!(!ids(&results).contains(&"ramen"));
    }

    #[rstest]
    fn query_embed_failure_fails_the_request(snapshot: Snapshot) {
        let engine = engine_with(snapshot, FailingEmbedder::always(keywords()));
        let err = engine
            .search(&SearchQuery::new("taco").expect("valid query"))
            .expect_err("query embedding fails");
        assert!(matches!(err, SearchError::QueryEmbedding(_)));
    }

    #[rstest]
    fn unmatched_vectors_fall_back_to_lexical(snapshot: Snapshot) {
        let engine = engine_with(snapshot, keywords());
        let results = engine
            .search(&SearchQuery::new("house").expect("valid query"))
            .expect("search succeeds");
        // "house" shares no keyword axis, so only the lexical stage scores.
        assert_eq!(ids(&results).first(), Some(&"ramen"));
        assert!(results.first().is_some_and(|c| c.relevance > 0.0));
    }

    #[rstest]
    fn precomputed_source_drops_restaurants_without_vectors(snapshot: Snapshot) {
        let store = EmbeddingStore::from_parts(
            vec![RestaurantId::new("taco"), RestaurantId::new("pizza")],
            vec![vec![1.0, 0.0, 0.0], vec![0.0, 0.0, 1.0]],
        )
        .expect("valid store");
        let engine = engine_with(snapshot, keywords())
            .with_source(EmbeddingSource::Precomputed(Arc::new(store)));
        let results = engine
            .search(&SearchQuery::new("pizza").expect("valid query"))
            .expect("search succeeds");
        assert_eq!(ids(&results), vec!["pizza", "taco"]);
    }

    #[rstest]
    fn browse_ranks_by_smart_score_without_relevance(snapshot: Snapshot) {
        let engine = engine_with(snapshot, FailingEmbedder::always(keywords()));
        let results = engine.browse(&SearchFilters::default());
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|c| c.relevance <= 0.0));
        assert_eq!(ids(&results).first(), Some(&"ramen"));
    }

    #[rstest]
    fn browse_applies_the_price_ceiling(snapshot: Snapshot) {
        let mut restaurants = snapshot.restaurants().to_vec();
        if let Some(first) = restaurants.first_mut() {
            first.price_level = Some(PriceLevel::PRICIEST);
        }
        let engine = engine_with(
            Snapshot::new(restaurants, Vec::new()).expect("valid snapshot"),
            keywords(),
        );
        let filters = SearchFilters::default()
            .with_max_price(2)
            .expect("valid ceiling");
        assert!(!ids(&engine.browse(&filters)).contains(&"taco"));
    }
}
