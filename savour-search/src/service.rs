//! Readiness-aware wrapper that owns the current engine.
//!
//! The service holds the active [`SearchEngine`] behind a lock only long
//! enough to clone its `Arc`; searches and embedding calls run without the
//! lock held. A rebuild assembles a complete engine first and swaps it in
//! atomically. Rebuilds run one at a time, so the engine published last
//! is always the one whose load started last. When any part of the rebuild
//! fails the service drops its engine and reports not-ready health until a
//! later rebuild succeeds.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use camino::Utf8PathBuf;
use log::{info, warn};
use savour_core::{Clock, Embedder, ScoredCandidate, SearchFilters, SearchQuery, SystemClock};
use savour_data::{LoadOptions, load_snapshot, read_embedding_store};
use savour_scorer::{SmartScoreCombiner, SmartScoreWeights};
use serde::Serialize;

use crate::{ConfigurationError, EmbeddingSource, SearchEngine, SearchError};

/// Text embedded to check that the model answers.
const PROBE_TEXT: &str = "restaurant";

/// Inputs used to build an engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Restaurant SQLite database.
    pub database: Utf8PathBuf,
    /// Precomputed embedding store; `None` embeds candidates on demand.
    pub embeddings: Option<Utf8PathBuf>,
    /// Row selection applied while loading.
    pub load: LoadOptions,
    /// Smart-score weights.
    pub weights: SmartScoreWeights,
}

impl ServiceConfig {
    /// Configuration with default load options and weights.
    #[must_use]
    pub fn new(database: impl Into<Utf8PathBuf>) -> Self {
        Self {
            database: database.into(),
            embeddings: None,
            load: LoadOptions::default(),
            weights: SmartScoreWeights::default(),
        }
    }

    /// Use a precomputed embedding store.
    #[must_use]
    pub fn with_embeddings(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.embeddings = Some(path.into());
        self
    }
}

/// Readiness report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Health {
    /// The restaurant snapshot loaded.
    pub data_loaded: bool,
    /// The embedding model answered its probe.
    pub model_ready: bool,
    /// Candidate vectors are available: the store loaded, or on-demand
    /// embedding is configured and the model is ready.
    pub embeddings_ready: bool,
    /// Restaurants in the loaded snapshot.
    pub restaurant_count: usize,
    /// Reviews in the loaded snapshot.
    pub review_count: usize,
    /// Description of the last rebuild failure.
    pub error: Option<String>,
}

impl Health {
    /// Report whether searches will be served.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.data_loaded && self.model_ready && self.embeddings_ready
    }
}

#[derive(Debug, Default)]
struct ServiceState {
    engine: Option<Arc<SearchEngine>>,
    health: Health,
}

/// Long-lived search front end.
///
/// # Examples
/// ```no_run
/// use std::sync::Arc;
///
/// use savour_core::{HashingEmbedder, SearchQuery};
/// use savour_search::{SearchService, ServiceConfig};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let service = SearchService::start(
///     ServiceConfig::new("restaurants.db"),
///     Arc::new(HashingEmbedder::default()),
/// );
/// if service.health().is_ready() {
///     let results = service.search(&SearchQuery::new("tacos")?)?;
///     assert!(results.len() <= 10);
/// }
/// # Ok(())
/// # }
/// ```
pub struct SearchService {
    config: ServiceConfig,
    embedder: Arc<dyn Embedder>,
    clock: Arc<dyn Clock>,
    rebuild_gate: Mutex<()>,
    state: RwLock<ServiceState>,
}

impl SearchService {
    /// Create a service that is not ready until [`SearchService::rebuild`]
    /// succeeds.
    #[must_use]
    pub fn new(config: ServiceConfig, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            config,
            embedder,
            clock: Arc::new(SystemClock),
            rebuild_gate: Mutex::new(()),
            state: RwLock::new(ServiceState::default()),
        }
    }

    /// Create a service and attempt the initial build.
    ///
    /// A failed build is logged and reported through
    /// [`SearchService::health`].
    #[must_use]
    pub fn start(config: ServiceConfig, embedder: Arc<dyn Embedder>) -> Self {
        let service = Self::new(config, embedder);
        if let Err(err) = service.rebuild() {
            warn!("search service is not ready: {err}");
        }
        service
    }

    /// Replace the clock used by engines built after this call.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Reload data and embeddings and swap in a fresh engine.
    ///
    /// Overlapping calls wait for each other. Searches keep using the
    /// previous engine until the swap.
    ///
    /// # Errors
    /// Returns [`ConfigurationError`] when the database, model, store or
    /// weights are unusable. The service is then not ready.
    pub fn rebuild(&self) -> Result<(), ConfigurationError> {
        let _serialised = self
            .rebuild_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut health = Health::default();
        let outcome = self.build(&mut health);
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        match outcome {
            Ok(engine) => {
                info!(
                    "search engine ready with {} restaurants and {} reviews",
                    health.restaurant_count, health.review_count
                );
                state.engine = Some(Arc::new(engine));
                state.health = health;
                Ok(())
            }
            Err(err) => {
                health.error = Some(err.to_string());
                state.engine = None;
                state.health = health;
                Err(err)
            }
        }
    }

    fn build(&self, health: &mut Health) -> Result<SearchEngine, ConfigurationError> {
        let snapshot = load_snapshot(&self.config.database, self.config.load)?;
        health.data_loaded = true;
        health.restaurant_count = snapshot.restaurant_count();
        health.review_count = snapshot.review_count();

        let probe = self
            .embedder
            .embed(PROBE_TEXT)
            .map_err(ConfigurationError::ModelUnavailable)?;
        health.model_ready = true;

        let source = match &self.config.embeddings {
            Some(path) => {
                let store = read_embedding_store(path)?;
                if !store.is_empty() && store.dimensions() != probe.dimensions() {
                    return Err(ConfigurationError::DimensionMismatch {
                        store: store.dimensions(),
                        model: probe.dimensions(),
                    });
                }
                EmbeddingSource::Precomputed(Arc::new(store))
            }
            None => EmbeddingSource::OnDemand,
        };
        health.embeddings_ready = true;

        let combiner = SmartScoreCombiner::new(self.config.weights)?;
        Ok(
            SearchEngine::new(Arc::new(snapshot), Arc::clone(&self.embedder))
                .with_source(source)
                .with_combiner(combiner)
                .with_clock(Arc::clone(&self.clock)),
        )
    }

    /// Current readiness.
    #[must_use]
    pub fn health(&self) -> Health {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .health
            .clone()
    }

    /// Rank restaurants against a query.
    ///
    /// # Errors
    /// Returns [`SearchError::NotReady`] without a loaded engine, or the
    /// engine's error.
    pub fn search(&self, query: &SearchQuery) -> Result<Vec<ScoredCandidate>, SearchError> {
        self.engine()?.search(query)
    }

    /// List the best restaurants without a query.
    ///
    /// # Errors
    /// Returns [`SearchError::NotReady`] without a loaded engine.
    pub fn browse(&self, filters: &SearchFilters) -> Result<Vec<ScoredCandidate>, SearchError> {
        Ok(self.engine()?.browse(filters))
    }

    fn engine(&self) -> Result<Arc<SearchEngine>, SearchError> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .engine
            .clone()
            .ok_or(SearchError::NotReady)
    }
}

impl std::fmt::Debug for SearchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchService")
            .field("config", &self.config)
            .field("health", &self.health())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::{Receiver, Sender, channel};
    use std::time::Duration;

    use rstest::{fixture, rstest};
    use savour_core::test_support::{FailingEmbedder, KeywordEmbedder, fixed_now};
    use savour_core::{EmbedError, Embedding, EmbeddingStore, FixedClock, RestaurantId};
    use savour_data::test_support::{FixtureRestaurant, FixtureReview, write_fixture_database};
    use savour_data::write_embedding_store;
    use tempfile::TempDir;

    struct Paths {
        _dir: TempDir,
        database: Utf8PathBuf,
        store: Utf8PathBuf,
    }

    #[fixture]
    fn paths() -> Paths {
        let dir = TempDir::new().expect("create temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp path");
        let database = root.join("restaurants.db");
        write_fixture_database(
            &database,
            &[
                FixtureRestaurant::new("taco", "Taco Shack", 4.5, Some(1)),
                FixtureRestaurant::new("ramen", "Ramen House", 4.7, Some(2)),
            ],
            &[FixtureReview::new("taco", 5.0, "Great taco", 1_700_000_000)],
        )
        .expect("write fixture");
        Paths {
            _dir: dir,
            database,
            store: root.join("embeddings.svem"),
        }
    }

    fn keywords() -> Arc<dyn Embedder> {
        Arc::new(KeywordEmbedder::new(["taco", "ramen"]))
    }

    /// Keyword embedder whose first call parks until released.
    struct HeldEmbedder {
        inner: KeywordEmbedder,
        entered: Mutex<Option<Sender<()>>>,
        release: Mutex<Option<Receiver<()>>>,
    }

    impl HeldEmbedder {
        fn new(entered: Sender<()>, release: Receiver<()>) -> Self {
            Self {
                inner: KeywordEmbedder::new(["taco", "ramen"]),
                entered: Mutex::new(Some(entered)),
                release: Mutex::new(Some(release)),
            }
        }
    }

    impl Embedder for HeldEmbedder {
        fn embed(&self, text: &str) -> Result<Embedding, EmbedError> {
            let entered = self.entered.lock().expect("entered lock").take();
            if let Some(signal) = entered {
                signal.send(()).expect("signal entry");
                let release = self.release.lock().expect("release lock").take();
                if let Some(gate) = release {
                    gate.recv().expect("wait for release");
                }
            }
            self.inner.embed(text)
        }
    }

    #[rstest]
    fn fresh_service_is_not_ready(paths: Paths) {
        let service = SearchService::new(ServiceConfig::new(paths.database.clone()), keywords());
        assert_eq!(service.health(), Health::default());
        assert!(matches!(
            service.browse(&SearchFilters::default()),
            Err(SearchError::NotReady)
        ));
    }

    #[rstest]
    fn successful_rebuild_reports_counts(paths: Paths) {
        let service = SearchService::new(ServiceConfig::new(paths.database.clone()), keywords())
            .with_clock(Arc::new(FixedClock::new(fixed_now())));
        service.rebuild().expect("build succeeds");
        let health = service.health();
        assert!(health.is_ready());
        assert_eq!((health.restaurant_count, health.review_count), (2, 1));
        let results = service
            .search(&SearchQuery::new("taco").expect("valid query"))
            .expect("search succeeds");
        assert_eq!(results.first().map(|c| c.id.as_str()), Some("taco"));
    }

    #[rstest]
    fn unavailable_model_blocks_readiness(paths: Paths) {
        let embedder: Arc<dyn Embedder> =
            Arc::new(FailingEmbedder::always(KeywordEmbedder::new(["taco"])));
        let service = SearchService::new(ServiceConfig::new(paths.database.clone()), embedder);
        let err = service.rebuild().expect_err("probe fails");
        assert!(matches!(err, ConfigurationError::ModelUnavailable(_)));
        let health = service.health();
        assert!(health.data_loaded);
        assert!(!health.model_ready);
        assert!(health.error.is_some());
    }

    #[rstest]
    fn store_with_wrong_dimensions_is_rejected(paths: Paths) {
        let store = EmbeddingStore::from_parts(vec![RestaurantId::new("taco")], vec![vec![1.0]])
            .expect("valid store");
        write_embedding_store(&paths.store, &store).expect("write store");
        let config = ServiceConfig::new(paths.database.clone()).with_embeddings(paths.store.clone());
        let service = SearchService::new(config, keywords());
        assert!(matches!(
            service.rebuild(),
            Err(ConfigurationError::DimensionMismatch { store: 1, model: 2 })
        ));
        assert!(!service.health().embeddings_ready);
    }

    #[rstest]
    #[case::warm(true)]
    #[case::cold(false)]
    fn concurrent_searches_only_see_whole_engines(paths: Paths, #[case] warm: bool) {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(fixed_now()));
        let query = SearchQuery::new("taco").expect("valid query");
        let reference = SearchService::new(ServiceConfig::new(paths.database.clone()), keywords())
            .with_clock(Arc::clone(&clock));
        reference.rebuild().expect("reference build");
        let baseline = reference.search(&query).expect("baseline search");

        let service = SearchService::new(ServiceConfig::new(paths.database.clone()), keywords())
            .with_clock(clock);
        if warm {
            service.rebuild().expect("initial build");
        }
        let shared = &service;
        let request = &query;
        let outcomes: Vec<_> = std::thread::scope(|scope| {
            let rebuilds: Vec<_> = (0..2)
                .map(|_| {
                    scope.spawn(move || {
                        for _ in 0..5 {
                            shared.rebuild().expect("rebuild");
                        }
                    })
                })
                .collect();
            let searches: Vec<_> = (0..4)
                .map(|_| {
                    scope.spawn(move || {
                        (0..25)
                            .map(|_| shared.search(request))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            for handle in rebuilds {
                handle.join().expect("rebuild thread");
            }
            searches
                .into_iter()
                .flat_map(|handle| handle.join().expect("search thread"))
                .collect()
        });

        assert_eq!(outcomes.len(), 100);
        for outcome in outcomes {
            match outcome {
                Ok(results) => assert_eq!(results, baseline),
                Err(err) => assert!(
                    !warm && matches!(err, SearchError::NotReady),
                    "unexpected search outcome: {err:?}"
                ),
            }
        }
        assert!(service.health().is_ready());
    }

    #[rstest]
    fn overlapping_rebuilds_publish_in_start_order(paths: Paths) {
        let (entered_tx, entered_rx) = channel();
        let (release_tx, release_rx) = channel();
        let embedder: Arc<dyn Embedder> = Arc::new(HeldEmbedder::new(entered_tx, release_rx));
        let service = SearchService::new(ServiceConfig::new(paths.database.clone()), embedder);

        std::thread::scope(|scope| {
            let stale = scope.spawn(|| service.rebuild());
            entered_rx.recv().expect("first rebuild reaches the model");
            std::fs::remove_file(&paths.database).expect("remove database");
            write_fixture_database(
                &paths.database,
                &[
                    FixtureRestaurant::new("taco", "Taco Shack", 4.5, Some(1)),
                    FixtureRestaurant::new("ramen", "Ramen House", 4.7, Some(2)),
                    FixtureRestaurant::new("pho", "Pho Corner", 4.2, Some(1)),
                ],
                &[],
            )
            .expect("rewrite fixture");
            let fresh = scope.spawn(|| service.rebuild());
            std::thread::sleep(Duration::from_millis(50));
            release_tx.send(()).expect("release first rebuild");
            stale.join().expect("stale thread").expect("stale rebuild");
            fresh.join().expect("fresh thread").expect("fresh rebuild");
        });

        assert_eq!(service.health().restaurant_count, 3);
    }

    #[rstest]
    fn failed_rebuild_drops_the_previous_engine(paths: Paths) {
        let service = SearchService::new(ServiceConfig::new(paths.database.clone()), keywords());
        service.rebuild().expect("initial build");
        std::fs::remove_file(&paths.database).expect("remove database");
        assert!(service.rebuild().is_err());
        assert!(!service.health().data_loaded);
        assert!(matches!(
            service.search(&SearchQuery::new("taco").expect("valid query")),
            Err(SearchError::NotReady)
        ));
    }
}
