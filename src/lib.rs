//! Facade crate for the Savour restaurant search engine.
//!
//! This crate re-exports the core domain types, the smart-score analyzers and
//! the search service. SQLite loading and embedding store IO sit behind the
//! `store-sqlite` feature. The all-MiniLM-L6-v2 embedder sits behind
//! `local-embeddings`.

#![forbid(unsafe_code)]

pub use savour_core::{
    Clock, EmbedError, Embedder, Embedding, EmbeddingStore, HashingEmbedder, ModelSession,
    PriceLevel, QueryError, RankMode, Restaurant, RestaurantId, Review, ScoreBreakdown,
    ScoredCandidate, SearchFilters, SearchQuery, SingleFlight, Snapshot, SystemClock,
};
#[cfg(feature = "local-embeddings")]
pub use savour_core::{FastEmbedSession, MINILM_DIMENSIONS};
pub use savour_scorer::{SmartScoreCombiner, SmartScoreWeights, WeightsError};
pub use savour_search::{
    ConfigurationError, EmbeddingSource, Health, SearchEngine, SearchError, SearchService,
    ServiceConfig,
};

#[cfg(feature = "store-sqlite")]
pub use savour_data::{
    LoadOptions, PrecomputeError, SnapshotLoadError, load_snapshot, read_embedding_store,
    run_precompute, write_embedding_store,
};
