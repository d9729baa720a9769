//! Core domain types for the Savour ranking engine.
//!
//! The crate defines the validated records the engine ranks
//! ([`Restaurant`], [`Review`], [`Snapshot`]), the request types
//! ([`SearchQuery`], [`SearchFilters`]) and the building blocks shared by
//! the scoring and search crates:
//!
//! - geographic and price filtering ([`GeoFilter`], [`PriceFilter`]);
//! - the [`Embedder`] capability and the [`EmbeddingStore`] of precomputed
//!   vectors;
//! - two-stage relevance ([`score_relevance`]);
//! - the [`Signal`] trait implemented by the review, momentum, completeness
//!   and value analysers;
//! - stable ranking ([`rank`]) and review excerpts ([`review_excerpt`]).
//!
//! Constructors return `Result` to surface invalid input early. Optional
//! fields stay `None` when data is missing; neutral defaults are applied at
//! scoring time.

#![forbid(unsafe_code)]

mod candidate;
mod clock;
mod embedding;
mod excerpt;
mod filter;
mod query;
mod rank;
mod relevance;
mod restaurant;
mod review;
mod signal;
mod snapshot;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use candidate::{ScoreBreakdown, ScoredCandidate};
pub use clock::{Clock, FixedClock, SystemClock};
pub use embedding::{
    COMPOSITE_REVIEW_CHARS, COMPOSITE_REVIEW_LIMIT, DEFAULT_DIMENSIONS, EmbedError, Embedder,
    Embedding, EmbeddingStore, EmbeddingStoreError, HashingEmbedder, ModelSession, SingleFlight,
    composite_text,
};
#[cfg(feature = "local-embeddings")]
pub use embedding::{FastEmbedSession, MINILM_DIMENSIONS};
pub use excerpt::{EXCERPT_CHARS, review_excerpt};
pub use filter::{
    EARTH_RADIUS_MILES, GeoFilter, MISSING_DISTANCE_MILES, PriceFilter, haversine_miles,
};
pub use query::{
    BROWSE_LIMIT, QueryError, RankMode, SEARCH_LIMIT, SearchFilters, SearchQuery,
    UNLIMITED_PRICE, UNLIMITED_RADIUS_MILES,
};
pub use rank::rank;
pub use relevance::{
    RelevanceOutcome, RelevanceStage, clip_unit, cosine_similarity, lexical_score,
    score_relevance,
};
pub use restaurant::{
    Amenities, ListingDetails, MAX_RATING, PriceLevel, Restaurant, RestaurantError, RestaurantId,
    validate_rating, wgs84_point,
};
pub use review::Review;
pub use signal::{Signal, SignalContext, sanitise_component};
pub use snapshot::{Snapshot, SnapshotError};
