//! Error types for the search engine and service.

use savour_core::{EmbedError, QueryError};
use savour_data::{EmbeddingFileError, SnapshotLoadError};
use savour_scorer::WeightsError;
use thiserror::Error;

/// Errors returned to a search or browse caller.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The request failed validation.
    #[error(transparent)]
    Validation(#[from] QueryError),
    /// No engine is loaded; see [`crate::Health`] for the cause.
    #[error("search service is not ready")]
    NotReady,
    /// The query text could not be embedded.
    #[error("failed to embed query: {0}")]
    QueryEmbedding(#[source] EmbedError),
}

/// Errors that prevent the service from becoming ready.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// The restaurant database could not be loaded.
    #[error(transparent)]
    Data(#[from] SnapshotLoadError),
    /// The embedding model failed its readiness probe.
    #[error("embedding model unavailable: {0}")]
    ModelUnavailable(#[source] EmbedError),
    /// The precomputed embedding store is missing or invalid.
    #[error(transparent)]
    Embeddings(#[from] EmbeddingFileError),
    /// The store and the model disagree on vector length.
    #[error("embedding store has {store} dimensions but the model produces {model}")]
    DimensionMismatch {
        /// Dimensionality recorded in the store.
        store: usize,
        /// Dimensionality of the model's probe vector.
        model: usize,
    },
    /// The smart-score weights are invalid.
    #[error(transparent)]
    Weights(#[from] WeightsError),
}
