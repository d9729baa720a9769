//! Data access for the Savour engine.
//!
//! Responsibilities:
//! - Load the restaurant SQLite database into an immutable
//!   [`savour_core::Snapshot`].
//! - Read and write the precomputed embedding store file format.
//! - Run the offline precompute pipeline that builds that store.
//!
//! Boundaries:
//! - Do not encode ranking rules (they live in `savour-core` and
//!   `savour-scorer`).
//! - Never rewrite source data; invalid values become missing values.
//!
//! Invariants:
//! - Store files are validated as a whole before any vector is exposed.
//! - No global mutable state.

#![forbid(unsafe_code)]

mod artefact;
mod precompute;
mod sqlite;
mod store;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use precompute::{
    DEFAULT_PRECOMPUTE_MIN_REVIEWS, PrecomputeError, PrecomputeSummary, precompute_embeddings,
    run_precompute,
};
pub use sqlite::{LoadOptions, SnapshotLoadError, load_snapshot};
pub use store::{
    EMBEDDING_STORE_MAGIC, EMBEDDING_STORE_VERSION, EmbeddingFileError, EmbeddingFileWriteError,
    read_embedding_store, write_embedding_store,
};
