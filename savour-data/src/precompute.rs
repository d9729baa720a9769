//! Offline embedding of composite restaurant texts.

use camino::Utf8Path;
use log::{info, warn};
use savour_core::{Embedder, EmbeddingStore, EmbeddingStoreError, Snapshot, composite_text};
use serde::Serialize;
use thiserror::Error;

use crate::sqlite::{LoadOptions, SnapshotLoadError, load_snapshot};
use crate::store::{EmbeddingFileWriteError, write_embedding_store};

/// Written reviews a restaurant needs before it is embedded offline.
pub const DEFAULT_PRECOMPUTE_MIN_REVIEWS: usize = 6;

/// Counts reported after a precompute run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PrecomputeSummary {
    /// Restaurants considered.
    pub restaurants: usize,
    /// Vectors written to the store.
    pub embedded: usize,
    /// Restaurants skipped because the embedder failed.
    pub failed: usize,
    /// Dimensionality of the written vectors.
    pub dimensions: usize,
}

/// Errors raised by the precompute pipeline.
#[derive(Debug, Error)]
pub enum PrecomputeError {
    /// Loading the snapshot failed.
    #[error(transparent)]
    Load(#[from] SnapshotLoadError),
    /// The embedder produced vectors that cannot form a store.
    #[error("embedder produced an inconsistent store: {0}")]
    Store(#[from] EmbeddingStoreError),
    /// Writing the store failed.
    #[error(transparent)]
    Write(#[from] EmbeddingFileWriteError),
}

/// Embed the composite text of every restaurant in `snapshot`.
///
/// Restaurants whose text the embedder rejects are skipped and counted in
/// [`PrecomputeSummary::failed`].
///
/// # Errors
/// Returns [`EmbeddingStoreError`] when the embedder returns vectors of
/// differing dimensionality.
pub fn precompute_embeddings(
    snapshot: &Snapshot,
    embedder: &dyn Embedder,
) -> Result<(EmbeddingStore, PrecomputeSummary), EmbeddingStoreError> {
    let mut ids = Vec::with_capacity(snapshot.restaurant_count());
    let mut vectors = Vec::with_capacity(snapshot.restaurant_count());
    let mut failed = 0_usize;

    for restaurant in snapshot.restaurants() {
        let text = composite_text(restaurant, snapshot.reviews_for(&restaurant.id));
        match embedder.embed(&text) {
            Ok(vector) => {
                ids.push(restaurant.id.clone());
                vectors.push(vector.into_inner());
            }
            Err(err) => {
                warn!("skipping {}: {err}", restaurant.id);
                failed = failed.saturating_add(1);
            }
        }
    }

    let store = EmbeddingStore::from_parts(ids, vectors)?;
    let summary = PrecomputeSummary {
        restaurants: snapshot.restaurant_count(),
        embedded: store.len(),
        failed,
        dimensions: store.dimensions(),
    };
    Ok((store, summary))
}

/// Load `database`, embed qualifying restaurants and write the store to
/// `output`.
///
/// Only restaurants with at least `min_reviews` written reviews are
/// embedded.
///
/// # Errors
/// Returns [`PrecomputeError`] when loading, embedding or writing fails.
pub fn run_precompute(
    database: &Utf8Path,
    output: &Utf8Path,
    min_reviews: usize,
    embedder: &dyn Embedder,
) -> Result<PrecomputeSummary, PrecomputeError> {
    let snapshot = load_snapshot(
        database,
        LoadOptions {
            min_reviews,
            ..LoadOptions::default()
        },
    )?;
    let (store, summary) = precompute_embeddings(&snapshot, embedder)?;
    write_embedding_store(output, &store)?;
    info!(
        "embedded {} of {} restaurants ({} failed)",
        summary.embedded, summary.restaurants, summary.failed
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use savour_core::{Restaurant, RestaurantId};
    use savour_core::test_support::{FailingEmbedder, KeywordEmbedder};

    fn snapshot() -> Snapshot {
        Snapshot::new(
            vec![
                Restaurant::new("a", "Taco Stand")
                    .map(|r| r.with_tags("mexican"))
                    .expect("valid restaurant"),
                Restaurant::new("b", "Noodle Bar")
                    .map(|r| r.with_tags("ramen"))
                    .expect("valid restaurant"),
            ],
            Vec::new(),
        )
        .expect("valid snapshot")
    }

    #[rstest]
    fn embeds_every_restaurant() {
        let embedder = KeywordEmbedder::new(["taco", "ramen"]);
        let (store, summary) = precompute_embeddings(&snapshot(), &embedder).expect("store");
        assert_eq!(summary.embedded, 2);
        assert_eq!(summary.dimensions, 2);
        assert_eq!(
            store.get(&RestaurantId::new("b")).map(|v| v.as_slice().to_vec()),
            Some(vec![0.0, 1.0])
        );
    }

    #[rstest]
    fn failed_restaurants_are_skipped() {
        let embedder = FailingEmbedder::on(KeywordEmbedder::new(["taco"]), "Noodle");
        let (store, summary) = precompute_embeddings(&snapshot(), &embedder).expect("store");
        assert_eq!(summary.failed, 1);
        assert_eq!(store.len(), 1);
        assert!(store.get(&RestaurantId::new("b")).is_none());
    }
}
