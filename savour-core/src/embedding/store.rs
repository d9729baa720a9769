//! Precomputed embeddings keyed by restaurant id.

use std::collections::HashMap;

use thiserror::Error;

use super::Embedding;
use crate::RestaurantId;

/// Errors raised while assembling an [`EmbeddingStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmbeddingStoreError {
    /// The id list and the vector matrix disagree in length.
    #[error("embedding store has {ids} ids but {vectors} vectors")]
    CountMismatch {
        /// Number of ids supplied.
        ids: usize,
        /// Number of vectors supplied.
        vectors: usize,
    },
    /// A vector's length differs from the first vector's.
    #[error("vector for {id} has {found} dimensions, expected {expected}")]
    DimensionMismatch {
        /// Restaurant whose vector is malformed.
        id: RestaurantId,
        /// Dimensions of the first vector.
        expected: usize,
        /// Dimensions of the offending vector.
        found: usize,
    },
    /// The same id appeared twice.
    #[error("restaurant {id} appears more than once in the embedding store")]
    DuplicateId {
        /// Repeated restaurant id.
        id: RestaurantId,
    },
}

/// Immutable map from restaurant id to precomputed composite-text vector.
///
/// Construction is all-or-nothing: any inconsistency between the parallel
/// id list and vector matrix rejects the whole store.
///
/// # Examples
/// ```
/// use savour_core::{EmbeddingStore, EmbeddingStoreError, RestaurantId};
///
/// let ids = vec![RestaurantId::new("a"), RestaurantId::new("b")];
/// let err = EmbeddingStore::from_parts(ids, vec![vec![1.0, 0.0]]).unwrap_err();
/// assert_eq!(err, EmbeddingStoreError::CountMismatch { ids: 2, vectors: 1 });
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddingStore {
    vectors: HashMap<RestaurantId, Embedding>,
    dimensions: usize,
}

impl EmbeddingStore {
    /// Validate parallel id and vector lists and build the store.
    ///
    /// # Errors
    /// Returns [`EmbeddingStoreError`] when the lists differ in length, a
    /// vector has the wrong dimensionality, or an id repeats.
    pub fn from_parts(
        ids: Vec<RestaurantId>,
        vectors: Vec<Vec<f32>>,
    ) -> Result<Self, EmbeddingStoreError> {
        if ids.len() != vectors.len() {
            return Err(EmbeddingStoreError::CountMismatch {
                ids: ids.len(),
                vectors: vectors.len(),
            });
        }
        let dimensions = vectors.first().map_or(0, Vec::len);
        let mut map = HashMap::with_capacity(ids.len());
        for (id, vector) in ids.into_iter().zip(vectors) {
            if vector.len() != dimensions {
                return Err(EmbeddingStoreError::DimensionMismatch {
                    id,
                    expected: dimensions,
                    found: vector.len(),
                });
            }
            if map.contains_key(&id) {
                return Err(EmbeddingStoreError::DuplicateId { id });
            }
            map.insert(id, Embedding::new(vector));
        }
        Ok(Self {
            vectors: map,
            dimensions,
        })
    }

    /// Look up the vector for a restaurant.
    #[must_use]
    pub fn get(&self, id: &RestaurantId) -> Option<&Embedding> {
        self.vectors.get(id)
    }

    /// Number of stored vectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Report whether the store holds no vectors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Dimensionality shared by every vector; zero when empty.
    #[must_use]
    pub const fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Split the store into parallel id and vector lists sorted by id.
    #[must_use]
    pub fn into_parts(self) -> (Vec<RestaurantId>, Vec<Vec<f32>>) {
        let mut entries: Vec<_> = self.vectors.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
            .into_iter()
            .map(|(id, vector)| (id, vector.into_inner()))
            .unzip()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ids(raw: &[&str]) -> Vec<RestaurantId> {
        raw.iter().copied().map(RestaurantId::new).collect()
    }

    #[rstest]
    fn accepts_matching_parts() {
        let store = EmbeddingStore::from_parts(ids(&["a", "b"]), vec![vec![1.0], vec![0.5]])
            .expect("valid store");
        assert_eq!(store.len(), 2);
        assert_eq!(store.dimensions(), 1);
        assert_eq!(
            store.get(&RestaurantId::new("b")).map(Embedding::as_slice),
            Some(&[0.5][..])
        );
    }

    #[rstest]
    #[case(&["a"], 2)]
    #[case(&["a", "b", "c"], 2)]
    fn rejects_count_mismatch(#[case] raw: &[&str], #[case] vector_count: usize) {
        let vectors = vec![vec![1.0]; vector_count];
        let err = EmbeddingStore::from_parts(ids(raw), vectors).expect_err("mismatch");
        assert_eq!(
            err,
            EmbeddingStoreError::CountMismatch {
                ids: raw.len(),
                vectors: vector_count,
            }
        );
    }

    #[rstest]
    fn rejects_ragged_vectors() {
        let err = EmbeddingStore::from_parts(ids(&["a", "b"]), vec![vec![1.0, 0.0], vec![1.0]])
            .expect_err("ragged");
        assert!(matches!(
            err,
            EmbeddingStoreError::DimensionMismatch {
                expected: 2,
                found: 1,
                ..
            }
        ));
    }

    #[rstest]
    fn rejects_duplicate_ids() {
        let err = EmbeddingStore::from_parts(ids(&["a", "a"]), vec![vec![1.0], vec![1.0]])
            .expect_err("duplicate");
        assert_eq!(
            err,
            EmbeddingStoreError::DuplicateId {
                id: RestaurantId::new("a")
            }
        );
    }

    #[rstest]
    fn into_parts_sorts_by_id() {
        let store = EmbeddingStore::from_parts(ids(&["b", "a"]), vec![vec![2.0], vec![1.0]])
            .expect("valid store");
        let (sorted_ids, vectors) = store.into_parts();
        assert_eq!(sorted_ids, ids(&["a", "b"]));
        assert_eq!(vectors, vec![vec![1.0], vec![2.0]]);
    }
}
