//! Deterministic feature-hashing embedder.
//!
//! Tokens are lower-cased runs of alphanumeric characters. Each token is
//! hashed with 64-bit FNV-1a; the low bits choose a bucket and bit 63 chooses
//! the sign. The resulting bag-of-words vector is L2-normalised so cosine
//! similarity reduces to a dot product.

use super::{EmbedError, Embedder, Embedding};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Default number of dimensions.
pub const DEFAULT_DIMENSIONS: usize = 384;

/// A model-free [`Embedder`] based on the hashing trick.
///
/// Texts sharing words produce positively correlated vectors, which is
/// enough for offline runs and reproducible tests.
///
/// # Examples
/// ```
/// use savour_core::{Embedder, HashingEmbedder};
///
/// let embedder = HashingEmbedder::new(64);
/// let vector = embedder.embed("Cheap tacos").expect("embed");
/// assert_eq!(vector.dimensions(), 64);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    /// Create an embedder producing `dimensions`-long vectors.
    ///
    /// A zero dimension count is raised to one.
    #[must_use]
    pub const fn new(dimensions: usize) -> Self {
        Self {
            dimensions: if dimensions == 0 { 1 } else { dimensions },
        }
    }

    /// Number of dimensions produced.
    #[must_use]
    pub const fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn bucket(&self, hash: u64) -> usize {
        let width = u64::try_from(self.dimensions).unwrap_or(u64::MAX);
        let slot = hash.checked_rem(width).unwrap_or_default();
        usize::try_from(slot).unwrap_or_default()
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

impl Embedder for HashingEmbedder {
    #[expect(
        clippy::float_arithmetic,
        reason = "hashing accumulates signed counts and normalises the vector"
    )]
    fn embed(&self, text: &str) -> Result<Embedding, EmbedError> {
        let mut values = vec![0.0_f32; self.dimensions];
        for token in tokens(text) {
            let hash = fnv1a(&token);
            let sign = if hash >> 63 == 0 { 1.0_f32 } else { -1.0_f32 };
            if let Some(slot) = values.get_mut(self.bucket(hash)) {
                *slot += sign;
            }
        }
        let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut values {
                *value /= norm;
            }
        }
        Ok(Embedding::new(values))
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}

fn fnv1a(token: &str) -> u64 {
    token.bytes().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}
