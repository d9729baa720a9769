//! Embedding capability used for semantic relevance.
//!
//! The engine treats embeddings as opaque fixed-length `f32` vectors. An
//! [`Embedder`] turns text into a vector, either at request time or ahead of
//! time when building an [`EmbeddingStore`]. The composite text embedded for
//! each restaurant is produced by [`composite_text`].
//!
//! With the `local-embeddings` feature, `FastEmbedSession` runs
//! all-MiniLM-L6-v2 behind a [`SingleFlight`] gate. [`HashingEmbedder`] is
//! the model-free fallback.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Restaurant, Review};

mod hashing;
#[cfg(feature = "local-embeddings")]
mod minilm;
mod store;

pub use hashing::{DEFAULT_DIMENSIONS, HashingEmbedder};
#[cfg(feature = "local-embeddings")]
pub use minilm::{FastEmbedSession, MINILM_DIMENSIONS};
pub use store::{EmbeddingStore, EmbeddingStoreError};

/// Number of reviews folded into a composite text.
pub const COMPOSITE_REVIEW_LIMIT: usize = 5;

/// Maximum number of characters of review text in a composite text.
pub const COMPOSITE_REVIEW_CHARS: usize = 1000;

/// A dense embedding vector.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    /// Wrap raw vector components.
    #[must_use]
    pub const fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    /// Borrow the components.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Number of dimensions.
    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.0.len()
    }

    /// Consume the wrapper and return the components.
    #[must_use]
    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

/// Errors raised by an [`Embedder`].
#[derive(Debug, Error)]
pub enum EmbedError {
    /// The model could not encode the text.
    #[error("embedding model failed: {message}")]
    Model {
        /// Description supplied by the model.
        message: String,
    },
    /// A single-flight gate was poisoned by a panicking caller.
    #[error("embedding gate poisoned by an earlier panic")]
    Poisoned,
}

/// Encode text into an [`Embedding`].
///
/// Implementations must be deterministic for a fixed model version and safe
/// to share across threads. Non-reentrant models should be wrapped in
/// [`SingleFlight`].
///
/// # Examples
///
/// ```rust
/// use savour_core::{EmbedError, Embedder, Embedding};
///
/// struct LengthEmbedder;
///
/// impl Embedder for LengthEmbedder {
///     fn embed(&self, text: &str) -> Result<Embedding, EmbedError> {
///         Ok(Embedding::new(vec![1.0, text.len() as f32]))
///     }
/// }
///
/// let vector = LengthEmbedder.embed("tacos").expect("embed");
/// assert_eq!(vector.dimensions(), 2);
/// ```
pub trait Embedder: Send + Sync {
    /// Encode `text` into a vector.
    ///
    /// # Errors
    /// Returns [`EmbedError`] when the model cannot encode the text.
    fn embed(&self, text: &str) -> Result<Embedding, EmbedError>;
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn embed(&self, text: &str) -> Result<Embedding, EmbedError> {
        (**self).embed(text)
    }
}

impl<E: Embedder + ?Sized> Embedder for std::sync::Arc<E> {
    fn embed(&self, text: &str) -> Result<Embedding, EmbedError> {
        (**self).embed(text)
    }
}

/// A stateful model that must not be entered concurrently.
///
/// Wrap implementations in [`SingleFlight`] to obtain a shareable
/// [`Embedder`].
pub trait ModelSession: Send {
    /// Encode `text`, possibly mutating internal model state.
    ///
    /// # Errors
    /// Returns [`EmbedError`] when the model cannot encode the text.
    fn encode(&mut self, text: &str) -> Result<Embedding, EmbedError>;
}

/// Serialise calls into a [`ModelSession`].
///
/// Only one call runs at a time. The gate belongs to the model, so callers
/// never hold engine state while waiting on it.
#[derive(Debug)]
pub struct SingleFlight<M> {
    session: Mutex<M>,
}

impl<M> SingleFlight<M> {
    /// Wrap `session` behind a single-flight gate.
    pub const fn new(session: M) -> Self {
        Self {
            session: Mutex::new(session),
        }
    }
}

impl<M: ModelSession> Embedder for SingleFlight<M> {
    fn embed(&self, text: &str) -> Result<Embedding, EmbedError> {
        let mut session = self.session.lock().map_err(|_| EmbedError::Poisoned)?;
        session.encode(text)
    }
}

/// Build the text embedded for a restaurant.
///
/// The text is the name, the tag string and the joined text of the first
/// [`COMPOSITE_REVIEW_LIMIT`] reviews, the latter cut to
/// [`COMPOSITE_REVIEW_CHARS`] characters. Reviews without text contribute an
/// empty segment.
///
/// # Examples
/// ```
/// use savour_core::{Restaurant, composite_text};
///
/// # fn main() -> Result<(), savour_core::RestaurantError> {
/// let restaurant = Restaurant::new("p1", "Taqueria")?.with_tags("mexican");
/// assert_eq!(composite_text(&restaurant, &[]), "Taqueria mexican ");
/// # Ok(())
/// # }
/// ```
#[must_use]
pub fn composite_text(restaurant: &Restaurant, reviews: &[Review]) -> String {
    let joined = reviews
        .iter()
        .take(COMPOSITE_REVIEW_LIMIT)
        .map(|review| review.text.as_deref().unwrap_or_default())
        .collect::<Vec<_>>()
        .join(" ");
    let review_text: String = joined.chars().take(COMPOSITE_REVIEW_CHARS).collect();
    format!("{} {} {}", restaurant.name, restaurant.tags, review_text)
}
