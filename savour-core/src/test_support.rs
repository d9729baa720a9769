//! Fixture builders and stub embedders shared by unit and behaviour tests.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::{EmbedError, Embedder, Embedding, Restaurant, RestaurantId, Review};

/// Reference instant used by fixtures: 2024-06-01T00:00:00Z.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// A minimal restaurant with a rating and a rating count.
///
/// # Panics
/// Panics when the id is blank or the rating is outside `0..=5`.
#[must_use]
#[expect(clippy::expect_used, reason = "fixtures fail loudly on bad input")]
pub fn rated_restaurant(id: &str, name: &str, rating: f32, review_count: u32) -> Restaurant {
    Restaurant::new(id, name)
        .and_then(|restaurant| restaurant.with_rating(rating))
        .map(|restaurant| restaurant.with_review_count(review_count))
        .expect("fixture restaurant must be valid")
}

/// A review published `days_ago` whole days before `now`.
///
/// # Panics
/// Panics when the rating is outside `0..=5`.
#[must_use]
#[expect(clippy::expect_used, reason = "fixtures fail loudly on bad input")]
pub fn review_days_ago(id: &str, rating: f32, days_ago: i64, now: DateTime<Utc>) -> Review {
    let published = now
        .checked_sub_signed(Duration::days(days_ago))
        .unwrap_or(now);
    Review::new(RestaurantId::new(id), rating, published).expect("fixture review must be valid")
}

/// Embedder with one axis per keyword.
///
/// Axis `i` is `1.0` when the lower-cased text contains keyword `i`. Texts
/// that share keywords are therefore similar, and a text containing none
/// maps to the zero vector.
#[derive(Debug, Clone, Default)]
pub struct KeywordEmbedder {
    keywords: Vec<String>,
}

impl KeywordEmbedder {
    /// Create an embedder over `keywords`.
    #[must_use]
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|keyword| keyword.as_ref().to_lowercase())
                .collect(),
        }
    }
}

impl Embedder for KeywordEmbedder {
    fn embed(&self, text: &str) -> Result<Embedding, EmbedError> {
        let lowered = text.to_lowercase();
        Ok(Embedding::new(
            self.keywords
                .iter()
                .map(|keyword| {
                    if lowered.contains(keyword.as_str()) {
                        1.0
                    } else {
                        0.0
                    }
                })
                .collect(),
        ))
    }
}

/// Embedder that fails for texts containing a marker.
///
/// Without a marker every call fails. Other texts are delegated to the
/// wrapped embedder.
#[derive(Debug, Clone, Default)]
pub struct FailingEmbedder<E> {
    inner: E,
    marker: Option<String>,
}

impl<E> FailingEmbedder<E> {
    /// Fail every call.
    #[must_use]
    pub const fn always(inner: E) -> Self {
        Self {
            inner,
            marker: None,
        }
    }

    /// Fail calls whose text contains `marker`.
    #[must_use]
    pub fn on(inner: E, marker: impl Into<String>) -> Self {
        Self {
            inner,
            marker: Some(marker.into()),
        }
    }
}

impl<E: Embedder> Embedder for FailingEmbedder<E> {
    fn embed(&self, text: &str) -> Result<Embedding, EmbedError> {
        let fails = self
            .marker
            .as_deref()
            .is_none_or(|marker| text.contains(marker));
        if fails {
            return Err(EmbedError::Model {
                message: format!("stub refused to embed {text:?}"),
            });
        }
        self.inner.embed(text)
    }
}
