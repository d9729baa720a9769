//! Query relevance: cosine similarity with a lexical fallback.
//!
//! Relevance is computed for a whole candidate set at once. The semantic
//! stage compares the query vector with each candidate vector. When that
//! stage produces nothing useful (no comparable vectors, or a best score of
//! exactly zero) the lexical stage scores candidates by substring matches
//! against their name and tags instead.

use serde::Serialize;

use crate::{Embedding, Restaurant};

/// Bonus when the whole query appears in the name.
const PHRASE_IN_NAME: f32 = 0.5;
/// Bonus when the whole query appears in the tags.
const PHRASE_IN_TAGS: f32 = 0.3;
/// Bonus per query word found in the name.
const WORD_IN_NAME: f32 = 0.2;
/// Bonus per query word found in the tags.
const WORD_IN_TAGS: f32 = 0.1;

/// Cosine similarity between two vectors.
///
/// Returns `0.0` when the lengths differ, either vector is empty or has a
/// zero norm, or the arithmetic is not finite.
///
/// # Examples
/// ```
/// use savour_core::cosine_similarity;
///
/// assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
/// assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
/// assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
/// assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
/// ```
#[must_use]
#[expect(clippy::float_arithmetic, reason = "vector arithmetic")]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (dot, norm_a, norm_b) = a
        .iter()
        .zip(b)
        .fold((0.0_f32, 0.0_f32, 0.0_f32), |(dot, na, nb), (x, y)| {
            (dot + x * y, na + x * x, nb + y * y)
        });
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let similarity = dot / (norm_a.sqrt() * norm_b.sqrt());
    if similarity.is_finite() {
        similarity
    } else {
        0.0
    }
}

/// Clip a similarity into `0.0..=1.0`, mapping non-finite values to zero.
#[must_use]
pub fn clip_unit(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Which stage produced a set of relevance scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelevanceStage {
    /// Scores came from embedding similarity.
    Semantic,
    /// Scores came from substring matching.
    Lexical,
}

/// Relevance scores for a candidate set, aligned with the input order.
#[derive(Debug, Clone, PartialEq)]
pub struct RelevanceOutcome {
    /// Stage that produced the scores.
    pub stage: RelevanceStage,
    /// One score in `0.0..=1.0` per candidate.
    pub scores: Vec<f32>,
}

/// Substring-match score for a single restaurant.
///
/// Matching is case-insensitive. The whole query in the name adds 0.5 and
/// in the tags 0.3; each whitespace-separated query word adds 0.2 when found
/// in the name and 0.1 when found in the tags. The total is clipped to
/// `0.0..=1.0`.
///
/// # Examples
/// ```
/// use savour_core::{Restaurant, lexical_score};
///
/// # fn main() -> Result<(), savour_core::RestaurantError> {
/// let restaurant = Restaurant::new("p1", "Taco Shack")?.with_tags("mexican tacos");
/// // "taco" appears in the name (+0.5, +0.2) and in the tags (+0.3, +0.1).
/// assert!((lexical_score("Taco", &restaurant) - 1.0).abs() < 1e-6);
/// assert_eq!(lexical_score("sushi", &restaurant), 0.0);
/// # Ok(())
/// # }
/// ```
#[must_use]
#[expect(clippy::float_arithmetic, reason = "accumulating match bonuses")]
pub fn lexical_score(query: &str, restaurant: &Restaurant) -> f32 {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return 0.0;
    }
    let name = restaurant.name.to_lowercase();
    let tags = restaurant.tags.to_lowercase();

    let mut score = 0.0_f32;
    if name.contains(&needle) {
        score += PHRASE_IN_NAME;
    }
    if tags.contains(&needle) {
        score += PHRASE_IN_TAGS;
    }
    for word in needle.split_whitespace() {
        if name.contains(word) {
            score += WORD_IN_NAME;
        }
        if tags.contains(word) {
            score += WORD_IN_TAGS;
        }
    }
    clip_unit(score)
}

/// Score candidates against a query using the two-stage strategy.
///
/// `vectors` is aligned with `restaurants`; a `None` entry means the
/// candidate has no vector to compare and scores zero in the semantic
/// stage. The lexical stage replaces every score when the best semantic
/// score is exactly zero.
///
/// # Examples
/// ```
/// use savour_core::{Embedding, RelevanceStage, Restaurant, score_relevance};
///
/// # fn main() -> Result<(), savour_core::RestaurantError> {
/// let noodle_bar = Restaurant::new("p1", "Noodle Bar")?;
/// let query = Embedding::new(vec![1.0, 0.0]);
/// let orthogonal = Embedding::new(vec![0.0, 1.0]);
/// let outcome = score_relevance("noodle", &query, &[&noodle_bar], &[Some(&orthogonal)]);
/// assert_eq!(outcome.stage, RelevanceStage::Lexical);
/// assert!(outcome.scores[0] > 0.0);
/// # Ok(())
/// # }
/// ```
#[must_use]
pub fn score_relevance(
    query_text: &str,
    query_vector: &Embedding,
    restaurants: &[&Restaurant],
    vectors: &[Option<&Embedding>],
) -> RelevanceOutcome {
    let semantic: Vec<f32> = (0..restaurants.len())
        .map(|index| {
            vectors
                .get(index)
                .copied()
                .flatten()
                .map_or(0.0, |vector| {
                    clip_unit(cosine_similarity(
                        query_vector.as_slice(),
                        vector.as_slice(),
                    ))
                })
        })
        .collect();

    let best = semantic.iter().copied().fold(0.0_f32, f32::max);
    if best > 0.0 {
        return RelevanceOutcome {
            stage: RelevanceStage::Semantic,
            scores: semantic,
        };
    }
    RelevanceOutcome {
        stage: RelevanceStage::Lexical,
        scores: restaurants
            .iter()
            .map(|restaurant| lexical_score(query_text, restaurant))
            .collect(),
    }
}
