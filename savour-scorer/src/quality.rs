//! Review authenticity.

use chrono::{DateTime, Utc};
use savour_core::{Review, Signal, SignalContext};

/// Authenticity assumed for a restaurant without reviews.
pub const NEUTRAL_AUTHENTICITY: f32 = 0.5;

const PROFILE_PHOTO_BONUS: f32 = 0.25;
const PROFILE_LINK_BONUS: f32 = 0.25;

/// Text length thresholds (exclusive) and their bonuses, longest first.
const LENGTH_BONUSES: [(usize, f32); 3] = [(200, 0.30), (100, 0.15), (50, 0.05)];

/// Age thresholds in whole days (exclusive) and their bonuses, newest first.
const RECENCY_BONUSES: [(i64, f32); 3] = [(30, 0.20), (90, 0.10), (180, 0.05)];

/// Scores how trustworthy a restaurant's reviews look.
///
/// Each review earns additive bonuses for a reviewer profile photo, an
/// active profile link, the length of its text and its recency; the sum is
/// capped at `1.0`. The restaurant score is the mean over its reviews.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReviewQualityAnalyzer;

impl ReviewQualityAnalyzer {
    /// Score a single review against the reference instant `now`.
    ///
    /// Age is measured in whole elapsed days, rounded down.
    ///
    /// # Examples
    /// ```
    /// use chrono::{Duration, Utc};
    /// use savour_core::Review;
    /// use savour_scorer::ReviewQualityAnalyzer;
    ///
    /// let now = Utc::now();
    /// let stale = Review::new("p1".into(), 4.0, now - Duration::days(400)).expect("review");
    /// assert_eq!(ReviewQualityAnalyzer.review_score(&stale, now), 0.0);
    /// ```
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "summing review bonuses")]
    pub fn review_score(&self, review: &Review, now: DateTime<Utc>) -> f32 {
        let mut score = 0.0_f32;
        if review.has_profile_photo {
            score += PROFILE_PHOTO_BONUS;
        }
        if review.has_profile_link {
            score += PROFILE_LINK_BONUS;
        }

        let length = review.text_len();
        score += LENGTH_BONUSES
            .iter()
            .find(|(threshold, _)| length > *threshold)
            .map_or(0.0, |(_, bonus)| *bonus);

        let age_days = now.signed_duration_since(review.published_at).num_days();
        score += RECENCY_BONUSES
            .iter()
            .find(|(threshold, _)| age_days < *threshold)
            .map_or(0.0, |(_, bonus)| *bonus);

        score.min(1.0)
    }
}

impl Signal for ReviewQualityAnalyzer {
    fn neutral(&self) -> f32 {
        NEUTRAL_AUTHENTICITY
    }

    #[expect(
        clippy::float_arithmetic,
        reason = "averaging per-review scores"
    )]
    #[expect(
        clippy::cast_precision_loss,
        reason = "review counts are far below f32 precision limits"
    )]
    fn evaluate(&self, context: &SignalContext<'_>) -> f32 {
        if context.reviews.is_empty() {
            return NEUTRAL_AUTHENTICITY;
        }
        let total: f32 = context
            .reviews
            .iter()
            .map(|review| self.review_score(review, context.now))
            .sum();
        total / context.reviews.len() as f32
    }
}
